use std::fmt::Write as _;
use std::io::{self, Write};

use anyhow::{Context, Result};
use imagemend_core::error::MendError;
use imagemend_core::models::RunSummary;
use imagemend_core::{
    FixedDelay, RemediationConfig, Remediator, RunOptions, RunState, SearchProviderConfig,
    UnsplashProvider,
};
use tracing::info;

use crate::cli::Cli;


pub(crate) fn run(cli: Cli) -> Result<()> {
    let provider_config = SearchProviderConfig::from_env().map_err(|err| fail(&cli, err))?;
    if !cli.content_path.is_dir() {
        let err = MendError::FatalPrecondition(format!(
            "content path {} does not exist or is not a directory",
            cli.content_path.display()
        ));
        return Err(fail(&cli, err));
    }

    let mut config = RemediationConfig::from_env();
    if let Some(delay_ms) = cli.delay_ms {
        config.search_delay_ms = delay_ms;
    }
    info!(
        endpoint = %provider_config.endpoint,
        delay_ms = config.search_delay_ms,
        "search provider configured"
    );
    let provider = UnsplashProvider::new(provider_config).map_err(|err| fail(&cli, err))?;
    let mut remediator =
        Remediator::new(provider, FixedDelay::new(config.search_delay()), &config)
            .map_err(|err| fail(&cli, err))?;

    let options = RunOptions {
        content_root: cli.content_path.clone(),
        report: cli.report.clone(),
        dry_run: cli.dry_run,
        log_path: cli.log_file.clone(),
    };
    let mut state = RunState::default();
    let summary = remediator
        .run(&options, &mut state)
        .map_err(|err| fail(&cli, err))?;

    if cli.json {
        print_json(&summary)?;
    } else {
        let mut stdout = io::stdout().lock();
        stdout
            .write_all(render_summary(&summary).as_bytes())
            .context("failed to write summary")?;
    }
    Ok(())
}

fn fail(cli: &Cli, err: MendError) -> anyhow::Error {
    if cli.json {
        let payload = err.to_payload("remediate", Some(cli.content_path.display().to_string()));
        if let Ok(rendered) = serde_json::to_string(&payload) {
            eprintln!("{rendered}");
        }
    }
    anyhow::Error::new(err)
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    let mut stdout = io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, value)?;
    writeln!(stdout)?;
    Ok(())
}

fn render_summary(summary: &RunSummary) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "report: {}", summary.report_path);
    for file in &summary.files {
        let _ = writeln!(
            out,
            "  {}: fixed {}, failed {}, already clean {}{}",
            file.relative_path,
            file.fixed,
            file.failed,
            file.already_clean,
            if file.written { " (written)" } else { "" }
        );
        for url in &file.failed_urls {
            let _ = writeln!(out, "    unresolved: {url}");
        }
    }
    for skipped in &summary.skipped_files {
        let _ = writeln!(
            out,
            "  {}: skipped ({})",
            skipped.relative_path, skipped.reason
        );
    }
    let counters = summary.counters;
    let _ = writeln!(
        out,
        "total: fixed {}, failed {}, already clean {}, skipped files {}, searches {}",
        counters.total_fixed,
        counters.total_failed,
        counters.already_clean,
        counters.files_skipped,
        summary.provider_calls
    );
    if summary.dry_run {
        let _ = writeln!(out, "dry run: no files were modified");
    } else {
        let _ = writeln!(out, "files modified: {}", summary.files_modified());
    }
    out
}
