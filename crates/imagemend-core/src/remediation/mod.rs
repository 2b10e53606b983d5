//! Sequential remediation of broken image references.
//!
//! One file at a time, one distinct broken URL at a time within a file. The
//! caches and counters live in [`RunState`], which the caller owns, so two
//! runs only share memoized results when they are handed the same state.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use chrono::Utc;
use tracing::{info, warn};

use crate::config::{RemediationConfig, SearchProviderConfig};
use crate::document::{ContentDocument, read_document, resolve_content_path, write_document};
use crate::error::{MendError, Result};
use crate::models::{
    FileSummary, RemediationTarget, Replacement, RunCounters, RunSummary, SkippedFile,
};
use crate::patch::{UrlReplacement, occurrences_in, substitute_urls};
use crate::provider::{ImageSearchProvider, UnsplashProvider};
use crate::report::{ReportLocator, group_by_file, load_remediation_targets};
use crate::resolver::{RunCaches, SearchResolver};
use crate::run_log::{LogEvent, RunLog};
use crate::throttle::{FixedDelay, Throttle};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOptions {
    pub content_root: PathBuf,
    pub report: Option<PathBuf>,
    pub dry_run: bool,
    pub log_path: Option<PathBuf>,
}

impl RunOptions {
    pub fn new(content_root: impl Into<PathBuf>) -> Self {
        Self {
            content_root: content_root.into(),
            report: None,
            dry_run: false,
            log_path: None,
        }
    }

    #[must_use]
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunState {
    pub caches: RunCaches,
    pub counters: RunCounters,
}

#[derive(Debug)]
pub struct Remediator<P, T> {
    resolver: SearchResolver<P, T>,
    locator: ReportLocator,
}

impl Remediator<UnsplashProvider, FixedDelay> {
    pub fn from_config(
        provider_config: SearchProviderConfig,
        config: &RemediationConfig,
    ) -> Result<Self> {
        Self::new(
            UnsplashProvider::new(provider_config)?,
            FixedDelay::new(config.search_delay()),
            config,
        )
    }
}

impl<P, T> Remediator<P, T>
where
    P: ImageSearchProvider,
    T: Throttle,
{
    pub fn new(provider: P, throttle: T, config: &RemediationConfig) -> Result<Self> {
        Ok(Self {
            resolver: SearchResolver::new(provider, throttle),
            locator: ReportLocator::new(&config.report_glob)?,
        })
    }

    pub fn resolver(&self) -> &SearchResolver<P, T> {
        &self.resolver
    }

    pub fn run(&mut self, options: &RunOptions, state: &mut RunState) -> Result<RunSummary> {
        if !options.content_root.is_dir() {
            return Err(MendError::FatalPrecondition(format!(
                "content path {} does not exist or is not a directory",
                options.content_root.display()
            )));
        }

        let started_at = Utc::now().to_rfc3339();
        let run_id = uuid::Uuid::new_v4().to_string();
        let log = RunLog::new(options.log_path.clone(), run_id.clone(), options.dry_run);
        let calls_before = self.resolver.stats().provider_calls;
        let counters_before = state.counters;

        let loaded = match load_remediation_targets(
            &self.locator,
            &options.content_root,
            options.report.as_deref(),
        ) {
            Ok(loaded) => loaded,
            Err(err) => {
                log.record(
                    "run.aborted",
                    "error",
                    LogEvent {
                        error: Some(&err),
                        ..LogEvent::default()
                    },
                );
                return Err(err);
            }
        };
        let report_path = loaded.report_path.display().to_string();
        info!(
            report = %report_path,
            targets = loaded.targets.len(),
            dry_run = options.dry_run,
            "loaded broken image targets"
        );
        log.record("run.started", "ok", LogEvent::default());

        let mut files = Vec::new();
        let mut skipped_files = Vec::new();
        for (relative_path, targets) in group_by_file(loaded.targets) {
            let opened = resolve_content_path(&options.content_root, &relative_path)
                .and_then(|path| read_document(&path).map(|document| (path, document)));
            let (path, document) = match opened {
                Ok(opened) => opened,
                Err(err) => {
                    warn!(file = %relative_path, error = %err, "skipping content file");
                    log.record(
                        "file.skipped",
                        "skipped",
                        LogEvent {
                            relative_path: Some(relative_path.as_str()),
                            error: Some(&err),
                            ..LogEvent::default()
                        },
                    );
                    state.counters.files_skipped += 1;
                    skipped_files.push(SkippedFile {
                        relative_path,
                        reason: err.to_string(),
                    });
                    continue;
                }
            };

            let summary = self.remediate_file(
                &relative_path,
                &path,
                &document,
                &targets,
                options.dry_run,
                state,
                &log,
            );
            state.counters.total_fixed += summary.fixed;
            state.counters.total_failed += summary.failed;
            state.counters.already_clean += summary.already_clean;
            info!(
                file = %relative_path,
                fixed = summary.fixed,
                failed = summary.failed,
                already_clean = summary.already_clean,
                written = summary.written,
                "file processed"
            );
            files.push(summary);
        }

        let summary = RunSummary {
            run_id,
            report_path,
            dry_run: options.dry_run,
            started_at,
            finished_at: Utc::now().to_rfc3339(),
            counters: state.counters.since(&counters_before),
            provider_calls: self.resolver.stats().provider_calls - calls_before,
            files,
            skipped_files,
        };
        log.record("run.finished", "ok", LogEvent::default());
        Ok(summary)
    }

    #[allow(
        clippy::too_many_arguments,
        reason = "per-file step threads run-scoped state explicitly"
    )]
    fn remediate_file(
        &mut self,
        relative_path: &str,
        path: &Path,
        document: &ContentDocument,
        targets: &[RemediationTarget],
        dry_run: bool,
        state: &mut RunState,
        log: &RunLog,
    ) -> FileSummary {
        let mut summary = FileSummary {
            relative_path: relative_path.to_string(),
            ..FileSummary::default()
        };
        let mut pending = Vec::<UrlReplacement>::new();

        for target in distinct_by_url(targets) {
            match occurrences_in(&document.value, &target.url) {
                Ok(0) => {
                    summary.already_clean += 1;
                    log.record(
                        "url.already_clean",
                        "skipped",
                        LogEvent {
                            relative_path: Some(relative_path),
                            broken_url: Some(target.url.as_str()),
                            ..LogEvent::default()
                        },
                    );
                    continue;
                }
                Ok(_) => {}
                Err(err) => {
                    record_failure(&mut summary, log, relative_path, &target.url, None, &err);
                    continue;
                }
            }

            let resolution = self.resolver.resolve(
                &mut state.caches,
                &target.url,
                &target.json_path,
                target.file_name(),
            );
            match resolution.replacement {
                Some(replacement_url) => {
                    pending.push(UrlReplacement::new(target.url.clone(), replacement_url));
                }
                None => {
                    let err = MendError::Provider(resolution.error.unwrap_or_else(|| {
                        format!(
                            "no candidate for query {:?}",
                            resolution.query.unwrap_or_default()
                        )
                    }));
                    record_failure(
                        &mut summary,
                        log,
                        relative_path,
                        &target.url,
                        resolution.query,
                        &err,
                    );
                }
            }
        }

        if pending.is_empty() {
            return summary;
        }

        let outcome = match substitute_urls(&document.value, &pending) {
            Ok(outcome) => outcome,
            Err(err) => {
                for replacement in &pending {
                    record_failure(
                        &mut summary,
                        log,
                        relative_path,
                        &replacement.broken_url,
                        None,
                        &err,
                    );
                }
                return summary;
            }
        };

        for failed in &outcome.failed {
            let err = MendError::Validation(failed.reason.clone());
            record_failure(&mut summary, log, relative_path, &failed.broken_url, None, &err);
        }

        if outcome.changed() && !dry_run {
            if let Err(err) = write_document(path, &outcome.document, &document.format) {
                warn!(path = %path.display(), error = %err, "failed to persist rewritten document");
                for applied in &outcome.applied {
                    record_failure(
                        &mut summary,
                        log,
                        relative_path,
                        &applied.broken_url,
                        None,
                        &err,
                    );
                }
                return summary;
            }
            summary.written = true;
        }

        for applied in outcome.applied {
            summary.fixed += 1;
            log.record(
                "url.fixed",
                if dry_run { "planned" } else { "fixed" },
                LogEvent {
                    relative_path: Some(relative_path),
                    broken_url: Some(applied.broken_url.as_str()),
                    replacement_url: Some(applied.replacement_url.as_str()),
                    ..LogEvent::default()
                },
            );
            summary.replacements.push(Replacement {
                broken_url: applied.broken_url,
                replacement_url: applied.replacement_url,
                occurrences: applied.occurrences,
            });
        }
        summary
    }
}

fn record_failure(
    summary: &mut FileSummary,
    log: &RunLog,
    relative_path: &str,
    broken_url: &str,
    query: Option<&str>,
    err: &MendError,
) {
    summary.failed += 1;
    summary.failed_urls.push(broken_url.to_string());
    log.record(
        "url.failed",
        "failed",
        LogEvent {
            relative_path: Some(relative_path),
            broken_url: Some(broken_url),
            query,
            error: Some(err),
            ..LogEvent::default()
        },
    );
}

/// First target per broken URL, in report order.
fn distinct_by_url(targets: &[RemediationTarget]) -> Vec<&RemediationTarget> {
    let mut seen = HashSet::new();
    targets
        .iter()
        .filter(|target| seen.insert(target.url.as_str()))
        .collect()
}
