use std::path::PathBuf;

use clap::Parser;


#[derive(Debug, Parser)]
#[command(name = "imagemend")]
#[command(
    about = "Replace broken image references listed in a content audit report",
    version
)]
pub struct Cli {
    /// Content root scanned by the audit; the latest report is looked up here.
    pub content_path: PathBuf,

    /// Resolve and report replacements without rewriting any file.
    #[arg(long)]
    pub dry_run: bool,

    /// Use this report instead of discovering the latest one.
    #[arg(long)]
    pub report: Option<PathBuf>,

    /// Print the run summary as JSON.
    #[arg(long)]
    pub json: bool,

    /// Pause after each uncached search, overriding IMAGEMEND_SEARCH_DELAY_MS.
    #[arg(long)]
    pub delay_ms: Option<u64>,

    /// Append one JSON line per remediation event to this file.
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    #[arg(short, long)]
    pub verbose: bool,
}
