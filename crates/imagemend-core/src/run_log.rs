use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Utc;

use crate::error::MendError;
use crate::models::RemediationLogEntry;

/// Append-only JSONL record of one run. Writing is best-effort: a log that
/// cannot be written never fails the run.
#[derive(Debug, Clone)]
pub struct RunLog {
    path: Option<PathBuf>,
    run_id: String,
    dry_run: bool,
}

#[derive(Debug, Clone, Default)]
pub struct LogEvent<'a> {
    pub relative_path: Option<&'a str>,
    pub broken_url: Option<&'a str>,
    pub replacement_url: Option<&'a str>,
    pub query: Option<&'a str>,
    pub error: Option<&'a MendError>,
    pub error_message: Option<&'a str>,
}

impl RunLog {
    pub fn new(path: Option<PathBuf>, run_id: impl Into<String>, dry_run: bool) -> Self {
        Self {
            path,
            run_id: run_id.into(),
            dry_run,
        }
    }

    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn record(&self, event: &str, status: &str, details: LogEvent<'_>) {
        let entry = RemediationLogEntry {
            run_id: self.run_id.clone(),
            event: event.to_string(),
            status: status.to_string(),
            dry_run: self.dry_run,
            created_at: Utc::now().to_rfc3339(),
            relative_path: details.relative_path.map(str::to_string),
            broken_url: details.broken_url.map(str::to_string),
            replacement_url: details.replacement_url.map(str::to_string),
            query: details.query.map(str::to_string),
            error_code: details.error.map(|err| err.code().to_string()),
            error_message: details
                .error
                .map(ToString::to_string)
                .or_else(|| details.error_message.map(str::to_string)),
        };
        self.try_append(&entry);
    }

    fn try_append(&self, entry: &RemediationLogEntry) {
        let Some(path) = &self.path else {
            return;
        };
        if let Ok(serialized) = serde_json::to_string(entry) {
            let mut line = serialized;
            line.push('\n');
            if let Some(parent) = path.parent() {
                let _ = fs::create_dir_all(parent);
            }
            if let Ok(mut file) = fs::OpenOptions::new().create(true).append(true).open(path) {
                let _ = file.write_all(line.as_bytes());
            }
        }
    }
}
