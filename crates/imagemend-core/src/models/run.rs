use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunCounters {
    pub total_fixed: usize,
    pub total_failed: usize,
    pub already_clean: usize,
    pub files_skipped: usize,
}

impl RunCounters {
    /// Counts accumulated after `earlier` was taken.
    #[must_use]
    pub fn since(&self, earlier: &RunCounters) -> RunCounters {
        RunCounters {
            total_fixed: self.total_fixed.saturating_sub(earlier.total_fixed),
            total_failed: self.total_failed.saturating_sub(earlier.total_failed),
            already_clean: self.already_clean.saturating_sub(earlier.already_clean),
            files_skipped: self.files_skipped.saturating_sub(earlier.files_skipped),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Replacement {
    pub broken_url: String,
    pub replacement_url: String,
    pub occurrences: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileSummary {
    pub relative_path: String,
    pub fixed: usize,
    pub failed: usize,
    pub already_clean: usize,
    pub written: bool,
    pub replacements: Vec<Replacement>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failed_urls: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkippedFile {
    pub relative_path: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunSummary {
    pub run_id: String,
    pub report_path: String,
    pub dry_run: bool,
    pub started_at: String,
    pub finished_at: String,
    pub counters: RunCounters,
    pub provider_calls: usize,
    pub files: Vec<FileSummary>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skipped_files: Vec<SkippedFile>,
}

impl RunSummary {
    #[must_use]
    pub fn files_modified(&self) -> usize {
        self.files.iter().filter(|file| file.written).count()
    }
}
