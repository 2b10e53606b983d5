mod audit;
mod log;
mod run;
mod search;

pub use audit::{AuditIssue, AuditReport, BROKEN_IMAGE_CATEGORY, RemediationTarget};
pub use log::RemediationLogEntry;
pub use run::{FileSummary, Replacement, RunCounters, RunSummary, SkippedFile};
pub use search::{Attribution, CandidateImage, ImageUrls};
