// Public fallible APIs in this crate share one concrete error contract (`MendError`).
// Repeating per-function `# Errors` boilerplate obscures behavior more than it clarifies.
#![allow(
    clippy::missing_errors_doc,
    reason = "crate-wide fallible API uses one explicit error type; per-item boilerplate would duplicate contract"
)]

pub mod classify;
pub mod config;
pub mod document;
pub mod error;
pub mod models;
pub mod patch;
pub mod provider;
pub mod remediation;
pub mod report;
pub mod resolver;
pub mod run_log;
#[cfg(test)]
mod test_support;
pub mod throttle;

pub use config::{RemediationConfig, SearchProviderConfig};
pub use error::{MendError, Result};
pub use provider::{ImageSearchProvider, UnsplashProvider};
pub use remediation::{Remediator, RunOptions, RunState};
pub use throttle::{FixedDelay, NoDelay, Throttle};
