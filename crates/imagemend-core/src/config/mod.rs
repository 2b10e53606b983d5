use std::time::Duration;

use crate::error::{MendError, Result};

mod env;

pub const ACCESS_KEY_ENV: &str = "UNSPLASH_ACCESS_KEY";
pub const SEARCH_ENDPOINT_ENV: &str = "IMAGEMEND_SEARCH_ENDPOINT";
pub const SEARCH_DELAY_MS_ENV: &str = "IMAGEMEND_SEARCH_DELAY_MS";
pub const SEARCH_TIMEOUT_MS_ENV: &str = "IMAGEMEND_SEARCH_TIMEOUT_MS";
pub const REPORT_GLOB_ENV: &str = "IMAGEMEND_REPORT_GLOB";

pub const DEFAULT_SEARCH_ENDPOINT: &str = "https://api.unsplash.com/search/photos";
pub const DEFAULT_SEARCH_DELAY_MS: u64 = 1200;
pub const DEFAULT_SEARCH_TIMEOUT_MS: u64 = 10_000;
pub const DEFAULT_REPORT_GLOB: &str = "audit-report-*.json";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchProviderConfig {
    pub endpoint: String,
    pub access_key: String,
    pub timeout_ms: u64,
}

impl SearchProviderConfig {
    #[must_use]
    pub fn new(access_key: impl Into<String>) -> Self {
        Self {
            endpoint: DEFAULT_SEARCH_ENDPOINT.to_string(),
            access_key: access_key.into(),
            timeout_ms: DEFAULT_SEARCH_TIMEOUT_MS,
        }
    }

    /// Reads the provider credential and endpoint. A missing credential is a
    /// fatal precondition: nothing else is attempted without it.
    pub fn from_env() -> Result<Self> {
        let access_key = env::read_non_empty_env(ACCESS_KEY_ENV).ok_or_else(|| {
            MendError::FatalPrecondition(format!("{ACCESS_KEY_ENV} is not set"))
        })?;
        Ok(Self {
            endpoint: env::read_non_empty_env(SEARCH_ENDPOINT_ENV)
                .map(|raw| raw.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_SEARCH_ENDPOINT.to_string()),
            access_key,
            timeout_ms: env::read_env_u64(SEARCH_TIMEOUT_MS_ENV)
                .filter(|value| *value > 0)
                .unwrap_or(DEFAULT_SEARCH_TIMEOUT_MS),
        })
    }

    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemediationConfig {
    pub search_delay_ms: u64,
    pub report_glob: String,
}

impl Default for RemediationConfig {
    fn default() -> Self {
        Self {
            search_delay_ms: DEFAULT_SEARCH_DELAY_MS,
            report_glob: DEFAULT_REPORT_GLOB.to_string(),
        }
    }
}

impl RemediationConfig {
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            search_delay_ms: env::read_env_u64(SEARCH_DELAY_MS_ENV)
                .unwrap_or(defaults.search_delay_ms),
            report_glob: env::read_non_empty_env(REPORT_GLOB_ENV)
                .unwrap_or(defaults.report_glob),
        }
    }

    #[must_use]
    pub fn search_delay(&self) -> Duration {
        Duration::from_millis(self.search_delay_ms)
    }
}
