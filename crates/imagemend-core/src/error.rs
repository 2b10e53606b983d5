use serde::Serialize;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, MendError>;

#[derive(Debug, Error)]
pub enum MendError {
    #[error("fatal precondition: {0}")]
    FatalPrecondition(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("parse failed for {path}: {message}")]
    Parse { path: String, message: String },

    #[error("search provider error: {0}")]
    Provider(String),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorPayload {
    pub code: String,
    pub message: String,
    pub operation: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

impl MendError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::FatalPrecondition(_) => "FATAL_PRECONDITION",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Parse { .. } => "PARSE_ERROR",
            Self::Provider(_) => "PROVIDER_ERROR",
            Self::Validation(_) => "VALIDATION_FAILED",
            Self::Io(_) => "IO_ERROR",
            Self::Json(_) => "JSON_ERROR",
            Self::Http(_) => "HTTP_ERROR",
        }
    }

    /// Errors that end a run instead of being recovered per file or per URL.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::FatalPrecondition(_) | Self::NotFound(_) | Self::Parse { .. }
        )
    }

    pub(crate) fn parse(path: impl Into<String>, message: impl ToString) -> Self {
        Self::Parse {
            path: path.into(),
            message: message.to_string(),
        }
    }

    pub fn to_payload(&self, operation: impl Into<String>, path: Option<String>) -> ErrorPayload {
        ErrorPayload {
            code: self.code().to_string(),
            message: self.to_string(),
            operation: operation.into(),
            path,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_error_carries_offending_path() {
        let err = MendError::parse("content/hotels/arpaiu.json", "expected value at line 1");
        assert_eq!(err.code(), "PARSE_ERROR");
        assert!(err.to_string().contains("content/hotels/arpaiu.json"));
    }

    #[test]
    fn provider_errors_are_recoverable() {
        assert!(!MendError::Provider("status 503".to_string()).is_fatal());
        assert!(!MendError::Validation("bad rewrite".to_string()).is_fatal());
        assert!(MendError::FatalPrecondition("missing key".to_string()).is_fatal());
    }

    #[test]
    fn payload_omits_empty_path() {
        let payload = MendError::NotFound("audit report".to_string()).to_payload("load", None);
        let value = serde_json::to_value(payload).expect("serialize payload");
        assert_eq!(value["code"], "NOT_FOUND");
        assert!(value.get("path").is_none());
    }
}
