use serde::{Deserialize, Serialize};

pub const BROKEN_IMAGE_CATEGORY: &str = "broken_image";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditIssue {
    pub category: String,
    pub severity: String,
    pub url: String,
    pub file: String,
    pub relative_path: String,
    pub json_path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    #[serde(default)]
    pub suggested_fix: Option<String>,
    #[serde(default)]
    pub auto_fixable: bool,
}

impl AuditIssue {
    #[must_use]
    pub fn is_broken_image(&self) -> bool {
        self.category == BROKEN_IMAGE_CATEGORY
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditReport {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generated_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_root: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<serde_json::Value>,
    pub issues: Vec<AuditIssue>,
}

/// The slice of an [`AuditIssue`] the remediation engine acts on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemediationTarget {
    pub url: String,
    pub file: String,
    pub relative_path: String,
    pub json_path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

impl RemediationTarget {
    /// File name used for query classification; falls back to the relative path
    /// when the reported `file` has no final component.
    #[must_use]
    pub fn file_name(&self) -> &str {
        last_component(&self.file)
            .or_else(|| last_component(&self.relative_path))
            .unwrap_or_default()
    }
}

fn last_component(raw: &str) -> Option<&str> {
    raw.rsplit(['/', '\\']).next().filter(|name| !name.is_empty())
}

impl From<&AuditIssue> for RemediationTarget {
    fn from(issue: &AuditIssue) -> Self {
        Self {
            url: issue.url.clone(),
            file: issue.file.clone(),
            relative_path: issue.relative_path.clone(),
            json_path: issue.json_path.clone(),
            context: issue.context.clone(),
        }
    }
}
