//! Document rewriting for resolved broken references.
//!
//! [`substitute_urls`] is the default repair: every literal occurrence of a
//! broken URL anywhere in the serialized document is replaced, so a reference
//! repeated under several structural paths is removed in one pass.
//! [`set_at_path`] is a narrower primitive that updates exactly one known
//! location and is never used as a fallback for substitution.

use serde::Serialize;
use serde_json::Value;

use crate::error::{MendError, Result};

mod path;

pub use path::{PathSegment, parse_json_path, set_at_path};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlReplacement {
    pub broken_url: String,
    pub replacement_url: String,
}

impl UrlReplacement {
    pub fn new(broken_url: impl Into<String>, replacement_url: impl Into<String>) -> Self {
        Self {
            broken_url: broken_url.into(),
            replacement_url: replacement_url.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppliedFix {
    pub broken_url: String,
    pub replacement_url: String,
    pub occurrences: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    NotPresent,
    Validation,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedFix {
    pub broken_url: String,
    pub kind: FailureKind,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PatchOutcome {
    pub document: Value,
    pub applied: Vec<AppliedFix>,
    pub failed: Vec<FailedFix>,
}

impl PatchOutcome {
    #[must_use]
    pub fn changed(&self) -> bool {
        !self.applied.is_empty()
    }
}

/// Replaces every occurrence of each broken URL, in order. A replacement that
/// does not validate is dropped on its own; fixes already applied to the
/// document by earlier replacements are kept.
///
/// Matching is literal on the serialized text, so a longer URL that begins
/// with the broken one (`a.jpg?v=2`) has that prefix rewritten as well.
pub fn substitute_urls(
    document: &Value,
    replacements: &[UrlReplacement],
) -> Result<PatchOutcome> {
    let mut text = serde_json::to_string(document)?;
    let mut current = None::<Value>;
    let mut applied = Vec::new();
    let mut failed = Vec::new();

    for replacement in replacements {
        let needle = encode_fragment(&replacement.broken_url)?;
        let occurrences = count_occurrences(&text, &needle);
        if needle.is_empty() || occurrences == 0 {
            failed.push(FailedFix {
                broken_url: replacement.broken_url.clone(),
                kind: FailureKind::NotPresent,
                reason: "broken url does not occur in document".to_string(),
            });
            continue;
        }

        let rewritten = text.replace(&needle, &encode_fragment(&replacement.replacement_url)?);
        match validate_rewrite(&rewritten, &needle) {
            Ok(value) => {
                text = rewritten;
                current = Some(value);
                applied.push(AppliedFix {
                    broken_url: replacement.broken_url.clone(),
                    replacement_url: replacement.replacement_url.clone(),
                    occurrences,
                });
            }
            Err(err) => failed.push(FailedFix {
                broken_url: replacement.broken_url.clone(),
                kind: FailureKind::Validation,
                reason: err.to_string(),
            }),
        }
    }

    Ok(PatchOutcome {
        document: current.unwrap_or_else(|| document.clone()),
        applied,
        failed,
    })
}

/// Counts literal occurrences of `url` in the serialized document.
pub fn occurrences_in(document: &Value, url: &str) -> Result<usize> {
    let needle = encode_fragment(url)?;
    if needle.is_empty() {
        return Ok(0);
    }
    Ok(count_occurrences(&serde_json::to_string(document)?, &needle))
}

/// The rewritten text must parse and must no longer contain the broken URL.
fn validate_rewrite(rewritten: &str, needle: &str) -> Result<Value> {
    let value = serde_json::from_str::<Value>(rewritten).map_err(|err| {
        MendError::Validation(format!("rewritten document does not parse: {err}"))
    })?;
    if rewritten.contains(needle) {
        return Err(MendError::Validation(
            "replacement reintroduces the broken url".to_string(),
        ));
    }
    Ok(value)
}

// A URL as it appears inside a serialized JSON string, without the quotes.
fn encode_fragment(raw: &str) -> Result<String> {
    let quoted = serde_json::to_string(raw)?;
    Ok(quoted[1..quoted.len() - 1].to_string())
}

fn count_occurrences(haystack: &str, needle: &str) -> usize {
    haystack.matches(needle).count()
}
