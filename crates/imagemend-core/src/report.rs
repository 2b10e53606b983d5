use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use globset::{Glob, GlobMatcher};
use walkdir::WalkDir;

use crate::error::{MendError, Result};
use crate::models::{AuditReport, RemediationTarget};

// Reports live in the content root or one directory below it (e.g. `reports/`).
const REPORT_SEARCH_DEPTH: usize = 2;

#[derive(Debug, Clone)]
pub struct ReportLocator {
    matcher: GlobMatcher,
}

impl ReportLocator {
    pub fn new(pattern: &str) -> Result<Self> {
        let glob = Glob::new(pattern).map_err(|err| {
            MendError::Validation(format!("invalid report pattern {pattern}: {err}"))
        })?;
        Ok(Self {
            matcher: glob.compile_matcher(),
        })
    }

    /// Returns the report whose file name sorts last. Report names embed a
    /// sortable timestamp, so this is the most recent one.
    pub fn find_latest(&self, content_root: &Path) -> Result<PathBuf> {
        if !content_root.is_dir() {
            return Err(MendError::NotFound(format!(
                "content root {}",
                content_root.display()
            )));
        }

        WalkDir::new(content_root)
            .max_depth(REPORT_SEARCH_DEPTH)
            .into_iter()
            .filter_map(std::result::Result::ok)
            .filter(|entry| entry.file_type().is_file())
            .filter(|entry| self.matcher.is_match(entry.file_name()))
            .max_by(|left, right| left.file_name().cmp(right.file_name()))
            .map(walkdir::DirEntry::into_path)
            .ok_or_else(|| {
                MendError::NotFound(format!(
                    "no audit report under {}",
                    content_root.display()
                ))
            })
    }
}

pub fn load_report(path: &Path) -> Result<AuditReport> {
    if !path.is_file() {
        return Err(MendError::NotFound(format!(
            "audit report {}",
            path.display()
        )));
    }
    let raw = fs::read_to_string(path)?;
    serde_json::from_str(&raw).map_err(|err| MendError::parse(path.display().to_string(), err))
}

/// Projects the broken-image issues of a report, keeping report order.
#[must_use]
pub fn remediation_targets(report: &AuditReport) -> Vec<RemediationTarget> {
    report
        .issues
        .iter()
        .filter(|issue| issue.is_broken_image())
        .map(RemediationTarget::from)
        .collect()
}

#[derive(Debug, Clone)]
pub struct LoadedTargets {
    pub report_path: PathBuf,
    pub targets: Vec<RemediationTarget>,
}

/// Loads targets from `explicit_report` when given, otherwise from the latest
/// report discovered under `content_root`.
pub fn load_remediation_targets(
    locator: &ReportLocator,
    content_root: &Path,
    explicit_report: Option<&Path>,
) -> Result<LoadedTargets> {
    let report_path = match explicit_report {
        Some(path) => path.to_path_buf(),
        None => locator.find_latest(content_root)?,
    };
    let report = load_report(&report_path)?;
    Ok(LoadedTargets {
        targets: remediation_targets(&report),
        report_path,
    })
}

#[must_use]
pub fn group_by_file(targets: Vec<RemediationTarget>) -> BTreeMap<String, Vec<RemediationTarget>> {
    let mut grouped = BTreeMap::<String, Vec<RemediationTarget>>::new();
    for target in targets {
        grouped
            .entry(target.relative_path.clone())
            .or_default()
            .push(target);
    }
    grouped
}
