use std::fs;
use std::io::Write;
use std::path::{Component, Path, PathBuf};

use serde::Serialize;
use serde_json::Value;
use serde_json::ser::{PrettyFormatter, Serializer};

use crate::error::{MendError, Result};

const DEFAULT_INDENT: &str = "  ";

/// Layout details of a content file that a rewrite must reproduce.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentFormat {
    pub indent: String,
    pub trailing_newline: bool,
}

impl Default for DocumentFormat {
    fn default() -> Self {
        Self {
            indent: DEFAULT_INDENT.to_string(),
            trailing_newline: true,
        }
    }
}

impl DocumentFormat {
    #[must_use]
    pub fn detect(raw: &str) -> Self {
        let indent = raw
            .lines()
            .skip(1)
            .map(|line| {
                let trimmed = line.trim_start_matches([' ', '\t']);
                &line[..line.len() - trimmed.len()]
            })
            .find(|leading| !leading.is_empty())
            .map_or_else(|| DEFAULT_INDENT.to_string(), ToString::to_string);
        Self {
            indent,
            trailing_newline: raw.ends_with('\n'),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ContentDocument {
    pub value: Value,
    pub format: DocumentFormat,
}

/// Joins a report-supplied path onto the content root. Absolute paths,
/// `..` segments and symlinks that lead outside the root are rejected.
pub fn resolve_content_path(root: &Path, relative_path: &str) -> Result<PathBuf> {
    let relative = Path::new(relative_path);
    let stays_inside = relative
        .components()
        .all(|component| matches!(component, Component::Normal(_) | Component::CurDir))
        && relative
            .components()
            .any(|component| matches!(component, Component::Normal(_)));
    if !stays_inside {
        return Err(MendError::Validation(format!(
            "path escapes content root: {relative_path}"
        )));
    }

    let path = root.join(relative);
    if path.exists() && !fs::canonicalize(&path)?.starts_with(fs::canonicalize(root)?) {
        return Err(MendError::Validation(format!(
            "path resolves outside content root: {relative_path}"
        )));
    }
    Ok(path)
}

pub fn read_document(path: &Path) -> Result<ContentDocument> {
    let raw = fs::read_to_string(path)?;
    let value = serde_json::from_str(&raw)
        .map_err(|err| MendError::parse(path.display().to_string(), err))?;
    Ok(ContentDocument {
        value,
        format: DocumentFormat::detect(&raw),
    })
}

pub fn render_document(value: &Value, format: &DocumentFormat) -> Result<String> {
    let mut out = Vec::new();
    let formatter = PrettyFormatter::with_indent(format.indent.as_bytes());
    let mut serializer = Serializer::with_formatter(&mut out, formatter);
    value.serialize(&mut serializer)?;
    if format.trailing_newline {
        out.push(b'\n');
    }
    String::from_utf8(out)
        .map_err(|err| MendError::Validation(format!("rendered document is not utf-8: {err}")))
}

/// Replaces the whole file through a sibling temp file and a rename, so
/// readers observe either the old document or the new one.
pub fn write_document(path: &Path, value: &Value, format: &DocumentFormat) -> Result<()> {
    let rendered = render_document(value, format)?;
    let parent = path.parent().ok_or_else(|| {
        MendError::Validation(format!("target has no parent: {}", path.display()))
    })?;
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| {
            MendError::Validation(format!("invalid target filename: {}", path.display()))
        })?;
    let tmp_path = parent.join(format!(
        ".{file_name}.imagemend.tmp.{}",
        uuid::Uuid::new_v4().simple()
    ));

    {
        let mut tmp = fs::OpenOptions::new()
            .create_new(true)
            .write(true)
            .open(&tmp_path)?;
        tmp.write_all(rendered.as_bytes())?;
        tmp.sync_all()?;
    }

    if let Err(err) = fs::rename(&tmp_path, path) {
        let _ = fs::remove_file(&tmp_path);
        return Err(MendError::from(err));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use tempfile::tempdir;

    use super::*;

    #[test]
    fn detect_reads_indent_of_first_nested_line() {
        let four = DocumentFormat::detect("{\n    \"a\": 1\n}\n");
        assert_eq!(four.indent, "    ");
        assert!(four.trailing_newline);

        let tab = DocumentFormat::detect("{\n\t\"a\": 1\n}");
        assert_eq!(tab.indent, "\t");
        assert!(!tab.trailing_newline);

        let compact = DocumentFormat::detect("{\"a\":1}");
        assert_eq!(compact.indent, "  ");
    }

    #[test]
    fn rewrite_preserves_indent_and_key_order() {
        let root = tempdir().expect("tempdir");
        let path = root.path().join("hotel.json");
        let original = "{\n    \"name\": \"La Torretta\",\n    \"images\": [\n        \"https://broken.example/a.jpg\"\n    ]\n}\n";
        fs::write(&path, original).expect("write");

        let mut document = read_document(&path).expect("read");
        document.value["images"][0] = json!("https://images.example/a?w=1080");
        write_document(&path, &document.value, &document.format).expect("rewrite");

        let rewritten = fs::read_to_string(&path).expect("read back");
        assert_eq!(
            rewritten,
            "{\n    \"name\": \"La Torretta\",\n    \"images\": [\n        \"https://images.example/a?w=1080\"\n    ]\n}\n"
        );
        let leftovers = fs::read_dir(root.path()).expect("list").count();
        assert_eq!(leftovers, 1, "temp file must not survive the rename");
    }

    #[test]
    fn content_paths_must_stay_under_the_root() {
        let parent = tempdir().expect("tempdir");
        let root = parent.path().join("content");
        fs::create_dir_all(root.join("hotels")).expect("mkdir");
        fs::write(root.join("hotels/stella.json"), "{}").expect("write");
        fs::write(parent.path().join("outside.json"), "{}").expect("write");

        assert_eq!(
            resolve_content_path(&root, "hotels/stella.json").expect("inside"),
            root.join("hotels/stella.json")
        );
        assert!(resolve_content_path(&root, "./hotels/stella.json").is_ok());
        for escaping in ["../outside.json", "hotels/../../outside.json", "", "."] {
            let err = resolve_content_path(&root, escaping).expect_err(escaping);
            assert!(matches!(err, MendError::Validation(_)), "{escaping}: {err:?}");
        }
        let absolute = parent.path().join("outside.json");
        assert!(resolve_content_path(&root, &absolute.display().to_string()).is_err());
    }

    #[cfg(unix)]
    #[test]
    fn symlink_out_of_the_root_is_rejected() {
        let parent = tempdir().expect("tempdir");
        let root = parent.path().join("content");
        fs::create_dir_all(&root).expect("mkdir");
        fs::write(parent.path().join("outside.json"), "{}").expect("write");
        std::os::unix::fs::symlink(parent.path().join("outside.json"), root.join("linked.json"))
            .expect("symlink");

        let err = resolve_content_path(&root, "linked.json").expect_err("escapes");
        assert!(matches!(err, MendError::Validation(_)));
    }

    #[test]
    fn malformed_content_is_a_parse_error_naming_the_file() {
        let root = tempdir().expect("tempdir");
        let path = root.path().join("broken.json");
        fs::write(&path, "{ \"images\": [ }").expect("write");
        let err = read_document(&path).expect_err("malformed");
        match err {
            MendError::Parse { path: reported, .. } => assert!(reported.ends_with("broken.json")),
            other => panic!("expected parse error, got {other:?}"),
        }
    }
}
