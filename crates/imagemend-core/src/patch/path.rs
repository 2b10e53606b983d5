use serde_json::Value;

use crate::error::{MendError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

/// Parses audit-style structural paths: `hotel.images[0].url`,
/// `$.hotel.images[0].url` and `rooms["sea view"].photo`.
pub fn parse_json_path(raw: &str) -> Result<Vec<PathSegment>> {
    let trimmed = raw.trim();
    let body = trimmed
        .strip_prefix('$')
        .map_or(trimmed, |rest| rest.strip_prefix('.').unwrap_or(rest));
    if body.is_empty() {
        return Err(invalid(raw, "path is empty"));
    }

    let mut segments = Vec::new();
    let mut key = String::new();
    let mut chars = body.chars().peekable();
    while let Some(ch) = chars.next() {
        match ch {
            '.' => {
                if key.is_empty() && !matches!(segments.last(), Some(PathSegment::Index(_))) {
                    return Err(invalid(raw, "empty key"));
                }
                flush_key(&mut key, &mut segments);
            }
            '[' => {
                flush_key(&mut key, &mut segments);
                let mut inner = String::new();
                let mut closed = false;
                for next in chars.by_ref() {
                    if next == ']' {
                        closed = true;
                        break;
                    }
                    inner.push(next);
                }
                if !closed {
                    return Err(invalid(raw, "unclosed bracket"));
                }
                segments.push(bracket_segment(raw, inner.trim())?);
                if chars.peek().is_some_and(|next| *next != '.' && *next != '[') {
                    return Err(invalid(raw, "expected '.' or '[' after ']'"));
                }
            }
            other => key.push(other),
        }
    }
    if body.ends_with('.') {
        return Err(invalid(raw, "trailing '.'"));
    }
    flush_key(&mut key, &mut segments);
    Ok(segments)
}

/// Sets the value at one existing location and returns the value it replaced.
/// Every segment must already exist; nothing is created.
pub fn set_at_path(document: &mut Value, json_path: &str, value: Value) -> Result<Value> {
    let segments = parse_json_path(json_path)?;
    let mut cursor = document;
    for segment in &segments {
        let next = match segment {
            PathSegment::Key(key) => cursor.as_object_mut().and_then(|map| map.get_mut(key)),
            PathSegment::Index(index) => cursor
                .as_array_mut()
                .and_then(|items| items.get_mut(*index)),
        };
        cursor = next.ok_or_else(|| MendError::NotFound(format!("json path {json_path}")))?;
    }
    Ok(std::mem::replace(cursor, value))
}

fn flush_key(key: &mut String, segments: &mut Vec<PathSegment>) {
    if !key.is_empty() {
        segments.push(PathSegment::Key(std::mem::take(key)));
    }
}

fn bracket_segment(raw: &str, inner: &str) -> Result<PathSegment> {
    if let Some(quoted) = inner
        .strip_prefix('"')
        .and_then(|rest| rest.strip_suffix('"'))
        .or_else(|| inner.strip_prefix('\'').and_then(|rest| rest.strip_suffix('\'')))
    {
        return Ok(PathSegment::Key(quoted.to_string()));
    }
    inner
        .parse::<usize>()
        .map(PathSegment::Index)
        .map_err(|_| invalid(raw, &format!("invalid index [{inner}]")))
}

fn invalid(raw: &str, reason: &str) -> MendError {
    MendError::Validation(format!("invalid json path {raw:?}: {reason}"))
}
