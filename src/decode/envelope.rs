//! Body parsing and path lookup
//!
//! Paths are dot-separated field names with optional array indexing
//! (`paging.next.after`, `data[0].id`, `items[-1]`). A leading `$.` is accepted.

use crate::error::{Error, Result};
use crate::types::JsonValue;

/// Parse a response body
///
/// A blank body decodes to `null`, which resolves to an empty page.
pub fn decode_body(body: &str) -> Result<JsonValue> {
    if body.trim().is_empty() {
        return Ok(JsonValue::Null);
    }
    serde_json::from_str(body).map_err(|e| Error::Decode {
        message: format!("Failed to parse JSON: {e}"),
    })
}

/// Look up a value by path
pub fn lookup_path<'a>(value: &'a JsonValue, path: &str) -> Option<&'a JsonValue> {
    let path = path.strip_prefix("$.").unwrap_or(path);
    if path.is_empty() || path == "$" {
        return Some(value);
    }

    let mut current = value;
    for part in path.split('.') {
        match part.find('[') {
            Some(bracket) if part.ends_with(']') => {
                let name = &part[..bracket];
                let index = &part[bracket + 1..part.len() - 1];
                if !name.is_empty() {
                    current = current.get(name)?;
                }
                let items = current.as_array()?;
                let index: i64 = index.parse().ok()?;
                let position = if index < 0 {
                    items.len().checked_sub(index.unsigned_abs() as usize)?
                } else {
                    index as usize
                };
                current = items.get(position)?;
            }
            _ => current = current.get(part)?,
        }
    }
    Some(current)
}

/// Look up a pagination token by path
///
/// Strings are returned as-is and numbers are rendered. Empty strings, `null`
/// and structured values mean there is no token.
pub fn lookup_token(value: &JsonValue, path: &str) -> Option<String> {
    match lookup_path(value, path)? {
        JsonValue::String(s) if !s.is_empty() => Some(s.clone()),
        JsonValue::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
