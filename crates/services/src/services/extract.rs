use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("model output is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("expected a JSON object or an array of objects")]
    UnexpectedShape,
}

/// Locate and parse the first complete JSON value embedded in free text.
///
/// Model output routinely arrives wrapped in commentary, so this scans for
/// the first `{` or `[` and walks forward tracking nesting depth and
/// string-escape state until the value closes. When no candidate is found
/// (or the value never closes) the whole raw text is handed to the parser,
/// matching the fallback of treating the response as bare JSON.
pub fn extract_json(raw: &str) -> Result<Value, ExtractError> {
    let candidate = first_json_value(raw).unwrap_or(raw);
    Ok(serde_json::from_str(candidate)?)
}

fn first_json_value(raw: &str) -> Option<&str> {
    let start = raw.find(['{', '['])?;
    let bytes = raw.as_bytes();
    let open = bytes[start];
    let close = if open == b'{' { b'}' } else { b']' };

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    for (offset, &byte) in bytes[start..].iter().enumerate() {
        if in_string {
            if escaped {
                escaped = false;
            } else if byte == b'\\' {
                escaped = true;
            } else if byte == b'"' {
                in_string = false;
            }
            continue;
        }
        if byte == b'"' {
            in_string = true;
        } else if byte == open {
            depth += 1;
        } else if byte == close {
            depth -= 1;
            if depth == 0 {
                return Some(&raw[start..=start + offset]);
            }
        }
    }
    None
}

/// Normalize a parsed task-breakdown response into a list of candidate
/// assignments. A bare object is a single-entry batch; anything that is
/// neither object nor array aborts the whole operation.
pub fn normalize_assignments(value: Value) -> Result<Vec<Value>, ExtractError> {
    match value {
        Value::Array(entries) => Ok(entries),
        object @ Value::Object(_) => Ok(vec![object]),
        _ => Err(ExtractError::UnexpectedShape),
    }
}
