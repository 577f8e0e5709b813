//! Resilient extraction of a JSON value from noisy model output.
//!
//! Model responses wrap their payload in markdown fences, lead-in prose,
//! or trailing commentary. The decoder walks a fixed precedence order:
//! fenced block tagged `json`, then any fenced block, then the widest
//! bracket span matching the expected shape, then a structural parse.
//! Callers always receive either a value or a [`DecodeError`].

use thiserror::Error;

/// The top-level JSON shape a caller expects back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JsonShape {
    Array,
    Object,
}

impl JsonShape {
    const fn open(self) -> char {
        match self {
            Self::Array => '[',
            Self::Object => '{',
        }
    }

    const fn close(self) -> char {
        match self {
            Self::Array => ']',
            Self::Object => '}',
        }
    }

    fn matches(self, value: &serde_json::Value) -> bool {
        match self {
            Self::Array => value.is_array(),
            Self::Object => value.is_object(),
        }
    }
}

impl std::fmt::Display for JsonShape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Array => f.write_str("array"),
            Self::Object => f.write_str("object"),
        }
    }
}

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("No JSON {0} found in response text")]
    NotFound(JsonShape),
    #[error("Expected a JSON {expected}, got a different shape")]
    WrongShape { expected: JsonShape },
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

pub type DecodeResult<T> = Result<T, DecodeError>;

/// Locate and parse the JSON value embedded in `raw`.
///
/// # Errors
///
/// Fails when no candidate span can be located, when the span does not
/// parse, or when the parsed value is not the expected shape.
pub fn decode_json(raw: &str, shape: JsonShape) -> DecodeResult<serde_json::Value> {
    let candidate = fenced_block(raw, true)
        .or_else(|| fenced_block(raw, false))
        .unwrap_or(raw);

    let candidate = bracket_span(candidate, shape).ok_or(DecodeError::NotFound(shape))?;

    let value: serde_json::Value = serde_json::from_str(candidate)?;

    if shape.matches(&value) {
        Ok(value)
    } else {
        Err(DecodeError::WrongShape { expected: shape })
    }
}

/// Interior of the first complete fenced code block. With `tagged_json`
/// set, only a fence opened with ```` ```json ```` qualifies.
fn fenced_block(text: &str, tagged_json: bool) -> Option<&str> {
    let marker = if tagged_json { "```json" } else { "```" };
    let open = text.find(marker)?;
    let body_start = open + marker.len();
    let close = text[body_start..].find("```")?;
    Some(text[body_start..body_start + close].trim())
}

/// Widest span from the first opening bracket to the last matching closing
/// bracket for the expected shape.
fn bracket_span(text: &str, shape: JsonShape) -> Option<&str> {
    let start = text.find(shape.open())?;
    let end = text.rfind(shape.close())?;
    if end < start {
        return None;
    }
    Some(&text[start..=end])
}
