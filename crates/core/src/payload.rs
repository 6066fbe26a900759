//! Tolerant decoding of raw producer payloads.
//!
//! Every request body is taken as raw bytes and decoded here. Failures carry
//! enough context (byte length and a bounded preview of the raw body) to debug
//! the producer without echoing an unbounded payload back.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};

/// Default upper bound on the raw-body preview carried by a [`DecodeError`].
pub const DEFAULT_PREVIEW_BYTES: usize = 500;

// ---------------------------------------------------------------------------
// Serde helpers
// ---------------------------------------------------------------------------

/// Deserialize `null` as `T::default()`.
///
/// Combined with `#[serde(default)]` this makes an absent key and an explicit
/// `null` behave identically.
pub fn nullable<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// A payload that could not be decoded.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("Malformed payload ({byte_length} bytes): {message}")]
pub struct DecodeError {
    /// Parser message describing the first failure.
    pub message: String,
    /// Length of the raw body in bytes.
    pub byte_length: usize,
    /// Lossy UTF-8 rendering of at most `preview_bytes` leading bytes.
    pub preview: String,
}

impl DecodeError {
    fn new(raw: &[u8], message: impl Into<String>, preview_bytes: usize) -> Self {
        Self {
            message: message.into(),
            byte_length: raw.len(),
            preview: preview(raw, preview_bytes),
        }
    }
}

/// Render at most `limit` leading bytes of `raw` as text.
pub fn preview(raw: &[u8], limit: usize) -> String {
    let end = raw.len().min(limit);
    String::from_utf8_lossy(&raw[..end]).into_owned()
}

// ---------------------------------------------------------------------------
// Decoding
// ---------------------------------------------------------------------------

/// Decoder settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeOptions {
    /// Preview bound for diagnostics.
    pub preview_bytes: usize,
    /// Retry a failed decode once after repairing under-escaped backslashes.
    pub repair_escapes: bool,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            preview_bytes: DEFAULT_PREVIEW_BYTES,
            repair_escapes: false,
        }
    }
}

/// A successfully decoded payload.
#[derive(Debug)]
pub struct Decoded<T> {
    pub value: T,
    /// Whether the value was only obtained after escape repair.
    pub repaired: bool,
}

/// Decode a raw JSON body into `T`.
///
/// An empty body or a bare `null` is rejected as "No JSON data provided".
/// Content type is never consulted.
pub fn decode<T: DeserializeOwned>(
    raw: &[u8],
    options: &DecodeOptions,
) -> Result<Decoded<T>, DecodeError> {
    let trimmed = raw.trim_ascii();
    if trimmed.is_empty() || trimmed == b"null" {
        return Err(DecodeError::new(
            raw,
            "No JSON data provided",
            options.preview_bytes,
        ));
    }

    let err = match serde_json::from_slice::<T>(raw) {
        Ok(value) => {
            return Ok(Decoded {
                value,
                repaired: false,
            })
        }
        Err(err) => err,
    };

    if options.repair_escapes && err.classify() == serde_json::error::Category::Syntax {
        if let Some(repaired) = std::str::from_utf8(raw).ok().and_then(repair_escapes) {
            if let Ok(value) = serde_json::from_str::<T>(&repaired) {
                return Ok(Decoded {
                    value,
                    repaired: true,
                });
            }
        }
    }

    Err(DecodeError::new(raw, err.to_string(), options.preview_bytes))
}

/// Double every backslash inside a string literal that does not start a
/// valid JSON escape. Returns `None` when nothing needed repair.
///
/// A raw path whose separators happen to form valid escapes (`C:\new` has
/// `\n`) still decodes, but to the escaped character rather than the path.
pub fn repair_escapes(input: &str) -> Option<String> {
    let chars: Vec<char> = input.chars().collect();
    let mut out = String::with_capacity(input.len() + 8);
    let mut in_string = false;
    let mut changed = false;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        if !in_string {
            if c == '"' {
                in_string = true;
            }
            out.push(c);
            i += 1;
            continue;
        }

        match c {
            '"' => {
                in_string = false;
                out.push(c);
                i += 1;
            }
            '\\' => match chars.get(i + 1) {
                Some('"' | '\\' | '/' | 'b' | 'f' | 'n' | 'r' | 't') => {
                    out.push(c);
                    out.push(chars[i + 1]);
                    i += 2;
                }
                Some('u') if is_unicode_escape(&chars[i + 2..]) => {
                    out.extend(&chars[i..i + 6]);
                    i += 6;
                }
                _ => {
                    out.push_str("\\\\");
                    changed = true;
                    i += 1;
                }
            },
            _ => {
                out.push(c);
                i += 1;
            }
        }
    }

    changed.then_some(out)
}

fn is_unicode_escape(rest: &[char]) -> bool {
    rest.len() >= 4 && rest[..4].iter().all(char::is_ascii_hexdigit)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
