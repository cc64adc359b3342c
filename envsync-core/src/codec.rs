//! Flat `KEY=VALUE` codec shared by the local file and the remote blob.
//!
//! ## Format
//!
//! - Blank lines and lines whose first non-whitespace character is `#` are
//!   skipped.
//! - Every other line is split on its first `=`; key and value are trimmed.
//! - A value fully wrapped in matching `"` or `'` loses one layer of quotes.
//!
//! [`serialize`] sorts keys and double-quotes any value that would not
//! survive [`parse`] verbatim. Keys are written as-is, so
//! `parse(serialize(m)) == m` holds for maps whose keys `parse` itself can
//! produce (non-empty, trimmed, no `=`, no line break, not starting with
//! `#`) and whose values contain no line breaks. Every map returned by
//! [`parse`] qualifies.

use crate::error::CodecError;
use crate::types::EnvMap;

/// Parse env-file text into a snapshot.
///
/// Fails on the first non-blank, non-comment line without `=`, citing its
/// 1-based line number.
pub fn parse(text: &str) -> Result<EnvMap, CodecError> {
    let mut env = EnvMap::new();
    for (idx, raw) in text.split('\n').enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((key, value)) = line.split_once('=') else {
            return Err(CodecError::MissingSeparator {
                line: idx + 1,
                content: line.to_string(),
            });
        };

        env.insert(
            key.trim().to_string(),
            strip_quotes(value.trim()).to_string(),
        );
    }
    Ok(env)
}

/// Serialize a snapshot as sorted `KEY=VALUE` lines with a trailing newline.
///
/// An empty snapshot serializes to the empty string.
pub fn serialize(env: &EnvMap) -> String {
    let mut out = String::new();
    for (key, value) in env {
        out.push_str(key);
        out.push('=');
        if needs_quotes(value) {
            out.push('"');
            out.push_str(value);
            out.push('"');
        } else {
            out.push_str(value);
        }
        out.push('\n');
    }
    out
}

fn strip_quotes(value: &str) -> &str {
    if is_quoted(value) {
        &value[1..value.len() - 1]
    } else {
        value
    }
}

fn is_quoted(value: &str) -> bool {
    let bytes = value.as_bytes();
    bytes.len() >= 2
        && matches!(bytes[0], b'"' | b'\'')
        && bytes[bytes.len() - 1] == bytes[0]
}

// A value that already looks quoted must be wrapped again, otherwise parse
// would strip its own quotes.
fn needs_quotes(value: &str) -> bool {
    value.contains(char::is_whitespace) || value.contains('=') || is_quoted(value)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
