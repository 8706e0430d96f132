//! JSON artifacts.

use entrypress_core::AnnotatedEntry;

/// Serialize a bound list the way it is written to disk: two-space
/// pretty-printing, keys in field order, trailing newline.
pub fn to_json(entries: &[AnnotatedEntry]) -> serde_json::Result<String> {
    let mut json = serde_json::to_string_pretty(entries)?;
    json.push('\n');
    Ok(json)
}
