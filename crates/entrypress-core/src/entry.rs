//! Content entries and the values they carry.
//!
//! Entries arrive from the CMS as `{ sys, fields }` objects where `fields` is
//! an open, schema-defined map. Field values are kept in a small tagged union
//! so the rest of the pipeline can sort, slug and validate them without
//! knowing the remote schema.

use std::cmp::Ordering;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

/// Field name reserved for entry metadata.
pub const RESERVED_FIELD: &str = "sys";

/// Keys added to each entry for its page URLs.
pub const URL_FIELDS: [&str; 2] = ["_url", "_urls"];

/// Ordered field map of an entry, in the order the API returned it.
pub type Fields = IndexMap<String, FieldValue>;

/// A single field value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// Explicit `null`.
    Null,
    /// Boolean field.
    Bool(bool),
    /// Integer or decimal field.
    Number(serde_json::Number),
    /// Text, symbol, rich text rendered to a string, dates.
    Text(String),
    /// Array field.
    List(Vec<FieldValue>),
    /// Unresolved reference to another entry or asset.
    Link(Link),
    /// Nested object: resolved references, JSON and location fields.
    Object(Fields),
}

/// A reference to another record that the API did not inline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Link {
    pub sys: LinkSys,
}

/// The `sys` block of a link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LinkSys {
    #[serde(rename = "type")]
    pub kind: LinkMarker,
    #[serde(rename = "linkType")]
    pub link_type: String,
    pub id: String,
}

/// Discriminator that only accepts `"Link"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LinkMarker {
    Link,
}

impl Link {
    /// Create a link to a record of the given type.
    pub fn new(link_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            sys: LinkSys {
                kind: LinkMarker::Link,
                link_type: link_type.into(),
                id: id.into(),
            },
        }
    }
}

impl FieldValue {
    /// Borrow the value as text.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Render scalar values as text, for slugs and path patterns.
    #[must_use]
    pub fn to_text(&self) -> Option<String> {
        match self {
            Self::Text(s) => Some(s.clone()),
            Self::Number(n) => Some(n.to_string()),
            Self::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    /// Total order used by field-based sorting.
    ///
    /// Numbers compare numerically, text lexically, booleans false < true.
    /// Values of different kinds compare by kind rank.
    #[must_use]
    pub fn compare(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Number(a), Self::Number(b)) => {
                let a = a.as_f64().unwrap_or(f64::NAN);
                let b = b.as_f64().unwrap_or(f64::NAN);
                a.total_cmp(&b)
            }
            (Self::Text(a), Self::Text(b)) => a.cmp(b),
            (Self::Bool(a), Self::Bool(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }

    fn rank(&self) -> u8 {
        match self {
            Self::Bool(_) => 0,
            Self::Number(_) => 1,
            Self::Text(_) => 2,
            Self::List(_) => 3,
            Self::Object(_) => 4,
            Self::Link(_) => 5,
            Self::Null => 6,
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<i64> for FieldValue {
    fn from(n: i64) -> Self {
        Self::Number(n.into())
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<serde_json::Value> for FieldValue {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(b) => Self::Bool(b),
            serde_json::Value::Number(n) => Self::Number(n),
            serde_json::Value::String(s) => Self::Text(s),
            serde_json::Value::Array(items) => {
                Self::List(items.into_iter().map(Self::from).collect())
            }
            serde_json::Value::Object(map) => {
                match serde_json::from_value::<Link>(serde_json::Value::Object(map.clone())) {
                    Ok(link) => Self::Link(link),
                    Err(_) => {
                        Self::Object(map.into_iter().map(|(k, v)| (k, Self::from(v))).collect())
                    }
                }
            }
        }
    }
}

/// A content record as returned by the CMS.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    /// Record metadata (id, timestamps, content type link).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sys: Option<serde_json::Value>,

    /// Schema-defined fields.
    #[serde(default)]
    pub fields: Fields,
}

impl Entry {
    /// Create an entry with no metadata.
    #[must_use]
    pub fn new(fields: Fields) -> Self {
        Self { sys: None, fields }
    }

    /// Builder-style field insertion.
    #[must_use]
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// Look up a field.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.fields.get(key)
    }

    /// The CMS id from `sys.id`, if present.
    #[must_use]
    pub fn id(&self) -> Option<&str> {
        self.sys.as_ref()?.get("id")?.as_str()
    }

    /// Reject entries whose fields collide with the metadata key or the
    /// URL annotations.
    pub fn validate(&self, content_type: &str, index: usize) -> Result<()> {
        let reserved = std::iter::once(RESERVED_FIELD)
            .chain(URL_FIELDS)
            .find(|key| self.fields.contains_key(*key));
        if let Some(field) = reserved {
            let label = self
                .id()
                .map_or_else(|| format!("#{index}"), |id| format!("`{id}`"));
            return Err(CoreError::reserved_field(content_type, label, field));
        }
        Ok(())
    }
}

/// Validate a whole list, failing on the first offending entry.
pub fn validate_entries(content_type: &str, entries: &[Entry]) -> Result<()> {
    entries
        .iter()
        .enumerate()
        .try_for_each(|(index, entry)| entry.validate(content_type, index))
}

/// Descriptor of a remote content type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentTypeDescriptor {
    /// Content type id.
    #[serde(default)]
    pub id: String,

    /// Human-readable name (e.g. "Blog Post").
    pub name: String,

    /// Field used as the entry title and slug source.
    #[serde(rename = "displayField", default)]
    pub display_field: Option<String>,
}

impl ContentTypeDescriptor {
    /// Create a descriptor.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        display_field: Option<&str>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            display_field: display_field.map(str::to_string),
        }
    }
}

/// Output location(s) computed for one entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathResult {
    /// One output file.
    Single(String),
    /// Several output files, rendered in order.
    Many(Vec<String>),
}

impl PathResult {
    /// All paths, in order.
    #[must_use]
    pub fn paths(&self) -> Vec<&str> {
        match self {
            Self::Single(p) => vec![p.as_str()],
            Self::Many(ps) => ps.iter().map(String::as_str).collect(),
        }
    }
}

impl From<String> for PathResult {
    fn from(path: String) -> Self {
        Self::Single(path)
    }
}

impl From<&str> for PathResult {
    fn from(path: &str) -> Self {
        Self::Single(path.to_string())
    }
}

impl From<Vec<String>> for PathResult {
    fn from(paths: Vec<String>) -> Self {
        Self::Many(paths)
    }
}

/// URL annotation attached to an entry that has single-entry pages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum UrlAnnotation {
    /// `_url`
    #[serde(rename = "_url")]
    Single(String),
    /// `_urls`
    #[serde(rename = "_urls")]
    Many(Vec<String>),
}

/// An entry as exposed to views and written to JSON.
///
/// Serializes flat: `sys` first (when present), then the fields in order,
/// then `_url` or `_urls`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnnotatedEntry {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sys: Option<serde_json::Value>,

    #[serde(flatten)]
    pub fields: Fields,

    #[serde(flatten, skip_serializing_if = "Option::is_none")]
    pub url: Option<UrlAnnotation>,
}

impl AnnotatedEntry {
    /// The entry's URL(s), if annotated.
    #[must_use]
    pub fn urls(&self) -> Vec<&str> {
        match &self.url {
            Some(UrlAnnotation::Single(u)) => vec![u.as_str()],
            Some(UrlAnnotation::Many(us)) => us.iter().map(String::as_str).collect(),
            None => Vec::new(),
        }
    }
}

impl From<Entry> for AnnotatedEntry {
    fn from(entry: Entry) -> Self {
        Self {
            sys: entry.sys,
            fields: entry.fields,
            url: None,
        }
    }
}
