//! Link resolution against included records.
//!
//! Entries reference other entries and assets through `Link` values. The API
//! ships the referenced records in `includes`; this module swaps each link for
//! an inline `{ sys, fields }` object, up to a fixed depth so that cyclic
//! references terminate.

use std::collections::HashMap;

use entrypress_core::{Entry, FieldValue, Fields};

/// Lookup table of records addressable by `(linkType, id)`.
#[derive(Debug, Default)]
pub struct LinkIndex {
    records: HashMap<(String, String), Entry>,
}

impl LinkIndex {
    /// Create an empty index.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a record. Records without `sys.id` are ignored.
    pub fn insert(&mut self, link_type: &str, record: Entry) {
        if let Some(id) = record.id() {
            self.records
                .insert((link_type.to_string(), id.to_string()), record);
        }
    }

    /// Number of registered records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the index is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Resolve links in every field of `entry`, `depth` levels deep.
    pub fn resolve(&self, entry: &mut Entry, depth: u32) {
        for value in entry.fields.values_mut() {
            self.resolve_value(value, depth);
        }
    }

    fn resolve_value(&self, value: &mut FieldValue, depth: u32) {
        match value {
            FieldValue::Link(link) if depth > 0 => {
                let key = (link.sys.link_type.clone(), link.sys.id.clone());
                if let Some(target) = self.records.get(&key) {
                    let mut target = target.clone();
                    self.resolve(&mut target, depth - 1);
                    *value = FieldValue::Object(inline_record(target));
                } else {
                    tracing::debug!(
                        link_type = %key.0,
                        id = %key.1,
                        "link target not included, leaving unresolved"
                    );
                }
            }
            FieldValue::List(items) => {
                for item in items {
                    self.resolve_value(item, depth);
                }
            }
            FieldValue::Object(map) => {
                for item in map.values_mut() {
                    self.resolve_value(item, depth);
                }
            }
            _ => {}
        }
    }
}

/// Shape of a resolved reference: `{ sys, fields }`.
fn inline_record(record: Entry) -> Fields {
    let mut inline = Fields::new();
    if let Some(sys) = record.sys {
        inline.insert("sys".to_string(), FieldValue::from(sys));
    }
    inline.insert("fields".to_string(), FieldValue::Object(record.fields));
    inline
}
