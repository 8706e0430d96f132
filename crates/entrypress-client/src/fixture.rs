//! In-memory content source.
//!
//! Serves fixed descriptors and entries. Used for offline builds from a JSON
//! dump and as the stand-in for the API in tests.

use std::{
    collections::HashMap,
    path::Path,
    sync::atomic::{AtomicUsize, Ordering},
};

use async_trait::async_trait;
use entrypress_core::{ContentTypeDescriptor, Entry};
use serde::Deserialize;

use crate::{
    error::{FetchError, Result},
    source::{ContentSource, EntryQuery},
};

/// A content source backed by values held in memory.
#[derive(Debug, Default)]
pub struct StaticSource {
    types: HashMap<String, (ContentTypeDescriptor, Vec<Entry>)>,
    requests: AtomicUsize,
}

/// On-disk dump format.
#[derive(Debug, Deserialize)]
struct Dump {
    content_types: Vec<DumpedType>,
}

#[derive(Debug, Deserialize)]
struct DumpedType {
    id: String,
    name: String,
    #[serde(rename = "displayField", default)]
    display_field: Option<String>,
    #[serde(default)]
    entries: Vec<Entry>,
}

impl StaticSource {
    /// Create an empty source.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a content type and its entries.
    #[must_use]
    pub fn with_content_type(mut self, descriptor: ContentTypeDescriptor, entries: Vec<Entry>) -> Self {
        self.types
            .insert(descriptor.id.clone(), (descriptor, entries));
        self
    }

    /// Load a JSON dump:
    /// `{"content_types": [{"id", "name", "displayField", "entries": [..]}]}`.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| FetchError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let dump: Dump = serde_json::from_str(&content).map_err(|source| FetchError::Decode {
            url: path.display().to_string(),
            source,
        })?;

        let source = dump.content_types.into_iter().fold(Self::new(), |source, t| {
            let descriptor = ContentTypeDescriptor {
                id: t.id,
                name: t.name,
                display_field: t.display_field,
            };
            source.with_content_type(descriptor, t.entries)
        });

        tracing::info!(path = %path.display(), types = source.types.len(), "loaded content dump");
        Ok(source)
    }

    /// Number of requests served so far.
    #[must_use]
    pub fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    fn lookup(&self, id: &str) -> Result<&(ContentTypeDescriptor, Vec<Entry>)> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        self.types
            .get(id)
            .ok_or_else(|| FetchError::NotFound(id.to_string()))
    }
}

/// Equality filters on `fields.<name>`; other parameters are ignored.
fn matches_filters(entry: &Entry, filters: &[(String, String)]) -> bool {
    filters.iter().all(|(key, expected)| {
        let Some(field) = key.strip_prefix("fields.") else {
            tracing::debug!(%key, "ignoring unsupported filter");
            return true;
        };
        entry
            .get(field)
            .and_then(|v| v.to_text())
            .is_some_and(|actual| &actual == expected)
    })
}

#[async_trait]
impl ContentSource for StaticSource {
    fn name(&self) -> &'static str {
        "static"
    }

    async fn content_type(&self, id: &str) -> Result<ContentTypeDescriptor> {
        Ok(self.lookup(id)?.0.clone())
    }

    async fn entries(&self, query: &EntryQuery) -> Result<Vec<Entry>> {
        let (_, entries) = self.lookup(&query.content_type)?;
        Ok(entries
            .iter()
            .filter(|e| matches_filters(e, &query.filters))
            .cloned()
            .collect())
    }
}
