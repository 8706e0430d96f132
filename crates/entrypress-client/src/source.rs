//! The content source abstraction.

use async_trait::async_trait;
use entrypress_core::{ContentTypeDescriptor, Entry};

use crate::error::Result;

/// Parameters of an entries request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntryQuery {
    /// Content type id.
    pub content_type: String,

    /// Extra query parameters (`fields.category` = `news`, `order` = ...).
    pub filters: Vec<(String, String)>,
}

impl EntryQuery {
    /// Query every entry of a content type.
    #[must_use]
    pub fn new(content_type: impl Into<String>) -> Self {
        Self {
            content_type: content_type.into(),
            filters: Vec::new(),
        }
    }

    /// Add a filter parameter.
    #[must_use]
    pub fn with_filter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.filters.push((key.into(), value.into()));
        self
    }
}

/// A place entries come from.
///
/// Each call is awaited once per content type per build and never retried;
/// errors abort the build.
#[async_trait]
pub trait ContentSource: Send + Sync {
    /// Source name for logs (e.g. "contentful", "static").
    fn name(&self) -> &'static str;

    /// Fetch the descriptor of a content type.
    async fn content_type(&self, id: &str) -> Result<ContentTypeDescriptor>;

    /// Fetch all entries matching the query, with links resolved.
    async fn entries(&self, query: &EntryQuery) -> Result<Vec<Entry>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_query_builder() {
        let query = EntryQuery::new("blogPost").with_filter("fields.category", "news");
        assert_eq!(query.content_type, "blogPost");
        assert_eq!(
            query.filters,
            vec![("fields.category".to_string(), "news".to_string())]
        );
    }
}
