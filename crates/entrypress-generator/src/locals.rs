//! Template locals.
//!
//! Every view sees the project locals from `[locals]` plus each content
//! type's list under its locals name. Single-entry views also get `entry`
//! and `path`, in a context built for that entry alone.

use entrypress_core::AnnotatedEntry;
use serde_json::{Map, Value};
use tracing::warn;

use crate::template::TemplateContext;

/// Locals key holding the current entry on single-entry pages.
pub const ENTRY_KEY: &str = "entry";

/// Locals key holding the URL being rendered on single-entry pages.
pub const PATH_KEY: &str = "path";

/// Project locals plus the bound entry lists.
#[derive(Debug, Clone, Default)]
pub struct Locals {
    variables: Map<String, Value>,
}

impl Locals {
    /// Start from the project locals.
    #[must_use]
    pub fn new(project: Map<String, Value>) -> Self {
        Self { variables: project }
    }

    /// Bind a content type's list under `name`.
    ///
    /// A bound list replaces a project local of the same name.
    pub fn bind(&mut self, name: &str, entries: &[AnnotatedEntry]) -> serde_json::Result<()> {
        let list = serde_json::to_value(entries)?;
        if self.variables.insert(name.to_string(), list).is_some() {
            warn!(name, "entry list shadows a project local of the same name");
        }
        Ok(())
    }

    /// Look up a local.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.variables.get(name)
    }

    /// Context for listing views.
    #[must_use]
    pub fn listing_context(&self) -> TemplateContext {
        TemplateContext::from_map(self.variables.clone())
    }

    /// A fresh context for one single-entry page.
    ///
    /// Built from scratch on every call; nothing set for one entry is
    /// visible when rendering another.
    pub fn entry_context(&self, entry: &AnnotatedEntry, url: &str) -> serde_json::Result<TemplateContext> {
        let mut context = self.listing_context();
        context.insert(ENTRY_KEY, serde_json::to_value(entry)?);
        context.insert(PATH_KEY, url);
        Ok(context)
    }
}
