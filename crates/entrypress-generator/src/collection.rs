//! Per content type build settings.

use std::{cmp::Ordering, fmt};

use entrypress_client::EntryQuery;
use entrypress_core::{
    ContentTypeConfig, ContentTypeDescriptor, Entry, PathResult, PathSpec, slug::locals_name,
};

use crate::{
    paths::{self, PathFn},
    pipeline::EntryPipeline,
    template::TemplateError,
};

/// Single-entry page settings.
#[derive(Clone)]
pub struct SingleEntry {
    /// View rendered once per path.
    pub template: String,
    /// Custom path function; the default path is used when unset.
    pub path: Option<PathFn>,
}

impl fmt::Debug for SingleEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SingleEntry")
            .field("template", &self.template)
            .field("path", &self.path.is_some())
            .finish()
    }
}

/// One content type to fetch, shape and render.
#[derive(Clone)]
pub struct Collection {
    pub id: String,
    /// Locals name override.
    pub name: Option<String>,
    /// Display field override.
    pub display_field: Option<String>,
    pub filters: Vec<(String, String)>,
    pub pipeline: EntryPipeline,
    pub single: Option<SingleEntry>,
    /// JSON artifact path relative to the output directory.
    pub write: Option<String>,
    /// Path function set before any template.
    pending_path: Option<PathFn>,
}

impl fmt::Debug for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Collection")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("display_field", &self.display_field)
            .field("filters", &self.filters)
            .field("pipeline", &self.pipeline)
            .field("single", &self.single)
            .field("write", &self.write)
            .field("pending_path", &self.pending_path.is_some())
            .finish()
    }
}

impl Collection {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
            display_field: None,
            filters: Vec::new(),
            pipeline: EntryPipeline::new(),
            single: None,
            write: None,
            pending_path: None,
        }
    }

    /// Build from a validated content type config.
    pub fn from_config(config: &ContentTypeConfig) -> Result<Self, TemplateError> {
        let pipeline = EntryPipeline::from_specs(
            config.sort.as_ref(),
            config.transform.as_ref(),
            config.order,
        );

        let single = match &config.template {
            Some(template) => {
                let path = match &config.path {
                    Some(PathSpec::One(pattern)) => Some(paths::pattern_path(vec![pattern.clone()])?),
                    Some(PathSpec::Many(patterns)) => Some(paths::pattern_path(patterns.clone())?),
                    None => None,
                };
                Some(SingleEntry {
                    template: template.clone(),
                    path,
                })
            }
            None => None,
        };

        Ok(Self {
            id: config.id.clone(),
            name: config.name.clone(),
            display_field: config.display_field.clone(),
            filters: config
                .filters
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
            pipeline,
            single,
            write: config.write.clone(),
            pending_path: None,
        })
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn with_display_field(mut self, field: impl Into<String>) -> Self {
        self.display_field = Some(field.into());
        self
    }

    #[must_use]
    pub fn with_filter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.filters.push((key.into(), value.into()));
        self
    }

    #[must_use]
    pub fn with_pipeline(mut self, pipeline: EntryPipeline) -> Self {
        self.pipeline = pipeline;
        self
    }

    /// Shorthand for a pipeline with only a comparator.
    #[must_use]
    pub fn with_sort(
        mut self,
        sort: impl Fn(&Entry, &Entry) -> Ordering + Send + Sync + 'static,
    ) -> Self {
        self.pipeline = self.pipeline.with_sort(sort);
        self
    }

    /// Shorthand for a pipeline with only a per-entry transform.
    #[must_use]
    pub fn with_transform(mut self, transform: impl Fn(Entry) -> Entry + Send + Sync + 'static) -> Self {
        self.pipeline = self.pipeline.with_transform(transform);
        self
    }

    /// Render one page per entry with `template`, at the default path.
    #[must_use]
    pub fn with_template(mut self, template: impl Into<String>) -> Self {
        let path = self
            .single
            .take()
            .and_then(|s| s.path)
            .or_else(|| self.pending_path.take());
        self.single = Some(SingleEntry {
            template: template.into(),
            path,
        });
        self
    }

    /// Custom path function for single-entry pages.
    ///
    /// May be set before or after the template; pages are only rendered
    /// once a template is set.
    #[must_use]
    pub fn with_path(
        mut self,
        path: impl Fn(&Entry) -> Result<PathResult, String> + Send + Sync + 'static,
    ) -> Self {
        let path: PathFn = std::sync::Arc::new(path);
        match self.single.as_mut() {
            Some(single) => single.path = Some(path),
            None => self.pending_path = Some(path),
        }
        self
    }

    #[must_use]
    pub fn with_write(mut self, path: impl Into<String>) -> Self {
        self.write = Some(path.into());
        self
    }

    /// Request for this collection's entries.
    #[must_use]
    pub fn query(&self) -> EntryQuery {
        self.filters
            .iter()
            .fold(EntryQuery::new(&self.id), |q, (k, v)| q.with_filter(k, v))
    }

    /// Name the list is bound under: the override, else derived from the
    /// descriptor's name (`Blog Post` → `blog_posts`).
    #[must_use]
    pub fn locals_name(&self, descriptor: &ContentTypeDescriptor) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| locals_name(&descriptor.name))
    }

    /// Display field: the override, else the descriptor's.
    #[must_use]
    pub fn display_field<'a>(&'a self, descriptor: &'a ContentTypeDescriptor) -> Option<&'a str> {
        self.display_field
            .as_deref()
            .or(descriptor.display_field.as_deref())
    }
}
