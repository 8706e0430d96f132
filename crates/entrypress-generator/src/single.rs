//! Single-entry pages.
//!
//! Path computation and `_url`/`_urls` annotation happen first, for the whole
//! list, so listing views and the JSON artifact see the same URLs the pages
//! were rendered at. Rendering then runs one job per (entry, path) pair.

use entrypress_core::{AnnotatedEntry, CoreError, Entry, PathResult, UrlAnnotation};
use rayon::prelude::*;
use tracing::debug;

use crate::{
    build::{BuildError, OutputFile, Result},
    locals::Locals,
    paths::{self, OutputPath, PathFn},
    template::TemplateRegistry,
};

/// An entry with its annotation and the files it renders to.
#[derive(Debug, Clone)]
pub struct PlannedEntry {
    pub entry: AnnotatedEntry,
    pub outputs: Vec<OutputPath>,
}

/// Compute every entry's paths and attach `_url` or `_urls`.
///
/// Fails on the first entry whose path function errors or returns no usable
/// path. The error names the content type and the entry's position.
pub fn plan(content_type: &str, entries: Vec<Entry>, path: &PathFn) -> Result<Vec<PlannedEntry>> {
    entries
        .into_iter()
        .enumerate()
        .map(|(index, entry)| {
            let fail = |message: String| CoreError::path_function(content_type, index, message);

            let result = path(&entry).map_err(fail)?;
            let raw = result.paths();
            if raw.is_empty() {
                return Err(fail("no paths returned".to_string()).into());
            }
            let outputs = raw
                .into_iter()
                .map(paths::normalize)
                .collect::<std::result::Result<Vec<_>, _>>()
                .map_err(fail)?;

            let urls: Vec<String> = outputs.iter().map(|o| o.url.clone()).collect();
            let url = match result {
                PathResult::Single(_) => urls.into_iter().next().map(UrlAnnotation::Single),
                PathResult::Many(_) => Some(UrlAnnotation::Many(urls)),
            };

            let mut entry = AnnotatedEntry::from(entry);
            entry.url = url;
            Ok(PlannedEntry { entry, outputs })
        })
        .collect()
}

/// Render one file per planned path with `template`.
///
/// Each job builds its own context from `locals`, so jobs share nothing but
/// read-only inputs and may run in parallel. Output follows entry order,
/// then path order.
pub fn render(
    templates: &TemplateRegistry,
    template: &str,
    locals: &Locals,
    planned: &[PlannedEntry],
) -> Result<Vec<OutputFile>> {
    let jobs: Vec<(&AnnotatedEntry, &OutputPath)> = planned
        .iter()
        .flat_map(|p| p.outputs.iter().map(move |o| (&p.entry, o)))
        .collect();

    jobs.par_iter()
        .map(|(entry, output)| {
            let context = locals.entry_context(entry, &output.url)?;
            let html = templates.render(template, &context)?;
            debug!(url = %output.url, "rendered entry page");
            Ok::<_, BuildError>(OutputFile::new(output.file.clone(), html))
        })
        .collect()
}
