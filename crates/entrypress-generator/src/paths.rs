//! Output paths for single-entry pages.

use std::{
    path::{Component, Path, PathBuf},
    sync::Arc,
};

use entrypress_core::{AnnotatedEntry, Entry, FieldValue, PathResult, slugify};
use handlebars::{Handlebars, no_escape};

use crate::template::{self, TemplateError};

/// Computes the output path(s) for one entry.
pub type PathFn = Arc<dyn Fn(&Entry) -> Result<PathResult, String> + Send + Sync>;

/// `{locals_name}/{slug of the display field}.html`.
///
/// Fails for entries whose display field is missing or slugs to nothing.
#[must_use]
pub fn default_path(locals_name: &str, display_field: &str) -> PathFn {
    let prefix = locals_name.to_string();
    let field = display_field.to_string();

    Arc::new(move |entry: &Entry| {
        let text = entry
            .get(&field)
            .and_then(FieldValue::to_text)
            .ok_or_else(|| format!("display field `{field}` is missing"))?;
        let slug = slugify(&text);
        if slug.is_empty() {
            return Err(format!("display field `{field}` has no sluggable text"));
        }
        Ok(PathResult::Single(format!("{prefix}/{slug}.html")))
    })
}

/// Path function from Handlebars patterns such as `{{category}}/{{slug title}}.html`.
///
/// Patterns are rendered against the entry's fields (and `sys`) in strict
/// mode, so a reference to a missing field is an error rather than an empty
/// segment. One pattern yields a single path, several yield one path each.
pub fn pattern_path(patterns: Vec<String>) -> Result<PathFn, TemplateError> {
    let mut engine = Handlebars::new();
    engine.set_strict_mode(true);
    engine.register_escape_fn(no_escape);
    template::install_helpers(&mut engine);

    let mut names = Vec::with_capacity(patterns.len());
    for (index, pattern) in patterns.iter().enumerate() {
        let name = format!("path{index}");
        engine
            .register_template_string(&name, pattern)
            .map_err(|e| TemplateError::InvalidSyntax {
                name: format!("path pattern `{pattern}`"),
                source: Box::new(e),
            })?;
        names.push(name);
    }
    let single = names.len() == 1;

    Ok(Arc::new(move |entry: &Entry| {
        let data = serde_json::to_value(AnnotatedEntry::from(entry.clone()))
            .map_err(|e| e.to_string())?;
        let mut paths = names
            .iter()
            .map(|name| engine.render(name, &data).map_err(|e| e.to_string()))
            .collect::<Result<Vec<_>, _>>()?;

        if single && let Some(path) = paths.pop() {
            return Ok(PathResult::Single(path));
        }
        Ok(PathResult::Many(paths))
    }))
}

/// A path as returned by a path function, split into its URL and the file
/// location relative to the output directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPath {
    /// URL with a leading `/`.
    pub url: String,
    /// File path relative to the output directory.
    pub file: PathBuf,
}

/// Normalize a returned path.
///
/// Ensures a leading `/` on the URL. A trailing `/` writes `index.html` in
/// that directory. Empty paths and `..` segments are rejected.
pub fn normalize(path: &str) -> Result<OutputPath, String> {
    let trimmed = path.trim();
    if trimmed.is_empty() {
        return Err("path is empty".to_string());
    }

    let relative = trimmed.trim_start_matches('/');
    let mut file = PathBuf::new();
    for component in Path::new(relative).components() {
        match component {
            Component::Normal(part) => file.push(part),
            Component::CurDir => {}
            Component::ParentDir => {
                return Err(format!("path `{trimmed}` leaves the output directory"));
            }
            Component::RootDir | Component::Prefix(_) => {}
        }
    }
    if relative.ends_with('/') || file.as_os_str().is_empty() {
        file.push("index.html");
    }

    Ok(OutputPath {
        url: format!("/{relative}"),
        file,
    })
}
