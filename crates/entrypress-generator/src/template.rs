//! View templates.
//!
//! Views are Handlebars files loaded from the project's views directory.
//! Names are the path relative to that directory without extension
//! (`views/blog/index.hbs` → `blog/index`). Files whose name starts with `_`
//! are partials and layouts: usable through `{{> _layout}}`, never rendered
//! to a page of their own.

use std::path::{Path, PathBuf};

use entrypress_core::slugify;
use handlebars::{
    Context, Handlebars, Helper, HelperResult, Output, RenderContext, RenderErrorReason,
};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::debug;
use walkdir::WalkDir;

/// Template loading and rendering errors.
#[derive(Debug, Error)]
pub enum TemplateError {
    /// Template not found.
    #[error("template not found: {0}")]
    NotFound(String),

    /// Invalid template syntax.
    #[error("invalid template syntax in `{name}`: {source}")]
    InvalidSyntax {
        name: String,
        #[source]
        source: Box<handlebars::TemplateError>,
    },

    /// Rendering failed (helper error, strict-mode missing value).
    #[error("failed to render `{name}`: {source}")]
    Render {
        name: String,
        #[source]
        source: Box<handlebars::RenderError>,
    },

    /// Reading the views directory failed.
    #[error("could not read views from {path}: {message}")]
    Io { path: PathBuf, message: String },
}

/// Result type for template operations.
pub type Result<T> = std::result::Result<T, TemplateError>;

/// File extensions recognized as views.
const VIEW_EXTENSIONS: [&str; 3] = ["hbs", "handlebars", "html"];

/// Locals passed to a single render call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TemplateContext {
    variables: Map<String, Value>,
}

impl TemplateContext {
    /// Create a new empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a context holding the given variables.
    #[must_use]
    pub fn from_map(variables: Map<String, Value>) -> Self {
        Self { variables }
    }

    /// Insert a variable, returning the value it replaced.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.variables.insert(key.into(), value.into())
    }

    /// Builder-style insert.
    #[must_use]
    pub fn with_var(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    /// Get a variable value.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.variables.get(key)
    }

    /// Check if a variable exists.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.variables.contains_key(key)
    }

    fn as_map(&self) -> &Map<String, Value> {
        &self.variables
    }
}

/// Registry of views backed by a Handlebars engine.
pub struct TemplateRegistry {
    engine: Handlebars<'static>,
    views: Vec<String>,
}

impl std::fmt::Debug for TemplateRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TemplateRegistry")
            .field("views", &self.views)
            .finish_non_exhaustive()
    }
}

impl Default for TemplateRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl TemplateRegistry {
    /// Create an empty registry with the view helpers installed.
    #[must_use]
    pub fn new() -> Self {
        let mut engine = Handlebars::new();
        engine.set_strict_mode(false);
        install_helpers(&mut engine);

        Self {
            engine,
            views: Vec::new(),
        }
    }

    /// Load every view under `dir`.
    pub fn load_dir(dir: &Path) -> Result<Self> {
        let mut registry = Self::new();
        if !dir.is_dir() {
            return Err(TemplateError::Io {
                path: dir.to_path_buf(),
                message: "not a directory".to_string(),
            });
        }

        for entry in WalkDir::new(dir).sort_by_file_name() {
            let entry = entry.map_err(|e| TemplateError::Io {
                path: dir.to_path_buf(),
                message: e.to_string(),
            })?;
            if !entry.file_type().is_file() {
                continue;
            }

            let path = entry.path();
            let Some(name) = view_name(dir, path) else {
                continue;
            };
            let source = std::fs::read_to_string(path).map_err(|e| TemplateError::Io {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;

            debug!(name = %name, path = %path.display(), "registered view");
            registry.register(&name, &source)?;
        }

        Ok(registry)
    }

    /// Register a view from source.
    pub fn register(&mut self, name: &str, source: &str) -> Result<()> {
        self.engine
            .register_template_string(name, source)
            .map_err(|e| TemplateError::InvalidSyntax {
                name: name.to_string(),
                source: Box::new(e),
            })?;
        if !self.views.iter().any(|v| v == name) {
            self.views.push(name.to_string());
        }
        Ok(())
    }

    /// Builder-style register, for tests and embedding.
    pub fn with_view(mut self, name: &str, source: &str) -> Result<Self> {
        self.register(name, source)?;
        Ok(self)
    }

    /// Check whether a view is registered.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.engine.has_template(name)
    }

    /// Resolve a configured view name, accepting it with or without the `_` prefix.
    #[must_use]
    pub fn resolve(&self, name: &str) -> Option<String> {
        let name = name.trim_end_matches(".hbs").trim_end_matches(".html");
        if self.contains(name) {
            return Some(name.to_string());
        }
        let (dir, file) = match name.rsplit_once('/') {
            Some((dir, file)) => (format!("{dir}/"), file),
            None => (String::new(), name),
        };
        let partial = format!("{dir}_{file}");
        self.contains(&partial).then_some(partial)
    }

    /// Registered view names, in load order.
    pub fn views(&self) -> impl Iterator<Item = &str> {
        self.views.iter().map(String::as_str)
    }

    /// Render a named view with the given context.
    pub fn render(&self, name: &str, context: &TemplateContext) -> Result<String> {
        if !self.contains(name) {
            return Err(TemplateError::NotFound(name.to_string()));
        }
        self.engine
            .render(name, context.as_map())
            .map_err(|e| TemplateError::Render {
                name: name.to_string(),
                source: Box::new(e),
            })
    }
}

/// Whether a view name denotes a partial or layout.
#[must_use]
pub fn is_partial(name: &str) -> bool {
    name.rsplit('/').next().is_some_and(|file| file.starts_with('_'))
}

/// Output path of a listing view (`blog/index` → `blog/index.html`).
#[must_use]
pub fn listing_output(name: &str) -> PathBuf {
    PathBuf::from(format!("{name}.html"))
}

/// View name for a file under the views directory, if it is a view.
fn view_name(root: &Path, path: &Path) -> Option<String> {
    let ext = path.extension()?.to_str()?;
    if !VIEW_EXTENSIONS.contains(&ext) {
        return None;
    }

    let relative = path.strip_prefix(root).ok()?;
    let mut name = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/");
    name.truncate(name.len() - ext.len() - 1);
    if let Some(stripped) = name.strip_suffix(".html") {
        name = stripped.to_string();
    }
    Some(name)
}

/// `{{asset image "w=100&h=100"}}` → `<file url>?w=100&h=100`.
///
/// Positional query strings are appended as written, in order. Hash
/// arguments (`{{asset image w=100}}`) follow them, sorted by key, since
/// Handlebars does not keep their order. Accepts an asset object (`fields.file.url` or `file.url`) or a plain URL.
/// Writes nothing when no URL can be found.
fn asset_helper(
    h: &Helper,
    _: &Handlebars,
    _: &Context,
    _: &mut RenderContext,
    out: &mut dyn Output,
) -> HelperResult {
    let param = h
        .param(0)
        .ok_or(RenderErrorReason::ParamNotFoundForIndex("asset", 0))?;

    let Some(url) = asset_url(param.value()) else {
        return Ok(());
    };

    let literal = h.params().iter().skip(1).filter_map(|param| match param.value() {
        Value::String(s) => Some(s.trim_start_matches(['?', '&']).to_string()),
        Value::Null => None,
        other => Some(other.to_string()),
    });
    let pairs = h.hash().iter().map(|(key, value)| {
        let value = match value.value() {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        format!("{key}={}", urlencoding::encode(&value))
    });
    let query = literal
        .chain(pairs)
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("&");

    out.write(url)?;
    if !query.is_empty() {
        out.write(if url.contains('?') { "&" } else { "?" })?;
        out.write(&query)?;
    }
    Ok(())
}

fn asset_url(value: &Value) -> Option<&str> {
    match value {
        Value::String(url) => Some(url),
        Value::Object(_) => ["/fields/file/url", "/file/url", "/url"]
            .iter()
            .find_map(|pointer| value.pointer(pointer)?.as_str()),
        _ => None,
    }
}

/// `{{slug title}}` → `real-talk`.
fn slug_helper(
    h: &Helper,
    _: &Handlebars,
    _: &Context,
    _: &mut RenderContext,
    out: &mut dyn Output,
) -> HelperResult {
    let param = h
        .param(0)
        .ok_or(RenderErrorReason::ParamNotFoundForIndex("slug", 0))?;
    let text = match param.value() {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    };
    out.write(&slugify(&text))?;
    Ok(())
}

/// Register the view helpers on a standalone engine.
pub(crate) fn install_helpers(engine: &mut Handlebars<'static>) {
    engine.register_helper("asset", Box::new(asset_helper));
    engine.register_helper("slug", Box::new(slug_helper));
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_render_with_locals() {
        let registry = TemplateRegistry::new()
            .with_view("index", "{{#each posts}}<h1>{{title}}</h1>{{/each}}")
            .unwrap();
        let ctx = TemplateContext::new().with_var(
            "posts",
            json!([{ "title": "Title A" }, { "title": "Title B" }]),
        );

        let html = registry.render("index", &ctx).unwrap();
        assert_eq!(html, "<h1>Title A</h1><h1>Title B</h1>");
    }

    #[test]
    fn test_missing_values_render_empty() {
        let registry = TemplateRegistry::new()
            .with_view("post", "<p>{{entry.body}}</p>")
            .unwrap();
        let ctx = TemplateContext::new().with_var("entry", json!({ "title": "x" }));

        assert_eq!(registry.render("post", &ctx).unwrap(), "<p></p>");
    }

    #[test]
    fn test_render_unknown_view() {
        let registry = TemplateRegistry::new();
        let result = registry.render("nope", &TemplateContext::new());
        assert!(matches!(result, Err(TemplateError::NotFound(_))));
    }

    #[test]
    fn test_invalid_syntax() {
        let result = TemplateRegistry::new().with_view("bad", "{{#each posts}}");
        assert!(matches!(result, Err(TemplateError::InvalidSyntax { .. })));
    }

    #[test]
    fn test_asset_helper_with_object() {
        let registry = TemplateRegistry::new()
            .with_view("img", r#"<img src="{{asset entry.image w=100 h=100}}">"#)
            .unwrap();
        let ctx = TemplateContext::new().with_var(
            "entry",
            json!({ "image": { "fields": { "file": { "url": "http://dogesay.com/wow.jpg" } } } }),
        );

        let html = registry.render("img", &ctx).unwrap();
        assert_eq!(html, r#"<img src="http://dogesay.com/wow.jpg?h=100&w=100">"#);
    }

    #[test]
    fn test_asset_helper_keeps_query_order() {
        let registry = TemplateRegistry::new()
            .with_view("img", r#"{{asset entry.image "w=100&h=100" fm="jpg"}}"#)
            .unwrap();
        let ctx = TemplateContext::new().with_var(
            "entry",
            json!({ "image": { "fields": { "file": { "url": "http://dogesay.com/wow.jpg" } } } }),
        );

        assert_eq!(
            registry.render("img", &ctx).unwrap(),
            "http://dogesay.com/wow.jpg?w=100&h=100&fm=jpg"
        );
    }

    #[test]
    fn test_asset_helper_with_plain_url() {
        let registry = TemplateRegistry::new()
            .with_view("img", "{{asset url}}")
            .unwrap();
        let ctx = TemplateContext::new().with_var("url", "//images.example/a.png?fm=jpg");

        assert_eq!(
            registry.render("img", &ctx).unwrap(),
            "//images.example/a.png?fm=jpg"
        );
    }

    #[test]
    fn test_asset_helper_without_url() {
        let registry = TemplateRegistry::new()
            .with_view("img", "[{{asset entry.image w=1}}]")
            .unwrap();
        let ctx = TemplateContext::new().with_var("entry", json!({}));

        assert_eq!(registry.render("img", &ctx).unwrap(), "[]");
    }

    #[test]
    fn test_slug_helper() {
        let registry = TemplateRegistry::new()
            .with_view("s", "{{slug title}}")
            .unwrap();
        let ctx = TemplateContext::new().with_var("title", "Real Talk");

        assert_eq!(registry.render("s", &ctx).unwrap(), "real-talk");
    }

    #[test]
    fn test_partials() {
        let registry = TemplateRegistry::new()
            .with_view("_header", "<h1>{{site}}</h1>")
            .unwrap()
            .with_view("index", "{{> _header}}<main></main>")
            .unwrap();
        let ctx = TemplateContext::new().with_var("site", "Doge");

        assert_eq!(
            registry.render("index", &ctx).unwrap(),
            "<h1>Doge</h1><main></main>"
        );
    }

    #[test]
    fn test_load_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("blog")).unwrap();
        std::fs::write(dir.path().join("index.hbs"), "home").unwrap();
        std::fs::write(dir.path().join("_post.hbs"), "post").unwrap();
        std::fs::write(dir.path().join("blog/archive.html.hbs"), "archive").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let registry = TemplateRegistry::load_dir(dir.path()).unwrap();
        let views: Vec<_> = registry.views().collect();

        assert_eq!(views, vec!["_post", "blog/archive", "index"]);
        assert_eq!(registry.resolve("post").as_deref(), Some("_post"));
        assert_eq!(registry.resolve("index").as_deref(), Some("index"));
        assert_eq!(registry.resolve("missing"), None);
    }

    #[test]
    fn test_load_missing_dir() {
        let result = TemplateRegistry::load_dir(Path::new("/nonexistent/views"));
        assert!(matches!(result, Err(TemplateError::Io { .. })));
    }

    #[test]
    fn test_is_partial() {
        assert!(is_partial("_layout"));
        assert!(is_partial("blog/_card"));
        assert!(!is_partial("blog/index"));
        assert_eq!(listing_output("blog/index"), PathBuf::from("blog/index.html"));
    }
}
