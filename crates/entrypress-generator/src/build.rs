//! Build orchestration.
//!
//! Fetches every content type, shapes and binds the lists, renders all pages
//! and artifacts in memory, then writes them out. Nothing touches the output
//! directory until the whole site rendered successfully.

use std::{
    collections::{HashMap, HashSet},
    fs,
    path::{Path, PathBuf},
    time::Instant,
};

use entrypress_client::{ContentSource, FetchError};
use entrypress_core::{AnnotatedEntry, Config, CoreError, entry::validate_entries};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::{
    collection::Collection,
    json,
    locals::Locals,
    paths,
    single::{self, PlannedEntry},
    template::{self, TemplateError, TemplateRegistry},
};

/// Build errors.
#[derive(Debug, Error)]
pub enum BuildError {
    /// Validation error (credentials, content types, reserved fields, paths).
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Fetching from the content source failed.
    #[error("fetch error: {0}")]
    Fetch(#[from] FetchError),

    /// Template loading or rendering failed.
    #[error("template error: {0}")]
    Template(#[from] TemplateError),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serializing an entry list failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error.
    #[error("config error: {0}")]
    Config(String),
}

/// Result type for build operations.
pub type Result<T> = std::result::Result<T, BuildError>;

/// Build statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildStats {
    /// Number of entries bound across all content types.
    pub entries: usize,

    /// Number of listing views rendered.
    pub listing_pages: usize,

    /// Number of single-entry pages rendered.
    pub entry_pages: usize,

    /// Number of JSON artifacts produced.
    pub json_files: usize,

    /// Build duration in milliseconds.
    pub duration_ms: u64,
}

/// A rendered file, relative to the output directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputFile {
    pub path: PathBuf,
    pub contents: String,
}

impl OutputFile {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, contents: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            contents: contents.into(),
        }
    }
}

/// Everything a build produces, before it is written.
#[derive(Debug, Clone, Default)]
pub struct RenderedSite {
    /// Files in render order: entry pages, listing views, JSON artifacts.
    pub files: Vec<OutputFile>,

    /// Bound lists by locals name, as views saw them.
    pub lists: HashMap<String, Vec<AnnotatedEntry>>,

    pub stats: BuildStats,
}

impl RenderedSite {
    /// Look up a rendered file by its relative path.
    #[must_use]
    pub fn file(&self, path: impl AsRef<Path>) -> Option<&OutputFile> {
        self.files.iter().find(|f| f.path == path.as_ref())
    }
}

/// One content type after fetch and shaping.
struct Prepared {
    name: String,
    template: Option<String>,
    write: Option<String>,
    planned: Vec<PlannedEntry>,
}

/// Site builder that orchestrates the build process.
#[derive(Debug)]
pub struct Builder {
    templates: TemplateRegistry,
    output_dir: PathBuf,
    views_dir: Option<PathBuf>,
    project_root: Option<PathBuf>,
    collections: Vec<Collection>,
    locals: Map<String, Value>,
    clean: bool,
}

impl Builder {
    /// Create a builder with no content types.
    #[must_use]
    pub fn new(templates: TemplateRegistry, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            templates,
            output_dir: output_dir.into(),
            views_dir: None,
            project_root: None,
            collections: Vec::new(),
            locals: Map::new(),
            clean: true,
        }
    }

    /// Create a builder from a validated config. Relative directories are
    /// resolved against `project_root`.
    pub fn from_config(config: &Config, project_root: &Path) -> Result<Self> {
        let views_dir = project_root.join(&config.build.views_dir);
        let templates = TemplateRegistry::load_dir(&views_dir)?;

        let mut builder = Self::new(templates, project_root.join(&config.build.output_dir))
            .with_locals(config.locals.clone());
        builder.views_dir = Some(views_dir);
        builder.project_root = Some(project_root.to_path_buf());

        for content_type in config.content_types()? {
            builder = builder.with_collection(Collection::from_config(&content_type)?);
        }
        Ok(builder)
    }

    /// Add a content type.
    #[must_use]
    pub fn with_collection(mut self, collection: Collection) -> Self {
        self.collections.push(collection);
        self
    }

    /// Set the project locals.
    #[must_use]
    pub fn with_locals(mut self, locals: Map<String, Value>) -> Self {
        self.locals = locals;
        self
    }

    /// Whether to empty the output directory before writing.
    #[must_use]
    pub fn with_clean(mut self, clean: bool) -> Self {
        self.clean = clean;
        self
    }

    /// Override the output directory.
    #[must_use]
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    /// Output directory.
    #[must_use]
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Render the whole site in memory.
    pub async fn render(&self, source: &dyn ContentSource) -> Result<RenderedSite> {
        let start = Instant::now();
        let mut stats = BuildStats::default();

        info!(
            source = source.name(),
            content_types = self.collections.len(),
            "starting build"
        );

        // 1. Fetch, validate, shape and plan each content type
        let mut prepared = Vec::with_capacity(self.collections.len());
        let mut names = HashSet::new();
        for collection in &self.collections {
            let item = self.prepare(source, collection).await?;
            if !names.insert(item.name.clone()) {
                return Err(BuildError::Config(format!(
                    "content type `{}` binds `{}`, which is already bound; set a distinct name",
                    collection.id, item.name
                )));
            }
            stats.entries += item.planned.len();
            prepared.push(item);
        }

        // 2. Bind lists
        let mut locals = Locals::new(self.locals.clone());
        let mut lists = HashMap::new();
        for item in &prepared {
            let entries: Vec<AnnotatedEntry> =
                item.planned.iter().map(|p| p.entry.clone()).collect();
            locals.bind(&item.name, &entries)?;
            lists.insert(item.name.clone(), entries);
        }

        // 3. Single-entry pages
        let mut files = Vec::new();
        for item in &prepared {
            if let Some(template) = &item.template {
                let pages = single::render(&self.templates, template, &locals, &item.planned)?;
                info!(name = %item.name, pages = pages.len(), "rendered entry pages");
                stats.entry_pages += pages.len();
                files.extend(pages);
            }
        }

        // 4. Listing views
        let single_views: HashSet<&str> = prepared
            .iter()
            .filter_map(|item| item.template.as_deref())
            .collect();
        let context = locals.listing_context();
        for view in self.templates.views() {
            if template::is_partial(view) || single_views.contains(view) {
                continue;
            }
            let html = self.templates.render(view, &context)?;
            debug!(view, "rendered listing view");
            files.push(OutputFile::new(template::listing_output(view), html));
            stats.listing_pages += 1;
        }

        // 5. JSON artifacts
        for item in &prepared {
            let Some(write) = &item.write else {
                continue;
            };
            let target = paths::normalize(write).map_err(|message| {
                BuildError::Config(format!("content type `{}`: {message}", item.name))
            })?;
            let entries = lists.get(&item.name).map(Vec::as_slice).unwrap_or_default();
            files.push(OutputFile::new(target.file, json::to_json(entries)?));
            stats.json_files += 1;
        }

        let mut seen = HashSet::new();
        for file in &files {
            if !seen.insert(&file.path) {
                warn!(path = %file.path.display(), "output path rendered more than once; last write wins");
            }
        }

        stats.duration_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
        Ok(RenderedSite {
            files,
            lists,
            stats,
        })
    }

    /// Render the site and write it to the output directory.
    pub async fn build(&self, source: &dyn ContentSource) -> Result<BuildStats> {
        let start = Instant::now();
        let site = self.render(source).await?;
        self.write(&site)?;

        let mut stats = site.stats;
        stats.duration_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
        info!(
            entries = stats.entries,
            entry_pages = stats.entry_pages,
            listing_pages = stats.listing_pages,
            json_files = stats.json_files,
            duration_ms = stats.duration_ms,
            "build complete"
        );
        Ok(stats)
    }

    /// Write rendered files under the output directory.
    pub fn write(&self, site: &RenderedSite) -> Result<()> {
        if self.clean {
            self.clean_output()?;
        }
        fs::create_dir_all(&self.output_dir)?;

        for file in &site.files {
            let path = self.output_dir.join(&file.path);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&path, &file.contents)?;
            debug!(path = %path.display(), "wrote file");
        }
        Ok(())
    }

    async fn prepare(&self, source: &dyn ContentSource, collection: &Collection) -> Result<Prepared> {
        let descriptor = source.content_type(&collection.id).await?;
        let entries = source.entries(&collection.query()).await?;
        validate_entries(&collection.id, &entries)?;

        let entries = collection.pipeline.apply(entries);
        validate_entries(&collection.id, &entries)?;

        let name = collection.locals_name(&descriptor);
        info!(
            content_type = %collection.id,
            name = %name,
            entries = entries.len(),
            "fetched entries"
        );

        let (template, planned) = match &collection.single {
            Some(single) => {
                let template = self
                    .templates
                    .resolve(&single.template)
                    .ok_or_else(|| TemplateError::NotFound(single.template.clone()))?;
                let path = match &single.path {
                    Some(path) => path.clone(),
                    None => {
                        let field = collection.display_field(&descriptor).ok_or_else(|| {
                            BuildError::Config(format!(
                                "content type `{}` has no display field; set `display_field` or `path`",
                                collection.id
                            ))
                        })?;
                        paths::default_path(&name, field)
                    }
                };
                (Some(template), single::plan(&collection.id, entries, &path)?)
            }
            None => {
                let planned = entries
                    .into_iter()
                    .map(|entry| PlannedEntry {
                        entry: AnnotatedEntry::from(entry),
                        outputs: Vec::new(),
                    })
                    .collect();
                (None, planned)
            }
        };

        Ok(Prepared {
            name,
            template,
            write: collection.write.clone(),
            planned,
        })
    }

    /// Clean the output directory.
    ///
    /// Paths are compared after resolving `..` and symlinks, so an output
    /// directory spelled relative to itself cannot reach the views or the
    /// project root.
    fn clean_output(&self) -> Result<()> {
        if !self.output_dir.exists() {
            return Ok(());
        }
        let output = fs::canonicalize(&self.output_dir)?;

        if let Some(views) = &self.views_dir
            && resolved(views)?.starts_with(&output)
        {
            return Err(BuildError::Config(format!(
                "refusing to clean {}: it contains the views directory",
                self.output_dir.display()
            )));
        }
        if let Some(root) = &self.project_root
            && resolved(root)?.starts_with(&output)
        {
            return Err(BuildError::Config(format!(
                "refusing to clean {}: it contains the project root",
                self.output_dir.display()
            )));
        }

        debug!(dir = %output.display(), "cleaning output directory");
        fs::remove_dir_all(&output)?;
        Ok(())
    }
}

/// Canonical form of `path` when it exists, the path itself otherwise.
fn resolved(path: &Path) -> Result<PathBuf> {
    if path.exists() {
        Ok(fs::canonicalize(path)?)
    } else {
        Ok(path.to_path_buf())
    }
}

#[cfg(test)]
mod tests {
    use entrypress_client::StaticSource;
    use entrypress_core::{ContentTypeDescriptor, Entry};
    use tempfile::TempDir;

    use super::*;

    fn source() -> StaticSource {
        StaticSource::new().with_content_type(
            ContentTypeDescriptor::new("blogPost", "Blog Post", Some("title")),
            vec![
                Entry::default().with_field("title", "Title C"),
                Entry::default().with_field("title", "Title B"),
            ],
        )
    }

    fn templates() -> TemplateRegistry {
        TemplateRegistry::new()
            .with_view("index", "{{#each blog_posts}}{{title}};{{/each}}")
            .unwrap()
            .with_view("post", "<h1>{{entry.title}}</h1>")
            .unwrap()
            .with_view("_layout", "unused")
            .unwrap()
    }

    #[tokio::test]
    async fn test_build_writes_pages() {
        let output = TempDir::new().unwrap();
        let builder = Builder::new(templates(), output.path()).with_collection(
            Collection::new("blogPost")
                .with_template("post")
                .with_write("posts.json"),
        );

        let stats = builder.build(&source()).await.unwrap();

        assert_eq!(stats.entries, 2);
        assert_eq!(stats.entry_pages, 2);
        assert_eq!(stats.listing_pages, 1);
        assert_eq!(stats.json_files, 1);
        assert_eq!(
            fs::read_to_string(output.path().join("index.html")).unwrap(),
            "Title C;Title B;"
        );
        assert!(output.path().join("blog_posts/title-c.html").exists());
        assert!(output.path().join("posts.json").exists());
        assert!(!output.path().join("post.html").exists());
        assert!(!output.path().join("_layout.html").exists());
    }

    #[tokio::test]
    async fn test_failed_build_writes_nothing() {
        let output = TempDir::new().unwrap();
        let target = output.path().join("public");
        let builder = Builder::new(templates(), &target)
            .with_collection(Collection::new("blogPost").with_template("missing"));

        let err = builder.build(&source()).await.unwrap_err();

        assert!(matches!(err, BuildError::Template(TemplateError::NotFound(_))));
        assert!(!target.exists());
    }

    #[tokio::test]
    async fn test_duplicate_locals_name() {
        let builder = Builder::new(templates(), "unused")
            .with_collection(Collection::new("blogPost"))
            .with_collection(Collection::new("blogPost").with_name("blog_posts"));

        let err = builder.render(&source()).await.unwrap_err();
        assert!(matches!(err, BuildError::Config(msg) if msg.contains("already bound")));
    }

    #[tokio::test]
    async fn test_missing_display_field() {
        let source = StaticSource::new().with_content_type(
            ContentTypeDescriptor::new("blogPost", "Blog Post", None),
            vec![Entry::default().with_field("title", "Title C")],
        );
        let builder = Builder::new(templates(), "unused")
            .with_collection(Collection::new("blogPost").with_template("post"));

        let err = builder.render(&source).await.unwrap_err();
        assert!(matches!(err, BuildError::Config(msg) if msg.contains("display field")));
    }

    #[tokio::test]
    async fn test_clean_refuses_views_inside_output() {
        let root = TempDir::new().unwrap();
        let views = root.path().join("views");
        fs::create_dir_all(&views).unwrap();
        fs::write(views.join("index.hbs"), "hi").unwrap();

        let mut builder = Builder::new(TemplateRegistry::load_dir(&views).unwrap(), root.path());
        builder.views_dir = Some(views.clone());

        let err = builder.build(&StaticSource::new()).await.unwrap_err();
        assert!(matches!(err, BuildError::Config(_)));
        assert!(views.join("index.hbs").exists());
    }

    #[tokio::test]
    async fn test_clean_resolves_parent_segments() {
        let root = TempDir::new().unwrap();
        let views = root.path().join("views");
        fs::create_dir_all(&views).unwrap();
        fs::create_dir_all(root.path().join("public")).unwrap();
        fs::write(views.join("index.hbs"), "hi").unwrap();
        fs::write(
            root.path().join("entrypress.toml"),
            "[contentful]\naccess_token = \"token\"\nspace_id = \"space\"\n\n\
             [build]\noutput_dir = \"public/..\"\n",
        )
        .unwrap();

        let config = Config::load(&root.path().join("entrypress.toml")).unwrap();
        let builder = Builder::from_config(&config, root.path()).unwrap();

        let err = builder.build(&StaticSource::new()).await.unwrap_err();
        assert!(matches!(err, BuildError::Config(msg) if msg.contains("views directory")));
        assert!(root.path().join("entrypress.toml").exists());
        assert!(views.join("index.hbs").exists());
    }

    #[tokio::test]
    async fn test_clean_refuses_project_root_ancestor() {
        let parent = TempDir::new().unwrap();
        let root = parent.path().join("site");
        fs::create_dir_all(root.join("views")).unwrap();
        fs::write(root.join("views/index.hbs"), "hi").unwrap();
        fs::write(root.join("notes.txt"), "keep me").unwrap();

        let mut builder = Builder::new(
            TemplateRegistry::load_dir(&root.join("views")).unwrap(),
            root.join("views/../.."),
        );
        builder.project_root = Some(root.clone());

        let err = builder.build(&StaticSource::new()).await.unwrap_err();
        assert!(matches!(err, BuildError::Config(msg) if msg.contains("project root")));
        assert!(root.join("notes.txt").exists());
    }

    #[test]
    fn test_build_stats() {
        let stats = BuildStats::default();
        assert_eq!(stats.entries, 0);
        assert_eq!(stats.duration_ms, 0);
    }
}
