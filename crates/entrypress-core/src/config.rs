//! Project configuration management.

use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

/// Delivery API host.
pub const DELIVERY_HOST: &str = "cdn.contentful.com";

/// Preview API host (drafts included).
pub const PREVIEW_HOST: &str = "preview.contentful.com";

/// Main configuration structure for entrypress.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// CMS credentials and API settings.
    #[serde(default)]
    pub contentful: ContentfulConfig,

    /// Build settings.
    #[serde(default)]
    pub build: BuildConfig,

    /// Project-wide locals visible in every view.
    #[serde(default)]
    pub locals: serde_json::Map<String, serde_json::Value>,

    /// Content types to fetch.
    #[serde(default)]
    pub content_types: ContentTypesConfig,
}

/// CMS API configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentfulConfig {
    /// API access token.
    #[serde(default)]
    pub access_token: Option<String>,

    /// Space id.
    #[serde(default)]
    pub space_id: Option<String>,

    /// Use the preview API instead of the delivery API.
    #[serde(default)]
    pub preview: bool,

    /// Host override (proxies, tests). Scheme defaults to https.
    #[serde(default)]
    pub host: Option<String>,

    /// Link resolution depth requested from the API.
    #[serde(default = "default_include")]
    pub include: u32,

    /// Page size for entry requests.
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

/// Build configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildConfig {
    /// Output directory for generated files.
    #[serde(default = "default_output_dir")]
    pub output_dir: String,

    /// Directory holding view templates.
    #[serde(default = "default_views_dir")]
    pub views_dir: String,
}

/// Content type list, either as an array or as a table keyed by locals name.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ContentTypesConfig {
    /// `content_types = ["id", { id = "...", name = "..." }]`
    List(Vec<ContentTypeEntry>),
    /// `[content_types.posts] id = "..."`
    Keyed(IndexMap<String, ContentTypeConfig>),
}

impl Default for ContentTypesConfig {
    fn default() -> Self {
        Self::List(Vec::new())
    }
}

/// One element of the array form.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ContentTypeEntry {
    /// Bare content type id.
    Id(String),
    /// Full table.
    Full(ContentTypeConfig),
}

/// Settings for one content type.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContentTypeConfig {
    /// Content type id in the CMS.
    #[serde(default)]
    pub id: String,

    /// Locals name the entry list is bound under.
    #[serde(default)]
    pub name: Option<String>,

    /// Display field override.
    #[serde(default)]
    pub display_field: Option<String>,

    /// Single-entry view name; enables per-entry pages.
    #[serde(default)]
    pub template: Option<String>,

    /// Path pattern(s) for single-entry pages.
    #[serde(default)]
    pub path: Option<PathSpec>,

    /// JSON artifact path, relative to the output directory.
    #[serde(default)]
    pub write: Option<String>,

    /// Extra query parameters for the entries request.
    #[serde(default)]
    pub filters: IndexMap<String, String>,

    /// Field-based sort.
    #[serde(default)]
    pub sort: Option<SortSpec>,

    /// Field reshaping.
    #[serde(default)]
    pub transform: Option<TransformSpec>,

    /// Composition order when both sort and transform are set.
    #[serde(default)]
    pub order: CompositionOrder,
}

/// Path pattern(s) for single-entry output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathSpec {
    /// One output file per entry.
    One(String),
    /// One output file per pattern, per entry.
    Many(Vec<String>),
}

/// Declarative sort by a field value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortSpec {
    pub field: String,
    #[serde(default)]
    pub descending: bool,
}

/// Declarative field reshaping, applied as keep, drop, rename, set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransformSpec {
    #[serde(default)]
    pub keep: Vec<String>,
    #[serde(default)]
    pub drop: Vec<String>,
    #[serde(default)]
    pub rename: IndexMap<String, String>,
    #[serde(default)]
    pub set: IndexMap<String, serde_json::Value>,
}

/// How sort and transform compose.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompositionOrder {
    #[default]
    SortThenTransform,
    TransformThenSort,
}

fn default_include() -> u32 {
    1
}

fn default_page_size() -> u32 {
    1000
}

fn default_output_dir() -> String {
    "public".to_string()
}

fn default_views_dir() -> String {
    "views".to_string()
}

impl Default for ContentfulConfig {
    fn default() -> Self {
        Self {
            access_token: None,
            space_id: None,
            preview: false,
            host: None,
            include: default_include(),
            page_size: default_page_size(),
        }
    }
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            views_dir: default_views_dir(),
        }
    }
}

impl ContentfulConfig {
    /// API host to talk to.
    #[must_use]
    pub fn api_host(&self) -> &str {
        match &self.host {
            Some(host) => host,
            None if self.preview => PREVIEW_HOST,
            None => DELIVERY_HOST,
        }
    }

    /// Base URL for space-scoped requests.
    #[must_use]
    pub fn base_url(&self) -> String {
        let host = self.api_host().trim_end_matches('/');
        let space = self.space_id.as_deref().unwrap_or_default();
        if host.starts_with("http://") || host.starts_with("https://") {
            format!("{host}/spaces/{space}")
        } else {
            format!("https://{host}/spaces/{space}")
        }
    }

    fn validate(&self) -> Result<()> {
        if self.access_token.as_deref().is_none_or(str::is_empty) {
            return Err(CoreError::missing_credential("access_token"));
        }
        if self.space_id.as_deref().is_none_or(str::is_empty) {
            return Err(CoreError::missing_credential("space_id"));
        }
        Ok(())
    }
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(CoreError::config(format!(
                "Configuration file not found: {}",
                path.display()
            )));
        }

        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content).map_err(|e| {
            CoreError::config_with_source(
                format!("Failed to parse config file: {}", path.display()),
                e,
            )
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Load configuration with `ENTRYPRESS__*` environment overrides.
    ///
    /// Keeps the access token out of the project file:
    /// `ENTRYPRESS__CONTENTFUL__ACCESS_TOKEN=... entrypress build`.
    pub fn load_with_env(path: &Path) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::from(path))
            .add_source(config::Environment::with_prefix("ENTRYPRESS").separator("__"))
            .build()?;

        let config: Config = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    ///
    /// Runs before any network call: credentials first, then content types.
    pub fn validate(&self) -> Result<()> {
        self.contentful.validate()?;

        let content_types = self.content_types()?;
        let mut seen = std::collections::HashSet::new();
        for ct in &content_types {
            if let Some(name) = &ct.name
                && !seen.insert(name.as_str())
            {
                return Err(CoreError::config(format!(
                    "content type name `{name}` is used more than once"
                )));
            }

            if let Some(write) = &ct.write
                && (write.is_empty() || Path::new(write).is_absolute() || write.contains(".."))
            {
                return Err(CoreError::config(format!(
                    "content type `{}`: write path `{write}` must be relative to the output directory",
                    ct.id
                )));
            }

            if ct.path.is_some() && ct.template.is_none() {
                tracing::warn!(
                    content_type = %ct.id,
                    "path is set without a template; no single-entry pages will be rendered"
                );
            }
        }

        Ok(())
    }

    /// Resolve the configured content types into a flat list.
    ///
    /// Keyed tables use their key as the locals name; bare strings become ids.
    pub fn content_types(&self) -> Result<Vec<ContentTypeConfig>> {
        let resolved: Vec<ContentTypeConfig> = match &self.content_types {
            ContentTypesConfig::List(items) => items
                .iter()
                .map(|item| match item {
                    ContentTypeEntry::Id(id) => ContentTypeConfig {
                        id: id.clone(),
                        ..Default::default()
                    },
                    ContentTypeEntry::Full(ct) => ct.clone(),
                })
                .collect(),
            ContentTypesConfig::Keyed(map) => map
                .iter()
                .map(|(name, ct)| ContentTypeConfig {
                    name: Some(ct.name.clone().unwrap_or_else(|| name.clone())),
                    ..ct.clone()
                })
                .collect(),
        };

        if resolved.is_empty() {
            return Err(CoreError::missing_content_type(
                "no content types are configured",
            ));
        }

        for (index, ct) in resolved.iter().enumerate() {
            if ct.id.trim().is_empty() {
                let label = ct
                    .name
                    .as_deref()
                    .map_or_else(|| format!("#{index}"), |n| format!("`{n}`"));
                return Err(CoreError::missing_content_type(format!(
                    "content type {label} has no id"
                )));
            }
        }

        Ok(resolved)
    }
}
