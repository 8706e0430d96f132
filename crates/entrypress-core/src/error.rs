//! Error types for the entrypress core library.

use thiserror::Error;

/// Result type alias using `CoreError`.
pub type Result<T> = std::result::Result<T, CoreError>;

/// Core error types for entrypress.
#[derive(Error, Debug)]
pub enum CoreError {
    /// A required API credential is absent or empty.
    #[error("missing credential: `{field}` must be set in the [contentful] section")]
    MissingCredential { field: &'static str },

    /// A content type has no resolvable identifier.
    #[error("missing content type id: {message}")]
    MissingContentType { message: String },

    /// An entry uses a field name that is reserved for entry metadata.
    #[error("entry {entry} of `{content_type}` has a field named `{field}`, which is reserved")]
    ReservedFieldName {
        content_type: String,
        entry: String,
        field: String,
    },

    /// A path function failed or produced an unusable path.
    #[error("path function failed for entry {index} of `{content_type}`: {message}")]
    PathFunction {
        content_type: String,
        index: usize,
        message: String,
    },

    /// Configuration loading or parsing error.
    #[error("Configuration error: {message}")]
    Config {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// File system I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Generic configuration crate error.
    #[error("Config crate error: {0}")]
    ConfigCrate(#[from] config::ConfigError),
}

impl CoreError {
    /// Create a missing credential error for the given config key.
    pub fn missing_credential(field: &'static str) -> Self {
        Self::MissingCredential { field }
    }

    /// Create a missing content type error.
    pub fn missing_content_type(message: impl Into<String>) -> Self {
        Self::MissingContentType {
            message: message.into(),
        }
    }

    /// Create a reserved field name error.
    pub fn reserved_field(
        content_type: impl Into<String>,
        entry: impl Into<String>,
        field: impl Into<String>,
    ) -> Self {
        Self::ReservedFieldName {
            content_type: content_type.into(),
            entry: entry.into(),
            field: field.into(),
        }
    }

    /// Create a path function error.
    pub fn path_function(
        content_type: impl Into<String>,
        index: usize,
        message: impl Into<String>,
    ) -> Self {
        Self::PathFunction {
            content_type: content_type.into(),
            index,
            message: message.into(),
        }
    }

    /// Create a new configuration error with a message.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            source: None,
        }
    }

    /// Create a new configuration error with source.
    pub fn config_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Config {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }
}
