//! entrypress core library
//!
//! Core types, configuration, and error handling shared by the entrypress
//! content client, generator and CLI.

pub mod config;
pub mod entry;
pub mod error;
pub mod slug;

pub use config::{
    CompositionOrder, Config, ContentTypeConfig, PathSpec, SortSpec, TransformSpec,
};
pub use entry::{
    AnnotatedEntry, ContentTypeDescriptor, Entry, FieldValue, Fields, Link, PathResult,
    UrlAnnotation,
};
pub use error::{CoreError, Result};
pub use slug::slugify;
