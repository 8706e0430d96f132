//! entrypress generator
//!
//! Turns fetched entries into pages and JSON artifacts.
//!
//! # Modules
//!
//! - [`template`] - Handlebars views, partials and view helpers
//! - [`pipeline`] - Sort and transform stage
//! - [`paths`] - Output paths for single-entry pages
//! - [`collection`] - Per content type build settings
//! - [`locals`] - Template locals and per-entry contexts
//! - [`single`] - Path planning, URL annotation and entry page rendering
//! - [`json`] - JSON artifacts
//! - [`build`] - Build orchestration

pub mod build;
pub mod collection;
pub mod json;
pub mod locals;
pub mod paths;
pub mod pipeline;
pub mod single;
pub mod template;

pub use build::{BuildError, BuildStats, Builder, OutputFile, RenderedSite};
pub use collection::{Collection, SingleEntry};
pub use locals::Locals;
pub use paths::{PathFn, default_path, pattern_path};
pub use pipeline::{EntryPipeline, SortFn, TransformFn};
pub use template::{TemplateContext, TemplateError, TemplateRegistry};
