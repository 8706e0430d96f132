//! entrypress content sources
//!
//! # Modules
//!
//! - [`source`] - The [`ContentSource`] trait and entry queries
//! - [`contentful`] - HTTP client for the Contentful delivery and preview APIs
//! - [`links`] - Link resolution against included records
//! - [`fixture`] - In-memory source for offline builds and tests
//! - [`error`] - Fetch errors

pub mod contentful;
pub mod error;
pub mod fixture;
pub mod links;
pub mod source;

pub use contentful::DeliveryClient;
pub use error::{FetchError, Result};
pub use fixture::StaticSource;
pub use links::LinkIndex;
pub use source::{ContentSource, EntryQuery};
