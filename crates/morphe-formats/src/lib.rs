//! Format descriptors, MIME normalization, and the handler registry for the
//! morphe conversion core.
//!
//! This crate is the vocabulary layer of the router: it defines what a
//! format is, how handlers declare the formats they speak, and how those
//! declarations are cached, persisted, and looked up. The routing crate
//! builds its weighted graph on top of these types.
//!
//! # Architecture
//!
//! - `descriptor`: the immutable per-handler format record and its category
//!   tags
//! - `mime`: canonical MIME spellings, so graph vertices key on string
//!   equality
//! - `handler`: the async capability contract conversion backends implement
//! - `cache`: the shared supported-format cache and its JSON persistence
//! - `registry`: option enumeration plus extension/MIME lookup
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use morphe_formats::{FormatRegistry, Handler};
//!
//! # async fn example(handlers: Vec<Arc<dyn Handler>>) {
//! let mut registry = FormatRegistry::new(handlers).expect("unique handler names");
//! registry.init().await;
//!
//! if let Some(option) = registry.by_extension("png") {
//!     println!("source: {}", option.label());
//! }
//! # }
//! ```

#![warn(missing_docs)]
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used))]

// Module declarations
pub mod cache;
pub mod descriptor;
pub mod error;
pub mod handler;
pub mod mime;
pub mod registry;

// Re-exports for public API
pub use cache::{CacheEntries, FormatCache};
pub use descriptor::{CategorySpec, FormatDescriptor, category};
pub use error::{CacheError, HandlerError, HandlerResult, RegistryError, RegistryResult};
pub use handler::{FileData, Handler};
pub use mime::normalize;
pub use registry::{FormatOption, FormatRegistry};
