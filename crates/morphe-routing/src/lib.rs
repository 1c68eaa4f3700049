//! Conversion routing core: weighted format graph, lazy path search, and the
//! executor that drives handler pipelines.
//!
//! Given a heterogeneous set of conversion handlers, each speaking a subset
//! of file formats, this crate answers one question: what sequence of
//! handler invocations transforms a file from format A to format B,
//! optimally under a cost model reflecting conversion quality, handler
//! preference, and semantic plausibility, and then drives the multi-hop
//! conversion, attempting successive candidate routes until one succeeds.
//!
//! # Architecture
//!
//! - `queue`: min-cost frontier queue with a deterministic tiebreak
//! - `cost`: tunable constants, category-change and adaptive cost tables
//! - `graph`: vertices keyed by normalized MIME, handler-mediated edges
//! - `search`: Dijkstra-style lazy candidate enumeration as an `Iterator`
//! - `executor`: per-step handler protocol driving with error isolation
//! - `core`: registry + graph + executor behind one lifecycle
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use morphe_formats::{FileData, Handler};
//! use morphe_routing::ConversionCore;
//!
//! # async fn example(handlers: Vec<Arc<dyn Handler>>, bytes: Vec<u8>) {
//! let mut core = ConversionCore::new(handlers).expect("unique handler names");
//! core.init().await;
//!
//! let source = core.by_extension("png").expect("png readable").clone();
//! let target = core.by_mime("audio/mpeg").expect("mp3 reachable").clone();
//! let files = vec![FileData::new("input.png", bytes)];
//!
//! match core.convert(files, &source, &target).await {
//!     Some(result) => println!("converted in {} hops", result.path.len() - 1),
//!     None => println!("no route succeeded"),
//! }
//! # }
//! ```

#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used))]

// Module declarations
pub mod core;
pub mod cost;
pub mod error;
pub mod executor;
pub mod graph;
pub mod queue;
pub mod search;

#[cfg(test)]
pub(crate) mod test_support;

// Re-exports for public API
pub use crate::core::{ConversionCore, CoreOptions};
pub use cost::{
    AdaptiveCostEntry, CategoryChangeEntry, CostTables, DEFAULT_CATEGORY_CHANGE_COST, DEPTH_COST,
    FORMAT_PRIORITY_COST, HANDLER_PRIORITY_COST, LOG_FREQUENCY, LOSSY_COST_MULTIPLIER,
};
pub use error::{CoreError, CoreResult};
pub use executor::{ConversionExecutor, ConversionResult};
pub use graph::{ConversionGraph, Edge, GraphData, GraphOptions, Vertex};
pub use queue::SearchQueue;
pub use search::{
    PathNode, PathSearch, RoutedPath, SearchEvent, SearchEventKind, SearchTarget, path_categories,
};
