//! Bundled lifecycle for the conversion core.
//!
//! Instead of scattering the format cache and the graph across module-level
//! state, both are owned by one [`ConversionCore`] with a controlled
//! lifecycle: construct it with the handler set, `init()` it to run handler
//! initialization and build the graph, then route conversions through it.
//! Cost-table mutations go through [`ConversionCore::graph_mut`] and take
//! effect on the next `init()`; mutators must not run concurrently with a
//! search, which the exclusive borrow already guarantees.

use std::sync::Arc;

use morphe_formats::{FileData, FormatOption, FormatRegistry, Handler};

use crate::error::CoreResult;
use crate::executor::{ConversionExecutor, ConversionResult};
use crate::graph::{ConversionGraph, GraphOptions};

/// Construction options for [`ConversionCore`].
#[derive(Debug, Clone, Copy, Default)]
pub struct CoreOptions {
    /// Accept routes terminating on any handler producing the target MIME.
    pub simple_mode: bool,
    /// Graph construction options.
    pub graph: GraphOptions,
}

/// Registry, graph, and executor behind one lifecycle.
#[derive(Debug)]
pub struct ConversionCore {
    registry: FormatRegistry,
    graph: ConversionGraph,
    simple_mode: bool,
}

impl ConversionCore {
    /// New core over the handler set with default options.
    ///
    /// Fails on an invalid handler set (duplicate or empty names).
    pub fn new(handlers: Vec<Arc<dyn Handler>>) -> CoreResult<Self> {
        Self::with_options(handlers, CoreOptions::default())
    }

    /// New core with explicit options.
    pub fn with_options(handlers: Vec<Arc<dyn Handler>>, options: CoreOptions) -> CoreResult<Self> {
        let registry = FormatRegistry::new(handlers.clone())?;
        let graph = ConversionGraph::with_options(handlers, options.graph);
        Ok(Self {
            registry,
            graph,
            simple_mode: options.simple_mode,
        })
    }

    /// Initialize handlers the cache does not cover and (re)build the graph.
    ///
    /// Idempotent for an unchanged handler set and cost tables; call again
    /// after mutating cost tables or restoring a cache to apply the change.
    pub async fn init(&mut self) {
        self.registry.init().await;
        self.graph.rebuild(self.registry.cache());
    }

    /// The format registry.
    pub fn registry(&self) -> &FormatRegistry {
        &self.registry
    }

    /// The conversion graph.
    pub fn graph(&self) -> &ConversionGraph {
        &self.graph
    }

    /// Mutable graph access, for cost-table edits and event listeners.
    /// Follow edits with [`init`](Self::init).
    pub fn graph_mut(&mut self) -> &mut ConversionGraph {
        &mut self.graph
    }

    /// The flat option list.
    pub fn options(&self) -> &[FormatOption] {
        self.registry.options()
    }

    /// Readable option by filename extension, case-insensitively.
    pub fn by_extension(&self, extension: &str) -> Option<&FormatOption> {
        self.registry.by_extension(extension)
    }

    /// Readable option by MIME, normalized first.
    pub fn by_mime(&self, mime: &str) -> Option<&FormatOption> {
        self.registry.by_mime(mime)
    }

    /// Route and execute a conversion, trying candidates until one succeeds.
    pub async fn convert(
        &self,
        files: Vec<FileData>,
        source: &FormatOption,
        target: &FormatOption,
    ) -> Option<ConversionResult> {
        ConversionExecutor::new(&self.graph, self.registry.cache())
            .with_simple_mode(self.simple_mode)
            .try_convert(files, source, target)
            .await
    }

    /// Serialized supported-format cache in handler declaration order.
    pub fn export_cache_json(&self) -> CoreResult<String> {
        Ok(self.registry.export_cache_json()?)
    }

    /// Restore the cache from its serialized form and rebuild the graph.
    pub fn restore_cache_json(&mut self, json: &str) -> CoreResult<()> {
        self.registry.restore_cache_json(json)?;
        self.graph.rebuild(self.registry.cache());
        Ok(())
    }
}
