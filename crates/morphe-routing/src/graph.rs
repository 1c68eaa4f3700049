//! The weighted conversion graph.
//!
//! Vertices are formats keyed by normalized MIME; edges are handler-mediated
//! direct conversions, costed by the model in [`crate::cost`]. The graph is
//! rebuilt whenever the handler set, the supported-format cache, or the cost
//! tables change; rebuilds are idempotent for equal inputs, and a build never
//! affects an in-flight search (searches borrow the graph immutably).
//!
//! Edge records are positionally referenced: the edge list is append-only
//! across a single build and each vertex holds the indices of its outgoing
//! edges.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use morphe_formats::{FormatCache, FormatDescriptor, Handler, normalize};

use crate::cost::{
    AdaptiveCostEntry, CategoryChangeEntry, CostTables, EdgeCostContext, edge_cost,
};
use crate::search::{PathNode, PathSearch, SearchEvent, SearchEventKind, SearchTarget};

/// One graph vertex: a normalized MIME type and its outgoing edge indices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Vertex {
    /// Normalized MIME string identifying the vertex.
    pub mime: String,
    /// Indices into the edge list, in build order.
    pub out_edges: Vec<usize>,
}

/// One directed conversion edge mediated by a single handler.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Edge {
    /// Source format as declared by the handler.
    pub from: FormatDescriptor,
    /// Destination format as declared by the handler.
    pub to: FormatDescriptor,
    /// Name of the mediating handler.
    pub handler: String,
    /// Edge cost; strictly positive and finite.
    pub cost: f64,
    /// Index of the source vertex.
    pub from_vertex: usize,
    /// Index of the destination vertex.
    pub to_vertex: usize,
}

/// Deep copy of the graph structure plus both cost tables.
///
/// Shares no mutable state with the graph; safe to hand to debugging and UI
/// code.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphData {
    /// All vertices, in build order.
    pub vertices: Vec<Vertex>,
    /// All edges, in build order.
    pub edges: Vec<Edge>,
    /// Category-change cost entries, in table order.
    pub category_change_costs: Vec<CategoryChangeEntry>,
    /// Adaptive cost entries, in table order.
    pub category_adaptive_costs: Vec<AdaptiveCostEntry>,
}

/// Construction options for [`ConversionGraph`].
#[derive(Debug, Clone, Copy)]
pub struct GraphOptions {
    /// Strict category costing: sum over all table entries instead of taking
    /// the cheapest applicable one. Yields more literal paths.
    pub strict_categories: bool,
    /// Reject routes whose primary categories run `image, video, audio`
    /// consecutively. On by default; such routes lose all meaningful signal.
    pub safety_filter: bool,
}

impl Default for GraphOptions {
    fn default() -> Self {
        Self {
            strict_categories: false,
            safety_filter: true,
        }
    }
}

type Listener = Box<dyn Fn(&SearchEvent<'_>) + Send + Sync>;

/// Weighted graph over handler-declared format conversions.
pub struct ConversionGraph {
    vertices: Vec<Vertex>,
    edges: Vec<Edge>,
    mime_index: HashMap<String, usize>,
    handlers: Vec<Arc<dyn Handler>>,
    tables: CostTables,
    options: GraphOptions,
    listeners: Vec<Listener>,
}

impl fmt::Debug for ConversionGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversionGraph")
            .field("vertices", &self.vertices.len())
            .field("edges", &self.edges.len())
            .field("handlers", &self.handlers.len())
            .field("options", &self.options)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl ConversionGraph {
    /// New empty graph over the given handlers with default options and the
    /// shipped cost tables. Call [`rebuild`](Self::rebuild) to populate.
    pub fn new(handlers: Vec<Arc<dyn Handler>>) -> Self {
        Self::with_options(handlers, GraphOptions::default())
    }

    /// New empty graph with explicit options.
    pub fn with_options(handlers: Vec<Arc<dyn Handler>>, options: GraphOptions) -> Self {
        Self {
            vertices: Vec::new(),
            edges: Vec::new(),
            mime_index: HashMap::new(),
            handlers,
            tables: CostTables::default(),
            options,
            listeners: Vec::new(),
        }
    }

    /// Rebuild vertices and edges from the cache.
    ///
    /// Deterministic for a fixed input ordering: handlers are walked in
    /// configured order and formats in declared order, so two rebuilds from
    /// equal inputs produce identical structures.
    pub fn rebuild(&mut self, cache: &FormatCache) {
        let mut vertices: Vec<Vertex> = Vec::new();
        let mut mime_index: HashMap<String, usize> = HashMap::new();
        let mut edges: Vec<Edge> = Vec::new();

        let handler_pairs = self.tables.handler_pairs();
        let ctx = EdgeCostContext {
            tables: &self.tables,
            handler_pairs: &handler_pairs,
            strict_categories: self.options.strict_categories,
        };

        for (handler_idx, handler) in self.handlers.iter().enumerate() {
            let Some(formats) = cache.get(handler.name()) else {
                continue;
            };
            let from_set: Vec<&FormatDescriptor> = formats
                .iter()
                .filter(|f| f.from && !f.mime.is_empty())
                .collect();
            let to_set: Vec<(usize, &FormatDescriptor)> = formats
                .iter()
                .enumerate()
                .filter(|(_, f)| f.to && !f.mime.is_empty())
                .collect();

            for format in from_set.iter().copied().chain(to_set.iter().map(|(_, f)| *f)) {
                ensure_vertex(&mut vertices, &mut mime_index, &format.mime);
            }

            for from in &from_set {
                for (format_pos, to) in &to_set {
                    // Self-loops are forbidden.
                    if from.mime == to.mime {
                        continue;
                    }
                    let cost = edge_cost(from, to, handler.name(), handler_idx, *format_pos, &ctx);
                    let from_vertex = mime_index[&from.mime];
                    let to_vertex = mime_index[&to.mime];
                    let edge_idx = edges.len();
                    edges.push(Edge {
                        from: (*from).clone(),
                        to: (*to).clone(),
                        handler: handler.name().to_string(),
                        cost,
                        from_vertex,
                        to_vertex,
                    });
                    vertices[from_vertex].out_edges.push(edge_idx);
                }
            }
        }

        debug!(
            vertices = vertices.len(),
            edges = edges.len(),
            "conversion graph rebuilt"
        );
        self.vertices = vertices;
        self.edges = edges;
        self.mime_index = mime_index;
    }

    /// Upsert a category-change cost keyed by `(from, to, handler)`.
    /// Takes effect on the next rebuild.
    pub fn add_category_change_cost(
        &mut self,
        from: &str,
        to: &str,
        handler: Option<&str>,
        cost: f64,
    ) {
        self.tables.add_change(from, to, handler, cost);
    }

    /// Update an existing category-change cost; returns whether one matched.
    pub fn update_category_change_cost(
        &mut self,
        from: &str,
        to: &str,
        handler: Option<&str>,
        cost: f64,
    ) -> bool {
        self.tables.update_change(from, to, handler, cost)
    }

    /// Remove a category-change cost; returns whether one matched.
    pub fn remove_category_change_cost(
        &mut self,
        from: &str,
        to: &str,
        handler: Option<&str>,
    ) -> bool {
        self.tables.remove_change(from, to, handler)
    }

    /// Whether a category-change cost exists for the exact key.
    pub fn has_category_change_cost(&self, from: &str, to: &str, handler: Option<&str>) -> bool {
        self.tables.has_change(from, to, handler)
    }

    /// Upsert an adaptive cost keyed by the full category sequence.
    /// Takes effect on the next rebuild.
    pub fn add_category_adaptive_cost(&mut self, categories: &[&str], cost: f64) {
        self.tables.add_adaptive(categories, cost);
    }

    /// Update an existing adaptive cost; returns whether one matched.
    pub fn update_category_adaptive_cost(&mut self, categories: &[&str], cost: f64) -> bool {
        self.tables.update_adaptive(categories, cost)
    }

    /// Remove an adaptive cost; returns whether one matched.
    pub fn remove_category_adaptive_cost(&mut self, categories: &[&str]) -> bool {
        self.tables.remove_adaptive(categories)
    }

    /// Whether an adaptive cost exists for the exact sequence.
    pub fn has_category_adaptive_cost(&self, categories: &[&str]) -> bool {
        self.tables.has_adaptive(categories)
    }

    /// Lazily enumerate candidate paths from `source` to `target` in
    /// non-decreasing cost order. Each call starts a fresh search.
    pub fn search_path(
        &self,
        source: PathNode,
        target: SearchTarget,
        simple_mode: bool,
    ) -> PathSearch<'_> {
        PathSearch::new(self, source, target, simple_mode)
    }

    /// Register a listener invoked synchronously at `searching`, `found`,
    /// and `skipped` points with the path at that moment.
    ///
    /// Listeners must not mutate the graph (the borrow checker enforces
    /// this: a search holds a shared borrow for its whole lifetime).
    pub fn on_event(&mut self, listener: impl Fn(&SearchEvent<'_>) + Send + Sync + 'static) {
        self.listeners.push(Box::new(listener));
    }

    /// Deep copy of the graph structure plus both cost tables.
    pub fn data(&self) -> GraphData {
        GraphData {
            vertices: self.vertices.clone(),
            edges: self.edges.clone(),
            category_change_costs: self.tables.change_entries().to_vec(),
            category_adaptive_costs: self.tables.adaptive_entries().to_vec(),
        }
    }

    /// Number of vertices.
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Number of edges.
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// The configured handler list.
    pub fn handlers(&self) -> &[Arc<dyn Handler>] {
        &self.handlers
    }

    /// Look a handler up by name.
    pub fn handler_by_name(&self, name: &str) -> Option<&Arc<dyn Handler>> {
        self.handlers.iter().find(|handler| handler.name() == name)
    }

    pub(crate) fn vertex_index(&self, raw_mime: &str) -> Option<usize> {
        self.mime_index.get(normalize(raw_mime)).copied()
    }

    pub(crate) fn out_edges(&self, vertex: usize) -> &[usize] {
        &self.vertices[vertex].out_edges
    }

    pub(crate) fn edge(&self, idx: usize) -> &Edge {
        &self.edges[idx]
    }

    pub(crate) fn tables(&self) -> &CostTables {
        &self.tables
    }

    pub(crate) fn safety_filter_enabled(&self) -> bool {
        self.options.safety_filter
    }

    pub(crate) fn emit(&self, kind: SearchEventKind, path: &[PathNode]) {
        if self.listeners.is_empty() {
            return;
        }
        let event = SearchEvent { kind, path };
        for listener in &self.listeners {
            listener(&event);
        }
    }
}

fn ensure_vertex(
    vertices: &mut Vec<Vertex>,
    mime_index: &mut HashMap<String, usize>,
    mime: &str,
) -> usize {
    if let Some(&idx) = mime_index.get(mime) {
        return idx;
    }
    let idx = vertices.len();
    vertices.push(Vertex {
        mime: mime.to_string(),
        out_edges: Vec::new(),
    });
    mime_index.insert(mime.to_string(), idx);
    idx
}
