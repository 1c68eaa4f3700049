//! Lazy increasing-cost path enumeration.
//!
//! Candidate routes surface as the frontier reaches the destination, through
//! a stateful [`Iterator`]: each `next()` drives the Dijkstra loop until a
//! route is yielded or the frontier drains. A search is restartable only by
//! constructing a new one.
//!
//! The `visited` list is deliberately a list, not a set, and never shrinks.
//! Each frontier frame remembers the length of the list at the moment it was
//! enqueued (`visited_border`); a vertex only counts as visited for a frame
//! when it was recorded *before* that border. This suppresses cycles inside
//! one exploration frontier while still allowing the same vertex to be
//! re-explored along genuinely different, later-discovered prefixes.

use std::fmt;
use std::sync::Arc;

use tracing::debug;

use morphe_formats::{FormatDescriptor, Handler};

use crate::cost::{LOG_FREQUENCY, adaptive_cost};
use crate::graph::ConversionGraph;
use crate::queue::SearchQueue;

/// Primary-category sequence that destroys all meaningful signal; routes
/// containing it consecutively are rejected by the safety filter.
const UNSAFE_SEQUENCE: [&str; 3] = ["image", "video", "audio"];

/// One step of a route: the handler producing `format`.
///
/// The first node of a path is the source handler and format (context only);
/// each subsequent node names the conversion step into its format by its
/// handler.
#[derive(Clone)]
pub struct PathNode {
    /// The handler performing the step (or, for the first node, the source
    /// handler).
    pub handler: Arc<dyn Handler>,
    /// The format this step produces (or, for the first node, the source
    /// format).
    pub format: FormatDescriptor,
}

impl PathNode {
    /// New path node.
    pub fn new(handler: Arc<dyn Handler>, format: FormatDescriptor) -> Self {
        Self { handler, format }
    }
}

impl fmt::Debug for PathNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PathNode")
            .field("handler", &self.handler.name())
            .field("format", &self.format.format)
            .field("mime", &self.format.mime)
            .finish()
    }
}

impl PartialEq for PathNode {
    fn eq(&self, other: &Self) -> bool {
        self.handler.name() == other.handler.name() && self.format == other.format
    }
}

/// Search destination: the format to reach and, optionally, the handler that
/// must produce it. Without a handler (or in simple mode) the MIME alone
/// determines acceptance.
#[derive(Clone)]
pub struct SearchTarget {
    /// Required producing handler, if any.
    pub handler: Option<Arc<dyn Handler>>,
    /// Destination format.
    pub format: FormatDescriptor,
}

impl SearchTarget {
    /// Target that must be produced by `handler`.
    pub fn new(handler: Arc<dyn Handler>, format: FormatDescriptor) -> Self {
        Self {
            handler: Some(handler),
            format,
        }
    }

    /// Target accepted from any handler.
    pub fn any_handler(format: FormatDescriptor) -> Self {
        Self {
            handler: None,
            format,
        }
    }
}

impl fmt::Debug for SearchTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SearchTarget")
            .field("handler", &self.handler.as_ref().map(|h| h.name()))
            .field("mime", &self.format.mime)
            .finish()
    }
}

/// A complete route with its accumulated cost under the cost model.
#[derive(Debug, Clone, PartialEq)]
pub struct RoutedPath {
    /// The route, source node first.
    pub nodes: Vec<PathNode>,
    /// Total cost: edge costs plus adaptive contributions.
    pub cost: f64,
}

/// Kind of a search progress event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchEventKind {
    /// A vertex is being expanded.
    Searching,
    /// A route is about to be yielded.
    Found,
    /// A frame or route was rejected (visited, safety filter, or
    /// target-handler mismatch).
    Skipped,
}

/// Search progress event, delivered synchronously to graph listeners.
#[derive(Debug)]
pub struct SearchEvent<'a> {
    /// What happened.
    pub kind: SearchEventKind,
    /// The path at this moment.
    pub path: &'a [PathNode],
}

struct Frame {
    vertex: usize,
    path: Vec<PathNode>,
    visited_border: usize,
}

/// Lazy candidate enumeration over a built [`ConversionGraph`].
///
/// Yields routes in non-decreasing cost order; equal-cost routes arrive in
/// queue insertion order (see [`crate::queue::SearchQueue`]).
pub struct PathSearch<'g> {
    graph: &'g ConversionGraph,
    queue: SearchQueue<Frame>,
    visited: Vec<usize>,
    target: SearchTarget,
    destination: Option<usize>,
    simple_mode: bool,
    pops: u64,
}

impl<'g> PathSearch<'g> {
    pub(crate) fn new(
        graph: &'g ConversionGraph,
        source: PathNode,
        target: SearchTarget,
        simple_mode: bool,
    ) -> Self {
        let mut queue = SearchQueue::new();
        let source_vertex = graph.vertex_index(&source.format.mime);
        let destination = graph.vertex_index(&target.format.mime);
        if let (Some(vertex), Some(_)) = (source_vertex, destination) {
            queue.push(
                0.0,
                Frame {
                    vertex,
                    path: vec![source],
                    visited_border: 0,
                },
            );
        }
        Self {
            graph,
            queue,
            visited: Vec::new(),
            target,
            destination,
            simple_mode,
            pops: 0,
        }
    }

    fn accepts(&self, path: &[PathNode]) -> bool {
        if self.simple_mode {
            return true;
        }
        match &self.target.handler {
            None => true,
            Some(target) => path
                .last()
                .is_some_and(|node| node.handler.name() == target.name()),
        }
    }
}

impl Iterator for PathSearch<'_> {
    type Item = RoutedPath;

    fn next(&mut self) -> Option<Self::Item> {
        use SearchEventKind::{Found, Searching, Skipped};

        let destination = self.destination?;
        while let Some((cost, frame)) = self.queue.pop() {
            self.pops += 1;
            if self.pops % LOG_FREQUENCY == 0 {
                debug!(
                    pops = self.pops,
                    queued = self.queue.len(),
                    visited = self.visited.len(),
                    "path search still expanding"
                );
            }

            if self.visited[..frame.visited_border].contains(&frame.vertex) {
                self.graph.emit(Skipped, &frame.path);
                continue;
            }

            if frame.vertex == destination {
                if self.graph.safety_filter_enabled() && contains_unsafe_sequence(&frame.path) {
                    self.graph.emit(Skipped, &frame.path);
                    continue;
                }
                if self.accepts(&frame.path) {
                    self.graph.emit(Found, &frame.path);
                    return Some(RoutedPath {
                        nodes: frame.path,
                        cost,
                    });
                }
                self.graph.emit(Skipped, &frame.path);
                continue;
            }

            self.visited.push(frame.vertex);
            self.graph.emit(Searching, &frame.path);

            for &edge_idx in self.graph.out_edges(frame.vertex) {
                let edge = self.graph.edge(edge_idx);
                if self.visited[..frame.visited_border].contains(&edge.to_vertex) {
                    continue;
                }
                let Some(handler) = self.graph.handler_by_name(&edge.handler) else {
                    continue;
                };
                let mut path = frame.path.clone();
                path.push(PathNode::new(Arc::clone(handler), edge.to.clone()));
                let categories = path_categories(&path);
                let next_cost = cost + edge.cost + adaptive_cost(self.graph.tables(), &categories);
                self.queue.push(
                    next_cost,
                    Frame {
                        vertex: edge.to_vertex,
                        path,
                        visited_border: self.visited.len(),
                    },
                );
            }
        }
        None
    }
}

/// Primary category of each node, MIME major part when none is declared.
pub fn path_categories(path: &[PathNode]) -> Vec<String> {
    path.iter()
        .map(|node| node.format.primary_category_or_mime_major().to_string())
        .collect()
}

fn contains_unsafe_sequence(path: &[PathNode]) -> bool {
    let categories = path_categories(path);
    categories
        .windows(UNSAFE_SEQUENCE.len())
        .any(|window| window.iter().map(String::as_str).eq(UNSAFE_SEQUENCE))
}
