//! Drives handler pipelines along candidate routes.
//!
//! The executor pulls candidate paths from the search in cost order and
//! attempts each one by walking the handler protocol step by step. A step
//! failure (init error, missing input format, conversion error, empty
//! output) abandons the current candidate and moves on to the next; the
//! overall conversion only fails once the generator is exhausted. Failures
//! are logged, never raised.

use std::sync::Arc;

use tracing::{debug, warn};

use morphe_formats::{FileData, FormatCache, FormatOption, Handler, normalize};

use crate::graph::ConversionGraph;
use crate::search::{PathNode, SearchTarget};

/// Successful multi-hop conversion: the output files and the route taken.
#[derive(Debug)]
pub struct ConversionResult {
    /// Output of the final conversion step.
    pub files: Vec<FileData>,
    /// The route that produced it, source node first.
    pub path: Vec<PathNode>,
}

/// Executor over a built graph and the shared format cache.
#[derive(Debug)]
pub struct ConversionExecutor<'a> {
    graph: &'a ConversionGraph,
    cache: &'a FormatCache,
    simple_mode: bool,
}

impl<'a> ConversionExecutor<'a> {
    /// New executor. Simple mode is off: yielded routes must terminate on
    /// the target's handler.
    pub fn new(graph: &'a ConversionGraph, cache: &'a FormatCache) -> Self {
        Self {
            graph,
            cache,
            simple_mode: false,
        }
    }

    /// Accept routes terminating on any handler that produces the target
    /// MIME.
    pub fn with_simple_mode(mut self, simple_mode: bool) -> Self {
        self.simple_mode = simple_mode;
        self
    }

    /// Attempt to convert `files` from `source` to `target`, trying
    /// candidate routes in cost order until one succeeds.
    ///
    /// Returns `None` when the candidate generator is exhausted without a
    /// success, or when source or target MIME is absent from the graph.
    pub async fn try_convert(
        &self,
        files: Vec<FileData>,
        source: &FormatOption,
        target: &FormatOption,
    ) -> Option<ConversionResult> {
        let source_node = PathNode::new(Arc::clone(&source.handler), source.format.clone());
        let search_target = SearchTarget::new(Arc::clone(&target.handler), target.format.clone());
        let search = self
            .graph
            .search_path(source_node, search_target, self.simple_mode);

        for candidate in search {
            let mut path = candidate.nodes;
            // When several declared formats share the target MIME, keep the
            // exact descriptor the caller picked.
            if let Some(last) = path.last_mut() {
                if last.handler.name() == target.handler.name() {
                    *last = PathNode::new(Arc::clone(&target.handler), target.format.clone());
                }
            }
            debug!(
                steps = path.len().saturating_sub(1),
                cost = candidate.cost,
                "attempting route"
            );
            if let Some(converted) = self.attempt_path(files.clone(), &path).await {
                return Some(ConversionResult {
                    files: converted,
                    path,
                });
            }
        }
        None
    }

    /// Run every step of one candidate route. Any failure returns `None`;
    /// the caller falls through to the next candidate.
    async fn attempt_path(
        &self,
        mut files: Vec<FileData>,
        path: &[PathNode],
    ) -> Option<Vec<FileData>> {
        for pair in path.windows(2) {
            let (prev, next) = (&pair[0], &pair[1]);

            if !next.handler.is_ready() {
                if let Err(err) = next.handler.init().await {
                    warn!(handler = next.handler.name(), %err, "handler init failed mid-route");
                    return None;
                }
            }
            let declared = next.handler.supported_formats();
            self.cache.fill(next.handler.name(), declared.clone());

            let source_mime = normalize(&prev.format.mime);
            let Some(input) = declared
                .iter()
                .find(|format| format.from && normalize(&format.mime) == source_mime)
            else {
                warn!(
                    handler = next.handler.name(),
                    mime = source_mime,
                    "route step has no matching input format"
                );
                return None;
            };

            // The barrier costs nothing for correctness but hands control
            // back to the host while the backend grinds.
            let (converted, ()) = tokio::join!(
                next.handler.convert(files, input, &next.format),
                yield_barrier()
            );
            match converted {
                Ok(output) => {
                    if output.is_empty() || output.iter().any(FileData::is_empty) {
                        warn!(
                            handler = next.handler.name(),
                            "conversion produced empty output"
                        );
                        return None;
                    }
                    files = output;
                }
                Err(err) => {
                    warn!(handler = next.handler.name(), %err, "conversion step failed");
                    return None;
                }
            }
        }
        Some(files)
    }
}

/// Two successive scheduling points, run concurrently with a conversion
/// step.
async fn yield_barrier() {
    tokio::task::yield_now().await;
    tokio::task::yield_now().await;
}
