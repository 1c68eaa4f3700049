//! The conversion handler contract.
//!
//! A handler is an opaque actor wrapping one conversion backend (an FFmpeg
//! build, a canvas encoder, a document processor). The core never looks
//! inside: it initializes the handler lazily, reads its declared format list,
//! and drives `convert` along routed paths. Handlers may be slow, may fail,
//! and may produce empty output; the executor recovers from all three.
//!
//! Handlers are shared as `Arc<dyn Handler>`: they are large and stateful,
//! and the registry, the graph, and in-flight paths all hold references.

use async_trait::async_trait;
use bytes::Bytes;

use crate::descriptor::FormatDescriptor;
use crate::error::HandlerResult;

/// A named file payload passed between conversion steps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileData {
    /// File name, carried through the pipeline for output labeling.
    pub name: String,
    /// Raw contents.
    pub bytes: Bytes,
}

impl FileData {
    /// New payload from anything byte-shaped.
    pub fn new(name: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }

    /// Whether the payload carries no bytes. Empty output from a conversion
    /// step is treated as failure.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Async capability trait for conversion actors.
///
/// Implementations must be safe to share across tasks; at most one
/// `convert` per handler is in flight at a time (callers serialize), but
/// read-side accessors may run concurrently with nothing guaranteed about
/// ordering against `init`.
#[async_trait]
pub trait Handler: Send + Sync {
    /// Globally unique, non-empty handler name.
    fn name(&self) -> &str;

    /// Declared format list. Populated after a successful `init()`; may be
    /// empty before.
    fn supported_formats(&self) -> Vec<FormatDescriptor>;

    /// Handlers with this flag act as fallbacks when no declared input MIME
    /// matches. The registry pre-computes them; the graph treats them like
    /// any other handler after build.
    fn supports_any_input(&self) -> bool {
        false
    }

    /// True once `init()` has succeeded.
    fn is_ready(&self) -> bool;

    /// Initialize the backend. Asynchronous, idempotent, safe to retry;
    /// failure is reported through the error.
    async fn init(&self) -> HandlerResult<()>;

    /// Convert `files` from `input` to `output`, both previously declared by
    /// this handler. Output bytes must be non-empty on success.
    async fn convert(
        &self,
        files: Vec<FileData>,
        input: &FormatDescriptor,
        output: &FormatDescriptor,
    ) -> HandlerResult<Vec<FileData>>;
}
