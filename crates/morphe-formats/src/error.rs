//! Error types for the handler protocol and the format registry.
//!
//! All errors use thiserror for consistent error handling across the
//! workspace.

use thiserror::Error;

/// Errors reported by conversion handlers.
///
/// Handler failures are recoverable from the core's point of view: a failed
/// `init()` excludes the handler from the registry build, a failed `convert()`
/// aborts the current path attempt. Neither stops routing.
#[derive(Debug, Error)]
pub enum HandlerError {
    /// Initialization failed (module load, resource fetch, probe).
    #[error("handler initialization failed: {0}")]
    Init(String),

    /// A conversion step failed inside the handler.
    #[error("conversion failed: {0}")]
    Conversion(String),

    /// The handler was asked for a format pair it never declared.
    #[error("unsupported conversion from {from} to {to}")]
    Unsupported {
        /// Requested input MIME.
        from: String,
        /// Requested output MIME.
        to: String,
    },

    /// I/O error inside the handler.
    #[error("handler I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors from cache persistence.
#[derive(Debug, Error)]
pub enum CacheError {
    /// The serialized cache is not valid JSON.
    #[error("invalid cache JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    /// The JSON parsed but matched neither accepted shape.
    #[error("unrecognized cache shape: expected an entry array or {{\"cache\": [...]}}")]
    UnrecognizedShape,
}

/// Fatal registry configuration errors.
///
/// Unlike handler failures these abort the registry build: a handler set
/// with colliding names cannot be routed over.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// Two handlers declared the same name.
    #[error("duplicate handler name: {0}")]
    DuplicateHandler(String),

    /// A handler declared an empty name.
    #[error("handler with empty name at position {0}")]
    EmptyHandlerName(usize),

    /// Cache restore failed.
    #[error("cache restore failed: {0}")]
    Cache(#[from] CacheError),
}

/// Result alias for handler operations.
pub type HandlerResult<T> = Result<T, HandlerError>;

/// Result alias for registry operations.
pub type RegistryResult<T> = Result<T, RegistryError>;
