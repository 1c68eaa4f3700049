//! Error types for the routing core.

use thiserror::Error;

use morphe_formats::{CacheError, RegistryError};

/// Errors from [`crate::core::ConversionCore`] construction and lifecycle.
///
/// Routing itself never errors (exhausted searches and failed attempts
/// surface as `None`), so everything here is configuration: a bad handler
/// set or a bad persisted cache.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The handler set is invalid.
    #[error("registry configuration error: {0}")]
    Registry(#[from] RegistryError),

    /// A persisted cache failed to load.
    #[error("cache persistence error: {0}")]
    Cache(#[from] CacheError),
}

/// Result alias for core lifecycle operations.
pub type CoreResult<T> = Result<T, CoreError>;
