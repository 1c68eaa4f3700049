//! Handler registry: option enumeration and format lookup.
//!
//! The registry owns the handler list and the supported-format cache. Its
//! `init` protocol initializes every handler the cache does not already
//! cover, records what each declared, and flattens the result into a dense
//! option list for lookup and UI binding. A handler whose initializer fails
//! is skipped for the remainder of the build; everything downstream must
//! tolerate its absence.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::cache::{CacheEntries, FormatCache};
use crate::descriptor::FormatDescriptor;
use crate::error::{CacheError, RegistryError, RegistryResult};
use crate::handler::Handler;
use crate::mime;

/// One selectable `(handler, format)` pair.
///
/// The dense `index` identifies the option in the flat list used for UI
/// binding; it carries no routing meaning.
#[derive(Clone)]
pub struct FormatOption {
    /// The declaring handler.
    pub handler: Arc<dyn Handler>,
    /// The declared format.
    pub format: FormatDescriptor,
    /// Position in the flat option list.
    pub index: usize,
}

impl FormatOption {
    /// Display label for pickers: format name plus the handler that backs it.
    pub fn label(&self) -> String {
        format!("{} ({})", self.format.name, self.handler.name())
    }
}

impl fmt::Debug for FormatOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FormatOption")
            .field("handler", &self.handler.name())
            .field("format", &self.format.format)
            .field("mime", &self.format.mime)
            .field("index", &self.index)
            .finish()
    }
}

/// Registry over a fixed handler list and a shared format cache.
pub struct FormatRegistry {
    handlers: Vec<Arc<dyn Handler>>,
    handler_names: Vec<String>,
    cache: Arc<FormatCache>,
    options: Vec<FormatOption>,
    any_input: Vec<Arc<dyn Handler>>,
}

impl fmt::Debug for FormatRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FormatRegistry")
            .field("handlers", &self.handler_names)
            .field("options", &self.options.len())
            .finish()
    }
}

impl FormatRegistry {
    /// New registry with an empty cache.
    ///
    /// Duplicate or empty handler names are fatal configuration errors.
    pub fn new(handlers: Vec<Arc<dyn Handler>>) -> RegistryResult<Self> {
        Self::with_cache(handlers, Arc::new(FormatCache::new()))
    }

    /// New registry over an existing (possibly pre-populated) cache.
    pub fn with_cache(
        handlers: Vec<Arc<dyn Handler>>,
        cache: Arc<FormatCache>,
    ) -> RegistryResult<Self> {
        let mut handler_names = Vec::with_capacity(handlers.len());
        for (idx, handler) in handlers.iter().enumerate() {
            let name = handler.name();
            if name.is_empty() {
                return Err(RegistryError::EmptyHandlerName(idx));
            }
            if handler_names.iter().any(|existing| existing == name) {
                return Err(RegistryError::DuplicateHandler(name.to_string()));
            }
            handler_names.push(name.to_string());
        }
        Ok(Self {
            handlers,
            handler_names,
            cache,
            options: Vec::new(),
            any_input: Vec::new(),
        })
    }

    /// Run the init protocol: initialize handlers the cache does not cover,
    /// record their declarations, then rebuild the option list.
    ///
    /// Safe to call repeatedly; a handler that failed before is retried on
    /// the next `init` since nothing was recorded for it.
    pub async fn init(&mut self) {
        for handler in &self.handlers {
            if self.cache.contains(handler.name()) {
                continue;
            }
            match handler.init().await {
                Ok(()) => {
                    self.cache.fill(handler.name(), handler.supported_formats());
                }
                Err(err) => {
                    warn!(handler = handler.name(), %err, "handler init failed, skipping");
                }
            }
        }
        self.rebuild_options();
        debug!(
            handlers = self.handlers.len(),
            cached = self.cache.len(),
            options = self.options.len(),
            "format registry initialized"
        );
    }

    fn rebuild_options(&mut self) {
        self.options.clear();
        for handler in &self.handlers {
            let Some(formats) = self.cache.get(handler.name()) else {
                continue;
            };
            for format in formats {
                if format.mime.is_empty() {
                    continue;
                }
                let index = self.options.len();
                self.options.push(FormatOption {
                    handler: Arc::clone(handler),
                    format,
                    index,
                });
            }
        }
        self.any_input = self
            .handlers
            .iter()
            .filter(|handler| handler.supports_any_input())
            .cloned()
            .collect();
    }

    /// The flat option list in declaration order.
    pub fn options(&self) -> &[FormatOption] {
        &self.options
    }

    /// First readable option whose extension matches, case-insensitively.
    pub fn by_extension(&self, extension: &str) -> Option<&FormatOption> {
        self.options.iter().find(|option| {
            option.format.from && option.format.extension.eq_ignore_ascii_case(extension)
        })
    }

    /// First readable option whose MIME matches after normalization.
    pub fn by_mime(&self, raw_mime: &str) -> Option<&FormatOption> {
        let canonical = mime::normalize(raw_mime);
        self.options
            .iter()
            .find(|option| option.format.from && option.format.mime == canonical)
    }

    /// The configured handler list.
    pub fn handlers(&self) -> &[Arc<dyn Handler>] {
        &self.handlers
    }

    /// Look a handler up by name.
    pub fn handler_by_name(&self, name: &str) -> Option<&Arc<dyn Handler>> {
        self.handlers.iter().find(|handler| handler.name() == name)
    }

    /// Handlers flagged as accepting arbitrary input, pre-computed as
    /// fallback candidates.
    pub fn any_input_handlers(&self) -> &[Arc<dyn Handler>] {
        &self.any_input
    }

    /// The shared format cache.
    pub fn cache(&self) -> &Arc<FormatCache> {
        &self.cache
    }

    /// Cache entries in handler declaration order, for persistence.
    pub fn export_cache(&self) -> CacheEntries {
        self.cache.export(&self.handler_names)
    }

    /// Serialized cache, for persistence.
    pub fn export_cache_json(&self) -> Result<String, CacheError> {
        self.cache.export_json(&self.handler_names)
    }

    /// Restore the cache from its serialized form and rebuild the option
    /// list without re-initializing handlers.
    pub fn restore_cache_json(&mut self, json: &str) -> Result<(), CacheError> {
        self.cache.restore_json(json)?;
        self.rebuild_options();
        Ok(())
    }
}
