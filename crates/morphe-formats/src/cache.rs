//! Shared supported-format cache with JSON persistence.
//!
//! The cache maps handler name to its declared format list. It exists so the
//! expensive part of registry construction, initializing every handler just
//! to learn what it supports, happens once per handler and survives process
//! restarts through the serialized form external collaborators persist.
//!
//! Updates are monotonic: `fill` only adds missing entries, so concurrent
//! refreshes from the executor are idempotent and never clobber a
//! previously recorded declaration.

use std::collections::HashMap;

use parking_lot::RwLock;
use serde::Deserialize;

use crate::descriptor::FormatDescriptor;
use crate::error::CacheError;
use crate::mime;

/// The persisted cache shape: `(handlerName, formats)` pairs in handler
/// declaration order. Serializes as a JSON array of two-element arrays.
pub type CacheEntries = Vec<(String, Vec<FormatDescriptor>)>;

/// Accepted shapes on restore: the bare entry array, or the same array
/// wrapped in a `{ "cache": [...] }` object.
#[derive(Deserialize)]
#[serde(untagged)]
enum CacheShape {
    Entries(CacheEntries),
    Wrapped {
        cache: CacheEntries,
    },
}

/// Supported-format cache keyed by handler name.
#[derive(Debug, Default)]
pub struct FormatCache {
    entries: RwLock<HashMap<String, Vec<FormatDescriptor>>>,
}

impl FormatCache {
    /// New empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a handler already has a recorded format list.
    pub fn contains(&self, handler: &str) -> bool {
        self.entries.read().contains_key(handler)
    }

    /// The recorded format list for a handler, cloned out of the lock.
    pub fn get(&self, handler: &str) -> Option<Vec<FormatDescriptor>> {
        self.entries.read().get(handler).cloned()
    }

    /// Record a handler's declared formats unless already present.
    ///
    /// Every MIME is normalized on the way in; nothing past this point ever
    /// sees a non-canonical spelling. Returns whether the entry was added.
    pub fn fill(&self, handler: &str, formats: Vec<FormatDescriptor>) -> bool {
        let mut entries = self.entries.write();
        if entries.contains_key(handler) {
            return false;
        }
        entries.insert(handler.to_string(), normalize_all(formats));
        true
    }

    /// Number of handlers with recorded formats.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Whether no handler has been recorded yet.
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Drop every recorded entry.
    pub fn clear(&self) {
        self.entries.write().clear();
    }

    /// Entries in the given handler order, skipping handlers not yet
    /// recorded. This is the persistence shape.
    pub fn export(&self, order: &[String]) -> CacheEntries {
        let entries = self.entries.read();
        order
            .iter()
            .filter_map(|name| {
                entries
                    .get(name)
                    .map(|formats| (name.clone(), formats.clone()))
            })
            .collect()
    }

    /// Serialize the cache to the persisted JSON form.
    pub fn export_json(&self, order: &[String]) -> Result<String, CacheError> {
        Ok(serde_json::to_string(&self.export(order))?)
    }

    /// Restore entries from their serialized form. Accepts both the bare
    /// entry array and the `{ "cache": [...] }` wrapper; MIME strings are
    /// re-normalized. Existing entries win (restore fills gaps only).
    pub fn restore_json(&self, json: &str) -> Result<(), CacheError> {
        let shape: CacheShape = serde_json::from_str(json)?;
        let entries = match shape {
            CacheShape::Entries(entries) | CacheShape::Wrapped { cache: entries } => entries,
        };
        self.restore_entries(entries);
        Ok(())
    }

    /// Restore from already-deserialized entries.
    pub fn restore_entries(&self, entries: CacheEntries) {
        for (handler, formats) in entries {
            self.fill(&handler, formats);
        }
    }

    /// A point-in-time copy of the whole cache.
    pub fn snapshot(&self) -> HashMap<String, Vec<FormatDescriptor>> {
        self.entries.read().clone()
    }
}

fn normalize_all(formats: Vec<FormatDescriptor>) -> Vec<FormatDescriptor> {
    formats
        .into_iter()
        .map(|mut format| {
            let canonical = mime::normalize(&format.mime);
            if canonical != format.mime {
                format.mime = canonical.to_string();
            }
            format
        })
        .collect()
}
