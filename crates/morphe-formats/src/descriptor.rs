//! Format descriptors as declared by conversion handlers.
//!
//! A descriptor is handler-scoped: two handlers may declare the same MIME
//! type with different capabilities (one reads it, one writes it, one has a
//! lossless variant). Descriptors are created once per handler `init()` and
//! are immutable afterwards.

use serde::{Deserialize, Serialize};

/// Recommended category tags.
///
/// Categories are open-ended strings; cost-table lookups are exact-match on
/// tag equality, so arbitrary tags work. These constants cover the vocabulary
/// the shipped cost tables use.
pub mod category {
    /// Raster images.
    pub const IMAGE: &str = "image";
    /// Video containers and streams.
    pub const VIDEO: &str = "video";
    /// Audio containers and streams.
    pub const AUDIO: &str = "audio";
    /// Plain and marked-up text.
    pub const TEXT: &str = "text";
    /// Paginated documents.
    pub const DOCUMENT: &str = "document";
    /// Vector graphics.
    pub const VECTOR: &str = "vector";
    /// Structured data interchange.
    pub const DATA: &str = "data";
    /// Archives and compressed containers.
    pub const ARCHIVE: &str = "archive";
    /// Spreadsheets.
    pub const SPREADSHEET: &str = "spreadsheet";
    /// Slide decks.
    pub const PRESENTATION: &str = "presentation";
    /// Database dumps and containers.
    pub const DATABASE: &str = "database";
}

/// Category declaration on a format: a single tag or an ordered list.
///
/// The first tag of a list is the primary category. Serialized untagged, so
/// the persisted shape is either a bare string or an array of strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CategorySpec {
    /// A single category tag.
    Single(String),
    /// An ordered list of tags; the first is primary.
    Multiple(Vec<String>),
}

impl CategorySpec {
    /// All declared tags, singletons promoted to a one-element slice.
    pub fn tags(&self) -> &[String] {
        match self {
            Self::Single(tag) => std::slice::from_ref(tag),
            Self::Multiple(tags) => tags,
        }
    }

    /// The primary (first) tag, if any were declared.
    pub fn primary(&self) -> Option<&str> {
        self.tags().first().map(String::as_str)
    }
}

impl From<&str> for CategorySpec {
    fn from(tag: &str) -> Self {
        Self::Single(tag.to_string())
    }
}

impl From<Vec<String>> for CategorySpec {
    fn from(tags: Vec<String>) -> Self {
        Self::Multiple(tags)
    }
}

/// One file format as seen by one handler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormatDescriptor {
    /// Long human-readable description, e.g. `"Portable Network Graphics"`.
    pub name: String,
    /// Short canonical tag, e.g. `"png"`. Not globally unique.
    pub format: String,
    /// Filename extension without the dot.
    pub extension: String,
    /// MIME string. Normalized before the descriptor enters the graph.
    pub mime: String,
    /// Handler-private discriminator for handlers exposing multiple logical
    /// formats under one MIME (e.g. PNG vs APNG).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub internal: Option<String>,
    /// Whether the declaring handler accepts this format as input.
    #[serde(default)]
    pub from: bool,
    /// Whether the declaring handler produces this format as output.
    #[serde(default)]
    pub to: bool,
    /// Whether conversion into this format preserves all information.
    #[serde(default)]
    pub lossless: bool,
    /// Category tag(s); the first is primary.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<CategorySpec>,
}

impl FormatDescriptor {
    /// New descriptor with all capability flags off.
    pub fn new(
        name: impl Into<String>,
        format: impl Into<String>,
        extension: impl Into<String>,
        mime: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            format: format.into(),
            extension: extension.into(),
            mime: mime.into(),
            internal: None,
            from: false,
            to: false,
            lossless: false,
            category: None,
        }
    }

    /// Set the input/output capability flags.
    pub fn with_direction(mut self, from: bool, to: bool) -> Self {
        self.from = from;
        self.to = to;
        self
    }

    /// Mark the format as lossless.
    pub fn with_lossless(mut self, lossless: bool) -> Self {
        self.lossless = lossless;
        self
    }

    /// Declare a single category tag.
    pub fn with_category(mut self, tag: &str) -> Self {
        self.category = Some(CategorySpec::from(tag));
        self
    }

    /// Declare an ordered category list; the first tag is primary.
    pub fn with_categories(mut self, tags: &[&str]) -> Self {
        self.category = Some(CategorySpec::Multiple(
            tags.iter().map(ToString::to_string).collect(),
        ));
        self
    }

    /// Attach the handler-private discriminator.
    pub fn with_internal(mut self, internal: &str) -> Self {
        self.internal = Some(internal.to_string());
        self
    }

    /// Declared category tags; empty slice when none were declared.
    pub fn categories(&self) -> &[String] {
        self.category.as_ref().map_or(&[], CategorySpec::tags)
    }

    /// The primary category tag, if declared.
    pub fn primary_category(&self) -> Option<&str> {
        self.category.as_ref().and_then(CategorySpec::primary)
    }

    /// Primary category, falling back to the major part of the MIME type
    /// when no category was declared.
    pub fn primary_category_or_mime_major(&self) -> &str {
        self.primary_category()
            .unwrap_or_else(|| self.mime.split('/').next().unwrap_or_default())
    }
}
