//! MIME type normalization.
//!
//! Handlers declare formats with whatever MIME spelling their upstream
//! tooling happens to emit (`audio/x-wav`, `image/jpg`, legacy font types).
//! The graph keys vertices by MIME, so every declared and user-supplied MIME
//! is folded to one canonical spelling first; vertex lookup is then a plain
//! string-equality test.

/// Synonym table, sorted by raw spelling.
///
/// Canonical spellings never appear on the left-hand side, which makes
/// normalization idempotent by construction.
const SYNONYMS: &[(&str, &str)] = &[
    ("application/font-sfnt", "font/sfnt"),
    ("application/font-woff", "font/woff"),
    ("application/font-woff2", "font/woff2"),
    ("application/x-font-otf", "font/otf"),
    ("application/x-font-ttf", "font/ttf"),
    ("application/x-gzip", "application/gzip"),
    ("application/x-zip-compressed", "application/zip"),
    ("audio/m4a", "audio/mp4"),
    ("audio/mp3", "audio/mpeg"),
    ("audio/wave", "audio/wav"),
    ("audio/x-aiff", "audio/aiff"),
    ("audio/x-flac", "audio/flac"),
    ("audio/x-m4a", "audio/mp4"),
    ("audio/x-ogg", "audio/ogg"),
    ("audio/x-wav", "audio/wav"),
    ("image/jpg", "image/jpeg"),
    ("image/x-icon", "image/vnd.microsoft.icon"),
    ("image/x-ms-bmp", "image/bmp"),
    ("video/x-m4v", "video/mp4"),
];

/// Fold a MIME string to its canonical spelling.
///
/// Unknown inputs are returned unchanged. Idempotent.
pub fn normalize(mime: &str) -> &str {
    match SYNONYMS.binary_search_by(|(raw, _)| (*raw).cmp(mime)) {
        Ok(idx) => SYNONYMS[idx].1,
        Err(_) => mime,
    }
}
