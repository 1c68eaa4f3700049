//! Edge cost model and tunable cost tables.
//!
//! Every edge cost combines, in order: a base per-hop cost, a
//! category-change component, a handler-position penalty, a format-position
//! penalty, and finally a lossy multiplier over the accumulated sum. On top
//! of per-edge costs the search adds an adaptive component per path: entries
//! keyed by a category sequence that matches a suffix of the route, which is
//! how multi-hop semantic degradation (text rendered to pixels then
//! sonified) gets priced without any single edge being wrong.
//!
//! Table mutation never re-costs a built graph; callers rebuild.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use morphe_formats::FormatDescriptor;

/// Per-hop base cost; higher values prefer shorter paths.
pub const DEPTH_COST: f64 = 1.0;
/// Category-change cost used when no specific table entry applies.
pub const DEFAULT_CATEGORY_CHANGE_COST: f64 = 0.6;
/// Multiplier applied whenever the target format is lossy.
pub const LOSSY_COST_MULTIPLIER: f64 = 1.4;
/// Slope of the handler-position penalty.
pub const HANDLER_PRIORITY_COST: f64 = 0.2;
/// Slope of the format-position penalty inside a handler's list.
pub const FORMAT_PRIORITY_COST: f64 = 0.05;
/// Diagnostic print interval during search, in queue pops.
pub const LOG_FREQUENCY: u64 = 1000;

/// One category-change rule: the cost of crossing `from` into `to`,
/// optionally scoped to a single handler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryChangeEntry {
    /// Source category tag.
    pub from: String,
    /// Destination category tag.
    pub to: String,
    /// Restrict the rule to this handler; `None` applies to any handler
    /// without a specific rule of its own for the same pair.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub handler: Option<String>,
    /// Configured cost.
    pub cost: f64,
}

/// One adaptive rule: a category sequence and the cost added to every path
/// whose trailing categories match it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdaptiveCostEntry {
    /// The sequence to match against a path suffix.
    pub categories: Vec<String>,
    /// Cost added per match.
    pub cost: f64,
}

/// Category-change and adaptive cost tables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostTables {
    pub(crate) change: Vec<CategoryChangeEntry>,
    pub(crate) adaptive: Vec<AdaptiveCostEntry>,
}

impl Default for CostTables {
    /// The shipped configuration.
    fn default() -> Self {
        let change = [
            ("image", "video", None, 0.2),
            ("video", "image", None, 0.4),
            ("image", "audio", Some("ffmpeg"), 100.0),
            ("audio", "image", Some("ffmpeg"), 100.0),
            ("text", "audio", Some("ffmpeg"), 100.0),
            ("audio", "text", Some("ffmpeg"), 100.0),
            ("image", "audio", None, 1.4),
            ("audio", "image", None, 1.0),
            ("video", "audio", None, 1.4),
            ("audio", "video", None, 1.0),
            ("text", "image", None, 0.5),
            ("image", "text", None, 0.5),
            ("text", "audio", None, 0.6),
        ]
        .into_iter()
        .map(|(from, to, handler, cost)| CategoryChangeEntry {
            from: from.to_string(),
            to: to.to_string(),
            handler: handler.map(ToString::to_string),
            cost,
        })
        .collect();

        let adaptive = vec![
            AdaptiveCostEntry {
                categories: tags(&["text", "image", "audio"]),
                cost: 15.0,
            },
            AdaptiveCostEntry {
                categories: tags(&["image", "video", "audio"]),
                cost: 10_000.0,
            },
            AdaptiveCostEntry {
                categories: tags(&["audio", "video", "image"]),
                cost: 10_000.0,
            },
        ];

        Self { change, adaptive }
    }
}

fn tags(tags: &[&str]) -> Vec<String> {
    tags.iter().map(ToString::to_string).collect()
}

impl CostTables {
    /// Tables with no entries at all.
    pub fn empty() -> Self {
        Self {
            change: Vec::new(),
            adaptive: Vec::new(),
        }
    }

    /// Upsert a category-change rule keyed by `(from, to, handler)`.
    pub fn add_change(&mut self, from: &str, to: &str, handler: Option<&str>, cost: f64) {
        if let Some(entry) = self.find_change_mut(from, to, handler) {
            entry.cost = cost;
            return;
        }
        self.change.push(CategoryChangeEntry {
            from: from.to_string(),
            to: to.to_string(),
            handler: handler.map(ToString::to_string),
            cost,
        });
    }

    /// Update an existing rule; returns whether one matched.
    pub fn update_change(&mut self, from: &str, to: &str, handler: Option<&str>, cost: f64) -> bool {
        match self.find_change_mut(from, to, handler) {
            Some(entry) => {
                entry.cost = cost;
                true
            }
            None => false,
        }
    }

    /// Remove a rule; returns whether one matched.
    pub fn remove_change(&mut self, from: &str, to: &str, handler: Option<&str>) -> bool {
        let before = self.change.len();
        self.change
            .retain(|e| !(e.from == from && e.to == to && e.handler.as_deref() == handler));
        self.change.len() != before
    }

    /// Whether a rule exists for the exact key.
    pub fn has_change(&self, from: &str, to: &str, handler: Option<&str>) -> bool {
        self.change
            .iter()
            .any(|e| e.from == from && e.to == to && e.handler.as_deref() == handler)
    }

    fn find_change_mut(
        &mut self,
        from: &str,
        to: &str,
        handler: Option<&str>,
    ) -> Option<&mut CategoryChangeEntry> {
        self.change
            .iter_mut()
            .find(|e| e.from == from && e.to == to && e.handler.as_deref() == handler)
    }

    /// Upsert an adaptive rule keyed by the full category sequence.
    pub fn add_adaptive(&mut self, categories: &[&str], cost: f64) {
        let key = tags(categories);
        if let Some(entry) = self.adaptive.iter_mut().find(|e| e.categories == key) {
            entry.cost = cost;
            return;
        }
        self.adaptive.push(AdaptiveCostEntry {
            categories: key,
            cost,
        });
    }

    /// Update an existing adaptive rule; returns whether one matched.
    pub fn update_adaptive(&mut self, categories: &[&str], cost: f64) -> bool {
        let key = tags(categories);
        match self.adaptive.iter_mut().find(|e| e.categories == key) {
            Some(entry) => {
                entry.cost = cost;
                true
            }
            None => false,
        }
    }

    /// Remove an adaptive rule; returns whether one matched.
    pub fn remove_adaptive(&mut self, categories: &[&str]) -> bool {
        let key = tags(categories);
        let before = self.adaptive.len();
        self.adaptive.retain(|e| e.categories != key);
        self.adaptive.len() != before
    }

    /// Whether an adaptive rule exists for the exact sequence.
    pub fn has_adaptive(&self, categories: &[&str]) -> bool {
        let key = tags(categories);
        self.adaptive.iter().any(|e| e.categories == key)
    }

    /// The category-change rules, in table order.
    pub fn change_entries(&self) -> &[CategoryChangeEntry] {
        &self.change
    }

    /// The adaptive rules, in table order.
    pub fn adaptive_entries(&self) -> &[AdaptiveCostEntry] {
        &self.adaptive
    }

    /// `(from, to) -> handler` over the handler-specific rules, last wins.
    ///
    /// Used to suppress generic rules for handlers that have a specific rule
    /// of their own on the same pair.
    pub(crate) fn handler_pairs(&self) -> HashMap<(String, String), String> {
        let mut pairs = HashMap::new();
        for entry in &self.change {
            if let Some(handler) = &entry.handler {
                pairs.insert((entry.from.clone(), entry.to.clone()), handler.clone());
            }
        }
        pairs
    }
}

/// Inputs shared by every edge-cost computation in one graph build.
pub(crate) struct EdgeCostContext<'a> {
    pub tables: &'a CostTables,
    pub handler_pairs: &'a HashMap<(String, String), String>,
    pub strict_categories: bool,
}

/// Cost of the edge `from -> to` declared by `handler_name`.
///
/// `handler_idx` is the handler's position in the configured handler list;
/// `format_pos` is the target format's position in the handler's own
/// declared list (0 when not found).
pub(crate) fn edge_cost(
    from: &FormatDescriptor,
    to: &FormatDescriptor,
    handler_name: &str,
    handler_idx: usize,
    format_pos: usize,
    ctx: &EdgeCostContext<'_>,
) -> f64 {
    let mut cost = DEPTH_COST;
    cost += category_change_component(from, to, handler_name, ctx);
    cost += HANDLER_PRIORITY_COST * handler_idx as f64;
    cost += FORMAT_PRIORITY_COST * format_pos as f64;
    if !to.lossless {
        cost *= LOSSY_COST_MULTIPLIER;
    }
    cost
}

fn category_change_component(
    from: &FormatDescriptor,
    to: &FormatDescriptor,
    handler_name: &str,
    ctx: &EdgeCostContext<'_>,
) -> f64 {
    let from_cats = from.categories();
    let to_cats = to.categories();

    match (from_cats.is_empty(), to_cats.is_empty()) {
        (true, true) => return 0.0,
        (true, false) | (false, true) => return DEFAULT_CATEGORY_CHANGE_COST,
        (false, false) => {}
    }

    if ctx.strict_categories {
        // Every entry contributes: its configured cost when it applies, the
        // default otherwise. Over-penalizes shifts, yields literal paths.
        return ctx
            .tables
            .change
            .iter()
            .map(|entry| {
                let applies = from_cats.contains(&entry.from)
                    && to_cats.contains(&entry.to)
                    && entry.handler.as_deref().is_none_or(|h| h == handler_name);
                if applies {
                    entry.cost
                } else {
                    DEFAULT_CATEGORY_CHANGE_COST
                }
            })
            .sum();
    }

    // Lenient mode: shared category means no crossing at all.
    if from_cats.iter().any(|cat| to_cats.contains(cat)) {
        return 0.0;
    }

    let mut best: Option<f64> = None;
    for entry in &ctx.tables.change {
        if !from_cats.contains(&entry.from) || !to_cats.contains(&entry.to) {
            continue;
        }
        let applicable = match entry.handler.as_deref() {
            Some(handler) => handler == handler_name,
            // A generic entry is suppressed for handlers that have a
            // specific entry of their own on the same pair.
            None => ctx
                .handler_pairs
                .get(&(entry.from.clone(), entry.to.clone()))
                .map(String::as_str)
                != Some(handler_name),
        };
        if applicable {
            best = Some(best.map_or(entry.cost, |b| b.min(entry.cost)));
        }
    }
    best.unwrap_or(DEFAULT_CATEGORY_CHANGE_COST)
}

/// Total adaptive cost of a path given its category sequence.
pub(crate) fn adaptive_cost(tables: &CostTables, path_categories: &[String]) -> f64 {
    tables
        .adaptive
        .iter()
        .filter(|entry| matches_suffix(&entry.categories, path_categories))
        .map(|entry| entry.cost)
        .sum()
}

/// Whether `pattern` matches a suffix of `categories`, scanning from the
/// end and skipping interior repeats of the just-matched category (so
/// `[text, image, audio]` matches `text, image, image, audio`).
fn matches_suffix(pattern: &[String], categories: &[String]) -> bool {
    if pattern.is_empty() {
        return false;
    }
    // Number of pattern entries still to match; the current target is
    // `pattern[remaining - 1]`.
    let mut remaining = pattern.len();
    for token in categories.iter().rev() {
        if remaining > 0 && token == &pattern[remaining - 1] {
            remaining -= 1;
            if remaining == 0 {
                return true;
            }
        } else if remaining < pattern.len() && token == &pattern[remaining] {
            // Interior repeat of the category just matched.
        } else {
            return false;
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use morphe_formats::category;
    use pretty_assertions::assert_eq;

    fn fmt(mime: &str, cats: &[&str], lossless: bool) -> FormatDescriptor {
        let mut desc = FormatDescriptor::new("Test", "t", "t", mime)
            .with_direction(true, true)
            .with_lossless(lossless);
        if cats.len() == 1 {
            desc = desc.with_category(cats[0]);
        } else if !cats.is_empty() {
            desc = desc.with_categories(cats);
        }
        desc
    }

    fn ctx<'a>(
        tables: &'a CostTables,
        pairs: &'a HashMap<(String, String), String>,
        strict: bool,
    ) -> EdgeCostContext<'a> {
        EdgeCostContext {
            tables,
            handler_pairs: pairs,
            strict_categories: strict,
        }
    }

    #[test]
    fn same_category_edge_costs_base_only() {
        let tables = CostTables::default();
        let pairs = tables.handler_pairs();
        let png = fmt("image/png", &["image"], true);
        let jpeg = fmt("image/jpeg", &["image"], true);
        let cost = edge_cost(&png, &jpeg, "canvasToBlob", 0, 0, &ctx(&tables, &pairs, false));
        assert_eq!(cost, DEPTH_COST);
    }

    #[test]
    fn lossy_multiplier_applies_after_all_additions() {
        let tables = CostTables::default();
        let pairs = tables.handler_pairs();
        let png = fmt("image/png", &["image"], true);
        let jpeg = fmt("image/jpeg", &["image"], false);
        let cost = edge_cost(&png, &jpeg, "canvasToBlob", 2, 3, &ctx(&tables, &pairs, false));
        let expected = (DEPTH_COST + HANDLER_PRIORITY_COST * 2.0 + FORMAT_PRIORITY_COST * 3.0)
            * LOSSY_COST_MULTIPLIER;
        assert!((cost - expected).abs() < 1e-12);
    }

    #[test]
    fn handler_specific_entry_overrides_generic_for_that_handler() {
        let tables = CostTables::default();
        let pairs = tables.handler_pairs();
        let png = fmt("image/png", &["image"], true);
        let wav = fmt("audio/wav", &["audio"], true);

        // ffmpeg has a specific image->audio rule at 100.
        let ffmpeg = edge_cost(&png, &wav, "ffmpeg", 0, 0, &ctx(&tables, &pairs, false));
        assert_eq!(ffmpeg, DEPTH_COST + 100.0);

        // Other handlers fall back to the generic 1.4 entry.
        let other = edge_cost(&png, &wav, "meyda", 0, 0, &ctx(&tables, &pairs, false));
        assert_eq!(other, DEPTH_COST + 1.4);
    }

    #[test]
    fn multi_category_intersection_zeroes_the_component() {
        let tables = CostTables::default();
        let pairs = tables.handler_pairs();
        let png = fmt("image/png", &["image"], true);
        let gif = fmt("image/gif", &["image", "video"], true);
        let cost = edge_cost(&png, &gif, "ffmpeg", 0, 0, &ctx(&tables, &pairs, false));
        assert_eq!(cost, DEPTH_COST);
    }

    #[test]
    fn multi_category_takes_cheapest_applicable_crossing() {
        let tables = CostTables::default();
        let pairs = tables.handler_pairs();
        // gif declares [image, video]; crossing into audio can price as
        // image->audio (ffmpeg-specific 100) or video->audio (generic 1.4).
        let gif = fmt("image/gif", &["image", "video"], true);
        let mp3 = fmt("audio/mpeg", &["audio"], true);
        let cost = edge_cost(&gif, &mp3, "ffmpeg", 0, 0, &ctx(&tables, &pairs, false));
        assert_eq!(cost, DEPTH_COST + 1.4);
    }

    #[test]
    fn missing_categories_use_the_default_when_one_side_declares() {
        let tables = CostTables::default();
        let pairs = tables.handler_pairs();
        let bare = fmt("application/octet-stream", &[], true);
        let png = fmt("image/png", &["image"], true);

        let one_sided = edge_cost(&bare, &png, "x", 0, 0, &ctx(&tables, &pairs, false));
        assert_eq!(one_sided, DEPTH_COST + DEFAULT_CATEGORY_CHANGE_COST);

        let both_bare = edge_cost(&bare, &bare, "x", 0, 0, &ctx(&tables, &pairs, false));
        assert_eq!(both_bare, DEPTH_COST);
    }

    #[test]
    fn unlisted_crossing_uses_the_default() {
        let tables = CostTables::default();
        let pairs = tables.handler_pairs();
        let doc = fmt("application/pdf", &["document"], true);
        let sheet = fmt(
            "application/vnd.ms-excel",
            &[category::SPREADSHEET],
            true,
        );
        let cost = edge_cost(&doc, &sheet, "pandoc", 0, 0, &ctx(&tables, &pairs, false));
        assert_eq!(cost, DEPTH_COST + DEFAULT_CATEGORY_CHANGE_COST);
    }

    #[test]
    fn strict_mode_sums_over_the_whole_table() {
        let mut tables = CostTables::empty();
        tables.add_change("image", "video", None, 0.2);
        tables.add_change("audio", "text", None, 0.9);
        let pairs = tables.handler_pairs();
        let png = fmt("image/png", &["image"], true);
        let mp4 = fmt("video/mp4", &["video"], false);
        // Matching entry contributes 0.2; the unrelated entry contributes
        // the default.
        let cost = edge_cost(&png, &mp4, "ffmpeg", 0, 0, &ctx(&tables, &pairs, true));
        assert!((cost - (DEPTH_COST + 0.2 + DEFAULT_CATEGORY_CHANGE_COST) * LOSSY_COST_MULTIPLIER).abs() < 1e-12);
    }

    #[test]
    fn add_change_upserts_by_key() {
        let mut tables = CostTables::default();
        assert!(tables.has_change("image", "audio", None));
        let before = tables.change_entries().len();
        tables.add_change("image", "audio", None, 100.0);
        assert_eq!(tables.change_entries().len(), before);
        let entry = tables
            .change_entries()
            .iter()
            .find(|e| e.from == "image" && e.to == "audio" && e.handler.is_none())
            .expect("entry present");
        assert_eq!(entry.cost, 100.0);

        // The ffmpeg-scoped entry is a distinct key.
        assert!(tables.has_change("image", "audio", Some("ffmpeg")));
    }

    #[test]
    fn change_ops_round_trip() {
        let mut tables = CostTables::empty();
        assert!(!tables.update_change("a", "b", None, 2.0));
        tables.add_change("a", "b", None, 2.0);
        assert!(tables.has_change("a", "b", None));
        assert!(tables.update_change("a", "b", None, 3.0));
        assert!(tables.remove_change("a", "b", None));
        assert!(!tables.has_change("a", "b", None));
        assert!(!tables.remove_change("a", "b", None));
    }

    #[test]
    fn adaptive_ops_round_trip() {
        let mut tables = CostTables::default();
        assert!(tables.has_adaptive(&["image", "video", "audio"]));
        tables.add_adaptive(&["image", "audio"], 20_000.0);
        assert!(tables.has_adaptive(&["image", "audio"]));
        assert!(tables.update_adaptive(&["image", "audio"], 5.0));
        assert!(tables.remove_adaptive(&["image", "audio"]));
        assert!(!tables.has_adaptive(&["image", "audio"]));
        // Defaults untouched.
        assert!(tables.has_adaptive(&["text", "image", "audio"]));
    }

    fn seq(tags_: &[&str]) -> Vec<String> {
        tags(tags_)
    }

    #[test]
    fn suffix_match_basics() {
        let pattern = seq(&["text", "image", "audio"]);
        assert!(matches_suffix(&pattern, &seq(&["text", "image", "audio"])));
        assert!(matches_suffix(&pattern, &seq(&["video", "text", "image", "audio"])));
        assert!(!matches_suffix(&pattern, &seq(&["image", "audio"])));
        assert!(!matches_suffix(&pattern, &seq(&["text", "image", "audio", "video"])));
    }

    #[test]
    fn suffix_match_allows_interior_repeats() {
        let pattern = seq(&["text", "image", "audio"]);
        assert!(matches_suffix(&pattern, &seq(&["text", "image", "image", "audio"])));
        assert!(matches_suffix(&pattern, &seq(&["text", "text", "image", "audio", "audio"])));
        assert!(!matches_suffix(&pattern, &seq(&["text", "video", "image", "audio"])));
    }

    #[test]
    fn adaptive_cost_sums_matching_entries() {
        let tables = CostTables::default();
        let cats = seq(&["text", "image", "audio"]);
        assert_eq!(adaptive_cost(&tables, &cats), 15.0);

        let cats = seq(&["image", "video", "audio"]);
        assert_eq!(adaptive_cost(&tables, &cats), 10_000.0);

        let cats = seq(&["image", "image"]);
        assert_eq!(adaptive_cost(&tables, &cats), 0.0);
    }
}
