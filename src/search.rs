//! Search/filter overlay: a temporary alternate listing computed from a
//! candidate set, displayed in place of the navigation-derived listing
//! without ever mutating it.
//!
//! Fuzzy matching sits behind the small [`FuzzyEngine`] trait so the overlay
//! logic does not depend on a specific matching algorithm. The default
//! engine ranks by skim-style subsequence score (file name weighted over
//! tags) and falls back to a bounded edit-distance window for minor
//! misspellings. When no engine is installed at all, search degrades to
//! case-insensitive substring matching on the file name.

use chrono::{DateTime, Utc};
use fuzzy_matcher::skim::SkimMatcherV2;
use fuzzy_matcher::FuzzyMatcher;

use crate::config::SearchConfig;
use crate::entry::{available_extensions, FileEntry, FileFilters, FileKind, FolderRef};

const MAX_SUGGESTIONS: usize = 5;
const MAX_RECENT_SEARCHES: usize = 5;

/// One candidate handed to the engine: a display name plus its tags.
#[derive(Debug, Clone)]
pub struct SearchDoc {
    pub name: String,
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankedMatch {
    pub index: usize,
    pub score: i64,
}

/// Swappable matching capability: rank the candidates for a query, best
/// first. An empty result means nothing matched.
pub trait FuzzyEngine: Send + Sync {
    fn rank(&self, query: &str, docs: &[SearchDoc]) -> Vec<RankedMatch>;
}

/// Default engine: skim subsequence scoring with a Levenshtein-window rescue
/// pass for candidates the subsequence matcher rejects outright.
pub struct SkimEngine {
    matcher: SkimMatcherV2,
    name_weight: i64,
    tag_weight: i64,
    min_query_len: usize,
    typo_budget: usize,
}

impl SkimEngine {
    pub fn new() -> Self {
        Self::from_config(&SearchConfig::default())
    }

    pub fn from_config(config: &SearchConfig) -> Self {
        Self {
            matcher: SkimMatcherV2::default(),
            name_weight: config.name_weight,
            tag_weight: config.tag_weight,
            min_query_len: config.min_query_len,
            typo_budget: config.typo_budget,
        }
    }

    /// Edit distance allowed for a query of this length, capped by the
    /// configured budget. Short queries get one edit, longer ones up to two.
    fn max_distance(&self, query_len: usize) -> usize {
        (query_len / 3).clamp(1, self.typo_budget)
    }
}

impl Default for SkimEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl FuzzyEngine for SkimEngine {
    fn rank(&self, query: &str, docs: &[SearchDoc]) -> Vec<RankedMatch> {
        let query = query.trim();
        if query.chars().count() < self.min_query_len {
            return Vec::new();
        }

        let mut matches = Vec::new();
        for (index, doc) in docs.iter().enumerate() {
            let name_score = self
                .matcher
                .fuzzy_match(&doc.name, query)
                .map(|score| score * self.name_weight);
            let tag_score = doc
                .tags
                .iter()
                .filter_map(|tag| self.matcher.fuzzy_match(tag, query))
                .max()
                .map(|score| score * self.tag_weight);

            let mut best = match (name_score, tag_score) {
                (Some(a), Some(b)) => Some(a.max(b)),
                (a, b) => a.or(b),
            };

            if best.is_none() {
                // Subsequence match failed; tolerate transposed or mistyped
                // characters within the distance budget.
                let query_len = query.chars().count();
                if let Some(distance) =
                    typo_window_distance(query, &doc.name, self.max_distance(query_len))
                {
                    best = Some(self.name_weight * (query_len as i64 - distance as i64));
                }
            }

            if let Some(score) = best {
                matches.push(RankedMatch { index, score });
            }
        }

        matches.sort_by(|a, b| b.score.cmp(&a.score).then(a.index.cmp(&b.index)));
        matches
    }
}

/// Plain Levenshtein edit distance, two-row formulation.
fn levenshtein_distance(a: &str, b: &str) -> usize {
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();
    if a_chars.is_empty() {
        return b_chars.len();
    }
    if b_chars.is_empty() {
        return a_chars.len();
    }

    let mut prev: Vec<usize> = (0..=b_chars.len()).collect();
    let mut curr = vec![0; b_chars.len() + 1];

    for i in 1..=a_chars.len() {
        curr[0] = i;
        for j in 1..=b_chars.len() {
            let cost = if a_chars[i - 1] == b_chars[j - 1] { 0 } else { 1 };
            curr[j] = (prev[j] + 1).min(curr[j - 1] + 1).min(prev[j - 1] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b_chars.len()]
}

/// Best edit distance of `query` against any window of `text` whose length
/// is within `max_distance` of the query length. Case-insensitive. `None`
/// when no window comes close enough.
fn typo_window_distance(query: &str, text: &str, max_distance: usize) -> Option<usize> {
    let query = query.to_lowercase();
    let text = text.to_lowercase();
    let query_len = query.chars().count();
    if query_len == 0 {
        return None;
    }
    let text_chars: Vec<char> = text.chars().collect();
    if text_chars.is_empty() {
        return None;
    }

    let min_window = query_len.saturating_sub(max_distance).max(1);
    let max_window = (query_len + max_distance).min(text_chars.len());

    let mut best: Option<usize> = None;
    for window in min_window..=max_window {
        for start in 0..=(text_chars.len() - window) {
            let slice: String = text_chars[start..start + window].iter().collect();
            let distance = levenshtein_distance(&query, &slice);
            if distance <= max_distance && best.map(|b| distance < b).unwrap_or(true) {
                best = Some(distance);
            }
        }
    }
    best
}

/// Fallback when the fuzzy engine is unavailable: case-insensitive substring
/// match on the name, candidate order preserved. Less forgiving than the
/// engine on misspelled queries; that precision loss is accepted.
fn substring_rank(query: &str, docs: &[SearchDoc]) -> Vec<RankedMatch> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return Vec::new();
    }
    docs.iter()
        .enumerate()
        .filter(|(_, doc)| doc.name.to_lowercase().contains(&needle))
        .map(|(index, _)| RankedMatch { index, score: 0 })
        .collect()
}

/// A search-bar suggestion derived from the candidate set.
#[derive(Debug, Clone, PartialEq)]
pub enum Suggestion {
    FileName(String),
    KindFilter(FileKind),
    ExtensionFilter(String),
}

/// The overlay itself. When `active`, the view renders `files`/`folders`
/// here instead of the listing; the listing keeps refreshing underneath.
pub struct SearchOverlay {
    pub active: bool,
    pub query: String,
    pub filters: FileFilters,
    pub files: Vec<FileEntry>,
    pub folders: Vec<FolderRef>,
    pub recent_searches: Vec<String>,
    engine: Option<Box<dyn FuzzyEngine>>,
}

impl SearchOverlay {
    pub fn new() -> Self {
        Self::with_engine(Box::new(SkimEngine::new()))
    }

    pub fn with_engine(engine: Box<dyn FuzzyEngine>) -> Self {
        Self {
            active: false,
            query: String::new(),
            filters: FileFilters::default(),
            files: Vec::new(),
            folders: Vec::new(),
            recent_searches: Vec::new(),
            engine: Some(engine),
        }
    }

    /// Degraded mode for a failed engine initialization: substring matching
    /// only.
    pub fn without_engine() -> Self {
        Self {
            active: false,
            query: String::new(),
            filters: FileFilters::default(),
            files: Vec::new(),
            folders: Vec::new(),
            recent_searches: Vec::new(),
            engine: None,
        }
    }

    pub fn has_engine(&self) -> bool {
        self.engine.is_some()
    }

    /// Recompute the overlay for a query and filter set over the given
    /// candidates. An empty query with all-default filters deactivates the
    /// overlay, equivalent to [`clear`](Self::clear).
    pub fn apply(
        &mut self,
        query: &str,
        filters: FileFilters,
        candidate_files: &[FileEntry],
        candidate_folders: &[FolderRef],
        now: DateTime<Utc>,
    ) {
        let trimmed = query.trim();
        if trimmed.is_empty() && filters.is_default() {
            self.clear();
            return;
        }

        self.active = true;
        self.query = query.to_string();
        self.filters = filters;

        // Structured filters first, exact predicates only.
        let filtered: Vec<FileEntry> = candidate_files
            .iter()
            .filter(|file| self.filters.matches(file, now))
            .cloned()
            .collect();

        self.files = if trimmed.is_empty() {
            filtered
        } else {
            let docs: Vec<SearchDoc> = filtered
                .iter()
                .map(|file| SearchDoc {
                    name: file.name.clone(),
                    tags: file.tags.clone(),
                })
                .collect();
            self.rank(trimmed, &docs)
                .into_iter()
                .map(|m| filtered[m.index].clone())
                .collect()
        };

        // Folders cannot satisfy file predicates, so any non-default filter
        // excludes them; otherwise they match the query by name.
        self.folders = if !self.filters.is_default() {
            Vec::new()
        } else if trimmed.is_empty() {
            candidate_folders.to_vec()
        } else {
            let docs: Vec<SearchDoc> = candidate_folders
                .iter()
                .map(|folder| SearchDoc {
                    name: folder.name.clone(),
                    tags: Vec::new(),
                })
                .collect();
            self.rank(trimmed, &docs)
                .into_iter()
                .map(|m| candidate_folders[m.index].clone())
                .collect()
        };

        log::debug!(
            "search overlay: query={:?} -> {} files, {} folders",
            trimmed,
            self.files.len(),
            self.folders.len()
        );
    }

    fn rank(&self, query: &str, docs: &[SearchDoc]) -> Vec<RankedMatch> {
        match &self.engine {
            Some(engine) => engine.rank(query, docs),
            None => substring_rank(query, docs),
        }
    }

    /// Adopt server-side search results, but only while this overlay is
    /// still showing the same query; late responses for an abandoned query
    /// are dropped.
    pub fn adopt_server_results(
        &mut self,
        query: &str,
        files: Vec<FileEntry>,
        folders: Vec<FolderRef>,
        now: DateTime<Utc>,
    ) -> bool {
        if !self.active || self.query.trim() != query.trim() {
            log::debug!("dropping stale search results for {:?}", query);
            return false;
        }
        // Server candidates still go through the local filter/rank pass so
        // structured filters and weighting stay consistent.
        let filters = self.filters.clone();
        let query = query.to_string();
        self.apply(&query, filters, &files, &folders, now);
        true
    }

    /// Deactivate and reset to defaults. The navigation-derived listing
    /// becomes visible again; no network round trip involved.
    pub fn clear(&mut self) {
        self.active = false;
        self.query.clear();
        self.filters = FileFilters::default();
        self.files.clear();
        self.folders.clear();
    }

    /// Record a submitted query: most recent first, deduplicated, capped.
    pub fn note_recent(&mut self, term: &str) {
        let term = term.trim();
        if term.is_empty() {
            return;
        }
        self.recent_searches.retain(|t| t != term);
        self.recent_searches.insert(0, term.to_string());
        self.recent_searches.truncate(MAX_RECENT_SEARCHES);
    }

    /// Search-bar suggestions for a partial query: file-name matches first,
    /// then kind filters, then known extensions.
    pub fn suggestions(&self, query: &str, candidates: &[FileEntry]) -> Vec<Suggestion> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return Vec::new();
        }

        let mut suggestions: Vec<Suggestion> = candidates
            .iter()
            .filter(|file| file.name.to_lowercase().contains(&needle))
            .take(3)
            .map(|file| Suggestion::FileName(file.name.clone()))
            .collect();

        for kind in FileKind::FILTERABLE {
            if kind.label().contains(&needle) {
                suggestions.push(Suggestion::KindFilter(kind));
            }
        }

        suggestions.extend(
            available_extensions(candidates)
                .into_iter()
                .filter(|ext| ext.contains(&needle))
                .take(2)
                .map(Suggestion::ExtensionFilter),
        );

        suggestions.truncate(MAX_SUGGESTIONS);
        suggestions
    }
}

impl Default for SearchOverlay {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use maplit::hashset;
    use std::collections::HashSet;

    fn file(id: &str, name: &str) -> FileEntry {
        FileEntry {
            id: id.to_string(),
            name: name.to_string(),
            size: 1024,
            mime_type: "application/pdf".to_string(),
            tags: Vec::new(),
            uploaded_at: Utc::now(),
        }
    }

    fn docs(names: &[&str]) -> Vec<SearchDoc> {
        names
            .iter()
            .map(|name| SearchDoc {
                name: name.to_string(),
                tags: Vec::new(),
            })
            .collect()
    }

    #[test]
    fn test_levenshtein_distance() {
        assert_eq!(levenshtein_distance("", "abc"), 3);
        assert_eq!(levenshtein_distance("abc", "abc"), 0);
        assert_eq!(levenshtein_distance("invioce", "invoice"), 2);
        assert_eq!(levenshtein_distance("kitten", "sitting"), 3);
    }

    #[test]
    fn test_skim_engine_ranks_subsequence_matches() {
        let engine = SkimEngine::new();
        let ranked = engine.rank("rep", &docs(&["report.pdf", "holiday.jpg", "repo.zip"]));
        let names: Vec<usize> = ranked.iter().map(|m| m.index).collect();
        assert!(names.contains(&0));
        assert!(names.contains(&2));
        assert!(!names.contains(&1));
    }

    #[test]
    fn test_skim_engine_tolerates_misspelling() {
        // "invioce" is not a subsequence of "invoice_jan.pdf"; the window
        // pass catches the transposition.
        let engine = SkimEngine::new();
        let ranked = engine.rank("invioce", &docs(&["invoice_jan.pdf", "summary.txt"]));
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].index, 0);
    }

    #[test]
    fn test_skim_engine_weighs_name_over_tags() {
        let engine = SkimEngine::new();
        let candidates = vec![
            SearchDoc {
                name: "report.pdf".to_string(),
                tags: vec!["misc".to_string()],
            },
            SearchDoc {
                name: "misc.bin".to_string(),
                tags: vec!["report".to_string()],
            },
        ];
        let ranked = engine.rank("report", &candidates);
        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].index, 0, "name match must outrank tag match");
    }

    #[test]
    fn test_skim_engine_rejects_short_queries() {
        let engine = SkimEngine::new();
        assert!(engine.rank("a", &docs(&["apple.txt"])).is_empty());
    }

    #[test]
    fn test_substring_fallback_misses_misspelling() {
        // The documented precision loss: without the engine, "invioce" finds
        // nothing even though the fuzzy engine would.
        let mut overlay = SearchOverlay::without_engine();
        let candidates = vec![file("1", "invoice_jan.pdf")];
        overlay.apply("invioce", FileFilters::default(), &candidates, &[], Utc::now());
        assert!(overlay.active);
        assert!(overlay.files.is_empty());

        overlay.apply("invoice", FileFilters::default(), &candidates, &[], Utc::now());
        assert_eq!(overlay.files.len(), 1);
    }

    #[test]
    fn test_overlay_activation_rules() {
        let mut overlay = SearchOverlay::new();
        let candidates = vec![file("1", "report.pdf")];

        overlay.apply("", FileFilters::default(), &candidates, &[], Utc::now());
        assert!(!overlay.active);

        overlay.apply("rep", FileFilters::default(), &candidates, &[], Utc::now());
        assert!(overlay.active);

        // Empty query but a non-default filter still activates.
        let mut filters = FileFilters::default();
        filters.kind = Some(FileKind::Document);
        overlay.apply("", filters, &candidates, &[], Utc::now());
        assert!(overlay.active);
        assert_eq!(overlay.files.len(), 1);
    }

    #[test]
    fn test_empty_apply_equals_clear() {
        let mut overlay = SearchOverlay::new();
        let candidates = vec![file("1", "report.pdf")];
        overlay.apply("rep", FileFilters::default(), &candidates, &[], Utc::now());
        assert!(overlay.active);

        overlay.apply("", FileFilters::default(), &candidates, &[], Utc::now());
        assert!(!overlay.active);
        assert!(overlay.query.is_empty());
        assert!(overlay.files.is_empty());
        assert!(overlay.filters.is_default());
    }

    #[test]
    fn test_filters_intersect_query() {
        let mut overlay = SearchOverlay::new();
        let mut image = file("1", "report_scan.png");
        image.mime_type = "image/png".to_string();
        let pdf = file("2", "report.pdf");
        let candidates = vec![image, pdf];

        let mut filters = FileFilters::default();
        filters.kind = Some(FileKind::Image);
        overlay.apply("report", filters, &candidates, &[], Utc::now());
        assert_eq!(overlay.files.len(), 1);
        assert_eq!(overlay.files[0].id, "1");
    }

    #[test]
    fn test_folders_match_query_but_not_filters() {
        let mut overlay = SearchOverlay::new();
        let folders = vec![FolderRef::new("A", "Reports"), FolderRef::new("B", "Photos")];

        overlay.apply("rep", FileFilters::default(), &[], &folders, Utc::now());
        assert_eq!(overlay.folders.len(), 1);
        assert_eq!(overlay.folders[0].id, "A");

        let mut filters = FileFilters::default();
        filters.size = crate::entry::SizeBand::Large;
        overlay.apply("rep", filters, &[], &folders, Utc::now());
        assert!(overlay.folders.is_empty());
    }

    #[test]
    fn test_adopt_server_results_checks_query() {
        let mut overlay = SearchOverlay::new();
        overlay.apply("report", FileFilters::default(), &[], &[], Utc::now());

        let adopted = overlay.adopt_server_results(
            "old query",
            vec![file("1", "report.pdf")],
            Vec::new(),
            Utc::now(),
        );
        assert!(!adopted);
        assert!(overlay.files.is_empty());

        let adopted = overlay.adopt_server_results(
            "report",
            vec![file("1", "report.pdf")],
            Vec::new(),
            Utc::now(),
        );
        assert!(adopted);
        assert_eq!(overlay.files.len(), 1);
    }

    #[test]
    fn test_recent_searches_dedupe_and_cap() {
        let mut overlay = SearchOverlay::new();
        for term in ["a", "b", "c", "d", "e", "f", "b"] {
            overlay.note_recent(term);
        }
        assert_eq!(overlay.recent_searches.len(), 5);
        assert_eq!(overlay.recent_searches[0], "b");
        let unique: HashSet<&String> = overlay.recent_searches.iter().collect();
        assert_eq!(unique.len(), overlay.recent_searches.len());
    }

    #[test]
    fn test_suggestions() {
        let overlay = SearchOverlay::new();
        let mut zipped = file("3", "bundle.zip");
        zipped.mime_type = "application/zip".to_string();
        let candidates = vec![file("1", "invoice_jan.pdf"), file("2", "invite.txt"), zipped];

        let suggestions = overlay.suggestions("inv", &candidates);
        assert!(suggestions.contains(&Suggestion::FileName("invoice_jan.pdf".to_string())));
        assert!(suggestions.contains(&Suggestion::FileName("invite.txt".to_string())));
        assert!(suggestions.len() <= MAX_SUGGESTIONS);

        let suggestions = overlay.suggestions("ima", &candidates);
        assert!(suggestions.contains(&Suggestion::KindFilter(FileKind::Image)));

        let suggestions = overlay.suggestions("zip", &candidates);
        assert!(suggestions.contains(&Suggestion::ExtensionFilter("zip".to_string())));

        assert!(overlay.suggestions("", &candidates).is_empty());
    }

    #[test]
    fn test_suggestion_kinds_cover_filter_menu() {
        let labels: HashSet<&str> = FileKind::FILTERABLE.iter().map(|k| k.label()).collect();
        assert_eq!(
            labels,
            hashset! {"image", "document", "video", "audio", "archive"}
        );
    }
}
