//! Novelty results review: decision grouping, pagination and the persistent
//! selection that survives page and tab switches.
use std::collections::{BTreeMap, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};

pub const PAGE_SIZE: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Decision {
    Existing,
    PartiallyNew,
    New,
}

impl Decision {
    pub const ALL: [Decision; 3] = [Decision::Existing, Decision::PartiallyNew, Decision::New];

    pub fn as_str(self) -> &'static str {
        match self {
            Decision::Existing => "EXISTING",
            Decision::PartiallyNew => "PARTIALLY_NEW",
            Decision::New => "NEW",
        }
    }

    fn index(self) -> usize {
        match self {
            Decision::Existing => 0,
            Decision::PartiallyNew => 1,
            Decision::New => 2,
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One novelty comparator result for an extracted quality sentence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoveltyItem {
    pub quality: String,
    #[serde(default)]
    pub max_score: Option<f64>,
    pub decision: Decision,
    #[serde(default)]
    pub rationale: String,
    #[serde(default)]
    pub novel_spans: Vec<String>,
    #[serde(default)]
    pub matched_neighbor_sentence: Option<String>,
    #[serde(default)]
    pub confidence: Option<f64>,
}

impl NoveltyItem {
    pub fn score(&self) -> f64 {
        self.max_score.filter(|s| s.is_finite()).unwrap_or(0.0)
    }

    /// Stable content-derived key: `decision::quality::matched_neighbor`.
    pub fn selection_key(&self) -> SelectionKey {
        SelectionKey(format!(
            "{}::{}::{}",
            self.decision,
            self.quality,
            self.matched_neighbor_sentence.as_deref().unwrap_or("")
        ))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SelectionKey(pub String);

impl fmt::Display for SelectionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Results partitioned into the three decision buckets, each sorted by
/// descending score.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DecisionGroups {
    buckets: [Vec<NoveltyItem>; 3],
}

impl DecisionGroups {
    pub fn get(&self, decision: Decision) -> &[NoveltyItem] {
        &self.buckets[decision.index()]
    }

    pub fn len(&self, decision: Decision) -> usize {
        self.get(decision).len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.iter().all(Vec::is_empty)
    }

    pub fn total(&self) -> usize {
        self.buckets.iter().map(Vec::len).sum()
    }
}

pub fn group_by_decision(items: impl IntoIterator<Item = NoveltyItem>) -> DecisionGroups {
    let mut groups = DecisionGroups::default();
    for item in items {
        groups.buckets[item.decision.index()].push(item);
    }
    for bucket in &mut groups.buckets {
        // Stable sort keeps service order for equal scores.
        bucket.sort_by(|a, b| b.score().total_cmp(&a.score()));
    }
    groups
}

pub fn page_count(total: usize) -> usize {
    total.div_ceil(PAGE_SIZE).max(1)
}

pub fn clamp_page(page: usize, total: usize) -> usize {
    page.clamp(1, page_count(total))
}

/// Items visible on a 1-based page (clamped).
pub fn page_slice(items: &[NoveltyItem], page: usize) -> &[NoveltyItem] {
    let page = clamp_page(page, items.len());
    let start = (page - 1) * PAGE_SIZE;
    let end = (start + PAGE_SIZE).min(items.len());
    &items[start.min(end)..end]
}

/// Persistent selection keyed by [`SelectionKey`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SelectionSet {
    selected: BTreeMap<SelectionKey, NoveltyItem>,
}

impl SelectionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn select(&mut self, item: NoveltyItem) {
        self.selected.insert(item.selection_key(), item);
    }

    pub fn deselect(&mut self, key: &SelectionKey) -> Option<NoveltyItem> {
        self.selected.remove(key)
    }

    pub fn set(&mut self, item: &NoveltyItem, checked: bool) {
        if checked {
            self.select(item.clone());
        } else {
            self.deselect(&item.selection_key());
        }
    }

    pub fn contains(&self, key: &SelectionKey) -> bool {
        self.selected.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.selected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    pub fn clear(&mut self) {
        self.selected.clear();
    }

    pub fn items(&self) -> impl Iterator<Item = &NoveltyItem> {
        self.selected.values()
    }

    /// Distinct quality texts for the triplet-extraction request, in key
    /// order. A quality picked under several decisions is sent once.
    pub fn qualities(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.items()
            .filter(|item| seen.insert(item.quality.as_str()))
            .map(|item| item.quality.clone())
            .collect()
    }
}

/// Tri-state of the "select all" control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SelectAllState {
    Checked,
    #[default]
    Unchecked,
    Indeterminate,
}

impl SelectAllState {
    pub fn derive(checked: usize, total: usize) -> Self {
        if total == 0 || checked == 0 {
            SelectAllState::Unchecked
        } else if checked >= total {
            SelectAllState::Checked
        } else {
            SelectAllState::Indeterminate
        }
    }
}

/// Active tab and per-tab page numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OversightCursor {
    pub tab: Decision,
    pages: [usize; 3],
}

impl Default for OversightCursor {
    fn default() -> Self {
        Self {
            tab: Decision::New,
            pages: [1; 3],
        }
    }
}

impl OversightCursor {
    pub fn page(&self, decision: Decision) -> usize {
        self.pages[decision.index()]
    }

    pub fn set_page(&mut self, decision: Decision, page: usize) {
        self.pages[decision.index()] = page;
    }
}
