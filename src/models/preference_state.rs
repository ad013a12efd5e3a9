use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use super::{normalize_tag, CatalogueItem, ItemId, FEATURE_DIM};

/// Occurrence counts of attributes seen on winning items
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TasteFacets {
    pub genres: BTreeMap<String, u32>,
    pub actors: BTreeMap<String, u32>,
    pub directors: BTreeMap<String, u32>,
    pub eras: BTreeMap<String, u32>,
}

impl TasteFacets {
    /// Folds the winner of a vote into the counters.
    ///
    /// Spellings that normalize to the same tag ("Sci-Fi", "sci fi") share
    /// one counter under the first spelling seen.
    pub fn record(&mut self, item: &CatalogueItem) {
        for genre in &item.genres {
            bump(&mut self.genres, genre);
        }
        for actor in &item.actors {
            bump(&mut self.actors, actor);
        }
        if let Some(director) = item.director.as_deref() {
            bump(&mut self.directors, director);
        }
        if let Some(era) = item.era_bucket() {
            *self.eras.entry(era).or_insert(0) += 1;
        }
    }

    pub fn is_empty(&self) -> bool {
        self.genres.is_empty()
            && self.actors.is_empty()
            && self.directors.is_empty()
            && self.eras.is_empty()
    }
}

fn bump(counts: &mut BTreeMap<String, u32>, raw: &str) {
    let key = normalize_tag(raw);
    if key.is_empty() {
        return;
    }
    let existing = counts.keys().find(|k| normalize_tag(k) == key).cloned();
    let label = existing.unwrap_or_else(|| raw.trim().to_string());
    *counts.entry(label).or_insert(0) += 1;
}

/// Per-session learned taste. Lives in memory only and is dropped with the session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PreferenceState {
    /// Weight vector, unit L2 norm after every non-degenerate update
    pub weights: Vec<f64>,
    /// Votes recorded so far
    pub choices: u32,
    pub explored: BTreeSet<ItemId>,
    pub hidden: BTreeSet<ItemId>,
    pub likes: BTreeSet<ItemId>,
    pub exploration_rate: f64,
    pub facets: TasteFacets,
}

impl PreferenceState {
    /// Creates an empty state with zeroed weights
    pub fn new(exploration_rate: f64) -> Self {
        Self {
            weights: vec![0.0; FEATURE_DIM],
            choices: 0,
            explored: BTreeSet::new(),
            hidden: BTreeSet::new(),
            likes: BTreeSet::new(),
            exploration_rate,
            facets: TasteFacets::default(),
        }
    }

    /// Clears everything back to initial values in place
    pub fn reset(&mut self, exploration_rate: f64) {
        self.weights.clear();
        self.weights.resize(FEATURE_DIM, 0.0);
        self.choices = 0;
        self.explored.clear();
        self.hidden.clear();
        self.likes.clear();
        self.exploration_rate = exploration_rate;
        self.facets = TasteFacets::default();
    }

    pub fn mark_explored(&mut self, id: &ItemId) {
        self.explored.insert(id.clone());
    }

    pub fn is_explored(&self, id: &ItemId) -> bool {
        self.explored.contains(id)
    }

    pub fn hide(&mut self, id: ItemId) {
        self.hidden.insert(id);
    }

    /// Returns true if the id was hidden
    pub fn unhide(&mut self, id: &ItemId) -> bool {
        self.hidden.remove(id)
    }

    pub fn is_hidden(&self, id: &ItemId) -> bool {
        self.hidden.contains(id)
    }

    pub fn like(&mut self, id: ItemId) {
        self.likes.insert(id);
    }

    /// Moves the exploration rate by `delta`, clamped to `[min, max]`
    pub fn adjust_exploration(&mut self, delta: f64, min: f64, max: f64) -> f64 {
        let next = self.exploration_rate + delta;
        self.exploration_rate = if next.is_nan() {
            self.exploration_rate
        } else {
            next.clamp(min, max)
        };
        self.exploration_rate
    }
}
