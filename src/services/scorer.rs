use std::cmp::Ordering;

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::catalogue::Catalogue;
use super::features::is_recent;
use super::math::{dot, sigmoid};
use crate::models::PreferenceState;

/// Positions considered for the epsilon-greedy swap with the top slot
const JITTER_FIRST: usize = 3;
const JITTER_LAST: usize = 12;

/// Heuristic bonuses added on top of the learned relevance
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoringParams {
    /// Bonus for items this session has not been shown yet
    pub novelty_bonus: f64,
    /// Extra bonus for unexplored series and shorts
    pub series_novelty_bonus: f64,
    /// Bonus for recent releases, offsets the pull of older well-rated titles
    pub era_bonus: f64,
}

impl Default for ScoringParams {
    fn default() -> Self {
        Self {
            novelty_bonus: 0.08,
            series_novelty_bonus: 0.04,
            era_bonus: 0.3,
        }
    }
}

/// A catalogue position with its score
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoredItem {
    pub index: usize,
    pub score: f64,
}

/// Scores one catalogue item against the session state
pub fn score(catalogue: &Catalogue, idx: usize, state: &PreferenceState, params: &ScoringParams) -> f64 {
    let item = catalogue.item(idx);
    let vector = catalogue.vector(idx);

    let relevance = sigmoid(dot(&state.weights, vector.as_slice()));

    let mut novelty = 0.0;
    if !state.is_explored(&item.id) {
        novelty += params.novelty_bonus;
        if item.kind.is_short_form() {
            novelty += params.series_novelty_bonus;
        }
    }

    let era = if is_recent(vector) { params.era_bonus } else { 0.0 };

    relevance + novelty + era
}

/// Scores every non-hidden item, best first. Ties keep catalogue order.
pub fn rank(catalogue: &Catalogue, state: &PreferenceState, params: &ScoringParams) -> Vec<ScoredItem> {
    let mut scored: Vec<ScoredItem> = (0..catalogue.len())
        .filter(|&idx| !state.is_hidden(&catalogue.item(idx).id))
        .map(|idx| ScoredItem {
            index: idx,
            score: score(catalogue, idx, state, params),
        })
        .collect();

    scored.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(Ordering::Equal)
            .then(a.index.cmp(&b.index))
    });
    scored
}

/// Epsilon-greedy serving perturbation.
///
/// With probability `exploration_rate` swaps the first entry with one drawn
/// from positions `3..=min(12, len - 1)`. Only the order changes. Returns the
/// swapped position, if any.
pub fn apply_exploration_jitter<T, R: Rng + ?Sized>(
    served: &mut [T],
    exploration_rate: f64,
    rng: &mut R,
) -> Option<usize> {
    if served.len() <= JITTER_FIRST || exploration_rate <= 0.0 {
        return None;
    }
    if !rng.gen_bool(exploration_rate.min(1.0)) {
        return None;
    }
    let last = JITTER_LAST.min(served.len() - 1);
    let pick = rng.gen_range(JITTER_FIRST..=last);
    served.swap(0, pick);
    Some(pick)
}
