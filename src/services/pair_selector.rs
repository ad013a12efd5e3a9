use std::collections::BTreeSet;

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::catalogue::Catalogue;
use super::math::{difference, dot, l1_distance};
use super::EngineError;
use crate::models::ItemId;

/// Knobs of the informativeness heuristic
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PairSelectionParams {
    /// Upper bound on the random sample the pairs are drawn from
    pub sample_cap: usize,
    /// Partners examined per anchor in the sample
    pub window: usize,
    pub uncertainty_weight: f64,
    pub distance_weight: f64,
}

impl Default for PairSelectionParams {
    fn default() -> Self {
        Self {
            sample_cap: 120,
            window: 26,
            uncertainty_weight: 0.6,
            distance_weight: 0.4,
        }
    }
}

/// Two catalogue positions to show side by side, with the score that picked them
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SelectedPair {
    pub left: usize,
    pub right: usize,
    pub informativeness: f64,
}

/// How informative asking "A or B?" would be under the current weights.
///
/// High when the model is close to 50/50 on the pair and the two items look
/// clearly different.
pub fn informativeness(weights: &[f64], a: &[f64], b: &[f64], params: &PairSelectionParams) -> f64 {
    let diff = difference(a, b);
    let confidence = dot(weights, &diff).abs();
    let uncertainty = (1.0 - confidence.min(1.0) * 2.0).clamp(0.0, 1.0);

    let dim = a.len().max(b.len()).max(1) as f64;
    let distance = (l1_distance(a, b) / dim).clamp(0.0, 1.0);

    params.uncertainty_weight * uncertainty + params.distance_weight * distance
}

/// Proposes the next comparison pair.
///
/// Samples at most `sample_cap` eligible items, scores each anchor against
/// the next `window` items of the sample, and returns the most informative
/// pair. Ties keep the first pair found.
pub fn select_pair<R: Rng + ?Sized>(
    catalogue: &Catalogue,
    weights: &[f64],
    exclude: &BTreeSet<ItemId>,
    params: &PairSelectionParams,
    rng: &mut R,
) -> Result<SelectedPair, EngineError> {
    let mut pool: Vec<usize> = (0..catalogue.len())
        .filter(|&idx| !exclude.contains(&catalogue.item(idx).id))
        .collect();

    if pool.len() < 2 {
        return Err(EngineError::InsufficientCandidates {
            available: pool.len(),
        });
    }

    pool.shuffle(rng);
    pool.truncate(params.sample_cap.max(2));

    let window = params.window.max(1);
    let mut best: Option<SelectedPair> = None;

    for (i, &anchor) in pool.iter().enumerate() {
        let end = (i + 1 + window).min(pool.len());
        for &partner in &pool[i + 1..end] {
            let score = informativeness(
                weights,
                catalogue.vector(anchor).as_slice(),
                catalogue.vector(partner).as_slice(),
                params,
            );
            if best.map_or(true, |b| score > b.informativeness) {
                best = Some(SelectedPair {
                    left: anchor,
                    right: partner,
                    informativeness: score,
                });
            }
        }
    }

    best.ok_or(EngineError::InsufficientCandidates {
        available: pool.len(),
    })
}
