use serde::{Deserialize, Serialize};

use super::math::{difference, dot, normalize_in_place, sigmoid};

/// Step size and shrinkage of the online pairwise update.
///
/// Larger `learning_rate` converges faster over a short onboarding but makes
/// single votes swing the taste vector harder; `l2_penalty` pulls weights
/// toward zero before every step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UpdateParams {
    pub learning_rate: f64,
    pub l2_penalty: f64,
}

impl Default for UpdateParams {
    fn default() -> Self {
        Self {
            learning_rate: 0.6,
            l2_penalty: 0.01,
        }
    }
}

/// Outcome of a single update, for logging
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UpdateOutcome {
    /// `w · (winner - loser)` before the update
    pub margin: f64,
    /// Predicted probability that the winner wins, before the update
    pub predicted: f64,
    /// Logistic gradient magnitude `1 - predicted`
    pub gradient: f64,
}

/// Applies one Bradley-Terry-Luce style logistic step for "winner beat loser".
///
/// The weight vector is grown to the longer of the two feature vectors,
/// shrunk by `l2_penalty`, moved along `winner - loser`, then rescaled to
/// unit length (left as-is when its norm is zero).
pub fn update(
    weights: &mut Vec<f64>,
    winner: &[f64],
    loser: &[f64],
    params: &UpdateParams,
) -> UpdateOutcome {
    let diff = difference(winner, loser);
    if weights.len() < diff.len() {
        weights.resize(diff.len(), 0.0);
    }

    let margin = dot(weights, &diff);
    let predicted = sigmoid(margin);
    let gradient = 1.0 - predicted;

    for w in weights.iter_mut() {
        *w *= 1.0 - params.l2_penalty;
    }
    for (w, d) in weights.iter_mut().zip(diff.iter()) {
        *w += params.learning_rate * gradient * d;
    }
    normalize_in_place(weights);

    UpdateOutcome {
        margin,
        predicted,
        gradient,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::math::l2_norm;

    #[test]
    fn test_first_update_points_along_difference() {
        let mut w = vec![0.0; 3];
        let outcome = update(&mut w, &[1.0, 0.0, 0.0], &[0.0, 1.0, 0.0], &UpdateParams::default());
        assert_eq!(outcome.margin, 0.0);
        assert!((outcome.predicted - 0.5).abs() < 1e-12);
        let expected = 1.0 / 2f64.sqrt();
        assert!((w[0] - expected).abs() < 1e-12);
        assert!((w[1] + expected).abs() < 1e-12);
        assert_eq!(w[2], 0.0);
    }

    #[test]
    fn test_identical_vectors_only_shrink() {
        let mut w = vec![0.0; 2];
        update(&mut w, &[0.0, 0.0], &[0.0, 0.0], &UpdateParams::default());
        assert_eq!(w, vec![0.0, 0.0]);

        // Shrink then renormalize leaves a unit vector unchanged
        let mut w = vec![0.6, 0.8];
        update(&mut w, &[1.0, 1.0], &[1.0, 1.0], &UpdateParams::default());
        assert!((w[0] - 0.6).abs() < 1e-12);
        assert!((w[1] - 0.8).abs() < 1e-12);
    }

    #[test]
    fn test_length_mismatch_is_zero_padded() {
        let mut w = vec![0.0; 2];
        update(&mut w, &[1.0, 0.0, 1.0], &[0.0], &UpdateParams::default());
        assert_eq!(w.len(), 3);
        assert!((l2_norm(&w) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_update_raises_confidence() {
        let params = UpdateParams::default();
        let winner = [1.0, 0.0, 0.5];
        let loser = [0.0, 1.0, 0.5];
        let mut w = vec![-0.6, 0.8, 0.0];
        let diff = difference(&winner, &loser);
        let before = sigmoid(dot(&w, &diff));
        update(&mut w, &winner, &loser, &params);
        let after = sigmoid(dot(&w, &diff));
        assert!(after > before);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        fn unit_or_zero(raw: Vec<f64>) -> Vec<f64> {
            let mut w = raw;
            normalize_in_place(&mut w);
            w
        }

        proptest! {
            /// The winner's predicted win probability never drops
            #[test]
            fn confidence_moves_toward_winner(
                raw in prop::collection::vec(-1.0f64..1.0, 12),
                winner in prop::collection::vec(0.0f64..1.0, 12),
                loser in prop::collection::vec(0.0f64..1.0, 12),
                learning_rate in 0.01f64..2.0,
                l2_penalty in 0.0f64..0.5,
            ) {
                let params = UpdateParams { learning_rate, l2_penalty };
                let mut w = unit_or_zero(raw);
                let diff = difference(&winner, &loser);
                let before = sigmoid(dot(&w, &diff));
                update(&mut w, &winner, &loser, &params);
                let after = sigmoid(dot(&w, &diff));
                prop_assert!(after >= before - 1e-9);
            }

            /// Weights come out with unit norm whenever the step is non-degenerate
            #[test]
            fn weights_have_unit_norm(
                raw in prop::collection::vec(-1.0f64..1.0, 12),
                winner in prop::collection::vec(0.0f64..1.0, 12),
                loser in prop::collection::vec(0.0f64..1.0, 12),
            ) {
                let mut w = unit_or_zero(raw);
                update(&mut w, &winner, &loser, &UpdateParams::default());
                let norm = l2_norm(&w);
                prop_assert!(norm == 0.0 || (norm - 1.0).abs() < 1e-9);
            }
        }
    }
}
