use std::collections::HashMap;

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::catalogue::Catalogue;
use super::math::cosine_similarity;
use super::scorer::ScoredItem;
use crate::models::normalize_tag;

/// Greedy Maximal Marginal Relevance selection.
///
/// Each step picks the candidate maximizing
/// `lambda * relevance - (1 - lambda) * max cosine similarity to the picks so far`.
/// Returns `min(k, pool.len())` items in selection order; ties go to the
/// earlier pool entry.
pub fn select_top_k(pool: &[ScoredItem], catalogue: &Catalogue, k: usize, lambda: f64) -> Vec<ScoredItem> {
    let target = k.min(pool.len());
    let mut chosen = Vec::with_capacity(target);
    let mut remaining: Vec<usize> = (0..pool.len()).collect();
    // max similarity of each pool entry to anything chosen, updated incrementally
    let mut penalty = vec![0.0_f64; pool.len()];

    while chosen.len() < target && !remaining.is_empty() {
        let mut best_pos = 0;
        let mut best_value = f64::NEG_INFINITY;

        for (pos, &cand) in remaining.iter().enumerate() {
            let value = lambda * pool[cand].score - (1.0 - lambda) * penalty[cand];
            if value > best_value {
                best_value = value;
                best_pos = pos;
            }
        }

        let picked = remaining.remove(best_pos);
        let picked_vector = catalogue.vector(pool[picked].index);
        for &cand in &remaining {
            let sim = cosine_similarity(
                catalogue.vector(pool[cand].index).as_slice(),
                picked_vector.as_slice(),
            );
            if sim > penalty[cand] {
                penalty[cand] = sim;
            }
        }
        chosen.push(pool[picked]);
    }

    chosen
}

/// Hard caps on how many served items may share a top genre or a director
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DiversityGuard {
    pub max_per_genre: usize,
    pub max_per_director: usize,
}

impl Default for DiversityGuard {
    fn default() -> Self {
        Self {
            max_per_genre: 2,
            max_per_director: 1,
        }
    }
}

impl DiversityGuard {
    /// Filters `ordered` down to `k` items within the caps.
    ///
    /// Items rejected by a cap, plus anything in `pool` not present in
    /// `ordered`, form the leftover set; if the caps leave fewer than
    /// `min(k, pool.len())` items the rest is filled at random from it.
    pub fn apply<R: Rng + ?Sized>(
        &self,
        ordered: &[ScoredItem],
        pool: &[ScoredItem],
        catalogue: &Catalogue,
        k: usize,
        rng: &mut R,
    ) -> Vec<ScoredItem> {
        let target = k.min(pool.len());
        let mut kept: Vec<ScoredItem> = Vec::with_capacity(target);
        let mut genre_counts: HashMap<String, usize> = HashMap::new();
        let mut director_counts: HashMap<String, usize> = HashMap::new();

        for candidate in ordered {
            if kept.len() >= target {
                break;
            }
            let item = catalogue.item(candidate.index);
            let genre = item.top_genre();
            let director = item.director.as_deref().map(normalize_tag).filter(|d| !d.is_empty());

            if let Some(g) = &genre {
                if genre_counts.get(g).copied().unwrap_or(0) >= self.max_per_genre {
                    continue;
                }
            }
            if let Some(d) = &director {
                if director_counts.get(d).copied().unwrap_or(0) >= self.max_per_director {
                    continue;
                }
            }

            if let Some(g) = genre {
                *genre_counts.entry(g).or_insert(0) += 1;
            }
            if let Some(d) = director {
                *director_counts.entry(d).or_insert(0) += 1;
            }
            kept.push(*candidate);
        }

        if kept.len() < target {
            let mut leftovers: Vec<ScoredItem> = pool
                .iter()
                .filter(|p| !kept.iter().any(|s| s.index == p.index))
                .copied()
                .collect();
            leftovers.shuffle(rng);
            let missing = target - kept.len();
            tracing::debug!(missing, "Diversity caps left gaps, filling at random");
            kept.extend(leftovers.into_iter().take(missing));
        }

        kept
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CatalogueItem;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    fn catalogue() -> Catalogue {
        Catalogue::new(vec![
            CatalogueItem::new("a1", "Action 1").with_genres(&["Action"]).with_director("Cameron"),
            CatalogueItem::new("a2", "Action 2").with_genres(&["Action"]).with_director("Cameron"),
            CatalogueItem::new("a3", "Action 3").with_genres(&["Action"]).with_director("Bigelow"),
            CatalogueItem::new("a4", "Action 4").with_genres(&["Action"]).with_director("McTiernan"),
            CatalogueItem::new("d1", "Drama 1").with_genres(&["Drama"]).with_director("Lumet"),
            CatalogueItem::new("c1", "Comedy 1").with_genres(&["Comedy"]),
        ])
    }

    fn pool(scores: &[f64]) -> Vec<ScoredItem> {
        scores
            .iter()
            .enumerate()
            .map(|(index, &score)| ScoredItem { index, score })
            .collect()
    }

    #[test]
    fn test_lambda_one_is_pure_relevance() {
        let cat = catalogue();
        let pool = pool(&[0.9, 0.8, 0.7, 0.6, 0.5, 0.4]);
        let top = select_top_k(&pool, &cat, 4, 1.0);
        let order: Vec<usize> = top.iter().map(|s| s.index).collect();
        assert_eq!(order, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_low_lambda_spreads_genres() {
        let cat = catalogue();
        let pool = pool(&[0.9, 0.85, 0.8, 0.75, 0.5, 0.45]);
        let top = select_top_k(&pool, &cat, 3, 0.3);
        let order: Vec<usize> = top.iter().map(|s| s.index).collect();
        assert_eq!(order[0], 0);
        assert!(order.contains(&4));
        assert!(order.contains(&5));
    }

    #[test]
    fn test_select_top_k_bounds() {
        let cat = catalogue();
        let pool = pool(&[0.9, 0.8]);
        assert_eq!(select_top_k(&pool, &cat, 5, 0.7).len(), 2);
        assert!(select_top_k(&pool, &cat, 0, 0.7).is_empty());
        assert!(select_top_k(&[], &cat, 3, 0.7).is_empty());
    }

    #[test]
    fn test_guard_caps_genre_and_director() {
        let cat = catalogue();
        let pool = pool(&[0.9, 0.8, 0.7, 0.6, 0.5, 0.4]);
        let mut rng = StdRng::seed_from_u64(3);
        let kept = DiversityGuard::default().apply(&pool, &pool, &cat, 4, &mut rng);
        let order: Vec<usize> = kept.iter().map(|s| s.index).collect();
        // a2 shares Cameron with a1, a4 would be the third action title
        assert_eq!(order, vec![0, 2, 4, 5]);
    }

    #[test]
    fn test_guard_fills_when_caps_block() {
        let cat = catalogue();
        let pool = pool(&[0.9, 0.8, 0.7, 0.6]);
        let mut rng = StdRng::seed_from_u64(3);
        let kept = DiversityGuard::default().apply(&pool, &pool, &cat, 4, &mut rng);
        assert_eq!(kept.len(), 4);
        let unique: HashSet<usize> = kept.iter().map(|s| s.index).collect();
        assert_eq!(unique.len(), 4);
        assert_eq!(kept[0].index, 0);
        assert_eq!(kept[1].index, 2);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Returns exactly min(k, n) distinct items
            #[test]
            fn top_k_is_distinct_and_sized(
                scores in prop::collection::vec(0.0f64..1.5, 0..6),
                k in 0usize..10,
                lambda in 0.0f64..1.0,
            ) {
                let cat = catalogue();
                let pool = pool(&scores);
                let top = select_top_k(&pool, &cat, k, lambda);
                prop_assert_eq!(top.len(), k.min(pool.len()));
                let unique: HashSet<usize> = top.iter().map(|s| s.index).collect();
                prop_assert_eq!(unique.len(), top.len());
            }
        }
    }
}
