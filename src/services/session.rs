//! Onboarding state machine for one user session.
//!
//! `Collecting { round }` advances one round per vote until the configured
//! number of rounds is reached, then the session is `Complete` and only
//! serves recommendations. Every operation is synchronous and touches only
//! this session's state; callers serialize access per session.

use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use super::catalogue::Catalogue;
use super::diversity::select_top_k;
use super::pair_selector::select_pair;
use super::preference_model::update;
use super::scorer::{apply_exploration_jitter, rank};
use super::EngineError;
use crate::config::EngineConfig;
use crate::models::{CatalogueItem, ItemId, PreferenceState, Vote};

/// Entries listed per facet in the explanation
const TOP_FACETS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SessionPhase {
    Collecting { round: u32 },
    Complete,
}

/// The two titles to show next
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ComparisonPair {
    pub left: CatalogueItem,
    pub right: CatalogueItem,
    pub round: u32,
    pub informativeness: f64,
}

/// Progress view of a session
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SessionSnapshot {
    pub weights: Vec<f64>,
    pub choices: u32,
    pub target_rounds: u32,
    pub phase: SessionPhase,
    pub onboarding_complete: bool,
    pub exploration_rate: f64,
    pub explored: usize,
    pub hidden: Vec<ItemId>,
    pub likes: Vec<ItemId>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FacetCount {
    pub name: String,
    pub count: u32,
}

/// What the winning votes had in common
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct TasteExplanation {
    pub top_genres: Vec<FacetCount>,
    pub top_actors: Vec<FacetCount>,
    pub top_directors: Vec<FacetCount>,
    pub top_eras: Vec<FacetCount>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Recommendation {
    pub item: CatalogueItem,
    pub score: f64,
}

/// Served list plus rationale
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Recommendations {
    pub items: Vec<Recommendation>,
    pub explanation: TasteExplanation,
}

/// Sequences onboarding rounds and owns one session's preference state
pub struct SessionController {
    catalogue: Arc<Catalogue>,
    config: EngineConfig,
    state: PreferenceState,
    phase: SessionPhase,
    recent: VecDeque<ItemId>,
    seed: u64,
    rng: StdRng,
}

impl SessionController {
    /// Starts a session at `Collecting { round: 0 }` over a catalogue snapshot
    pub fn new(catalogue: Arc<Catalogue>, config: EngineConfig, seed: u64) -> Self {
        let state = PreferenceState::new(config.exploration_default);
        Self {
            catalogue,
            config,
            state,
            phase: SessionPhase::Collecting { round: 0 },
            recent: VecDeque::new(),
            seed,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn state(&self) -> &PreferenceState {
        &self.state
    }

    pub fn catalogue(&self) -> &Catalogue {
        &self.catalogue
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn is_complete(&self) -> bool {
        self.phase == SessionPhase::Complete
    }

    /// Picks the next pair to compare and marks both sides as shown.
    ///
    /// Recently shown items are avoided when possible; hidden items never
    /// appear.
    pub fn next_pair(&mut self) -> Result<ComparisonPair, EngineError> {
        let round = match self.phase {
            SessionPhase::Collecting { round } => round,
            SessionPhase::Complete => return Err(EngineError::OnboardingComplete),
        };
        self.propose_pair(round)
    }

    fn propose_pair(&mut self, round: u32) -> Result<ComparisonPair, EngineError> {
        let mut exclude: BTreeSet<ItemId> = self.state.hidden.clone();
        exclude.extend(self.recent.iter().cloned());

        let selected = match select_pair(
            &self.catalogue,
            &self.state.weights,
            &exclude,
            &self.config.pairs,
            &mut self.rng,
        ) {
            Err(EngineError::InsufficientCandidates { available }) if !self.recent.is_empty() => {
                tracing::debug!(available, "Relaxing recently-shown exclusion");
                select_pair(
                    &self.catalogue,
                    &self.state.weights,
                    &self.state.hidden,
                    &self.config.pairs,
                    &mut self.rng,
                )?
            }
            other => other?,
        };

        let left = self.catalogue.item(selected.left).clone();
        let right = self.catalogue.item(selected.right).clone();
        self.remember_shown(&left.id);
        self.remember_shown(&right.id);

        tracing::debug!(
            round,
            left = %left.id,
            right = %right.id,
            informativeness = selected.informativeness,
            "Proposed comparison pair"
        );

        Ok(ComparisonPair {
            left,
            right,
            round,
            informativeness: selected.informativeness,
        })
    }

    /// Applies a vote and advances the round.
    ///
    /// Both ids must resolve in the catalogue and differ, otherwise the vote
    /// is rejected without touching the weights.
    pub fn submit_vote(&mut self, vote: &Vote) -> Result<SessionPhase, EngineError> {
        if self.is_complete() {
            return Err(EngineError::OnboardingComplete);
        }
        if vote.winner_id == vote.loser_id {
            return Err(EngineError::MalformedVote {
                reason: format!("winner and loser are both {}", vote.winner_id),
            });
        }
        let winner = self.resolve_vote_side(&vote.winner_id, "winner")?;
        let loser = self.resolve_vote_side(&vote.loser_id, "loser")?;

        let outcome = update(
            &mut self.state.weights,
            self.catalogue.vector(winner).as_slice(),
            self.catalogue.vector(loser).as_slice(),
            &self.config.update,
        );

        self.state.choices += 1;
        self.state.mark_explored(&vote.winner_id);
        self.state.mark_explored(&vote.loser_id);
        self.state.facets.record(self.catalogue.item(winner));

        self.phase = if self.state.choices >= self.config.target_rounds {
            tracing::info!(choices = self.state.choices, "Onboarding complete");
            SessionPhase::Complete
        } else {
            SessionPhase::Collecting {
                round: self.state.choices,
            }
        };

        tracing::debug!(
            winner = %vote.winner_id,
            loser = %vote.loser_id,
            margin = outcome.margin,
            predicted = outcome.predicted,
            choices = self.state.choices,
            "Applied vote"
        );

        Ok(self.phase)
    }

    /// Steps back one round (never below zero) and proposes a fresh pair.
    ///
    /// The weights are left as they are; only the round counter moves, and
    /// only once a pair could be proposed.
    pub fn skip(&mut self) -> Result<ComparisonPair, EngineError> {
        if self.is_complete() {
            return Err(EngineError::OnboardingComplete);
        }
        let round = self.state.choices.saturating_sub(1);
        let pair = self.propose_pair(round)?;
        self.state.choices = round;
        self.phase = SessionPhase::Collecting { round };
        Ok(pair)
    }

    /// Moves the exploration rate within its configured bounds
    pub fn adjust_exploration(&mut self, delta: f64) -> f64 {
        self.state.adjust_exploration(
            delta,
            self.config.exploration_min,
            self.config.exploration_max,
        )
    }

    /// Back to `Collecting { round: 0 }` with zeroed weights, empty sets and
    /// the RNG reseeded, so resetting twice equals resetting once.
    pub fn reset(&mut self) {
        self.state.reset(self.config.exploration_default);
        self.phase = SessionPhase::Collecting { round: 0 };
        self.recent.clear();
        self.rng = StdRng::seed_from_u64(self.seed);
    }

    pub fn hide(&mut self, id: &ItemId) -> Result<(), EngineError> {
        self.ensure_known(id)?;
        self.state.hide(id.clone());
        Ok(())
    }

    /// Returns whether the item had been hidden
    pub fn unhide(&mut self, id: &ItemId) -> Result<bool, EngineError> {
        self.ensure_known(id)?;
        Ok(self.state.unhide(id))
    }

    pub fn like(&mut self, id: &ItemId) -> Result<(), EngineError> {
        self.ensure_known(id)?;
        self.state.like(id.clone());
        Ok(())
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            weights: self.state.weights.clone(),
            choices: self.state.choices,
            target_rounds: self.config.target_rounds,
            phase: self.phase,
            onboarding_complete: self.is_complete(),
            exploration_rate: self.state.exploration_rate,
            explored: self.state.explored.len(),
            hidden: self.state.hidden.iter().cloned().collect(),
            likes: self.state.likes.iter().cloned().collect(),
        }
    }

    /// Ranked, diversified list of up to `k` non-hidden items.
    ///
    /// Scores every eligible item, selects with MMR, applies the optional
    /// genre/director caps, then the epsilon-greedy swap. The reported
    /// scores are the scorer's, whatever the final order.
    pub fn recommendations(&mut self, k: usize) -> Recommendations {
        let ranked = rank(&self.catalogue, &self.state, &self.config.scoring);
        let lambda = self.config.mmr_lambda;

        let mut served = match self.config.guard {
            Some(guard) => {
                let overfetch = select_top_k(&ranked, &self.catalogue, k.saturating_mul(4), lambda);
                guard.apply(&overfetch, &ranked, &self.catalogue, k, &mut self.rng)
            }
            None => select_top_k(&ranked, &self.catalogue, k, lambda),
        };

        if let Some(swapped) =
            apply_exploration_jitter(&mut served, self.state.exploration_rate, &mut self.rng)
        {
            tracing::debug!(swapped, "Exploration swap applied to served list");
        }

        let items = served
            .into_iter()
            .map(|s| Recommendation {
                item: self.catalogue.item(s.index).clone(),
                score: s.score,
            })
            .collect();

        Recommendations {
            items,
            explanation: self.explanation(),
        }
    }

    /// Most frequent genres, actors, directors and eras among winners
    pub fn explanation(&self) -> TasteExplanation {
        let facets = &self.state.facets;
        TasteExplanation {
            top_genres: top_counts(&facets.genres),
            top_actors: top_counts(&facets.actors),
            top_directors: top_counts(&facets.directors),
            top_eras: top_counts(&facets.eras),
        }
    }

    fn resolve_vote_side(&self, id: &ItemId, side: &str) -> Result<usize, EngineError> {
        self.catalogue
            .position(id)
            .ok_or_else(|| EngineError::MalformedVote {
                reason: format!("{} {} is not in the catalogue", side, id),
            })
    }

    fn ensure_known(&self, id: &ItemId) -> Result<(), EngineError> {
        match self.catalogue.position(id) {
            Some(_) => Ok(()),
            None => Err(EngineError::UnknownItem(id.clone())),
        }
    }

    fn remember_shown(&mut self, id: &ItemId) {
        self.state.mark_explored(id);
        self.recent.retain(|r| r != id);
        self.recent.push_back(id.clone());
        while self.recent.len() > self.config.recent_window {
            self.recent.pop_front();
        }
    }
}

/// Highest counts first, ties by name
fn top_counts(counts: &BTreeMap<String, u32>) -> Vec<FacetCount> {
    let mut entries: Vec<FacetCount> = counts
        .iter()
        .map(|(name, &count)| FacetCount {
            name: name.clone(),
            count,
        })
        .collect();
    entries.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.name.cmp(&b.name)));
    entries.truncate(TOP_FACETS);
    entries
}
