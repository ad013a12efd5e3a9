use thiserror::Error;

use crate::models::ItemId;

pub mod catalogue;
pub mod diversity;
pub mod features;
pub mod math;
pub mod pair_selector;
pub mod preference_model;
pub mod scorer;
pub mod session;

pub use catalogue::{load_catalogue, Catalogue, CatalogueSource, JsonFileCatalogue, StaticCatalogue};
pub use diversity::{select_top_k, DiversityGuard};
pub use features::phi;
pub use pair_selector::{select_pair, PairSelectionParams, SelectedPair};
pub use preference_model::{update, UpdateParams};
pub use scorer::{apply_exploration_jitter, rank, score, ScoredItem, ScoringParams};
pub use session::{
    ComparisonPair, FacetCount, Recommendation, Recommendations, SessionController, SessionPhase,
    SessionSnapshot, TasteExplanation,
};

/// Errors the engine reports to its caller
#[derive(Debug, Error, Clone, PartialEq)]
pub enum EngineError {
    #[error("Not enough candidates to form a pair ({available} eligible)")]
    InsufficientCandidates { available: usize },

    #[error("Malformed vote: {reason}")]
    MalformedVote { reason: String },

    #[error("Unknown catalogue item: {0}")]
    UnknownItem(ItemId),

    #[error("Onboarding is complete; request recommendations instead")]
    OnboardingComplete,
}
