use serde::Deserialize;

use crate::services::{DiversityGuard, PairSelectionParams, ScoringParams, UpdateParams};

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Optional JSON file with the catalogue to serve at startup
    #[serde(default)]
    pub catalogue_path: Option<String>,

    /// Votes needed before onboarding completes
    #[serde(default = "default_target_rounds")]
    pub target_rounds: u32,

    /// Step size of the pairwise update
    #[serde(default = "default_learning_rate")]
    pub learning_rate: f64,

    /// Shrinkage applied to the weights before each step
    #[serde(default = "default_l2_penalty")]
    pub l2_penalty: f64,

    /// MMR trade-off: 1.0 ranks purely by score, 0.0 purely by novelty
    #[serde(default = "default_mmr_lambda")]
    pub mmr_lambda: f64,

    #[serde(default = "default_exploration_min")]
    pub exploration_min: f64,

    #[serde(default = "default_exploration_max")]
    pub exploration_max: f64,

    #[serde(default = "default_exploration_default")]
    pub exploration_default: f64,

    #[serde(default = "default_novelty_bonus")]
    pub novelty_bonus: f64,

    #[serde(default = "default_series_novelty_bonus")]
    pub series_novelty_bonus: f64,

    #[serde(default = "default_era_bonus")]
    pub era_bonus: f64,

    /// Largest random sample pair selection looks at
    #[serde(default = "default_pair_sample_cap")]
    pub pair_sample_cap: usize,

    /// Partners examined per anchor during pair selection
    #[serde(default = "default_pair_window")]
    pub pair_window: usize,

    #[serde(default = "default_uncertainty_weight")]
    pub uncertainty_weight: f64,

    #[serde(default = "default_distance_weight")]
    pub distance_weight: f64,

    /// Recently shown items kept out of the next pair
    #[serde(default = "default_recent_window")]
    pub recent_window: usize,

    /// Enables the per-genre / per-director caps on served lists
    #[serde(default = "default_diversity_guard")]
    pub diversity_guard: bool,

    #[serde(default = "default_max_per_genre")]
    pub max_per_genre: usize,

    #[serde(default = "default_max_per_director")]
    pub max_per_director: usize,

    /// Fixed seed; when set, session seeds are derived from it
    #[serde(default)]
    pub rng_seed: Option<u64>,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_target_rounds() -> u32 {
    12
}

fn default_learning_rate() -> f64 {
    0.6
}

fn default_l2_penalty() -> f64 {
    0.01
}

fn default_mmr_lambda() -> f64 {
    0.7
}

fn default_exploration_min() -> f64 {
    0.02
}

fn default_exploration_max() -> f64 {
    0.45
}

fn default_exploration_default() -> f64 {
    0.15
}

fn default_novelty_bonus() -> f64 {
    0.08
}

fn default_series_novelty_bonus() -> f64 {
    0.04
}

fn default_era_bonus() -> f64 {
    0.3
}

fn default_pair_sample_cap() -> usize {
    120
}

fn default_pair_window() -> usize {
    26
}

fn default_uncertainty_weight() -> f64 {
    0.6
}

fn default_distance_weight() -> f64 {
    0.4
}

fn default_recent_window() -> usize {
    8
}

fn default_diversity_guard() -> bool {
    true
}

fn default_max_per_genre() -> usize {
    2
}

fn default_max_per_director() -> usize {
    1
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            catalogue_path: None,
            target_rounds: default_target_rounds(),
            learning_rate: default_learning_rate(),
            l2_penalty: default_l2_penalty(),
            mmr_lambda: default_mmr_lambda(),
            exploration_min: default_exploration_min(),
            exploration_max: default_exploration_max(),
            exploration_default: default_exploration_default(),
            novelty_bonus: default_novelty_bonus(),
            series_novelty_bonus: default_series_novelty_bonus(),
            era_bonus: default_era_bonus(),
            pair_sample_cap: default_pair_sample_cap(),
            pair_window: default_pair_window(),
            uncertainty_weight: default_uncertainty_weight(),
            distance_weight: default_distance_weight(),
            recent_window: default_recent_window(),
            diversity_guard: default_diversity_guard(),
            max_per_genre: default_max_per_genre(),
            max_per_director: default_max_per_director(),
            rng_seed: None,
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        let config = envy::from_env::<Config>()
            .map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects tunables the engine can't work with
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.target_rounds == 0 {
            anyhow::bail!("TARGET_ROUNDS must be at least 1");
        }
        if !(0.0..=1.0).contains(&self.mmr_lambda) {
            anyhow::bail!("MMR_LAMBDA must be within [0, 1], got {}", self.mmr_lambda);
        }
        if !(0.0..1.0).contains(&self.l2_penalty) {
            anyhow::bail!("L2_PENALTY must be within [0, 1), got {}", self.l2_penalty);
        }
        if !(self.learning_rate.is_finite() && self.learning_rate > 0.0) {
            anyhow::bail!("LEARNING_RATE must be positive and finite, got {}", self.learning_rate);
        }
        for (name, value) in [
            ("NOVELTY_BONUS", self.novelty_bonus),
            ("SERIES_NOVELTY_BONUS", self.series_novelty_bonus),
            ("ERA_BONUS", self.era_bonus),
            ("UNCERTAINTY_WEIGHT", self.uncertainty_weight),
            ("DISTANCE_WEIGHT", self.distance_weight),
        ] {
            if !value.is_finite() {
                anyhow::bail!("{} must be finite, got {}", name, value);
            }
        }
        if !(0.0 <= self.exploration_min
            && self.exploration_min <= self.exploration_default
            && self.exploration_default <= self.exploration_max
            && self.exploration_max <= 1.0)
        {
            anyhow::bail!(
                "Exploration bounds must satisfy 0 <= min <= default <= max <= 1 (got {}/{}/{})",
                self.exploration_min,
                self.exploration_default,
                self.exploration_max
            );
        }
        Ok(())
    }

    /// Engine tunables as used by every session
    pub fn engine(&self) -> EngineConfig {
        EngineConfig {
            target_rounds: self.target_rounds,
            update: UpdateParams {
                learning_rate: self.learning_rate,
                l2_penalty: self.l2_penalty,
            },
            pairs: PairSelectionParams {
                sample_cap: self.pair_sample_cap,
                window: self.pair_window,
                uncertainty_weight: self.uncertainty_weight,
                distance_weight: self.distance_weight,
            },
            scoring: ScoringParams {
                novelty_bonus: self.novelty_bonus,
                series_novelty_bonus: self.series_novelty_bonus,
                era_bonus: self.era_bonus,
            },
            mmr_lambda: self.mmr_lambda,
            guard: self.diversity_guard.then_some(DiversityGuard {
                max_per_genre: self.max_per_genre,
                max_per_director: self.max_per_director,
            }),
            exploration_min: self.exploration_min,
            exploration_max: self.exploration_max,
            exploration_default: self.exploration_default,
            recent_window: self.recent_window,
        }
    }
}

/// Tunables of the preference engine
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub target_rounds: u32,
    pub update: UpdateParams,
    pub pairs: PairSelectionParams,
    pub scoring: ScoringParams,
    pub mmr_lambda: f64,
    /// `None` disables the post-hoc genre/director caps
    pub guard: Option<DiversityGuard>,
    pub exploration_min: f64,
    pub exploration_max: f64,
    pub exploration_default: f64,
    pub recent_window: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Config::default().engine()
    }
}
