use serde::{Deserialize, Serialize};

/// Number of slots in the canonical feature scheme
pub const FEATURE_DIM: usize = 12;

/// Numeric encoding of a catalogue item.
///
/// Kept as a newtype so vectors from different schemes can't be mixed up
/// with plain weight slices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureVector(Vec<f64>);

impl FeatureVector {
    pub fn new(values: Vec<f64>) -> Self {
        Self(values)
    }

    pub fn zeros() -> Self {
        Self(vec![0.0; FEATURE_DIM])
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, slot: usize) -> f64 {
        self.0.get(slot).copied().unwrap_or(0.0)
    }
}

impl AsRef<[f64]> for FeatureVector {
    fn as_ref(&self) -> &[f64] {
        &self.0
    }
}
