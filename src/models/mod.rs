mod feature_vector;
mod preference_state;
mod title;

pub use feature_vector::{FeatureVector, FEATURE_DIM};
pub use preference_state::{PreferenceState, TasteFacets};
pub use title::{normalize_tag, CatalogueItem, ItemId, TitleKind, Vote};
