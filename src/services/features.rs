use crate::models::{normalize_tag, CatalogueItem, FeatureVector, FEATURE_DIM};

/// Release year at or after which a title counts as recent
pub const RECENCY_CUTOFF_YEAR: i32 = 2020;

const COMEDY: usize = 0;
const DRAMA: usize = 1;
const ACTION: usize = 2;
const THRILLER: usize = 3;
const SCI_FI: usize = 4;
const FANTASY: usize = 5;
const DOCUMENTARY: usize = 6;
const LIGHT: usize = 7;
const DARK: usize = 8;
const FAST: usize = 9;
const SLOW: usize = 10;
/// Slot holding the recency flag
pub const RECENT: usize = 11;

/// Genre clusters: (slot, normalized tags)
const CLUSTERS: &[(usize, &[&str])] = &[
    (COMEDY, &["comedy", "romance", "romantic comedy", "romcom", "musical"]),
    (DRAMA, &["drama", "biography", "history"]),
    (ACTION, &["action", "adventure", "war", "western"]),
    (THRILLER, &["thriller", "mystery", "crime", "horror", "suspense"]),
    (SCI_FI, &["sci fi", "science fiction", "scifi"]),
    (FANTASY, &["fantasy", "animation", "family"]),
    (DOCUMENTARY, &["documentary", "docuseries"]),
];

/// Composite scores as weighted sums of cluster flags: (slot, [(cluster, weight)])
const COMPOSITES: &[(usize, &[(usize, f64)])] = &[
    (LIGHT, &[(COMEDY, 0.6), (FANTASY, 0.5), (DOCUMENTARY, 0.2)]),
    (DARK, &[(THRILLER, 0.7), (DRAMA, 0.3), (ACTION, 0.2)]),
    (FAST, &[(ACTION, 0.7), (THRILLER, 0.4), (SCI_FI, 0.3)]),
    (SLOW, &[(DRAMA, 0.7), (DOCUMENTARY, 0.5)]),
];

/// Maps a catalogue item to its 12-slot feature vector.
///
/// Total and deterministic: unknown genres and a missing year simply leave
/// their slots at zero.
pub fn phi(item: &CatalogueItem) -> FeatureVector {
    let mut values = vec![0.0; FEATURE_DIM];
    let tags: Vec<String> = item.genres.iter().map(|g| normalize_tag(g)).collect();

    for (slot, members) in CLUSTERS {
        if tags.iter().any(|t| members.contains(&t.as_str())) {
            values[*slot] = 1.0;
        }
    }

    for (slot, weights) in COMPOSITES {
        let sum: f64 = weights.iter().map(|(cluster, w)| values[*cluster] * w).sum();
        values[*slot] = sum.clamp(0.0, 1.0);
    }

    if item.year.is_some_and(|y| y >= RECENCY_CUTOFF_YEAR) {
        values[RECENT] = 1.0;
    }

    FeatureVector::new(values)
}

/// True when the recency flag of `vector` is set
pub fn is_recent(vector: &FeatureVector) -> bool {
    vector.get(RECENT) > 0.5
}
