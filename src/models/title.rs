use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// External identifier of a catalogue title (e.g. IMDb "tt0133093")
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(pub String);

impl ItemId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for ItemId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ItemId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TitleKind {
    #[default]
    Movie,
    Series,
    Short,
}

impl TitleKind {
    /// Series and shorts count as short-form content for the novelty bonus
    pub fn is_short_form(&self) -> bool {
        !matches!(self, TitleKind::Movie)
    }
}

/// A movie or show as handed over by the catalogue source.
///
/// Everything except `id` and `title` is optional; missing fields map to
/// zeroed features rather than errors.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CatalogueItem {
    pub id: ItemId,
    pub title: String,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub genres: Vec<String>,
    #[serde(default)]
    pub kind: TitleKind,
    #[serde(default)]
    pub popularity: Option<f64>,
    #[serde(default)]
    pub vote_average: Option<f64>,
    #[serde(default)]
    pub vote_count: Option<u32>,
    #[serde(default)]
    pub actors: Vec<String>,
    #[serde(default)]
    pub director: Option<String>,
}

impl CatalogueItem {
    /// Creates a bare movie entry
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: ItemId::new(id),
            title: title.into(),
            year: None,
            genres: Vec::new(),
            kind: TitleKind::Movie,
            popularity: None,
            vote_average: None,
            vote_count: None,
            actors: Vec::new(),
            director: None,
        }
    }

    pub fn with_year(mut self, year: i32) -> Self {
        self.year = Some(year);
        self
    }

    pub fn with_genres(mut self, genres: &[&str]) -> Self {
        self.genres = genres.iter().map(|g| g.to_string()).collect();
        self
    }

    pub fn with_kind(mut self, kind: TitleKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_director(mut self, director: impl Into<String>) -> Self {
        self.director = Some(director.into());
        self
    }

    pub fn with_actors(mut self, actors: &[&str]) -> Self {
        self.actors = actors.iter().map(|a| a.to_string()).collect();
        self
    }

    /// First listed genre, normalized; used by the per-genre diversity cap
    pub fn top_genre(&self) -> Option<String> {
        self.genres
            .iter()
            .map(|g| normalize_tag(g))
            .find(|g| !g.is_empty())
    }

    /// Decade label such as "1990s"
    pub fn era_bucket(&self) -> Option<String> {
        self.year.map(|y| format!("{}s", y.div_euclid(10) * 10))
    }
}

/// Lowercases a free-form tag and folds `-`, `_` and repeated spaces into single spaces
pub fn normalize_tag(tag: &str) -> String {
    tag.to_lowercase()
        .replace(['-', '_'], " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// A forced-choice vote: the user preferred `winner_id` over `loser_id`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Vote {
    pub winner_id: ItemId,
    pub loser_id: ItemId,
}

impl Vote {
    pub fn new(winner: impl Into<String>, loser: impl Into<String>) -> Self {
        Self {
            winner_id: ItemId::new(winner),
            loser_id: ItemId::new(loser),
        }
    }
}
