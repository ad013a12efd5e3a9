//! Catalogue snapshot and the sources that supply it
//!
//! The engine never fetches anything itself: a `CatalogueSource` is loaded up
//! front and turned into an immutable `Catalogue` whose feature vectors are
//! computed once and shared by every session holding the snapshot.

use std::collections::HashMap;
use std::path::PathBuf;

use tracing::instrument;

use crate::{
    error::{AppError, AppResult},
    models::{CatalogueItem, FeatureVector, ItemId},
    services::features::phi,
};

/// Immutable set of items with their cached feature vectors
#[derive(Debug, Clone, Default)]
pub struct Catalogue {
    items: Vec<CatalogueItem>,
    vectors: Vec<FeatureVector>,
    index: HashMap<ItemId, usize>,
}

impl Catalogue {
    /// Builds a snapshot, keeping the first occurrence of any duplicated id
    pub fn new(items: Vec<CatalogueItem>) -> Self {
        let mut kept = Vec::with_capacity(items.len());
        let mut index = HashMap::with_capacity(items.len());

        for item in items {
            if index.contains_key(&item.id) {
                tracing::warn!(item_id = %item.id, "Duplicate catalogue id ignored");
                continue;
            }
            index.insert(item.id.clone(), kept.len());
            kept.push(item);
        }

        let vectors = kept.iter().map(phi).collect();

        Self {
            items: kept,
            vectors,
            index,
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn items(&self) -> &[CatalogueItem] {
        &self.items
    }

    pub fn item(&self, idx: usize) -> &CatalogueItem {
        &self.items[idx]
    }

    pub fn vector(&self, idx: usize) -> &FeatureVector {
        &self.vectors[idx]
    }

    pub fn position(&self, id: &ItemId) -> Option<usize> {
        self.index.get(id).copied()
    }

    pub fn get(&self, id: &ItemId) -> Option<&CatalogueItem> {
        self.position(id).map(|idx| &self.items[idx])
    }
}

/// Trait for catalogue providers
///
/// Scraping, TMDb lookups and trailer resolution happen behind this seam;
/// implementations hand back plain `CatalogueItem`s.
#[async_trait::async_trait]
pub trait CatalogueSource: Send + Sync {
    /// Loads the full list of items
    async fn load(&self) -> AppResult<Vec<CatalogueItem>>;

    /// Source name for logging
    fn name(&self) -> &'static str;
}

/// Loads a source and builds a snapshot from it
#[instrument(skip(source), fields(source = source.name()))]
pub async fn load_catalogue(source: &dyn CatalogueSource) -> AppResult<Catalogue> {
    let items = source.load().await?;
    let catalogue = Catalogue::new(items);
    tracing::info!(items = catalogue.len(), "Catalogue loaded");
    Ok(catalogue)
}

/// Catalogue held in memory
#[derive(Debug, Clone, Default)]
pub struct StaticCatalogue {
    items: Vec<CatalogueItem>,
}

impl StaticCatalogue {
    pub fn new(items: Vec<CatalogueItem>) -> Self {
        Self { items }
    }
}

#[async_trait::async_trait]
impl CatalogueSource for StaticCatalogue {
    async fn load(&self) -> AppResult<Vec<CatalogueItem>> {
        Ok(self.items.clone())
    }

    fn name(&self) -> &'static str {
        "static"
    }
}

/// Catalogue stored as a JSON array of items on disk
#[derive(Debug, Clone)]
pub struct JsonFileCatalogue {
    path: PathBuf,
}

impl JsonFileCatalogue {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait::async_trait]
impl CatalogueSource for JsonFileCatalogue {
    async fn load(&self) -> AppResult<Vec<CatalogueItem>> {
        let raw = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            AppError::Catalogue(format!("Failed to read {}: {}", self.path.display(), e))
        })?;

        serde_json::from_str(&raw).map_err(|e| {
            AppError::Catalogue(format!("Invalid catalogue JSON in {}: {}", self.path.display(), e))
        })
    }

    fn name(&self) -> &'static str {
        "json_file"
    }
}
