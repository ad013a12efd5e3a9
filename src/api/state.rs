use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::config::EngineConfig;
use crate::error::{AppError, AppResult};
use crate::services::{Catalogue, SessionController};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub inner: Arc<RwLock<AppStateInner>>,
    pub engine: Arc<EngineConfig>,
}

/// Inner state that can be modified.
///
/// Holding the write lock serializes updates to a session, so a session's
/// weight vector never sees two writers at once.
pub struct AppStateInner {
    pub catalogue: Arc<Catalogue>,
    /// Live sessions. Entries are only removed by `DELETE /sessions/:id`;
    /// there is no expiry, so abandoned sessions stay until restart.
    pub sessions: HashMap<Uuid, SessionEntry>,
    base_seed: Option<u64>,
    sessions_created: u64,
}

/// A live session with bookkeeping timestamps
pub struct SessionEntry {
    pub controller: SessionController,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SessionEntry {
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(Catalogue::default(), EngineConfig::default(), None)
    }
}

impl AppState {
    /// Creates application state serving `catalogue`
    pub fn new(catalogue: Catalogue, engine: EngineConfig, base_seed: Option<u64>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(AppStateInner {
                catalogue: Arc::new(catalogue),
                sessions: HashMap::new(),
                base_seed,
                sessions_created: 0,
            })),
            engine: Arc::new(engine),
        }
    }
}

impl AppStateInner {
    /// Registers a new session over the current catalogue snapshot.
    ///
    /// An explicit seed wins; otherwise seeds derive from the configured base
    /// seed, or come from entropy when none is configured.
    pub fn create_session(&mut self, engine: &EngineConfig, seed: Option<u64>) -> (Uuid, &SessionEntry) {
        let seed = seed.unwrap_or_else(|| match self.base_seed {
            Some(base) => base.wrapping_add(self.sessions_created),
            None => rand::random(),
        });
        self.sessions_created += 1;

        let id = Uuid::new_v4();
        let now = Utc::now();
        let entry = SessionEntry {
            controller: SessionController::new(self.catalogue.clone(), engine.clone(), seed),
            created_at: now,
            updated_at: now,
        };
        let entry = self.sessions.entry(id).or_insert(entry);
        (id, entry)
    }

    pub fn session(&self, id: &Uuid) -> AppResult<&SessionEntry> {
        self.sessions
            .get(id)
            .ok_or_else(|| AppError::NotFound(format!("session {}", id)))
    }

    pub fn session_mut(&mut self, id: &Uuid) -> AppResult<&mut SessionEntry> {
        self.sessions
            .get_mut(id)
            .ok_or_else(|| AppError::NotFound(format!("session {}", id)))
    }

    /// Swaps the catalogue for new sessions; live sessions keep their snapshot
    pub fn replace_catalogue(&mut self, catalogue: Catalogue) {
        self.catalogue = Arc::new(catalogue);
    }
}
