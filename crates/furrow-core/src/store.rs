//! Run storage.
//!
//! The orchestrator never holds runs itself: it reads and writes them
//! through a [`RunStore`] handed to it at construction. The in-memory store
//! is the default backend; anything keyed by [`RunId`] that can hand back an
//! owned [`GameState`] fits behind the trait.

use std::collections::BTreeMap;
use std::sync::RwLock;

use furrow_types::RunId;

use crate::state::GameState;

/// Errors raised by a storage backend.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A lock guarding the store was poisoned by a panicking writer.
    #[error("run store lock poisoned: {0}")]
    Poisoned(String),

    /// The backend failed.
    #[error("run store backend error: {0}")]
    Backend(String),
}

/// Keyed storage of run states.
pub trait RunStore: Send + Sync {
    /// Fetch a copy of a run, or `None` if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] if the backend fails.
    fn get(&self, id: &RunId) -> Result<Option<GameState>, StoreError>;

    /// Insert or replace a run.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] if the backend fails.
    fn put(&self, state: GameState) -> Result<(), StoreError>;

    /// Ids of all stored runs.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] if the backend fails.
    fn run_ids(&self) -> Result<Vec<RunId>, StoreError>;
}

/// Process-local store backed by a map.
#[derive(Debug, Default)]
pub struct InMemoryRunStore {
    runs: RwLock<BTreeMap<RunId, GameState>>,
}

impl InMemoryRunStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl RunStore for InMemoryRunStore {
    fn get(&self, id: &RunId) -> Result<Option<GameState>, StoreError> {
        let runs = self.runs.read().map_err(|e| StoreError::Poisoned(e.to_string()))?;
        Ok(runs.get(id).cloned())
    }

    fn put(&self, state: GameState) -> Result<(), StoreError> {
        let mut runs = self.runs.write().map_err(|e| StoreError::Poisoned(e.to_string()))?;
        runs.insert(state.id, state);
        Ok(())
    }

    fn run_ids(&self) -> Result<Vec<RunId>, StoreError> {
        let runs = self.runs.read().map_err(|e| StoreError::Poisoned(e.to_string()))?;
        Ok(runs.keys().copied().collect())
    }
}
