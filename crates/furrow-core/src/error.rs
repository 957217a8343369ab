//! Error types for run management.

use furrow_types::{EventId, RunId};

use crate::store::StoreError;

/// Errors returned by run operations.
///
/// A tick on a valid run never fails; these cover lookups, concurrent
/// access, snapshot restoration and malformed requests.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// No run exists with this id.
    #[error("run not found: {0}")]
    RunNotFound(RunId),

    /// Another tick or plan update is in flight for this run.
    #[error("run {0} is busy")]
    RunBusy(RunId),

    /// No event with this id is open on the run.
    #[error("event not found: {0}")]
    EventNotFound(EventId),

    /// A catalog or grid error (unknown region, bad grid size, bad cells).
    #[error("world error: {source}")]
    World {
        /// The underlying world error.
        #[from]
        source: furrow_world::WorldError,
    },

    /// A snapshot could not be restored.
    #[error("invalid snapshot: {reason}")]
    InvalidSnapshot {
        /// What is wrong with it.
        reason: String,
    },

    /// A request carried unusable values.
    #[error("invalid request: {reason}")]
    InvalidRequest {
        /// What is wrong with it.
        reason: String,
    },

    /// The run store failed.
    #[error("store error: {source}")]
    Store {
        /// The underlying store error.
        #[from]
        source: StoreError,
    },
}

impl CoreError {
    /// Shorthand for [`CoreError::InvalidRequest`].
    pub fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidRequest {
            reason: reason.into(),
        }
    }
}
