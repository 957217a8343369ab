//! Shared application state for the service layer.
//!
//! [`AppState`] holds the run [`Orchestrator`] and the broadcast channel
//! that pushes tick results to `WebSocket` clients.

use std::sync::Arc;

use furrow_core::Orchestrator;
use furrow_types::{RunId, Scores, Season, ShockKind, TickSummary};
use tokio::sync::broadcast;

/// Capacity of the broadcast channel for tick summaries.
///
/// If a subscriber falls behind by more than this many messages it will
/// receive a [`broadcast::error::RecvError::Lagged`] and skip to the
/// newest message.
const BROADCAST_CAPACITY: usize = 256;

/// JSON-serializable tick result pushed over the `WebSocket`.
///
/// A projection of [`TickSummary`] without the layer grids, which stay
/// available through the REST layer endpoints.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TickBroadcast {
    /// The run that ticked.
    pub run_id: RunId,
    /// Turn counter after the tick.
    pub turn: u64,
    /// Year of the simulated season.
    pub year: i32,
    /// The simulated season.
    pub season: Season,
    /// Shock that fired, if any.
    pub shock: Option<ShockKind>,
    /// Crop revenue.
    pub income: f64,
    /// Operating cost.
    pub cost: f64,
    /// Cash after the tick.
    pub cash: f64,
    /// Smoothed scores after the tick.
    pub scores: Scores,
}

impl From<&TickSummary> for TickBroadcast {
    fn from(summary: &TickSummary) -> Self {
        Self {
            run_id: summary.run_id,
            turn: summary.turn,
            year: summary.year,
            season: summary.season,
            shock: summary.event.as_ref().map(|e| e.kind),
            income: summary.income,
            cost: summary.cost,
            cash: summary.cash,
            scores: summary.scores,
        }
    }
}

/// Shared state for the Axum application.
///
/// Wrapped in [`Arc`] and injected via Axum's `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Run operations.
    pub orchestrator: Arc<Orchestrator>,
    /// Broadcast sender for tick summary messages.
    pub tx: broadcast::Sender<TickBroadcast>,
}

impl AppState {
    /// Create application state around an orchestrator.
    pub fn new(orchestrator: Arc<Orchestrator>) -> Self {
        let (tx, _) = broadcast::channel(BROADCAST_CAPACITY);
        Self { orchestrator, tx }
    }

    /// Subscribe to the tick broadcast channel.
    pub fn subscribe(&self) -> broadcast::Receiver<TickBroadcast> {
        self.tx.subscribe()
    }

    /// Publish a tick summary to all connected clients.
    ///
    /// Returns the number of receivers that received the message, 0 if no
    /// clients are connected.
    pub fn broadcast(&self, summary: &TickBroadcast) -> usize {
        // send only fails when there are no receivers.
        self.tx.send(summary.clone()).unwrap_or(0)
    }
}
