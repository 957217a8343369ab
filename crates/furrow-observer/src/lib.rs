//! HTTP and `WebSocket` service layer for the Furrow simulation.
//!
//! This crate provides an Axum HTTP server that exposes:
//!
//! - **REST endpoints** for the catalog, run creation, plan updates,
//!   ticks, layers (JSON and PNG), events, financing and snapshots
//! - **`WebSocket` endpoint** (`/ws/ticks`) streaming every tick via
//!   [`tokio::sync::broadcast`]
//! - **Minimal HTML status page** (`GET /`)
//!
//! # Architecture
//!
//! Handlers validate payloads and delegate to the shared
//! [`Orchestrator`](furrow_core::Orchestrator). Core errors map to HTTP
//! statuses in [`error`]: unknown runs are 404, busy runs 409, malformed
//! input 400 or 422.

pub mod error;
pub mod handlers;
pub mod router;
pub mod startup;
pub mod state;
pub mod ws;

// Re-export primary types for convenience.
pub use error::ObserverError;
pub use router::build_router;
pub use startup::{ServerConfig, StartupError, spawn_server};
pub use state::{AppState, TickBroadcast};
