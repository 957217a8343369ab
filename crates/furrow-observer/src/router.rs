//! Axum router construction.
//!
//! Assembles all routes (REST + `WebSocket`) into a single [`Router`]
//! with CORS middleware enabled for cross-origin dashboard access.

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;
use crate::ws;

/// Build the complete Axum router.
///
/// See [`handlers`] for the endpoint table. `GET /ws/ticks` streams
/// every tick as JSON.
///
/// CORS is configured to allow any origin for development. In
/// production this should be restricted.
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Status page and health checks
        .route("/", get(handlers::index))
        .route("/healthz", get(handlers::healthz))
        .route("/readyz", get(handlers::readyz))
        // WebSocket
        .route("/ws/ticks", get(ws::ws_ticks))
        // Catalog
        .route("/api/catalog/crops", get(handlers::list_crops))
        .route(
            "/api/catalog/infrastructure",
            get(handlers::list_infrastructure),
        )
        .route("/api/regions", get(handlers::list_regions))
        // Runs
        .route(
            "/api/runs",
            get(handlers::list_runs).post(handlers::create_run),
        )
        .route("/api/runs/restore", post(handlers::restore_snapshot))
        .route("/api/runs/{id}", get(handlers::get_run))
        .route("/api/runs/{id}/plan", post(handlers::apply_plan))
        .route("/api/runs/{id}/tick", post(handlers::tick_run))
        .route("/api/runs/{id}/layers/{layer}", get(handlers::get_layer))
        .route(
            "/api/runs/{id}/layers/{layer}/image",
            get(handlers::get_layer_image),
        )
        .route("/api/runs/{id}/events", get(handlers::list_events))
        .route(
            "/api/runs/{id}/events/{event_id}/resolve",
            post(handlers::resolve_event),
        )
        .route("/api/runs/{id}/finance/loan", post(handlers::take_loan))
        .route("/api/runs/{id}/finance/insure", post(handlers::insure))
        .route(
            "/api/runs/{id}/finance/report",
            get(handlers::finance_report),
        )
        .route("/api/runs/{id}/snapshot", get(handlers::get_snapshot))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
