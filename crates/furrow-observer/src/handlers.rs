//! REST API endpoint handlers.
//!
//! Handlers are thin: they parse and validate the request, call the
//! [`Orchestrator`](furrow_core::Orchestrator), and serialize the result.
//! Plan, run and financing payloads are validated here so the core only
//! ever sees well-formed updates.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET` | `/` | Minimal HTML status page |
//! | `GET` | `/healthz` | Liveness |
//! | `GET` | `/readyz` | Readiness (store reachable) |
//! | `GET` | `/api/catalog/crops` | Crop table |
//! | `GET` | `/api/catalog/infrastructure` | Infrastructure items (`?category=`) |
//! | `GET` | `/api/regions` | Regions |
//! | `GET` | `/api/runs` | Run ids |
//! | `POST` | `/api/runs` | Create a run |
//! | `POST` | `/api/runs/restore` | Restore a run from a snapshot |
//! | `GET` | `/api/runs/:id` | Run overview |
//! | `POST` | `/api/runs/:id/plan` | Apply a plan update to cells |
//! | `POST` | `/api/runs/:id/tick` | Advance one season |
//! | `GET` | `/api/runs/:id/layers/:layer` | Layer grid |
//! | `GET` | `/api/runs/:id/layers/:layer/image` | Layer as grayscale PNG (`?normalize=`) |
//! | `GET` | `/api/runs/:id/events` | Open season events |
//! | `POST` | `/api/runs/:id/events/:event_id/resolve` | Resolve an event |
//! | `POST` | `/api/runs/:id/finance/loan` | Take a loan |
//! | `POST` | `/api/runs/:id/finance/insure` | Buy a policy |
//! | `GET` | `/api/runs/:id/finance/report` | Finance report (`?year=`) |
//! | `GET` | `/api/runs/:id/snapshot` | Full snapshot |

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::{StatusCode, header};
use axum::response::{Html, IntoResponse};
use furrow_types::{
    EventId, GameSnapshot, InfraCategory, Layer, Normalization, PlanFields, PlanPatch, RunId,
    ShockKind,
};
use furrow_world::Raster;
use tracing::debug;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::error::ObserverError;
use crate::state::{AppState, TickBroadcast};

/// Longest accepted crop key.
const MAX_CROP_KEY_LEN: usize = 32;

/// Media type of rendered layer images.
const PNG_CONTENT_TYPE: &str = "image/png";

// ---------------------------------------------------------------------------
// Request payloads and query parameters
// ---------------------------------------------------------------------------

/// Body of `POST /api/runs`.
#[derive(Debug, serde::Deserialize, Validate)]
pub struct NewRunRequest {
    /// Region code from the catalog.
    #[validate(length(min = 1, max = 64))]
    pub region: String,
    /// Seed; the configured default when absent.
    pub seed: Option<u64>,
}

/// Body of `POST /api/runs/:id/plan`.
#[derive(Debug, serde::Deserialize, Validate)]
pub struct PlanRequest {
    /// Linear cell indices (`y * size + x`) to update.
    #[validate(length(min = 1, max = 65536))]
    pub cells: Vec<usize>,
    /// The update, tagged by `kind`.
    #[validate(custom(function = "validate_patch"))]
    pub patch: PlanPatch,
}

/// Body of `POST /api/runs/:id/finance/loan`.
#[derive(Debug, serde::Deserialize, Validate)]
pub struct LoanRequest {
    /// Amount to borrow.
    #[validate(range(min = 1.0, max = 1_000_000_000.0))]
    pub amount: f64,
    /// Seasons over which to repay.
    #[validate(range(min = 1, max = 100))]
    pub term_seasons: u32,
}

/// Body of `POST /api/runs/:id/finance/insure`.
#[derive(Debug, serde::Deserialize, Validate)]
pub struct InsureRequest {
    /// Shock kind to cover.
    pub coverage: ShockKind,
    /// Payout when the covered shock fires.
    #[validate(range(min = 1.0, max = 1_000_000_000.0))]
    pub sum_insured: f64,
}

/// Query parameters for `GET /api/catalog/infrastructure`.
#[derive(Debug, serde::Deserialize)]
pub struct InfrastructureQuery {
    /// Only items of this category.
    pub category: Option<InfraCategory>,
}

/// Query parameters for `GET /api/runs/:id/layers/:layer/image`.
#[derive(Debug, serde::Deserialize)]
pub struct ImageQuery {
    /// Value-to-intensity mapping (default `clip`).
    pub normalize: Option<Normalization>,
}

/// Query parameters for `GET /api/runs/:id/finance/report`.
#[derive(Debug, serde::Deserialize)]
pub struct ReportQuery {
    /// Restrict the report to one year.
    pub year: Option<i32>,
}

/// Crop keys are short lowercase identifiers.
fn validate_patch(patch: &PlanPatch) -> Result<(), ValidationError> {
    if let PlanPatch::Crops { crop } = patch {
        let key = crop.as_str();
        let well_formed = !key.is_empty()
            && key.len() <= MAX_CROP_KEY_LEN
            && key
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_');
        if !well_formed {
            return Err(ValidationError::new("crop_key"));
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// GET / -- minimal HTML status page
// ---------------------------------------------------------------------------

/// Serve a minimal HTML page listing runs, catalog sizes and API links.
pub async fn index(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let catalog = state.orchestrator.catalog();
    let grid_size = state.orchestrator.defaults().grid_size;
    let runs = state.orchestrator.run_ids().unwrap_or_default();

    let mut run_rows = String::new();
    for id in &runs {
        run_rows.push_str(&format!(
            "<tr><td><a href=\"/api/runs/{id}\">{id}</a></td>\
             <td><a href=\"/api/runs/{id}/layers/ndvi/image\">ndvi.png</a></td></tr>\n"
        ));
    }

    Html(format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>Furrow</title>
<style>
body {{ font-family: system-ui, sans-serif; background: #f6f4ee; color: #2d2a24; margin: 2rem auto; max-width: 760px; }}
h1 {{ color: #4d7c0f; }}
table {{ border-collapse: collapse; width: 100%; }}
td, th {{ border-bottom: 1px solid #d6d3c4; padding: 0.35rem 0.5rem; text-align: left; }}
code {{ background: #ebe7da; padding: 0 0.25rem; }}
</style>
</head>
<body>
<h1>Furrow</h1>
<p>{crops} crops, {regions} regions, {grid_size}x{grid_size} grids, {run_count} runs.</p>
<h2>Runs</h2>
<table>
<tr><th>Run</th><th>NDVI</th></tr>
{run_rows}</table>
<h2>API</h2>
<p>
<a href="/api/catalog/crops">crops</a> |
<a href="/api/catalog/infrastructure">infrastructure</a> |
<a href="/api/regions">regions</a> |
<a href="/api/runs">runs</a>
</p>
<p>Live ticks: <code>/ws/ticks</code> (optionally <code>?run=&lt;id&gt;</code>).</p>
</body>
</html>"#,
        crops = catalog.crops.len(),
        regions = catalog.regions.len(),
        run_count = runs.len(),
    ))
}

// ---------------------------------------------------------------------------
// Health
// ---------------------------------------------------------------------------

/// Liveness check.
pub async fn healthz() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

/// Readiness check: the run store answers.
pub async fn readyz(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ObserverError> {
    let runs = state.orchestrator.run_ids()?;
    Ok(Json(serde_json::json!({
        "status": "ready",
        "runs": runs.len(),
    })))
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

/// The crop table keyed by crop name.
pub async fn list_crops(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.orchestrator.catalog().crops.clone())
}

/// Infrastructure items, optionally filtered by category.
pub async fn list_infrastructure(
    State(state): State<Arc<AppState>>,
    Query(params): Query<InfrastructureQuery>,
) -> Result<impl IntoResponse, ObserverError> {
    let items = state.orchestrator.catalog().infrastructure(params.category);
    Ok(Json(serde_json::json!({
        "count": items.len(),
        "items": serde_json::to_value(items)?,
    })))
}

/// Regions with display names and seasonal baselines.
pub async fn list_regions(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let regions: Vec<serde_json::Value> = state
        .orchestrator
        .catalog()
        .regions
        .iter()
        .map(|(code, spec)| {
            serde_json::json!({
                "code": code,
                "display_name": spec.display_name,
                "seasonal_rain": spec.seasonal_rain,
                "seasonal_temp": spec.seasonal_temp,
            })
        })
        .collect();
    Json(serde_json::json!({
        "count": regions.len(),
        "regions": regions,
    }))
}

// ---------------------------------------------------------------------------
// Runs
// ---------------------------------------------------------------------------

/// List run ids.
pub async fn list_runs(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ObserverError> {
    let runs = state.orchestrator.run_ids()?;
    Ok(Json(serde_json::json!({
        "count": runs.len(),
        "runs": runs,
    })))
}

/// Create a run.
pub async fn create_run(
    State(state): State<Arc<AppState>>,
    Json(body): Json<NewRunRequest>,
) -> Result<impl IntoResponse, ObserverError> {
    body.validate()?;
    let overview = state.orchestrator.new_run(&body.region, body.seed)?;
    Ok((StatusCode::CREATED, Json(overview)))
}

/// Overview of one run.
pub async fn get_run(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ObserverError> {
    let run_id = parse_run_id(&id)?;
    Ok(Json(state.orchestrator.overview(run_id)?))
}

/// Apply one plan update to a list of cells.
pub async fn apply_plan(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(body): Json<PlanRequest>,
) -> Result<impl IntoResponse, ObserverError> {
    let run_id = parse_run_id(&id)?;
    body.validate()?;
    let fields = PlanFields::from(body.patch);
    let report = state.orchestrator.apply_plan(run_id, &body.cells, &fields)?;
    debug!(run_id = %run_id, applied = report.applied, ignored = report.ignored.len(), "Plan request handled");
    Ok(Json(report))
}

/// Advance a run one season and broadcast the result.
pub async fn tick_run(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ObserverError> {
    let run_id = parse_run_id(&id)?;
    let summary = state.orchestrator.tick(run_id)?;
    let receivers = state.broadcast(&TickBroadcast::from(&summary));
    debug!(run_id = %run_id, receivers, "Tick broadcast");
    Ok(Json(summary))
}

/// One layer as a 2D array.
pub async fn get_layer(
    State(state): State<Arc<AppState>>,
    Path((id, layer)): Path<(String, String)>,
) -> Result<impl IntoResponse, ObserverError> {
    let run_id = parse_run_id(&id)?;
    let layer = parse_layer(&layer)?;
    Ok(Json(state.orchestrator.layer(run_id, layer)?))
}

/// One layer rendered as a grayscale PNG image.
pub async fn get_layer_image(
    State(state): State<Arc<AppState>>,
    Path((id, layer)): Path<(String, String)>,
    Query(params): Query<ImageQuery>,
) -> Result<impl IntoResponse, ObserverError> {
    let run_id = parse_run_id(&id)?;
    let layer = parse_layer(&layer)?;
    let grid = state.orchestrator.layer(run_id, layer)?;
    let raster = Raster::from_grid(&grid, params.normalize.unwrap_or_default());
    let png = raster
        .to_png()
        .map_err(|e| ObserverError::Internal(e.to_string()))?;
    Ok(([(header::CONTENT_TYPE, PNG_CONTENT_TYPE)], png))
}

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// Open season events of a run.
pub async fn list_events(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ObserverError> {
    let run_id = parse_run_id(&id)?;
    let events = state.orchestrator.events(run_id)?;
    Ok(Json(serde_json::json!({
        "count": events.len(),
        "events": events,
    })))
}

/// Resolve (acknowledge and remove) one event.
pub async fn resolve_event(
    State(state): State<Arc<AppState>>,
    Path((id, event_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, ObserverError> {
    let run_id = parse_run_id(&id)?;
    let event_id = EventId::from(parse_uuid(&event_id)?);
    Ok(Json(state.orchestrator.resolve_event(run_id, event_id)?))
}

// ---------------------------------------------------------------------------
// Financing
// ---------------------------------------------------------------------------

/// Take a loan.
pub async fn take_loan(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(body): Json<LoanRequest>,
) -> Result<impl IntoResponse, ObserverError> {
    let run_id = parse_run_id(&id)?;
    body.validate()?;
    let loan = state
        .orchestrator
        .take_loan(run_id, body.amount, body.term_seasons)?;
    Ok((StatusCode::CREATED, Json(loan)))
}

/// Buy an insurance policy.
pub async fn insure(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(body): Json<InsureRequest>,
) -> Result<impl IntoResponse, ObserverError> {
    let run_id = parse_run_id(&id)?;
    body.validate()?;
    let policy = state
        .orchestrator
        .insure(run_id, body.coverage, body.sum_insured)?;
    Ok((StatusCode::CREATED, Json(policy)))
}

/// Ledger summary, optionally for one year.
pub async fn finance_report(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(params): Query<ReportQuery>,
) -> Result<impl IntoResponse, ObserverError> {
    let run_id = parse_run_id(&id)?;
    Ok(Json(state.orchestrator.finance_report(run_id, params.year)?))
}

// ---------------------------------------------------------------------------
// Snapshots
// ---------------------------------------------------------------------------

/// Full snapshot of a run.
pub async fn get_snapshot(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ObserverError> {
    let run_id = parse_run_id(&id)?;
    Ok(Json(state.orchestrator.snapshot(run_id)?))
}

/// Restore a run from a snapshot.
pub async fn restore_snapshot(
    State(state): State<Arc<AppState>>,
    Json(snapshot): Json<GameSnapshot>,
) -> Result<impl IntoResponse, ObserverError> {
    Ok((StatusCode::CREATED, Json(state.orchestrator.restore(snapshot)?)))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Parse a UUID string from a path parameter.
fn parse_uuid(s: &str) -> Result<Uuid, ObserverError> {
    s.parse::<Uuid>()
        .map_err(|e| ObserverError::InvalidUuid(format!("{s}: {e}")))
}

fn parse_run_id(s: &str) -> Result<RunId, ObserverError> {
    parse_uuid(s).map(RunId::from)
}

fn parse_layer(name: &str) -> Result<Layer, ObserverError> {
    Layer::from_name(name).ok_or_else(|| {
        ObserverError::InvalidQuery(format!(
            "unknown layer {name}, expected one of ndvi, moisture, salinity, fertility"
        ))
    })
}
