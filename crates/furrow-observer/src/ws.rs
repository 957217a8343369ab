//! `WebSocket` handler for real-time tick streaming.
//!
//! Clients connect to `GET /ws/ticks` and receive a JSON-encoded
//! [`TickBroadcast`] each time a run ticks. `?run=<id>` narrows the stream
//! to one run. Lagged messages are skipped and the client resumes from
//! the most recent tick.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{Query, State, WebSocketUpgrade};
use axum::response::IntoResponse;
use furrow_types::RunId;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::ObserverError;
use crate::state::{AppState, TickBroadcast};

/// Query parameters for `GET /ws/ticks`.
#[derive(Debug, serde::Deserialize)]
pub struct TickStreamQuery {
    /// Only stream ticks of this run.
    pub run: Option<String>,
}

/// Upgrade an HTTP request to a `WebSocket` connection and begin
/// streaming tick summaries.
///
/// # Route
///
/// `GET /ws/ticks`
pub async fn ws_ticks(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    Query(params): Query<TickStreamQuery>,
) -> Result<impl IntoResponse, ObserverError> {
    let filter = params
        .run
        .as_deref()
        .map(|raw| {
            raw.parse::<Uuid>()
                .map(RunId::from)
                .map_err(|e| ObserverError::InvalidUuid(format!("{raw}: {e}")))
        })
        .transpose()?;
    Ok(ws.on_upgrade(move |socket| stream_ticks(socket, state, filter)))
}

/// Whether a broadcast passes the connection's run filter.
fn wanted(tick: &TickBroadcast, filter: Option<RunId>) -> bool {
    filter.is_none_or(|id| tick.run_id == id)
}

async fn stream_ticks(mut socket: WebSocket, state: Arc<AppState>, filter: Option<RunId>) {
    debug!(run_filter = ?filter, "Tick stream opened");

    let mut rx = state.subscribe();

    loop {
        tokio::select! {
            result = rx.recv() => match result {
                Ok(tick) if wanted(&tick, filter) => {
                    let json = match serde_json::to_string(&tick) {
                        Ok(j) => j,
                        Err(e) => {
                            warn!(error = %e, "Failed to encode tick");
                            continue;
                        }
                    };
                    if socket.send(Message::Text(json.into())).await.is_err() {
                        debug!("Tick stream closed by peer");
                        return;
                    }
                }
                Ok(_) => {}
                Err(RecvError::Lagged(n)) => {
                    debug!(skipped = n, "Tick stream lagged");
                }
                Err(RecvError::Closed) => return,
            },
            msg = socket.recv() => match msg {
                Some(Ok(Message::Ping(data))) => {
                    if socket.send(Message::Pong(data)).await.is_err() {
                        return;
                    }
                }
                Some(Ok(Message::Close(_)) | Err(_)) | None => {
                    debug!("Tick stream closed");
                    return;
                }
                // Inbound text and binary frames carry no commands.
                Some(Ok(_)) => {}
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use furrow_types::{Scores, Season};

    fn tick(run_id: RunId) -> TickBroadcast {
        TickBroadcast {
            run_id,
            turn: 1,
            year: 2014,
            season: Season::Spring,
            shock: None,
            income: 0.0,
            cost: 0.0,
            cash: 0.0,
            scores: Scores::default(),
        }
    }

    #[test]
    fn filter_matches_only_its_run() {
        let a = RunId::new();
        let b = RunId::new();
        assert!(wanted(&tick(a), None));
        assert!(wanted(&tick(a), Some(a)));
        assert!(!wanted(&tick(b), Some(a)));
    }
}
