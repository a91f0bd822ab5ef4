//! Axum server exposing the reconstruction engine to the frontend.
//!
//! REST routes serve the read-only output contract (snapshots, playback,
//! live state, audit trail). Two WebSocket routes carry the live side:
//! `/ws/ingest` is where the external simulation transport delivers event
//! messages, `/ws/watch` pushes the refreshed state to viewers. Each
//! inbound message is decoded, folded, and recorded under one write lock
//! before the next is taken; arrival order is the only order.

use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Path, State,
    },
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, RwLock};
use tower_http::cors::CorsLayer;
use tracing::{debug, info, warn};

use meshtrace_engine::{LiveFeed, NetworkState, SnapshotEntry, SnapshotHistory, TrailEntry};

use crate::error::Result;
use crate::playback::{Playback, PlaybackSpeed, PlaybackStatus};

/// Capacity of the viewer broadcast channel. A viewer that lags this far
/// behind skips to the newest state.
const WATCH_CHANNEL_CAPACITY: usize = 64;

/// Shared application state.
pub struct AppState {
    replay: RwLock<Playback>,
    live: RwLock<LiveFeed>,
    watch: broadcast::Sender<String>,
}

/// Visualization server.
pub struct VisServer {
    state: Arc<AppState>,
}

impl VisServer {
    /// Create a server around an initial (possibly empty) history.
    pub fn new(history: SnapshotHistory) -> Self {
        let (watch, _) = broadcast::channel(WATCH_CHANNEL_CAPACITY);
        Self {
            state: Arc::new(AppState {
                replay: RwLock::new(Playback::new(history)),
                live: RwLock::new(LiveFeed::new()),
                watch,
            }),
        }
    }

    /// Build the router for the server.
    pub fn router(&self) -> Router {
        Router::new()
            // API routes
            .route("/api/status", get(status_handler))
            .route("/api/log", post(upload_log_handler))
            .route("/api/snapshot", get(snapshot_handler))
            .route("/api/snapshot/{index}", get(snapshot_at_handler))
            .route("/api/playback", get(playback_status_handler))
            .route("/api/playback/play", post(play_handler))
            .route("/api/playback/pause", post(pause_handler))
            .route("/api/playback/stop", post(stop_handler))
            .route("/api/playback/seek", post(seek_handler))
            .route("/api/playback/speed", post(speed_handler))
            .route("/api/playback/step", post(step_handler))
            .route("/api/live", get(live_handler))
            .route("/api/live/trail", get(trail_handler))
            // WebSocket routes
            .route("/ws/ingest", get(ws_ingest_handler))
            .route("/ws/watch", get(ws_watch_handler))
            .layer(CorsLayer::permissive())
            .with_state(self.state.clone())
    }

    /// Run the server on the given port.
    pub async fn serve(self, port: u16) -> Result<()> {
        let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
        let listener = tokio::net::TcpListener::bind(addr).await?;
        info!("visualization server running on http://localhost:{}", port);
        axum::serve(listener, self.router()).await?;
        Ok(())
    }
}

/// Server status response.
#[derive(Serialize)]
struct StatusResponse {
    status: &'static str,
    replay_ticks: usize,
    replay_diagnostics: usize,
    live_nodes: usize,
    live_trail: usize,
}

async fn status_handler(State(state): State<Arc<AppState>>) -> Json<StatusResponse> {
    let replay = state.replay.read().await;
    let live = state.live.read().await;
    Json(StatusResponse {
        status: "ok",
        replay_ticks: replay.total_frames(),
        replay_diagnostics: replay.history().diagnostics().len(),
        live_nodes: live.state().len(),
        live_trail: live.trail().len(),
    })
}

/// Supplying a new log discards the prior history in its entirety and
/// rebuilds from the empty state; the playback cursor returns to zero.
async fn upload_log_handler(
    State(state): State<Arc<AppState>>,
    log_text: String,
) -> Json<PlaybackStatus> {
    let history = SnapshotHistory::build(&log_text);
    info!(ticks = history.len(), "rebuilt snapshot history from new log");

    let mut replay = state.replay.write().await;
    *replay = Playback::new(history);
    Json(PlaybackStatus::from(&*replay))
}

async fn snapshot_handler(State(state): State<Arc<AppState>>) -> Json<Option<SnapshotEntry>> {
    let replay = state.replay.read().await;
    Json(replay.current_snapshot().cloned())
}

async fn snapshot_at_handler(
    State(state): State<Arc<AppState>>,
    Path(index): Path<usize>,
) -> std::result::Result<Json<SnapshotEntry>, StatusCode> {
    let replay = state.replay.read().await;
    replay
        .history()
        .at(index)
        .cloned()
        .map(Json)
        .ok_or(StatusCode::NOT_FOUND)
}

async fn playback_status_handler(State(state): State<Arc<AppState>>) -> Json<PlaybackStatus> {
    let replay = state.replay.read().await;
    Json(PlaybackStatus::from(&*replay))
}

async fn play_handler(State(state): State<Arc<AppState>>) -> Json<PlaybackStatus> {
    let mut replay = state.replay.write().await;
    replay.play();
    Json(PlaybackStatus::from(&*replay))
}

async fn pause_handler(State(state): State<Arc<AppState>>) -> Json<PlaybackStatus> {
    let mut replay = state.replay.write().await;
    replay.pause();
    Json(PlaybackStatus::from(&*replay))
}

async fn stop_handler(State(state): State<Arc<AppState>>) -> Json<PlaybackStatus> {
    let mut replay = state.replay.write().await;
    replay.stop();
    Json(PlaybackStatus::from(&*replay))
}

#[derive(Deserialize)]
struct SeekRequest {
    frame: usize,
}

async fn seek_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SeekRequest>,
) -> Json<PlaybackStatus> {
    let mut replay = state.replay.write().await;
    replay.seek(req.frame);
    Json(PlaybackStatus::from(&*replay))
}

#[derive(Deserialize)]
struct SpeedRequest {
    speed: PlaybackSpeed,
}

async fn speed_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SpeedRequest>,
) -> Json<PlaybackStatus> {
    let mut replay = state.replay.write().await;
    replay.set_speed(req.speed);
    Json(PlaybackStatus::from(&*replay))
}

#[derive(Deserialize)]
struct StepRequest {
    direction: String, // "forward" or "backward"
}

async fn step_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<StepRequest>,
) -> Json<PlaybackStatus> {
    let mut replay = state.replay.write().await;
    match req.direction.as_str() {
        "forward" => {
            replay.step_forward();
        }
        "backward" => {
            replay.step_backward();
        }
        _ => {}
    }
    Json(PlaybackStatus::from(&*replay))
}

async fn live_handler(State(state): State<Arc<AppState>>) -> Json<NetworkState> {
    let live = state.live.read().await;
    Json(live.state().clone())
}

async fn trail_handler(State(state): State<Arc<AppState>>) -> Json<Vec<TrailEntry>> {
    let live = state.live.read().await;
    Json(live.trail().to_vec())
}

/// Update pushed to `/ws/watch` subscribers.
#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum WatchUpdate<'a> {
    State { nodes: &'a NetworkState },
}

fn state_frame(nodes: &NetworkState) -> Option<String> {
    serde_json::to_string(&WatchUpdate::State { nodes }).ok()
}

async fn ws_ingest_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_ingest(socket, state))
}

/// Apply transport-delivered live messages strictly in arrival order.
///
/// The engine never resets on reconnect: a fresh connection simply keeps
/// folding into the existing current state.
async fn handle_ingest(mut socket: WebSocket, state: Arc<AppState>) {
    info!("live transport connected");
    while let Some(Ok(msg)) = socket.recv().await {
        match msg {
            Message::Text(text) => {
                // One message handled to completion under one write lock;
                // the next cannot interleave.
                let mut live = state.live.write().await;
                if live.ingest(&text) {
                    debug!(nodes = live.state().len(), "applied live message");
                    if let Some(frame) = state_frame(live.state()) {
                        let _ = state.watch.send(frame);
                    }
                }
            }
            Message::Close(_) => break,
            _ => {}
        }
    }
    info!("live transport disconnected");
}

async fn ws_watch_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_watch(socket, state))
}

/// Stream live-state updates to one viewer until it disconnects.
async fn handle_watch(mut socket: WebSocket, state: Arc<AppState>) {
    let mut updates = state.watch.subscribe();

    // Initial frame so the viewer renders before the next event arrives.
    let initial = {
        let live = state.live.read().await;
        state_frame(live.state())
    };
    if let Some(frame) = initial {
        if socket.send(Message::Text(frame.into())).await.is_err() {
            return;
        }
    }

    loop {
        tokio::select! {
            update = updates.recv() => match update {
                Ok(frame) => {
                    if socket.send(Message::Text(frame.into())).await.is_err() {
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "viewer lagged behind live updates");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
            inbound = socket.recv() => match inbound {
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                _ => {}
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_creation() {
        let _server = VisServer::new(SnapshotHistory::build(""));
    }

    #[test]
    fn router_builds() {
        let server = VisServer::new(SnapshotHistory::build(""));
        let _router = server.router();
    }

    #[test]
    fn upload_replaces_the_history() {
        tokio_test::block_on(async {
            let server = VisServer::new(SnapshotHistory::build(
                "[sim] Created new node ID: old, x: 0, y: 0\n",
            ));
            let state = server.state.clone();

            let status = upload_log_handler(
                State(state.clone()),
                "[sim] Created new node ID: A, x: 0, y: 0\n\
                 [sim] Created new node ID: B, x: 1, y: 1\n"
                    .to_string(),
            )
            .await;

            assert_eq!(status.0.total_frames, 2);
            assert_eq!(status.0.current_frame, 0);

            let replay = state.replay.read().await;
            assert!(!replay.history().latest().unwrap().state.contains("old"));
        });
    }

    #[test]
    fn snapshot_by_index_is_bounds_checked() {
        tokio_test::block_on(async {
            let server =
                VisServer::new(SnapshotHistory::build("[sim] Created new node ID: A, x: 0, y: 0\n"));
            let state = server.state.clone();

            let found = snapshot_at_handler(State(state.clone()), Path(0)).await;
            assert!(found.is_ok());

            let missing = snapshot_at_handler(State(state), Path(5)).await;
            assert_eq!(missing.err(), Some(StatusCode::NOT_FOUND));
        });
    }

    #[test]
    fn live_messages_fold_through_the_shared_state() {
        tokio_test::block_on(async {
            let server = VisServer::new(SnapshotHistory::build(""));
            let state = server.state.clone();

            {
                let mut live = state.live.write().await;
                assert!(live.ingest(r#"{"type":"NODE_JOINED","node_id":"A","x":2.0,"y":4.0}"#));
                assert!(!live.ingest(r#"{"type":"NODE_JOINED","node_id":"B","x":"NaN","y":0}"#));
            }

            let live = state.live.read().await;
            assert_eq!(live.state().len(), 1);
            assert_eq!(live.trail().len(), 2);
        });
    }
}
