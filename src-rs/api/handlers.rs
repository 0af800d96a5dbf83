use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use serde_json::json;
use tokio::sync::broadcast;
use tracing::{debug, warn};

use crate::api::server::{FeedState, PublishedUpdate};
use crate::feed::{InvocationUpdate, InvocationsResponse};

#[derive(Debug, Deserialize)]
pub struct CommandQuery {
    #[serde(rename = "commandId")]
    pub command_id: String,
}

pub async fn handle_health() -> Json<serde_json::Value> {
    Json(json!({"status": "ok", "version": env!("CARGO_PKG_VERSION")}))
}

pub async fn handle_invocations(
    State(state): State<FeedState>,
    Query(query): Query<CommandQuery>,
) -> Response {
    match state.invocations(&query.command_id) {
        Some(invocations) => Json(InvocationsResponse { invocations }).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({"error": format!("unknown command: {}", query.command_id)})),
        )
            .into_response(),
    }
}

pub async fn handle_publish(
    State(state): State<FeedState>,
    Query(query): Query<CommandQuery>,
    Json(update): Json<InvocationUpdate>,
) -> Json<serde_json::Value> {
    let delivered = state.publish(&query.command_id, update);
    Json(json!({"delivered": delivered}))
}

pub async fn handle_stream(
    ws: WebSocketUpgrade,
    State(state): State<FeedState>,
    Query(query): Query<CommandQuery>,
) -> Response {
    // Subscribe before the upgrade completes so nothing published after the
    // client sees the handshake is missed.
    let updates = state.subscribe();
    ws.on_upgrade(move |socket| forward_updates(socket, updates, query.command_id))
}

async fn forward_updates(
    mut socket: WebSocket,
    mut updates: broadcast::Receiver<PublishedUpdate>,
    command_id: String,
) {
    debug!(%command_id, "live subscriber attached");
    loop {
        let published = match updates.recv().await {
            Ok(published) => published,
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                warn!(%command_id, skipped, "live subscriber lagged");
                continue;
            }
            Err(broadcast::error::RecvError::Closed) => break,
        };
        if published.command_id != command_id {
            continue;
        }
        let text = match serde_json::to_string(&published.update) {
            Ok(text) => text,
            Err(err) => {
                warn!(error = %err, "could not encode update");
                continue;
            }
        };
        if socket.send(Message::Text(text)).await.is_err() {
            break;
        }
    }
    let _ = socket.send(Message::Close(None)).await;
    debug!(%command_id, "live subscriber detached");
}
