use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::sync::broadcast;

use crate::auth::jwt::authenticate;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct WsQuery {
    token: Option<String>,
}

/// Browsers cannot set headers on the upgrade request, so the access token
/// travels in the query string.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Query(query): Query<WsQuery>,
) -> Response {
    let Some(token) = query.token.as_deref() else {
        tracing::warn!("WebSocket auth failed: missing token query parameter");
        return (StatusCode::UNAUTHORIZED, "Unauthorized").into_response();
    };

    let user_id = match authenticate(token, &state.config) {
        Ok(id) => id,
        Err(e) => {
            tracing::warn!(error = %e, "WebSocket auth failed");
            return (StatusCode::UNAUTHORIZED, "Unauthorized").into_response();
        }
    };

    let Some(rx) = state.ws_tx.as_ref().map(|tx| tx.subscribe()) else {
        return (StatusCode::SERVICE_UNAVAILABLE, "Live updates disabled").into_response();
    };

    ws.on_upgrade(move |socket| handle_socket(socket, rx, user_id))
}

async fn handle_socket(socket: WebSocket, mut rx: broadcast::Receiver<String>, user_id: String) {
    let (mut sender, mut receiver) = socket.split();

    tracing::debug!(user_id = %user_id, "WebSocket connection established");

    let uid = user_id.clone();
    let mut send_task = tokio::spawn(async move {
        loop {
            let msg = match rx.recv().await {
                Ok(msg) => msg,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::debug!(user_id = %uid, skipped, "WebSocket client lagging");
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => break,
            };
            if !is_for_user(&msg, &uid) {
                continue;
            }
            if sender.send(Message::Text(msg)).await.is_err() {
                break;
            }
        }
    });

    let recv_uid = user_id.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = receiver.next().await {
            match msg {
                Message::Text(text) => {
                    tracing::debug!(user_id = %recv_uid, message = %text, "WebSocket message received");
                }
                Message::Close(_) => break,
                _ => {}
            }
        }
    });

    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }

    tracing::debug!(user_id = %user_id, "WebSocket connection closed");
}

/// Events carrying a `user_id` only reach that user.
fn is_for_user(msg: &str, user_id: &str) -> bool {
    match serde_json::from_str::<serde_json::Value>(msg) {
        Ok(parsed) => match parsed.get("user_id").and_then(|v| v.as_str()) {
            Some(target) => target == user_id,
            None => true,
        },
        Err(_) => true,
    }
}
