//! WebSocket transport for streaming sessions with backpressure support.

use std::sync::atomic::{AtomicI64, Ordering};

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, State};
use axum::response::IntoResponse;
use dashcam_models::{ClientId, InboundMessage, OutboundMessage};
use futures_util::{Sink, SinkExt, Stream, StreamExt};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::error::SessionError;
use crate::metrics;
use crate::session::run_session;
use crate::state::AppState;

/// Global counter for active WebSocket connections.
static ACTIVE_WS_CONNECTIONS: AtomicI64 = AtomicI64::new(0);

/// WebSocket session endpoint.
///
/// The client id is validated by the path extractor before the upgrade, so
/// malformed ids are refused with 400.
pub async fn ws_session(
    Path(client_id): Path<ClientId>,
    State(state): State<AppState>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    let count = ACTIVE_WS_CONNECTIONS.fetch_add(1, Ordering::SeqCst) + 1;
    metrics::set_ws_active_connections(count);
    metrics::record_ws_connection();

    ws.max_message_size(state.config.max_message_size)
        .on_upgrade(move |socket| async move {
            handle_socket(socket, client_id, state).await;
            let count = ACTIVE_WS_CONNECTIONS.fetch_sub(1, Ordering::SeqCst) - 1;
            metrics::set_ws_active_connections(count);
        })
}

/// Map raw socket messages to session input.
///
/// Control frames are absorbed; a close frame or transport error becomes a
/// disconnect.
pub fn inbound_messages<S, E>(receiver: S) -> impl Stream<Item = Result<InboundMessage, SessionError>>
where
    S: Stream<Item = Result<Message, E>>,
    E: std::fmt::Display,
{
    receiver.filter_map(|msg| async move {
        match msg {
            Ok(Message::Text(text)) => Some(
                InboundMessage::from_json(&text)
                    .map_err(|e| SessionError::protocol(e.to_string())),
            ),
            Ok(Message::Binary(_)) => Some(Err(SessionError::protocol(
                "binary messages are not supported",
            ))),
            Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => None,
            Ok(Message::Close(_)) => Some(Err(SessionError::Disconnected)),
            Err(e) => {
                debug!(error = %e, "WebSocket receive failed");
                Some(Err(SessionError::Disconnected))
            }
        }
    })
}

fn encode(message: &OutboundMessage) -> Option<Message> {
    match serde_json::to_string(message) {
        Ok(json) => Some(Message::Text(json)),
        Err(e) => {
            warn!(error = %e, "Failed to serialize outbound message");
            None
        }
    }
}

/// Handle one session socket.
async fn handle_socket(socket: WebSocket, client_id: ClientId, state: AppState) {
    let (ws_sender, receiver) = socket.split();
    serve_connection(ws_sender, receiver, client_id, state).await;
}

/// Serve one connection over a split socket.
///
/// A client id that already has an active session gets a single `error`
/// message before the sender is closed; the active session is untouched.
pub async fn serve_connection<W, R, E>(ws_sender: W, receiver: R, client_id: ClientId, state: AppState)
where
    W: Sink<Message> + Unpin + Send + 'static,
    R: Stream<Item = Result<Message, E>>,
    E: std::fmt::Display,
{
    // Create a bounded channel for backpressure
    let (tx, mut rx) = mpsc::channel::<OutboundMessage>(state.config.outbound_buffer);

    // Spawn a task to drain outbound messages to the socket
    let send_task = tokio::spawn(async move {
        let mut ws_sender = ws_sender;
        while let Some(message) = rx.recv().await {
            let Some(frame) = encode(&message) else {
                continue;
            };
            if ws_sender.send(frame).await.is_err() {
                break;
            }
            metrics::record_ws_message_sent(message.message_type().as_str());
        }
        let _ = ws_sender.close().await;
    });

    match state.registry.connect(client_id.clone(), tx.clone()) {
        Ok(handle) => {
            drop(tx);
            let outcome = run_session(
                handle,
                &state.settings,
                state.sinks.as_ref(),
                state.codec.as_ref(),
                inbound_messages(receiver),
            )
            .await;
            info!(client_id = %client_id, outcome = outcome.label(), "WebSocket session ended");
        }
        Err(e) => {
            warn!(client_id = %client_id, "Rejected connection: {}", e);
            let _ = tx.send(OutboundMessage::error(e.to_string())).await;
            drop(tx);
        }
    }

    let _ = send_task.await;
}
