//! WebSocket upgrade handler for realtime event subscriptions.
//!
//! Handles the HTTP → WebSocket upgrade and manages the connection lifecycle:
//! 1. Make sure the event hub is running
//! 2. Upgrade to WebSocket
//! 3. Send `ready` and register with an empty subscription
//! 4. Apply `subscriptions.set` commands until disconnect
//! 5. Unregister and close

use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::{IntoResponse, Response},
};
use futures::{Stream, StreamExt};

use crate::adapters::http::ApiError;

use super::{
    hub::EventHub,
    messages::{binary_frame_rejection, parse_command, ServerMessage},
    registry::ClientConnection,
};

/// Default cap on one inbound frame.
pub const DEFAULT_MAX_MESSAGE_BYTES: usize = 64 * 1024;

/// State required for WebSocket handling.
#[derive(Clone)]
pub struct WebSocketState {
    pub hub: Arc<EventHub>,
    pub max_message_bytes: usize,
}

impl WebSocketState {
    pub fn new(hub: Arc<EventHub>) -> Self {
        Self {
            hub,
            max_message_bytes: DEFAULT_MAX_MESSAGE_BYTES,
        }
    }

    pub fn with_max_message_bytes(mut self, max_message_bytes: usize) -> Self {
        self.max_message_bytes = max_message_bytes;
        self
    }
}

/// Handle WebSocket upgrade requests.
///
/// Routes: `GET /v1/ws`, `GET /ws`
///
/// Fails with 500 `INTERNAL_ERROR` when the hub cannot subscribe to the
/// chat client.
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<WebSocketState>) -> Response {
    if let Err(e) = state.hub.ensure_started().await {
        tracing::error!(error = %e, "Rejecting WebSocket upgrade, event hub unavailable");
        return ApiError::from(e).into_response();
    }

    let hub = state.hub.clone();
    ws.max_message_size(state.max_message_bytes)
        .on_upgrade(move |socket| handle_socket(socket, hub))
}

async fn handle_socket(socket: WebSocket, hub: Arc<EventHub>) {
    let (sender, receiver) = socket.split();
    let connection = hub.new_connection(Box::new(sender));
    serve_connection(&hub, connection, receiver).await;
}

/// Runs one connection from handshake to close.
///
/// Returns once the client closes, a read fails or a reply cannot be
/// written. The connection is always unregistered and closed on exit.
pub(crate) async fn serve_connection<S>(
    hub: &EventHub,
    connection: Arc<ClientConnection>,
    mut receiver: S,
) where
    S: Stream<Item = Result<Message, axum::Error>> + Unpin,
{
    let id = connection.id();

    if let Err(e) = connection.send_json(&ServerMessage::ready()).await {
        tracing::debug!(connection_id = %id, error = %e, "Failed to send ready message");
        connection.close().await;
        return;
    }
    hub.register(connection.clone()).await;

    while let Some(result) = receiver.next().await {
        let reply = match result {
            Ok(Message::Text(text)) => match parse_command(&text) {
                Ok(command) => {
                    hub.set_subscription(&id, command.subscription.clone()).await;
                    ServerMessage::subscriptions_updated(command.request_id, &command.subscription)
                }
                Err(rejection) => {
                    tracing::debug!(
                        connection_id = %id,
                        code = %rejection.error.code,
                        "Rejected client command"
                    );
                    rejection.to_server_message()
                }
            },
            Ok(Message::Binary(_)) => binary_frame_rejection().to_server_message(),
            Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => continue,
            Ok(Message::Close(_)) => {
                tracing::debug!(connection_id = %id, "Client sent close frame");
                break;
            }
            Err(e) => {
                tracing::debug!(connection_id = %id, error = %e, "Receive error");
                break;
            }
        };

        if let Err(e) = connection.send_json(&reply).await {
            tracing::debug!(connection_id = %id, error = %e, "Send error, closing connection");
            break;
        }
    }

    hub.disconnect(&id).await;
}

/// Create axum router for the WebSocket endpoints.
///
/// # Example
///
/// ```ignore
/// let app = websocket_router().with_state(WebSocketState::new(hub));
/// ```
pub fn websocket_router() -> axum::Router<WebSocketState> {
    use axum::routing::get;

    axum::Router::new()
        .route("/v1/ws", get(ws_handler))
        .route("/ws", get(ws_handler))
}
