//! HTTP adapters - router assembly, errors and middleware.

pub mod error;
pub mod middleware;

use axum::Router;
use tower_http::trace::TraceLayer;

use crate::adapters::websocket::{websocket_router, WebSocketState};

pub use error::ApiError;
pub use middleware::{access_token_middleware, AccessTokenAuth};

/// Builds the application router: WebSocket routes behind the access token
/// check, with request tracing.
pub fn app_router(state: WebSocketState, auth: AccessTokenAuth) -> Router {
    websocket_router()
        .layer(axum::middleware::from_fn_with_state(auth, access_token_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
