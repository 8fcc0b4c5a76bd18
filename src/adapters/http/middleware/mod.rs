//! HTTP middleware for axum.
//!
//! - `auth` - Access token check in front of the WebSocket routes

pub mod auth;

pub use auth::{access_token_middleware, AccessTokenAuth, ACCESS_TOKEN_HEADER, QUERY_TOKEN_PARAM};
