//! Access token middleware for axum.
//!
//! When a token is configured, requests must present it through one of:
//!
//! ```text
//! Authorization: Bearer <token>
//! X-Beeper-Access-Token: <token>
//! ?dangerouslyUseTokenInQuery=<token>     (only when enabled)
//! ```
//!
//! Without a configured token every request passes.
//!
//! # Example
//!
//! ```ignore
//! let auth = AccessTokenAuth::new(Some("secret"), false);
//! let app = Router::new()
//!     .route("/v1/ws", get(ws_handler))
//!     .layer(middleware::from_fn_with_state(auth, access_token_middleware));
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{Query, Request, State},
    http::{HeaderMap, Uri},
    middleware::Next,
    response::{IntoResponse, Response},
};
use secrecy::{ExposeSecret, SecretString};
use subtle::ConstantTimeEq;

use crate::adapters::http::ApiError;

/// Header carrying the access token without the bearer scheme.
pub const ACCESS_TOKEN_HEADER: &str = "X-Beeper-Access-Token";

/// Query parameter carrying the access token.
pub const QUERY_TOKEN_PARAM: &str = "dangerouslyUseTokenInQuery";

/// Auth middleware state.
#[derive(Clone)]
pub struct AccessTokenAuth {
    token: Option<Arc<SecretString>>,
    allow_query_token: bool,
}

impl AccessTokenAuth {
    pub fn new(token: Option<&str>, allow_query_token: bool) -> Self {
        Self {
            token: token.map(|t| Arc::new(SecretString::new(t.to_string()))),
            allow_query_token,
        }
    }

    /// Auth state that lets every request through.
    pub fn disabled() -> Self {
        Self::new(None, false)
    }

    pub fn is_enabled(&self) -> bool {
        self.token.is_some()
    }

    /// Checks the presented token in constant time.
    pub fn authorize(&self, headers: &HeaderMap, uri: &Uri) -> Result<(), ApiError> {
        let Some(expected) = self.token.as_ref() else {
            return Ok(());
        };
        let presented = extract_token(headers, uri, self.allow_query_token)
            .ok_or_else(ApiError::unauthorized)?;
        let matches: bool = presented
            .as_bytes()
            .ct_eq(expected.expose_secret().as_bytes())
            .into();
        if matches {
            Ok(())
        } else {
            Err(ApiError::unauthorized())
        }
    }
}

/// Rejects requests without a valid access token.
pub async fn access_token_middleware(
    State(auth): State<AccessTokenAuth>,
    request: Request,
    next: Next,
) -> Response {
    match auth.authorize(request.headers(), request.uri()) {
        Ok(()) => next.run(request).await,
        Err(rejection) => {
            tracing::debug!(path = %request.uri().path(), "Rejected request without valid token");
            rejection.into_response()
        }
    }
}

fn extract_token(headers: &HeaderMap, uri: &Uri, allow_query_token: bool) -> Option<String> {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
    };

    if let Some(bearer) = header("Authorization").and_then(|v| v.strip_prefix("Bearer ")) {
        return Some(bearer.trim().to_string());
    }
    if let Some(token) = header(ACCESS_TOKEN_HEADER) {
        return Some(token.to_string());
    }
    if allow_query_token {
        return query_param(uri, QUERY_TOKEN_PARAM);
    }
    None
}

fn query_param(uri: &Uri, name: &str) -> Option<String> {
    let Query(params) = Query::<HashMap<String, String>>::try_from_uri(uri).ok()?;
    params
        .get(name)
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
