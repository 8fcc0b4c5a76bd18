//! Authentication configuration

use serde::Deserialize;
use std::fmt;

use super::error::ValidationError;
use super::server::Environment;

/// Access token settings for the WebSocket routes.
#[derive(Clone, Deserialize, Default)]
pub struct AuthConfig {
    /// Shared access token; routes are open when unset
    pub access_token: Option<String>,

    /// Accept the token in the `dangerouslyUseTokenInQuery` query parameter
    #[serde(default)]
    pub allow_query_token: bool,
}

impl AuthConfig {
    /// The configured token, ignoring blank values.
    pub fn token(&self) -> Option<&str> {
        self.access_token
            .as_deref()
            .map(str::trim)
            .filter(|token| !token.is_empty())
    }

    /// Validate authentication configuration
    ///
    /// Production deployments must configure a token.
    pub fn validate(&self, environment: &Environment) -> Result<(), ValidationError> {
        if *environment == Environment::Production && self.token().is_none() {
            return Err(ValidationError::MissingRequired("AUTH__ACCESS_TOKEN"));
        }
        Ok(())
    }
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("access_token", &self.token().map(|_| "[REDACTED]"))
            .field("allow_query_token", &self.allow_query_token)
            .finish()
    }
}
