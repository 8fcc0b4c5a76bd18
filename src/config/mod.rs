//! Application configuration module
//!
//! This module provides type-safe configuration loading from environment variables
//! using the `config` and `dotenvy` crates. Configuration is loaded with the
//! `BEEPER_API` prefix and nested values use double underscores as separators.
//!
//! # Example
//!
//! ```no_run
//! use beeper_realtime::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//!
//! println!("Server running on {:?}", config.server.socket_addr());
//! ```

mod auth;
mod error;
mod realtime;
mod replay;
mod server;

pub use auth::AuthConfig;
pub use error::{ConfigError, ValidationError};
pub use realtime::RealtimeConfig;
pub use replay::ReplayConfig;
pub use server::{Environment, LogFormat, ServerConfig};

use serde::Deserialize;

use crate::adapters::websocket::{DedupSettings, HubSettings};

/// Root application configuration
///
/// Every section has defaults, so an empty environment yields a working
/// local-development configuration.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    /// Server configuration (host, port, environment, logging)
    #[serde(default)]
    pub server: ServerConfig,

    /// Access token for the WebSocket routes
    #[serde(default)]
    pub auth: AuthConfig,

    /// Event hub tunables
    #[serde(default)]
    pub realtime: RealtimeConfig,

    /// Optional replay feed
    #[serde(default)]
    pub replay: ReplayConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// This function:
    /// 1. Loads `.env` file if present (for development)
    /// 2. Reads environment variables with `BEEPER_API` prefix
    /// 3. Uses `__` (double underscore) to separate nested values
    /// 4. Deserializes into typed configuration structs
    ///
    /// # Environment Variable Format
    ///
    /// - `BEEPER_API__SERVER__PORT=23373` -> `server.port = 23373`
    /// - `BEEPER_API__REALTIME__EVENT_QUEUE_CAPACITY=1024` -> `realtime.event_queue_capacity = 1024`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if values cannot be parsed into expected types.
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if present (development)
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("BEEPER_API")
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if any configuration value is invalid.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        self.auth.validate(&self.server.environment)?;
        self.realtime.validate()?;
        Ok(())
    }

    /// Check if running in production environment
    pub fn is_production(&self) -> bool {
        self.server.is_production()
    }

    /// Hub settings derived from the realtime section.
    pub fn hub_settings(&self) -> HubSettings {
        let realtime = &self.realtime;
        HubSettings {
            queue_capacity: realtime.event_queue_capacity,
            keepalive_interval: realtime.keepalive_interval(),
            ping_timeout: realtime.ping_timeout(),
            write_timeout: realtime.write_timeout(),
            dedup: DedupSettings {
                debounce: realtime.duplicate_debounce(),
                retention: realtime.fingerprint_retention(),
                prune_interval: realtime.fingerprint_prune_interval(),
            },
        }
    }
}
