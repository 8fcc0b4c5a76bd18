//! beeper-realtime - WebSocket server for realtime chat events

use std::sync::Arc;

use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use beeper_realtime::adapters::http::{app_router, AccessTokenAuth};
use beeper_realtime::adapters::{
    EventHub, InMemoryChatStore, InMemorySyncSource, MessageHydrator, ReplayFeed, WebSocketState,
};
use beeper_realtime::config::{AppConfig, LogFormat, ServerConfig};

/// Account owner used by the in-memory store until a chat client is attached.
const LOCAL_USER_ID: &str = "@local:beeper.com";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    config.validate()?;
    init_tracing(&config.server);

    let store = Arc::new(InMemoryChatStore::new(LOCAL_USER_ID));
    let source = Arc::new(InMemorySyncSource::new());
    let hydrator = Arc::new(MessageHydrator::new(store.clone()));
    let hub = Arc::new(EventHub::new(source.clone(), hydrator, config.hub_settings()));

    if let Some(path) = config.replay.path.clone() {
        hub.ensure_started().await?;
        let feed = ReplayFeed::new(store, source);
        tokio::spawn(async move {
            if let Err(e) = feed.replay_file(&path).await {
                tracing::error!(path = %path.display(), error = %e, "Replay failed");
            }
        });
    }

    let state = WebSocketState::new(hub.clone())
        .with_max_message_bytes(config.realtime.max_message_bytes);
    let auth = AccessTokenAuth::new(config.auth.token(), config.auth.allow_query_token);
    if !auth.is_enabled() {
        tracing::warn!("No access token configured, WebSocket routes are open");
    }
    let app = app_router(state, auth);

    let addr = config.server.socket_addr()?;
    info!(%addr, environment = ?config.server.environment, "Starting server");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    hub.shutdown().await;
    Ok(())
}

fn init_tracing(server: &ServerConfig) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| server.log_level.clone().into());

    let registry = tracing_subscriber::registry().with(env_filter);
    match server.log_format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
