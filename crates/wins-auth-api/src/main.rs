//! Export Wins API authentication server

use std::sync::Arc;

use anyhow::Context;
use tokio::signal;
use tracing::info;
use tracing_subscriber::EnvFilter;
use wins_auth_api::config::Settings;
use wins_auth_api::router::create_router;
use wins_auth_api::state::AppState;
use wins_auth_core::{MemoryNonceStore, NonceStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let settings = Settings::load().context("Failed to load settings")?;
    if settings.api_debug {
        tracing::warn!("API_DEBUG is set: caller signatures are not checked");
    }

    let nonces = nonce_store(&settings).await?;
    let state = AppState::from_settings(&settings, nonces).context("Invalid authentication settings")?;
    let app = create_router(state);

    let addr = format!("0.0.0.0:{}", settings.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    info!("Export Wins auth server listening on http://{}", addr);

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");

    Ok(())
}

/// `RUST_LOG` filters (default `info`); `LOG_FORMAT=json` switches to JSON lines.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(false);

    match std::env::var("LOG_FORMAT").as_deref() {
        Ok("json") => builder.json().init(),
        _ => builder.compact().init(),
    }
}

#[cfg(feature = "redis")]
async fn nonce_store(settings: &Settings) -> anyhow::Result<Arc<dyn NonceStore>> {
    if let Some(url) = settings.redis_url.as_deref() {
        let store = wins_auth_core::RedisNonceStore::connect(url)
            .await
            .context("Failed to connect to the nonce store")?;
        info!("Using Redis nonce store");
        return Ok(Arc::new(store));
    }
    Ok(memory_nonce_store(settings))
}

#[cfg(not(feature = "redis"))]
async fn nonce_store(settings: &Settings) -> anyhow::Result<Arc<dyn NonceStore>> {
    if settings.redis_url.is_some() {
        tracing::warn!("REDIS_URL is set but the redis feature is disabled; nonces stay in memory");
    }
    Ok(memory_nonce_store(settings))
}

fn memory_nonce_store(settings: &Settings) -> Arc<dyn NonceStore> {
    let store = Arc::new(MemoryNonceStore::new());
    store.start_purge_task(settings.nonce_purge_interval());
    store
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl-C, starting graceful shutdown..."),
        _ = terminate => info!("Received SIGTERM, starting graceful shutdown..."),
    }
}
