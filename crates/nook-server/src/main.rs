mod config;

use std::sync::Arc;

use axum::{Router, extract::DefaultBodyLimit};
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use nook_api::{AppStateInner, build_router};
use nook_store::{DEFAULT_URL_PREFIX, DiskBlobStore, JsonDirBackend};

use crate::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "nook=debug,nook_api=debug,nook_store=info,tower_http=debug".into()
            }),
        )
        .init();

    let config = Config::from_env()?;

    // Init storage
    let backend = Arc::new(JsonDirBackend::open(&config.data_dir)?);
    let blobs = Arc::new(DiskBlobStore::open(&config.uploads_dir, DEFAULT_URL_PREFIX)?);
    let state = Arc::new(AppStateInner::new(backend, blobs, config.password_mode));
    state.init()?;

    let mut app = Router::new()
        .merge(build_router(state))
        .nest_service(DEFAULT_URL_PREFIX, ServeDir::new(&config.uploads_dir));

    if config.public_dir.is_dir() {
        info!("Serving static assets from {}", config.public_dir.display());
        app = app.fallback_service(ServeDir::new(&config.public_dir));
    }

    let app = app
        .layer(DefaultBodyLimit::max(config.max_upload_bytes))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr = config.bind_addr()?;
    info!("Nook server listening on {}", addr);
    info!("Password mode: {}", config.password_mode);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();
    #[cfg(unix)]
    {
        let mut sigterm =
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(signal) => signal,
                Err(e) => {
                    warn!("Failed to install SIGTERM handler: {}", e);
                    ctrl_c.await.ok();
                    info!("Received Ctrl+C, shutting down...");
                    return;
                }
            };
        tokio::select! {
            _ = ctrl_c => info!("Received Ctrl+C, shutting down..."),
            _ = sigterm.recv() => info!("Received SIGTERM, shutting down..."),
        }
    }
    #[cfg(not(unix))]
    {
        ctrl_c.await.ok();
        info!("Received Ctrl+C, shutting down...");
    }
}
