//! HTTP server module for serve mode.
//!
//! Exposes the lineage pipeline over a small REST API. Query text posted to
//! the API (or read from a watched file) goes through the update coordinator;
//! clients poll the latest published graph.

pub mod api;
pub mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::http::{header, HeaderValue, Method};
use axum::Router;
use tower_http::cors::CorsLayer;
use tracing::warn;

use crate::watch;

pub use state::{AppState, GraphState, GraphView, ServerConfig};

/// Run the HTTP server.
///
/// This function blocks until the server is shut down (e.g., via Ctrl+C).
pub async fn run_server(config: ServerConfig) -> Result<()> {
    let state = Arc::new(AppState::start(config.clone()));

    let watcher_handle = config.watch_file.clone().map(|path| {
        let watcher_state = Arc::clone(&state);
        println!("ctegraph: watching {}", path.display());
        tokio::spawn(async move {
            if let Err(e) = watch::watch_file(&path, &watcher_state.coordinator).await {
                eprintln!("ctegraph: watcher error: {e:#}");
            }
        })
    });

    let app = build_router(state, config.port);

    let addr = SocketAddr::from(([127, 0, 0, 1], config.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    println!("ctegraph: server listening on http://{addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    if let Some(handle) = watcher_handle {
        handle.abort();
    }
    println!("\nctegraph: server stopped");

    Ok(())
}

/// Build the main router with all routes.
pub fn build_router(state: Arc<AppState>, port: u16) -> Router {
    // Only pages served from this machine may read the API.
    let allowed_origins: Vec<HeaderValue> = [
        format!("http://localhost:{port}"),
        format!("http://127.0.0.1:{port}"),
    ]
    .iter()
    .filter_map(|origin| HeaderValue::from_str(origin).ok())
    .collect();

    let cors = CorsLayer::new()
        .allow_origin(allowed_origins)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .nest("/api", api::api_routes())
        .with_state(state)
        .layer(cors)
}

/// Wait for shutdown signal (Ctrl+C).
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to install Ctrl+C handler");
        std::future::pending::<()>().await;
    }
}
