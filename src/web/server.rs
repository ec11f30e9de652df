use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    Router,
    body::Body,
    extract::Request,
    http::{StatusCode, header},
    response::{Html, IntoResponse},
};
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;

use super::api::{self, AppState};
use super::embedded::Assets;
use crate::board::YamlBoardStore;
use crate::config::ServerConfig;
use crate::discovery::BoardDiscovery;

/// Build the full application router with API and SPA serving.
pub fn build_router(state: Arc<AppState>) -> Router {
    api::api_router().fallback(static_handler).with_state(state)
}

/// Serve embedded static files or fall back to index.html for SPA routing.
async fn static_handler(req: Request<Body>) -> impl IntoResponse {
    let path = req.uri().path().trim_start_matches('/');

    if !path.is_empty() {
        if let Some(content) = Assets::get(path) {
            let mime = mime_guess::from_path(path).first_or_octet_stream();
            return (
                [(header::CONTENT_TYPE, mime.as_ref().to_string())],
                content.data.into_owned(),
            )
                .into_response();
        }
    }

    match Assets::get("index.html") {
        Some(content) => Html(String::from_utf8_lossy(&content.data).into_owned()).into_response(),
        None => (StatusCode::NOT_FOUND, "Frontend not found in ui/dist.").into_response(),
    }
}

/// Build shared state for a configuration.
pub fn build_state(config: &ServerConfig) -> Result<Arc<AppState>> {
    let discovery = BoardDiscovery::new(&config.working_root, config.cache_ttl).with_context(|| {
        format!(
            "Failed to open working directory {}",
            config.working_root.display()
        )
    })?;

    Ok(Arc::new(AppState {
        discovery: Arc::new(discovery),
        boards: Arc::new(YamlBoardStore),
        recursive_default: config.recursive_default,
    }))
}

/// Bind the listener for a configuration.
pub async fn bind(config: &ServerConfig) -> Result<TcpListener> {
    let addr = config.bind_addr();
    TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))
}

/// Serve on an already-bound listener until Ctrl+C.
pub async fn serve(
    listener: TcpListener,
    state: Arc<AppState>,
    config: &ServerConfig,
) -> Result<()> {
    let mut app = build_router(state.clone());

    if config.dev_mode {
        app = app.layer(CorsLayer::permissive());
    }

    let local_addr = listener.local_addr()?;
    println!("KnBn server running at http://{}", local_addr);
    tracing::info!(
        addr = %local_addr,
        cwd = %state.discovery.working_root().display(),
        cache_ttl_ms = config.cache_ttl.as_millis() as u64,
        "server started"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    println!("Server shut down gracefully.");
    Ok(())
}

/// Start the server: build state, bind, open the browser, serve.
///
/// Nothing is bound and no browser is opened unless the working root can be
/// served.
pub async fn start_server(config: ServerConfig) -> Result<()> {
    let state = build_state(&config)?;
    let listener = bind(&config).await?;

    // Skip in dev mode (no browser inside containers)
    if config.open_browser && !config.dev_mode {
        open_browser_later(format!("http://localhost:{}", listener.local_addr()?.port()));
    }

    serve(listener, state, &config).await
}

fn open_browser_later(url: String) {
    tokio::spawn(async move {
        tokio::time::sleep(tokio::time::Duration::from_millis(500)).await;
        if let Err(e) = open::that(&url) {
            tracing::debug!(error = %e, "browser launch failed");
            println!(
                "Note: Could not automatically open browser. Please visit {} manually.",
                url
            );
        }
    });
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to install Ctrl+C handler");
        std::future::pending::<()>().await;
    }
    println!("\nShutting down...");
}
