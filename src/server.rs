use axum::{routing::get, Router};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{limit::RequestBodyLimitLayer, trace::TraceLayer};

use crate::config::Config;
use crate::handlers::{default_route, fallback, list_files, preflight, socket, upload_files};
use crate::middleware::allow_any_origin;
use crate::state::AppState;
use crate::utils::shutdown_signal;

/// build the api router
pub fn build_router(state: Arc<AppState>, config: &Config) -> Router {
    tracing::debug!("Building router with max upload size: {} bytes", config.max_upload_size);

    Router::new()
        .route(
            "/",
            get(list_files)
                .post(upload_files)
                .options(preflight)
                .fallback(default_route),
        )
        .route("/socket", get(socket))
        .fallback(fallback)
        .layer(RequestBodyLimitLayer::new(config.max_upload_size))
        .layer(axum::middleware::from_fn(allow_any_origin))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// serve until a shutdown signal arrives
pub async fn start_server(app: Router, addr: SocketAddr) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to bind {}: {}", addr, e))?;
    tracing::debug!("Listener bound to {}", addr);

    tracing::info!("app running at http://{}", listener.local_addr()?);
    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal())
        .tcp_nodelay(true)
        .await?;

    Ok(())
}

/// print startup banner with server info
pub fn print_startup_banner(config: &Config) {
    tracing::info!("drive-webapi starting...");
    tracing::info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    tracing::info!("📡 HTTP + WEBSOCKET: http://{}:{}", config.host, config.port);
    tracing::info!("📁 Storing uploads in: {:?}", config.files_dir.canonicalize().unwrap_or(config.files_dir.clone()));
    tracing::info!("⏱️  Progress window: {} ms", config.message_time_delay_ms);
    tracing::info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
}
