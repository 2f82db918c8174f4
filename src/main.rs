use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use std::net::SocketAddr;
use std::sync::Arc;

use drive_webapi::config::Config;
use drive_webapi::state::AppState;
use drive_webapi::server::{build_router, print_startup_banner, start_server};

// use mimalloc as the global allocator
// 10-20% faster than system allocator
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

fn main() -> anyhow::Result<()> {
    // load .env file if it exists (fails silently if not found)
    let _ = dotenvy::dotenv();

    // load configuration from environment variables
    let config = Config::from_env();

    // build tokio runtime with configured worker threads
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(config.worker_threads)
        .enable_all()
        .build()
        .context("Failed to build Tokio runtime")?;

    runtime.block_on(async {
        tracing_subscriber::registry()
            .with(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "info".into()),
            )
            .with(tracing_subscriber::fmt::layer())
            .init();

        // create the directory if it doesn't exist
        if !config.files_dir.exists() {
            tokio::fs::create_dir_all(&config.files_dir)
                .await
                .with_context(|| format!("Failed to create files directory {:?}", config.files_dir))?;
            tracing::info!("Created files directory at: {:?}", config.files_dir);
        }

        let state = Arc::new(AppState::from_config(&config));
        let app = build_router(state, &config);

        let addr = SocketAddr::from((
            config
                .host
                .parse::<std::net::IpAddr>()
                .with_context(|| format!("Invalid HOST {:?}", config.host))?,
            config.port,
        ));

        print_startup_banner(&config);

        start_server(app, addr).await
    })
}
