use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::routing::get;
use axum::Router;
use axum_server::tls_rustls::RustlsConfig;
use clap::Parser;
use tower_http::services::ServeDir;
use tracing_subscriber::EnvFilter;

mod config;
mod handlers;
mod logic;
mod maps;
mod state;
mod storage;

use crate::config::Args;
use crate::handlers::{
    create_handler, get_handler, list_handler, map_page_handler, ping_handler, update_handler,
};
use crate::maps::{flush_dirty, load_maps};
use crate::state::AppState;
use crate::storage::{FileStorage, Storage};

const DEFAULT_LOG_FILTER: &str = "info,routesketch_server=debug";
const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn router(state: AppState, public_dir: std::path::PathBuf) -> Router {
    Router::new()
        .route("/ping", get(ping_handler))
        .route("/api/maps", get(list_handler).post(create_handler))
        .route("/api/maps/:id", get(get_handler).put(update_handler))
        .route("/map/:id", get(map_page_handler))
        .fallback_service(ServeDir::new(public_dir).append_index_html_on_directories(true))
        .with_state(state)
}

async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        tracing::error!(%error, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let args = Args::parse();

    let data_dir = args.data_dir();
    tokio::fs::create_dir_all(&data_dir)
        .await
        .with_context(|| format!("failed to create data dir {}", data_dir.display()))?;
    let public_dir = args.public_dir();
    let storage: Arc<dyn Storage> = Arc::new(FileStorage::new(data_dir.clone()));
    let state = AppState::new(storage, public_dir.join("index.html"));
    let loaded = load_maps(&state)
        .await
        .context("failed to load stored maps")?;
    tracing::info!(loaded, data_dir = %data_dir.display(), "maps loaded");

    let flush_state = state.clone();
    let flush_interval = args.flush_interval();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(flush_interval);
        loop {
            interval.tick().await;
            let written = flush_dirty(&flush_state).await;
            if written > 0 {
                tracing::debug!(written, "flushed maps");
            }
        }
    });

    let app = router(state.clone(), public_dir);
    let addr = args.addr();

    match args.tls() {
        Some((cert, key)) => {
            let tls = RustlsConfig::from_pem_file(&cert, &key)
                .await
                .context("failed to load TLS certificate")?;
            let handle = axum_server::Handle::new();
            let shutdown_handle = handle.clone();
            tokio::spawn(async move {
                shutdown_signal().await;
                shutdown_handle.graceful_shutdown(Some(SHUTDOWN_GRACE));
            });
            tracing::info!("route maps at https://localhost:{}", addr.port());
            axum_server::bind_rustls(addr, tls)
                .handle(handle)
                .serve(app.into_make_service())
                .await
                .context("server failed")?;
        }
        None => {
            let listener = tokio::net::TcpListener::bind(addr)
                .await
                .with_context(|| format!("failed to bind {addr}"))?;
            tracing::info!("route maps at http://localhost:{}", addr.port());
            axum::serve(listener, app)
                .with_graceful_shutdown(shutdown_signal())
                .await
                .context("server failed")?;
        }
    }

    let written = flush_dirty(&state).await;
    tracing::info!(written, "final flush done");
    Ok(())
}
