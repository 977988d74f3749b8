use std::path::Path;
use std::sync::Arc;

use axum::http::HeaderValue;
use girder_core::config::GirderConfig;
use girder_core::db::repository::ProjectRepository;
use girder_core::scheduler::SyncScheduler;
use girder_core::sources::{SourceDispatcher, SourceKind};
use tokio::net::TcpListener;
use tower_http::set_header::SetResponseHeaderLayer;
use tracing::info;

use super::open_repository;

/// Run the `serve` command: start the dashboard API server and the sync
/// scheduler.
pub async fn run(config_path: &str, port: u16) -> anyhow::Result<()> {
    let config = GirderConfig::load(Path::new(config_path))?;
    config.validate()?;

    let repo = open_repository(&config).await?;
    let repo = Arc::new(repo);

    let dispatcher = Arc::new(SourceDispatcher::from_config(repo.clone(), &config.source));

    // First boot on the mock source: seed once so the dashboard has data.
    if dispatcher.active_source().await == SourceKind::Mock {
        if repo.count_projects().await? == 0 {
            info!("Store is empty, running initial mock seed");
            dispatcher.sync().await?;
        } else {
            info!("Store already has data, skipping initial seed");
        }
    }

    SyncScheduler::from_minutes(dispatcher.clone(), config.source.sync_interval_minutes).start();

    let state = Arc::new(girder_console::AppState {
        repo: repo.as_ref().clone(),
        dispatcher,
        config: config.clone(),
    });
    let app = girder_console::router(state);

    // Add security headers
    let app = app
        .layer(SetResponseHeaderLayer::overriding(
            axum::http::header::X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            axum::http::header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            axum::http::header::REFERRER_POLICY,
            HeaderValue::from_static("strict-origin-when-cross-origin"),
        ));

    let addr = format!("0.0.0.0:{}", port);
    let listener = TcpListener::bind(&addr).await?;

    println!("Girder dashboard API listening on http://{}", addr);
    info!("Starting server on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shut down gracefully");
    Ok(())
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("failed to install CTRL+C handler");
    info!("Received shutdown signal");
}
