use std::sync::Arc;

use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use ibov_triggers::config::TriggerConfig;
use ibov_triggers::glue::GlueOrchestrator;
use ibov_triggers::routes;
use ibov_triggers::state::AppState;

/// Event payloads are small JSON documents.
const MAX_BODY_BYTES: usize = 256 * 1024;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("ibov=info".parse()?))
        .with_target(false)
        .init();

    let config = TriggerConfig::from_env()?;
    let addr = config.bind_addr();

    let state = Arc::new(AppState {
        orchestrator: GlueOrchestrator::from_env().await,
        crawler_name: config.crawler_name,
        job_name: config.job_name,
        token: config.token,
    });

    let app = routes::router(state)
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    tracing::info!("Starting trigger server on {addr}");
    let listener = TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to install CTRL+C handler: {e}");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
