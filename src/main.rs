use std::sync::Arc;

use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use rotation_desk::api::router;
use rotation_desk::config::DeskConfig;
use rotation_desk::dates::SystemClock;
use rotation_desk::portal::PortalHttpClient;
use rotation_desk::services::Orchestrator;
use rotation_desk::state::AppState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "rotation_desk=debug".to_string()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = DeskConfig::new_from_env()?;
    info!(
        "portal at {} (rotation mode: {:?}, utc offset {})",
        config.portal.base_url, config.rotation_mode, config.utc_offset
    );

    let portal = Arc::new(PortalHttpClient::new(config.portal.clone())?);
    let orchestrator = Orchestrator::new(
        portal,
        Arc::new(SystemClock::new(config.utc_offset)),
        config.rotation_mode,
    );

    let state = AppState {
        orchestrator: Arc::new(orchestrator),
    };

    let app = router(state);

    info!("listening on http://{}", config.bind_addr);

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
