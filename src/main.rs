//! Aquifer server.
//!
//! Serves one acquisition controller over HTTP. See [`aquifer::api`] for the
//! routes and [`aquifer::config`] for the `AQUIFER_*` environment variables.

use std::net::SocketAddr;

use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use aquifer::api::{self, AppState};
use aquifer::config::AcquisitionConfig;
use aquifer::controller::AcquisitionController;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive("aquifer=info".parse()?))
        .init();

    let config = AcquisitionConfig::from_env();

    info!(
        port = config.port,
        upstream = %config.upstream_url,
        relays = config.relays.len(),
        enrichment = config.enrichment_url.as_deref().unwrap_or("none"),
        max_attempts = config.max_attempts,
        "Starting Aquifer server"
    );

    let controller = AcquisitionController::from_config(&config);
    let state = AppState { controller };

    let app = api::router(state).layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = TcpListener::bind(addr).await?;

    info!(%addr, "Aquifer is listening");

    axum::serve(listener, app).await?;

    Ok(())
}
