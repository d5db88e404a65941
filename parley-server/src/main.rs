use anyhow::Context;
use clap::Parser;
use parley_server::{AppState, Args, ServerConfig, router};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = ServerConfig::try_from(Args::parse()).context("invalid configuration")?;
    info!(
        "Initializing relay with {} ICE server entries",
        config.ice_servers.len()
    );

    let state = AppState::new(&config);
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("failed to bind {}", config.bind))?;
    info!("Signaling relay listening on http://{}", config.bind);

    axum::serve(listener, app).await?;
    Ok(())
}
