//! veloride - Self-Hosted GPS Cycling Computer
//!
//! Main entry point: wires the location provider, the database, and the
//! telemetry engine together and runs the loop until shutdown.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use veloride::location::TermuxLocation;
use veloride::storage::{AppConfig, Database};
use veloride::telemetry::TelemetryEngine;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting veloride v{}", env!("CARGO_PKG_VERSION"));

    let config = AppConfig::load();
    let database_path = config.resolve_database_path();
    let database = Arc::new(Mutex::new(Database::open(&database_path)?));
    tracing::info!(path = %database_path.display(), "Database ready");

    let provider = TermuxLocation::new(
        config.provider_binary.clone(),
        Duration::from_secs(config.poll_timeout_secs),
    );

    let (engine, _handle) = TelemetryEngine::new(
        provider,
        database,
        Duration::from_secs_f64(config.cycle_period_secs),
    );

    tokio::select! {
        _ = engine.run() => {}
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutting down");
        }
    }

    Ok(())
}
