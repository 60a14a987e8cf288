//! Booking ledger server binary
//!
//! The request-handling surface (HTTP routing, auth, DTO validation) is
//! owned by the controller layer; this binary wires the core together and
//! keeps it running.

use booking_core::{
    Config, InMemoryCatalog, InMemoryDirectory, ReservationLedger, SandboxGateway,
};
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    tracing::info!("Starting booking ledger server");

    // Load configuration
    let config = Config::from_env()?;
    let metrics_addr = config.metrics_listen_addr.clone();

    // Collaborators; real deployments wire the catalog and user services here
    let catalog = Arc::new(InMemoryCatalog::new());
    let customers = Arc::new(InMemoryDirectory::new());
    let gateway = Arc::new(SandboxGateway::new());

    let ledger = ReservationLedger::open(config, catalog, customers)
        .await?
        .with_gateway(gateway);
    tracing::info!("Reservation ledger opened");

    // Background occupancy retention
    let sweeper = ledger.retention_sweeper().spawn();

    // TODO: Start RPC server and metrics exposition here
    tracing::info!(metrics_addr = %metrics_addr, "Core running; waiting for shutdown signal");
    tokio::signal::ctrl_c().await?;

    tracing::info!("Shutting down booking ledger server");
    sweeper.abort();
    ledger.shutdown().await?;

    Ok(())
}
