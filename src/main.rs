//! Bridge Shuttle - round-trip bridge driver between two EVM networks
//!
//! Sends a fixed amount through a bridge contract from one network to the
//! other and back, round after round, confirming each leg before the next.

use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info};

mod calldata;
mod chain;
mod config;
mod coordination;
mod error;
mod metrics;
mod tx;

use calldata::CalldataBuilder;
use chain::{ChainClient, EthersChainClient};
use config::{ChainConfig, Settings};
use coordination::{BridgeOrchestrator, Direction, LegRoute, OrchestratorConfig};
use metrics::MetricsServer;
use tx::Account;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    init_logging();

    info!("Starting Bridge Shuttle v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let settings = Settings::load()?;
    info!(
        "Loaded configuration: {} -> {}",
        settings.outbound.name, settings.return_leg.name
    );

    // Templates are validated before anything touches the network
    let builder = CalldataBuilder::from_settings(&settings)?;
    let account = Account::load(&settings.wallet)?;
    info!("Using account 0x{}", account.address_hex());

    let calldata = builder
        .build(&account.address_hex())
        .context("Failed to build calldata")?;

    let outbound = LegRoute {
        direction: Direction::Outbound,
        label: route_label(&settings.outbound, &settings.return_leg),
        client: connect(&settings.outbound)?,
        constants: settings.outbound.constants()?,
        calldata: calldata.outbound,
    };
    let return_leg = LegRoute {
        direction: Direction::Return,
        label: route_label(&settings.return_leg, &settings.outbound),
        client: connect(&settings.return_leg)?,
        constants: settings.return_leg.constants()?,
        calldata: calldata.return_data,
    };

    let orchestrator = BridgeOrchestrator::new(
        OrchestratorConfig::from_settings(&settings)?,
        account,
        outbound,
        return_leg,
    );

    // Start metrics server
    let metrics_handle = if settings.metrics.enabled {
        let server = MetricsServer::new(settings.metrics.port);
        info!("Metrics: http://0.0.0.0:{}/metrics", settings.metrics.port);
        Some(tokio::spawn(async move {
            if let Err(e) = server.run().await {
                error!("Metrics server error: {}", e);
            }
        }))
    } else {
        None
    };

    // First Ctrl+C / SIGTERM stops at the next round boundary, a second one
    // abandons the round in progress
    let outcome = orchestrator.start_with_shutdown(shutdown_signal).await;

    if let Some(h) = metrics_handle {
        h.abort();
    }

    let Some(result) = outcome else {
        anyhow::bail!("Interrupted while a round was in progress");
    };
    let summary = result.context("Startup connectivity check failed")?;
    info!(
        "Bridge Shuttle stopped after {} rounds ({} outbound and {} return legs confirmed)",
        summary.rounds_completed, summary.outbound_confirmed, summary.return_confirmed
    );
    Ok(())
}

fn connect(config: &ChainConfig) -> Result<Arc<dyn ChainClient>> {
    let client = EthersChainClient::new(config)?;
    info!(
        "Configured {} (chain {}) via {}",
        client.name(),
        config.chain_id,
        config.rpc_url
    );
    Ok(Arc::new(client))
}

fn route_label(from: &ChainConfig, to: &ChainConfig) -> String {
    format!("{} -> {}", from.name, to.name)
}

fn init_logging() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,bridge_shuttle=debug,hyper=warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true).with_thread_ids(true))
        .init();
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
