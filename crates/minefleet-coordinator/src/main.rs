//! Minefleet binary
//!
//! Runs the fleet until Ctrl-C, then drains every agent and prints the
//! aggregate summary.

use anyhow::Result;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use minefleet_common::{MinerError, VERSION};
use minefleet_coordinator::{FleetConfig, FleetCoordinator};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting minefleet v{}", VERSION);

    // Load configuration
    let config = FleetConfig::load()?;
    info!("Loaded configuration: {:?}", config);

    let coordinator = FleetCoordinator::instance(config)?;

    match coordinator.run_until_interrupt().await {
        Ok(summary) => {
            info!("{}", summary);
            info!("Shutting down minefleet");
            Ok(())
        }
        // Already reported by the coordinator; not a distinct exit status
        Err(MinerError::NoWallets { .. }) => Ok(()),
        Err(e) => {
            error!(error = %e, "Fleet stopped with an error");
            Err(e.into())
        }
    }
}
