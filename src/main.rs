//! Server entry point.

use std::sync::Arc;

use anyhow::Result;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use strike_sim::core::rng::SimRng;
use strike_sim::network::server::{MatchServer, ServerConfig};
use strike_sim::sim::broadcast::Broadcaster;
use strike_sim::sim::registry::MatchRegistry;
use strike_sim::sim::scheduler::{Scheduler, SchedulerConfig};

#[tokio::main]
async fn main() -> Result<()> {
    fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    info!(version = strike_sim::VERSION, "starting strike-sim-server");

    let config = ServerConfig {
        bind_address: std::env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:4000".to_string()),
        ..ServerConfig::default()
    };

    let registry = Arc::new(MatchRegistry::new());
    let broadcaster = Broadcaster::new(256);

    let scheduler = Scheduler::new(
        Arc::clone(&registry),
        broadcaster.clone(),
        SimRng::from_entropy(),
        SchedulerConfig::default(),
    );
    tokio::spawn(scheduler.run());

    let server = MatchServer::new(config, registry, broadcaster);
    server.run().await?;
    Ok(())
}
