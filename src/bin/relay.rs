//! Greeter relay server.
//!
//! Accepts `POST /api/greet` submissions and sends the `greet` transaction
//! with the relay's own key. Also serves the member list at
//! `GET /identityCommitments.json` when `relay.commitments_path` is set.
//!
//! Reads the same config file as the `greet` binary; only the [chain] and
//! [relay] sections are used.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tracing::{error, info};

use semaphore_greeter::adapters::ethereum::EthereumGreeter;
use semaphore_greeter::config::RelayServerConfig;
use semaphore_greeter::relay::start_relay;

#[derive(Parser)]
#[command(about = "Relay anonymous greetings to the greeter contract")]
struct Args {
    /// Path to the TOML config file
    #[arg(long, default_value = "./greeter.toml")]
    config: PathBuf,
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let config = RelayServerConfig::load(&args.config).unwrap_or_else(|e| {
        error!("cannot load config: {e}");
        std::process::exit(1);
    });

    let private_key = config.private_key().unwrap_or_else(|e| {
        error!("{e}");
        std::process::exit(1);
    });
    let greeter = EthereumGreeter::new(
        &config.chain.rpc_url,
        private_key,
        config.chain.greeter_address,
    )
    .unwrap_or_else(|e| {
        error!("cannot create greeter adapter: {e}");
        std::process::exit(1);
    });
    info!(greeter = %config.chain.greeter_address, rpc = %config.chain.rpc_url, "greeter contract loaded");

    let (server, bound_addr) = start_relay(
        Arc::new(greeter),
        config.relay.commitments_path.clone(),
        config.relay.listen,
    )
    .await
    .unwrap_or_else(|e| {
        error!("cannot start relay: {e}");
        std::process::exit(1);
    });
    info!(%bound_addr, "relay listening");

    tokio::signal::ctrl_c().await.ok();
    server.abort();
    info!("shutting down");
}
