//! Greeter client.
//!
//! Derives a Semaphore identity from a wallet signature, proves membership
//! in the published group and posts an anonymous greeting through the relay.
//! Keeps printing greetings from the chain until Ctrl-C.
//!
//! Run with: `cargo run --bin greet -- --config greeter.toml --greeting "Hello ZKU"`

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::{error, info};

use semaphore_greeter::adapters::ethereum::EthereumGateway;
use semaphore_greeter::adapters::greeter_events::GreeterEventFeed;
use semaphore_greeter::adapters::http_registry::{FileRegistry, HttpRegistry};
use semaphore_greeter::adapters::http_relay::RelayClient;
use semaphore_greeter::adapters::local_wallet::LocalWallet;
use semaphore_greeter::adapters::rpc_wallet::RpcWallet;
use semaphore_greeter::adapters::snarkjs_prover::SnarkjsProver;
use semaphore_greeter::config::{GreeterConfig, RegistrySource, WalletSource};
use semaphore_greeter::flow::GreetingFlow;
use semaphore_greeter::ports::registry::Registry;
use semaphore_greeter::ports::wallet::Wallet;

#[derive(Parser)]
#[command(about = "Post an anonymous greeting to the Semaphore greeter")]
struct Args {
    /// Path to the TOML config file
    #[arg(long, default_value = "./greeter.toml")]
    config: PathBuf,

    /// Greeting text (at most 31 bytes)
    #[arg(long, default_value = "Hello ZKU")]
    greeting: String,

    /// Only follow greetings, do not post one
    #[arg(long)]
    watch_only: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Print the identity commitment for the configured wallet
    Identity,
}

fn exit_with(context: &str, err: impl std::fmt::Display) -> ! {
    error!("{context}: {err}");
    std::process::exit(1);
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
    let config = GreeterConfig::load(&args.config)
        .unwrap_or_else(|e| exit_with("cannot load config", e));

    match config.wallet_source().unwrap_or_else(|e| exit_with("wallet", e)) {
        WalletSource::PrivateKey(key) => {
            let wallet = LocalWallet::from_private_key(key)
                .unwrap_or_else(|e| exit_with("invalid wallet.private_key", e));
            with_registry(wallet, &config, &args).await
        }
        WalletSource::Rpc(url) => {
            let wallet =
                RpcWallet::new(url).unwrap_or_else(|e| exit_with("invalid wallet.rpc_url", e));
            with_registry(wallet, &config, &args).await
        }
    }
}

async fn with_registry<W: Wallet>(wallet: W, config: &GreeterConfig, args: &Args) {
    match config.registry_source().unwrap_or_else(|e| exit_with("registry", e)) {
        RegistrySource::Url(url) => run(wallet, HttpRegistry::new(url), config, args).await,
        RegistrySource::Path(path) => run(wallet, FileRegistry::new(path), config, args).await,
    }
}

async fn run<W: Wallet, R: Registry>(wallet: W, registry: R, config: &GreeterConfig, args: &Args) {
    let prover = SnarkjsProver::new(
        &config.prover.snarkjs,
        &config.prover.wasm,
        &config.prover.zkey,
        &config.prover.work_dir,
    );
    let events = GreeterEventFeed::new(
        &config.chain.rpc_url,
        config.chain.greeter_address,
        config.chain.poll_interval,
    )
    .unwrap_or_else(|e| exit_with("invalid chain.rpc_url", e));
    let gateway = EthereumGateway::new(RelayClient::new(&config.relay.url), events);
    let settings = config
        .flow_settings()
        .unwrap_or_else(|e| exit_with("invalid semaphore settings", e));

    let flow = GreetingFlow::new(wallet, registry, prover, gateway, settings);

    if let Some(Command::Identity) = args.command {
        let identity = flow
            .request_identity()
            .await
            .unwrap_or_else(|e| exit_with("cannot create identity", e));
        println!("{}", identity.commitment().0);
        return;
    }

    // Mirror board status changes to the terminal.
    let mut board = flow.board().subscribe();
    println!("{}", board.borrow().status);
    tokio::spawn(async move {
        let mut last = board.borrow().status.clone();
        while board.changed().await.is_ok() {
            let status = board.borrow_and_update().status.clone();
            if status != last {
                println!("{status}");
                last = status;
            }
        }
    });

    let subscription = flow
        .subscribe_to_greetings(|event| println!("greeting: {}", event.greeting))
        .await
        .unwrap_or_else(|e| exit_with("cannot follow greetings", e));

    if !args.watch_only {
        match flow.greet(&args.greeting).await {
            Ok(receipt) => info!(tx = ?receipt.ack.tx_hash, "greeting submitted"),
            Err(e) => error!("greeting failed: {e}"),
        }
    }

    info!("watching for greetings, Ctrl-C to exit");
    tokio::signal::ctrl_c().await.ok();
    subscription.abort();
}
