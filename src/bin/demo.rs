//! Semaphore Greeter Demo
//!
//! Runs the greeting workflow in-process: a local key signs, the member
//! list lives in memory, the prover echoes its witness and the greeter
//! contract is simulated. No node, relay or snarkjs needed.
//!
//! Run with: `cargo run --bin demo`

use std::time::Duration;

use alloy::primitives::B256;

use semaphore_greeter::adapters::local_wallet::LocalWallet;
use semaphore_greeter::adapters::memory_chain::InMemoryGreeterChain;
use semaphore_greeter::adapters::memory_registry::InMemoryRegistry;
use semaphore_greeter::adapters::mock_prover::MockProver;
use semaphore_greeter::domain::identity::Identity;
use semaphore_greeter::flow::{FlowSettings, GreetingFlow};

/// Anvil's first default account.
const MEMBER_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
/// Anvil's second default account, never registered.
const OUTSIDER_KEY: &str = "0x59c6995e998f97a5a0044966f0945389dc9e86dae88c7a8412f4603b6b78690d";

#[tokio::main(flavor = "current_thread")]
async fn main() {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    println!("=== Semaphore Greeter ===");
    println!("=== In-process demo (no real proofs) ===\n");

    let wallet = LocalWallet::from_private_key(MEMBER_KEY).expect("valid demo key");
    let flow = GreetingFlow::new(
        wallet,
        InMemoryRegistry::default(),
        MockProver::new(),
        InMemoryGreeterChain::new(),
        FlowSettings::default(),
    );

    // ── Setup ──
    println!("[Setup] Deriving the member identity...");
    let identity = flow.request_identity().await.expect("local wallet signs");
    let commitment = identity.commitment();
    println!("  commitment: {}", commitment.0);

    for seed in ["alice", "bob"] {
        flow.registry()
            .push(Identity::from_message(seed).commitment().0)
            .await;
    }
    flow.registry().push(commitment.0).await;
    println!("  group has 3 members, ours at index 2");

    let _subscription = flow
        .subscribe_to_greetings(|event| {
            println!("  [event] NewGreeting {:?} (block {:?})", event.greeting, event.block_number)
        })
        .await
        .expect("in-memory subscription");

    println!("\nStatus: {}", flow.board().snapshot().status);

    // ── Greet ──
    println!("\n[Greet] Posting \"Hello ZKU\"...");
    let receipt = flow.greet("Hello ZKU").await.expect("first greeting succeeds");
    println!("  nullifierHash: {}", receipt.submission.nullifier_hash);
    println!("  tx: {:?}", receipt.ack.tx_hash);
    settle().await;
    print_board(&flow.board().snapshot());

    // ── Duplicate ──
    println!("\n[Greet again] Same identity, same group...");
    match flow.greet("Hello again").await {
        Ok(_) => println!("  unexpected: second greeting accepted"),
        Err(e) => println!("  rejected: {e}"),
    }
    print_board(&flow.board().snapshot());

    // ── Someone else greets ──
    println!("\n[Event] Another member greets...");
    flow.gateway().emit_greeting("Hi").await.expect("fits bytes32");
    settle().await;
    print_board(&flow.board().snapshot());

    // ── Outsider ──
    println!("\n[Outsider] A wallet outside the group tries to greet...");
    let outsider = GreetingFlow::new(
        LocalWallet::from_private_key(OUTSIDER_KEY).expect("valid demo key"),
        InMemoryRegistry::new(vec![commitment.0, B256::left_padding_from(&[7])]),
        MockProver::new(),
        InMemoryGreeterChain::new(),
        FlowSettings::default(),
    );
    match outsider.greet("Let me in").await {
        Ok(_) => println!("  unexpected: outsider accepted"),
        Err(e) => println!("  rejected: {e} (prover calls: {})", outsider.prover().calls()),
    }

    println!("\n=== Demo completed ===");
}

/// Let the subscription task drain pending events.
async fn settle() {
    tokio::time::sleep(Duration::from_millis(20)).await;
}

fn print_board(snapshot: &semaphore_greeter::board::BoardSnapshot) {
    println!("  status: {}", snapshot.status);
    println!("  state: {:?}", snapshot.state);
    println!("  last greeting: {:?}", snapshot.last_greeting);
}
