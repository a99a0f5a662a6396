pub mod abi;
pub mod ethereum;
pub mod greeter_events;
pub mod http_registry;
pub mod http_relay;
pub mod local_wallet;
pub mod memory_chain;
pub mod memory_registry;
pub mod mock_prover;
pub mod rpc_wallet;
pub mod snarkjs_prover;
pub mod static_wallet;
