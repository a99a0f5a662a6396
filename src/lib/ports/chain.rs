use std::future::Future;

use super::{GreetCall, TxReceipt};

/// Port for the greeter contract, used by the relay.
///
/// Implementations:
/// - `EthereumGreeter` (alloy contract binding)
/// - `InMemoryGreeterChain` for testing and the demo
pub trait GreeterChain: Send + Sync {
    /// Call `greet(bytes32, uint256, uint256[8])`.
    fn greet(&self, call: &GreetCall) -> impl Future<Output = Result<TxReceipt, ChainError>> + Send;
}

#[derive(Debug, thiserror::Error)]
pub enum ChainError {
    /// The contract rejected the call; the text is the revert reason.
    #[error("{0}")]
    Reverted(String),

    #[error("transaction failed: {0}")]
    TransactionFailed(String),

    #[error("RPC error: {0}")]
    Rpc(String),
}
