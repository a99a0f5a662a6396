use alloy::{
    network::EthereumWallet,
    primitives::Address,
    providers::{DynProvider, ProviderBuilder},
    signers::local::PrivateKeySigner,
};
use tokio::sync::mpsc;

use super::abi::IGreeters;
use super::greeter_events::GreeterEventFeed;
use super::http_relay::RelayClient;
use crate::domain::greeting::GreetingEvent;
use crate::ports::chain::{ChainError, GreeterChain};
use crate::ports::gateway::{ChainGateway, GatewayError};
use crate::ports::{GreetCall, GreetingSubmission, SubmissionAck, TxReceipt};

/// Fallback message when a revert carries no reason.
pub const UNKNOWN_REVERT: &str = "Unknown error!";

/// Greeter contract adapter used by the relay to send `greet` transactions.
#[derive(Clone)]
pub struct EthereumGreeter {
    provider: DynProvider,
    greeter: Address,
}

impl EthereumGreeter {
    pub fn new(rpc_url: &str, private_key: &str, greeter: Address) -> Result<Self, ChainError> {
        let signer: PrivateKeySigner = private_key
            .parse()
            .map_err(|e| ChainError::Rpc(format!("Invalid private key: {}", e)))?;
        let wallet = EthereumWallet::from(signer);
        let provider = DynProvider::new(
            ProviderBuilder::new().wallet(wallet).connect_http(
                rpc_url
                    .parse()
                    .map_err(|e| ChainError::Rpc(format!("Invalid RPC URL: {}", e)))?,
            ),
        );

        Ok(Self { provider, greeter })
    }

    fn convert_receipt(receipt: &alloy::rpc::types::TransactionReceipt) -> TxReceipt {
        TxReceipt {
            tx_hash: receipt.transaction_hash,
            block_number: receipt.block_number,
            success: receipt.status(),
        }
    }
}

/// Pull the revert reason out of a node error.
///
/// Nodes report reverts as `execution reverted: <reason>`, some wrapping the
/// reason in single quotes.
pub fn revert_reason(message: &str) -> String {
    let reason = match (message.find('\''), message.rfind('\'')) {
        (Some(start), Some(end)) if end > start => &message[start + 1..end],
        _ => message
            .split_once("execution reverted:")
            .map(|(_, rest)| rest)
            .unwrap_or(""),
    };
    let reason = reason.trim();
    if reason.is_empty() {
        UNKNOWN_REVERT.to_owned()
    } else {
        reason.to_owned()
    }
}

fn map_send_error(err: alloy::contract::Error) -> ChainError {
    match &err {
        alloy::contract::Error::TransportError(rpc) => match rpc.as_error_resp() {
            Some(payload) => ChainError::Reverted(revert_reason(&payload.message)),
            None => ChainError::Rpc(err.to_string()),
        },
        _ => ChainError::TransactionFailed(err.to_string()),
    }
}

impl GreeterChain for EthereumGreeter {
    async fn greet(&self, call: &GreetCall) -> Result<TxReceipt, ChainError> {
        let greeter = IGreeters::new(self.greeter, &self.provider);
        let receipt = greeter
            .greet(call.greeting, call.nullifier_hash, call.proof)
            .send()
            .await
            .map_err(map_send_error)?
            .get_receipt()
            .await
            .map_err(|e| ChainError::TransactionFailed(e.to_string()))?;

        if !receipt.status() {
            return Err(ChainError::Reverted(UNKNOWN_REVERT.into()));
        }

        tracing::info!(tx = %receipt.transaction_hash, "greet transaction mined");
        Ok(Self::convert_receipt(&receipt))
    }
}

/// Client-side gateway: submissions through the relay, confirmations from
/// polled `NewGreeting` logs.
#[derive(Clone)]
pub struct EthereumGateway {
    relay: RelayClient,
    events: GreeterEventFeed,
}

impl EthereumGateway {
    pub fn new(relay: RelayClient, events: GreeterEventFeed) -> Self {
        Self { relay, events }
    }
}

impl ChainGateway for EthereumGateway {
    async fn submit_greeting(
        &self,
        submission: &GreetingSubmission,
    ) -> Result<SubmissionAck, GatewayError> {
        self.relay.submit(submission).await
    }

    async fn subscribe_greetings(&self) -> Result<mpsc::Receiver<GreetingEvent>, GatewayError> {
        self.events.subscribe().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_revert_reason_quoted() {
        let msg = "Error: VM Exception while processing transaction: reverted with reason string 'SemaphoreCore: you cannot use the same nullifier twice'";
        assert_eq!(
            revert_reason(msg),
            "SemaphoreCore: you cannot use the same nullifier twice"
        );
    }

    #[test]
    fn test_revert_reason_plain() {
        assert_eq!(
            revert_reason("execution reverted: Semaphore: invalid proof"),
            "Semaphore: invalid proof"
        );
    }

    #[test]
    fn test_revert_reason_missing() {
        assert_eq!(revert_reason("execution reverted"), UNKNOWN_REVERT);
        assert_eq!(revert_reason("nonce too low"), UNKNOWN_REVERT);
    }

    #[test]
    fn test_invalid_constructor_inputs() {
        let greeter = Address::repeat_byte(0x01);
        assert!(EthereumGreeter::new("http://localhost:8545", "0xnope", greeter).is_err());
        assert!(matches!(
            EthereumGreeter::new(
                "not a url",
                "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80",
                greeter
            ),
            Err(ChainError::Rpc(_))
        ));
    }
}
