use alloy::primitives::{keccak256, B256, U256};
use std::collections::HashSet;
use tokio::sync::{mpsc, Mutex, MutexGuard};

use crate::domain::greeting::{Greeting, GreetingEvent};
use crate::ports::chain::{ChainError, GreeterChain};
use crate::ports::gateway::{ChainGateway, GatewayError};
use crate::ports::{GreetCall, GreetingSubmission, SubmissionAck, TxReceipt};

/// Revert reason of the Semaphore verifier on nullifier reuse.
pub const NULLIFIER_REUSED: &str = "SemaphoreCore: you cannot use the same nullifier twice";

const CHANNEL_CAPACITY: usize = 64;

#[derive(Default)]
struct ChainState {
    block_number: u64,
    used_nullifiers: HashSet<U256>,
    greetings: Vec<String>,
    subscribers: Vec<mpsc::Sender<GreetingEvent>>,
    fail_next: Option<String>,
    subscribe_failure: Option<String>,
}

/// In-memory greeter contract for tests and the demo.
///
/// Acts as both sides of the wire: the relay's `GreeterChain` and the
/// client's `ChainGateway`. Proofs are not verified; nullifier reuse is.
#[derive(Default)]
pub struct InMemoryGreeterChain {
    state: Mutex<ChainState>,
    /// Held while events go out, so subscribers see them in block order.
    delivery: Mutex<()>,
}

impl InMemoryGreeterChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `greet` fail with `reason`.
    pub async fn fail_next_with(&self, reason: impl Into<String>) {
        self.state.lock().await.fail_next = Some(reason.into());
    }

    /// Make every subscription attempt fail.
    pub async fn fail_subscriptions(&self, reason: impl Into<String>) {
        self.state.lock().await.subscribe_failure = Some(reason.into());
    }

    /// Emit a `NewGreeting` as if another user had greeted.
    pub async fn emit_greeting(&self, text: &str) -> Result<(), ChainError> {
        let greeting = Greeting::new(text).map_err(|e| ChainError::Reverted(e.to_string()))?;
        let mut state = self.state.lock().await;
        state.block_number += 1;
        self.publish(state, greeting.to_bytes32()).await;
        Ok(())
    }

    /// Greetings recorded so far, oldest first.
    pub async fn greetings(&self) -> Vec<String> {
        self.state.lock().await.greetings.clone()
    }

    pub async fn is_nullifier_used(&self, nullifier_hash: U256) -> bool {
        self.state
            .lock()
            .await
            .used_nullifiers
            .contains(&nullifier_hash)
    }

    /// Record the greeting, then wait until every live subscriber has it.
    async fn publish(&self, mut state: MutexGuard<'_, ChainState>, payload: B256) {
        let event = match GreetingEvent::decode(payload, Some(state.block_number)) {
            Ok(event) => event,
            Err(e) => {
                tracing::warn!("memory chain: undecodable greeting: {e}");
                return;
            }
        };
        state.greetings.push(event.greeting.clone());
        state.subscribers.retain(|tx| !tx.is_closed());
        let subscribers = state.subscribers.clone();

        let _delivery = self.delivery.lock().await;
        drop(state);
        for tx in subscribers {
            // A receiver dropped mid-delivery is pruned on the next publish.
            tx.send(event.clone()).await.ok();
        }
    }

    fn tx_hash(block_number: u64, nullifier_hash: U256) -> B256 {
        let mut preimage = block_number.to_be_bytes().to_vec();
        preimage.extend_from_slice(&nullifier_hash.to_be_bytes::<32>());
        keccak256(preimage)
    }
}

impl GreeterChain for InMemoryGreeterChain {
    async fn greet(&self, call: &GreetCall) -> Result<TxReceipt, ChainError> {
        let mut state = self.state.lock().await;

        if let Some(reason) = state.fail_next.take() {
            return Err(ChainError::Reverted(reason));
        }
        if !state.used_nullifiers.insert(call.nullifier_hash) {
            return Err(ChainError::Reverted(NULLIFIER_REUSED.into()));
        }

        state.block_number += 1;
        let block_number = state.block_number;
        self.publish(state, call.greeting).await;

        Ok(TxReceipt {
            tx_hash: Self::tx_hash(block_number, call.nullifier_hash),
            block_number: Some(block_number),
            success: true,
        })
    }
}

impl ChainGateway for InMemoryGreeterChain {
    async fn submit_greeting(
        &self,
        submission: &GreetingSubmission,
    ) -> Result<SubmissionAck, GatewayError> {
        let call = submission.to_call().map_err(|e| GatewayError::Rejected {
            status: 400,
            message: e.to_string(),
        })?;
        let receipt = self
            .greet(&call)
            .await
            .map_err(|e| GatewayError::Server(e.to_string()))?;
        Ok(SubmissionAck {
            tx_hash: Some(receipt.tx_hash),
        })
    }

    async fn subscribe_greetings(&self) -> Result<mpsc::Receiver<GreetingEvent>, GatewayError> {
        let mut state = self.state.lock().await;
        if let Some(reason) = &state.subscribe_failure {
            return Err(GatewayError::Subscription(reason.clone()));
        }
        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
        state.subscribers.push(tx);
        Ok(rx)
    }
}
