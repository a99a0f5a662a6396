use std::time::Duration;

use alloy::primitives::Address;
use alloy::providers::{DynProvider, Provider, ProviderBuilder};
use alloy::rpc::types::{Filter, Log};
use alloy::sol_types::SolEvent;
use tokio::sync::mpsc;

use super::abi::IGreeters;
use crate::domain::greeting::GreetingEvent;
use crate::ports::gateway::GatewayError;

/// Maximum block range per log query (avoids RPC limits).
const BATCH_SIZE: u64 = 500;

const CHANNEL_CAPACITY: usize = 64;

/// Decode `NewGreeting` logs in chain order, skipping anything malformed.
pub fn decode_greeting_logs(mut logs: Vec<Log>) -> Vec<GreetingEvent> {
    logs.sort_by_key(|l| (l.block_number, l.log_index));

    logs.iter()
        .filter_map(|log| {
            let event = match log.log_decode::<IGreeters::NewGreeting>() {
                Ok(event) => event,
                Err(e) => {
                    tracing::warn!("events: NewGreeting decode error: {e}");
                    return None;
                }
            };
            match GreetingEvent::decode(event.inner.greeting, log.block_number) {
                Ok(greeting) => Some(greeting),
                Err(e) => {
                    tracing::warn!("events: undecodable greeting payload: {e}");
                    None
                }
            }
        })
        .collect()
}

/// Polls `eth_getLogs` for `NewGreeting` events of one greeter contract.
#[derive(Clone)]
pub struct GreeterEventFeed {
    provider: DynProvider,
    greeter: Address,
    poll_interval: Duration,
}

impl GreeterEventFeed {
    pub fn new(
        rpc_url: &str,
        greeter: Address,
        poll_interval: Duration,
    ) -> Result<Self, GatewayError> {
        let provider = DynProvider::new(
            ProviderBuilder::new().connect_http(
                rpc_url
                    .parse()
                    .map_err(|e| GatewayError::Subscription(format!("Invalid RPC URL: {e}")))?,
            ),
        );
        Ok(Self {
            provider,
            greeter,
            poll_interval,
        })
    }

    /// Start polling from the block after the current head.
    ///
    /// The polling task ends when the receiver is dropped.
    pub async fn subscribe(&self) -> Result<mpsc::Receiver<GreetingEvent>, GatewayError> {
        let head = self
            .provider
            .get_block_number()
            .await
            .map_err(|e| GatewayError::Subscription(e.to_string()))?;

        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
        let feed = self.clone();
        tokio::spawn(async move {
            feed.poll_loop(head + 1, tx).await;
        });

        tracing::info!(greeter = %self.greeter, from_block = head + 1, "subscribed to NewGreeting");
        Ok(rx)
    }

    async fn poll_loop(&self, mut next_block: u64, tx: mpsc::Sender<GreetingEvent>) {
        loop {
            if tx.is_closed() {
                tracing::debug!("events: subscriber gone, stopping");
                return;
            }

            let head = match self.provider.get_block_number().await {
                Ok(n) => n,
                Err(e) => {
                    tracing::warn!("events: failed to get block number: {e}");
                    tokio::time::sleep(self.poll_interval).await;
                    continue;
                }
            };

            if next_block > head {
                tokio::time::sleep(self.poll_interval).await;
                continue;
            }

            let to = head.min(next_block + BATCH_SIZE - 1);
            let filter = Filter::new()
                .address(self.greeter)
                .event_signature(IGreeters::NewGreeting::SIGNATURE_HASH)
                .from_block(next_block)
                .to_block(to);

            let logs = match self.provider.get_logs(&filter).await {
                Ok(logs) => logs,
                Err(e) => {
                    tracing::warn!("events: error fetching blocks {next_block}..{to}: {e}");
                    tokio::time::sleep(self.poll_interval).await;
                    continue;
                }
            };

            for event in decode_greeting_logs(logs) {
                if tx.send(event).await.is_err() {
                    return;
                }
            }
            next_block = to + 1;
        }
    }
}
