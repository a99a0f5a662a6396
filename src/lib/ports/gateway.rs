use std::future::Future;
use tokio::sync::mpsc;

use super::{GreetingSubmission, SubmissionAck};
use crate::domain::greeting::GreetingEvent;

/// Port the greeting workflow uses to reach the chain.
///
/// Submissions go through a relay; confirmations come back as
/// `NewGreeting` events.
///
/// Implementations:
/// - `EthereumGateway` (HTTP relay + `eth_getLogs` polling)
/// - `InMemoryGreeterChain` for testing and the demo
pub trait ChainGateway: Send + Sync {
    /// Post a greeting. Success only means the relay accepted it.
    fn submit_greeting(
        &self,
        submission: &GreetingSubmission,
    ) -> impl Future<Output = Result<SubmissionAck, GatewayError>> + Send;

    /// Open the `NewGreeting` event stream.
    ///
    /// Events arrive in chain order. The stream ends when the receiver is
    /// dropped or the underlying connection gives up.
    fn subscribe_greetings(
        &self,
    ) -> impl Future<Output = Result<mpsc::Receiver<GreetingEvent>, GatewayError>> + Send;
}

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// Server-side failure; the body is the user-facing message.
    #[error("{0}")]
    Server(String),

    /// Any other non-success status; the body is surfaced verbatim.
    #[error("{message}")]
    Rejected { status: u16, message: String },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("subscription failed: {0}")]
    Subscription(String),
}
