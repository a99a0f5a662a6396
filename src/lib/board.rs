//! Display state shared between the workflow and the event subscription.

use tokio::sync::watch;

pub const STATUS_IDLE: &str = "Connect your wallet and greet!";
pub const STATUS_IDENTITY: &str = "Creating your Semaphore identity...";
pub const STATUS_PROOF: &str = "Creating your Semaphore proof...";
pub const STATUS_ONCHAIN: &str = "Your anonymous greeting is onchain :)";

/// Where the current greeting action stands.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FlowState {
    #[default]
    Idle,
    RequestingIdentity,
    BuildingProof,
    /// Posted to the gateway; `accepted` once it acknowledged.
    Submitting { accepted: bool },
    /// A `NewGreeting` arrived while submitting; it may land before the ack.
    Confirmed,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardSnapshot {
    pub status: String,
    pub state: FlowState,
    pub last_greeting: Option<String>,
}

impl Default for BoardSnapshot {
    fn default() -> Self {
        Self {
            status: STATUS_IDLE.to_owned(),
            state: FlowState::Idle,
            last_greeting: None,
        }
    }
}

/// Status line, flow state and last greeting, published over a watch
/// channel. Every update replaces the snapshot.
#[derive(Debug, Clone)]
pub struct GreetingBoard {
    tx: watch::Sender<BoardSnapshot>,
}

impl Default for GreetingBoard {
    fn default() -> Self {
        Self::new()
    }
}

impl GreetingBoard {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(BoardSnapshot::default());
        Self { tx }
    }

    pub fn subscribe(&self) -> watch::Receiver<BoardSnapshot> {
        self.tx.subscribe()
    }

    pub fn snapshot(&self) -> BoardSnapshot {
        self.tx.borrow().clone()
    }

    /// Enter `state` and show `status`.
    pub fn transition(&self, state: FlowState, status: &str) {
        self.tx.send_modify(|s| {
            s.state = state;
            s.status = status.to_owned();
        });
    }

    /// The gateway acknowledged the submission. An event seen while waiting
    /// for the ack keeps the action `Confirmed`.
    pub fn accept(&self) {
        self.tx.send_modify(|s| {
            s.status = STATUS_ONCHAIN.to_owned();
            if s.state != FlowState::Confirmed {
                s.state = FlowState::Submitting { accepted: true };
            }
        });
    }

    /// Terminal failure; the status is the error text verbatim.
    pub fn fail(&self, message: &str) {
        self.transition(FlowState::Failed(message.to_owned()), message);
    }

    /// Record an incoming greeting. Last write wins.
    pub fn record_greeting(&self, greeting: &str) {
        self.tx.send_modify(|s| {
            s.last_greeting = Some(greeting.to_owned());
            if matches!(s.state, FlowState::Submitting { .. }) {
                s.state = FlowState::Confirmed;
            }
        });
    }
}
