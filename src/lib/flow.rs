use tokio::task::JoinHandle;

use crate::board::{FlowState, GreetingBoard, STATUS_IDENTITY, STATUS_PROOF};
use crate::domain::greeting::{Greeting, GreetingCodecError, GreetingEvent};
use crate::domain::identity::{Identity, IdentityCommitment, IDENTITY_MESSAGE};
use crate::domain::merkle::{MembershipSet, DEFAULT_TREE_DEPTH};
use crate::domain::nullifier::ExternalNullifierPolicy;
use crate::domain::proof::{FullProof, MembershipProof};
use crate::domain::witness::SemaphoreWitness;
use crate::ports::gateway::{ChainGateway, GatewayError};
use crate::ports::prover::Prover;
use crate::ports::registry::Registry;
use crate::ports::wallet::{Wallet, WalletError};
use crate::ports::{GreetingSubmission, SubmissionAck};

/// Why a greeting action stopped. Every variant is terminal for the action.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GreetingError {
    #[error("Wallet request rejected")]
    UserRejected,

    #[error("Wallet unavailable: {0}")]
    WalletUnavailable(String),

    #[error("Could not load the group members: {0}")]
    RegistryUnavailable(String),

    #[error("Your identity is not a member of the group")]
    NotAMember,

    #[error("Could not create your proof: {0}")]
    ProofGenerationFailed(String),

    /// Shown to the user exactly as the gateway reported it.
    #[error("{0}")]
    SubmissionRejected(String),

    #[error("Invalid greeting: {0}")]
    InvalidGreeting(String),

    #[error("Could not subscribe to greetings: {0}")]
    SubscriptionUnavailable(String),
}

impl From<WalletError> for GreetingError {
    fn from(err: WalletError) -> Self {
        match err {
            WalletError::UserRejected => GreetingError::UserRejected,
            other => GreetingError::WalletUnavailable(other.to_string()),
        }
    }
}

impl From<GreetingCodecError> for GreetingError {
    fn from(err: GreetingCodecError) -> Self {
        GreetingError::InvalidGreeting(err.to_string())
    }
}

impl From<GatewayError> for GreetingError {
    fn from(err: GatewayError) -> Self {
        match err {
            GatewayError::Server(message) | GatewayError::Rejected { message, .. } => {
                GreetingError::SubmissionRejected(message)
            }
            other => GreetingError::SubmissionRejected(other.to_string()),
        }
    }
}

/// Knobs that shape every proof.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlowSettings {
    pub tree_depth: usize,
    pub external_nullifier: ExternalNullifierPolicy,
}

impl Default for FlowSettings {
    fn default() -> Self {
        Self {
            tree_depth: DEFAULT_TREE_DEPTH,
            external_nullifier: ExternalNullifierPolicy::MembershipRoot,
        }
    }
}

/// What a successful `greet` posted and what the gateway answered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GreetingReceipt {
    pub submission: GreetingSubmission,
    pub ack: SubmissionAck,
}

/// Anonymous greeting workflow.
///
/// Generic over `Wallet`, `Registry`, `Prover` and `ChainGateway`. Each
/// `greet` owns its identity and proof; the board is the only shared state.
pub struct GreetingFlow<W: Wallet, R: Registry, P: Prover, G: ChainGateway> {
    wallet: W,
    registry: R,
    prover: P,
    gateway: G,
    settings: FlowSettings,
    board: GreetingBoard,
}

impl<W: Wallet, R: Registry, P: Prover, G: ChainGateway> GreetingFlow<W, R, P, G> {
    pub fn new(wallet: W, registry: R, prover: P, gateway: G, settings: FlowSettings) -> Self {
        Self {
            wallet,
            registry,
            prover,
            gateway,
            settings,
            board: GreetingBoard::new(),
        }
    }

    pub fn board(&self) -> &GreetingBoard {
        &self.board
    }

    pub fn settings(&self) -> &FlowSettings {
        &self.settings
    }

    pub fn wallet(&self) -> &W {
        &self.wallet
    }

    pub fn registry(&self) -> &R {
        &self.registry
    }

    pub fn prover(&self) -> &P {
        &self.prover
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    /// Ask the wallet for an account and derive the identity from its
    /// signature over `IDENTITY_MESSAGE`.
    pub async fn request_identity(&self) -> Result<Identity, GreetingError> {
        let accounts = self.wallet.request_accounts().await?;
        let account = *accounts.first().ok_or(GreetingError::UserRejected)?;

        let signature = self.wallet.sign_message(account, IDENTITY_MESSAGE).await?;
        let identity = Identity::from_message(&signature);

        tracing::debug!(%account, commitment = %identity.commitment().0, "identity derived");
        Ok(identity)
    }

    /// Fetch the published member list.
    pub async fn load_membership_set(&self) -> Result<MembershipSet, GreetingError> {
        let commitments = self
            .registry
            .load_commitments()
            .await
            .map_err(|e| GreetingError::RegistryUnavailable(e.to_string()))?;

        let set = MembershipSet::new(
            self.settings.tree_depth,
            commitments.into_iter().map(IdentityCommitment).collect(),
        )
        .map_err(|e| GreetingError::RegistryUnavailable(e.to_string()))?;

        tracing::debug!(members = set.commitments().len(), "membership set loaded");
        Ok(set)
    }

    /// Prove that `identity` belongs to `set` and binds `greeting`.
    ///
    /// Fails with `NotAMember` before any proving work when the identity's
    /// commitment is absent from the set.
    pub async fn build_proof(
        &self,
        identity: &Identity,
        set: &MembershipSet,
        greeting: &str,
    ) -> Result<MembershipProof, GreetingError> {
        let greeting = Greeting::new(greeting)?;

        let tree = set
            .tree()
            .map_err(|e| GreetingError::RegistryUnavailable(e.to_string()))?;
        let commitment = identity.commitment();
        let leaf_index = tree
            .index_of(&commitment.0)
            .ok_or(GreetingError::NotAMember)?;
        let merkle_proof = tree
            .generate_proof(leaf_index)
            .ok_or(GreetingError::NotAMember)?;

        let external_nullifier = self.settings.external_nullifier.resolve(merkle_proof.root);
        let witness = SemaphoreWitness::build(identity, &merkle_proof, external_nullifier, &greeting);

        tracing::info!(leaf_index, root = %merkle_proof.root, "generating membership proof");
        let full = self
            .prover
            .prove(&witness)
            .await
            .map_err(|e| GreetingError::ProofGenerationFailed(e.to_string()))?;

        check_public_signals(&witness, &full)?;

        let solidity_proof = full
            .proof
            .pack()
            .map_err(|e| GreetingError::ProofGenerationFailed(e.to_string()))?;

        Ok(MembershipProof {
            merkle_root: witness.merkle_root,
            nullifier_hash: witness.nullifier_hash,
            proof: full.proof,
            solidity_proof,
            public_signals: full.public_signals,
        })
    }

    /// Post the proof and greeting to the gateway.
    pub async fn submit_greeting(
        &self,
        proof: &MembershipProof,
        greeting: &str,
    ) -> Result<GreetingReceipt, GreetingError> {
        let greeting = Greeting::new(greeting)?;
        let submission = GreetingSubmission::new(proof, &greeting);

        let ack = self.gateway.submit_greeting(&submission).await.map_err(|e| {
            tracing::warn!("submission rejected: {e}");
            GreetingError::from(e)
        })?;

        tracing::info!(tx = ?ack.tx_hash, "greeting accepted by gateway");
        Ok(GreetingReceipt { submission, ack })
    }

    /// Run one full greeting action, publishing progress on the board.
    pub async fn greet(&self, greeting: &str) -> Result<GreetingReceipt, GreetingError> {
        let result = self.run_greet(greeting).await;
        if let Err(e) = &result {
            self.board.fail(&e.to_string());
        }
        result
    }

    async fn run_greet(&self, greeting: &str) -> Result<GreetingReceipt, GreetingError> {
        self.board.transition(FlowState::RequestingIdentity, STATUS_IDENTITY);
        let identity = self.request_identity().await?;

        self.board.transition(FlowState::BuildingProof, STATUS_PROOF);
        let set = self.load_membership_set().await?;
        let proof = self.build_proof(&identity, &set, greeting).await?;

        // The status line keeps showing the proof step until the gateway answers.
        self.board
            .transition(FlowState::Submitting { accepted: false }, STATUS_PROOF);
        let receipt = self.submit_greeting(&proof, greeting).await?;

        self.board.accept();
        Ok(receipt)
    }

    /// Follow `NewGreeting` events until the returned task is aborted or the
    /// stream ends. Each event updates the board, then `on_event` runs.
    pub async fn subscribe_to_greetings<F>(
        &self,
        mut on_event: F,
    ) -> Result<JoinHandle<()>, GreetingError>
    where
        F: FnMut(&GreetingEvent) + Send + 'static,
    {
        let mut events = self
            .gateway
            .subscribe_greetings()
            .await
            .map_err(|e| GreetingError::SubscriptionUnavailable(e.to_string()))?;

        let board = self.board.clone();
        Ok(tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                tracing::debug!(greeting = %event.greeting, block = ?event.block_number, "new greeting");
                board.record_greeting(&event.greeting);
                on_event(&event);
            }
            tracing::debug!("greeting stream ended");
        }))
    }
}

fn check_public_signals(witness: &SemaphoreWitness, full: &FullProof) -> Result<(), GreetingError> {
    let signals = &full.public_signals;
    let mismatch = |field: &str| {
        GreetingError::ProofGenerationFailed(format!("prover returned a different {field}"))
    };

    if signals.merkle_root != witness.merkle_root {
        return Err(mismatch("merkle root"));
    }
    if signals.nullifier_hash != witness.nullifier_hash {
        return Err(mismatch("nullifier hash"));
    }
    if signals.signal_hash != witness.signal_hash {
        return Err(mismatch("signal hash"));
    }
    if signals.external_nullifier != witness.external_nullifier {
        return Err(mismatch("external nullifier"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gateway_messages_pass_through() {
        let server: GreetingError = GatewayError::Server("Nullifier already used".into()).into();
        assert_eq!(server.to_string(), "Nullifier already used");

        let rejected: GreetingError = GatewayError::Rejected {
            status: 400,
            message: "bad request".into(),
        }
        .into();
        assert_eq!(rejected, GreetingError::SubmissionRejected("bad request".into()));
    }

    #[test]
    fn test_wallet_errors() {
        assert_eq!(
            GreetingError::from(WalletError::UserRejected),
            GreetingError::UserRejected
        );
        assert!(matches!(
            GreetingError::from(WalletError::Unavailable("no provider".into())),
            GreetingError::WalletUnavailable(_)
        ));
    }

    #[test]
    fn test_default_settings() {
        let settings = FlowSettings::default();
        assert_eq!(settings.tree_depth, 20);
        assert_eq!(settings.external_nullifier, ExternalNullifierPolicy::MembershipRoot);
    }
}
