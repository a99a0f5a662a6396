use alloy::primitives::B256;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::crypto::poseidon::b256_to_u256;
use crate::domain::nullifier::NullifierHash;
use crate::domain::proof::{FullProof, Groth16Proof, PublicSignals};
use crate::domain::witness::SemaphoreWitness;
use crate::ports::prover::{Prover, ProverError};

/// Prover stand-in for tests and the demo.
///
/// Echoes the witness's expected public signals and emits a placeholder
/// proof. Counts invocations so tests can assert the prover was skipped.
#[derive(Default)]
pub struct MockProver {
    calls: AtomicUsize,
    failure: Option<String>,
    corrupt_signals: bool,
}

impl MockProver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every call fails with `ProofFailed(message)`.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            failure: Some(message.into()),
            ..Self::default()
        }
    }

    /// Returns a nullifier hash that does not match the witness.
    pub fn with_corrupt_signals() -> Self {
        Self {
            corrupt_signals: true,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Prover for MockProver {
    async fn prove(&self, witness: &SemaphoreWitness) -> Result<FullProof, ProverError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(message) = &self.failure {
            return Err(ProverError::ProofFailed(message.clone()));
        }

        let nullifier_hash = if self.corrupt_signals {
            NullifierHash(B256::repeat_byte(0x11))
        } else {
            witness.nullifier_hash
        };

        let word = |v: &B256| b256_to_u256(*v).to_string();
        let proof = Groth16Proof {
            pi_a: vec![word(&witness.merkle_root), word(&nullifier_hash.0), "1".into()],
            pi_b: vec![
                vec![word(&witness.signal_hash), word(&witness.external_nullifier)],
                vec!["1".into(), "2".into()],
                vec!["1".into(), "0".into()],
            ],
            pi_c: vec!["3".into(), "4".into(), "1".into()],
            protocol: "groth16".into(),
            curve: "bn128".into(),
        };

        Ok(FullProof {
            proof,
            public_signals: PublicSignals {
                merkle_root: witness.merkle_root,
                nullifier_hash,
                signal_hash: witness.signal_hash,
                external_nullifier: witness.external_nullifier,
            },
        })
    }
}
