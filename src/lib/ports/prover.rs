use std::future::Future;

use crate::domain::proof::{FullProof, ProofFormatError};
use crate::domain::witness::SemaphoreWitness;

/// Port for zero-knowledge proof generation.
///
/// Implementations:
/// - `SnarkjsProver` (shells out to `snarkjs groth16 fullprove`)
/// - `MockProver` for testing
pub trait Prover: Send + Sync {
    /// Prove group membership for the given witness.
    ///
    /// The returned public signals carry the Merkle root and the nullifier
    /// hash the circuit computed. Proving may take seconds.
    fn prove(
        &self,
        witness: &SemaphoreWitness,
    ) -> impl Future<Output = Result<FullProof, ProverError>> + Send;
}

#[derive(Debug, thiserror::Error)]
pub enum ProverError {
    #[error("proving artifact not found: {0}")]
    ArtifactMissing(String),

    #[error("prover binary not found: {0}")]
    BinaryNotFound(String),

    #[error("proof generation failed: {0}")]
    ProofFailed(String),

    #[error("invalid witness: {0}")]
    InvalidWitness(String),

    #[error("malformed prover output: {0}")]
    Output(#[from] ProofFormatError),

    #[error("witness serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}
