use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::process::Command;

use crate::domain::proof::{FullProof, Groth16Proof, PublicSignals};
use crate::domain::witness::SemaphoreWitness;
use crate::ports::prover::{Prover, ProverError};

/// SnarkjsProver generates Groth16 proofs by shelling out to `snarkjs`.
///
/// This prover:
/// 1. Writes the circuit input to `input.json` in a fresh run directory
///    under the work directory
/// 2. Runs `snarkjs groth16 fullprove` against the wasm and zkey artifacts
/// 3. Reads `proof.json` and `public.json` back and removes the run directory
#[derive(Debug, Clone)]
pub struct SnarkjsProver {
    binary: PathBuf,
    wasm: PathBuf,
    zkey: PathBuf,
    work_dir: PathBuf,
    runs: Arc<AtomicU64>,
}

impl SnarkjsProver {
    pub fn new(
        binary: impl Into<PathBuf>,
        wasm: impl Into<PathBuf>,
        zkey: impl Into<PathBuf>,
        work_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            binary: binary.into(),
            wasm: wasm.into(),
            zkey: zkey.into(),
            work_dir: work_dir.into(),
            runs: Arc::new(AtomicU64::new(0)),
        }
    }

    fn check_artifacts(&self) -> Result<(), ProverError> {
        for artifact in [&self.wasm, &self.zkey] {
            if !artifact.exists() {
                return Err(ProverError::ArtifactMissing(artifact.display().to_string()));
            }
        }
        Ok(())
    }

    /// Overlapping `prove` calls must not share input or output files.
    fn next_run_dir(&self) -> PathBuf {
        let run = self.runs.fetch_add(1, Ordering::Relaxed);
        self.work_dir.join(format!("run-{}-{run}", std::process::id()))
    }

    async fn fullprove(
        &self,
        witness: &SemaphoreWitness,
        run_dir: &Path,
    ) -> Result<FullProof, ProverError> {
        let input_path = run_dir.join("input.json");
        let proof_path = run_dir.join("proof.json");
        let public_path = run_dir.join("public.json");

        let input = serde_json::to_vec_pretty(&witness.circuit_input())?;
        tokio::fs::write(&input_path, input).await?;

        tracing::debug!(binary = %self.binary.display(), "running snarkjs groth16 fullprove");
        let output = Command::new(&self.binary)
            .arg("groth16")
            .arg("fullprove")
            .arg(&input_path)
            .arg(&self.wasm)
            .arg(&self.zkey)
            .arg(&proof_path)
            .arg(&public_path)
            .output()
            .await
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => {
                    ProverError::BinaryNotFound(self.binary.display().to_string())
                }
                _ => ProverError::IoError(e),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ProverError::ProofFailed(format!(
                "snarkjs fullprove failed: {}",
                stderr.trim()
            )));
        }

        Self::read_outputs(run_dir).await
    }

    async fn read_outputs(dir: &Path) -> Result<FullProof, ProverError> {
        let proof_json = tokio::fs::read(dir.join("proof.json")).await?;
        let public_json = tokio::fs::read(dir.join("public.json")).await?;

        let proof: Groth16Proof = serde_json::from_slice(&proof_json)?;
        let signals: Vec<String> = serde_json::from_slice(&public_json)?;

        Ok(FullProof {
            proof,
            public_signals: PublicSignals::from_strings(&signals)?,
        })
    }
}

impl Prover for SnarkjsProver {
    async fn prove(&self, witness: &SemaphoreWitness) -> Result<FullProof, ProverError> {
        self.check_artifacts()?;
        let run_dir = self.next_run_dir();
        tokio::fs::create_dir_all(&run_dir).await?;

        let result = self.fullprove(witness, &run_dir).await;
        if let Err(e) = tokio::fs::remove_dir_all(&run_dir).await {
            tracing::warn!(dir = %run_dir.display(), "cannot remove prover run directory: {e}");
        }
        result
    }
}
