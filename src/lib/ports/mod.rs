pub mod chain;
pub mod gateway;
pub mod prover;
pub mod registry;
pub mod wallet;

use alloy::primitives::{B256, U256};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::crypto::poseidon::b256_to_u256;
use crate::domain::greeting::{Greeting, GreetingCodecError};
use crate::domain::proof::{parse_field, MembershipProof, ProofFormatError, SolidityProof};

/// Payload posted to the relay: `{ greeting, nullifierHash, solidityProof }`.
///
/// Big integers travel as decimal strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GreetingSubmission {
    pub greeting: String,
    pub nullifier_hash: String,
    pub solidity_proof: Vec<String>,
}

/// A submission parsed into the contract call arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GreetCall {
    pub greeting: B256,
    pub nullifier_hash: U256,
    pub proof: [U256; 8],
}

#[derive(Debug, Error)]
pub enum SubmissionFormatError {
    #[error("invalid greeting: {0}")]
    Greeting(#[from] GreetingCodecError),

    #[error("invalid proof: {0}")]
    Proof(#[from] ProofFormatError),
}

impl GreetingSubmission {
    pub fn new(proof: &MembershipProof, greeting: &Greeting) -> Self {
        Self {
            greeting: greeting.as_str().to_owned(),
            nullifier_hash: b256_to_u256(proof.nullifier_hash.0).to_string(),
            solidity_proof: proof.solidity_proof.to_decimal_strings(),
        }
    }

    /// Parse into contract arguments.
    pub fn to_call(&self) -> Result<GreetCall, SubmissionFormatError> {
        let greeting = Greeting::new(self.greeting.clone())?;
        let nullifier_hash = parse_field(&self.nullifier_hash)?;
        let proof = SolidityProof::from_strings(&self.solidity_proof)?;
        Ok(GreetCall {
            greeting: greeting.to_bytes32(),
            nullifier_hash,
            proof: proof.words(),
        })
    }
}

/// Gateway acknowledgement: the submission was accepted for processing.
/// The greeting itself arrives later as an event.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionAck {
    #[serde(default)]
    pub tx_hash: Option<B256>,
}

/// Minimal transaction receipt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TxReceipt {
    pub tx_hash: B256,
    pub block_number: Option<u64>,
    pub success: bool,
}
