use alloy::primitives::B256;
use serde::Serialize;

use crate::crypto::poseidon::b256_to_u256;

use super::greeting::Greeting;
use super::identity::Identity;
use super::merkle::MerkleProof;
use super::nullifier::{ExternalNullifier, NullifierHash};

/// Full witness for the membership circuit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SemaphoreWitness {
    // ── Private ──
    pub identity_nullifier: B256,
    pub identity_trapdoor: B256,
    pub tree_path_indices: Vec<u8>,
    pub tree_siblings: Vec<B256>,

    // ── Public inputs ──
    pub external_nullifier: B256,
    pub signal_hash: B256,

    // ── Expected public outputs (not circuit inputs) ──
    pub merkle_root: B256,
    pub nullifier_hash: NullifierHash,
}

impl SemaphoreWitness {
    /// Bind an identity, its inclusion proof and the signal together.
    pub fn build(
        identity: &Identity,
        merkle_proof: &MerkleProof,
        external_nullifier: ExternalNullifier,
        greeting: &Greeting,
    ) -> Self {
        Self {
            identity_nullifier: identity.nullifier(),
            identity_trapdoor: identity.trapdoor(),
            tree_path_indices: merkle_proof.path_indices.clone(),
            tree_siblings: merkle_proof.siblings.clone(),
            external_nullifier: external_nullifier.0,
            signal_hash: greeting.signal_hash(),
            merkle_root: merkle_proof.root,
            nullifier_hash: NullifierHash::derive(external_nullifier, identity.nullifier()),
        }
    }

    /// Circuit input as `snarkjs` reads it from `input.json`.
    pub fn circuit_input(&self) -> CircuitInput {
        CircuitInput::from(self)
    }
}

/// JSON-serializable circuit input.
///
/// Field names **must** match the circuit's signal names exactly.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CircuitInput {
    identity_nullifier: String,
    identity_trapdoor: String,
    tree_path_indices: Vec<u8>,
    tree_siblings: Vec<String>,
    external_nullifier: String,
    signal_hash: String,
}

fn decimal(value: &B256) -> String {
    b256_to_u256(*value).to_string()
}

impl From<&SemaphoreWitness> for CircuitInput {
    fn from(w: &SemaphoreWitness) -> Self {
        Self {
            identity_nullifier: decimal(&w.identity_nullifier),
            identity_trapdoor: decimal(&w.identity_trapdoor),
            tree_path_indices: w.tree_path_indices.clone(),
            tree_siblings: w.tree_siblings.iter().map(decimal).collect(),
            external_nullifier: decimal(&w.external_nullifier),
            signal_hash: decimal(&w.signal_hash),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::merkle::MembershipTree;

    fn witness() -> SemaphoreWitness {
        let identity = Identity::from_message("0x1234");
        let other = B256::left_padding_from(&[7]);
        let tree = MembershipTree::from_leaves(4, &[identity.commitment().0, other]).unwrap();
        let proof = tree.generate_proof(0).unwrap();
        let greeting = Greeting::new("Hello ZKU").unwrap();
        SemaphoreWitness::build(&identity, &proof, ExternalNullifier(proof.root), &greeting)
    }

    #[test]
    fn test_witness_binds_inputs() {
        let identity = Identity::from_message("0x1234");
        let w = witness();

        assert_eq!(w.identity_nullifier, identity.nullifier());
        assert_eq!(w.identity_trapdoor, identity.trapdoor());
        assert_eq!(w.tree_siblings.len(), 4);
        assert_eq!(w.external_nullifier, w.merkle_root);
        assert_eq!(
            w.nullifier_hash,
            NullifierHash::derive(ExternalNullifier(w.merkle_root), identity.nullifier())
        );
    }

    #[test]
    fn test_circuit_input_json() {
        let w = witness();
        let json = serde_json::to_value(w.circuit_input()).unwrap();

        for key in [
            "identityNullifier",
            "identityTrapdoor",
            "treePathIndices",
            "treeSiblings",
            "externalNullifier",
            "signalHash",
        ] {
            assert!(json.get(key).is_some(), "missing {key}");
        }
        assert!(json.get("merkleRoot").is_none());
        assert_eq!(json["treeSiblings"].as_array().unwrap().len(), 4);
        assert_eq!(json["treePathIndices"][0], 0);
        assert_eq!(json["treeSiblings"][0], "7");
    }
}
