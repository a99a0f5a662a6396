use alloy::primitives::{B256, U256};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::crypto::poseidon::b256_to_u256;

use super::nullifier::NullifierHash;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProofFormatError {
    #[error("expected {expected} public signals, got {got}")]
    SignalCount { expected: usize, got: usize },

    #[error("malformed field element {0:?}")]
    BadFieldElement(String),

    #[error("malformed proof point: {0}")]
    BadPoint(&'static str),
}

/// Parse a field element from decimal or `0x` hex text.
pub fn parse_field(text: &str) -> Result<U256, ProofFormatError> {
    text.trim()
        .parse::<U256>()
        .map_err(|_| ProofFormatError::BadFieldElement(text.to_owned()))
}

/// Groth16 proof in the shape `snarkjs` writes to `proof.json`.
///
/// Points are projective: `pi_a`/`pi_c` carry a trailing `"1"`, `pi_b` a
/// trailing `["1", "0"]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Groth16Proof {
    pub pi_a: Vec<String>,
    pub pi_b: Vec<Vec<String>>,
    pub pi_c: Vec<String>,
    #[serde(default = "default_protocol")]
    pub protocol: String,
    #[serde(default = "default_curve")]
    pub curve: String,
}

fn default_protocol() -> String {
    "groth16".into()
}

fn default_curve() -> String {
    "bn128".into()
}

impl Groth16Proof {
    /// Pack into the 8-word layout the Solidity verifier takes:
    /// `[a0, a1, b[0][1], b[0][0], b[1][1], b[1][0], c0, c1]`.
    ///
    /// The G2 coordinates are swapped because the precompile expects
    /// `(imaginary, real)` ordering.
    pub fn pack(&self) -> Result<SolidityProof, ProofFormatError> {
        let a = coords(&self.pi_a, "pi_a")?;
        let c = coords(&self.pi_c, "pi_c")?;
        if self.pi_b.len() < 2 {
            return Err(ProofFormatError::BadPoint("pi_b"));
        }
        let b0 = coords(&self.pi_b[0], "pi_b[0]")?;
        let b1 = coords(&self.pi_b[1], "pi_b[1]")?;

        Ok(SolidityProof([a[0], a[1], b0[1], b0[0], b1[1], b1[0], c[0], c[1]]))
    }
}

fn coords(point: &[String], name: &'static str) -> Result<[U256; 2], ProofFormatError> {
    if point.len() < 2 {
        return Err(ProofFormatError::BadPoint(name));
    }
    Ok([parse_field(&point[0])?, parse_field(&point[1])?])
}

/// Groth16 proof packed for `uint256[8]` calldata.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SolidityProof(pub [U256; 8]);

impl SolidityProof {
    pub fn words(&self) -> [U256; 8] {
        self.0
    }

    pub fn to_decimal_strings(&self) -> Vec<String> {
        self.0.iter().map(U256::to_string).collect()
    }

    pub fn from_strings(words: &[String]) -> Result<Self, ProofFormatError> {
        if words.len() != 8 {
            return Err(ProofFormatError::SignalCount {
                expected: 8,
                got: words.len(),
            });
        }
        let mut packed = [U256::ZERO; 8];
        for (slot, word) in packed.iter_mut().zip(words) {
            *slot = parse_field(word)?;
        }
        Ok(Self(packed))
    }
}

/// Public signals of the membership circuit, in `public.json` order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PublicSignals {
    pub merkle_root: B256,
    pub nullifier_hash: NullifierHash,
    pub signal_hash: B256,
    pub external_nullifier: B256,
}

impl PublicSignals {
    pub const LEN: usize = 4;

    pub fn from_strings(signals: &[String]) -> Result<Self, ProofFormatError> {
        if signals.len() != Self::LEN {
            return Err(ProofFormatError::SignalCount {
                expected: Self::LEN,
                got: signals.len(),
            });
        }
        let field = |i: usize| parse_field(&signals[i]).map(B256::from);
        Ok(Self {
            merkle_root: field(0)?,
            nullifier_hash: NullifierHash(field(1)?),
            signal_hash: field(2)?,
            external_nullifier: field(3)?,
        })
    }

    pub fn to_strings(&self) -> Vec<String> {
        [
            self.merkle_root,
            self.nullifier_hash.0,
            self.signal_hash,
            self.external_nullifier,
        ]
        .iter()
        .map(|w| b256_to_u256(*w).to_string())
        .collect()
    }
}

/// Raw prover output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FullProof {
    pub proof: Groth16Proof,
    pub public_signals: PublicSignals,
}

/// Evidence that an identity is in the group, ready for submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MembershipProof {
    pub merkle_root: B256,
    pub nullifier_hash: NullifierHash,
    pub proof: Groth16Proof,
    pub solidity_proof: SolidityProof,
    pub public_signals: PublicSignals,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(v: &str) -> String {
        v.to_owned()
    }

    fn sample_proof() -> Groth16Proof {
        Groth16Proof {
            pi_a: vec![s("1"), s("2"), s("1")],
            pi_b: vec![vec![s("3"), s("4")], vec![s("5"), s("6")], vec![s("1"), s("0")]],
            pi_c: vec![s("7"), s("8"), s("1")],
            protocol: default_protocol(),
            curve: default_curve(),
        }
    }

    #[test]
    fn test_pack_order() {
        let packed = sample_proof().pack().unwrap();
        let expected: Vec<U256> = [1u64, 2, 4, 3, 6, 5, 7, 8].iter().map(|&v| U256::from(v)).collect();
        assert_eq!(packed.words().to_vec(), expected);
    }

    #[test]
    fn test_pack_rejects_short_points() {
        let mut proof = sample_proof();
        proof.pi_b.truncate(1);
        assert_eq!(proof.pack().unwrap_err(), ProofFormatError::BadPoint("pi_b"));
    }

    #[test]
    fn test_parse_snarkjs_proof_json() {
        let json = r#"{
            "pi_a": ["1", "2", "1"],
            "pi_b": [["3", "4"], ["5", "6"], ["1", "0"]],
            "pi_c": ["7", "8", "1"],
            "protocol": "groth16",
            "curve": "bn128"
        }"#;
        let proof: Groth16Proof = serde_json::from_str(json).unwrap();
        assert_eq!(proof, sample_proof());
    }

    #[test]
    fn test_public_signals_order() {
        let signals = PublicSignals::from_strings(&[s("11"), s("22"), s("33"), s("0x2c")]).unwrap();
        assert_eq!(signals.merkle_root, B256::from(U256::from(11u64)));
        assert_eq!(signals.nullifier_hash.0, B256::from(U256::from(22u64)));
        assert_eq!(signals.signal_hash, B256::from(U256::from(33u64)));
        assert_eq!(signals.external_nullifier, B256::from(U256::from(44u64)));
        assert_eq!(signals.to_strings(), vec!["11", "22", "33", "44"]);
    }

    #[test]
    fn test_public_signals_count_checked() {
        let err = PublicSignals::from_strings(&[s("1")]).unwrap_err();
        assert_eq!(err, ProofFormatError::SignalCount { expected: 4, got: 1 });
    }

    #[test]
    fn test_bad_field_element() {
        assert!(matches!(
            parse_field("not-a-number"),
            Err(ProofFormatError::BadFieldElement(_))
        ));
    }
}
