use alloy::primitives::B256;
use sha2::{Digest, Sha256};

use crate::crypto::poseidon::{poseidon1, poseidon2, reduce_to_field};

/// Message the wallet signs to seed an identity.
pub const IDENTITY_MESSAGE: &str = "Sign this message to create your identity!";

/// Public identity commitment, the leaf of the membership tree.
/// commitment = poseidon1(poseidon2(identity_nullifier, identity_trapdoor))
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IdentityCommitment(pub B256);

impl From<B256> for IdentityCommitment {
    fn from(value: B256) -> Self {
        Self(value)
    }
}

impl From<IdentityCommitment> for B256 {
    fn from(value: IdentityCommitment) -> Self {
        value.0
    }
}

/// A pseudonymous membership credential.
///
/// Derived from a signed message, so the same wallet signing the same text
/// always yields the same identity. Held in memory only.
#[derive(Clone, PartialEq, Eq)]
pub struct Identity {
    trapdoor: B256,
    nullifier: B256,
}

impl Identity {
    /// Derive an identity from a message (usually a wallet signature string).
    ///
    /// ```text
    /// h         = hex(sha256(message))
    /// trapdoor  = sha256(h || "identity_trapdoor")  mod p
    /// nullifier = sha256(h || "identity_nullifier") mod p
    /// ```
    pub fn from_message(message: &str) -> Self {
        let message_hash = hex::encode(Sha256::digest(message.as_bytes()));
        Self {
            trapdoor: derive_secret(&message_hash, "identity_trapdoor"),
            nullifier: derive_secret(&message_hash, "identity_nullifier"),
        }
    }

    /// Build an identity from known secrets (both reduced into the field).
    pub fn from_secrets(trapdoor: B256, nullifier: B256) -> Self {
        Self {
            trapdoor: reduce_to_field(trapdoor),
            nullifier: reduce_to_field(nullifier),
        }
    }

    pub fn trapdoor(&self) -> B256 {
        self.trapdoor
    }

    pub fn nullifier(&self) -> B256 {
        self.nullifier
    }

    /// identity_secret = poseidon2(nullifier, trapdoor)
    pub fn secret(&self) -> B256 {
        poseidon2(self.nullifier, self.trapdoor)
    }

    pub fn commitment(&self) -> IdentityCommitment {
        IdentityCommitment(poseidon1(self.secret()))
    }
}

impl std::fmt::Debug for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Identity")
            .field("commitment", &self.commitment().0)
            .finish_non_exhaustive()
    }
}

fn derive_secret(message_hash: &str, label: &str) -> B256 {
    let mut hasher = Sha256::new();
    hasher.update(message_hash.as_bytes());
    hasher.update(label.as_bytes());
    reduce_to_field(B256::from_slice(&hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SIGNATURE: &str = "0x5d99b6f7f6d1f73d1a26497f2b1c89b24c0993913f86e9a2d02cd69887d9c94f3c880358579d811b21dd1b7fd9bb01c1d81d10e69f0384e675c32b39643be8921b";

    #[test]
    fn test_identity_deterministic() {
        let a = Identity::from_message(SIGNATURE);
        let b = Identity::from_message(SIGNATURE);

        assert_eq!(a.trapdoor(), b.trapdoor());
        assert_eq!(a.nullifier(), b.nullifier());
        assert_eq!(a.commitment(), b.commitment());
    }

    #[test]
    fn test_identity_differs_per_message() {
        let a = Identity::from_message(SIGNATURE);
        let b = Identity::from_message("0xdeadbeef");

        assert_ne!(a.commitment(), b.commitment());
    }

    #[test]
    fn test_trapdoor_and_nullifier_are_distinct() {
        let identity = Identity::from_message(SIGNATURE);
        assert_ne!(identity.trapdoor(), identity.nullifier());
    }

    #[test]
    fn test_commitment_structure() {
        let identity = Identity::from_message(SIGNATURE);
        let expected = poseidon1(poseidon2(identity.nullifier(), identity.trapdoor()));
        assert_eq!(identity.commitment().0, expected);
    }

    #[test]
    fn test_secrets_are_field_elements() {
        let identity = Identity::from_secrets(B256::repeat_byte(0xff), B256::repeat_byte(0xfe));
        assert_eq!(reduce_to_field(identity.trapdoor()), identity.trapdoor());
        assert_eq!(reduce_to_field(identity.nullifier()), identity.nullifier());
    }

    #[test]
    fn test_debug_hides_secrets() {
        let identity = Identity::from_message(SIGNATURE);
        let rendered = format!("{identity:?}");
        assert!(!rendered.contains(&format!("{}", identity.trapdoor())));
        assert!(rendered.contains("commitment"));
    }
}
