use alloy::primitives::B256;

use crate::crypto::poseidon::poseidon2;

/// Context tag scoping nullifier uniqueness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ExternalNullifier(pub B256);

/// Public value that stops one identity from signalling twice in the same
/// context without revealing which member signalled.
/// nullifier_hash = poseidon2(external_nullifier, identity_nullifier)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NullifierHash(pub B256);

impl NullifierHash {
    pub fn derive(external: ExternalNullifier, identity_nullifier: B256) -> Self {
        Self(poseidon2(external.0, identity_nullifier))
    }
}

impl From<B256> for NullifierHash {
    fn from(value: B256) -> Self {
        Self(value)
    }
}

impl From<NullifierHash> for B256 {
    fn from(value: NullifierHash) -> Self {
        value.0
    }
}

/// How the external nullifier is chosen for a greeting.
///
/// Neither variant varies per greeting: one identity gets one greeting per
/// context and a second attempt reproduces the same nullifier hash, which
/// the verifier rejects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExternalNullifierPolicy {
    /// Use the membership tree root, as the greeter contract checks.
    #[default]
    MembershipRoot,
    /// A fixed campaign tag.
    Fixed(B256),
}

impl ExternalNullifierPolicy {
    pub fn resolve(&self, root: B256) -> ExternalNullifier {
        match self {
            ExternalNullifierPolicy::MembershipRoot => ExternalNullifier(root),
            ExternalNullifierPolicy::Fixed(tag) => ExternalNullifier(*tag),
        }
    }
}
