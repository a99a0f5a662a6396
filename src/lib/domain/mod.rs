pub mod greeting;
pub mod identity;
pub mod merkle;
pub mod nullifier;
pub mod proof;
pub mod witness;
