//! Anonymous greetings over Semaphore group membership.
//!
//! The crate is laid out as ports and adapters: `domain` holds the pure
//! identity, tree and proof types, `ports` the traits for the external
//! services (wallet, registry, prover, chain), `adapters` their concrete
//! implementations, and `flow` the greeting workflow that drives them.

pub mod adapters;
pub mod board;
pub mod config;
pub mod crypto;
pub mod domain;
pub mod flow;
pub mod ports;
pub mod relay;
