use alloy::primitives::B256;
use std::future::Future;

/// Port for the published list of member identity commitments.
///
/// Implementations:
/// - `HttpRegistry` (GET of `identityCommitments.json`)
/// - `FileRegistry` (same document on disk)
/// - `InMemoryRegistry` for testing
pub trait Registry: Send + Sync {
    /// Load the ordered commitment list.
    fn load_commitments(&self) -> impl Future<Output = Result<Vec<B256>, RegistryError>> + Send;
}

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("registry fetch failed: {0}")]
    Fetch(String),

    #[error("registry returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed registry document: {0}")]
    Malformed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
