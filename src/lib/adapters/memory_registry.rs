use alloy::primitives::B256;
use tokio::sync::Mutex;

use crate::ports::registry::{Registry, RegistryError};

/// In-memory commitment list for tests and the demo.
pub struct InMemoryRegistry {
    commitments: Mutex<Vec<B256>>,
    failure: Option<String>,
}

impl InMemoryRegistry {
    pub fn new(commitments: Vec<B256>) -> Self {
        Self {
            commitments: Mutex::new(commitments),
            failure: None,
        }
    }

    /// A registry whose every fetch fails with `message`.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            commitments: Mutex::new(Vec::new()),
            failure: Some(message.into()),
        }
    }

    /// Register a new member.
    pub async fn push(&self, commitment: B256) {
        self.commitments.lock().await.push(commitment);
    }
}

impl Default for InMemoryRegistry {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl Registry for InMemoryRegistry {
    async fn load_commitments(&self) -> Result<Vec<B256>, RegistryError> {
        if let Some(message) = &self.failure {
            return Err(RegistryError::Fetch(message.clone()));
        }
        Ok(self.commitments.lock().await.clone())
    }
}
