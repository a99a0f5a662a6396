use alloy::primitives::Address;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::ports::wallet::{Wallet, WalletError};

/// Scripted wallet for tests: fixed accounts, fixed signature.
pub struct StaticWallet {
    accounts: Vec<Address>,
    signature: String,
    reject: bool,
    sign_calls: AtomicUsize,
}

impl StaticWallet {
    pub fn new(account: Address, signature: impl Into<String>) -> Self {
        Self {
            accounts: vec![account],
            signature: signature.into(),
            reject: false,
            sign_calls: AtomicUsize::new(0),
        }
    }

    /// A wallet whose user declines every request.
    pub fn rejecting() -> Self {
        Self {
            accounts: Vec::new(),
            signature: String::new(),
            reject: true,
            sign_calls: AtomicUsize::new(0),
        }
    }

    /// A wallet that is connected but exposes no accounts.
    pub fn without_accounts() -> Self {
        Self {
            reject: false,
            ..Self::rejecting()
        }
    }

    pub fn sign_calls(&self) -> usize {
        self.sign_calls.load(Ordering::SeqCst)
    }
}

impl Wallet for StaticWallet {
    async fn request_accounts(&self) -> Result<Vec<Address>, WalletError> {
        if self.reject {
            return Err(WalletError::UserRejected);
        }
        Ok(self.accounts.clone())
    }

    async fn sign_message(&self, account: Address, _message: &str) -> Result<String, WalletError> {
        self.sign_calls.fetch_add(1, Ordering::SeqCst);
        if self.reject {
            return Err(WalletError::UserRejected);
        }
        if !self.accounts.contains(&account) {
            return Err(WalletError::UnknownAccount(account));
        }
        Ok(self.signature.clone())
    }
}
