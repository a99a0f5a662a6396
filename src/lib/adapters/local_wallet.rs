use alloy::primitives::Address;
use alloy::signers::local::PrivateKeySigner;
use alloy::signers::Signer;

use crate::ports::wallet::{Wallet, WalletError};

/// Wallet backed by a local private key.
///
/// Never prompts, so it never reports `UserRejected`.
#[derive(Clone)]
pub struct LocalWallet {
    signer: PrivateKeySigner,
}

impl LocalWallet {
    pub fn new(signer: PrivateKeySigner) -> Self {
        Self { signer }
    }

    /// Parse a hex private key (with or without `0x`).
    pub fn from_private_key(private_key: &str) -> Result<Self, WalletError> {
        let signer: PrivateKeySigner = private_key
            .parse()
            .map_err(|e| WalletError::Unavailable(format!("Invalid private key: {e}")))?;
        Ok(Self::new(signer))
    }

    pub fn address(&self) -> Address {
        self.signer.address()
    }
}

impl Wallet for LocalWallet {
    async fn request_accounts(&self) -> Result<Vec<Address>, WalletError> {
        Ok(vec![self.signer.address()])
    }

    async fn sign_message(&self, account: Address, message: &str) -> Result<String, WalletError> {
        if account != self.signer.address() {
            return Err(WalletError::UnknownAccount(account));
        }
        let signature = self
            .signer
            .sign_message(message.as_bytes())
            .await
            .map_err(|e| WalletError::Signing(e.to_string()))?;
        Ok(format!("0x{}", hex::encode(signature.as_bytes())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    #[tokio::test]
    async fn test_signature_is_deterministic() {
        let wallet = LocalWallet::from_private_key(KEY).unwrap();
        let account = wallet.request_accounts().await.unwrap()[0];

        let a = wallet.sign_message(account, "hello").await.unwrap();
        let b = wallet.sign_message(account, "hello").await.unwrap();

        assert_eq!(a, b);
        assert!(a.starts_with("0x"));
        assert_eq!(a.len(), 2 + 130);
    }

    #[tokio::test]
    async fn test_unknown_account_rejected() {
        let wallet = LocalWallet::from_private_key(KEY).unwrap();
        let err = wallet
            .sign_message(Address::repeat_byte(0x01), "hello")
            .await
            .unwrap_err();
        assert!(matches!(err, WalletError::UnknownAccount(_)));
    }

    #[test]
    fn test_invalid_key() {
        assert!(LocalWallet::from_private_key("0xzz").is_err());
    }
}
