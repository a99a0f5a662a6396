use alloy::primitives::Address;
use std::future::Future;

/// Port for the user's wallet.
///
/// Implementations:
/// - `LocalWallet` (alloy `PrivateKeySigner`)
/// - `RpcWallet` (`eth_requestAccounts` + `personal_sign` over JSON-RPC)
/// - `StaticWallet` for testing
pub trait Wallet: Send + Sync {
    /// Ask for account access. The first account is used for signing.
    fn request_accounts(&self) -> impl Future<Output = Result<Vec<Address>, WalletError>> + Send;

    /// Sign `message` as an EIP-191 personal message and return the
    /// `0x`-prefixed hex signature.
    fn sign_message(
        &self,
        account: Address,
        message: &str,
    ) -> impl Future<Output = Result<String, WalletError>> + Send;
}

#[derive(Debug, thiserror::Error)]
pub enum WalletError {
    #[error("user rejected the request")]
    UserRejected,

    #[error("no wallet provider available: {0}")]
    Unavailable(String),

    #[error("account {0} is not managed by this wallet")]
    UnknownAccount(Address),

    #[error("signing failed: {0}")]
    Signing(String),

    #[error("RPC error: {0}")]
    Rpc(String),
}
