use alloy::primitives::Address;
use alloy::providers::{DynProvider, Provider, ProviderBuilder};
use alloy::transports::TransportError;

use crate::ports::wallet::{Wallet, WalletError};

/// EIP-1193 code for "user rejected the request".
const USER_REJECTED_CODE: i64 = 4001;

/// Wallet reached over JSON-RPC (`eth_requestAccounts` + `personal_sign`).
///
/// Suitable for node-managed accounts or a browser-wallet bridge. The node
/// owns the keys and may prompt the user.
#[derive(Clone)]
pub struct RpcWallet {
    provider: DynProvider,
}

impl RpcWallet {
    pub fn new(rpc_url: &str) -> Result<Self, WalletError> {
        let provider = DynProvider::new(
            ProviderBuilder::new().connect_http(
                rpc_url
                    .parse()
                    .map_err(|e| WalletError::Unavailable(format!("Invalid RPC URL: {e}")))?,
            ),
        );
        Ok(Self { provider })
    }
}

fn map_rpc_error(err: TransportError) -> WalletError {
    match err.as_error_resp() {
        Some(payload) if payload.code == USER_REJECTED_CODE => WalletError::UserRejected,
        Some(payload) => WalletError::Rpc(payload.message.to_string()),
        None => WalletError::Unavailable(err.to_string()),
    }
}

impl Wallet for RpcWallet {
    async fn request_accounts(&self) -> Result<Vec<Address>, WalletError> {
        self.provider
            .raw_request::<_, Vec<Address>>("eth_requestAccounts".into(), Vec::<String>::new())
            .await
            .map_err(map_rpc_error)
    }

    async fn sign_message(&self, account: Address, message: &str) -> Result<String, WalletError> {
        let payload = format!("0x{}", hex::encode(message.as_bytes()));
        let signature: String = self
            .provider
            .raw_request("personal_sign".into(), (payload, account))
            .await
            .map_err(map_rpc_error)?;
        Ok(signature.to_lowercase())
    }
}
