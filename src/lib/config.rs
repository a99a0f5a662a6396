use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use alloy::primitives::{Address, B256};
use serde::Deserialize;

use crate::domain::merkle::{DEFAULT_TREE_DEPTH, MAX_TREE_DEPTH};
use crate::domain::nullifier::ExternalNullifierPolicy;
use crate::domain::proof::parse_field;
use crate::flow::FlowSettings;

/// Top-level configuration loaded from TOML.
#[derive(Debug, Deserialize)]
pub struct GreeterConfig {
    pub wallet: WalletConfig,
    pub chain: ChainConfig,
    pub registry: RegistryConfig,
    #[serde(default)]
    pub relay: RelayConfig,
    #[serde(default)]
    pub prover: ProverConfig,
    #[serde(default)]
    pub semaphore: SemaphoreConfig,
}

/// Where signatures come from. Exactly one source must be set.
#[derive(Debug, Default, Deserialize)]
pub struct WalletConfig {
    /// Local signing key.
    pub private_key: Option<String>,
    /// JSON-RPC endpoint answering `eth_requestAccounts` and `personal_sign`.
    pub rpc_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ChainConfig {
    pub rpc_url: String,
    pub greeter_address: Address,
    /// Event poll interval (e.g. "2s", "500ms"). Parsed via humantime.
    #[serde(with = "humantime_serde", default = "default_poll_interval")]
    pub poll_interval: Duration,
}

fn default_poll_interval() -> Duration {
    Duration::from_secs(2)
}

/// Where the member list lives. Exactly one source must be set.
#[derive(Debug, Default, Deserialize)]
pub struct RegistryConfig {
    /// e.g. "http://localhost:3000/identityCommitments.json"
    pub url: Option<String>,
    pub path: Option<PathBuf>,
}

#[derive(Debug, Deserialize)]
pub struct RelayConfig {
    /// Endpoint the client posts greetings to.
    #[serde(default = "default_relay_url")]
    pub url: String,
    /// Address the relay server binds.
    #[serde(default = "default_relay_listen")]
    pub listen: SocketAddr,
    /// Key the relay pays gas with. Required by the relay binary only.
    pub private_key: Option<String>,
    /// `identityCommitments.json` served at `GET /identityCommitments.json`.
    pub commitments_path: Option<PathBuf>,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            url: default_relay_url(),
            listen: default_relay_listen(),
            private_key: None,
            commitments_path: None,
        }
    }
}

fn default_relay_url() -> String {
    "http://localhost:3000/api/greet".into()
}

fn default_relay_listen() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 3000))
}

/// snarkjs binary and the circuit artifacts.
#[derive(Debug, Deserialize)]
pub struct ProverConfig {
    #[serde(default = "default_snarkjs")]
    pub snarkjs: PathBuf,
    #[serde(default = "default_wasm")]
    pub wasm: PathBuf,
    #[serde(default = "default_zkey")]
    pub zkey: PathBuf,
    #[serde(default = "default_work_dir")]
    pub work_dir: PathBuf,
}

impl Default for ProverConfig {
    fn default() -> Self {
        Self {
            snarkjs: default_snarkjs(),
            wasm: default_wasm(),
            zkey: default_zkey(),
            work_dir: default_work_dir(),
        }
    }
}

fn default_snarkjs() -> PathBuf {
    "snarkjs".into()
}

fn default_wasm() -> PathBuf {
    "./static/semaphore.wasm".into()
}

fn default_zkey() -> PathBuf {
    "./static/semaphore_final.zkey".into()
}

fn default_work_dir() -> PathBuf {
    std::env::temp_dir().join("semaphore-greeter")
}

#[derive(Debug, Deserialize)]
pub struct SemaphoreConfig {
    #[serde(default = "default_tree_depth")]
    pub tree_depth: usize,
    /// Fixed external nullifier (decimal or 0x hex). The membership root
    /// is used when absent.
    pub external_nullifier: Option<String>,
}

impl Default for SemaphoreConfig {
    fn default() -> Self {
        Self {
            tree_depth: DEFAULT_TREE_DEPTH,
            external_nullifier: None,
        }
    }
}

fn default_tree_depth() -> usize {
    DEFAULT_TREE_DEPTH
}

/// Which wallet adapter to build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WalletSource<'a> {
    PrivateKey(&'a str),
    Rpc(&'a str),
}

/// Which registry adapter to build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistrySource<'a> {
    Url(&'a str),
    Path(&'a Path),
}

/// Errors from config loading and validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("validation error: {0}")]
    Validation(String),
}

impl GreeterConfig {
    /// Load and validate a config from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parse and validate TOML text.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration invariants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.wallet_source()?;
        self.registry_source()?;

        let depth = self.semaphore.tree_depth;
        if depth == 0 || depth > MAX_TREE_DEPTH {
            return Err(ConfigError::Validation(format!(
                "semaphore.tree_depth must be between 1 and {MAX_TREE_DEPTH}, got {depth}"
            )));
        }

        self.external_nullifier_policy()?;
        Ok(())
    }

    pub fn wallet_source(&self) -> Result<WalletSource<'_>, ConfigError> {
        match (&self.wallet.private_key, &self.wallet.rpc_url) {
            (Some(key), None) => Ok(WalletSource::PrivateKey(key)),
            (None, Some(url)) => Ok(WalletSource::Rpc(url)),
            _ => Err(ConfigError::Validation(
                "exactly one of wallet.private_key and wallet.rpc_url must be set".into(),
            )),
        }
    }

    pub fn registry_source(&self) -> Result<RegistrySource<'_>, ConfigError> {
        match (&self.registry.url, &self.registry.path) {
            (Some(url), None) => Ok(RegistrySource::Url(url)),
            (None, Some(path)) => Ok(RegistrySource::Path(path)),
            _ => Err(ConfigError::Validation(
                "exactly one of registry.url and registry.path must be set".into(),
            )),
        }
    }

    pub fn external_nullifier_policy(&self) -> Result<ExternalNullifierPolicy, ConfigError> {
        match &self.semaphore.external_nullifier {
            None => Ok(ExternalNullifierPolicy::MembershipRoot),
            Some(text) => parse_field(text)
                .map(|value| ExternalNullifierPolicy::Fixed(B256::from(value)))
                .map_err(|e| {
                    ConfigError::Validation(format!("semaphore.external_nullifier: {e}"))
                }),
        }
    }

    pub fn flow_settings(&self) -> Result<FlowSettings, ConfigError> {
        Ok(FlowSettings {
            tree_depth: self.semaphore.tree_depth,
            external_nullifier: self.external_nullifier_policy()?,
        })
    }
}

/// The subset of the config file the relay server reads.
///
/// Shares the file format with `GreeterConfig`; the wallet, registry and
/// prover sections are ignored.
#[derive(Debug, Deserialize)]
pub struct RelayServerConfig {
    pub chain: ChainConfig,
    #[serde(default)]
    pub relay: RelayConfig,
}

impl RelayServerConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.private_key()?;
        Ok(config)
    }

    /// Key the relay pays gas with.
    pub fn private_key(&self) -> Result<&str, ConfigError> {
        self.relay.private_key.as_deref().ok_or_else(|| {
            ConfigError::Validation("relay.private_key required to run the relay".into())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::U256;

    const MINIMAL: &str = r#"
[wallet]
private_key = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80"

[chain]
rpc_url = "http://localhost:8545"
greeter_address = "0xe7f1725E7734CE288F8367e1Bb143E90bb3F0512"

[registry]
url = "http://localhost:3000/identityCommitments.json"
"#;

    #[test]
    fn test_parse_minimal_config() {
        let config = GreeterConfig::parse(MINIMAL).unwrap();

        assert_eq!(config.chain.poll_interval, Duration::from_secs(2));
        assert_eq!(config.relay.url, "http://localhost:3000/api/greet");
        assert_eq!(config.relay.listen.port(), 3000);
        assert_eq!(config.semaphore.tree_depth, 20);
        assert!(matches!(config.wallet_source().unwrap(), WalletSource::PrivateKey(_)));
        assert_eq!(
            config.registry_source().unwrap(),
            RegistrySource::Url("http://localhost:3000/identityCommitments.json")
        );
        assert_eq!(
            config.external_nullifier_policy().unwrap(),
            ExternalNullifierPolicy::MembershipRoot
        );
    }

    #[test]
    fn test_parse_full_config() {
        let toml = r#"
[wallet]
rpc_url = "http://localhost:8545"

[chain]
rpc_url = "http://localhost:8545"
greeter_address = "0xe7f1725E7734CE288F8367e1Bb143E90bb3F0512"
poll_interval = "500ms"

[registry]
path = "./identityCommitments.json"

[relay]
url = "http://relay.local/api/greet"
listen = "0.0.0.0:8080"
private_key = "0x59c6995e998f97a5a0044966f0945389dc9e86dae88c7a8412f4603b6b78690d"
commitments_path = "./identityCommitments.json"

[prover]
snarkjs = "/usr/local/bin/snarkjs"
wasm = "./artifacts/semaphore.wasm"
zkey = "./artifacts/semaphore_final.zkey"
work_dir = "./target/proofs"

[semaphore]
tree_depth = 16
external_nullifier = "42"
"#;
        let config = GreeterConfig::parse(toml).unwrap();

        assert_eq!(config.chain.poll_interval, Duration::from_millis(500));
        assert_eq!(config.wallet_source().unwrap(), WalletSource::Rpc("http://localhost:8545"));
        assert!(matches!(config.registry_source().unwrap(), RegistrySource::Path(_)));
        assert_eq!(config.relay.listen.port(), 8080);
        assert!(config.relay.private_key.is_some());
        assert_eq!(config.prover.work_dir, PathBuf::from("./target/proofs"));

        let settings = config.flow_settings().unwrap();
        assert_eq!(settings.tree_depth, 16);
        assert_eq!(
            settings.external_nullifier,
            ExternalNullifierPolicy::Fixed(B256::from(U256::from(42u64)))
        );
    }

    #[test]
    fn test_two_wallet_sources_rejected() {
        let toml = MINIMAL.replace(
            "[wallet]\n",
            "[wallet]\nrpc_url = \"http://localhost:8545\"\n",
        );
        let err = GreeterConfig::parse(&toml).unwrap_err();
        assert!(err.to_string().contains("wallet.private_key"));
    }

    #[test]
    fn test_missing_registry_source_rejected() {
        let toml = MINIMAL.replace(
            "url = \"http://localhost:3000/identityCommitments.json\"",
            "",
        );
        let err = GreeterConfig::parse(&toml).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(msg) if msg.contains("registry.url")));
    }

    #[test]
    fn test_tree_depth_bounds() {
        let toml = format!("{MINIMAL}\n[semaphore]\ntree_depth = 33\n");
        assert!(GreeterConfig::parse(&toml).is_err());

        let toml = format!("{MINIMAL}\n[semaphore]\ntree_depth = 0\n");
        assert!(GreeterConfig::parse(&toml).is_err());
    }

    #[test]
    fn test_bad_external_nullifier_rejected() {
        let toml = format!("{MINIMAL}\n[semaphore]\nexternal_nullifier = \"root\"\n");
        let err = GreeterConfig::parse(&toml).unwrap_err();
        assert!(err.to_string().contains("semaphore.external_nullifier"));
    }

    #[test]
    fn test_relay_config_ignores_client_sections() {
        let toml = format!(
            "{MINIMAL}\n[relay]\nprivate_key = \"0x59c6995e998f97a5a0044966f0945389dc9e86dae88c7a8412f4603b6b78690d\"\n"
        );
        let config = RelayServerConfig::parse(&toml).unwrap();
        assert_eq!(config.relay.listen.port(), 3000);
        assert!(config.private_key().unwrap().starts_with("0x59c6"));
    }

    #[test]
    fn test_relay_key_required_for_relay() {
        let err = RelayServerConfig::parse(MINIMAL).unwrap_err();
        assert!(err.to_string().contains("relay.private_key"));
    }

    #[test]
    fn test_bad_duration_is_parse_error() {
        let toml = MINIMAL.replace(
            "greeter_address = \"0xe7f1725E7734CE288F8367e1Bb143E90bb3F0512\"",
            "greeter_address = \"0xe7f1725E7734CE288F8367e1Bb143E90bb3F0512\"\npoll_interval = \"soon\"",
        );
        assert!(matches!(
            GreeterConfig::parse(&toml),
            Err(ConfigError::Parse(_))
        ));
    }
}
