//! Deployment configuration.

use std::{
    fmt,
    path::{Path, PathBuf},
    time::Duration,
};

use alloy_signer_local::PrivateKeySigner;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::{DeployError, RpcConfig, TxOverrides};

/// Default RPC endpoint (Filecoin Hyperspace testnet).
pub const DEFAULT_RPC_URL: &str = "https://api.hyperspace.node.glif.io/rpc/v1";

/// Chain id of the default endpoint.
pub const DEFAULT_CHAIN_ID: u64 = 3141;

/// Default Hardhat artifacts directory.
pub const DEFAULT_ARTIFACTS_DIR: &str = "artifacts";

/// Everything a run needs besides the registry.
///
/// The private key is never serialized and is redacted from `Debug` output.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeployConfig {
    /// JSON-RPC endpoint.
    pub rpc_url: Url,
    /// Expected chain id of the endpoint.
    pub chain_id: u64,
    /// Hex-encoded private key of the deployer account.
    #[serde(skip_serializing)]
    pub private_key: Option<String>,
    /// Root of the compiled Hardhat artifacts.
    pub artifacts_dir: PathBuf,
    /// Treat a contract as final once its code is visible, without waiting for a
    /// receipt by transaction hash.
    pub skip_block_wait: bool,
    pub confirmation_timeout_secs: u64,
    pub poll_interval_secs: u64,
    /// Where to write the deployment ledger, if anywhere.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ledger_out: Option<PathBuf>,
    /// Overrides applied to every creation transaction.
    pub overrides: TxOverrides,
}

impl Default for DeployConfig {
    fn default() -> Self {
        Self {
            rpc_url: DEFAULT_RPC_URL.parse().expect("default RPC URL is valid"),
            chain_id: DEFAULT_CHAIN_ID,
            private_key: None,
            artifacts_dir: PathBuf::from(DEFAULT_ARTIFACTS_DIR),
            skip_block_wait: true,
            confirmation_timeout_secs: 600,
            poll_interval_secs: 5,
            ledger_out: None,
            overrides: TxOverrides::default(),
        }
    }
}

impl fmt::Debug for DeployConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeployConfig")
            .field("rpc_url", &self.rpc_url.as_str())
            .field("chain_id", &self.chain_id)
            .field(
                "private_key",
                &self.private_key.as_ref().map(|_| "<redacted>"),
            )
            .field("artifacts_dir", &self.artifacts_dir)
            .field("skip_block_wait", &self.skip_block_wait)
            .field("confirmation_timeout_secs", &self.confirmation_timeout_secs)
            .field("poll_interval_secs", &self.poll_interval_secs)
            .field("ledger_out", &self.ledger_out)
            .field("overrides", &self.overrides)
            .finish()
    }
}

impl DeployConfig {
    /// Check everything that can be checked without touching the network.
    pub fn validate(&self) -> Result<(), DeployError> {
        if !matches!(self.rpc_url.scheme(), "http" | "https") {
            return Err(DeployError::Configuration(format!(
                "RPC endpoint must be http(s), got {}",
                self.rpc_url
            )));
        }
        if self.chain_id == 0 {
            return Err(DeployError::Configuration("chain id must not be 0".to_string()));
        }
        if self.poll_interval_secs == 0 {
            return Err(DeployError::Configuration(
                "poll interval must be at least one second".to_string(),
            ));
        }
        self.signer()?;
        Ok(())
    }

    /// Parse the deployer's private key.
    pub fn signer(&self) -> Result<PrivateKeySigner, DeployError> {
        let key = self
            .private_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .ok_or_else(|| {
                DeployError::Configuration(
                    "no private key configured (set PRIVATE_KEY or MFIL_PRIVATE_KEY)".to_string(),
                )
            })?;

        key.parse::<PrivateKeySigner>()
            .map_err(|e| DeployError::Configuration(format!("invalid private key: {e}")))
    }

    /// Connection settings for the RPC chain client.
    pub fn rpc_config(&self) -> RpcConfig {
        RpcConfig {
            rpc_url: self.rpc_url.clone(),
            chain_id: self.chain_id,
            skip_block_wait: self.skip_block_wait,
            confirmation_timeout: Duration::from_secs(self.confirmation_timeout_secs),
            poll_interval: Duration::from_secs(self.poll_interval_secs),
        }
    }

    /// Save the configuration (without the private key) to a TOML file.
    pub fn save_to_file(&self, path: &Path) -> anyhow::Result<()> {
        let content =
            toml::to_string_pretty(self).context("Failed to serialize deploy config to TOML")?;
        std::fs::write(path, content)
            .context(format!("Failed to write config to {}", path.display()))?;
        tracing::info!(path = %path.display(), "Configuration saved");
        Ok(())
    }
}
