use std::path::PathBuf;

use clap::Parser;
use tracing::level_filters::LevelFilter;
use url::Url;

/// Known networks, or a custom RPC URL.
#[derive(Debug, Clone, PartialEq, Eq, Hash, strum::Display, strum::EnumString)]
#[strum(serialize_all = "kebab-case")]
pub enum Network {
    /// Filecoin Hyperspace testnet.
    Hyperspace,
    /// Filecoin Calibration testnet.
    Calibration,
    /// Filecoin mainnet.
    Mainnet,
    #[strum(default)]
    Custom(String),
}

impl Network {
    pub fn rpc_url(&self) -> anyhow::Result<Url> {
        let url = match self {
            Network::Hyperspace => "https://api.hyperspace.node.glif.io/rpc/v1",
            Network::Calibration => "https://api.calibration.node.glif.io/rpc/v1",
            Network::Mainnet => "https://api.node.glif.io/rpc/v1",
            Network::Custom(url) => url,
        };
        url.parse()
            .map_err(|e| anyhow::anyhow!("Invalid RPC URL '{}': {}", url, e))
    }

    /// Chain id of a known network. Custom endpoints need `--chain-id`.
    pub fn chain_id(&self) -> Option<u64> {
        match self {
            Network::Hyperspace => Some(3141),
            Network::Calibration => Some(314159),
            Network::Mainnet => Some(314),
            Network::Custom(_) => None,
        }
    }
}

#[derive(Parser)]
#[command(name = "mfil")]
#[command(
    author,
    version,
    about = "Deploy the MFil contract suite to a Filecoin EVM network"
)]
pub struct Cli {
    /// The verbosity level.
    #[arg(short, long, env = "MFIL_VERBOSITY", default_value_t = LevelFilter::INFO)]
    pub verbosity: LevelFilter,

    /// Path to a TOML configuration file.
    ///
    /// Values from the file are overridden by `MFIL_*` environment variables,
    /// which are in turn overridden by command line flags.
    #[arg(short, long, alias = "conf", env = "MFIL_CONFIG")]
    pub config: Option<PathBuf>,

    /// Write the resolved configuration (without the private key) to this TOML file
    /// before deploying. It can be passed back with `--config`.
    #[arg(long)]
    pub save_config: Option<PathBuf>,

    /// Network preset (hyperspace, calibration, mainnet) or a custom RPC URL.
    #[arg(short, long, alias = "rpc")]
    pub network: Option<Network>,

    /// Chain id of the RPC endpoint. Required for custom RPC URLs unless set in the config.
    #[arg(long)]
    pub chain_id: Option<u64>,

    /// Root of the compiled Hardhat artifacts.
    #[arg(long, alias = "artifacts")]
    pub artifacts_dir: Option<PathBuf>,

    /// Write the deployment ledger as JSON to this path.
    #[arg(long)]
    pub ledger_out: Option<PathBuf>,

    /// Consider a contract final once its code is visible instead of waiting for a
    /// receipt by transaction hash.
    #[arg(long)]
    pub skip_block_wait: Option<bool>,

    /// Maximum time to wait for each contract to be confirmed, in seconds.
    #[arg(long)]
    pub confirmation_timeout: Option<u64>,

    /// Gas limit for every creation transaction. Estimated by the node if not set.
    #[arg(long)]
    pub gas_limit: Option<u64>,
}
