//! Layered configuration: defaults, then the TOML file, then the environment,
//! then command line flags.

use std::path::PathBuf;

use anyhow::{Context, Result};
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use mfil_deploy::DeployConfig;
use serde::Serialize;
use url::Url;

use crate::cli::Cli;

/// Values set explicitly on the command line. Unset flags are left out so they
/// don't shadow lower layers.
#[derive(Debug, Default, Serialize)]
struct CliOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    rpc_url: Option<Url>,
    #[serde(skip_serializing_if = "Option::is_none")]
    chain_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    artifacts_dir: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    ledger_out: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    skip_block_wait: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    confirmation_timeout_secs: Option<u64>,
    #[serde(skip_serializing_if = "GasOverrides::is_empty")]
    overrides: GasOverrides,
}

#[derive(Debug, Default, Serialize)]
struct GasOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    gas_limit: Option<u64>,
}

impl GasOverrides {
    fn is_empty(&self) -> bool {
        self.gas_limit.is_none()
    }
}

impl CliOverrides {
    fn from_cli(cli: &Cli) -> Result<Self> {
        let (rpc_url, network_chain_id) = match &cli.network {
            Some(network) => (Some(network.rpc_url()?), network.chain_id()),
            None => (None, None),
        };

        Ok(Self {
            rpc_url,
            chain_id: cli.chain_id.or(network_chain_id),
            artifacts_dir: cli.artifacts_dir.clone(),
            ledger_out: cli.ledger_out.clone(),
            skip_block_wait: cli.skip_block_wait,
            confirmation_timeout_secs: cli.confirmation_timeout,
            overrides: GasOverrides {
                gas_limit: cli.gas_limit,
            },
        })
    }
}

/// Build the deployment configuration.
///
/// Precedence, lowest first: built-in defaults, `--config` TOML file, `PRIVATE_KEY`,
/// `MFIL_*` variables (`__` separates nested keys, e.g. `MFIL_OVERRIDES__GAS_PRICE`),
/// command line flags.
pub fn load(cli: &Cli) -> Result<DeployConfig> {
    let mut figment = Figment::from(Serialized::defaults(DeployConfig::default()));

    if let Some(path) = &cli.config {
        if !path.exists() {
            anyhow::bail!("Config file not found: {}", path.display());
        }
        tracing::debug!(path = %path.display(), "Reading configuration file");
        figment = figment.merge(Toml::file(path));
    }

    let figment = figment
        .merge(Env::raw().only(&["PRIVATE_KEY"]))
        .merge(Env::prefixed("MFIL_").split("__"))
        .merge(Serialized::defaults(CliOverrides::from_cli(cli)?));

    figment
        .extract::<DeployConfig>()
        .context("Failed to load configuration")
}

#[cfg(test)]
mod tests {
    use clap::Parser;
    use figment::Jail;

    use super::*;

    const DEV_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("mfil").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_defaults() {
        Jail::expect_with(|_jail| {
            let config = load(&parse(&[])).unwrap();
            assert_eq!(config.chain_id, 3141);
            assert!(config.skip_block_wait);
            assert!(config.overrides.is_empty());
            Ok(())
        });
    }

    #[test]
    fn test_layers_override_in_order() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "mfil.toml",
                r#"
                    chain_id = 314159
                    artifacts_dir = "build/artifacts"
                    poll_interval_secs = 2

                    [overrides]
                    gas_limit = 1000000
                    gas_price = 42
                "#,
            )?;
            jail.set_env("MFIL_POLL_INTERVAL_SECS", "3");
            jail.set_env("MFIL_OVERRIDES__GAS_PRICE", "7");

            let config = load(&parse(&["--config", "mfil.toml", "--gas-limit", "2000000"])).unwrap();

            assert_eq!(config.chain_id, 314159);
            assert_eq!(config.artifacts_dir, PathBuf::from("build/artifacts"));
            assert_eq!(config.poll_interval_secs, 3);
            assert_eq!(config.overrides.gas_price, Some(7));
            assert_eq!(config.overrides.gas_limit, Some(2_000_000));
            Ok(())
        });
    }

    #[test]
    fn test_prefixed_private_key_wins() {
        Jail::expect_with(|jail| {
            jail.set_env("PRIVATE_KEY", "0x1234");
            let config = load(&parse(&[])).unwrap();
            assert_eq!(config.private_key.as_deref(), Some("0x1234"));

            jail.set_env("MFIL_PRIVATE_KEY", DEV_KEY);
            let config = load(&parse(&[])).unwrap();
            assert_eq!(config.private_key.as_deref(), Some(DEV_KEY));
            config.validate().unwrap();
            Ok(())
        });
    }

    #[test]
    fn test_network_sets_endpoint_and_chain_id() {
        Jail::expect_with(|_jail| {
            let config = load(&parse(&["--network", "calibration"])).unwrap();
            assert_eq!(
                config.rpc_url.as_str(),
                "https://api.calibration.node.glif.io/rpc/v1"
            );
            assert_eq!(config.chain_id, 314159);

            let config = load(&parse(&[
                "--network",
                "http://127.0.0.1:1234/rpc/v1",
                "--chain-id",
                "31415926",
            ]))
            .unwrap();
            assert_eq!(config.rpc_url.port(), Some(1234));
            assert_eq!(config.chain_id, 31415926);
            Ok(())
        });
    }

    #[test]
    fn test_saved_config_loads_back() {
        Jail::expect_with(|jail| {
            jail.set_env("MFIL_PRIVATE_KEY", DEV_KEY);
            jail.set_env("MFIL_OVERRIDES__GAS_PRICE", "1000000000");
            let config = load(&parse(&["--network", "calibration", "--gas-limit", "6000000"])).unwrap();
            config.save_to_file(&jail.directory().join("saved.toml")).unwrap();

            jail.clear_env();
            let loaded = load(&parse(&["--config", "saved.toml"])).unwrap();
            assert_eq!(loaded.private_key, None);
            assert_eq!(loaded.rpc_url, config.rpc_url);
            assert_eq!(loaded.chain_id, 314159);
            assert_eq!(loaded.overrides.gas_price, Some(1_000_000_000));
            assert_eq!(loaded.overrides.gas_limit, Some(6_000_000));
            Ok(())
        });
    }

    #[test]
    fn test_missing_config_file() {
        Jail::expect_with(|_jail| {
            let err = load(&parse(&["--config", "absent.toml"])).unwrap_err();
            assert!(err.to_string().contains("absent.toml"));
            Ok(())
        });
    }
}
