//! mfil deploys the MFil contract suite to a Filecoin EVM network in a single run.

mod cli;
mod config;

use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;

use cli::Cli;
use mfil_deploy::{
    ChainClient, HardhatArtifacts, LedgerFile, Orchestrator, Registry, RpcChainClient,
};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize the logger.
    tracing_subscriber::fmt()
        .with_max_level(cli.verbosity)
        .init();

    match run(cli).await {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<u8> {
    // A missing .env file is fine; PRIVATE_KEY may come from the environment.
    dotenv::dotenv().ok();

    let config = config::load(&cli)?;
    tracing::debug!(?config, "Configuration loaded");
    config.validate()?;

    if let Some(path) = &cli.save_config {
        config.save_to_file(path)?;
    }

    let signer = config.signer()?;
    let client = RpcChainClient::connect(config.rpc_config(), signer).await?;
    let deployer = client.signer_address();

    tracing::info!(
        rpc_url = %config.rpc_url,
        chain_id = config.chain_id,
        artifacts_dir = %config.artifacts_dir.display(),
        "Deploying the MFil suite..."
    );

    let report = Orchestrator::new(
        client,
        HardhatArtifacts::new(config.artifacts_dir.clone()),
        Registry::mfil(),
    )
    .with_overrides(config.overrides)
    .run()
    .await;

    if let Some(path) = &config.ledger_out {
        let ledger = LedgerFile {
            chain_id: config.chain_id,
            deployer,
            outcome: report.state.to_string(),
            contracts: report.ledger.clone(),
        };
        ledger.save_to_file(path)?;
    }

    Ok(report.exit_code())
}
