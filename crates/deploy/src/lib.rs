//! mfil-deploy - Deployment library for the MFil contract suite.
//!
//! This crate deploys a fixed, ordered set of interdependent contracts to an
//! EVM-compatible network, binding constructor arguments from the addresses of
//! contracts deployed earlier in the same run.

mod artifact;
pub use artifact::{Artifact, ArtifactSource, ContractFactory, HardhatArtifacts};

pub mod client;
pub use client::{ChainClient, RpcChainClient, RpcConfig, SubmittedCreation, TxOverrides};

mod config;
pub use config::{DEFAULT_ARTIFACTS_DIR, DEFAULT_CHAIN_ID, DEFAULT_RPC_URL, DeployConfig};

mod error;
pub use error::DeployError;

mod ledger;
pub use ledger::{DeploymentLedger, LedgerEntry, LedgerFile};

mod orchestrator;
pub use orchestrator::{Orchestrator, RunReport, RunState};

mod planner;
pub use planner::Planner;

mod registry;
pub use registry::{ArgSource, ConstructorArg, ContractSpec, Registry, RegistryBuilder};

mod snapshot;
pub use snapshot::{AccountState, DEFAULT_PRIORITY_FEE, FeeSnapshot};

pub mod telemetry;
pub use telemetry::{LogTelemetry, Telemetry};
