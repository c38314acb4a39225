//! Chain client capability consumed by the deployment planner.

use std::future::Future;

use alloy_core::primitives::{Address, B256, Bytes, U256};
use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::FeeSnapshot;

pub mod rpc;

pub use rpc::{RpcChainClient, RpcConfig};

/// Per-transaction overrides passed through unchanged to every creation submission.
///
/// All fields are optional; the default leaves everything to the chain client.
/// Fees are in wei and kept as `u64` so the config stays TOML-serializable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TxOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gas_limit: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<U256>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gas_price: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_fee_per_gas: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_priority_fee_per_gas: Option<u64>,
}

impl TxOverrides {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// A creation transaction acknowledged by the network, not necessarily mined.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubmittedCreation {
    /// Address the contract will live at.
    pub address: Address,
    pub tx_hash: B256,
    pub nonce: u64,
    pub gas_limit: u64,
}

/// Remote ledger operations needed to run a deployment.
///
/// Every method is a suspension point. Implementations own their own timeouts;
/// a timeout is reported as an ordinary error.
pub trait ChainClient: Send + Sync {
    /// The account that signs creation transactions.
    fn signer_address(&self) -> Address;

    /// Chain id the client submits to.
    fn chain_id(&self) -> u64;

    /// Balance in wei.
    fn balance(&self, address: Address) -> impl Future<Output = Result<U256>> + Send;

    /// Number of transactions sent from `address`.
    fn transaction_count(&self, address: Address) -> impl Future<Output = Result<u64>> + Send;

    /// Current fee estimates.
    fn fee_snapshot(&self) -> impl Future<Output = Result<FeeSnapshot>> + Send;

    /// Submit a contract-creation transaction and return once the network has
    /// acknowledged it.
    fn submit_creation(
        &self,
        code: Bytes,
        overrides: &TxOverrides,
    ) -> impl Future<Output = Result<SubmittedCreation>> + Send;

    /// Wait until a submitted creation transaction is final.
    fn wait_for_confirmation(
        &self,
        creation: &SubmittedCreation,
    ) -> impl Future<Output = Result<()>> + Send;
}
