//! [`ChainClient`] over an Ethereum JSON-RPC endpoint.

use std::{future::Future, time::Duration};

use alloy::{
    eips::BlockNumberOrTag,
    network::{EthereumWallet, ReceiptResponse, TransactionBuilder},
    providers::{DynProvider, Provider, ProviderBuilder},
    rpc::types::TransactionRequest,
};
use alloy_core::primitives::{Address, Bytes, U256};
use alloy_signer_local::PrivateKeySigner;
use anyhow::{Context, Result};
use url::Url;

use super::{ChainClient, SubmittedCreation, TxOverrides};
use crate::{DeployError, FeeSnapshot};

/// Default time to wait for a creation transaction to be final.
pub const DEFAULT_CONFIRMATION_TIMEOUT: Duration = Duration::from_secs(600);

/// Default interval between confirmation polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Connection settings for [`RpcChainClient`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RpcConfig {
    pub rpc_url: Url,
    /// Expected chain id; checked against the node on connect.
    pub chain_id: u64,
    /// Consider a creation final once code is visible at the contract address,
    /// instead of waiting for a receipt for the submitted hash.
    ///
    /// Some EVM-compatible networks (Filecoin FEVM) report transaction hashes
    /// that differ from the locally computed ones, so receipts by hash never
    /// show up.
    pub skip_block_wait: bool,
    pub confirmation_timeout: Duration,
    pub poll_interval: Duration,
}

impl RpcConfig {
    pub fn new(rpc_url: Url, chain_id: u64) -> Self {
        Self {
            rpc_url,
            chain_id,
            skip_block_wait: false,
            confirmation_timeout: DEFAULT_CONFIRMATION_TIMEOUT,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

/// Chain client signing with a local private key.
pub struct RpcChainClient {
    provider: DynProvider,
    signer: Address,
    config: RpcConfig,
}

impl RpcChainClient {
    /// Connect to the endpoint and check that it serves the expected chain.
    pub async fn connect(config: RpcConfig, signer: PrivateKeySigner) -> Result<Self, DeployError> {
        let signer_address = signer.address();
        let provider = ProviderBuilder::new()
            .wallet(EthereumWallet::from(signer))
            .connect_http(config.rpc_url.clone())
            .erased();

        Self::from_provider(provider, signer_address, config).await
    }

    /// Wrap a provider that signs for `signer`, checking the chain id it serves.
    pub async fn from_provider(
        provider: DynProvider,
        signer: Address,
        config: RpcConfig,
    ) -> Result<Self, DeployError> {
        let remote_chain_id = provider.get_chain_id().await.map_err(|e| {
            DeployError::Configuration(format!(
                "failed to query chain id from {}: {e}",
                config.rpc_url
            ))
        })?;

        if remote_chain_id != config.chain_id {
            return Err(DeployError::Configuration(format!(
                "{} serves chain {}, expected {}",
                config.rpc_url, remote_chain_id, config.chain_id
            )));
        }

        tracing::debug!(
            rpc_url = %config.rpc_url,
            chain_id = config.chain_id,
            signer = %signer,
            skip_block_wait = config.skip_block_wait,
            "Connected to RPC endpoint"
        );

        Ok(Self {
            provider,
            signer,
            config,
        })
    }
}

impl ChainClient for RpcChainClient {
    fn signer_address(&self) -> Address {
        self.signer
    }

    fn chain_id(&self) -> u64 {
        self.config.chain_id
    }

    async fn balance(&self, address: Address) -> Result<U256> {
        self.provider
            .get_balance(address)
            .await
            .context("eth_getBalance failed")
    }

    async fn transaction_count(&self, address: Address) -> Result<u64> {
        self.provider
            .get_transaction_count(address)
            .await
            .context("eth_getTransactionCount failed")
    }

    async fn fee_snapshot(&self) -> Result<FeeSnapshot> {
        let latest = self
            .provider
            .get_block_by_number(BlockNumberOrTag::Latest)
            .await
            .context("eth_getBlockByNumber failed")?;
        let base_fee = latest
            .and_then(|block| block.header.base_fee_per_gas)
            .map(u128::from);

        let gas_price = self
            .provider
            .get_gas_price()
            .await
            .context("eth_gasPrice failed")?;

        Ok(FeeSnapshot::from_parts(base_fee, Some(gas_price)))
    }

    async fn submit_creation(&self, code: Bytes, overrides: &TxOverrides) -> Result<SubmittedCreation> {
        let nonce = self
            .provider
            .get_transaction_count(self.signer)
            .pending()
            .await
            .context("Failed to fetch pending nonce")?;

        let mut tx = creation_request(self.signer, self.config.chain_id, code, nonce, overrides);

        let gas_limit = match overrides.gas_limit {
            Some(gas_limit) => gas_limit,
            None => self
                .provider
                .estimate_gas(tx.clone())
                .await
                .context("eth_estimateGas failed")?,
        };
        tx.set_gas_limit(gas_limit);

        let pending = self
            .provider
            .send_transaction(tx)
            .await
            .context("Failed to send creation transaction")?;

        let creation = SubmittedCreation {
            address: self.signer.create(nonce),
            tx_hash: *pending.tx_hash(),
            nonce,
            gas_limit,
        };
        tracing::debug!(
            tx_hash = %creation.tx_hash,
            nonce,
            gas_limit,
            address = %creation.address,
            "Creation transaction acknowledged"
        );
        Ok(creation)
    }

    async fn wait_for_confirmation(&self, creation: &SubmittedCreation) -> Result<()> {
        let timeout = self.config.confirmation_timeout;
        let interval = self.config.poll_interval;

        if self.config.skip_block_wait {
            let address = creation.address;
            poll_until(&format!("code at {address}"), timeout, interval, || async move {
                let code = self.provider.get_code_at(address).await?;
                Ok((!code.is_empty()).then_some(()))
            })
            .await?;
            return Ok(());
        }

        let tx_hash = creation.tx_hash;
        let receipt = poll_until(&format!("receipt for {tx_hash}"), timeout, interval, || async move {
            Ok(self.provider.get_transaction_receipt(tx_hash).await?)
        })
        .await?;

        if !receipt.status() {
            anyhow::bail!(
                "Creation transaction {} reverted in block {:?}",
                tx_hash,
                receipt.block_number()
            );
        }

        if receipt.contract_address().is_some_and(|address| address != creation.address) {
            tracing::warn!(
                expected = %creation.address,
                actual = ?receipt.contract_address(),
                "Contract created at an unexpected address"
            );
        }

        Ok(())
    }
}

/// Build an unsigned creation transaction with the overrides applied.
fn creation_request(
    from: Address,
    chain_id: u64,
    code: Bytes,
    nonce: u64,
    overrides: &TxOverrides,
) -> TransactionRequest {
    let mut tx = TransactionRequest::default()
        .with_from(from)
        .with_deploy_code(code)
        .with_nonce(nonce)
        .with_chain_id(chain_id);

    if let Some(value) = overrides.value {
        tx.set_value(value);
    }
    if let Some(gas_price) = overrides.gas_price {
        tx.set_gas_price(gas_price.into());
    }
    if let Some(max_fee) = overrides.max_fee_per_gas {
        tx.set_max_fee_per_gas(max_fee.into());
    }
    if let Some(priority_fee) = overrides.max_priority_fee_per_gas {
        tx.set_max_priority_fee_per_gas(priority_fee.into());
    }
    tx
}

/// Poll `check` until it yields a value.
///
/// `Ok(None)` means not ready yet. Errors are treated as transient and retried;
/// the last one is reported if the timeout expires.
pub async fn poll_until<T, F, Fut>(
    what: &str,
    timeout: Duration,
    interval: Duration,
    check: F,
) -> Result<T>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<Option<T>>>,
{
    let start = std::time::Instant::now();
    let mut last_error = None;

    loop {
        match check().await {
            Ok(Some(value)) => return Ok(value),
            Ok(None) => {
                tracing::trace!(what = %what, "Not ready yet, polling again...");
            }
            Err(e) => {
                tracing::trace!(error = %e, what = %what, "Poll failed, retrying...");
                last_error = Some(e);
            }
        }

        if start.elapsed() + interval > timeout {
            return Err(match last_error {
                Some(last) => last.context(format!("Timeout after {timeout:?} waiting for {what}")),
                None => anyhow::anyhow!("Timeout after {:?} waiting for {}", timeout, what),
            });
        }

        tokio::time::sleep(interval).await;
    }
}
