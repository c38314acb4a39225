//! In-memory record of the contracts deployed by the current run.

use std::path::Path;

use alloy_core::primitives::{Address, B256};
use anyhow::Context;
use derive_more::Deref;
use serde::{Deserialize, Serialize};

use crate::DeployError;

/// One deployed contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// Contract name from the registry.
    pub name: String,
    /// Artifact the contract was instantiated from.
    pub artifact: String,
    /// Address of the created contract.
    pub address: Address,
    /// Hash of the creation transaction.
    pub tx_hash: B256,
    /// Nonce of the creation transaction.
    pub nonce: u64,
    /// Gas limit of the creation transaction.
    pub gas_limit: u64,
}

/// Append-only, ordered ledger of deployed contracts.
///
/// Entries keep registry order. Inserting a name twice is rejected; nothing is
/// ever removed or replaced.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Deref)]
#[serde(transparent)]
pub struct DeploymentLedger {
    entries: Vec<LedgerEntry>,
}

impl DeploymentLedger {
    /// Append an entry.
    pub fn insert(&mut self, entry: LedgerEntry) -> Result<&LedgerEntry, DeployError> {
        if self.get(&entry.name).is_some() {
            return Err(DeployError::DuplicateEntry(entry.name));
        }
        self.entries.push(entry);
        Ok(&self.entries[self.entries.len() - 1])
    }

    pub fn get(&self, name: &str) -> Option<&LedgerEntry> {
        self.entries.iter().find(|entry| entry.name == name)
    }

    pub fn address_of(&self, name: &str) -> Option<Address> {
        self.get(name).map(|entry| entry.address)
    }

    /// Contract names in insertion order.
    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|entry| entry.name.as_str()).collect()
    }

    pub fn into_entries(self) -> Vec<LedgerEntry> {
        self.entries
    }
}

/// Ledger file written at the end of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerFile {
    pub chain_id: u64,
    pub deployer: Address,
    /// Terminal state of the run, e.g. `all-confirmed` or `failed`.
    pub outcome: String,
    pub contracts: DeploymentLedger,
}

impl LedgerFile {
    /// Write the ledger as pretty JSON.
    pub fn save_to_file(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        let content =
            serde_json::to_string_pretty(self).context("Failed to serialize deployment ledger")?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write ledger to {}", path.display()))?;
        tracing::info!(path = %path.display(), "Deployment ledger saved");
        Ok(())
    }
}
