//! Shared test doubles for the deployment integration tests.

#![allow(dead_code)]

use std::{
    collections::{HashMap, HashSet},
    sync::{Arc, Mutex},
};

use alloy_core::primitives::{Address, B256, Bytes, U256, address};
use anyhow::Result;
use mfil_deploy::{
    AccountState, Artifact, ArtifactSource, ChainClient, DeployError, FeeSnapshot, LedgerEntry,
    RunState, SubmittedCreation, Telemetry, TxOverrides, telemetry::fee_lines,
};

pub const DEPLOYER: Address = address!("0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266");

/// A submission seen by the mock chain.
#[derive(Debug, Clone)]
pub struct Submission {
    pub code: Bytes,
    pub overrides: TxOverrides,
    pub creation: SubmittedCreation,
}

#[derive(Debug, Default)]
struct MockState {
    nonce: u64,
    attempts: usize,
    scripted_addresses: Vec<Address>,
    submissions: Vec<Submission>,
    failing_submissions: HashSet<usize>,
    failing_confirmations: HashSet<Address>,
    confirmed: Vec<Address>,
}

/// In-memory chain. Clones share state, so a clone kept by the test observes
/// everything the orchestrator did.
#[derive(Debug, Clone)]
pub struct MockChainClient {
    fees: FeeSnapshot,
    balance: U256,
    state: Arc<Mutex<MockState>>,
}

impl Default for MockChainClient {
    fn default() -> Self {
        Self::new()
    }
}

impl MockChainClient {
    pub fn new() -> Self {
        Self {
            fees: FeeSnapshot::from_parts(Some(100), Some(1_000_000_000)),
            balance: U256::from(5_000_000_000_000_000_000u128),
            state: Arc::default(),
        }
    }

    pub fn with_fees(mut self, fees: FeeSnapshot) -> Self {
        self.fees = fees;
        self
    }

    /// Addresses handed out to the next submissions, in order.
    pub fn with_addresses(self, addresses: impl IntoIterator<Item = Address, IntoIter: DoubleEndedIterator>) -> Self {
        self.state.lock().unwrap().scripted_addresses = addresses.into_iter().rev().collect();
        self
    }

    /// Reject the submission with this ordinal (0-based, counted across runs).
    pub fn fail_submission(self, ordinal: usize) -> Self {
        self.state.lock().unwrap().failing_submissions.insert(ordinal);
        self
    }

    /// Never confirm the contract created at `address`.
    pub fn fail_confirmation(self, address: Address) -> Self {
        self.state.lock().unwrap().failing_confirmations.insert(address);
        self
    }

    pub fn submissions(&self) -> Vec<Submission> {
        self.state.lock().unwrap().submissions.clone()
    }

    pub fn confirmed(&self) -> Vec<Address> {
        self.state.lock().unwrap().confirmed.clone()
    }

    pub fn nonce(&self) -> u64 {
        self.state.lock().unwrap().nonce
    }

    /// Number of `submit_creation` calls, failed ones included.
    pub fn attempts(&self) -> usize {
        self.state.lock().unwrap().attempts
    }
}

impl ChainClient for MockChainClient {
    fn signer_address(&self) -> Address {
        DEPLOYER
    }

    fn chain_id(&self) -> u64 {
        31337
    }

    async fn balance(&self, _address: Address) -> Result<U256> {
        Ok(self.balance)
    }

    async fn transaction_count(&self, _address: Address) -> Result<u64> {
        Ok(self.state.lock().unwrap().nonce)
    }

    async fn fee_snapshot(&self) -> Result<FeeSnapshot> {
        Ok(self.fees)
    }

    async fn submit_creation(&self, code: Bytes, overrides: &TxOverrides) -> Result<SubmittedCreation> {
        let mut state = self.state.lock().unwrap();
        let ordinal = state.attempts;
        state.attempts += 1;
        if state.failing_submissions.contains(&ordinal) {
            anyhow::bail!("insufficient funds for gas * price + value");
        }

        let nonce = state.nonce;
        state.nonce += 1;
        let address = state
            .scripted_addresses
            .pop()
            .unwrap_or_else(|| DEPLOYER.create(nonce));
        let creation = SubmittedCreation {
            address,
            tx_hash: B256::left_padding_from(&nonce.to_be_bytes()),
            nonce,
            gas_limit: overrides.gas_limit.unwrap_or(3_000_000),
        };
        state.submissions.push(Submission {
            code,
            overrides: *overrides,
            creation,
        });
        Ok(creation)
    }

    async fn wait_for_confirmation(&self, creation: &SubmittedCreation) -> Result<()> {
        tokio::task::yield_now().await;
        let mut state = self.state.lock().unwrap();
        if state.failing_confirmations.contains(&creation.address) {
            anyhow::bail!("timeout waiting for receipt");
        }
        state.confirmed.push(creation.address);
        Ok(())
    }
}

/// Artifacts held in memory, keyed by artifact id.
#[derive(Debug, Default)]
pub struct MemoryArtifacts {
    artifacts: HashMap<String, Artifact>,
}

impl MemoryArtifacts {
    /// Add an artifact whose constructor takes `inputs` (solidity type names).
    pub fn with(mut self, name: &str, inputs: &[&str]) -> Self {
        self.artifacts
            .insert(name.to_string(), Artifact::from_json(&artifact_json(name, inputs)).unwrap());
        self
    }

    /// Artifacts for the whole MFil suite.
    pub fn mfil() -> Self {
        Self::default()
            .with("MConfig", &[])
            .with("MFacade", &["address"])
            .with("MFil", &["address", "string", "string"])
            .with("MNft", &["address", "string", "string"])
            .with("MStaker", &["address"])
            .with("MAccount", &[])
    }
}

impl ArtifactSource for MemoryArtifacts {
    async fn load(&self, artifact_id: &str) -> Result<Artifact> {
        self.artifacts
            .get(artifact_id)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("No artifact named {}", artifact_id))
    }
}

/// A minimal Hardhat artifact.
pub fn artifact_json(name: &str, inputs: &[&str]) -> String {
    let inputs = inputs
        .iter()
        .enumerate()
        .map(|(i, ty)| format!(r#"{{ "name": "arg{i}", "type": "{ty}", "internalType": "{ty}" }}"#))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        r#"{{
            "contractName": "{name}",
            "abi": [{{ "type": "constructor", "stateMutability": "nonpayable", "inputs": [{inputs}] }}],
            "bytecode": "0x60806040"
        }}"#
    )
}

/// Records everything reported, one line per event.
#[derive(Debug, Clone, Default)]
pub struct RecordingTelemetry {
    lines: Arc<Mutex<Vec<String>>>,
}

impl RecordingTelemetry {
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().unwrap().clone()
    }

    pub fn lines_with_prefix(&self, prefix: &str) -> Vec<String> {
        self.lines()
            .into_iter()
            .filter(|line| line.starts_with(prefix))
            .collect()
    }

    fn push(&self, line: String) {
        self.lines.lock().unwrap().push(line);
    }
}

impl Telemetry for RecordingTelemetry {
    fn account(&self, account: &AccountState) {
        self.push(format!("account {} {} {}", account.address, account.balance, account.nonce));
    }

    fn fees(&self, fees: &FeeSnapshot) {
        for (label, gwei) in fee_lines(fees) {
            self.push(format!("fee {label} {gwei}"));
        }
    }

    fn deployed(&self, entry: &LedgerEntry) {
        self.push(format!("deployed {} {}", entry.name, entry.address));
    }

    fn confirmed(&self, entry: &LedgerEntry) {
        self.push(format!("confirmed {}", entry.name));
    }

    fn finished(&self, state: RunState, error: Option<&DeployError>) {
        match error {
            None => self.push(format!("finished {state}")),
            Some(error) => self.push(format!("finished {state} {}", error.detail())),
        }
    }
}

/// The 32-byte ABI word for an address.
pub fn address_word(address: Address) -> [u8; 32] {
    let mut word = [0u8; 32];
    word[12..].copy_from_slice(address.as_slice());
    word
}
