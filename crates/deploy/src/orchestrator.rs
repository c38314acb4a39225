//! Runs the whole deployment plan inside a single failure boundary.
//!
//! The run walks `NotStarted → FetchingAccountState → FetchingFeeSnapshot →
//! Deploying(0..n) → AwaitingConfirmations → AllConfirmed`. Any error moves it to
//! `Failed` and stops it: later registry entries are never attempted and
//! contracts already submitted are left in place.

use derive_more::Display;
use futures::future::join_all;

use crate::{
    AccountState, ArtifactSource, ChainClient, DeployError, DeploymentLedger, FeeSnapshot,
    LogTelemetry, Planner, Registry, SubmittedCreation, Telemetry, TxOverrides,
};

/// Where a run is, or where it stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum RunState {
    #[display("not-started")]
    NotStarted,
    #[display("fetching-account-state")]
    FetchingAccountState,
    #[display("fetching-fee-snapshot")]
    FetchingFeeSnapshot,
    /// Submitting the registry entry at this index.
    #[display("deploying({_0})")]
    Deploying(usize),
    #[display("awaiting-confirmations")]
    AwaitingConfirmations,
    #[display("all-confirmed")]
    AllConfirmed,
    #[display("failed")]
    Failed,
}

impl RunState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, RunState::AllConfirmed | RunState::Failed)
    }
}

/// What a run did, including partial progress on failure.
#[derive(Debug)]
pub struct RunReport {
    pub state: RunState,
    /// State the run was in when it failed.
    pub failed_at: Option<RunState>,
    pub account: Option<AccountState>,
    pub fees: Option<FeeSnapshot>,
    pub ledger: DeploymentLedger,
    /// The error that stopped the run first, followed by any further
    /// confirmation failures.
    pub errors: Vec<DeployError>,
}

impl RunReport {
    fn new() -> Self {
        Self {
            state: RunState::NotStarted,
            failed_at: None,
            account: None,
            fees: None,
            ledger: DeploymentLedger::default(),
            errors: Vec::new(),
        }
    }

    fn enter(&mut self, state: RunState) {
        tracing::debug!(from = %self.state, to = %state, "Run state transition");
        self.state = state;
    }

    pub fn is_success(&self) -> bool {
        self.state == RunState::AllConfirmed
    }

    /// The error that stopped the run.
    pub fn error(&self) -> Option<&DeployError> {
        self.errors.first()
    }

    /// Process exit status: 0 when everything was deployed and confirmed, 1 otherwise.
    pub fn exit_code(&self) -> u8 {
        if self.is_success() { 0 } else { 1 }
    }
}

/// Deploys a [`Registry`] through a [`ChainClient`].
pub struct Orchestrator<C, A> {
    client: C,
    artifacts: A,
    telemetry: Box<dyn Telemetry>,
    registry: Registry,
    overrides: TxOverrides,
}

impl<C: ChainClient, A: ArtifactSource> Orchestrator<C, A> {
    pub fn new(client: C, artifacts: A, registry: Registry) -> Self {
        Self {
            client,
            artifacts,
            telemetry: Box::new(LogTelemetry),
            registry,
            overrides: TxOverrides::default(),
        }
    }

    pub fn with_telemetry(mut self, telemetry: impl Telemetry + 'static) -> Self {
        self.telemetry = Box::new(telemetry);
        self
    }

    /// Overrides applied to every creation transaction.
    pub fn with_overrides(mut self, overrides: TxOverrides) -> Self {
        self.overrides = overrides;
        self
    }

    /// Run the whole plan. Never panics on remote failures; inspect the report.
    pub async fn run(&self) -> RunReport {
        let mut report = RunReport::new();

        tracing::info!(
            contracts = self.registry.len(),
            chain_id = self.client.chain_id(),
            "Starting deployment..."
        );

        match self.execute(&mut report).await {
            Ok(()) => report.enter(RunState::AllConfirmed),
            Err(error) => {
                report.failed_at = Some(report.state);
                report.enter(RunState::Failed);
                report.errors.insert(0, error);
            }
        }

        self.telemetry.finished(report.state, report.error());
        report
    }

    async fn execute(&self, report: &mut RunReport) -> Result<(), DeployError> {
        let signer = self.client.signer_address();

        report.enter(RunState::FetchingAccountState);
        let balance = self
            .client
            .balance(signer)
            .await
            .map_err(|source| DeployError::ChainQuery {
                what: "account balance",
                source,
            })?;
        let nonce = self
            .client
            .transaction_count(signer)
            .await
            .map_err(|source| DeployError::ChainQuery {
                what: "account nonce",
                source,
            })?;
        let account = AccountState {
            address: signer,
            balance,
            nonce,
        };
        self.telemetry.account(&account);
        report.account = Some(account);

        report.enter(RunState::FetchingFeeSnapshot);
        let fees = self
            .client
            .fee_snapshot()
            .await
            .map_err(|source| DeployError::ChainQuery {
                what: "fee snapshot",
                source,
            })?;
        self.telemetry.fees(&fees);
        report.fees = Some(fees);

        let planner = Planner::new(
            &self.client,
            &self.artifacts,
            self.telemetry.as_ref(),
            self.overrides,
        );
        for (index, spec) in self.registry.iter().enumerate() {
            report.enter(RunState::Deploying(index));
            planner.deploy(spec, &mut report.ledger).await?;
        }

        report.enter(RunState::AwaitingConfirmations);
        self.await_confirmations(report).await
    }

    /// Wait for every ledger entry concurrently; all failures are kept.
    async fn await_confirmations(&self, report: &mut RunReport) -> Result<(), DeployError> {
        let results = join_all(report.ledger.iter().map(|entry| async move {
            let result = self
                .client
                .wait_for_confirmation(&SubmittedCreation::from(entry))
                .await;
            (entry, result)
        }))
        .await;

        let mut failures = Vec::new();
        for (entry, result) in results {
            match result {
                Ok(()) => self.telemetry.confirmed(entry),
                Err(source) => {
                    let error = DeployError::Confirmation {
                        contract: entry.name.clone(),
                        tx_hash: entry.tx_hash.to_string(),
                        source,
                    };
                    tracing::error!(contract = %entry.name, error = %error.detail(), "Confirmation failed");
                    failures.push(error);
                }
            }
        }

        if failures.is_empty() {
            return Ok(());
        }
        let first = failures.remove(0);
        report.errors.extend(failures);
        Err(first)
    }
}
