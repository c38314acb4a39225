//! Deploys one registry entry at a time against the ledger built so far.

use crate::{
    ArtifactSource, ChainClient, ContractFactory, ContractSpec, DeployError, DeploymentLedger,
    LedgerEntry, SubmittedCreation, Telemetry, TxOverrides,
};

/// Submits creation transactions for registry entries.
pub struct Planner<'a, C, A> {
    client: &'a C,
    artifacts: &'a A,
    telemetry: &'a dyn Telemetry,
    overrides: TxOverrides,
}

impl<'a, C: ChainClient, A: ArtifactSource> Planner<'a, C, A> {
    pub fn new(
        client: &'a C,
        artifacts: &'a A,
        telemetry: &'a dyn Telemetry,
        overrides: TxOverrides,
    ) -> Self {
        Self {
            client,
            artifacts,
            telemetry,
            overrides,
        }
    }

    /// Deploy `spec` and append it to `ledger`.
    ///
    /// Returns once the network has acknowledged the creation transaction; it does
    /// not wait for the transaction to be mined. The ledger is untouched on error.
    pub async fn deploy(
        &self,
        spec: &ContractSpec,
        ledger: &mut DeploymentLedger,
    ) -> Result<LedgerEntry, DeployError> {
        if ledger.get(spec.name).is_some() {
            return Err(DeployError::DuplicateEntry(spec.name.to_string()));
        }

        let artifact_id = spec.artifact_id();
        let artifact = self
            .artifacts
            .load(artifact_id)
            .await
            .map_err(|source| DeployError::Artifact {
                contract: spec.name.to_string(),
                artifact: artifact_id.to_string(),
                source,
            })?;
        let factory = ContractFactory::new(artifact);

        let args = spec.bind(ledger)?;
        tracing::debug!(
            contract = spec.name,
            artifact = artifact_id,
            args = ?args.iter().map(ToString::to_string).collect::<Vec<_>>(),
            "Bound constructor arguments"
        );

        let code = factory
            .deploy_code(&args)
            .map_err(|reason| DeployError::ArgumentMismatch {
                contract: spec.name.to_string(),
                artifact: artifact_id.to_string(),
                reason,
            })?;

        let creation = self
            .client
            .submit_creation(code, &self.overrides)
            .await
            .map_err(|source| DeployError::Submission {
                contract: spec.name.to_string(),
                source,
            })?;

        let entry = ledger
            .insert(LedgerEntry {
                name: spec.name.to_string(),
                artifact: artifact_id.to_string(),
                address: creation.address,
                tx_hash: creation.tx_hash,
                nonce: creation.nonce,
                gas_limit: creation.gas_limit,
            })?
            .clone();

        self.telemetry.deployed(&entry);
        Ok(entry)
    }
}

impl From<&LedgerEntry> for SubmittedCreation {
    fn from(entry: &LedgerEntry) -> Self {
        Self {
            address: entry.address,
            tx_hash: entry.tx_hash,
            nonce: entry.nonce,
            gas_limit: entry.gas_limit,
        }
    }
}
