//! Error taxonomy for a deployment run.

/// Errors that stop a deployment run.
///
/// Collaborators (chain client, artifact loading) report failures as
/// [`anyhow::Error`]; the planner wraps them here together with the name of the
/// contract being deployed. Nothing in the orchestrator retries or recovers from
/// any of these.
#[derive(Debug, thiserror::Error)]
pub enum DeployError {
    /// Missing or invalid signer, endpoint or chain id.
    #[error("invalid configuration: {0}")]
    Configuration(String),

    /// Account state or fee estimates could not be read before deploying.
    #[error("failed to fetch {what}")]
    ChainQuery {
        what: &'static str,
        #[source]
        source: anyhow::Error,
    },

    /// The artifact registered for a contract could not be loaded.
    #[error("failed to load artifact `{artifact}` for {contract}")]
    Artifact {
        contract: String,
        artifact: String,
        #[source]
        source: anyhow::Error,
    },

    /// The bound constructor arguments do not fit the artifact's constructor.
    #[error("constructor arguments for {contract} do not match artifact `{artifact}`: {reason}")]
    ArgumentMismatch {
        contract: String,
        artifact: String,
        reason: String,
    },

    /// A binding needs the address of a contract that is not in the ledger yet.
    #[error("{contract} needs the address of {dependency}, which has not been deployed in this run")]
    OrderingPrecondition { contract: String, dependency: String },

    /// The ledger already holds an entry for this name.
    #[error("ledger already holds an entry for {0}")]
    DuplicateEntry(String),

    /// The chain client rejected or timed out on a creation transaction.
    #[error("failed to submit creation transaction for {contract}")]
    Submission {
        contract: String,
        #[source]
        source: anyhow::Error,
    },

    /// A submitted creation transaction never reached finality.
    #[error("creation transaction {tx_hash} for {contract} was not confirmed")]
    Confirmation {
        contract: String,
        tx_hash: String,
        #[source]
        source: anyhow::Error,
    },
}

impl DeployError {
    /// The contract this error is attributed to, if any.
    pub fn contract(&self) -> Option<&str> {
        match self {
            Self::Artifact { contract, .. }
            | Self::ArgumentMismatch { contract, .. }
            | Self::OrderingPrecondition { contract, .. }
            | Self::Submission { contract, .. }
            | Self::Confirmation { contract, .. } => Some(contract),
            Self::DuplicateEntry(name) => Some(name),
            Self::Configuration(_) | Self::ChainQuery { .. } => None,
        }
    }

    /// Full cause chain rendered on one line, outermost first.
    pub fn detail(&self) -> String {
        let mut detail = self.to_string();
        let mut source = std::error::Error::source(self);
        while let Some(cause) = source {
            detail.push_str(": ");
            detail.push_str(&cause.to_string());
            source = cause.source();
        }
        detail
    }
}
