//! The fixed, ordered set of contracts deployed by a run.
//!
//! Each [`ContractSpec`] names the artifact it instantiates and describes its
//! constructor arguments as a list of [`ArgSource`]s. Arguments that reference
//! another contract are resolved against the [`DeploymentLedger`] at deploy time,
//! so the registry order must place every dependency before its dependents.

use std::fmt;

use alloy_core::primitives::Address;
use serde::Serialize;

use crate::{DeployError, DeploymentLedger};

/// Where one constructor argument comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArgSource {
    /// The address of a contract deployed earlier in the same run.
    LedgerAddress(&'static str),
    /// A fixed string.
    Literal(&'static str),
}

/// A resolved constructor argument.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ConstructorArg {
    Address(Address),
    String(String),
}

impl fmt::Display for ConstructorArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConstructorArg::Address(address) => write!(f, "{address}"),
            ConstructorArg::String(value) => write!(f, "{value:?}"),
        }
    }
}

/// A single contract instance in the deployment plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractSpec {
    /// Display name, unique within a registry. Also the ledger key.
    pub name: &'static str,
    /// Artifact to instantiate when it differs from `name`.
    pub artifact: Option<&'static str>,
    /// Constructor arguments, in order.
    pub args: Vec<ArgSource>,
}

impl ContractSpec {
    /// The artifact identifier, defaulting to the contract name.
    pub fn artifact_id(&self) -> &'static str {
        self.artifact.unwrap_or(self.name)
    }

    /// Names of the contracts whose addresses this spec needs.
    pub fn dependencies(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.args.iter().filter_map(|arg| match arg {
            ArgSource::LedgerAddress(name) => Some(*name),
            ArgSource::Literal(_) => None,
        })
    }

    /// Resolve the constructor arguments against the contracts deployed so far.
    pub fn bind(&self, ledger: &DeploymentLedger) -> Result<Vec<ConstructorArg>, DeployError> {
        self.args
            .iter()
            .map(|arg| match arg {
                ArgSource::LedgerAddress(dependency) => ledger
                    .address_of(dependency)
                    .map(ConstructorArg::Address)
                    .ok_or_else(|| DeployError::OrderingPrecondition {
                        contract: self.name.to_string(),
                        dependency: dependency.to_string(),
                    }),
                ArgSource::Literal(value) => Ok(ConstructorArg::String(value.to_string())),
            })
            .collect()
    }
}

/// Ordered list of contracts to deploy.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    specs: Vec<ContractSpec>,
}

impl Registry {
    /// Start building a registry.
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    /// The MFil deployment plan.
    ///
    /// `MConfig` goes first since every core contract takes its address. The three
    /// account roles all instantiate the generic `MAccount` artifact.
    pub fn mfil() -> Self {
        use ArgSource::{LedgerAddress, Literal};

        Self::builder()
            .contract("MConfig", [])
            .contract("MFacade", [LedgerAddress("MConfig")])
            .contract(
                "MFil",
                [LedgerAddress("MConfig"), Literal("mfil"), Literal("mfil")],
            )
            .contract(
                "MNft",
                [LedgerAddress("MConfig"), Literal("mnft"), Literal("mnft")],
            )
            .contract("MStaker", [LedgerAddress("MConfig")])
            .contract_as("Fil2MfilAccount", "MAccount", [])
            .contract_as("Mfil2FilAccount", "MAccount", [])
            .contract_as("ProfitAccount", "MAccount", [])
            .build()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ContractSpec> {
        self.specs.iter()
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    /// Contract names in deployment order.
    pub fn names(&self) -> Vec<&'static str> {
        self.specs.iter().map(|spec| spec.name).collect()
    }
}

impl<'a> IntoIterator for &'a Registry {
    type Item = &'a ContractSpec;
    type IntoIter = std::slice::Iter<'a, ContractSpec>;

    fn into_iter(self) -> Self::IntoIter {
        self.specs.iter()
    }
}

/// Builder for a [`Registry`]. Contracts are deployed in the order they are added.
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    specs: Vec<ContractSpec>,
}

impl RegistryBuilder {
    /// Add a contract that instantiates the artifact of the same name.
    pub fn contract(
        mut self,
        name: &'static str,
        args: impl IntoIterator<Item = ArgSource>,
    ) -> Self {
        self.specs.push(ContractSpec {
            name,
            artifact: None,
            args: args.into_iter().collect(),
        });
        self
    }

    /// Add a contract that instantiates a shared artifact under its own name.
    pub fn contract_as(
        mut self,
        name: &'static str,
        artifact: &'static str,
        args: impl IntoIterator<Item = ArgSource>,
    ) -> Self {
        self.specs.push(ContractSpec {
            name,
            artifact: Some(artifact),
            args: args.into_iter().collect(),
        });
        self
    }

    pub fn build(self) -> Registry {
        Registry { specs: self.specs }
    }
}
