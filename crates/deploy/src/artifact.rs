//! Compiled contract artifacts and the factories built from them.

use std::{
    future::Future,
    path::{Path, PathBuf},
};

use alloy_core::{
    dyn_abi::{DynSolValue, Specifier},
    json_abi::JsonAbi,
    primitives::Bytes,
};
use anyhow::Context;
use serde::Deserialize;

use crate::ConstructorArg;

/// Compiled bytecode and ABI of a contract.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Artifact {
    pub contract_name: String,
    pub abi: JsonAbi,
    pub bytecode: Bytes,
}

impl Artifact {
    /// Parse a Hardhat artifact (`{ contractName, abi, bytecode, ... }`).
    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        let artifact: Self = serde_json::from_str(json).context("Failed to parse artifact JSON")?;
        if artifact.bytecode.is_empty() {
            anyhow::bail!(
                "Artifact {} has no creation bytecode (abstract contract or interface?)",
                artifact.contract_name
            );
        }
        Ok(artifact)
    }
}

/// Resolves artifact identifiers to compiled artifacts.
pub trait ArtifactSource: Send + Sync {
    fn load(&self, artifact_id: &str) -> impl Future<Output = anyhow::Result<Artifact>> + Send;
}

/// Artifacts laid out by Hardhat: `<root>/contracts/<File>.sol/<Name>.json`.
#[derive(Debug, Clone)]
pub struct HardhatArtifacts {
    root: PathBuf,
}

impl HardhatArtifacts {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

/// Find `<artifact_id>.json` anywhere under `root`, outside Hardhat's `build-info`.
fn find_artifact(root: &Path, artifact_id: &str) -> anyhow::Result<PathBuf> {
    let pattern = format!(
        "{}/**/{}.json",
        glob::Pattern::escape(&root.display().to_string()),
        glob::Pattern::escape(artifact_id)
    );

    let mut matches = Vec::new();
    for path in glob::glob(&pattern).with_context(|| format!("Invalid artifact pattern {pattern}"))? {
        let path = path.context("Failed to read artifacts directory")?;
        let in_build_info = path
            .strip_prefix(root)
            .unwrap_or(&path)
            .components()
            .any(|component| component.as_os_str() == "build-info");
        if !in_build_info {
            matches.push(path);
        }
    }

    match matches.len() {
        0 => anyhow::bail!(
            "No artifact named {} under {}",
            artifact_id,
            root.display()
        ),
        1 => Ok(matches.remove(0)),
        _ => {
            matches.sort();
            anyhow::bail!(
                "Artifact name {} is ambiguous: {}",
                artifact_id,
                matches
                    .iter()
                    .map(|p| p.display().to_string())
                    .collect::<Vec<_>>()
                    .join(", ")
            )
        }
    }
}

impl ArtifactSource for HardhatArtifacts {
    async fn load(&self, artifact_id: &str) -> anyhow::Result<Artifact> {
        let root = self.root.clone();
        let id = artifact_id.to_string();
        let path = tokio::task::spawn_blocking(move || find_artifact(&root, &id))
            .await
            .context("Artifact lookup task failed")??;
        tracing::debug!(artifact = artifact_id, path = %path.display(), "Loading artifact");

        let content = tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Artifact::from_json(&content).with_context(|| format!("Invalid artifact {}", path.display()))
    }
}

/// Builds creation code for one artifact.
#[derive(Debug, Clone)]
pub struct ContractFactory {
    artifact: Artifact,
}

impl ContractFactory {
    pub fn new(artifact: Artifact) -> Self {
        Self { artifact }
    }

    /// Creation code: the bytecode followed by the ABI-encoded constructor arguments.
    ///
    /// The arguments are checked against the constructor declared in the ABI; a
    /// missing constructor accepts no arguments. The error is a plain reason string,
    /// the caller attaches the contract name.
    pub fn deploy_code(&self, args: &[ConstructorArg]) -> Result<Bytes, String> {
        let inputs = self
            .artifact
            .abi
            .constructor()
            .map(|constructor| constructor.inputs.as_slice())
            .unwrap_or_default();

        if inputs.len() != args.len() {
            return Err(format!(
                "constructor takes {} argument(s), got {}",
                inputs.len(),
                args.len()
            ));
        }

        let mut values = Vec::with_capacity(args.len());
        for (index, (param, arg)) in inputs.iter().zip(args).enumerate() {
            let ty = param
                .resolve()
                .map_err(|e| format!("unsupported constructor parameter type {}: {e}", param.ty))?;
            let value = match arg {
                ConstructorArg::Address(address) => DynSolValue::Address(*address),
                ConstructorArg::String(value) => DynSolValue::String(value.clone()),
            };
            if !ty.matches(&value) {
                return Err(format!(
                    "argument {} (`{}`) expects {}, got {}",
                    index, param.name, param.ty, arg
                ));
            }
            values.push(value);
        }

        let mut code = self.artifact.bytecode.to_vec();
        code.extend_from_slice(&DynSolValue::Tuple(values).abi_encode_params());
        Ok(code.into())
    }
}
