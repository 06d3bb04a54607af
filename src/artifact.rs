use std::path::{Path, PathBuf};

use ethers::abi::{Abi, Constructor, Token};
use ethers::types::Bytes;
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::error::DeployError;

pub const DEFAULT_CONTRACT_NAME: &str = "EZIOTAMarketV1";

pub fn default_artifact_path() -> PathBuf {
    PathBuf::from(format!(
        "artifacts/contracts/{DEFAULT_CONTRACT_NAME}.sol/{DEFAULT_CONTRACT_NAME}.json"
    ))
}

/// Compiled contract: creation bytecode plus the ABI describing its constructor.
#[derive(Debug, Clone)]
pub struct ContractArtifact {
    pub contract_name: String,
    pub abi: Abi,
    pub bytecode: Bytes,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum BytecodeField {
    Hex(Bytes),
    Object { object: Bytes },
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ArtifactFile {
    #[serde(default)]
    contract_name: Option<String>,
    abi: Abi,
    bytecode: BytecodeField,
}

impl ContractArtifact {
    /// Accepts both Hardhat (`"bytecode": "0x.."`) and Foundry
    /// (`"bytecode": { "object": "0x.." }`) artifact layouts.
    pub fn from_json(
        fallback_name: &str,
        content: &str,
    ) -> Result<Self, DeployError> {
        let file: ArtifactFile = serde_json::from_str(content)
            .map_err(|err| DeployError::Artifact(err.to_string()))?;

        let bytecode = match file.bytecode {
            BytecodeField::Hex(bytes) => bytes,
            BytecodeField::Object { object } => object,
        };

        let contract_name =
            file.contract_name.unwrap_or_else(|| fallback_name.to_string());

        if bytecode.is_empty() {
            return Err(DeployError::Artifact(format!(
                "{contract_name} has no creation bytecode (abstract contract or interface?)"
            )));
        }

        Ok(Self {
            contract_name,
            abi: file.abi,
            bytecode,
        })
    }

    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, DeployError> {
        let path = path.as_ref();

        let content = tokio::fs::read_to_string(path).await.map_err(|err| {
            DeployError::Artifact(format!("reading {}: {err}", path.display()))
        })?;

        let fallback_name = path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or(DEFAULT_CONTRACT_NAME);

        let artifact = Self::from_json(fallback_name, &content)?;

        debug!(
            contract = %artifact.contract_name,
            bytecode_len = artifact.bytecode.len(),
            "Loaded artifact"
        );

        Ok(artifact)
    }

    pub fn constructor(&self) -> Option<&Constructor> {
        self.abi.constructor()
    }

    /// Creation payload: bytecode followed by the ABI encoded constructor args.
    pub fn creation_data(&self, args: &[Token]) -> Result<Bytes, DeployError> {
        match self.constructor() {
            Some(constructor) => constructor
                .encode_input(self.bytecode.to_vec(), args)
                .map(Bytes::from)
                .map_err(|err| DeployError::ParameterBinding(err.to_string())),
            None if args.is_empty() => Ok(self.bytecode.clone()),
            None => Err(DeployError::ParameterBinding(
                "artifact declares no constructor but arguments were supplied"
                    .to_string(),
            )),
        }
    }
}
