//! Compiled contract artifacts used for deployment

use std::path::{Path, PathBuf};

use dropper_common::{Error, Result};
use ethers::abi::Abi;
use ethers::types::Bytes;
use serde_json::Value;
use tracing::debug;

/// ABI and creation bytecode of one compiled contract
#[derive(Debug, Clone)]
pub struct ContractArtifact {
    /// Contract name (the artifact file stem)
    pub name: String,

    /// Contract ABI
    pub abi: Abi,

    /// Creation bytecode
    pub bytecode: Bytes,
}

impl ContractArtifact {
    /// Path of the artifact for `name` in `build_dir`
    pub fn path(build_dir: &Path, name: &str) -> PathBuf {
        build_dir.join(format!("{}.json", name))
    }

    /// Load `<build_dir>/<name>.json`
    pub fn load(build_dir: &Path, name: &str) -> Result<Self> {
        let path = Self::path(build_dir, name);
        if !path.is_file() {
            return Err(Error::config(format!(
                "File does not exist: {}. Maybe you have to compile the smart contracts?",
                path.display()
            )));
        }

        let content = std::fs::read_to_string(&path)?;
        let artifact = Self::parse(name, &content)
            .map_err(|e| Error::config(format!("{}: {}", path.display(), e)))?;
        debug!(contract = name, path = %path.display(), "Loaded contract artifact");
        Ok(artifact)
    }

    /// Parse a build artifact (brownie or hardhat layout)
    pub fn parse(name: &str, content: &str) -> Result<Self> {
        let build: Value = serde_json::from_str(content)?;

        let abi_json = build
            .get("abi")
            .ok_or_else(|| Error::config(format!("Could not find ABI definition for {}", name)))?;
        let abi: Abi = serde_json::from_value(abi_json.clone())?;

        let bytecode = build
            .get("bytecode")
            .and_then(Value::as_str)
            .filter(|code| !code.trim_start_matches("0x").is_empty())
            .ok_or_else(|| Error::config(format!("Could not find bytecode for {}", name)))?;
        let bytecode = hex::decode(bytecode.trim_start_matches("0x"))
            .map_err(|e| Error::config(format!("Invalid bytecode for {}: {}", name, e)))?;

        Ok(Self {
            name: name.to_string(),
            abi,
            bytecode: Bytes::from(bytecode),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    const ARTIFACT: &str = r#"{
        "contractName": "MockErc20",
        "abi": [
            {
                "inputs": [],
                "name": "totalSupply",
                "outputs": [{"internalType": "uint256", "name": "", "type": "uint256"}],
                "stateMutability": "view",
                "type": "function"
            }
        ],
        "bytecode": "6080604052"
    }"#;

    #[test]
    fn test_load_artifact() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("MockErc20.json"), ARTIFACT).unwrap();

        let artifact = ContractArtifact::load(dir.path(), "MockErc20").unwrap();
        assert_eq!(artifact.name, "MockErc20");
        assert!(artifact.abi.function("totalSupply").is_ok());
        assert_eq!(artifact.bytecode.to_vec(), vec![0x60, 0x80, 0x60, 0x40, 0x52]);
    }

    #[test]
    fn test_hardhat_prefixed_bytecode() {
        let content = ARTIFACT.replace("\"6080604052\"", "\"0x6080604052\"");
        let artifact = ContractArtifact::parse("MockErc20", &content).unwrap();
        assert_eq!(artifact.bytecode.len(), 5);
    }

    #[test]
    fn test_missing_artifact_suggests_compiling() {
        let dir = tempdir().unwrap();
        let err = ContractArtifact::load(dir.path(), "Dropper").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        assert!(err.to_string().contains("compile the smart contracts"));
    }

    #[test]
    fn test_artifact_without_bytecode_is_rejected() {
        let err = ContractArtifact::parse("Dropper", r#"{"abi": [], "bytecode": "0x"}"#).unwrap_err();
        assert!(matches!(err, Error::Config(_)));

        let err = ContractArtifact::parse("Dropper", r#"{"bytecode": "6080"}"#).unwrap_err();
        assert!(err.to_string().contains("ABI"));
    }
}
