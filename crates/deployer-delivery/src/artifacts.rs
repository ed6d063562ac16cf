//! Compiled contract artifacts.
//!
//! Loads contract JSON produced by Truffle (`build/contracts/<Name>.json`) or
//! Foundry (`out/<Name>.sol/<Name>.json`) and builds creation init code by
//! appending ABI-encoded constructor arguments to the bytecode.

use crate::DeployError;
use alloy_dyn_abi::{DynSolType, DynSolValue, Specifier};
use alloy_json_abi::JsonAbi;
use alloy_primitives::Bytes;
use deployer_types::{utils::decode_hex, ResolvedArg};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Locates artifacts by contract name inside a build directory.
#[derive(Debug, Clone)]
pub struct ArtifactLoader {
	path: PathBuf,
}

impl ArtifactLoader {
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self { path: path.into() }
	}

	/// Directory searched for artifacts.
	pub fn path(&self) -> &Path {
		&self.path
	}

	/// Loads and parses the artifact for `contract_name`.
	pub fn load(&self, contract_name: &str) -> Result<Artifact, DeployError> {
		let possible_paths = [
			self.path.join(format!("{}.json", contract_name)),
			self.path
				.join(format!("{}.sol", contract_name))
				.join(format!("{}.json", contract_name)),
		];

		for path in possible_paths {
			if path.exists() {
				debug!(contract_name, path = %path.display(), "Loading artifact");
				let content = std::fs::read_to_string(&path).map_err(|e| {
					DeployError::InvalidArtifact(format!("Failed to read {}: {}", path.display(), e))
				})?;
				let json: Value = serde_json::from_str(&content).map_err(|e| {
					DeployError::InvalidArtifact(format!("Invalid JSON in {}: {}", path.display(), e))
				})?;
				return Artifact::from_json(contract_name, &json);
			}
		}

		Err(DeployError::ArtifactNotFound(format!(
			"{} not found in {}",
			contract_name,
			self.path.display()
		)))
	}
}

/// ABI and creation bytecode of one contract.
#[derive(Debug, Clone)]
pub struct Artifact {
	pub name: String,
	pub abi: JsonAbi,
	pub bytecode: Bytes,
}

impl Artifact {
	/// Parses an artifact JSON document.
	///
	/// `bytecode` may be a hex string (Truffle) or an object with an `object`
	/// field (Foundry).
	pub fn from_json(name: &str, json: &Value) -> Result<Self, DeployError> {
		let abi_value = json.get("abi").cloned().ok_or_else(|| {
			DeployError::InvalidArtifact(format!("No ABI found in artifact for {}", name))
		})?;
		let abi: JsonAbi = serde_json::from_value(abi_value)
			.map_err(|e| DeployError::InvalidArtifact(format!("Invalid ABI for {}: {}", name, e)))?;

		let bytecode_str = json
			.get("bytecode")
			.and_then(|b| b.as_str().or_else(|| b.get("object").and_then(|o| o.as_str())))
			.ok_or_else(|| {
				DeployError::InvalidArtifact(format!("No bytecode found in artifact for {}", name))
			})?;

		let bytecode = decode_hex(bytecode_str).map_err(|e| {
			DeployError::InvalidArtifact(format!("Invalid bytecode hex for {}: {}", name, e))
		})?;

		// Interfaces and abstract contracts compile to empty bytecode
		if bytecode.is_empty() {
			return Err(DeployError::InvalidArtifact(format!(
				"{} has no creation bytecode",
				name
			)));
		}

		Ok(Self {
			name: name.to_string(),
			abi,
			bytecode: Bytes::from(bytecode),
		})
	}

	/// Builds the creation payload: bytecode followed by encoded constructor args.
	pub fn init_code(&self, args: &[ResolvedArg]) -> Result<Bytes, DeployError> {
		let encoded = self.encode_constructor_args(args)?;
		if encoded.is_empty() {
			return Ok(self.bytecode.clone());
		}

		let mut data = self.bytecode.to_vec();
		data.extend_from_slice(&encoded);
		Ok(Bytes::from(data))
	}

	/// ABI-encodes `args` against the constructor inputs.
	fn encode_constructor_args(&self, args: &[ResolvedArg]) -> Result<Vec<u8>, DeployError> {
		let inputs = self
			.abi
			.constructor
			.as_ref()
			.map(|c| c.inputs.as_slice())
			.unwrap_or_default();

		if inputs.len() != args.len() {
			return Err(DeployError::Encoding(format!(
				"{} constructor expects {} arguments, got {}",
				self.name,
				inputs.len(),
				args.len()
			)));
		}

		if inputs.is_empty() {
			return Ok(Vec::new());
		}

		let mut values = Vec::with_capacity(args.len());
		for (param, arg) in inputs.iter().zip(args) {
			let ty: DynSolType = param.resolve().map_err(|e| {
				DeployError::Encoding(format!(
					"Unsupported constructor parameter {} of {}: {}",
					param.name, self.name, e
				))
			})?;
			values.push(coerce_arg(&ty, arg).map_err(|e| {
				DeployError::Encoding(format!(
					"Argument {} for parameter {} ({}) of {}: {}",
					arg, param.name, param.ty, self.name, e
				))
			})?);
		}

		Ok(DynSolValue::Tuple(values).abi_encode_params())
	}
}

fn coerce_arg(ty: &DynSolType, arg: &ResolvedArg) -> Result<DynSolValue, String> {
	match (ty, arg) {
		(DynSolType::String, ResolvedArg::Literal(value)) => Ok(DynSolValue::String(value.clone())),
		(DynSolType::Address, ResolvedArg::Address(address)) => Ok(DynSolValue::Address(*address)),
		_ => ty.coerce_str(&arg.to_string()).map_err(|e| e.to_string()),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use deployer_types::{Address, U256};
	use serde_json::json;
	use tempfile::TempDir;

	fn chama_abi() -> Value {
		json!([
			{
				"type": "constructor",
				"stateMutability": "nonpayable",
				"inputs": [
					{ "name": "_treasurer", "type": "address", "internalType": "address" },
					{ "name": "_priceFeed", "type": "address", "internalType": "address" },
					{ "name": "_userRegistry", "type": "address", "internalType": "address" }
				]
			}
		])
	}

	fn write_artifact(path: &Path, value: &Value) {
		std::fs::create_dir_all(path.parent().unwrap()).unwrap();
		std::fs::write(path, serde_json::to_string(value).unwrap()).unwrap();
	}

	#[test]
	fn test_load_truffle_layout() {
		let dir = TempDir::new().unwrap();
		write_artifact(
			&dir.path().join("UserRegistry.json"),
			&json!({ "contractName": "UserRegistry", "abi": [], "bytecode": "0x6080" }),
		);

		let artifact = ArtifactLoader::new(dir.path()).load("UserRegistry").unwrap();

		assert_eq!(artifact.bytecode.to_vec(), vec![0x60, 0x80]);
		assert!(artifact.abi.constructor.is_none());
	}

	#[test]
	fn test_load_foundry_layout() {
		let dir = TempDir::new().unwrap();
		write_artifact(
			&dir.path().join("Chama.sol").join("Chama.json"),
			&json!({ "abi": chama_abi(), "bytecode": { "object": "0x60806040" } }),
		);

		let artifact = ArtifactLoader::new(dir.path()).load("Chama").unwrap();

		assert_eq!(artifact.bytecode.len(), 4);
		assert_eq!(artifact.abi.constructor.as_ref().unwrap().inputs.len(), 3);
	}

	#[test]
	fn test_load_missing_artifact() {
		let dir = TempDir::new().unwrap();

		let result = ArtifactLoader::new(dir.path()).load("Chama");

		assert!(matches!(result, Err(DeployError::ArtifactNotFound(_))));
	}

	#[test]
	fn test_empty_bytecode_rejected() {
		let result = Artifact::from_json("IUserRegistry", &json!({ "abi": [], "bytecode": "0x" }));

		assert!(matches!(result, Err(DeployError::InvalidArtifact(_))));
	}

	#[test]
	fn test_missing_bytecode_rejected() {
		let result = Artifact::from_json("Chama", &json!({ "abi": chama_abi() }));

		assert!(matches!(result, Err(DeployError::InvalidArtifact(_))));
	}

	#[test]
	fn test_init_code_without_constructor() {
		let artifact =
			Artifact::from_json("UserRegistry", &json!({ "abi": [], "bytecode": "0x6080" })).unwrap();

		let init_code = artifact.init_code(&[]).unwrap();

		assert_eq!(init_code, artifact.bytecode);
	}

	#[test]
	fn test_init_code_appends_encoded_addresses() {
		let artifact =
			Artifact::from_json("Chama", &json!({ "abi": chama_abi(), "bytecode": "0x6080" }))
				.unwrap();
		let registry = Address::repeat_byte(0x33);

		let init_code = artifact
			.init_code(&[
				ResolvedArg::Literal("0x6eb0da3d32b30bfa2e28284fea04cec13c74cd99".to_string()),
				ResolvedArg::Literal("0x5fb1616f78da7afc9ff79e0371741a747d2a7f22".to_string()),
				ResolvedArg::Address(registry),
			])
			.unwrap();

		assert_eq!(init_code.len(), 2 + 3 * 32);
		assert_eq!(&init_code[..2], &[0x60, 0x80]);
		// Last word holds the registry address, left-padded to 32 bytes
		assert_eq!(&init_code[2 + 64..2 + 64 + 12], &[0u8; 12]);
		assert_eq!(&init_code[2 + 64 + 12..], registry.as_slice());
	}

	#[test]
	fn test_init_code_coerces_numbers() {
		let abi = json!([
			{
				"type": "constructor",
				"stateMutability": "nonpayable",
				"inputs": [{ "name": "_fee", "type": "uint256", "internalType": "uint256" }]
			}
		]);
		let artifact =
			Artifact::from_json("Fee", &json!({ "abi": abi, "bytecode": "0x00" })).unwrap();

		let init_code = artifact
			.init_code(&[ResolvedArg::Number(U256::from(258u64))])
			.unwrap();

		assert_eq!(init_code.len(), 1 + 32);
		assert_eq!(&init_code[31..], &[0x01, 0x02]);
	}

	#[test]
	fn test_init_code_arity_mismatch() {
		let artifact =
			Artifact::from_json("Chama", &json!({ "abi": chama_abi(), "bytecode": "0x6080" }))
				.unwrap();

		let result = artifact.init_code(&[ResolvedArg::Address(Address::ZERO)]);

		assert!(matches!(result, Err(DeployError::Encoding(ref msg)) if msg.contains("expects 3")));
	}

	#[test]
	fn test_init_code_rejects_bad_address_literal() {
		let artifact =
			Artifact::from_json("Chama", &json!({ "abi": chama_abi(), "bytecode": "0x6080" }))
				.unwrap();

		let result = artifact.init_code(&[
			ResolvedArg::Literal("not-an-address".to_string()),
			ResolvedArg::Address(Address::ZERO),
			ResolvedArg::Address(Address::ZERO),
		]);

		assert!(matches!(result, Err(DeployError::Encoding(_))));
	}
}
