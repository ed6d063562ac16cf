//! Configuration module for the contract deployer.
//!
//! Loads the deployment plan and its surroundings (network endpoint, signing
//! key, artifact directory, external input addresses) from a TOML file.
//! `${VAR}` and `${VAR:-default}` placeholders are resolved from the process
//! environment before parsing, so addresses and keys never need to be written
//! into the file itself.

use deployer_types::{Address, ArgValue, DeploymentStep, SecretString, StepOptions};
use regex::Regex;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

/// Errors that can occur during configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
	/// Error that occurs during file I/O operations.
	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),
	/// Error that occurs when parsing TOML configuration.
	#[error("Configuration error: {0}")]
	Parse(String),
	/// Error that occurs when configuration validation fails.
	#[error("Validation error: {0}")]
	Validation(String),
}

impl From<toml::de::Error> for ConfigError {
	fn from(err: toml::de::Error) -> Self {
		// Keep the message, drop the echoed input
		ConfigError::Parse(err.message().to_string())
	}
}

/// Main configuration structure for a deployment run.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
	/// Network the contracts are deployed to.
	pub network: NetworkConfig,
	/// Account that signs the creation transactions.
	pub account: AccountConfig,
	/// Location of compiled contract artifacts.
	#[serde(default)]
	pub artifacts: ArtifactsConfig,
	/// Named external addresses that steps can pass as constructor arguments.
	#[serde(default)]
	pub inputs: BTreeMap<String, String>,
	/// Options applied to steps that do not set them.
	#[serde(default)]
	pub defaults: DefaultsConfig,
	/// Ordered deployment steps.
	#[serde(default)]
	pub steps: Vec<StepConfig>,
}

/// Network endpoint configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct NetworkConfig {
	/// HTTP JSON-RPC endpoint.
	pub rpc_url: String,
	/// Chain ID the signer binds transactions to.
	pub chain_id: u64,
}

/// Signing account configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AccountConfig {
	/// Hex-encoded private key of the deployer account.
	pub private_key: SecretString,
}

/// Artifact directory configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ArtifactsConfig {
	/// Directory holding `<Name>.json` or `<Name>.sol/<Name>.json` files.
	#[serde(default = "default_artifacts_path")]
	pub path: PathBuf,
}

impl Default for ArtifactsConfig {
	fn default() -> Self {
		Self {
			path: default_artifacts_path(),
		}
	}
}

/// Returns the default artifact directory (Truffle build output).
fn default_artifacts_path() -> PathBuf {
	PathBuf::from("build/contracts")
}

/// Default transaction options.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DefaultsConfig {
	/// Gas ceiling for steps without their own `gas_limit`.
	pub gas_limit: Option<u64>,
}

/// One `[[steps]]` entry.
#[derive(Debug, Clone, Deserialize)]
pub struct StepConfig {
	/// Contract artifact name.
	pub name: String,
	/// Constructor arguments in order.
	#[serde(default)]
	pub args: Vec<ArgConfig>,
	/// Gas ceiling for this step's creation transaction.
	pub gas_limit: Option<u64>,
}

/// A constructor argument as written in TOML.
///
/// - `"text"` is passed through as a literal
/// - `42` is a number
/// - `{ ref = "UserRegistry" }` is the address of an earlier step
/// - `{ input = "treasurer" }` is the value of `inputs.treasurer`
///
/// Tables must carry exactly one of the two keys.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(
	untagged,
	expecting = "a constructor argument: a string, a non-negative integer, { ref = \"<step>\" } or { input = \"<name>\" }"
)]
pub enum ArgConfig {
	Text(String),
	Integer(u64),
	Ref(RefArg),
	Input(InputArg),
}

/// `{ ref = "<step>" }` argument table.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RefArg {
	#[serde(rename = "ref")]
	pub step: String,
}

/// `{ input = "<name>" }` argument table.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InputArg {
	pub input: String,
}

/// Resolves environment variables in a string.
///
/// Replaces ${VAR_NAME} with the value of the environment variable VAR_NAME.
/// Supports default values with ${VAR_NAME:-default_value}.
pub(crate) fn resolve_env_vars(input: &str) -> Result<String, ConfigError> {
	const MAX_INPUT_SIZE: usize = 1024 * 1024;
	if input.len() > MAX_INPUT_SIZE {
		return Err(ConfigError::Validation(format!(
			"Configuration file too large: {} bytes (max: {} bytes)",
			input.len(),
			MAX_INPUT_SIZE
		)));
	}

	let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]{0,127})(?::-([^}]{0,256}))?\}")
		.map_err(|e| ConfigError::Parse(format!("Regex error: {e}")))?;

	let mut result = input.to_string();
	let mut replacements = Vec::new();

	for cap in re.captures_iter(input) {
		let (Some(full_match), Some(var_name)) = (cap.get(0), cap.get(1)) else {
			continue;
		};
		let var_name = var_name.as_str();
		let default_value = cap.get(2).map(|m| m.as_str());

		let value = match std::env::var(var_name) {
			Ok(v) => v,
			Err(_) => match default_value {
				Some(default) => default.to_string(),
				None => {
					return Err(ConfigError::Validation(format!(
						"Environment variable '{var_name}' not found"
					)))
				},
			},
		};

		replacements.push((full_match.start(), full_match.end(), value));
	}

	// Apply replacements in reverse order to maintain positions
	for (start, end, value) in replacements.iter().rev() {
		result.replace_range(start..end, value);
	}

	Ok(result)
}

impl Config {
	/// Loads configuration from a file, resolving environment variables.
	pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
		let path = path.as_ref();
		tracing::debug!(path = %path.display(), "Loading configuration");
		let content = std::fs::read_to_string(path)?;
		content.parse()
	}

	/// Builds the ordered deployment plan.
	///
	/// `{ input = .. }` arguments are replaced with the configured value;
	/// `{ ref = .. }` arguments stay back-references for the orchestrator.
	pub fn steps(&self) -> Result<Vec<DeploymentStep>, ConfigError> {
		self.steps
			.iter()
			.map(|step| {
				let args = step
					.args
					.iter()
					.map(|arg| self.arg_value(&step.name, arg))
					.collect::<Result<Vec<_>, _>>()?;
				let options = StepOptions {
					gas_limit: step.gas_limit,
				};
				Ok(DeploymentStep::new(step.name.clone())
					.with_args(args)
					.with_options(options))
			})
			.collect()
	}

	/// Options applied to steps that leave a field unset.
	pub fn default_options(&self) -> StepOptions {
		StepOptions {
			gas_limit: self.defaults.gas_limit,
		}
	}

	fn arg_value(&self, step: &str, arg: &ArgConfig) -> Result<ArgValue, ConfigError> {
		Ok(match arg {
			ArgConfig::Text(value) => ArgValue::literal(value.clone()),
			ArgConfig::Integer(value) => ArgValue::number(*value),
			ArgConfig::Ref(RefArg { step: target }) => ArgValue::reference(target.clone()),
			ArgConfig::Input(InputArg { input }) => {
				let value = self.inputs.get(input).ok_or_else(|| {
					ConfigError::Validation(format!(
						"Step {} uses unknown input '{}'",
						step, input
					))
				})?;
				ArgValue::literal(value.trim())
			},
		})
	}

	/// Validates the configuration to ensure all required fields are properly set.
	///
	/// Back-reference ordering is checked by the orchestrator, not here.
	fn validate(&self) -> Result<(), ConfigError> {
		if self.network.rpc_url.trim().is_empty() {
			return Err(ConfigError::Validation("network.rpc_url cannot be empty".into()));
		}
		if self.network.chain_id == 0 {
			return Err(ConfigError::Validation("network.chain_id must be greater than 0".into()));
		}
		if self.account.private_key.is_empty() {
			return Err(ConfigError::Validation("account.private_key cannot be empty".into()));
		}

		for (name, value) in &self.inputs {
			Address::from_str(value.trim()).map_err(|e| {
				ConfigError::Validation(format!("inputs.{} is not a valid address: {}", name, e))
			})?;
		}

		if self.defaults.gas_limit == Some(0) {
			return Err(ConfigError::Validation("defaults.gas_limit must be greater than 0".into()));
		}

		if self.steps.is_empty() {
			return Err(ConfigError::Validation("At least one step must be configured".into()));
		}

		for (index, step) in self.steps.iter().enumerate() {
			if step.name.trim().is_empty() {
				return Err(ConfigError::Validation(format!(
					"Step {} has an empty name",
					index
				)));
			}
			if step.gas_limit == Some(0) {
				return Err(ConfigError::Validation(format!(
					"Step {} gas_limit must be greater than 0",
					step.name
				)));
			}
			for arg in &step.args {
				if let ArgConfig::Input(InputArg { input }) = arg {
					if !self.inputs.contains_key(input) {
						return Err(ConfigError::Validation(format!(
							"Step {} uses unknown input '{}'",
							step.name, input
						)));
					}
				}
			}
		}

		Ok(())
	}
}

/// Parses configuration from a TOML string.
///
/// Environment variables are resolved and the configuration is validated
/// after parsing.
impl FromStr for Config {
	type Err = ConfigError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let resolved = resolve_env_vars(s)?;
		let config: Config = toml::from_str(&resolved)?;
		config.validate()?;
		Ok(config)
	}
}
