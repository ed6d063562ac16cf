//! Wiring between configuration, the Alloy deployer and the orchestrator.
//!
//! The `deployer` binary is a thin shell over these functions so the same
//! flow can be exercised in tests with a mocked deploy capability.

use deployer_config::{Config, ConfigError};
use deployer_core::{DeploymentError, Orchestrator};
use deployer_delivery::{AlloyDeployer, ArtifactLoader, DeployError, DeployInterface};
use deployer_types::{DeploymentResult, DeploymentStep};
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

/// Errors surfaced by the deployer binary.
#[derive(Debug, Error)]
pub enum ServiceError {
	#[error(transparent)]
	Config(#[from] ConfigError),
	#[error("Invalid deployment plan: {0}")]
	Plan(DeploymentError),
	#[error(transparent)]
	Deployment(#[from] DeploymentError),
	#[error("Failed to initialize deployer: {0}")]
	Deployer(#[from] DeployError),
	#[error("Failed to write report: {0}")]
	Report(String),
}

/// Builds the ordered step list from `config` and checks it statically.
pub fn plan_from_config(config: &Config) -> Result<Vec<DeploymentStep>, ServiceError> {
	let steps = config.steps()?;
	Orchestrator::validate(&steps).map_err(ServiceError::Plan)?;
	Ok(steps)
}

/// Creates the Alloy deployer described by `config`.
pub fn build_deployer(config: &Config) -> Result<Arc<dyn DeployInterface>, ServiceError> {
	let deployer = AlloyDeployer::new(
		&config.network.rpc_url,
		config.network.chain_id,
		&config.account.private_key,
		ArtifactLoader::new(config.artifacts.path.clone()),
	)?;
	Ok(Arc::new(deployer))
}

/// Runs `steps` against `deployer` with the defaults from `config`.
///
/// On failure the addresses deployed before the failing step are logged.
pub async fn execute(
	config: &Config,
	steps: &[DeploymentStep],
	deployer: Arc<dyn DeployInterface>,
) -> Result<DeploymentResult, ServiceError> {
	let orchestrator = Orchestrator::new(deployer).with_default_options(config.default_options());

	let mut result = DeploymentResult::new();
	match orchestrator.run_into(steps, &mut result).await {
		Ok(()) => Ok(result),
		Err(e) => {
			for (name, address) in result.iter() {
				tracing::warn!(step = name, address = %address, "Deployed before failure");
			}
			Err(e.into())
		},
	}
}

/// Renders the result as a pretty JSON object of name to address.
pub fn render_report(result: &DeploymentResult) -> Result<String, ServiceError> {
	serde_json::to_string_pretty(result).map_err(|e| ServiceError::Report(e.to_string()))
}

/// Writes the rendered report to `path`.
pub fn write_report(path: &Path, report: &str) -> Result<(), ServiceError> {
	std::fs::write(path, report)
		.map_err(|e| ServiceError::Report(format!("{}: {}", path.display(), e)))
}

#[cfg(test)]
mod tests {
	use super::*;
	use deployer_delivery::MockDeployInterface;
	use deployer_types::{Address, ResolvedArg};

	const TEST_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

	fn test_config(steps: &str) -> Config {
		format!(
			r#"
[network]
rpc_url = "http://127.0.0.1:8545"
chain_id = 1337

[account]
private_key = "{TEST_KEY}"

[inputs]
treasurer = "0x6eB0dA3D32b30BfA2E28284Fea04CEc13C74cD99"
price_feed = "0x5fb1616F78dA7aFC9FF79e0371741a747D2a7F22"

[defaults]
gas_limit = 3000000

{steps}
"#
		)
		.parse()
		.unwrap()
	}

	fn chama_steps() -> &'static str {
		r#"
[[steps]]
name = "UserRegistry"

[[steps]]
name = "Chama"
args = [{ input = "treasurer" }, { input = "price_feed" }, { ref = "UserRegistry" }]
gas_limit = 5000000
"#
	}

	#[test]
	fn test_plan_rejects_forward_reference() {
		let config = test_config(
			r#"
[[steps]]
name = "Chama"
args = [{ ref = "UserRegistry" }]

[[steps]]
name = "UserRegistry"
"#,
		);

		let result = plan_from_config(&config);

		assert!(matches!(
			result,
			Err(ServiceError::Plan(DeploymentError::UnresolvedDependency { .. }))
		));
	}

	#[tokio::test]
	async fn test_execute_chama_plan() {
		let config = test_config(chama_steps());
		let steps = plan_from_config(&config).unwrap();
		let registry = Address::repeat_byte(0x42);

		let mut mock = MockDeployInterface::new();
		mock.expect_deploy()
			.withf(|name, _, options| name == "UserRegistry" && options.gas_limit == Some(3_000_000))
			.times(1)
			.returning(move |_, _, _| Box::pin(async move { Ok(registry) }));
		mock.expect_deploy()
			.withf(move |name, args, options| {
				name == "Chama"
					&& options.gas_limit == Some(5_000_000)
					&& args.get(2) == Some(&ResolvedArg::Address(registry))
			})
			.times(1)
			.returning(|_, _, _| Box::pin(async { Ok(Address::repeat_byte(0xc4)) }));

		let result = execute(&config, &steps, Arc::new(mock)).await.unwrap();

		let report = render_report(&result).unwrap();
		let json: serde_json::Value = serde_json::from_str(&report).unwrap();
		assert_eq!(json.as_object().unwrap().len(), 2);
		assert!(json.get("UserRegistry").is_some());
		assert!(json.get("Chama").is_some());
	}

	#[tokio::test]
	async fn test_execute_surfaces_deploy_failure() {
		let config = test_config(chama_steps());
		let steps = plan_from_config(&config).unwrap();

		let mut mock = MockDeployInterface::new();
		mock.expect_deploy()
			.withf(|name, _, _| name == "UserRegistry")
			.times(1)
			.returning(|_, _, _| {
				Box::pin(async { Err(DeployError::TransactionFailed("reverted".to_string())) })
			});
		mock.expect_deploy()
			.withf(|name, _, _| name == "Chama")
			.times(0);

		let err = execute(&config, &steps, Arc::new(mock)).await.unwrap_err();

		assert!(matches!(
			err,
			ServiceError::Deployment(DeploymentError::DeploymentFailed { ref step, .. })
				if step == "UserRegistry"
		));
	}

	#[test]
	fn test_bundled_chama_config() {
		std::env::set_var("DEPLOYER_PRIVATE_KEY", TEST_KEY);
		std::env::set_var("TREASURER_ADDRESS", "0x6eB0dA3D32b30BfA2E28284Fea04CEc13C74cD99");
		std::env::set_var("PRICE_FEED_ADDRESS", "0x5fb1616F78dA7aFC9FF79e0371741a747D2a7F22");

		let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../config/chama.toml");
		let config = Config::from_file(path).unwrap();
		let steps = plan_from_config(&config).unwrap();

		assert_eq!(steps.len(), 2);
		assert_eq!(steps[0].name, "UserRegistry");
		assert_eq!(steps[1].name, "Chama");
		assert_eq!(steps[1].options.gas_limit, Some(5_000_000));
		assert_eq!(steps[1].references().collect::<Vec<_>>(), vec!["UserRegistry"]);
	}

	#[test]
	fn test_build_deployer_from_config() {
		let config = test_config(chama_steps());

		assert!(build_deployer(&config).is_ok());
	}

	#[test]
	fn test_write_report() {
		let dir = tempfile::TempDir::new().unwrap();
		let path = dir.path().join("deployments.json");

		write_report(&path, "{}").unwrap();

		assert_eq!(std::fs::read_to_string(path).unwrap(), "{}");
	}
}
