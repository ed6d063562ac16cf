//! Sequential deployment orchestrator.
//!
//! Steps run strictly in the given order. For each step the orchestrator
//! resolves back-references against the addresses recorded so far, merges the
//! step options over its defaults, calls the deploy capability and records the
//! returned address. The first failure stops the run; nothing already deployed
//! is rolled back and nothing is retried.
//!
//! A deploy call that never settles blocks the run: no timeout is applied here.

use crate::DeploymentError;
use deployer_delivery::DeployInterface;
use deployer_types::{ArgValue, DeploymentResult, DeploymentStep, ResolvedArg, StepOptions};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, error, info, instrument};

/// Executes deployment steps in order against a deploy capability.
pub struct Orchestrator {
	deployer: Arc<dyn DeployInterface>,
	/// Options applied to every step that leaves a field unset.
	defaults: StepOptions,
}

impl Orchestrator {
	pub fn new(deployer: Arc<dyn DeployInterface>) -> Self {
		Self {
			deployer,
			defaults: StepOptions::default(),
		}
	}

	/// Sets options used for fields a step does not specify.
	pub fn with_default_options(mut self, defaults: StepOptions) -> Self {
		self.defaults = defaults;
		self
	}

	/// Checks a plan without deploying anything.
	///
	/// Reports the first step name that appears twice, or the first
	/// back-reference that does not name a strictly earlier step.
	pub fn validate(steps: &[DeploymentStep]) -> Result<(), DeploymentError> {
		let mut earlier: HashSet<&str> = HashSet::new();

		for step in steps {
			if let Some(missing) = step.references().find(|name| !earlier.contains(name)) {
				return Err(DeploymentError::UnresolvedDependency {
					step: step.name.clone(),
					missing_name: missing.to_string(),
				});
			}
			if !earlier.insert(step.name.as_str()) {
				return Err(DeploymentError::DuplicateStep {
					step: step.name.clone(),
				});
			}
		}

		Ok(())
	}

	/// Runs every step and returns the addresses they produced.
	pub async fn run(&self, steps: &[DeploymentStep]) -> Result<DeploymentResult, DeploymentError> {
		let mut result = DeploymentResult::new();
		self.run_into(steps, &mut result).await?;
		Ok(result)
	}

	/// Runs every step, recording addresses into a caller-owned result.
	///
	/// On failure `result` keeps the addresses of all steps that completed
	/// before the failing one. Entries already present when the call starts
	/// can be referenced by the steps but cannot be deployed again.
	#[instrument(skip_all, fields(steps = steps.len()))]
	pub async fn run_into(
		&self,
		steps: &[DeploymentStep],
		result: &mut DeploymentResult,
	) -> Result<(), DeploymentError> {
		let total = steps.len();
		info!("Starting deployment run");

		for (index, step) in steps.iter().enumerate() {
			debug!(step = %step.name, index, total, "Pending");

			if result.contains(&step.name) {
				error!(step = %step.name, "Step already deployed");
				return Err(DeploymentError::DuplicateStep {
					step: step.name.clone(),
				});
			}

			let args = resolve_args(step, result).map_err(|e| {
				error!(step = %step.name, error = %e, "Unresolved dependency");
				e
			})?;
			let options = step.options.merged_over(&self.defaults);

			let address = self
				.deployer
				.deploy(&step.name, &args, &options)
				.await
				.map_err(|cause| {
					error!(step = %step.name, index, error = %cause, "Deployment failed");
					DeploymentError::DeploymentFailed {
						step: step.name.clone(),
						cause,
					}
				})?;

			result
				.record(step.name.clone(), address)
				.map_err(|e| DeploymentError::DuplicateStep { step: e.0 })?;

			info!(step = %step.name, index, total, address = %address, "Deployed");
		}

		info!(deployed = result.len(), "Deployment run complete");
		Ok(())
	}
}

/// Replaces back-references in `step.args` with recorded addresses.
fn resolve_args(
	step: &DeploymentStep,
	result: &DeploymentResult,
) -> Result<Vec<ResolvedArg>, DeploymentError> {
	step.args
		.iter()
		.map(|arg| match arg {
			ArgValue::Literal(value) => Ok(ResolvedArg::Literal(value.clone())),
			ArgValue::Number(value) => Ok(ResolvedArg::Number(*value)),
			ArgValue::Ref(name) => result.get(name).map(ResolvedArg::Address).ok_or_else(|| {
				DeploymentError::UnresolvedDependency {
					step: step.name.clone(),
					missing_name: name.clone(),
				}
			}),
		})
		.collect()
}
