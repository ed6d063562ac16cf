//! Ordered contract deployment for the Chama contract suite.
//!
//! The orchestrator executes a fixed list of deployment steps one at a time.
//! Constructor arguments may refer to the address produced by an earlier step;
//! those references are resolved against the running result just before each
//! deploy call.

use deployer_delivery::DeployError;
use thiserror::Error;

pub mod orchestrator;

pub use orchestrator::Orchestrator;

/// Errors that stop a deployment run.
#[derive(Debug, Error)]
pub enum DeploymentError {
	/// A back-reference names a step that has not been deployed yet.
	#[error("Step {step} references {missing_name}, which no earlier step has deployed")]
	UnresolvedDependency { step: String, missing_name: String },
	/// The deploy capability failed for this step.
	#[error("Deployment of {step} failed: {cause}")]
	DeploymentFailed {
		step: String,
		#[source]
		cause: DeployError,
	},
	/// The step name already has an address in the result.
	#[error("Step {step} has already been deployed in this run")]
	DuplicateStep { step: String },
}

impl DeploymentError {
	/// Name of the step the run stopped at.
	pub fn step(&self) -> &str {
		match self {
			Self::UnresolvedDependency { step, .. } => step,
			Self::DeploymentFailed { step, .. } => step,
			Self::DuplicateStep { step } => step,
		}
	}
}
