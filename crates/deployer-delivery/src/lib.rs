//! Contract deployment capability for the deployment orchestrator.
//!
//! This crate defines the interface through which the orchestrator provisions
//! a single contract on chain, along with the error type those calls return.
//! The EVM implementation built on Alloy lives under `implementations::evm`,
//! and compiled contract artifacts are read through the [`artifacts`] module.

use async_trait::async_trait;
use deployer_types::{Address, ResolvedArg, StepOptions};
use thiserror::Error;

pub mod artifacts;

/// Re-export implementations
pub mod implementations {
	pub mod evm {
		pub mod alloy;
	}
}

pub use artifacts::{Artifact, ArtifactLoader};
pub use implementations::evm::alloy::AlloyDeployer;

/// Errors that can occur while deploying a single contract.
#[derive(Debug, Error)]
pub enum DeployError {
	/// No compiled artifact exists for the requested contract.
	#[error("Artifact not found: {0}")]
	ArtifactNotFound(String),
	/// The artifact exists but cannot be used (bad JSON, missing bytecode).
	#[error("Invalid artifact: {0}")]
	InvalidArtifact(String),
	/// Constructor arguments do not match the constructor ABI.
	#[error("Constructor encoding failed: {0}")]
	Encoding(String),
	/// Error that occurs during network communication.
	#[error("Network error: {0}")]
	Network(String),
	/// The creation transaction was mined but did not produce a contract.
	#[error("Transaction failed: {0}")]
	TransactionFailed(String),
}

/// Trait defining the capability to deploy one contract.
///
/// Implementations receive constructor arguments with every back-reference
/// already resolved to an address. A call either returns the address of the
/// newly created contract or fails; implementations never retry a creation
/// transaction on their own.
#[async_trait]
#[cfg_attr(feature = "testing", mockall::automock)]
pub trait DeployInterface: Send + Sync {
	/// Deploys `contract_name` with the given constructor arguments.
	///
	/// Fields of `options` left unset fall back to the implementation's own
	/// defaults (for EVM deployments, gas estimation by the provider).
	async fn deploy(
		&self,
		contract_name: &str,
		args: &[ResolvedArg],
		options: &StepOptions,
	) -> Result<Address, DeployError>;
}
