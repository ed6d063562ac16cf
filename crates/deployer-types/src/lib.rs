//! Common types for the contract deployment workspace.
//!
//! This crate defines the data model shared by the orchestrator, the deploy
//! capability implementations and the configuration layer: deployment steps,
//! their constructor arguments, per-step options and the running result map.

/// Running map of deployed contract addresses.
pub mod result;
/// Secure string type for handling key material.
pub mod secret_string;
/// Deployment step, argument and option types.
pub mod step;
/// Hex formatting helpers.
pub mod utils;

pub use alloy_primitives::{Address, U256};
pub use result::{DeploymentResult, DuplicateEntry};
pub use secret_string::SecretString;
pub use step::{ArgValue, DeploymentStep, ResolvedArg, StepOptions};
