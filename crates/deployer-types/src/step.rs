//! Deployment step types.
//!
//! A deployment plan is an ordered list of [`DeploymentStep`]s. Each step names
//! the artifact to deploy, lists its constructor arguments and optionally
//! carries per-transaction options such as a gas ceiling.

use alloy_primitives::{Address, U256};
use std::fmt;

/// A constructor argument as written in a deployment plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArgValue {
	/// A literal value passed through unchanged, coerced by the deployer
	/// against the constructor ABI (addresses, strings, bools, bytes).
	Literal(String),
	/// A literal numeric value.
	Number(U256),
	/// Back-reference to the address produced by an earlier step.
	Ref(String),
}

impl ArgValue {
	/// Creates a literal argument.
	pub fn literal(value: impl Into<String>) -> Self {
		Self::Literal(value.into())
	}

	/// Creates a numeric argument.
	pub fn number(value: u64) -> Self {
		Self::Number(U256::from(value))
	}

	/// Creates a back-reference to the step called `name`.
	pub fn reference(name: impl Into<String>) -> Self {
		Self::Ref(name.into())
	}

	/// Returns the referenced step name if this is a back-reference.
	pub fn referenced_name(&self) -> Option<&str> {
		match self {
			Self::Ref(name) => Some(name),
			_ => None,
		}
	}
}

/// A constructor argument after back-references have been resolved.
///
/// This is what the deploy capability receives; it never sees step names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedArg {
	/// Literal passed through from the plan.
	Literal(String),
	/// Numeric literal passed through from the plan.
	Number(U256),
	/// Address of a previously deployed contract.
	Address(Address),
}

impl fmt::Display for ResolvedArg {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Literal(value) => write!(f, "{}", value),
			Self::Number(value) => write!(f, "{}", value),
			Self::Address(address) => write!(f, "{}", address),
		}
	}
}

/// Per-step transaction options.
///
/// Fields left as `None` fall back to the deployer defaults.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StepOptions {
	/// Maximum gas the creation transaction may consume.
	pub gas_limit: Option<u64>,
}

impl StepOptions {
	/// Sets the gas ceiling.
	pub fn with_gas_limit(mut self, gas_limit: u64) -> Self {
		self.gas_limit = Some(gas_limit);
		self
	}

	/// Fills every unset field from `defaults`. Values set on `self` win.
	pub fn merged_over(&self, defaults: &StepOptions) -> StepOptions {
		StepOptions {
			gas_limit: self.gas_limit.or(defaults.gas_limit),
		}
	}
}

/// One unit of work: deploy the artifact `name` with `args`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentStep {
	/// Artifact (contract) name; also the key of its address in the result.
	pub name: String,
	/// Ordered constructor arguments.
	pub args: Vec<ArgValue>,
	/// Transaction options for this step.
	pub options: StepOptions,
}

impl DeploymentStep {
	/// Creates a step with no arguments and default options.
	pub fn new(name: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			args: Vec::new(),
			options: StepOptions::default(),
		}
	}

	/// Appends a constructor argument.
	pub fn with_arg(mut self, arg: ArgValue) -> Self {
		self.args.push(arg);
		self
	}

	/// Replaces the constructor arguments.
	pub fn with_args(mut self, args: Vec<ArgValue>) -> Self {
		self.args = args;
		self
	}

	/// Replaces the step options.
	pub fn with_options(mut self, options: StepOptions) -> Self {
		self.options = options;
		self
	}

	/// Iterates over the step names this step depends on, in argument order.
	pub fn references(&self) -> impl Iterator<Item = &str> {
		self.args.iter().filter_map(ArgValue::referenced_name)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_references_only_yield_back_references() {
		let step = DeploymentStep::new("Chama")
			.with_arg(ArgValue::literal("0x6eB0dA3D32b30BfA2E28284Fea04CEc13C74cD99"))
			.with_arg(ArgValue::number(7u64))
			.with_arg(ArgValue::reference("UserRegistry"));

		let refs: Vec<&str> = step.references().collect();
		assert_eq!(refs, vec!["UserRegistry"]);
	}

	#[test]
	fn test_options_merge_prefers_step_value() {
		let defaults = StepOptions::default().with_gas_limit(6_000_000);

		let explicit = StepOptions::default().with_gas_limit(5_000_000);
		assert_eq!(explicit.merged_over(&defaults).gas_limit, Some(5_000_000));

		let unset = StepOptions::default();
		assert_eq!(unset.merged_over(&defaults).gas_limit, Some(6_000_000));
		assert_eq!(
			unset.merged_over(&StepOptions::default()).gas_limit,
			None
		);
	}

	#[test]
	fn test_resolved_arg_display() {
		let address = Address::repeat_byte(0xa1);

		assert_eq!(ResolvedArg::Literal("x".into()).to_string(), "x");
		assert_eq!(ResolvedArg::Number(U256::from(42u64)).to_string(), "42");
		assert_eq!(
			ResolvedArg::Address(address).to_string(),
			address.to_checksum(None)
		);
	}

	#[test]
	fn test_number_arg_from_u64() {
		assert_eq!(ArgValue::number(7), ArgValue::Number(U256::from(7u64)));
		assert_eq!(
			ArgValue::number(u64::MAX),
			ArgValue::Number(U256::from(u64::MAX))
		);
	}
}
