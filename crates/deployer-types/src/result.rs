//! Deployment result map.
//!
//! [`DeploymentResult`] records the address produced by every completed step,
//! keyed by step name. Entries are write-once and iterate in deployment order.

use alloy_primitives::Address;
use serde::{Serialize, Serializer};
use thiserror::Error;

/// Returned when a step name already has a recorded address.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Address already recorded for {0}")]
pub struct DuplicateEntry(pub String);

/// Addresses of the deployed contracts, in deployment order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeploymentResult {
	entries: Vec<(String, Address)>,
}

impl DeploymentResult {
	/// Creates an empty result.
	pub fn new() -> Self {
		Self::default()
	}

	/// Returns the address recorded for `name`.
	pub fn get(&self, name: &str) -> Option<Address> {
		self.entries
			.iter()
			.find(|(entry, _)| entry == name)
			.map(|(_, address)| *address)
	}

	/// Returns true if `name` has a recorded address.
	pub fn contains(&self, name: &str) -> bool {
		self.get(name).is_some()
	}

	/// Records the address for `name`.
	///
	/// Fails without modifying the map if `name` is already present.
	pub fn record(&mut self, name: impl Into<String>, address: Address) -> Result<(), DuplicateEntry> {
		let name = name.into();
		if self.contains(&name) {
			return Err(DuplicateEntry(name));
		}
		self.entries.push((name, address));
		Ok(())
	}

	/// Number of recorded deployments.
	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	/// Iterates over `(name, address)` pairs in deployment order.
	pub fn iter(&self) -> impl Iterator<Item = (&str, Address)> {
		self.entries
			.iter()
			.map(|(name, address)| (name.as_str(), *address))
	}
}

impl Serialize for DeploymentResult {
	fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		serializer.collect_map(self.iter())
	}
}
