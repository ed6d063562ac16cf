//! Alloy-based EVM deploy implementation.
//!
//! Provides the concrete [`DeployInterface`] used against real networks:
//! loads the contract artifact, encodes constructor arguments, signs and sends
//! the creation transaction and reads the new contract address from the receipt.

use crate::{artifacts::ArtifactLoader, DeployError, DeployInterface};
use alloy_network::{EthereumWallet, ReceiptResponse, TransactionBuilder};
use alloy_primitives::{Address, Bytes};
use alloy_provider::{
	fillers::{ChainIdFiller, GasFiller, NonceFiller, SimpleNonceManager},
	DynProvider, Provider, ProviderBuilder,
};
use alloy_rpc_client::RpcClient;
use alloy_rpc_types::TransactionRequest;
use alloy_signer::Signer;
use alloy_signer_local::PrivateKeySigner;
use alloy_transport::layers::RetryBackoffLayer;
use async_trait::async_trait;
use deployer_types::{ResolvedArg, SecretString, StepOptions};
use std::time::Duration;

/// Deploys compiled artifacts to one EVM network through an Alloy provider.
pub struct AlloyDeployer {
	/// Provider with the deployer wallet attached.
	provider: DynProvider,
	/// Chain the provider and signer are bound to.
	chain_id: u64,
	/// Source of ABI and bytecode for each contract.
	artifacts: ArtifactLoader,
}

impl AlloyDeployer {
	/// Creates a new AlloyDeployer.
	///
	/// Configures a provider for `rpc_url` with a wallet built from
	/// `private_key`, bound to `chain_id`. No request is sent until the first
	/// deployment.
	pub fn new(
		rpc_url: &str,
		chain_id: u64,
		private_key: &SecretString,
		artifacts: ArtifactLoader,
	) -> Result<Self, DeployError> {
		let url = rpc_url
			.parse()
			.map_err(|e| DeployError::Network(format!("Invalid RPC URL {}: {}", rpc_url, e)))?;

		let signer: PrivateKeySigner = private_key.with_exposed(|key| {
			key.parse()
				.map_err(|_| DeployError::Network("Invalid private key format".to_string()))
		})?;
		let deployer_address = signer.address();
		let wallet = EthereumWallet::from(signer.with_chain_id(Some(chain_id)));

		// Retry transient RPC failures; creation transactions themselves are never resent
		let retry_layer = RetryBackoffLayer::new(
			5,    // max_retry
			1000, // initial backoff in milliseconds
			10,   // compute units per second
		);
		let client = RpcClient::builder().layer(retry_layer).http(url);

		let provider = ProviderBuilder::new()
			.disable_recommended_fillers()
			.filler(NonceFiller::new(SimpleNonceManager::default()))
			.filler(GasFiller)
			.filler(ChainIdFiller::default())
			.wallet(wallet)
			.connect_client(client);

		provider.client().set_poll_interval(Duration::from_secs(1));

		tracing::debug!(
			chain_id,
			deployer = %deployer_address,
			artifacts = %artifacts.path().display(),
			"Configured Alloy deployer"
		);

		Ok(Self {
			provider: provider.erased(),
			chain_id,
			artifacts,
		})
	}

	/// Chain ID this deployer targets.
	pub fn chain_id(&self) -> u64 {
		self.chain_id
	}
}

/// Builds the contract-creation request for `init_code`.
///
/// Without a gas limit the provider's gas filler estimates one.
fn creation_request(init_code: Bytes, options: &StepOptions) -> TransactionRequest {
	let request = TransactionRequest::default().with_deploy_code(init_code);
	match options.gas_limit {
		Some(gas_limit) => request.with_gas_limit(gas_limit),
		None => request,
	}
}

#[async_trait]
impl DeployInterface for AlloyDeployer {
	async fn deploy(
		&self,
		contract_name: &str,
		args: &[ResolvedArg],
		options: &StepOptions,
	) -> Result<Address, DeployError> {
		let artifact = self.artifacts.load(contract_name)?;
		let init_code = artifact.init_code(args)?;

		let request = creation_request(init_code, options);

		tracing::debug!(
			"Sending creation transaction for {} on chain {}: data_len={}, gas_limit={:?}",
			contract_name,
			self.chain_id,
			request.input.input().map(|d| d.len()).unwrap_or(0),
			request.gas
		);

		let pending_tx = self.provider.send_transaction(request).await.map_err(|e| {
			tracing::error!(
				"Creation transaction for {} failed on chain {}: {}",
				contract_name,
				self.chain_id,
				e
			);
			DeployError::Network(format!("Failed to send transaction: {}", e))
		})?;

		let tx_hash = *pending_tx.tx_hash();
		tracing::info!(contract_name, tx_hash = %tx_hash, "Creation transaction submitted");

		let receipt = pending_tx
			.get_receipt()
			.await
			.map_err(|e| DeployError::Network(format!("Failed to confirm transaction {}: {}", tx_hash, e)))?;

		if !receipt.status() {
			return Err(DeployError::TransactionFailed(format!(
				"Creation of {} reverted in transaction {}",
				contract_name, tx_hash
			)));
		}

		receipt.contract_address().ok_or_else(|| {
			DeployError::TransactionFailed(format!(
				"No contract address in receipt for transaction {}",
				tx_hash
			))
		})
	}
}
