//! Node access module for the contract caller service.
//!
//! This module handles everything that crosses the wire to a blockchain
//! node: gas estimation, operation submission, and contract event
//! retrieval. It provides the `NodeInterface` trait for concrete node
//! clients and the `NodeService` wrapper that sequences signing and
//! submission and composes single event polls into a blocking wait with
//! timeout.

use async_trait::async_trait;
use base64::Engine;
use caller_account::AccountService;
use caller_types::{
	truncate_id, ConfigSchema, EventFilter, ImplementationRegistry, NetworkInfo, NodeStatus,
	OperationBatch, OperationResponse, ScEvent, SignedOperation,
};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

pub mod callsc;

/// Re-export implementations
pub mod implementations {
	pub mod jsonrpc;
}

pub use callsc::{CallSc, MAX_GAS_ALLOWED};

/// Errors that can occur during node operations.
#[derive(Debug, Error)]
pub enum NodeError {
	/// Transport-level failure reaching the node.
	#[error("Network error: {0}")]
	Network(String),
	/// The node answered with a protocol-level error.
	#[error("Node RPC error {code}: {message}")]
	Rpc { code: i64, message: String },
	/// Gas estimation failed.
	#[error("Gas estimation failed: {0}")]
	Estimation(String),
	/// Signing or submission of the operation failed.
	#[error("Submission failed: {0}")]
	Submission(String),
	/// The operation payload is malformed.
	#[error("Invalid operation: {0}")]
	InvalidOperation(String),
	/// No matching event arrived within the listen window.
	#[error("Timeout listening for events: {0}")]
	Timeout(String),
}

/// Trait defining the interface for node client implementations.
///
/// Event retrieval is single-poll granularity; the blocking wait is
/// composed in [`NodeService::listen_events`].
#[async_trait]
pub trait NodeInterface: Send + Sync {
	/// Returns the configuration schema for this node client
	/// implementation.
	fn config_schema(&self) -> Box<dyn ConfigSchema>;

	/// Fetches the node's current status.
	async fn status(&self) -> Result<NodeStatus, NodeError>;

	/// Estimates the gas a call will consume, including a safety margin.
	async fn estimate_gas_cost(
		&self,
		target_address: &str,
		target_function: &str,
		parameter: &[u8],
		coins: u64,
		fee: u64,
	) -> Result<u64, NodeError>;

	/// Submits a signed operation and returns its operation id.
	async fn send_operation(&self, operation: &SignedOperation) -> Result<String, NodeError>;

	/// Returns the events currently matching the filter.
	async fn get_filtered_events(&self, filter: &EventFilter) -> Result<Vec<ScEvent>, NodeError>;
}

/// Type alias for node client factory functions.
pub type NodeFactory =
	fn(&toml::Value, &NetworkInfo) -> Result<Box<dyn NodeInterface>, NodeError>;

/// Registry trait for node client implementations.
pub trait NodeRegistry: ImplementationRegistry<Factory = NodeFactory> {}

/// Get all registered node client implementations.
pub fn get_all_implementations() -> Vec<(&'static str, NodeFactory)> {
	use implementations::jsonrpc;

	vec![(jsonrpc::Registry::NAME, jsonrpc::Registry::factory())]
}

/// Timing of the blocking event wait.
#[derive(Debug, Clone, Copy)]
pub struct ListenSettings {
	/// Interval between polls.
	pub poll_interval: Duration,
	/// Total window before the wait times out.
	pub timeout: Duration,
}

impl Default for ListenSettings {
	fn default() -> Self {
		Self {
			poll_interval: Duration::from_secs(2),
			timeout: Duration::from_secs(60),
		}
	}
}

/// Payload handed to the signer.
///
/// Everything the agent needs to serialize and sign the operation:
/// network identity, absolute expiry, fee, and the call itself.
#[derive(Debug, Clone, Serialize)]
pub struct SigningPayload<'a> {
	/// Chain the operation is valid on.
	pub chain_id: u64,
	/// Absolute period at which the operation expires.
	pub expiry_period: u64,
	/// Operation fee in nanocoins.
	pub fee: u64,
	/// The contract call.
	pub call: &'a CallSc,
	/// Human-readable description for the signing prompt.
	pub description: &'a str,
}

/// Service that manages node access for one network.
///
/// Sequences the submit pipeline (status fetch, chain-id cross-check,
/// expiry computation, signing, submission) and composes event polls into
/// a blocking wait.
pub struct NodeService {
	/// The underlying node client implementation.
	implementation: Box<dyn NodeInterface>,
	/// Account service used for signing.
	account: Arc<AccountService>,
	/// Network this service submits to.
	network: NetworkInfo,
	/// Event wait timing.
	listen: ListenSettings,
}

impl NodeService {
	/// Creates a new NodeService with the specified implementation,
	/// signing account, target network, and listen timing.
	pub fn new(
		implementation: Box<dyn NodeInterface>,
		account: Arc<AccountService>,
		network: NetworkInfo,
		listen: ListenSettings,
	) -> Self {
		Self {
			implementation,
			account,
			network,
			listen,
		}
	}

	/// Returns the network this service submits to.
	pub fn network(&self) -> &NetworkInfo {
		&self.network
	}

	/// Estimates the gas a call will consume.
	pub async fn estimate_gas_cost(
		&self,
		target_address: &str,
		target_function: &str,
		parameter: &[u8],
		coins: u64,
		fee: u64,
	) -> Result<u64, NodeError> {
		self.implementation
			.estimate_gas_cost(target_address, target_function, parameter, coins, fee)
			.await
	}

	/// Signs and submits a contract call.
	///
	/// The expiry period is computed from the node's current period, and
	/// the node's chain id must match the configured one before anything
	/// is signed.
	pub async fn submit(
		&self,
		call: &CallSc,
		fee: u64,
		expiry_delta: u64,
		batch: &OperationBatch,
		description: &str,
	) -> Result<OperationResponse, NodeError> {
		let status = self.implementation.status().await?;
		if status.chain_id != self.network.chain_id {
			return Err(NodeError::Submission(format!(
				"node reports chain id {} but {} is configured",
				status.chain_id, self.network.chain_id
			)));
		}

		let payload = SigningPayload {
			chain_id: self.network.chain_id,
			expiry_period: status.last_period + expiry_delta,
			fee,
			call,
			description,
		};
		let payload_bytes = serde_json::to_vec(&payload)
			.map_err(|e| NodeError::Submission(format!("encoding signing payload: {}", e)))?;

		let signed = self
			.account
			.sign(&payload_bytes, batch)
			.await
			.map_err(|e| NodeError::Submission(e.to_string()))?;

		// The agent serializes the operation; all this layer does is
		// decode and forward it.
		let serialized = signed.operation.as_deref().ok_or_else(|| {
			NodeError::Submission("signer returned no serialized operation".to_string())
		})?;
		let serialized_content = base64::engine::general_purpose::STANDARD
			.decode(serialized)
			.map_err(|e| {
				NodeError::Submission(format!("signer returned undecodable operation: {}", e))
			})?;

		let operation_id = self
			.implementation
			.send_operation(&SignedOperation {
				serialized_content,
				creator_public_key: signed.public_key,
				signature: signed.signature,
			})
			.await?;

		tracing::info!(
			operation_id = %truncate_id(&operation_id),
			function = %call.target_function,
			"Submitted operation"
		);

		Ok(OperationResponse {
			operation_id,
			correlation_id: signed.correlation_id.unwrap_or_default(),
		})
	}

	/// Retrieves the events caused by an operation.
	///
	/// Non-blocking mode is a single poll. Blocking mode polls until at
	/// least one event matches or the listen window elapses, in which
	/// case it returns [`NodeError::Timeout`]; the caller decides whether
	/// a timeout is an error.
	pub async fn listen_events(
		&self,
		operation_id: &str,
		blocking: bool,
	) -> Result<Vec<ScEvent>, NodeError> {
		let filter = EventFilter::for_operation(operation_id);

		if !blocking {
			return self.implementation.get_filtered_events(&filter).await;
		}

		let start = tokio::time::Instant::now();
		loop {
			let events = self.implementation.get_filtered_events(&filter).await?;
			if !events.is_empty() {
				return Ok(events);
			}

			if start.elapsed() >= self.listen.timeout {
				return Err(NodeError::Timeout(format!(
					"no event for operation {} after {}s",
					operation_id,
					self.listen.timeout.as_secs()
				)));
			}

			tracing::debug!(
				operation_id = %truncate_id(operation_id),
				"No event yet, polling again"
			);
			tokio::time::sleep(self.listen.poll_interval).await;
		}
	}
}
