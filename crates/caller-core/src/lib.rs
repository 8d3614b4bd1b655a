//! Call orchestration engine for the contract caller service.
//!
//! This module sequences a contract call from request to confirmation:
//! gas calibration, payload building, signing and submission, and the
//! synchronous wait for the confirming on-chain event. It also provides
//! the builder that wires signer and node client implementations from
//! configuration.

use caller_account::{AccountError, AccountService, SignerInterface};
use caller_config::Config;
use caller_node::{CallSc, ListenSettings, NodeError, NodeInterface, NodeService};
use caller_types::{truncate_id, ContractCallRequest, OperationResponse, OperationWithEvent};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Result marker when the caller chose not to await the confirming event.
pub const EVENT_NOT_AWAITED: &str = "Function called successfully but did not wait for event";

/// Result marker when the wait ended without any event. The operation may
/// have been rejected by the node after submission.
pub const EVENT_NONE_GENERATED: &str =
	"Operation submitted successfully but no event generated. The operation may have been rejected";

/// Errors that can occur while orchestrating a call.
///
/// Every variant names the step that failed and carries enough context to
/// diagnose without retry logic.
#[derive(Debug, Error)]
pub enum CallError {
	/// Gas estimation failed; nothing was built or submitted.
	#[error("estimating gas cost for function '{function}' at '{address}': {source}")]
	GasEstimation {
		function: String,
		address: String,
		#[source]
		source: NodeError,
	},
	/// The operation payload could not be built.
	#[error("building call to '{function}' at '{address}': {source}")]
	Build {
		function: String,
		address: String,
		#[source]
		source: NodeError,
	},
	/// Signing or submission failed.
	#[error("submitting call to '{function}' at '{address}': {source}")]
	Submission {
		function: String,
		address: String,
		#[source]
		source: NodeError,
	},
	/// Listening for the confirming event failed for a reason other than
	/// a timeout.
	#[error("listening events for operation '{operation_id}': {source}")]
	EventListen {
		operation_id: String,
		#[source]
		source: NodeError,
	},
	/// The engine could not be assembled from configuration.
	#[error("Configuration error: {0}")]
	Config(String),
}

/// The call orchestrator.
///
/// Holds the wired services and performs one independent call-and-confirm
/// cycle per invocation; no state is shared between concurrent calls.
pub struct CallEngine {
	/// Service configuration.
	config: Config,
	/// Node access for estimation, submission, and events.
	node: Arc<NodeService>,
}

impl std::fmt::Debug for CallEngine {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("CallEngine")
			.field("config", &self.config)
			.finish_non_exhaustive()
	}
}

impl CallEngine {
	/// Creates a new CallEngine from its wired parts.
	pub fn new(config: Config, node: Arc<NodeService>) -> Self {
		Self { config, node }
	}

	/// Returns the service configuration.
	pub fn config(&self) -> &Config {
		&self.config
	}

	/// Calls a function of a smart contract and reports its confirmation.
	///
	/// If the request's gas limit is zero, the cost is estimated first; a
	/// failed estimation aborts the call before anything is built. After
	/// submission, the asynchronous flag selects between returning
	/// immediately and blocking until the contract emits an event. A wait
	/// that times out yields a soft no-event result rather than an error,
	/// since it is indistinguishable from an accepted operation that
	/// emitted nothing.
	pub async fn call_contract(
		&self,
		request: &ContractCallRequest,
	) -> Result<OperationWithEvent, CallError> {
		// Calibrate max_gas
		let max_gas = if request.max_gas == 0 {
			self.node
				.estimate_gas_cost(
					&request.target_address,
					&request.target_function,
					&request.parameter,
					request.coins,
					request.fee,
				)
				.await
				.map_err(|e| CallError::GasEstimation {
					function: request.target_function.clone(),
					address: request.target_address.clone(),
					source: e,
				})?
		} else {
			request.max_gas
		};

		let call = CallSc::new(
			&request.target_address,
			&request.target_function,
			request.parameter.clone(),
			max_gas,
			request.coins,
		)
		.map_err(|e| CallError::Build {
			function: request.target_function.clone(),
			address: request.target_address.clone(),
			source: e,
		})?;

		let operation = self
			.node
			.submit(
				&call,
				request.fee,
				request.expiry_delta,
				&request.batch,
				&request.description,
			)
			.await
			.map_err(|e| CallError::Submission {
				function: request.target_function.clone(),
				address: request.target_address.clone(),
				source: e,
			})?;

		self.confirm(request.asynchronous, operation).await
	}

	/// Resolves the terminal state of a submitted operation.
	async fn confirm(
		&self,
		asynchronous: bool,
		operation: OperationResponse,
	) -> Result<OperationWithEvent, CallError> {
		if asynchronous {
			tracing::info!(
				operation_id = %truncate_id(&operation.operation_id),
				"Async mode, not awaiting event"
			);
			return Ok(OperationWithEvent {
				event: EVENT_NOT_AWAITED.to_string(),
				operation,
			});
		}

		match self.node.listen_events(&operation.operation_id, true).await {
			Ok(events) => match events.into_iter().next() {
				// Only the first event is surfaced; the rest are
				// discarded.
				Some(event) => {
					tracing::info!(
						operation_id = %truncate_id(&operation.operation_id),
						"Event received"
					);
					Ok(OperationWithEvent {
						event: event.data,
						operation,
					})
				}
				None => Ok(OperationWithEvent {
					event: EVENT_NONE_GENERATED.to_string(),
					operation,
				}),
			},
			Err(NodeError::Timeout(_)) => {
				tracing::warn!(
					operation_id = %truncate_id(&operation.operation_id),
					"No event before timeout"
				);
				Ok(OperationWithEvent {
					event: EVENT_NONE_GENERATED.to_string(),
					operation,
				})
			}
			Err(e) => Err(CallError::EventListen {
				operation_id: operation.operation_id.clone(),
				source: e,
			}),
		}
	}
}

/// Builder that assembles a CallEngine from configuration and factory
/// maps.
///
/// Implementations are selected by the names in the `[account]` and
/// `[node]` sections; the chosen signer is constructed once here and
/// injected into the engine, never instantiated inline.
pub struct CallEngineBuilder {
	config: Config,
	account_factories: HashMap<String, caller_account::AccountFactory>,
	node_factories: HashMap<String, caller_node::NodeFactory>,
}

impl CallEngineBuilder {
	/// Creates a new builder for the given configuration.
	pub fn new(config: Config) -> Self {
		Self {
			config,
			account_factories: HashMap::new(),
			node_factories: HashMap::new(),
		}
	}

	/// Registers a signer implementation factory under its name.
	pub fn with_account_factory(
		mut self,
		name: &str,
		factory: caller_account::AccountFactory,
	) -> Self {
		self.account_factories.insert(name.to_string(), factory);
		self
	}

	/// Registers a node client implementation factory under its name.
	pub fn with_node_factory(mut self, name: &str, factory: caller_node::NodeFactory) -> Self {
		self.node_factories.insert(name.to_string(), factory);
		self
	}

	/// Builds the engine, constructing the selected implementations.
	pub fn build(self) -> Result<CallEngine, CallError> {
		let account = self.build_account()?;
		let node = self.build_node(Arc::new(account))?;
		Ok(CallEngine::new(self.config, Arc::new(node)))
	}

	fn build_account(&self) -> Result<AccountService, CallError> {
		let account_config = &self.config.account;
		let factory = self
			.account_factories
			.get(&account_config.primary)
			.ok_or_else(|| {
				CallError::Config(format!(
					"unknown account implementation '{}'",
					account_config.primary
				))
			})?;
		let empty = toml::Value::Table(toml::Table::new());
		let implementation_config = account_config
			.implementations
			.get(&account_config.primary)
			.unwrap_or(&empty);
		let implementation: Box<dyn SignerInterface> =
			factory(implementation_config, &account_config.private_key)
				.map_err(|e: AccountError| CallError::Config(e.to_string()))?;
		Ok(AccountService::new(
			implementation,
			account_config.nickname.clone(),
		))
	}

	fn build_node(&self, account: Arc<AccountService>) -> Result<NodeService, CallError> {
		let node_config = &self.config.node;
		let factory = self.node_factories.get(&node_config.primary).ok_or_else(|| {
			CallError::Config(format!(
				"unknown node implementation '{}'",
				node_config.primary
			))
		})?;
		let empty = toml::Value::Table(toml::Table::new());
		let implementation_config = node_config
			.implementations
			.get(&node_config.primary)
			.unwrap_or(&empty);
		let implementation: Box<dyn NodeInterface> =
			factory(implementation_config, &self.config.network)
				.map_err(|e: NodeError| CallError::Config(e.to_string()))?;
		Ok(NodeService::new(
			implementation,
			account,
			self.config.network.clone(),
			ListenSettings {
				poll_interval: Duration::from_millis(node_config.poll_interval_ms),
				timeout: Duration::from_secs(node_config.listen_timeout_secs),
			},
		))
	}
}

#[cfg(test)]
mod tests;
