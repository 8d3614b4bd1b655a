//! JSON-RPC node client implementation.
//!
//! Talks to a node's public API over HTTP JSON-RPC: `get_status` for the
//! submission context, `execute_read_only_call` for gas estimation,
//! `send_operations` for submission, and `get_filtered_sc_output_event`
//! for contract events.

use crate::callsc::MAX_GAS_ALLOWED;
use crate::{NodeError, NodeInterface};
use async_trait::async_trait;
use caller_types::{
	format_mas, ConfigSchema, EventFilter, Field, FieldType, NetworkInfo, NodeStatus, ScEvent,
	Schema, SignedOperation, Slot, ValidationError,
};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;

/// Default HTTP timeout for node requests, in seconds.
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

/// JSON-RPC error object.
#[derive(Debug, Deserialize)]
struct RpcErrorObject {
	code: i64,
	message: String,
}

/// JSON-RPC response envelope.
#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "R: Deserialize<'de>"))]
struct RpcResponse<R> {
	#[serde(default)]
	result: Option<R>,
	#[serde(default)]
	error: Option<RpcErrorObject>,
}

/// `get_status` reply, reduced to the fields submission needs.
#[derive(Debug, Deserialize)]
struct StatusResponse {
	chain_id: u64,
	last_slot: Option<Slot>,
}

/// One entry of an `execute_read_only_call` reply.
#[derive(Debug, Deserialize)]
struct ReadOnlyResult {
	result: ReadOnlyOutcome,
	gas_cost: u64,
}

/// Outcome of a read-only execution.
#[derive(Debug, Deserialize)]
enum ReadOnlyOutcome {
	Ok(Vec<u8>),
	Error(String),
}

/// Adds the estimation safety margin of 20% on top of the measured gas
/// consumption, capped at the operation gas limit.
fn apply_estimation_margin(gas_cost: u64) -> u64 {
	gas_cost
		.saturating_add(gas_cost / 5)
		.min(MAX_GAS_ALLOWED)
}

/// JSON-RPC based node client.
pub struct JsonRpcNode {
	/// Public API endpoint.
	endpoint: String,
	/// Reused HTTP client.
	client: reqwest::Client,
}

impl JsonRpcNode {
	/// Creates a new JsonRpcNode for the given endpoint.
	pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, NodeError> {
		let client = reqwest::Client::builder()
			.timeout(timeout)
			.build()
			.map_err(|e| NodeError::Network(e.to_string()))?;
		Ok(Self {
			endpoint: endpoint.into(),
			client,
		})
	}

	/// Performs one JSON-RPC call against the node.
	async fn rpc<R: DeserializeOwned>(
		&self,
		method: &str,
		params: serde_json::Value,
	) -> Result<R, NodeError> {
		let request = serde_json::json!({
			"jsonrpc": "2.0",
			"id": 1,
			"method": method,
			"params": params,
		});

		let response = self
			.client
			.post(&self.endpoint)
			.json(&request)
			.send()
			.await
			.map_err(|e| NodeError::Network(format!("calling {}: {}", method, e)))?;

		let status = response.status();
		if !status.is_success() {
			return Err(NodeError::Network(format!(
				"node returned {} for {}",
				status, method
			)));
		}

		let envelope: RpcResponse<R> = response
			.json()
			.await
			.map_err(|e| NodeError::Network(format!("decoding {} reply: {}", method, e)))?;

		if let Some(error) = envelope.error {
			return Err(NodeError::Rpc {
				code: error.code,
				message: error.message,
			});
		}

		envelope.result.ok_or_else(|| {
			NodeError::Network(format!("{} reply carries neither result nor error", method))
		})
	}
}

/// Configuration schema for the JSON-RPC node client.
pub struct JsonRpcNodeSchema;

impl JsonRpcNodeSchema {
	/// Static validation method for use before instance creation.
	pub fn validate_config(config: &toml::Value) -> Result<(), ValidationError> {
		let instance = Self;
		instance.validate(config)
	}
}

impl ConfigSchema for JsonRpcNodeSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		let schema = Schema::new(
			vec![],
			vec![Field::new(
				"http_timeout_secs",
				FieldType::Integer {
					min: Some(1),
					max: Some(600),
				},
			)],
		);

		schema.validate(config)
	}
}

#[async_trait]
impl NodeInterface for JsonRpcNode {
	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(JsonRpcNodeSchema)
	}

	async fn status(&self) -> Result<NodeStatus, NodeError> {
		let status: StatusResponse = self.rpc("get_status", serde_json::json!([])).await?;
		let last_slot = status
			.last_slot
			.ok_or_else(|| NodeError::Network("node has no last slot yet".to_string()))?;
		Ok(NodeStatus {
			chain_id: status.chain_id,
			last_period: last_slot.period,
		})
	}

	async fn estimate_gas_cost(
		&self,
		target_address: &str,
		target_function: &str,
		parameter: &[u8],
		coins: u64,
		fee: u64,
	) -> Result<u64, NodeError> {
		let params = serde_json::json!([[{
			"max_gas": MAX_GAS_ALLOWED,
			"target_address": target_address,
			"target_function": target_function,
			"parameter": parameter,
			"caller_address": null,
			"coins": if coins == 0 { serde_json::Value::Null } else { format_mas(coins).into() },
			"fee": if fee == 0 { serde_json::Value::Null } else { format_mas(fee).into() },
		}]]);

		let mut results: Vec<ReadOnlyResult> =
			self.rpc("execute_read_only_call", params).await?;
		let result = if results.is_empty() {
			return Err(NodeError::Estimation(
				"read-only execution returned no result".to_string(),
			));
		} else {
			results.remove(0)
		};

		match result.result {
			ReadOnlyOutcome::Ok(_) => Ok(apply_estimation_margin(result.gas_cost)),
			ReadOnlyOutcome::Error(message) => Err(NodeError::Estimation(message)),
		}
	}

	async fn send_operation(&self, operation: &SignedOperation) -> Result<String, NodeError> {
		let ids: Vec<String> = self
			.rpc("send_operations", serde_json::json!([[operation]]))
			.await?;
		ids.into_iter()
			.next()
			.ok_or_else(|| NodeError::Submission("node accepted no operation".to_string()))
	}

	async fn get_filtered_events(&self, filter: &EventFilter) -> Result<Vec<ScEvent>, NodeError> {
		self.rpc("get_filtered_sc_output_event", serde_json::json!([filter]))
			.await
	}
}

/// Factory function to create a JSON-RPC node client from configuration.
///
/// The endpoint comes from the network section; the implementation table
/// may override the HTTP timeout.
pub fn create_jsonrpc_node(
	config: &toml::Value,
	network: &NetworkInfo,
) -> Result<Box<dyn NodeInterface>, NodeError> {
	JsonRpcNodeSchema::validate_config(config)
		.map_err(|e| NodeError::Network(format!("Invalid configuration: {}", e)))?;

	let timeout_secs = config
		.get("http_timeout_secs")
		.and_then(|v| v.as_integer())
		.map(|v| v as u64)
		.unwrap_or(DEFAULT_HTTP_TIMEOUT_SECS);

	let node = JsonRpcNode::new(network.node_url.clone(), Duration::from_secs(timeout_secs))?;

	Ok(Box::new(node))
}

/// Registry for the JSON-RPC node client implementation.
pub struct Registry;

impl caller_types::ImplementationRegistry for Registry {
	const NAME: &'static str = "jsonrpc";
	type Factory = crate::NodeFactory;

	fn factory() -> Self::Factory {
		create_jsonrpc_node
	}
}

impl crate::NodeRegistry for Registry {}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_status_response_parse() {
		let json = r#"{
			"jsonrpc": "2.0",
			"id": 1,
			"result": {
				"chain_id": 77658366,
				"last_slot": { "period": 4242, "thread": 7 },
				"version": "DEVN.28.6"
			}
		}"#;
		let envelope: RpcResponse<StatusResponse> = serde_json::from_str(json).unwrap();
		let status = envelope.result.unwrap();
		assert_eq!(status.chain_id, 77658366);
		assert_eq!(status.last_slot.unwrap().period, 4242);
	}

	#[test]
	fn test_rpc_error_parse() {
		let json = r#"{
			"jsonrpc": "2.0",
			"id": 1,
			"error": { "code": -32000, "message": "operation pool is full" }
		}"#;
		let envelope: RpcResponse<Vec<String>> = serde_json::from_str(json).unwrap();
		assert!(envelope.result.is_none());
		let error = envelope.error.unwrap();
		assert_eq!(error.code, -32000);
		assert_eq!(error.message, "operation pool is full");
	}

	#[test]
	fn test_read_only_ok_parse() {
		let json = r#"{ "result": { "Ok": [0, 1] }, "gas_cost": 2100000 }"#;
		let result: ReadOnlyResult = serde_json::from_str(json).unwrap();
		assert_eq!(result.gas_cost, 2100000);
		assert!(matches!(result.result, ReadOnlyOutcome::Ok(_)));
	}

	#[test]
	fn test_read_only_error_parse() {
		let json = r#"{ "result": { "Error": "missing function" }, "gas_cost": 0 }"#;
		let result: ReadOnlyResult = serde_json::from_str(json).unwrap();
		assert!(matches!(result.result, ReadOnlyOutcome::Error(m) if m == "missing function"));
	}

	#[test]
	fn test_estimation_margin() {
		assert_eq!(apply_estimation_margin(100_000), 120_000);
		assert_eq!(apply_estimation_margin(0), 0);
		assert_eq!(apply_estimation_margin(MAX_GAS_ALLOWED), MAX_GAS_ALLOWED);
	}

	#[test]
	fn test_events_parse() {
		let json = r#"[{
			"context": {
				"slot": { "period": 1, "thread": 0 },
				"block": "B12abc",
				"read_only": false,
				"index_in_slot": 0,
				"call_stack": [],
				"origin_operation_id": "O1abc",
				"is_final": true,
				"is_error": false
			},
			"data": "ok"
		}]"#;
		let events: Vec<ScEvent> = serde_json::from_str(json).unwrap();
		assert_eq!(events.len(), 1);
		assert_eq!(events[0].data, "ok");
	}
}
