//! Contract call types for the caller system.
//!
//! This module defines the request that drives a smart-contract call, the
//! batching metadata forwarded to the signer, and the response types
//! produced once an operation has been submitted and (optionally)
//! confirmed by an on-chain event.

use serde::{Deserialize, Serialize};

/// A fully-specified smart-contract call.
///
/// Constructed once per invocation, either from configuration or by a
/// caller embedding the engine, and consumed whole by the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractCallRequest {
	/// Address of the target smart contract.
	pub target_address: String,
	/// Name of the exported function to call.
	pub target_function: String,
	/// Opaque parameter bytes, passed through unmodified.
	#[serde(default)]
	pub parameter: Vec<u8>,
	/// Operation fee in nanocoins.
	pub fee: u64,
	/// Gas limit for the call. Zero requests an estimation step before
	/// the operation is built.
	#[serde(default)]
	pub max_gas: u64,
	/// Coins transferred to the contract, in nanocoins.
	pub coins: u64,
	/// Number of periods after the current one at which the operation
	/// expires.
	pub expiry_delta: u64,
	/// When true, return as soon as the operation is submitted instead of
	/// waiting for the confirming event.
	#[serde(rename = "async", default)]
	pub asynchronous: bool,
	/// Batching metadata forwarded to the signer.
	#[serde(default)]
	pub batch: OperationBatch,
	/// Human-readable description attached to signing requests and logs.
	#[serde(default)]
	pub description: String,
}

/// Grouping metadata for combined signing of several operations.
///
/// A new batch is opened with `new_batch = true` and an empty correlation
/// id; the signer echoes back a correlation id that ties follow-up
/// operations to the same batch. The caller layer passes this through
/// unmodified.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationBatch {
	/// Whether this operation opens a new batch.
	#[serde(default)]
	pub new_batch: bool,
	/// Correlation id tying this operation to a previously opened batch.
	#[serde(default)]
	pub correlation_id: String,
}

/// A successfully signed and submitted operation.
///
/// Produced if and only if both signing and submission succeeded;
/// immutable afterwards. The operation id is the filter key for event
/// lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationResponse {
	/// Node-assigned operation identifier.
	pub operation_id: String,
	/// Correlation id echoed back by the signer, empty outside batches.
	#[serde(default)]
	pub correlation_id: String,
}

/// Terminal result of a call-and-confirm cycle.
///
/// `event` carries either the first on-chain event emitted by the call or
/// a status marker when no event was awaited or none arrived.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationWithEvent {
	/// Event payload or status marker.
	pub event: String,
	/// The submitted operation this result refers to.
	pub operation: OperationResponse,
}

/// Snapshot of the node state needed before submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeStatus {
	/// Chain id reported by the node.
	pub chain_id: u64,
	/// Period of the last slot the node has seen. Expiry periods are
	/// computed relative to this.
	pub last_period: u64,
}

/// Reply from the signing agent.
///
/// The wire format is camelCase; `signed_operation` carries the node-ready
/// serialized operation produced by the agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignResponse {
	/// Public key of the signing account.
	pub public_key: String,
	/// Signature over the operation payload.
	pub signature: String,
	/// Correlation id for batched signing, when the agent opened or
	/// continued a batch.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub correlation_id: Option<String>,
	/// Base64 of the serialized, signed operation ready for submission.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub operation: Option<String>,
}

/// Wire shape accepted by the node's operation submission endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedOperation {
	/// Serialized operation content.
	pub serialized_content: Vec<u8>,
	/// Public key of the operation creator.
	pub creator_public_key: String,
	/// Signature over the serialized content.
	pub signature: String,
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_request_serde_defaults() {
		let toml_str = r#"
			target_address = "AS12b4pgVgvF9GKL6S8wZ6AEKENeqihZ8Qmxkr5NT4Ho7wYp9D9NT"
			target_function = "reset"
			fee = 1
			coins = 3
			expiry_delta = 10
		"#;
		let request: ContractCallRequest = toml::from_str(toml_str).unwrap();
		assert_eq!(request.target_function, "reset");
		assert_eq!(request.max_gas, 0);
		assert!(!request.asynchronous);
		assert!(request.parameter.is_empty());
		assert_eq!(request.batch, OperationBatch::default());
	}

	#[test]
	fn test_async_field_rename() {
		let toml_str = r#"
			target_address = "AS1x"
			target_function = "reset"
			fee = 1
			coins = 0
			expiry_delta = 10
			async = true
		"#;
		let request: ContractCallRequest = toml::from_str(toml_str).unwrap();
		assert!(request.asynchronous);
	}

	#[test]
	fn test_sign_response_camel_case() {
		let json = r#"{
			"publicKey": "P12abc",
			"signature": "sig",
			"correlationId": "corr-1",
			"operation": "AAEC"
		}"#;
		let response: SignResponse = serde_json::from_str(json).unwrap();
		assert_eq!(response.public_key, "P12abc");
		assert_eq!(response.correlation_id.as_deref(), Some("corr-1"));
		assert_eq!(response.operation.as_deref(), Some("AAEC"));
	}

	#[test]
	fn test_sign_response_optional_fields() {
		let json = r#"{"publicKey": "P12abc", "signature": "sig"}"#;
		let response: SignResponse = serde_json::from_str(json).unwrap();
		assert!(response.correlation_id.is_none());
		assert!(response.operation.is_none());
	}
}
