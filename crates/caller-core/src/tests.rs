//! Engine tests against canned signer and node implementations.

use super::*;
use async_trait::async_trait;
use base64::Engine as _;
use caller_account::{AccountError, AccountService, SignerInterface};
use caller_node::{ListenSettings, NodeError, NodeInterface, NodeService};
use caller_types::{
	ConfigSchema, ContractCallRequest, EventContext, EventFilter, NetworkInfo, NodeStatus,
	OperationBatch, ScEvent, Schema, SignResponse, SignedOperation, Slot, ValidationError,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

const TEST_CHAIN_ID: u64 = 77658366;
const CONTRACT: &str = "AS12b4pgVgvF9GKL6S8wZ6AEKENeqihZ8Qmxkr5NT4Ho7wYp9D9NT";
const SERIALIZED_OP: &[u8] = b"serialized-op";

/// Schema accepting anything, for the test doubles.
struct AnySchema;

impl ConfigSchema for AnySchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		Schema::new(vec![], vec![]).validate(config)
	}
}

#[derive(Default)]
struct SignerState {
	operations: Mutex<Vec<Vec<u8>>>,
	batches: Mutex<Vec<OperationBatch>>,
	fail: bool,
}

struct MockSigner(Arc<SignerState>);

#[async_trait]
impl SignerInterface for MockSigner {
	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(AnySchema)
	}

	async fn sign(
		&self,
		_nickname: &str,
		operation: &[u8],
		batch: &OperationBatch,
	) -> Result<SignResponse, AccountError> {
		if self.0.fail {
			return Err(AccountError::SigningFailed("agent refused".to_string()));
		}
		self.0.operations.lock().unwrap().push(operation.to_vec());
		self.0.batches.lock().unwrap().push(batch.clone());
		Ok(SignResponse {
			public_key: "P1key".to_string(),
			signature: "sig".to_string(),
			correlation_id: Some("corr-1".to_string()),
			operation: Some(base64::engine::general_purpose::STANDARD.encode(SERIALIZED_OP)),
		})
	}
}

/// What the mock node answers to event polls.
enum EventsBehavior {
	Events(Vec<ScEvent>),
	Timeout,
	Transport(String),
}

#[derive(Default)]
struct NodeState {
	estimate: Mutex<Option<Result<u64, String>>>,
	estimate_calls: AtomicUsize,
	send_calls: AtomicUsize,
	listen_calls: AtomicUsize,
	send_error: Mutex<Option<String>>,
	events: Mutex<Option<EventsBehavior>>,
	sent: Mutex<Vec<SignedOperation>>,
}

struct MockNode(Arc<NodeState>);

#[async_trait]
impl NodeInterface for MockNode {
	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(AnySchema)
	}

	async fn status(&self) -> Result<NodeStatus, NodeError> {
		Ok(NodeStatus {
			chain_id: TEST_CHAIN_ID,
			last_period: 100,
		})
	}

	async fn estimate_gas_cost(
		&self,
		_target_address: &str,
		_target_function: &str,
		_parameter: &[u8],
		_coins: u64,
		_fee: u64,
	) -> Result<u64, NodeError> {
		self.0.estimate_calls.fetch_add(1, Ordering::SeqCst);
		match self.0.estimate.lock().unwrap().take() {
			Some(Ok(gas)) => Ok(gas),
			Some(Err(message)) => Err(NodeError::Estimation(message)),
			None => Err(NodeError::Estimation("no estimate configured".to_string())),
		}
	}

	async fn send_operation(&self, operation: &SignedOperation) -> Result<String, NodeError> {
		self.0.send_calls.fetch_add(1, Ordering::SeqCst);
		if let Some(message) = self.0.send_error.lock().unwrap().take() {
			return Err(NodeError::Submission(message));
		}
		self.0.sent.lock().unwrap().push(operation.clone());
		Ok("O1abcdef0123".to_string())
	}

	async fn get_filtered_events(&self, _filter: &EventFilter) -> Result<Vec<ScEvent>, NodeError> {
		self.0.listen_calls.fetch_add(1, Ordering::SeqCst);
		match self.0.events.lock().unwrap().take() {
			Some(EventsBehavior::Events(events)) => Ok(events),
			Some(EventsBehavior::Timeout) => {
				Err(NodeError::Timeout("no event after 60s".to_string()))
			}
			Some(EventsBehavior::Transport(message)) => Err(NodeError::Network(message)),
			// Undrained polls stay empty so the blocking loop runs into
			// its deadline.
			None => Ok(vec![]),
		}
	}
}

fn event(data: &str) -> ScEvent {
	ScEvent {
		context: EventContext {
			slot: Slot {
				period: 101,
				thread: 0,
			},
			block: None,
			read_only: false,
			index_in_slot: 0,
			call_stack: vec![CONTRACT.to_string()],
			origin_operation_id: Some("O1abcdef0123".to_string()),
			is_final: true,
			is_error: false,
		},
		data: data.to_string(),
	}
}

fn test_config() -> Config {
	r#"
[network]
node_url = "http://127.0.0.1:33035"
chain_id = 77658366

[call]
contract_address = "AS12b4pgVgvF9GKL6S8wZ6AEKENeqihZ8Qmxkr5NT4Ho7wYp9D9NT"
function = "reset"
fee = 1
coins = 3

[account]
primary = "wallet"
nickname = "operator"
private_key = "S1-test-key"
"#
	.parse()
	.unwrap()
}

fn request() -> ContractCallRequest {
	ContractCallRequest {
		target_address: CONTRACT.to_string(),
		target_function: "reset".to_string(),
		parameter: vec![],
		fee: 1,
		max_gas: 100_000,
		coins: 3,
		expiry_delta: 10,
		asynchronous: false,
		batch: OperationBatch {
			new_batch: true,
			correlation_id: String::new(),
		},
		description: "Calling reset function".to_string(),
	}
}

fn engine(node: Arc<NodeState>, signer: Arc<SignerState>) -> CallEngine {
	let account = Arc::new(AccountService::new(Box::new(MockSigner(signer)), "operator"));
	let network = NetworkInfo {
		node_url: "http://127.0.0.1:33035".to_string(),
		chain_id: TEST_CHAIN_ID,
	};
	let listen = ListenSettings {
		poll_interval: std::time::Duration::from_millis(1),
		timeout: std::time::Duration::from_millis(20),
	};
	let node = Arc::new(NodeService::new(
		Box::new(MockNode(node)),
		account,
		network,
		listen,
	));
	CallEngine::new(test_config(), node)
}

#[tokio::test]
async fn test_zero_gas_triggers_estimation() {
	let node = Arc::new(NodeState::default());
	let signer = Arc::new(SignerState::default());
	*node.estimate.lock().unwrap() = Some(Ok(50_000));
	*node.events.lock().unwrap() = Some(EventsBehavior::Events(vec![event("ok")]));

	let mut req = request();
	req.max_gas = 0;
	engine(node.clone(), signer.clone())
		.call_contract(&req)
		.await
		.unwrap();

	assert_eq!(node.estimate_calls.load(Ordering::SeqCst), 1);

	// The estimated limit flows into the signed payload
	let operations = signer.operations.lock().unwrap();
	let payload: serde_json::Value = serde_json::from_slice(&operations[0]).unwrap();
	assert_eq!(payload["call"]["max_gas"], 50_000);
}

#[tokio::test]
async fn test_explicit_gas_skips_estimation() {
	let node = Arc::new(NodeState::default());
	let signer = Arc::new(SignerState::default());
	*node.events.lock().unwrap() = Some(EventsBehavior::Events(vec![event("ok")]));

	engine(node.clone(), signer).call_contract(&request()).await.unwrap();

	assert_eq!(node.estimate_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_estimation_failure_short_circuits() {
	let node = Arc::new(NodeState::default());
	let signer = Arc::new(SignerState::default());
	*node.estimate.lock().unwrap() = Some(Err("read-only execution failed".to_string()));

	let mut req = request();
	req.max_gas = 0;
	let err = engine(node.clone(), signer)
		.call_contract(&req)
		.await
		.unwrap_err();

	assert!(matches!(err, CallError::GasEstimation { .. }));
	let message = err.to_string();
	assert!(message.contains("reset"));
	assert!(message.contains(CONTRACT));
	assert_eq!(node.send_calls.load(Ordering::SeqCst), 0);
	assert_eq!(node.listen_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_build_failure_reports_context_and_stops() {
	let node = Arc::new(NodeState::default());
	let signer = Arc::new(SignerState::default());

	let mut req = request();
	req.target_address = "AU1JC5Q7c6mV7TcEtj2yA1Cv49JSiFz4xS8dnbGbmKHbVfrmFHvJ".to_string();
	let err = engine(node.clone(), signer)
		.call_contract(&req)
		.await
		.unwrap_err();

	assert!(matches!(err, CallError::Build { .. }));
	let message = err.to_string();
	assert!(message.contains("reset"));
	assert!(message.contains("AU1JC5Q7"));
	assert_eq!(node.send_calls.load(Ordering::SeqCst), 0);
	assert_eq!(node.listen_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_submission_failure_stops_before_listen() {
	let node = Arc::new(NodeState::default());
	let signer = Arc::new(SignerState::default());
	*node.send_error.lock().unwrap() = Some("operation pool is full".to_string());

	let err = engine(node.clone(), signer)
		.call_contract(&request())
		.await
		.unwrap_err();

	assert!(matches!(err, CallError::Submission { .. }));
	assert_eq!(node.listen_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_signing_failure_is_a_submission_error() {
	let node = Arc::new(NodeState::default());
	let signer = Arc::new(SignerState {
		fail: true,
		..SignerState::default()
	});

	let err = engine(node.clone(), signer)
		.call_contract(&request())
		.await
		.unwrap_err();

	assert!(matches!(err, CallError::Submission { .. }));
	assert_eq!(node.send_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_async_mode_skips_event_wait() {
	let node = Arc::new(NodeState::default());
	let signer = Arc::new(SignerState::default());

	let mut req = request();
	req.asynchronous = true;
	let result = engine(node.clone(), signer)
		.call_contract(&req)
		.await
		.unwrap();

	assert_eq!(result.event, EVENT_NOT_AWAITED);
	assert_eq!(result.operation.operation_id, "O1abcdef0123");
	assert_eq!(node.listen_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_first_event_payload_is_surfaced() {
	let node = Arc::new(NodeState::default());
	let signer = Arc::new(SignerState::default());
	*node.events.lock().unwrap() =
		Some(EventsBehavior::Events(vec![event("ok"), event("second")]));

	let result = engine(node.clone(), signer)
		.call_contract(&request())
		.await
		.unwrap();

	assert_eq!(result.event, "ok");
	assert_eq!(result.operation.correlation_id, "corr-1");
}

#[tokio::test]
async fn test_empty_polls_time_out_to_soft_result() {
	let node = Arc::new(NodeState::default());
	let signer = Arc::new(SignerState::default());
	// No events configured: every poll comes back empty until the
	// listen window elapses.

	let result = engine(node.clone(), signer)
		.call_contract(&request())
		.await
		.unwrap();

	assert_eq!(result.event, EVENT_NONE_GENERATED);
	assert!(node.listen_calls.load(Ordering::SeqCst) >= 1);
}

#[tokio::test]
async fn test_timeout_error_is_downgraded() {
	let node = Arc::new(NodeState::default());
	let signer = Arc::new(SignerState::default());
	*node.events.lock().unwrap() = Some(EventsBehavior::Timeout);

	let result = engine(node.clone(), signer)
		.call_contract(&request())
		.await
		.unwrap();

	assert_eq!(result.event, EVENT_NONE_GENERATED);
	assert_eq!(result.operation.operation_id, "O1abcdef0123");
}

#[tokio::test]
async fn test_transport_error_while_listening_propagates() {
	let node = Arc::new(NodeState::default());
	let signer = Arc::new(SignerState::default());
	*node.events.lock().unwrap() =
		Some(EventsBehavior::Transport("connection reset".to_string()));

	let err = engine(node.clone(), signer)
		.call_contract(&request())
		.await
		.unwrap_err();

	match err {
		CallError::EventListen { operation_id, .. } => {
			assert_eq!(operation_id, "O1abcdef0123");
		}
		other => panic!("expected EventListen, got {other:?}"),
	}
}

#[tokio::test]
async fn test_signing_payload_carries_submission_context() {
	let node = Arc::new(NodeState::default());
	let signer = Arc::new(SignerState::default());
	*node.events.lock().unwrap() = Some(EventsBehavior::Events(vec![event("ok")]));

	engine(node.clone(), signer.clone())
		.call_contract(&request())
		.await
		.unwrap();

	let operations = signer.operations.lock().unwrap();
	let payload: serde_json::Value = serde_json::from_slice(&operations[0]).unwrap();
	assert_eq!(payload["chain_id"], TEST_CHAIN_ID);
	// last_period 100 + expiry_delta 10
	assert_eq!(payload["expiry_period"], 110);
	assert_eq!(payload["fee"], 1);
	assert_eq!(payload["description"], "Calling reset function");

	let batches = signer.batches.lock().unwrap();
	assert!(batches[0].new_batch);

	let sent = node.sent.lock().unwrap();
	assert_eq!(sent[0].serialized_content, SERIALIZED_OP);
	assert_eq!(sent[0].creator_public_key, "P1key");
}

#[tokio::test]
async fn test_repeated_call_with_frozen_events_is_idempotent() {
	for _ in 0..2 {
		let node = Arc::new(NodeState::default());
		let signer = Arc::new(SignerState::default());
		*node.events.lock().unwrap() = Some(EventsBehavior::Events(vec![event("ok")]));

		let result = engine(node, signer).call_contract(&request()).await.unwrap();
		assert_eq!(result.event, "ok");
		assert_eq!(result.operation.operation_id, "O1abcdef0123");
	}
}

#[test]
fn test_builder_rejects_unknown_implementation() {
	let err = CallEngineBuilder::new(test_config()).build().unwrap_err();
	assert!(matches!(err, CallError::Config(_)));
	assert!(err.to_string().contains("wallet"));
}
