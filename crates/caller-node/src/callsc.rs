//! Smart-contract call operation payload.
//!
//! `CallSc` is the validated description of a contract call, built once
//! the gas limit is known and handed to the signing agent for
//! serialization and signing.

use crate::NodeError;
use serde::{Deserialize, Serialize};

/// Largest gas limit an operation may carry.
pub const MAX_GAS_ALLOWED: u64 = 4_294_167_295;

/// Address prefix identifying a smart contract.
const CONTRACT_ADDRESS_PREFIX: &str = "AS";

/// A validated smart-contract call payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallSc {
	/// Address of the target contract.
	pub target_address: String,
	/// Exported function to call.
	pub target_function: String,
	/// Opaque parameter bytes.
	pub parameter: Vec<u8>,
	/// Gas limit, strictly positive and capped.
	pub max_gas: u64,
	/// Coins attached to the call, in nanocoins.
	pub coins: u64,
}

impl CallSc {
	/// Builds a call payload, validating the pieces a malformed request
	/// would otherwise carry all the way to the node.
	pub fn new(
		target_address: &str,
		target_function: &str,
		parameter: Vec<u8>,
		max_gas: u64,
		coins: u64,
	) -> Result<Self, NodeError> {
		if !target_address.starts_with(CONTRACT_ADDRESS_PREFIX) {
			return Err(NodeError::InvalidOperation(format!(
				"'{}' is not a smart contract address",
				target_address
			)));
		}
		if target_function.is_empty() {
			return Err(NodeError::InvalidOperation(
				"target function is empty".to_string(),
			));
		}
		if max_gas == 0 {
			return Err(NodeError::InvalidOperation(
				"max gas must be positive after calibration".to_string(),
			));
		}
		if max_gas > MAX_GAS_ALLOWED {
			return Err(NodeError::InvalidOperation(format!(
				"max gas {} exceeds the allowed maximum {}",
				max_gas, MAX_GAS_ALLOWED
			)));
		}
		Ok(Self {
			target_address: target_address.to_string(),
			target_function: target_function.to_string(),
			parameter,
			max_gas,
			coins,
		})
	}
}
