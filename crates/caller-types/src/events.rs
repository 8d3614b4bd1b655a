//! Smart-contract output event types.
//!
//! Contract execution emits application-level events retrievable from the
//! node by filter. These types mirror the node's event query surface: a
//! filter with all fields optional, and events carrying their emission
//! context alongside the payload.

use serde::{Deserialize, Serialize};

/// A slot on the chain, identified by period and thread.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slot {
	pub period: u64,
	pub thread: u8,
}

/// Context attached to an emitted event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventContext {
	/// Slot in which the event was emitted.
	pub slot: Slot,
	/// Block containing the emitting operation, absent for speculative
	/// events.
	#[serde(default)]
	pub block: Option<String>,
	/// Whether the event came from a read-only execution.
	#[serde(default)]
	pub read_only: bool,
	/// Position of the event within its slot.
	#[serde(default)]
	pub index_in_slot: u64,
	/// Call stack of addresses at emission time.
	#[serde(default)]
	pub call_stack: Vec<String>,
	/// Operation that caused the event, when applicable.
	#[serde(default)]
	pub origin_operation_id: Option<String>,
	/// Whether the emitting slot is final.
	#[serde(default)]
	pub is_final: bool,
	/// Whether the event was emitted by a failed execution.
	#[serde(default)]
	pub is_error: bool,
}

/// An event emitted by smart-contract execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScEvent {
	/// Emission context.
	pub context: EventContext,
	/// Application-level payload.
	pub data: String,
}

/// Filter for querying contract output events.
///
/// All fields are optional and omitted from the wire when unset; the node
/// intersects the provided criteria.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventFilter {
	/// Inclusive start slot.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub start: Option<Slot>,
	/// Exclusive end slot.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub end: Option<Slot>,
	/// Only events emitted by this contract address.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub emitter_address: Option<String>,
	/// Only events whose call stack starts at this address.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub original_caller_address: Option<String>,
	/// Only events caused by this operation.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub original_operation_id: Option<String>,
	/// Only final (or only speculative) events.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub is_final: Option<bool>,
}

impl EventFilter {
	/// Filter matching all events caused by one operation.
	pub fn for_operation(operation_id: impl Into<String>) -> Self {
		Self {
			original_operation_id: Some(operation_id.into()),
			..Self::default()
		}
	}
}
