//! Network endpoint and chain identity types.

use serde::{Deserialize, Serialize};

/// Chain id of the main network.
pub const MAINNET_CHAIN_ID: u64 = 77658377;
/// Chain id of the build network.
pub const BUILDNET_CHAIN_ID: u64 = 77658366;

/// Identity of the network a call is submitted to.
///
/// Immutable per call; supplied by configuration. The chain id is
/// cross-checked against the node before anything is signed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkInfo {
	/// Public API endpoint of the node.
	pub node_url: String,
	/// Expected chain id.
	pub chain_id: u64,
}

impl NetworkInfo {
	/// Network info for the build network behind the given node URL.
	pub fn buildnet(node_url: impl Into<String>) -> Self {
		Self {
			node_url: node_url.into(),
			chain_id: BUILDNET_CHAIN_ID,
		}
	}
}
