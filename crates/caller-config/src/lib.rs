//! Configuration module for the contract caller service.
//!
//! This module provides structures and utilities for managing caller
//! configuration. It supports loading configuration from TOML files with
//! `${ENV_VAR}` and `${ENV_VAR:-default}` substitution, and validates that
//! all required values are set before anything touches the network.
//!
//! A single configuration source replaces the hard-coded constants the
//! call parameters would otherwise be scattered across: network endpoint,
//! contract address, fee/gas/coin amounts, and the signing identity all
//! live here.

use caller_types::{ContractCallRequest, NetworkInfo, OperationBatch, SecretString};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

/// Errors that can occur during configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
	/// Error during file I/O.
	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),
	/// Error parsing TOML configuration.
	#[error("Configuration error: {0}")]
	Parse(String),
	/// Configuration parsed but failed validation.
	#[error("Validation error: {0}")]
	Validation(String),
	/// A required credential or identity is absent. Fatal at startup; no
	/// retry.
	#[error("Missing credential: {0}")]
	MissingCredential(String),
}

impl From<toml::de::Error> for ConfigError {
	fn from(err: toml::de::Error) -> Self {
		// Extract just the message without the input dump
		ConfigError::Parse(err.message().to_string())
	}
}

/// Main configuration structure for the caller service.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
	/// Target network endpoint and chain id.
	pub network: NetworkInfo,
	/// The contract call this service performs.
	pub call: CallConfig,
	/// Signing account configuration.
	pub account: AccountConfig,
	/// Node client configuration.
	#[serde(default)]
	pub node: NodeConfig,
	/// Configuration for the HTTP API server. When absent or disabled the
	/// binary runs the call once and exits.
	pub api: Option<ApiConfig>,
}

/// Parameters of the contract call, one section instead of per-file
/// constants.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CallConfig {
	/// Address of the target smart contract.
	pub contract_address: String,
	/// Exported function to call.
	pub function: String,
	/// Hex-encoded parameter bytes. Empty for parameterless functions.
	#[serde(default)]
	pub parameter: String,
	/// Operation fee in nanocoins.
	pub fee: u64,
	/// Gas limit; zero means estimate before building.
	#[serde(default)]
	pub max_gas: u64,
	/// Coins attached to the call, in nanocoins.
	pub coins: u64,
	/// Periods until the operation expires.
	#[serde(default = "default_expiry_delta")]
	pub expiry_delta: u64,
	/// Return without awaiting the confirming event.
	#[serde(rename = "async", default)]
	pub asynchronous: bool,
	/// Description attached to signing requests and logs.
	#[serde(default)]
	pub description: String,
}

/// Returns the default expiry delta in periods.
fn default_expiry_delta() -> u64 {
	10
}

impl CallConfig {
	/// Builds the per-invocation call request from this section.
	///
	/// Each request opens its own batch; the hex parameter is decoded
	/// here so a malformed value fails at startup validation, not at call
	/// time.
	pub fn to_request(&self) -> Result<ContractCallRequest, ConfigError> {
		let parameter = hex::decode(&self.parameter).map_err(|e| {
			ConfigError::Validation(format!("call.parameter is not valid hex: {}", e))
		})?;
		Ok(ContractCallRequest {
			target_address: self.contract_address.clone(),
			target_function: self.function.clone(),
			parameter,
			fee: self.fee,
			max_gas: self.max_gas,
			coins: self.coins,
			expiry_delta: self.expiry_delta,
			asynchronous: self.asynchronous,
			batch: OperationBatch {
				new_batch: true,
				correlation_id: String::new(),
			},
			description: self.description.clone(),
		})
	}
}

/// Configuration for the signing account.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AccountConfig {
	/// Which signer implementation to use.
	pub primary: String,
	/// Local alias identifying the account at the signer.
	pub nickname: String,
	/// Credential presented to the signing agent.
	pub private_key: SecretString,
	/// Map of signer implementation names to their configurations.
	#[serde(default)]
	pub implementations: HashMap<String, toml::Value>,
}

/// Configuration for the node client.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NodeConfig {
	/// Which node client implementation to use.
	#[serde(default = "default_node_primary")]
	pub primary: String,
	/// Interval between event polls while awaiting confirmation.
	#[serde(default = "default_poll_interval_ms")]
	pub poll_interval_ms: u64,
	/// How long to await a confirming event before giving up.
	#[serde(default = "default_listen_timeout_secs")]
	pub listen_timeout_secs: u64,
	/// Map of node client implementation names to their configurations.
	#[serde(default)]
	pub implementations: HashMap<String, toml::Value>,
}

impl Default for NodeConfig {
	fn default() -> Self {
		Self {
			primary: default_node_primary(),
			poll_interval_ms: default_poll_interval_ms(),
			listen_timeout_secs: default_listen_timeout_secs(),
			implementations: HashMap::new(),
		}
	}
}

/// Returns the default node client implementation name.
fn default_node_primary() -> String {
	"jsonrpc".to_string()
}

/// Returns the default event poll interval in milliseconds.
fn default_poll_interval_ms() -> u64 {
	2000
}

/// Returns the default event listen timeout in seconds.
fn default_listen_timeout_secs() -> u64 {
	60
}

/// Configuration for the HTTP API server.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiConfig {
	/// Whether the API server is enabled.
	#[serde(default)]
	pub enabled: bool,
	/// Host address to bind the server to.
	#[serde(default = "default_api_host")]
	pub host: String,
	/// Port to bind the server to.
	#[serde(default = "default_api_port")]
	pub port: u16,
	/// Request timeout in seconds.
	#[serde(default = "default_api_timeout")]
	pub timeout_seconds: u64,
}

/// Returns the default API host.
fn default_api_host() -> String {
	"127.0.0.1".to_string()
}

/// Returns the default API port.
fn default_api_port() -> u16 {
	3000
}

/// Returns the default API request timeout in seconds.
fn default_api_timeout() -> u64 {
	30
}

impl Config {
	/// Loads configuration from a TOML file, resolving environment
	/// variables before parsing.
	pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
		let content = std::fs::read_to_string(path)?;
		content.parse()
	}

	/// Validates the configuration.
	///
	/// Missing credentials are distinguished from other validation
	/// failures so the caller can report them as the fatal configuration
	/// errors they are.
	pub fn validate(&self) -> Result<(), ConfigError> {
		if self.network.node_url.is_empty() {
			return Err(ConfigError::Validation("network.node_url is empty".into()));
		}
		if self.network.chain_id == 0 {
			return Err(ConfigError::Validation("network.chain_id is zero".into()));
		}
		if !self.call.contract_address.starts_with("AS") {
			return Err(ConfigError::Validation(format!(
				"call.contract_address '{}' is not a smart contract address",
				self.call.contract_address
			)));
		}
		if self.call.function.is_empty() {
			return Err(ConfigError::Validation("call.function is empty".into()));
		}
		if self.account.nickname.is_empty() {
			return Err(ConfigError::MissingCredential(
				"account.nickname is not set".into(),
			));
		}
		if self.account.private_key.is_empty() {
			return Err(ConfigError::MissingCredential(
				"account.private_key is not set".into(),
			));
		}
		// Surface a malformed hex parameter at startup
		self.call.to_request()?;
		Ok(())
	}
}

impl FromStr for Config {
	type Err = ConfigError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let resolved = resolve_env_vars(s)?;
		let config: Config = toml::from_str(&resolved)?;
		config.validate()?;
		Ok(config)
	}
}

/// Resolves `${VAR}` and `${VAR:-default}` references against the process
/// environment.
///
/// A reference without a default to an unset variable is an error: the
/// file explicitly requires that variable.
pub(crate) fn resolve_env_vars(input: &str) -> Result<String, ConfigError> {
	let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]{0,127})(?::-([^}]{0,256}))?\}")
		.map_err(|e| ConfigError::Parse(format!("Regex error: {}", e)))?;

	let mut result = input.to_string();
	let mut replacements = Vec::new();

	for cap in re.captures_iter(input) {
		let full_match = cap.get(0).unwrap();
		let var_name = cap.get(1).unwrap().as_str();
		let default_value = cap.get(2).map(|m| m.as_str());

		let value = match std::env::var(var_name) {
			Ok(v) => v,
			Err(_) => match default_value {
				Some(default) => default.to_string(),
				None => {
					return Err(ConfigError::Validation(format!(
						"Environment variable '{}' not found",
						var_name
					)))
				}
			},
		};

		replacements.push((full_match.start(), full_match.end(), value));
	}

	// Apply replacements in reverse order to maintain positions
	for (start, end, value) in replacements.iter().rev() {
		result.replace_range(start..end, value);
	}

	Ok(result)
}
