//! Account management module for the contract caller service.
//!
//! This module provides the abstraction over operation signing. A signer
//! holds or brokers a private key, identified by an account nickname, and
//! produces a signature over an operation payload. The concrete work is
//! delegated to an external signing agent; this crate owns the interface,
//! the service wrapper the rest of the system talks to, and the agent
//! client implementation.

use async_trait::async_trait;
use caller_types::{ConfigSchema, ImplementationRegistry, OperationBatch, SecretString, SignResponse};
use thiserror::Error;

/// Re-export implementations
pub mod implementations {
	pub mod wallet;
}

/// Errors that can occur during account operations.
#[derive(Debug, Error)]
pub enum AccountError {
	/// The signing agent refused or failed to sign.
	#[error("Signing failed: {0}")]
	SigningFailed(String),
	/// The signing agent could not be reached.
	#[error("Signing agent unreachable: {0}")]
	Agent(String),
	/// The agent replied with something that is not a usable signature.
	#[error("Invalid signer response: {0}")]
	InvalidResponse(String),
	/// Error constructing or configuring the implementation.
	#[error("Implementation error: {0}")]
	Implementation(String),
}

/// Trait defining the interface for signer implementations.
///
/// Implementations must never expose the private key or credential in
/// logs, errors, or serialized state.
#[async_trait]
pub trait SignerInterface: Send + Sync {
	/// Returns the configuration schema for this signer implementation.
	///
	/// The schema validates the implementation's TOML table before the
	/// signer is constructed.
	fn config_schema(&self) -> Box<dyn ConfigSchema>;

	/// Signs an operation payload on behalf of the named account.
	///
	/// The batch metadata is passed through to the agent so several
	/// operations can be signed together; the agent may echo a
	/// correlation id back in the response.
	async fn sign(
		&self,
		nickname: &str,
		operation: &[u8],
		batch: &OperationBatch,
	) -> Result<SignResponse, AccountError>;
}

/// Type alias for signer factory functions.
///
/// Factories receive the implementation's TOML table and the credential
/// from the account section.
pub type AccountFactory =
	fn(&toml::Value, &SecretString) -> Result<Box<dyn SignerInterface>, AccountError>;

/// Registry trait for signer implementations.
pub trait AccountRegistry: ImplementationRegistry<Factory = AccountFactory> {}

/// Get all registered signer implementations.
pub fn get_all_implementations() -> Vec<(&'static str, AccountFactory)> {
	use implementations::wallet;

	vec![(wallet::Registry::NAME, wallet::Registry::factory())]
}

/// Service that manages signing operations.
///
/// Wraps the configured signer implementation together with the account
/// nickname it signs for, so callers never handle either directly.
pub struct AccountService {
	/// The underlying signer implementation.
	implementation: Box<dyn SignerInterface>,
	/// Nickname of the signing account.
	nickname: String,
}

impl AccountService {
	/// Creates a new AccountService with the specified implementation and
	/// account nickname.
	pub fn new(implementation: Box<dyn SignerInterface>, nickname: impl Into<String>) -> Self {
		Self {
			implementation,
			nickname: nickname.into(),
		}
	}

	/// Returns the nickname of the signing account.
	pub fn nickname(&self) -> &str {
		&self.nickname
	}

	/// Signs an operation payload with the managed account.
	pub async fn sign(
		&self,
		operation: &[u8],
		batch: &OperationBatch,
	) -> Result<SignResponse, AccountError> {
		self.implementation
			.sign(&self.nickname, operation, batch)
			.await
	}
}
