//! Wallet agent signer implementation.
//!
//! This implementation delegates signing to an external wallet agent over
//! HTTP. The agent holds the account keys, serializes and signs the
//! operation, and returns the signature together with the node-ready
//! serialized operation. The configured credential is presented as a
//! bearer token on every request.

use crate::{AccountError, SignerInterface};
use async_trait::async_trait;
use base64::Engine;
use caller_types::{
	ConfigSchema, Field, FieldType, OperationBatch, Schema, SecretString, SignResponse,
	ValidationError,
};
use serde::Serialize;
use std::time::Duration;

/// Default agent request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Request body sent to the wallet agent's sign endpoint.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SignRequest<'a> {
	/// Base64 of the operation payload to sign.
	operation: String,
	/// Batch metadata, echoed back via the correlation id.
	batch: &'a OperationBatch,
}

/// HTTP client for an external wallet signing agent.
pub struct WalletSigner {
	/// Base URL of the agent.
	endpoint: String,
	/// Bearer credential presented to the agent.
	credential: SecretString,
	/// Reused HTTP client.
	client: reqwest::Client,
}

impl WalletSigner {
	/// Creates a new WalletSigner for the given agent endpoint.
	pub fn new(
		endpoint: impl Into<String>,
		credential: SecretString,
		timeout: Duration,
	) -> Result<Self, AccountError> {
		let client = reqwest::Client::builder()
			.timeout(timeout)
			.build()
			.map_err(|e| AccountError::Implementation(e.to_string()))?;
		Ok(Self {
			endpoint: endpoint.into().trim_end_matches('/').to_string(),
			credential,
			client,
		})
	}
}

/// Configuration schema for the wallet signer.
pub struct WalletSignerSchema;

impl WalletSignerSchema {
	/// Static validation method for use before instance creation.
	pub fn validate_config(config: &toml::Value) -> Result<(), ValidationError> {
		let instance = Self;
		instance.validate(config)
	}
}

impl ConfigSchema for WalletSignerSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		let schema = Schema::new(
			vec![
				Field::new("endpoint", FieldType::String).with_validator(|value| {
					match value.as_str() {
						Some(s) if s.starts_with("http://") || s.starts_with("https://") => Ok(()),
						_ => Err("endpoint must be an http(s) URL".to_string()),
					}
				}),
			],
			vec![Field::new(
				"timeout_seconds",
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
impl SignerInterface for WalletSigner {
	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(WalletSignerSchema)
	}

	async fn sign(
		&self,
		nickname: &str,
		operation: &[u8],
		batch: &OperationBatch,
	) -> Result<SignResponse, AccountError> {
		let url = format!("{}/api/accounts/{}/sign", self.endpoint, nickname);
		let body = SignRequest {
			operation: base64::engine::general_purpose::STANDARD.encode(operation),
			batch,
		};

		let response = self
			.credential
			.with_exposed(|token| self.client.post(&url).bearer_auth(token).json(&body).send())
			.await
			.map_err(|e| AccountError::Agent(e.to_string()))?;

		let status = response.status();
		if !status.is_success() {
			let detail = response.text().await.unwrap_or_default();
			return Err(AccountError::SigningFailed(format!(
				"agent returned {} for account '{}': {}",
				status, nickname, detail
			)));
		}

		let signed: SignResponse = response
			.json()
			.await
			.map_err(|e| AccountError::InvalidResponse(e.to_string()))?;

		if signed.signature.is_empty() {
			return Err(AccountError::InvalidResponse(
				"agent response carries no signature".to_string(),
			));
		}
		if signed.operation.is_none() {
			return Err(AccountError::InvalidResponse(
				"agent response carries no serialized operation".to_string(),
			));
		}

		tracing::debug!(account = nickname, "Operation signed by wallet agent");
		Ok(signed)
	}
}

/// Factory function to create a wallet signer from configuration.
///
/// Reads `endpoint` (required) and `timeout_seconds` (optional) from the
/// implementation table; the credential comes from the account section.
pub fn create_wallet_signer(
	config: &toml::Value,
	credential: &SecretString,
) -> Result<Box<dyn SignerInterface>, AccountError> {
	WalletSignerSchema::validate_config(config)
		.map_err(|e| AccountError::Implementation(format!("Invalid configuration: {}", e)))?;

	let endpoint = config
		.get("endpoint")
		.and_then(|v| v.as_str())
		.ok_or_else(|| AccountError::Implementation("endpoint is required".to_string()))?;

	let timeout_secs = config
		.get("timeout_seconds")
		.and_then(|v| v.as_integer())
		.map(|v| v as u64)
		.unwrap_or(DEFAULT_TIMEOUT_SECS);

	let signer = WalletSigner::new(
		endpoint,
		credential.clone(),
		Duration::from_secs(timeout_secs),
	)?;

	Ok(Box::new(signer))
}

/// Registry for the wallet signer implementation.
pub struct Registry;

impl caller_types::ImplementationRegistry for Registry {
	const NAME: &'static str = "wallet";
	type Factory = crate::AccountFactory;

	fn factory() -> Self::Factory {
		create_wallet_signer
	}
}

impl crate::AccountRegistry for Registry {}
