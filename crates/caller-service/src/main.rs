//! Main entry point for the contract caller service.
//!
//! This binary performs a pre-configured smart-contract call through a
//! remote node. With the API section enabled it serves the call behind a
//! single HTTP route; otherwise it runs the call once and exits, which is
//! the scripted variant used from cron jobs and deploy pipelines.

use clap::Parser;
use caller_config::Config;
use caller_core::{CallEngine, CallEngineBuilder};
use std::path::PathBuf;
use std::sync::Arc;

mod server;

/// Command-line arguments for the caller service.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
	/// Path to configuration file
	#[arg(short, long, default_value = "config.toml")]
	config: PathBuf,

	/// Log level (trace, debug, info, warn, error)
	#[arg(short, long, default_value = "info")]
	log_level: String,
}

/// Main entry point for the caller service.
///
/// This function:
/// 1. Parses command-line arguments
/// 2. Initializes logging infrastructure
/// 3. Loads and validates configuration (missing credentials are fatal
///    here, before anything is served or submitted)
/// 4. Builds the call engine with the registered implementations
/// 5. Serves the HTTP API, or performs the call once in script mode
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	let args = Args::parse();

	// Initialize tracing with env filter
	use tracing_subscriber::{fmt, EnvFilter};

	let env_filter = EnvFilter::try_from_default_env()
		.unwrap_or_else(|_| EnvFilter::new(args.log_level.clone()));

	fmt().with_env_filter(env_filter).with_target(true).init();

	let config = Config::from_file(&args.config)?;
	tracing::info!(
		node_url = %config.network.node_url,
		chain_id = config.network.chain_id,
		"Loaded configuration"
	);

	let engine = Arc::new(build_engine(config.clone())?);

	let api_enabled = config.api.as_ref().is_some_and(|api| api.enabled);
	if api_enabled {
		let api_config = config.api.as_ref().unwrap().clone();
		server::start_server(api_config, engine).await?;
	} else {
		run_once(&engine).await?;
	}

	Ok(())
}

/// Builds the call engine, registering all available signer and node
/// client implementations.
fn build_engine(config: Config) -> Result<CallEngine, Box<dyn std::error::Error>> {
	let mut builder = CallEngineBuilder::new(config);

	for (name, factory) in caller_account::get_all_implementations() {
		builder = builder.with_account_factory(name, factory);
	}
	for (name, factory) in caller_node::get_all_implementations() {
		builder = builder.with_node_factory(name, factory);
	}

	Ok(builder.build()?)
}

/// Script mode: perform the configured call once and exit.
async fn run_once(engine: &CallEngine) -> Result<(), Box<dyn std::error::Error>> {
	let request = engine.config().call.to_request()?;
	tracing::info!(
		function = %request.target_function,
		contract = %request.target_address,
		"Calling contract function"
	);

	let result = engine.call_contract(&request).await?;

	tracing::info!(
		operation_id = %result.operation.operation_id,
		event = %result.event,
		"Call completed"
	);
	Ok(())
}
