//! HTTP server for the contract caller service.
//!
//! One route: POST /call runs the configured contract call and reports
//! its confirmation. Every engine failure maps uniformly to a 500 with
//! the error text; the call parameters themselves come from
//! configuration, not from the request body.

use axum::{
	extract::State,
	http::StatusCode,
	response::{IntoResponse, Json},
	routing::post,
	Router,
};
use caller_config::ApiConfig;
use caller_core::CallEngine;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;

/// Shared application state for the API server.
#[derive(Clone)]
pub struct AppState {
	/// The call engine processing requests.
	pub engine: Arc<CallEngine>,
}

/// Starts the HTTP server for the API.
pub async fn start_server(
	api_config: ApiConfig,
	engine: Arc<CallEngine>,
) -> Result<(), Box<dyn std::error::Error>> {
	let app_state = AppState { engine };

	let app = Router::new()
		.route("/call", post(handle_call))
		.layer(ServiceBuilder::new().layer(CorsLayer::permissive()))
		.with_state(app_state);

	let bind_address = format!("{}:{}", api_config.host, api_config.port);
	let listener = TcpListener::bind(&bind_address).await?;

	tracing::info!("Caller API server starting on {}", bind_address);

	axum::serve(listener, app).await?;

	Ok(())
}

/// Handles POST /call requests.
///
/// Each request runs an independent call-and-confirm cycle built from
/// the configured call section.
async fn handle_call(State(state): State<AppState>) -> impl IntoResponse {
	let request = match state.engine.config().call.to_request() {
		Ok(request) => request,
		Err(e) => {
			return (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response();
		}
	};

	match state.engine.call_contract(&request).await {
		Ok(result) => (StatusCode::OK, Json(result)).into_response(),
		Err(e) => {
			tracing::warn!("Contract call failed: {}", e);
			(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
		}
	}
}
