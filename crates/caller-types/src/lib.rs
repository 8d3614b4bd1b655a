//! Common types module for the contract caller service.
//!
//! This module defines the core data types and structures shared by all
//! caller components. It provides a centralized location for the call
//! request/response model, the on-chain event model, and the configuration
//! validation framework.

/// Contract call request, batch, and confirmation types.
pub mod call;
/// Smart-contract output event types and filters.
pub mod events;
/// Network endpoint and chain identity types.
pub mod network;
/// Registry trait for self-registering implementations.
pub mod registry;
/// Secure string type for credentials.
pub mod secret_string;
/// Utility functions for display formatting and amounts.
pub mod utils;
/// Configuration validation types for implementation configs.
pub mod validation;

// Re-export all types for convenient access
pub use call::*;
pub use events::*;
pub use network::*;
pub use registry::*;
pub use secret_string::*;
pub use utils::{format_mas, truncate_id};
pub use validation::*;
