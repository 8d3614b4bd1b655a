//! Registry trait for self-registering implementations.
//!
//! Each implementation module (account signer, node client) provides a
//! Registry struct implementing this trait, declaring the name it is
//! selected by in configuration and the factory that builds it.

/// Base trait for implementation registries.
pub trait ImplementationRegistry {
	/// The name used in configuration files to reference this
	/// implementation, for example "wallet" for
	/// account.implementations.wallet.
	const NAME: &'static str;

	/// The factory function type this implementation provides.
	type Factory;

	/// Get the factory function for this implementation.
	fn factory() -> Self::Factory;
}
