//! Error taxonomy.
//!
//! Only DOM host failures and misuse surface to callers.
//! Persistence failures are recovered inside [`Store`](`crate::store::Store`) and only ever logged.

use thiserror::Error;

/// A host DOM call failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("DOM operation `{operation}` failed: {message}")]
pub struct DomError {
	pub operation: &'static str,
	pub message: String,
}

impl DomError {
	#[must_use]
	pub fn new(operation: &'static str, message: impl Into<String>) -> Self {
		Self {
			operation,
			message: message.into(),
		}
	}
}

/// Returned by [`mount`](`crate::mount::mount`).
#[derive(Debug, Error)]
pub enum MountError {
	/// No element with the given ID exists in the host document.
	#[error("Mount container #{0} not found")]
	ContainerNotFound(String),

	#[error(transparent)]
	Dom(#[from] DomError),
}

/// Reading or writing persisted state failed.
///
/// Never returned from [`Store`](`crate::store::Store`) operations.
#[derive(Debug, Error)]
pub enum PersistenceError {
	/// A named backend doesn't exist on this host.
	#[error("Storage backend {0:?} is unavailable")]
	Unavailable(&'static str),

	#[error("Storage read failed: {0}")]
	Read(String),

	#[error("Storage write failed: {0}")]
	Write(String),

	/// Stored state is malformed JSON, or state couldn't be serialised.
	#[error("Malformed state JSON: {0}")]
	Json(#[from] serde_json::Error),

	#[error("Stored state is not a JSON object")]
	NotAnObject,
}

/// Returned by [`Router::add`](`crate::router::Router::add`).
#[derive(Debug, Error)]
pub enum RouteError {
	#[error("Invalid route pattern {pattern:?}: {source}")]
	Pattern {
		pattern: String,
		#[source]
		source: regex::Error,
	},
}
