//! The key/value persistence boundary of the state store.

use crate::error::PersistenceError;
use core::{
	cell::RefCell,
	fmt::{self, Debug, Formatter},
};
use hashbrown::HashMap;
use std::rc::Rc;

/// A synchronous string key/value backend, shaped like Web Storage.
pub trait StorageBackend {
	/// # Errors
	///
	/// Iff the backend can't be read.
	fn get_item(&self, key: &str) -> Result<Option<String>, PersistenceError>;

	/// # Errors
	///
	/// Iff the backend rejects the write, for example because its quota is exceeded.
	fn set_item(&self, key: &str, value: &str) -> Result<(), PersistenceError>;
}

/// Where a [`Store`](`crate::store::Store`) persists its state.
#[derive(Clone)]
pub enum Persistence {
	/// The browser's `localStorage`.
	Local,
	/// The browser's `sessionStorage`.
	Session,
	Adapter(Rc<dyn StorageBackend>),
}
impl Persistence {
	pub fn adapter(backend: impl StorageBackend + 'static) -> Self {
		Persistence::Adapter(Rc::new(backend))
	}

	/// Resolves named backends.
	///
	/// # Errors
	///
	/// [`PersistenceError::Unavailable`] iff a named backend doesn't exist on this host.
	pub fn resolve(&self) -> Result<Rc<dyn StorageBackend>, PersistenceError> {
		match self {
			Persistence::Local => named("localStorage"),
			Persistence::Session => named("sessionStorage"),
			Persistence::Adapter(backend) => Ok(Rc::clone(backend)),
		}
	}
}
impl Debug for Persistence {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		match self {
			Persistence::Local => f.write_str("Local"),
			Persistence::Session => f.write_str("Session"),
			Persistence::Adapter(_) => f.write_str("Adapter(..)"),
		}
	}
}

#[cfg(target_arch = "wasm32")]
fn named(name: &'static str) -> Result<Rc<dyn StorageBackend>, PersistenceError> {
	crate::web::WebStorage::named(name).map(|storage| Rc::new(storage) as Rc<dyn StorageBackend>)
}

#[cfg(not(target_arch = "wasm32"))]
fn named(name: &'static str) -> Result<Rc<dyn StorageBackend>, PersistenceError> {
	Err(PersistenceError::Unavailable(name))
}

/// An in-memory [`StorageBackend`]. Clones share their contents.
#[derive(Debug, Default, Clone)]
pub struct MemoryStorage(Rc<RefCell<HashMap<String, String>>>);
impl MemoryStorage {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	#[must_use]
	pub fn get(&self, key: &str) -> Option<String> {
		self.0.borrow().get(key).cloned()
	}

	pub fn insert(&self, key: impl Into<String>, value: impl Into<String>) {
		self.0.borrow_mut().insert(key.into(), value.into());
	}
}
impl StorageBackend for MemoryStorage {
	fn get_item(&self, key: &str) -> Result<Option<String>, PersistenceError> {
		Ok(self.get(key))
	}

	fn set_item(&self, key: &str, value: &str) -> Result<(), PersistenceError> {
		self.insert(key, value);
		Ok(())
	}
}
