//! A reactive key/value state store.
//!
//! # Re-entrancy
//!
//! Subscribers are notified synchronously. A subscriber that calls [`Store::set_state`] runs a
//! complete nested update (including notification of all subscribers) before the outer
//! notification loop continues, so later subscribers of the outer update may observe a state
//! newer than the snapshot they are handed.

use crate::{
	error::PersistenceError,
	persist::{Persistence, StorageBackend},
	subscription::{Subscribers, Subscription},
};
use core::{
	cell::RefCell,
	fmt::{self, Debug, Formatter},
};
use hashbrown::HashMap;
use serde_json::{Map, Value};
use std::rc::Rc;
use tracing::{debug, error, instrument, trace, warn};

/// The full state: top-level keys to JSON values, in insertion order.
pub type State = Map<String, Value>;

pub const DEFAULT_PERSISTENCE_KEY: &str = "app_state";

#[derive(Debug, Clone)]
pub struct StoreConfig {
	pub persistence: Option<Persistence>,
	/// The single key the serialised state is stored under.
	pub persistence_key: String,
}
impl Default for StoreConfig {
	fn default() -> Self {
		Self {
			persistence: None,
			persistence_key: DEFAULT_PERSISTENCE_KEY.to_owned(),
		}
	}
}
impl StoreConfig {
	#[must_use]
	pub fn persisted(persistence: Persistence) -> Self {
		Self {
			persistence: Some(persistence),
			..Self::default()
		}
	}

	#[must_use]
	pub fn with_key(mut self, persistence_key: impl Into<String>) -> Self {
		self.persistence_key = persistence_key.into();
		self
	}
}

/// An argument to [`Store::set_state`].
pub enum Update {
	/// Shallowly merged into the state.
	Merge(State),
	/// Called with a snapshot of the current state. The result is merged.
	With(Box<dyn FnOnce(&State) -> State>),
}
impl Update {
	pub fn with(update: impl FnOnce(&State) -> State + 'static) -> Self {
		Update::With(Box::new(update))
	}
}
impl From<State> for Update {
	fn from(changes: State) -> Self {
		Update::Merge(changes)
	}
}
impl From<Value> for Update {
	/// Non-object values merge nothing.
	fn from(changes: Value) -> Self {
		Update::Merge(to_state(changes))
	}
}
impl Debug for Update {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		match self {
			Update::Merge(changes) => f.debug_tuple("Merge").field(changes).finish(),
			Update::With(_) => f.write_str("With(..)"),
		}
	}
}

/// Converts a JSON object into a [`State`]. Other values yield an empty [`State`].
#[must_use]
pub fn to_state(value: Value) -> State {
	match value {
		Value::Object(map) => map,
		Value::Null => State::new(),
		other => {
			warn!("Expected a JSON object for state but got {}; Using an empty one.", kind(&other));
			State::new()
		}
	}
}

fn kind(value: &Value) -> &'static str {
	match value {
		Value::Null => "null",
		Value::Bool(_) => "a boolean",
		Value::Number(_) => "a number",
		Value::String(_) => "a string",
		Value::Array(_) => "an array",
		Value::Object(_) => "an object",
	}
}

type Getter = dyn Fn(&State) -> Value;
type Listener = dyn Fn(&State, &State, &State);

struct Computed {
	getter: Rc<Getter>,
	cached: Option<Value>,
}

struct Inner {
	state: RefCell<State>,
	initial: State,
	computed: RefCell<HashMap<String, Computed>>,
	subscribers: Subscribers<Listener>,
	backend: Option<Rc<dyn StorageBackend>>,
	persistence_key: String,
}

/// A handle to a state store. Clones refer to the same store.
#[derive(Clone)]
pub struct Store(Rc<Inner>);

/// Creates a [`Store`]. See [`Store::new`].
#[must_use]
pub fn create_state(initial: State, config: StoreConfig) -> Store {
	Store::new(initial, config)
}

impl Store {
	/// Creates a store holding `initial`.
	///
	/// If persistence is configured, a previously saved state is loaded and shallowly merged over `initial`.
	/// Failing to do so is logged and otherwise ignored.
	#[must_use]
	#[instrument(skip(initial))]
	pub fn new(initial: State, config: StoreConfig) -> Self {
		let backend = config.persistence.as_ref().and_then(|persistence| match persistence.resolve() {
			Ok(backend) => Some(backend),
			Err(error) => {
				warn!(%error, "Persistence disabled.");
				None
			}
		});

		let mut state = initial.clone();
		if let Some(backend) = &backend {
			match load(backend.as_ref(), &config.persistence_key) {
				Ok(Some(saved)) => {
					debug!(keys = saved.len(), "Loaded persisted state.");
					state.extend(saved)
				}
				Ok(None) => debug!("No persisted state found."),
				Err(error) => warn!(%error, "Failed to load persisted state; Using the initial state."),
			}
		}

		Self(Rc::new(Inner {
			state: RefCell::new(state),
			initial,
			computed: RefCell::default(),
			subscribers: Subscribers::new(),
			backend,
			persistence_key: config.persistence_key,
		}))
	}

	/// A shallow snapshot of the whole state.
	#[must_use]
	pub fn get_state(&self) -> State {
		self.0.state.borrow().clone()
	}

	/// Reads a single value.
	///
	/// `key` is resolved, in order, as a computed value (see [`Store::computed`]),
	/// as a `.`-separated path into nested objects and arrays if it contains a `.`,
	/// or as a top-level key.
	#[must_use]
	pub fn get(&self, key: &str) -> Option<Value> {
		if let Some(value) = self.computed_value(key) {
			return Some(value);
		}
		let state = self.0.state.borrow();
		if key.contains('.') {
			lookup(&state, key).cloned()
		} else {
			state.get(key).cloned()
		}
	}

	fn computed_value(&self, name: &str) -> Option<Value> {
		let getter = {
			let computed = self.0.computed.borrow();
			let entry = computed.get(name)?;
			if let Some(cached) = &entry.cached {
				trace!(name, "Computed cache hit.");
				return Some(cached.clone());
			}
			Rc::clone(&entry.getter)
		};

		trace!(name, "Computing.");
		let value = getter(&*self.0.state.borrow());
		if let Some(entry) = self.0.computed.borrow_mut().get_mut(name) {
			entry.cached = Some(value.clone());
		}
		Some(value)
	}

	/// Applies `update` and notifies subscribers with `(new, old, changes)`.
	///
	/// The merge is shallow: each top-level key in the changes replaces the previous value wholesale.
	/// Every computed value is invalidated, regardless of which keys changed.
	///
	/// Returns a snapshot of the state after the merge.
	#[instrument(skip(self, update))]
	pub fn set_state(&self, update: impl Into<Update>) -> State {
		let old = self.get_state();
		let changes = match update.into() {
			Update::Merge(changes) => changes,
			Update::With(update) => update(&old),
		};
		debug!(keys = changes.len(), "Setting state.");

		{
			let mut state = self.0.state.borrow_mut();
			for (key, value) in &changes {
				state.insert(key.clone(), value.clone());
			}
		}
		self.invalidate();
		self.persist();

		let new = self.get_state();
		self.notify(&new, &old, &changes);
		new
	}

	/// Functional [`Store::set_state`].
	pub fn update(&self, update: impl FnOnce(&State) -> State + 'static) -> State {
		self.set_state(Update::with(update))
	}

	/// [`Store::set_state`] for a single key.
	pub fn set(&self, key: impl Into<String>, value: impl Into<Value>) -> State {
		let mut changes = State::new();
		changes.insert(key.into(), value.into());
		self.set_state(changes)
	}

	/// Replaces the state wholesale with `initial`, or with the state this store was created with.
	///
	/// Subscribers are notified with `(new, {}, replacement)`: the old state is **not** passed.
	#[instrument(skip(self, initial))]
	pub fn reset(&self, initial: Option<State>) -> State {
		let replacement = initial.unwrap_or_else(|| self.0.initial.clone());
		debug!(keys = replacement.len(), "Resetting state.");
		*self.0.state.borrow_mut() = replacement.clone();
		self.invalidate();
		self.persist();

		let new = self.get_state();
		self.notify(&new, &State::new(), &replacement);
		new
	}

	/// Calls `listener` with `(new, old, changes)` after every later update, in subscription order.
	pub fn subscribe(&self, listener: impl Fn(&State, &State, &State) + 'static) -> Subscription {
		self.0.subscribers.subscribe(Rc::new(listener))
	}

	#[must_use]
	pub fn subscriber_count(&self) -> usize {
		self.0.subscribers.len()
	}

	/// Registers a derived value readable through [`Store::get`] under `name`.
	///
	/// `getter` should be pure. It runs lazily, at most once between two updates.
	pub fn computed(&self, name: impl Into<String>, getter: impl Fn(&State) -> Value + 'static) {
		self.0.computed.borrow_mut().insert(
			name.into(),
			Computed {
				getter: Rc::new(getter),
				cached: None,
			},
		);
	}

	/// Returns whether a computed value named `name` existed.
	pub fn remove_computed(&self, name: &str) -> bool {
		self.0.computed.borrow_mut().remove(name).is_some()
	}

	fn invalidate(&self) {
		for computed in self.0.computed.borrow_mut().values_mut() {
			computed.cached = None;
		}
	}

	fn persist(&self) {
		let backend = match &self.0.backend {
			Some(backend) => backend,
			None => return,
		};
		let serialized = match serde_json::to_string(&*self.0.state.borrow()) {
			Ok(serialized) => serialized,
			Err(error) => return error!(%error, "Failed to serialise state; Not persisting."),
		};
		if let Err(error) = backend.set_item(&self.0.persistence_key, &serialized) {
			warn!(%error, "Failed to persist state.")
		}
	}

	fn notify(&self, new: &State, old: &State, changes: &State) {
		for listener in self.0.subscribers.snapshot() {
			listener(new, old, changes)
		}
	}
}
impl Debug for Store {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("Store")
			.field("state", &self.0.state.borrow())
			.field("computed", &self.0.computed.borrow().keys().collect::<Vec<_>>())
			.field("subscribers", &self.0.subscribers.len())
			.finish()
	}
}

fn load(backend: &dyn StorageBackend, key: &str) -> Result<Option<State>, PersistenceError> {
	let serialized = match backend.get_item(key)? {
		Some(serialized) => serialized,
		None => return Ok(None),
	};
	match serde_json::from_str(&serialized)? {
		Value::Object(saved) => Ok(Some(saved)),
		_ => Err(PersistenceError::NotAnObject),
	}
}

fn lookup<'a>(state: &'a State, path: &str) -> Option<&'a Value> {
	let mut segments = path.split('.');
	let mut current = state.get(segments.next()?)?;
	for segment in segments {
		current = match current {
			Value::Object(map) => map.get(segment)?,
			Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
			_ => return None,
		};
	}
	Some(current)
}
