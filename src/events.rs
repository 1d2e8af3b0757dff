//! A named-event bus.
//!
//! Each [`EventBus`] is an independent instance. Components that need one are handed it explicitly.

use crate::subscription::{Subscribers, Subscription};
use core::cell::RefCell;
use hashbrown::HashMap;
use serde_json::Value;
use std::rc::Rc;
use tracing::trace;

type Listener = dyn Fn(&Value);

#[derive(Debug, Default, Clone)]
pub struct EventBus {
	listeners: Rc<RefCell<HashMap<String, Subscribers<Listener>>>>,
}
impl EventBus {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	/// Calls `listener` for every later [`EventBus::emit`] of `event`, in subscription order.
	pub fn on(&self, event: &str, listener: impl Fn(&Value) + 'static) -> Subscription {
		let subscribers = self.listeners.borrow_mut().entry(event.to_owned()).or_default().clone();
		subscribers.subscribe(Rc::new(listener))
	}

	/// Calls the listeners of `event` with `payload`. Returns how many were called.
	pub fn emit(&self, event: &str, payload: &Value) -> usize {
		let listeners = match self.listeners.borrow().get(event) {
			Some(subscribers) => subscribers.snapshot(),
			None => Vec::new(),
		};
		trace!(event, count = listeners.len(), "Emitting.");
		for listener in &listeners {
			listener(payload)
		}
		listeners.len()
	}

	/// Removes all listeners of `event`.
	pub fn off(&self, event: &str) {
		if let Some(subscribers) = self.listeners.borrow_mut().remove(event) {
			subscribers.clear()
		}
	}

	pub fn clear(&self) {
		for (_, subscribers) in self.listeners.borrow_mut().drain() {
			subscribers.clear()
		}
	}

	#[must_use]
	pub fn listener_count(&self, event: &str) -> usize {
		self.listeners.borrow().get(event).map_or(0, Subscribers::len)
	}
}
