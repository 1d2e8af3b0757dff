//! Ordered callback lists with idempotent unsubscription.

use core::{
	cell::{Cell, RefCell},
	fmt::{self, Debug, Formatter},
};
use std::rc::{Rc, Weak};

/// An ordered list of callbacks.
///
/// Cloning yields another handle to the same list.
pub struct Subscribers<F: ?Sized> {
	entries: Rc<RefCell<Vec<(u64, Rc<F>)>>>,
	next_id: Rc<Cell<u64>>,
}
impl<F: ?Sized> Clone for Subscribers<F> {
	fn clone(&self) -> Self {
		Self {
			entries: Rc::clone(&self.entries),
			next_id: Rc::clone(&self.next_id),
		}
	}
}
impl<F: ?Sized> Default for Subscribers<F> {
	fn default() -> Self {
		Self {
			entries: Rc::default(),
			next_id: Rc::default(),
		}
	}
}
impl<F: ?Sized> Debug for Subscribers<F> {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("Subscribers").field("len", &self.entries.borrow().len()).finish()
	}
}
impl<F: ?Sized + 'static> Subscribers<F> {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	/// Appends `callback`. The returned [`Subscription`] removes exactly this entry.
	pub fn subscribe(&self, callback: Rc<F>) -> Subscription {
		let id = self.next_id.get();
		self.next_id.set(id + 1);
		self.entries.borrow_mut().push((id, callback));

		let entries: Weak<RefCell<Vec<(u64, Rc<F>)>>> = Rc::downgrade(&self.entries);
		Subscription::new(move || {
			if let Some(entries) = entries.upgrade() {
				let mut entries = entries.borrow_mut();
				if let Some(index) = entries.iter().position(|(entry_id, _)| *entry_id == id) {
					entries.remove(index);
				}
			}
		})
	}

	/// The current callbacks, in subscription order.
	///
	/// Taking a snapshot before calling them lets callbacks (un)subscribe re-entrantly.
	#[must_use]
	pub fn snapshot(&self) -> Vec<Rc<F>> {
		self.entries.borrow().iter().map(|(_, callback)| Rc::clone(callback)).collect()
	}

	#[must_use]
	pub fn len(&self) -> usize {
		self.entries.borrow().len()
	}

	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.entries.borrow().is_empty()
	}

	pub fn clear(&self) {
		self.entries.borrow_mut().clear()
	}
}

/// Removes a callback when [`Subscription::unsubscribe`] is called.
///
/// Dropping a [`Subscription`] does **not** unsubscribe.
/// Calling [`Subscription::unsubscribe`] more than once has no further effect.
pub struct Subscription(RefCell<Option<Box<dyn FnOnce()>>>);
impl Subscription {
	pub fn new(unsubscribe: impl FnOnce() + 'static) -> Self {
		Self(RefCell::new(Some(Box::new(unsubscribe))))
	}

	pub fn unsubscribe(&self) {
		let unsubscribe = self.0.borrow_mut().take();
		if let Some(unsubscribe) = unsubscribe {
			unsubscribe()
		}
	}

	#[must_use]
	pub fn is_active(&self) -> bool {
		self.0.borrow().is_some()
	}
}
impl Debug for Subscription {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("Subscription").field("active", &self.is_active()).finish()
	}
}
