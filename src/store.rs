//! An explicitly owned observable state container.
//!
//! The store is passed around as a value (handles clone cheaply) instead of living in a hidden
//! global. Listeners are notified synchronously, once per [`Store::update`], with no payload;
//! they re-read state through [`Store::with`].

use std::{
	cell::{Cell, RefCell},
	panic::{catch_unwind, AssertUnwindSafe},
	rc::{Rc, Weak},
};
use tracing::{error, trace};

type ListenerList = RefCell<Vec<(usize, Rc<dyn Fn()>)>>;

/// A shared handle to an observable state container.
pub struct Store<S> {
	state: Rc<RefCell<S>>,
	listeners: Rc<ListenerList>,
	next_listener: Rc<Cell<usize>>,
}

impl<S> Clone for Store<S> {
	fn clone(&self) -> Self {
		Self {
			state: self.state.clone(),
			listeners: self.listeners.clone(),
			next_listener: self.next_listener.clone(),
		}
	}
}

impl<S> Store<S> {
	#[must_use]
	pub fn new(initial: S) -> Self {
		Self {
			state: Rc::new(RefCell::new(initial)),
			listeners: Rc::new(RefCell::new(Vec::new())),
			next_listener: Rc::new(Cell::new(0)),
		}
	}

	/// Reads the current state.
	///
	/// The state borrow is released before `with` returns, so the closure must not call
	/// [`Store::update`] on the same store.
	pub fn with<R>(&self, read: impl FnOnce(&S) -> R) -> R {
		read(&self.state.borrow())
	}

	/// Mutates the state, then notifies every subscriber exactly once.
	///
	/// The mutation borrow is released before notification, so listeners can read freely.
	pub fn update(&self, mutate: impl FnOnce(&mut S)) {
		mutate(&mut self.state.borrow_mut());
		self.notify();
	}

	/// Subscribes to state transitions. The listener is invoked with no payload.
	///
	/// The returned guard unsubscribes on drop; call [`Subscription::forget`] for a listener
	/// that should live as long as the store.
	#[must_use = "dropping the subscription unsubscribes the listener"]
	pub fn subscribe(&self, listener: impl Fn() + 'static) -> Subscription {
		let id = self.next_listener.get();
		self.next_listener.set(id + 1);
		self.listeners.borrow_mut().push((id, Rc::new(listener)));
		Subscription {
			listeners: Rc::downgrade(&self.listeners),
			id,
		}
	}

	/// Notifies against a snapshot of the listener list, so listeners may subscribe and
	/// unsubscribe re-entrantly. A panicking listener is isolated and logged; it never
	/// prevents the remaining listeners from running.
	fn notify(&self) {
		let listeners: Vec<Rc<dyn Fn()>> = self.listeners.borrow().iter().map(|(_, listener)| listener.clone()).collect();
		trace!(count = listeners.len(), "Notifying state listeners.");
		for listener in listeners {
			if catch_unwind(AssertUnwindSafe(|| listener())).is_err() {
				error!("State listener panicked; continuing with the remaining listeners.");
			}
		}
	}
}

impl<S: Clone> Store<S> {
	/// Clones the current state out.
	#[must_use]
	pub fn get(&self) -> S {
		self.state.borrow().clone()
	}
}

/// Disposer for a [`Store::subscribe`] registration.
#[must_use = "dropping the subscription unsubscribes the listener"]
pub struct Subscription {
	listeners: Weak<ListenerList>,
	id: usize,
}

impl Subscription {
	/// Leaves the listener subscribed for as long as the store lives.
	pub fn forget(mut self) {
		self.listeners = Weak::new();
	}
}

impl Drop for Subscription {
	fn drop(&mut self) {
		if let Some(listeners) = self.listeners.upgrade() {
			listeners.borrow_mut().retain(|(id, _)| *id != self.id);
		}
	}
}
