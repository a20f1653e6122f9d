//! Synthetic events and bubbling dispatch over the live tree.
//!
//! Listeners are bound at render time from `on`-prefixed attributes; dispatch starts at the
//! target and walks up through its ancestors, which is what delegated handlers rely on.

use crate::dom::{self, LiveHandle};
use std::{
	cell::Cell,
	panic::{catch_unwind, AssertUnwindSafe},
	rc::Rc,
};
use tracing::{error, trace};

/// A bound event listener.
pub type Listener = Rc<dyn Fn(&Event)>;

/// A synthetic event travelling through the live tree.
pub struct Event {
	name: String,
	/// The pressed key for keyboard events, e.g. `Enter` or `Escape`.
	key: Option<String>,
	/// The current input value for input-ish events.
	value: Option<String>,
	target: LiveHandle,
	propagation_stopped: Cell<bool>,
}

impl Event {
	#[must_use]
	pub fn new(name: impl Into<String>, target: LiveHandle) -> Self {
		Self {
			name: name.into(),
			key: None,
			value: None,
			target,
			propagation_stopped: Cell::new(false),
		}
	}

	#[must_use]
	pub fn with_key(mut self, key: impl Into<String>) -> Self {
		self.key = Some(key.into());
		self
	}

	#[must_use]
	pub fn with_value(mut self, value: impl Into<String>) -> Self {
		self.value = Some(value.into());
		self
	}

	#[must_use]
	pub fn name(&self) -> &str {
		&self.name
	}

	#[must_use]
	pub fn key(&self) -> Option<&str> {
		self.key.as_deref()
	}

	#[must_use]
	pub fn value(&self) -> Option<&str> {
		self.value.as_deref()
	}

	/// The node the event was dispatched at, regardless of which ancestor is handling it.
	#[must_use]
	pub fn target(&self) -> &LiveHandle {
		&self.target
	}

	/// Stops the event from bubbling past the currently handled node.
	pub fn stop_propagation(&self) {
		self.propagation_stopped.set(true);
	}

	#[must_use]
	pub fn propagation_stopped(&self) -> bool {
		self.propagation_stopped.get()
	}
}

/// Dispatches `event` at its target and bubbles it towards the root.
///
/// Each node's listeners run in binding order against a snapshot taken before any of them is
/// invoked, so a listener that mutates the tree (or rebinds listeners) cannot fault dispatch.
/// A panicking listener is isolated and logged; the remaining listeners still run.
pub fn dispatch(event: &Event) {
	let mut current = Some(event.target().clone());
	while let Some(node) = current {
		let listeners = node.borrow().listeners_for(event.name());
		trace!(name = event.name(), count = listeners.len(), "Dispatching at node.");
		for listener in listeners {
			if catch_unwind(AssertUnwindSafe(|| listener(event))).is_err() {
				error!(name = event.name(), "Event listener panicked; continuing with the remaining listeners.");
			}
			if event.propagation_stopped() {
				return;
			}
		}
		current = dom::parent_of(&node);
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::dom::{append_child, new_element};
	use std::cell::RefCell;

	#[test]
	fn bubbles_to_ancestors() {
		let root = new_element("ul");
		let item = new_element("li");
		append_child(&root, &item).unwrap();

		let seen = Rc::new(RefCell::new(Vec::new()));
		let inner = seen.clone();
		item.borrow_mut().add_listener("click", Rc::new(move |_| inner.borrow_mut().push("item")));
		let outer = seen.clone();
		root.borrow_mut().add_listener("click", Rc::new(move |_| outer.borrow_mut().push("root")));

		dispatch(&Event::new("click", item.clone()));
		assert_eq!(*seen.borrow(), ["item", "root"]);
	}

	#[test]
	fn stop_propagation_halts_bubbling() {
		let root = new_element("div");
		let child = new_element("button");
		append_child(&root, &child).unwrap();

		child.borrow_mut().add_listener("click", Rc::new(Event::stop_propagation));
		let reached = Rc::new(Cell::new(false));
		let flag = reached.clone();
		root.borrow_mut().add_listener("click", Rc::new(move |_| flag.set(true)));

		dispatch(&Event::new("click", child.clone()));
		assert!(!reached.get());
	}

	#[test]
	fn panicking_listener_is_isolated() {
		let node = new_element("button");
		node.borrow_mut().add_listener("click", Rc::new(|_| panic!("listener bug")));
		let reached = Rc::new(Cell::new(false));
		let flag = reached.clone();
		node.borrow_mut().add_listener("click", Rc::new(move |_| flag.set(true)));

		dispatch(&Event::new("click", node.clone()));
		assert!(reached.get());
	}
}
