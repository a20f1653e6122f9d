//! A small hash-based router.
//!
//! The browser listener is an external collaborator; the host forwards raw hash changes to
//! [`Router::handle_hash_change`], and application code navigates explicitly.

use hashbrown::HashMap;
use std::{cell::RefCell, rc::Rc};
use tracing::debug;

/// Route table plus the current route.
#[derive(Default)]
pub struct Router {
	routes: RefCell<HashMap<String, Rc<dyn Fn()>>>,
	current: RefCell<String>,
}

impl Router {
	#[must_use]
	pub fn new() -> Self {
		Self {
			routes: RefCell::new(HashMap::new()),
			current: RefCell::new("/".to_owned()),
		}
	}

	/// Registers a handler for `path`, replacing any previous one.
	pub fn add_route(&self, path: impl Into<String>, handler: impl Fn() + 'static) {
		self.routes.borrow_mut().insert(path.into(), Rc::new(handler));
	}

	/// Records `path` as the current route and fires its handler.
	///
	/// An unknown path still becomes the current route; that is not an error.
	pub fn navigate(&self, path: &str) {
		path.clone_into(&mut self.current.borrow_mut());
		// Cloned out so the handler can re-enter the router.
		let handler = self.routes.borrow().get(path).cloned();
		match handler {
			Some(handler) => handler(),
			None => debug!(path, "No handler registered for route."),
		}
	}

	/// Entry point for the host's hash-change listener: strips a leading `#`, treats an empty
	/// remainder as `/`, then navigates.
	pub fn handle_hash_change(&self, raw_hash: &str) {
		let path = raw_hash.strip_prefix('#').unwrap_or(raw_hash);
		let path = if path.is_empty() { "/" } else { path };
		self.navigate(path);
	}

	#[must_use]
	pub fn current_route(&self) -> String {
		self.current.borrow().clone()
	}
}
