//! The reconciliation-cycle driver.
//!
//! Owns the single mutable (old virtual tree, live root) pair. Each state transition runs one
//! full cycle on the calling thread: rebuild the virtual tree from current state, diff it
//! against the retained old tree, patch the live root, retain the new pair, then run the
//! registered post-commit hooks with the freshly patched root.
//!
//! Post-commit hooks replace schedule-after-current-task callbacks (deferred focus setting and
//! the like): they receive the current live root instead of capturing a possibly stale handle,
//! though they still must re-validate that their specific target exists.

use crate::{
	diff::diff,
	dom::LiveHandle,
	node::VNode,
	patch::apply,
	store::{Store, Subscription},
};
use std::{
	cell::RefCell,
	rc::{Rc, Weak},
};
use tracing::{error, trace_span};

type CommitHook = Box<dyn Fn(&LiveHandle)>;

/// Drives rebuild → diff → patch cycles for one mounted view.
pub struct App<S> {
	store: Store<S>,
	build: Box<dyn Fn(&S) -> VNode>,
	container: LiveHandle,
	current: RefCell<Option<(VNode, LiveHandle)>>,
	commit_hooks: RefCell<Vec<CommitHook>>,
	subscription: RefCell<Option<Subscription>>,
}

impl<S: 'static> App<S> {
	/// Renders `build(state)` into `container`, subscribes to the store, and returns the
	/// driver handle. The subscription lives as long as the returned `App`.
	///
	/// `build` must be deterministic and side-effect-free; the diff against the retained old
	/// tree is only meaningful if an unchanged state rebuilds an equivalent tree.
	pub fn mount(store: &Store<S>, build: impl Fn(&S) -> VNode + 'static, container: LiveHandle) -> Rc<Self> {
		let app = Rc::new(Self {
			store: store.clone(),
			build: Box::new(build),
			container,
			current: RefCell::new(None),
			commit_hooks: RefCell::new(Vec::new()),
			subscription: RefCell::new(None),
		});

		app.render_cycle();

		let weak: Weak<Self> = Rc::downgrade(&app);
		let subscription = store.subscribe(move || {
			if let Some(app) = weak.upgrade() {
				app.render_cycle();
			}
		});
		*app.subscription.borrow_mut() = Some(subscription);
		app
	}

	/// Registers a hook run after every completed patch cycle with the fresh live root.
	pub fn on_commit(&self, hook: impl Fn(&LiveHandle) + 'static) {
		self.commit_hooks.borrow_mut().push(Box::new(hook));
	}

	/// The live root as of the last completed cycle.
	#[must_use]
	pub fn live_root(&self) -> Option<LiveHandle> {
		self.current.borrow().as_ref().map(|(_, root)| root.clone())
	}

	#[must_use]
	pub fn store(&self) -> &Store<S> {
		&self.store
	}

	/// One full reconciliation cycle. Also performs the initial mount, for which the old side
	/// is absent and the diff degenerates to a creation.
	fn render_cycle(&self) {
		let span = trace_span!("render_cycle");
		let _enter = span.enter();

		let new_tree = self.store.with(|state| (self.build)(state));
		let previous = self.current.borrow_mut().take();
		let (old_tree, old_root) = match &previous {
			Some((tree, root)) => (Some(tree), Some(root)),
			None => (None, None),
		};

		let patch = diff(old_tree, Some(&new_tree));
		match apply(&self.container, old_root, patch.as_ref()) {
			Some(root) => {
				*self.current.borrow_mut() = Some((new_tree, root.clone()));
				for hook in &*self.commit_hooks.borrow() {
					hook(&root);
				}
			}
			None => {
				// Unreachable short of severe live-tree corruption; the next cycle remounts.
				error!("Reconciliation lost the live root; remounting on the next state change.");
			}
		}
	}
}
