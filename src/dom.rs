//! The in-process live tree the renderer and patcher operate on.
//!
//! This stands in for the external rendering backend: a mutable, reference-counted node
//! structure offering the handful of structural primitives reconciliation needs. Handles are
//! cheap to clone and compare by pointer identity.

use crate::event::Listener;
use core::fmt::Write as _;
use std::{
	cell::RefCell,
	rc::{Rc, Weak},
};
use thiserror::Error;

/// The materialized, mutable structure the patcher updates in place.
pub type LiveHandle = Rc<RefCell<LiveNode>>;

/// Errors for structurally impossible live-tree operations.
///
/// Mismatches that reconciliation must survive (a missing child, an already-detached node) are
/// reported through return values instead, so callers can skip and continue.
#[derive(Debug, Error)]
pub enum DomError {
	#[error("text nodes cannot contain children")]
	TextChild,
	#[error("expected an element node")]
	NotAnElement,
	#[error("expected a text node")]
	NotAText,
}

/// One live node, either a text leaf or an element.
#[derive(Debug)]
pub enum LiveNode {
	Text(LiveText),
	Element(LiveElement),
}

#[derive(Debug)]
pub struct LiveText {
	data: String,
	parent: Weak<RefCell<LiveNode>>,
}

pub struct LiveElement {
	tag: String,
	/// Ordered by insertion, like the virtual model's attribute list.
	attributes: Vec<(String, String)>,
	listeners: Vec<(String, Listener)>,
	children: Vec<LiveHandle>,
	parent: Weak<RefCell<LiveNode>>,
}

impl core::fmt::Debug for LiveElement {
	fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
		f.debug_struct("LiveElement")
			.field("tag", &self.tag)
			.field("attributes", &self.attributes)
			.field("listeners", &self.listeners.len())
			.field("children", &self.children.len())
			.finish()
	}
}

impl LiveNode {
	#[must_use]
	pub fn is_text(&self) -> bool {
		matches!(self, Self::Text(_))
	}

	#[must_use]
	pub fn text(&self) -> Option<&str> {
		match self {
			Self::Text(text) => Some(&text.data),
			Self::Element(_) => None,
		}
	}

	#[must_use]
	pub fn tag(&self) -> Option<&str> {
		match self {
			Self::Text(_) => None,
			Self::Element(element) => Some(&element.tag),
		}
	}

	#[must_use]
	pub fn attribute(&self, name: &str) -> Option<String> {
		match self {
			Self::Text(_) => None,
			Self::Element(element) => element
				.attributes
				.iter()
				.find(|(attribute, _)| attribute == name)
				.map(|(_, value)| value.clone()),
		}
	}

	#[must_use]
	pub fn has_attribute(&self, name: &str) -> bool {
		self.attribute(name).is_some()
	}

	/// Whether the space-separated `class` attribute contains `class_name`.
	#[must_use]
	pub fn has_class(&self, class_name: &str) -> bool {
		self.attribute("class").is_some_and(|classes| classes.split_whitespace().any(|class| class == class_name))
	}

	/// Sets or overwrites an attribute. No-op with a warning on text nodes.
	pub fn set_attribute(&mut self, name: &str, value: &str) {
		match self {
			Self::Text(_) => tracing::warn!(name, "Ignoring attribute on a text node."),
			Self::Element(element) => match element.attributes.iter_mut().find(|(attribute, _)| attribute == name) {
				Some((_, existing)) => value.clone_into(existing),
				None => element.attributes.push((name.to_owned(), value.to_owned())),
			},
		}
	}

	/// Removes an attribute. Returns whether it was present.
	pub fn remove_attribute(&mut self, name: &str) -> bool {
		match self {
			Self::Text(_) => false,
			Self::Element(element) => {
				let before = element.attributes.len();
				element.attributes.retain(|(attribute, _)| attribute != name);
				element.attributes.len() != before
			}
		}
	}

	/// Binds a listener for `event_name` (already stripped of the `on` prefix and lower-cased).
	pub fn add_listener(&mut self, event_name: &str, listener: Listener) {
		match self {
			Self::Text(_) => tracing::warn!(event_name, "Ignoring event listener on a text node."),
			Self::Element(element) => element.listeners.push((event_name.to_owned(), listener)),
		}
	}

	/// Unbinds all listeners for `event_name`. Returns how many were removed.
	pub fn remove_listeners(&mut self, event_name: &str) -> usize {
		match self {
			Self::Text(_) => 0,
			Self::Element(element) => {
				let before = element.listeners.len();
				element.listeners.retain(|(name, _)| name != event_name);
				before - element.listeners.len()
			}
		}
	}

	/// Snapshots the listeners bound for `event_name`, in binding order.
	///
	/// A snapshot, so dispatch can run them without holding the node borrow.
	#[must_use]
	pub fn listeners_for(&self, event_name: &str) -> Vec<Listener> {
		match self {
			Self::Text(_) => Vec::new(),
			Self::Element(element) => element.listeners.iter().filter(|(name, _)| name == event_name).map(|(_, listener)| listener.clone()).collect(),
		}
	}

	fn parent_weak(&self) -> &Weak<RefCell<LiveNode>> {
		match self {
			Self::Text(text) => &text.parent,
			Self::Element(element) => &element.parent,
		}
	}

	fn set_parent(&mut self, parent: Weak<RefCell<LiveNode>>) {
		match self {
			Self::Text(text) => text.parent = parent,
			Self::Element(element) => element.parent = parent,
		}
	}
}

/// Creates a detached live text node.
#[must_use]
pub fn new_text(data: impl Into<String>) -> LiveHandle {
	Rc::new(RefCell::new(LiveNode::Text(LiveText {
		data: data.into(),
		parent: Weak::new(),
	})))
}

/// Creates a detached live element.
#[must_use]
pub fn new_element(tag: impl Into<String>) -> LiveHandle {
	Rc::new(RefCell::new(LiveNode::Element(LiveElement {
		tag: tag.into(),
		attributes: Vec::new(),
		listeners: Vec::new(),
		children: Vec::new(),
		parent: Weak::new(),
	})))
}

/// Overwrites a live text node's value in place.
///
/// # Errors
///
/// [`DomError::NotAText`] if `node` is an element.
pub fn set_text(node: &LiveHandle, data: &str) -> Result<(), DomError> {
	match &mut *node.borrow_mut() {
		LiveNode::Text(text) => {
			data.clone_into(&mut text.data);
			Ok(())
		}
		LiveNode::Element(_) => Err(DomError::NotAText),
	}
}

/// Appends `child` as the last child of `parent`, detaching it from any previous parent.
///
/// # Errors
///
/// [`DomError::TextChild`] if `parent` is a text node.
pub fn append_child(parent: &LiveHandle, child: &LiveHandle) -> Result<(), DomError> {
	let index = match &*parent.borrow() {
		LiveNode::Text(_) => return Err(DomError::TextChild),
		LiveNode::Element(element) => element.children.len(),
	};
	insert_before(parent, child, index)
}

/// Inserts `child` under `parent` before position `index` (clamped; past-the-end appends).
///
/// # Errors
///
/// [`DomError::TextChild`] if `parent` is a text node.
pub fn insert_before(parent: &LiveHandle, child: &LiveHandle, index: usize) -> Result<(), DomError> {
	if let Some(previous_parent) = parent_of(child) {
		let removed = remove_child(&previous_parent, child)?;
		debug_assert!(removed, "child claimed a parent it was not attached to");
	}
	match &mut *parent.borrow_mut() {
		LiveNode::Text(_) => Err(DomError::TextChild),
		LiveNode::Element(element) => {
			let index = index.min(element.children.len());
			element.children.insert(index, child.clone());
			child.borrow_mut().set_parent(Rc::downgrade(parent));
			Ok(())
		}
	}
}

/// Detaches `child` from `parent` if it is currently attached there.
///
/// Returns whether anything was removed; a `child` that is not attached under `parent` is not
/// an error, reconciliation against a concurrently mutated tree must tolerate it.
///
/// # Errors
///
/// [`DomError::TextChild`] if `parent` is a text node.
pub fn remove_child(parent: &LiveHandle, child: &LiveHandle) -> Result<bool, DomError> {
	match &mut *parent.borrow_mut() {
		LiveNode::Text(_) => Err(DomError::TextChild),
		LiveNode::Element(element) => match element.children.iter().position(|candidate| Rc::ptr_eq(candidate, child)) {
			Some(index) => {
				element.children.remove(index);
				child.borrow_mut().set_parent(Weak::new());
				Ok(true)
			}
			None => Ok(false),
		},
	}
}

/// Swaps `new` in at `old`'s position under `parent`, detaching `old`.
///
/// Returns whether `old` was found; when it was not, the caller decides how to recover.
///
/// # Errors
///
/// [`DomError::TextChild`] if `parent` is a text node.
pub fn replace_child(parent: &LiveHandle, old: &LiveHandle, new: &LiveHandle) -> Result<bool, DomError> {
	let index = match &*parent.borrow() {
		LiveNode::Text(_) => return Err(DomError::TextChild),
		LiveNode::Element(element) => element.children.iter().position(|candidate| Rc::ptr_eq(candidate, old)),
	};
	match index {
		Some(index) => {
			let removed = remove_child(parent, old)?;
			debug_assert!(removed);
			insert_before(parent, new, index)?;
			Ok(true)
		}
		None => Ok(false),
	}
}

/// The node's current parent, if it is attached.
#[must_use]
pub fn parent_of(node: &LiveHandle) -> Option<LiveHandle> {
	node.borrow().parent_weak().upgrade()
}

/// Snapshots the current children list.
#[must_use]
pub fn child_nodes(parent: &LiveHandle) -> Vec<LiveHandle> {
	match &*parent.borrow() {
		LiveNode::Text(_) => Vec::new(),
		LiveNode::Element(element) => element.children.clone(),
	}
}

#[must_use]
pub fn child_at(parent: &LiveHandle, index: usize) -> Option<LiveHandle> {
	match &*parent.borrow() {
		LiveNode::Text(_) => None,
		LiveNode::Element(element) => element.children.get(index).cloned(),
	}
}

#[must_use]
pub fn child_count(parent: &LiveHandle) -> usize {
	match &*parent.borrow() {
		LiveNode::Text(_) => 0,
		LiveNode::Element(element) => element.children.len(),
	}
}

/// Walks from `node` up through its ancestors (inclusive) and returns the first match.
///
/// The live-tree rendition of the delegation helper `closest`.
pub fn closest(node: &LiveHandle, predicate: impl Fn(&LiveNode) -> bool) -> Option<LiveHandle> {
	let mut candidate = Some(node.clone());
	while let Some(current) = candidate {
		if predicate(&current.borrow()) {
			return Some(current);
		}
		candidate = parent_of(&current);
	}
	None
}

/// Depth-first search over `root` (inclusive) for the first matching node.
pub fn find(root: &LiveHandle, predicate: impl Fn(&LiveNode) -> bool) -> Option<LiveHandle> {
	find_inner(root, &predicate)
}

fn find_inner(root: &LiveHandle, predicate: &impl Fn(&LiveNode) -> bool) -> Option<LiveHandle> {
	if predicate(&root.borrow()) {
		return Some(root.clone());
	}
	for child in child_nodes(root) {
		if let Some(found) = find_inner(&child, predicate) {
			return Some(found);
		}
	}
	None
}

/// Depth-first collection of every node under `root` (inclusive) matching the predicate.
pub fn find_all(root: &LiveHandle, predicate: impl Fn(&LiveNode) -> bool) -> Vec<LiveHandle> {
	let mut found = Vec::new();
	find_all_inner(root, &predicate, &mut found);
	found
}

fn find_all_inner(root: &LiveHandle, predicate: &impl Fn(&LiveNode) -> bool, found: &mut Vec<LiveHandle>) {
	if predicate(&root.borrow()) {
		found.push(root.clone());
	}
	for child in child_nodes(root) {
		find_all_inner(&child, predicate, found);
	}
}

/// Concatenated text content of the subtree, in document order.
#[must_use]
pub fn text_content(node: &LiveHandle) -> String {
	match &*node.borrow() {
		LiveNode::Text(text) => text.data.clone(),
		LiveNode::Element(element) => element.children.iter().map(text_content).collect(),
	}
}

/// Serializes the subtree into an HTML-like string for observable-structure comparisons.
///
/// Attributes print sorted by name, so trees that differ only in attribute insertion history
/// compare equal. Listeners are invisible here.
#[must_use]
pub fn outer_html(node: &LiveHandle) -> String {
	let mut out = String::new();
	write_html(node, &mut out);
	out
}

fn write_html(node: &LiveHandle, out: &mut String) {
	match &*node.borrow() {
		LiveNode::Text(text) => out.push_str(&text.data),
		LiveNode::Element(element) => {
			let mut attributes = element.attributes.clone();
			attributes.sort();
			write!(out, "<{}", element.tag).unwrap();
			for (name, value) in &attributes {
				write!(out, " {name}=\"{value}\"").unwrap();
			}
			out.push('>');
			for child in &element.children {
				write_html(child, out);
			}
			write!(out, "</{}>", element.tag).unwrap();
		}
	}
}
