use crate::event::Listener;
use core::fmt;
use std::rc::Rc;

/// Attribute names starting with this prefix bind event listeners instead of plain attributes.
///
/// The event name is the rest of the attribute name, lower-cased, so `onClick` and `onclick`
/// both bind a `click` listener.
pub const EVENT_PREFIX: &str = "on";

/// An immutable description of desired UI structure, not yet bound to any live structure.
///
/// The variant is resolved once at construction time; the diff/patch hot path never has to
/// probe "is this a string or an element" at runtime.
#[derive(Clone, Debug)]
pub enum VNode {
	/// A text leaf.
	Text(String),
	/// An element with a tag, attributes, children and an optional sibling-unique key.
	Element(VElement),
}

/// The element payload of [`VNode::Element`].
#[derive(Clone, Debug)]
pub struct VElement {
	pub tag: String,
	/// Ordered. Enumeration order of this list is the order the attribute differ honors.
	pub attrs: Vec<VAttribute>,
	pub children: Vec<VNode>,
	/// Correlates the same logical item across two tree snapshots even if its position changed.
	///
	/// Must be unique among siblings. Mixing keyed and unkeyed siblings in one children list
	/// is unsupported, see [`crate::diff::diff_children`].
	pub key: Option<String>,
}

/// A single named attribute.
#[derive(Clone, Debug)]
pub struct VAttribute {
	pub name: String,
	pub value: AttrValue,
}

/// An attribute value: scalar text, a boolean presence flag, or an event listener.
#[derive(Clone)]
pub enum AttrValue {
	Text(String),
	/// `Flag(false)` renders as an absent attribute, matching boolean-attribute semantics.
	Flag(bool),
	/// Only meaningful on names starting with [`EVENT_PREFIX`]. Compares by pointer identity.
	Listener(Listener),
}

impl PartialEq for AttrValue {
	fn eq(&self, other: &Self) -> bool {
		match (self, other) {
			(Self::Text(a), Self::Text(b)) => a == b,
			(Self::Flag(a), Self::Flag(b)) => a == b,
			(Self::Listener(a), Self::Listener(b)) => Rc::ptr_eq(a, b),
			_ => false,
		}
	}
}

impl fmt::Debug for AttrValue {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Text(text) => f.debug_tuple("Text").field(text).finish(),
			Self::Flag(flag) => f.debug_tuple("Flag").field(flag).finish(),
			Self::Listener(_) => f.write_str("Listener(..)"),
		}
	}
}

impl VNode {
	/// Creates a text leaf.
	pub fn text(value: impl Into<String>) -> Self {
		Self::Text(value.into())
	}

	/// Creates a well-formed element node.
	///
	/// `children` accepts a list, a single node or a bare string, which is coerced into a
	/// single-element children list. Tag names are not validated; callers are trusted.
	pub fn element(tag: impl Into<String>, attrs: Vec<VAttribute>, children: impl Into<VChildren>) -> Self {
		Self::Element(VElement {
			tag: tag.into(),
			attrs,
			children: children.into().0,
			key: None,
		})
	}

	/// Like [`VNode::element`], but tagged with a sibling-unique key for keyed diffing.
	pub fn keyed_element(tag: impl Into<String>, key: impl Into<String>, attrs: Vec<VAttribute>, children: impl Into<VChildren>) -> Self {
		Self::Element(VElement {
			tag: tag.into(),
			attrs,
			children: children.into().0,
			key: Some(key.into()),
		})
	}

	#[must_use]
	pub fn key(&self) -> Option<&str> {
		match self {
			Self::Text(_) => None,
			Self::Element(element) => element.key.as_deref(),
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
	pub fn as_text(&self) -> Option<&str> {
		match self {
			Self::Text(text) => Some(text),
			Self::Element(_) => None,
		}
	}

	#[must_use]
	pub fn as_element(&self) -> Option<&VElement> {
		match self {
			Self::Text(_) => None,
			Self::Element(element) => Some(element),
		}
	}
}

/// A children list, converted from whatever shape the caller has at hand.
#[derive(Clone, Debug, Default)]
pub struct VChildren(pub(crate) Vec<VNode>);

impl VChildren {
	#[must_use]
	pub fn none() -> Self {
		Self(Vec::new())
	}

	#[must_use]
	pub fn into_vec(self) -> Vec<VNode> {
		self.0
	}
}

impl From<Vec<VNode>> for VChildren {
	fn from(children: Vec<VNode>) -> Self {
		Self(children)
	}
}

impl<const N: usize> From<[VNode; N]> for VChildren {
	fn from(children: [VNode; N]) -> Self {
		Self(children.into())
	}
}

impl From<VNode> for VChildren {
	fn from(child: VNode) -> Self {
		Self(vec![child])
	}
}

impl From<&str> for VChildren {
	fn from(text: &str) -> Self {
		Self(vec![VNode::text(text)])
	}
}

impl From<String> for VChildren {
	fn from(text: String) -> Self {
		Self(vec![VNode::Text(text)])
	}
}

/// Creates a plain text attribute.
pub fn attr(name: impl Into<String>, value: impl Into<String>) -> VAttribute {
	VAttribute {
		name: name.into(),
		value: AttrValue::Text(value.into()),
	}
}

/// Creates a boolean presence-flag attribute.
pub fn flag(name: impl Into<String>, on: bool) -> VAttribute {
	VAttribute {
		name: name.into(),
		value: AttrValue::Flag(on),
	}
}

/// Creates an event listener attribute. `name` should start with [`EVENT_PREFIX`].
pub fn listener(name: impl Into<String>, listener: impl Fn(&crate::event::Event) + 'static) -> VAttribute {
	VAttribute {
		name: name.into(),
		value: AttrValue::Listener(Rc::new(listener)),
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn children_coercion() {
		let single = VNode::element("ul", vec![], VNode::text("one"));
		let listed = VNode::element("ul", vec![], vec![VNode::text("one")]);
		assert_eq!(single.as_element().unwrap().children.len(), 1);
		assert_eq!(listed.as_element().unwrap().children.len(), 1);

		let from_str = VNode::element("p", vec![], "hello");
		assert_eq!(from_str.as_element().unwrap().children[0].as_text(), Some("hello"));
	}

	#[test]
	fn listener_identity() {
		let a = listener("onclick", |_| ());
		let b = listener("onclick", |_| ());
		assert_eq!(a.value, a.value.clone());
		assert_ne!(a.value, b.value);
	}
}
