//! Materializes virtual nodes into live structure from scratch.
//!
//! Used for the initial mount and for any subtree the differ decided to fully create or
//! replace. Rendering never fails towards the caller: malformed input degrades to an empty
//! text placeholder and is reported through `tracing`.

use crate::{
	dom::{self, LiveHandle},
	node::{AttrValue, VElement, VNode, EVENT_PREFIX},
};
use tracing::{error, trace_span, warn};

/// The tag of the container element produced for top-level sequences.
pub const SEQUENCE_TAG: &str = "fragment";

/// Renders one virtual node into a fresh, detached live node.
///
/// Never mutates its input and never panics; see the module docs for the degradation rules.
#[must_use]
pub fn render(node: &VNode) -> LiveHandle {
	match node {
		VNode::Text(text) => dom::new_text(text.clone()),
		VNode::Element(element) => render_element(element),
	}
}

/// Renders a sequence of sibling nodes under a container element, in order.
#[must_use]
pub fn render_sequence(nodes: &[VNode]) -> LiveHandle {
	let container = dom::new_element(SEQUENCE_TAG);
	for node in nodes {
		attach(&container, &render(node));
	}
	container
}

fn render_element(element: &VElement) -> LiveHandle {
	if element.tag.is_empty() {
		// The typed node model leaves an empty tag as the only malformed shape. Substitute a
		// placeholder instead of letting the condition travel any further.
		warn!("Malformed virtual element without a tag; substituting an empty text placeholder.");
		return dom::new_text("");
	}

	let span = trace_span!("render_element", tag = element.tag.as_str());
	let _enter = span.enter();

	let live = dom::new_element(element.tag.clone());
	{
		let mut live = live.borrow_mut();
		for attribute in &element.attrs {
			match (&attribute.value, attribute.name.strip_prefix(EVENT_PREFIX)) {
				(AttrValue::Listener(listener), Some(event_name)) => live.add_listener(&event_name.to_ascii_lowercase(), listener.clone()),
				(AttrValue::Listener(_), None) => {
					warn!(name = attribute.name.as_str(), "Listener value on an attribute without the event prefix; skipping.")
				}
				(AttrValue::Text(value), _) => live.set_attribute(&attribute.name, value),
				(AttrValue::Flag(true), _) => live.set_attribute(&attribute.name, ""),
				(AttrValue::Flag(false), _) => (),
			}
		}
	}

	for child in &element.children {
		attach(&live, &render(child));
	}
	live
}

fn attach(parent: &LiveHandle, child: &LiveHandle) {
	if let Err(error) = dom::append_child(parent, child) {
		// Unreachable for nodes this module just created, short of caller misuse.
		error!(%error, "Failed to append a freshly rendered child.");
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::node::{attr, flag, listener, VNode};

	#[test]
	fn renders_structure_in_order() {
		let tree = VNode::element(
			"ul",
			vec![attr("class", "todo-list")],
			vec![VNode::element("li", vec![], "one"), VNode::element("li", vec![], "two")],
		);
		assert_eq!(dom::outer_html(&render(&tree)), "<ul class=\"todo-list\"><li>one</li><li>two</li></ul>");
	}

	#[test]
	fn binds_prefixed_listeners() {
		let tree = VNode::element("button", vec![listener("onClick", |_| ())], "go");
		let live = render(&tree);
		assert_eq!(live.borrow().listeners_for("click").len(), 1);
		assert!(!live.borrow().has_attribute("onClick"));
	}

	#[test]
	fn flags_render_as_presence() {
		let tree = VNode::element("input", vec![flag("checked", true), flag("disabled", false)], VNode::text(""));
		let live = render(&tree);
		assert!(live.borrow().has_attribute("checked"));
		assert!(!live.borrow().has_attribute("disabled"));
	}

	#[test]
	fn malformed_element_degrades_to_placeholder() {
		let tree = VNode::element("", vec![], "ignored");
		let live = render(&tree);
		assert_eq!(live.borrow().text(), Some(""));
	}

	#[test]
	fn sequences_render_under_a_container() {
		let live = render_sequence(&[VNode::text("a"), VNode::text("b")]);
		assert_eq!(dom::outer_html(&live), "<fragment>ab</fragment>");
	}
}
