//! Applies a [`Patch`] against the live tree, recursing into children and delegating to the
//! renderer for creation and replacement.
//!
//! Internally every step returns `Result`; the public [`apply`] is the designated collapse
//! boundary. Nothing propagates past it: an internal fault is logged and the pre-patch handle
//! is returned unchanged, so the worst case is a stale or partially updated live tree.

use crate::{
	diff::{AttrPatch, Patch},
	dom::{self, DomError, LiveHandle},
	node::{AttrValue, EVENT_PREFIX},
	render::render,
};
use thiserror::Error;
use tracing::{error, trace_span, warn};

/// Faults that abort the current patch application.
///
/// Most degraded situations (detached targets, missing children) are skipped with a warning
/// instead; only structural impossibilities end up here.
#[derive(Debug, Error)]
pub enum PatchError {
	#[error(transparent)]
	Dom(#[from] DomError),
	#[error("update patch targets a text node")]
	UpdateTargetsText,
}

/// Applies `patch` to `current` under `parent` and returns the next live handle the caller
/// must retain: the `Create`/`Replace` replacement, `None` after `Remove`, `current` otherwise.
///
/// An absent patch is the no-op fast path. Never panics and never returns an error: faults
/// are logged and leave the pre-patch handle in place.
#[must_use]
pub fn apply(parent: &LiveHandle, current: Option<&LiveHandle>, patch: Option<&Patch>) -> Option<LiveHandle> {
	match apply_inner(parent, current, patch) {
		Ok(next) => next,
		Err(fault) => {
			error!(%fault, "Failed to apply patch; keeping the pre-patch node.");
			current.cloned()
		}
	}
}

fn apply_inner(parent: &LiveHandle, current: Option<&LiveHandle>, patch: Option<&Patch>) -> Result<Option<LiveHandle>, PatchError> {
	let Some(patch) = patch else {
		return Ok(current.cloned());
	};
	match patch {
		Patch::Create(node) => {
			let created = render(node);
			dom::append_child(parent, &created)?;
			Ok(Some(created))
		}
		Patch::Remove => {
			if let Some(current) = current {
				if !dom::remove_child(parent, current)? {
					warn!("Remove target is no longer attached here; skipping.");
				}
			}
			Ok(None)
		}
		Patch::UpdateText(text) => {
			match current {
				None => warn!("Text update without a live target; skipping."),
				Some(current) => {
					if dom::set_text(current, text).is_err() {
						warn!("Text update targets a non-text node; skipping.");
					}
				}
			}
			Ok(current.cloned())
		}
		Patch::Replace(node) => {
			let replacement = render(node);
			match current {
				None => {
					warn!("Replace without a live target; appending the replacement instead.");
					dom::append_child(parent, &replacement)?;
				}
				Some(current) => {
					if !dom::replace_child(parent, current, &replacement)? {
						warn!("Replace target is no longer attached here; appending the replacement instead.");
						dom::append_child(parent, &replacement)?;
					}
				}
			}
			Ok(Some(replacement))
		}
		Patch::Update { attrs, children } => {
			let Some(current) = current else {
				warn!("Element update without a live target; skipping.");
				return Ok(None);
			};
			if current.borrow().is_text() {
				return Err(PatchError::UpdateTargetsText);
			}
			apply_attrs(current, attrs);
			apply_children(current, children)?;
			Ok(Some(current.clone()))
		}
	}
}

/// Applies attribute edits in patch order. An absent value removes the attribute; a listener
/// value rebinds the event (previous bindings for that event are dropped first).
fn apply_attrs(target: &LiveHandle, attrs: &[AttrPatch]) {
	let mut target = target.borrow_mut();
	for patch in attrs {
		match &patch.value {
			None => {
				target.remove_attribute(&patch.name);
				if let Some(event_name) = patch.name.strip_prefix(EVENT_PREFIX) {
					target.remove_listeners(&event_name.to_ascii_lowercase());
				}
			}
			Some(AttrValue::Text(value)) => target.set_attribute(&patch.name, value),
			Some(AttrValue::Flag(true)) => target.set_attribute(&patch.name, ""),
			Some(AttrValue::Flag(false)) => {
				target.remove_attribute(&patch.name);
			}
			Some(AttrValue::Listener(listener)) => match patch.name.strip_prefix(EVENT_PREFIX) {
				Some(event_name) => {
					let event_name = event_name.to_ascii_lowercase();
					target.remove_listeners(&event_name);
					target.add_listener(&event_name, listener.clone());
				}
				None => warn!(name = patch.name.as_str(), "Listener value on an attribute without the event prefix; skipping."),
			},
		}
	}
}

/// Walks the live children in parallel with the child-patch list by position: creations insert
/// before the current position, removals detach without advancing, everything else recurses on
/// the existing child and advances. Live children beyond the patch list are trimmed.
fn apply_children(target: &LiveHandle, children: &[Option<Patch>]) -> Result<(), PatchError> {
	let span = trace_span!("apply_children", patches = children.len());
	let _enter = span.enter();

	let mut position = 0_usize;
	for patch in children {
		let existing = dom::child_at(target, position);
		match (patch, existing) {
			(Some(Patch::Create(node)), _) => {
				let created = render(node);
				dom::insert_before(target, &created, position)?;
				position += 1;
			}
			(Some(Patch::Remove), Some(existing)) => {
				// The position does not advance over a removed child.
				dom::remove_child(target, &existing)?;
			}
			(Some(Patch::Remove), None) => warn!(position, "Removal beyond the end of the live children; skipping."),
			(other, Some(existing)) => {
				apply_inner(target, Some(&existing), other.as_ref())?;
				position += 1;
			}
			(Some(_), None) => warn!(position, "Patch beyond the end of the live children; skipping."),
			(None, None) => position += 1,
		}
	}

	while dom::child_count(target) > children.len() {
		let last = dom::child_at(target, dom::child_count(target) - 1).expect("child_count is nonzero");
		dom::remove_child(target, &last)?;
	}
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::{
		diff::diff,
		node::{attr, VNode},
	};

	fn mount(tree: &VNode) -> (LiveHandle, LiveHandle) {
		let parent = dom::new_element("root");
		let live = render(tree);
		dom::append_child(&parent, &live).unwrap();
		(parent, live)
	}

	#[test]
	fn noop_patch_returns_current() {
		let tree = VNode::text("hi");
		let (parent, live) = mount(&tree);
		let next = apply(&parent, Some(&live), None);
		assert!(std::rc::Rc::ptr_eq(&next.unwrap(), &live));
	}

	#[test]
	fn remove_detaches_and_tolerates_detached_targets() {
		let tree = VNode::text("hi");
		let (parent, live) = mount(&tree);
		assert!(apply(&parent, Some(&live), Some(&Patch::Remove)).is_none());
		assert_eq!(dom::child_count(&parent), 0);
		// Applying against an already-detached node degrades gracefully.
		assert!(apply(&parent, Some(&live), Some(&Patch::Remove)).is_none());
	}

	#[test]
	fn update_text_in_place() {
		let old = VNode::text("a");
		let new = VNode::text("b");
		let (parent, live) = mount(&old);
		let next = apply(&parent, Some(&live), diff(Some(&old), Some(&new)).as_ref()).unwrap();
		assert!(std::rc::Rc::ptr_eq(&next, &live), "text updates keep node identity");
		assert_eq!(dom::text_content(&parent), "b");
	}

	#[test]
	fn replace_swaps_in_position() {
		let old = VNode::element("ul", vec![], vec![VNode::element("li", vec![], "a"), VNode::element("li", vec![], "b")]);
		let new = VNode::element("ul", vec![], vec![VNode::element("li", vec![], "a"), VNode::element("em", vec![], "b")]);
		let (parent, live) = mount(&old);
		let next = apply(&parent, Some(&live), diff(Some(&old), Some(&new)).as_ref()).unwrap();
		assert_eq!(dom::outer_html(&next), "<ul><li>a</li><em>b</em></ul>");
	}

	#[test]
	fn update_applies_attribute_patches() {
		let old = VNode::element("p", vec![attr("class", "a"), attr("id", "x")], "t");
		let new = VNode::element("p", vec![attr("class", "b")], "t");
		let (parent, live) = mount(&old);
		let next = apply(&parent, Some(&live), diff(Some(&old), Some(&new)).as_ref()).unwrap();
		assert_eq!(next.borrow().attribute("class"), Some("b".to_owned()));
		assert!(!next.borrow().has_attribute("id"));
	}

	#[test]
	fn shrinking_child_lists() {
		let old = VNode::element("ul", vec![], vec![VNode::text("a"), VNode::text("b"), VNode::text("c")]);
		let new = VNode::element("ul", vec![], vec![VNode::text("a")]);
		let (parent, live) = mount(&old);
		let next = apply(&parent, Some(&live), diff(Some(&old), Some(&new)).as_ref()).unwrap();
		assert_eq!(dom::outer_html(&next), "<ul>a</ul>");
	}

	#[test]
	fn live_children_beyond_the_patch_list_are_trimmed() {
		let old = VNode::element("ul", vec![], vec![VNode::text("a")]);
		let (parent, live) = mount(&old);
		// Concurrent external mutation the differ never saw.
		dom::append_child(&live, &dom::new_text("stray")).unwrap();
		let next = apply(&parent, Some(&live), diff(Some(&old), Some(&old)).as_ref()).unwrap();
		assert_eq!(dom::outer_html(&next), "<ul>a</ul>");
	}

	#[test]
	fn faults_keep_the_pre_patch_handle() {
		let parent = dom::new_element("root");
		let live = dom::new_text("leaf");
		dom::append_child(&parent, &live).unwrap();
		// An element update against a text node is a structural impossibility; the boundary
		// collapses it to "keep as-is".
		let patch = Patch::Update {
			attrs: Vec::new(),
			children: Vec::new(),
		};
		let next = apply(&parent, Some(&live), Some(&patch)).unwrap();
		assert!(std::rc::Rc::ptr_eq(&next, &live));
		assert_eq!(dom::text_content(&parent), "leaf");
	}
}
