//! Compares two immutable virtual-tree snapshots and produces the minimal declarative patch
//! turning one into the other.
//!
//! Diffing only reads its inputs; the patch owns clones of whatever new subtrees it needs, so
//! it stays applicable after the caller drops the snapshots.

use crate::node::{AttrValue, VAttribute, VNode};
use hashbrown::HashMap;
use tracing::{error, trace_span};

/// A value describing the minimal edit turning one virtual tree into another.
///
/// Transient: produced by [`diff`], applied once by [`crate::patch::apply`], then discarded.
#[derive(Debug)]
pub enum Patch {
	/// Render the node and append it; there was nothing before.
	Create(VNode),
	/// Detach the live node.
	Remove,
	/// Render the node and swap it in at the live node's position.
	Replace(VNode),
	/// Overwrite a live text node's value in place.
	UpdateText(String),
	/// Same tag: reconcile attributes, then children.
	///
	/// A `None` entry in `children` means "no change, keep as-is".
	Update {
		attrs: Vec<AttrPatch>,
		children: Vec<Option<Patch>>,
	},
}

/// One attribute edit; `value: None` removes the attribute.
#[derive(Debug)]
pub struct AttrPatch {
	pub name: String,
	pub value: Option<AttrValue>,
}

impl Patch {
	/// Whether applying this patch can change nothing observable.
	///
	/// `diff(T, T)` yields patches for which this holds on every nested entry.
	#[must_use]
	pub fn is_noop(&self) -> bool {
		match self {
			Self::Create(_) | Self::Remove | Self::Replace(_) | Self::UpdateText(_) => false,
			Self::Update { attrs, children } => attrs.is_empty() && children.iter().all(|child| child.as_ref().map_or(true, Patch::is_noop)),
		}
	}
}

/// Diffs two optional nodes, by case and in priority order:
///
/// 1. `old` absent: create.
/// 2. `new` absent: remove.
/// 3. Both text: no-op when equal, text update otherwise.
/// 4. Tag mismatch (text vs. element included): replace.
/// 5. Same tag: attribute and children reconciliation.
#[must_use]
pub fn diff(old: Option<&VNode>, new: Option<&VNode>) -> Option<Patch> {
	match (old, new) {
		(None, None) => None,
		(None, Some(new)) => Some(Patch::Create(new.clone())),
		(Some(_), None) => Some(Patch::Remove),
		(Some(VNode::Text(old)), Some(VNode::Text(new))) => (old != new).then(|| Patch::UpdateText(new.clone())),
		(Some(old), Some(new)) if old.tag() != new.tag() => Some(Patch::Replace(new.clone())),
		(Some(VNode::Element(old)), Some(VNode::Element(new))) => {
			let span = trace_span!("diff_element", tag = old.tag.as_str());
			let _enter = span.enter();
			Some(Patch::Update {
				attrs: diff_attrs(&old.attrs, &new.attrs),
				children: diff_children(&old.children, &new.children),
			})
		}
		// `tag()` equality above already separated text from elements.
		(Some(_), Some(_)) => unreachable!("mixed text/element nodes with equal tags"),
	}
}

/// Produces the attribute delta: removals for old-only names first, then sets for new names
/// whose value differs (new-only names included), each group in its list's own order.
///
/// Unchanged names emit nothing. Listener values compare by pointer identity, so a rebuilt
/// closure counts as changed.
#[must_use]
pub fn diff_attrs(old: &[VAttribute], new: &[VAttribute]) -> Vec<AttrPatch> {
	let mut patches = Vec::new();
	for removed in old.iter().filter(|old| !new.iter().any(|new| new.name == old.name)) {
		patches.push(AttrPatch {
			name: removed.name.clone(),
			value: None,
		});
	}
	for added in new {
		let unchanged = old.iter().any(|old| old.name == added.name && old.value == added.value);
		if !unchanged {
			patches.push(AttrPatch {
				name: added.name.clone(),
				value: Some(added.value.clone()),
			});
		}
	}
	patches
}

/// Diffs two children lists, choosing the policy per list: keyed matching as soon as any child
/// on either side carries a key, index-by-index otherwise.
#[must_use]
pub fn diff_children(old: &[VNode], new: &[VNode]) -> Vec<Option<Patch>> {
	if old.iter().chain(new).any(|child| child.key().is_some()) {
		diff_children_keyed(old, new)
	} else {
		diff_children_positional(old, new)
	}
}

/// Index-by-index, conceptually padding the shorter list with absent entries.
fn diff_children_positional(old: &[VNode], new: &[VNode]) -> Vec<Option<Patch>> {
	(0..old.len().max(new.len())).map(|index| diff(old.get(index), new.get(index))).collect()
}

/// Keyed matching: an old/new pair with the same key is updated in place even if its position
/// changed, so reordered or filtered lists keep live subtree identity (and focus/selection
/// state) instead of destroying and recreating unrelated rows.
///
/// The patch list carries one slot per old index, an update for matched keys and a removal for
/// vanished ones. Creations for new-only children anchor before the slot of the next matched
/// key in new-list order (unanchored ones trail), so un-filtering a list reinserts rows at
/// their place instead of the tail. Surviving keys that changed relative order stay at their
/// old positions; there is no move edit, identity preservation wins over exact order there.
///
/// Mixing keyed and unkeyed siblings in one list is unsupported: rejected by `debug_assert!`,
/// degraded to remove/create with an error log in release builds. Duplicate keys likewise.
fn diff_children_keyed(old: &[VNode], new: &[VNode]) -> Vec<Option<Patch>> {
	let span = trace_span!("diff_children_keyed", old = old.len(), new = new.len());
	let _enter = span.enter();

	let mut old_index = HashMap::with_capacity(old.len());
	for (index, child) in old.iter().enumerate() {
		match child.key() {
			Some(key) => {
				let clash = old_index.insert(key, (index, child));
				debug_assert!(clash.is_none(), "duplicate key {key:?} among siblings");
				if clash.is_some() {
					error!(key, "Duplicate key among old siblings; the later child wins.");
				}
			}
			None => {
				debug_assert!(false, "unkeyed child among keyed siblings");
				error!(index, "Unkeyed child in a keyed list; treating it as removed.");
			}
		}
	}

	// One slot per old child. Anything not matched below is a removal at its original index.
	let mut slots: Vec<Option<Patch>> = (0..old.len()).map(|_| Some(Patch::Remove)).collect();
	// Creations waiting for an anchor; slot `old.len()` is the tail.
	let mut creates_before: Vec<Vec<Option<Patch>>> = (0..=old.len()).map(|_| Vec::new()).collect();
	let mut pending = Vec::new();
	for child in new {
		let matched = match child.key() {
			Some(key) => old_index.get(key).copied(),
			None => {
				debug_assert!(false, "unkeyed child among keyed siblings");
				error!("Unkeyed child in a keyed list; treating it as freshly created.");
				None
			}
		};
		match matched {
			Some((index, old_child)) => {
				slots[index] = diff(Some(old_child), Some(child));
				creates_before[index].append(&mut pending);
			}
			None => pending.push(diff(None, Some(child))),
		}
	}
	creates_before[old.len()].append(&mut pending);

	let mut patches = Vec::with_capacity(new.len().max(old.len()));
	for (slot, creates) in slots.into_iter().zip(&mut creates_before) {
		patches.append(creates);
		patches.push(slot);
	}
	patches.append(creates_before.last_mut().expect("tail slot exists"));
	patches
}
