//! Guarded positional operations.
//!
//! Every operation first checks where the node (and its reference) currently is,
//! skips work that is already done and works around nodes that were moved by someone else.

use crate::dom::Dom;
use tracing::{trace, warn};

pub(crate) fn is_child<D: Dom>(dom: &D, parent: &D::Node, node: &D::Node) -> bool {
	dom.parent_node(node).as_ref() == Some(parent)
}

/// Where a node should go to end up right after `anchor`, or first if there is none.
///
/// [`None`] means "at the end". An `anchor` that isn't a child of `parent` anymore is treated like a missing one.
fn reference_after<D: Dom>(dom: &D, parent: &D::Node, anchor: Option<&D::Node>) -> Option<D::Node> {
	match anchor {
		Some(anchor) if is_child(dom, parent, anchor) => dom.next_sibling(anchor),
		Some(anchor) => {
			warn!("Anchor {:?} was moved out of {:?}. Placing at the start instead.", anchor, parent);
			dom.first_child(parent)
		}
		None => dom.first_child(parent),
	}
}

fn in_place<D: Dom>(dom: &D, parent: &D::Node, node: &D::Node, reference: Option<&D::Node>) -> bool {
	reference == Some(node) || (is_child(dom, parent, node) && dom.next_sibling(node).as_ref() == reference)
}

/// Inserts a new or detached `node` before `reference`.
///
/// If `reference` isn't a child of `parent` anymore, `node` is appended instead.
pub(crate) fn insert_before<D: Dom>(dom: &D, parent: &D::Node, node: &D::Node, reference: Option<&D::Node>) {
	if in_place(dom, parent, node, reference) {
		return trace!("Already in place.");
	}
	match reference {
		Some(reference) if !is_child(dom, parent, reference) => {
			warn!("Reference node {:?} was moved out of {:?}. Appending instead.", reference, parent);
			dom.append_child(parent, node);
		}
		reference => dom.insert_before(parent, node, reference),
	}
}

pub(crate) fn insert_after<D: Dom>(dom: &D, parent: &D::Node, node: &D::Node, anchor: Option<&D::Node>) {
	let reference = reference_after(dom, parent, anchor);
	insert_before(dom, parent, node, reference.as_ref());
}

/// Moves an attached `node` before `reference`, preserving its state where the host allows it.
///
/// Nodes that a third party moved to another parent are left where they are.
pub(crate) fn move_before<D: Dom>(dom: &D, parent: &D::Node, node: &D::Node, reference: Option<&D::Node>) {
	if !is_child(dom, parent, node) {
		return warn!("{:?} was moved out of {:?}. Leaving it there.", node, parent);
	}
	if in_place(dom, parent, node, reference) {
		return trace!("Already in place.");
	}
	let reference = match reference {
		Some(reference) if !is_child(dom, parent, reference) => {
			warn!("Reference node {:?} was moved out of {:?}. Moving to the end instead.", reference, parent);
			None
		}
		reference => reference,
	};
	if dom.supports_move_before() {
		dom.move_before(parent, node, reference);
	} else {
		dom.insert_before(parent, node, reference);
	}
}

pub(crate) fn move_after<D: Dom>(dom: &D, parent: &D::Node, node: &D::Node, anchor: Option<&D::Node>) {
	let reference = reference_after(dom, parent, anchor);
	move_before(dom, parent, node, reference.as_ref());
}

/// Detaches `node` from wherever it currently is.
pub(crate) fn remove<D: Dom>(dom: &D, node: &D::Node) {
	match dom.parent_node(node) {
		Some(parent) => dom.remove_child(&parent, node),
		None => trace!("{:?} is already detached.", node),
	}
}

/// Reinserts a node that was just diffed after `anchor` if it went missing, then returns the next anchor.
///
/// Nodes that are still attached somewhere aren't moved.
/// The anchor only advances to nodes that are actually children of `parent`.
pub(crate) fn settle_after<D: Dom>(dom: &D, parent: &D::Node, node: &D::Node, anchor: Option<D::Node>, needs_reinsertion: bool) -> Option<D::Node> {
	if needs_reinsertion || dom.parent_node(node).is_none() {
		insert_after(dom, parent, node, anchor.as_ref());
	}
	if is_child(dom, parent, node) {
		Some(node.clone())
	} else {
		anchor
	}
}

/// Mirror image of [`settle_after`] for the high end of a keyed list.
pub(crate) fn settle_before<D: Dom>(dom: &D, parent: &D::Node, node: &D::Node, anchor: Option<D::Node>, needs_reinsertion: bool) -> Option<D::Node> {
	if needs_reinsertion || dom.parent_node(node).is_none() {
		insert_before(dom, parent, node, anchor.as_ref());
	}
	if is_child(dom, parent, node) {
		Some(node.clone())
	} else {
		anchor
	}
}

/// Like [`settle_after`], but also moves attached nodes into place.
pub(crate) fn place_after<D: Dom>(dom: &D, parent: &D::Node, node: &D::Node, anchor: Option<D::Node>, needs_reinsertion: bool) -> Option<D::Node> {
	if needs_reinsertion || dom.parent_node(node).is_none() {
		insert_after(dom, parent, node, anchor.as_ref());
	} else {
		move_after(dom, parent, node, anchor.as_ref());
	}
	if is_child(dom, parent, node) {
		Some(node.clone())
	} else {
		anchor
	}
}

/// Like [`settle_before`], but also moves attached nodes into place.
pub(crate) fn place_before<D: Dom>(dom: &D, parent: &D::Node, node: &D::Node, anchor: Option<D::Node>, needs_reinsertion: bool) -> Option<D::Node> {
	if needs_reinsertion || dom.parent_node(node).is_none() {
		insert_before(dom, parent, node, anchor.as_ref());
	} else {
		move_before(dom, parent, node, anchor.as_ref());
	}
	if is_child(dom, parent, node) {
		Some(node.clone())
	} else {
		anchor
	}
}
