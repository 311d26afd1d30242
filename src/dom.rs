//! The host seam: everything the engine needs to know about a live DOM.
//!
//! The engine never assumes that the host's tree still looks the way it was left.
//! Implementations should therefore answer navigation queries ([`Dom::parent_node`], [`Dom::next_sibling`], …)
//! from the *current* live state, and should absorb (and log) failing mutations instead of panicking.

use core::fmt::Debug;
use serde_json::Value;
use std::rc::Rc;

/// What kind of live node a handle refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
	Text,
	Element,
	/// Comments, processing instructions, documents and so on.
	Other,
}

/// An attribute as currently present on a live element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
	pub name: String,
	pub namespace: Option<String>,
	pub value: String,
}

/// Propagation control for host events.
pub trait DomEvent {
	fn stop_propagation(&self);
	fn prevent_default(&self);
}

/// A live DOM, as seen by the engine.
///
/// Handles are cheap clones that compare by node identity.
pub trait Dom: 'static {
	type Node: Clone + PartialEq + Debug;
	type Event: DomEvent;
	/// An owned native listener. Dropping it may invalidate it on the host side,
	/// so the engine keeps it alive for as long as it is attached.
	type Listener;

	fn create_text_node(&self, data: &str) -> Self::Node;
	fn create_element(&self, tag: &str) -> Self::Node;
	fn create_element_ns(&self, namespace: &str, tag: &str) -> Self::Node;

	fn kind(&self, node: &Self::Node) -> NodeKind;
	fn parent_node(&self, node: &Self::Node) -> Option<Self::Node>;
	fn first_child(&self, node: &Self::Node) -> Option<Self::Node>;
	fn next_sibling(&self, node: &Self::Node) -> Option<Self::Node>;
	fn previous_sibling(&self, node: &Self::Node) -> Option<Self::Node>;
	/// A snapshot of `node`'s current children.
	fn child_nodes(&self, node: &Self::Node) -> Vec<Self::Node>;

	fn append_child(&self, parent: &Self::Node, child: &Self::Node);
	/// Inserts `child` before `reference`, or at the end if `reference` is [`None`].
	fn insert_before(&self, parent: &Self::Node, child: &Self::Node, reference: Option<&Self::Node>);
	fn remove_child(&self, parent: &Self::Node, child: &Self::Node);
	fn replace_child(&self, parent: &Self::Node, new_child: &Self::Node, old_child: &Self::Node);

	/// Whether [`Dom::move_before`] preserves node state (focus, animations, iframes) while moving.
	fn supports_move_before(&self) -> bool {
		false
	}

	/// Atomically moves an already attached `child`. Falls back to [`Dom::insert_before`].
	fn move_before(&self, parent: &Self::Node, child: &Self::Node, reference: Option<&Self::Node>) {
		self.insert_before(parent, child, reference)
	}

	/// [***data***](https://developer.mozilla.org/en-US/docs/Web/API/CharacterData/data) for text nodes,
	/// otherwise the node's text content.
	fn text_data(&self, node: &Self::Node) -> String;
	fn set_text_data(&self, node: &Self::Node, data: &str);

	fn local_name(&self, element: &Self::Node) -> String;
	fn namespace_uri(&self, element: &Self::Node) -> Option<String>;
	fn attributes(&self, element: &Self::Node) -> Vec<Attribute>;
	fn has_attribute(&self, element: &Self::Node, name: &str) -> bool;
	fn set_attribute(&self, element: &Self::Node, name: &str, value: &str);
	fn remove_attribute(&self, element: &Self::Node, name: &str);
	fn set_attribute_ns(&self, element: &Self::Node, namespace: &str, name: &str, value: &str);
	fn remove_attribute_ns(&self, element: &Self::Node, namespace: &str, name: &str);

	/// Assigns through the style object, i.e. `element.style[name] = value`.
	fn set_style(&self, element: &Self::Node, name: &str, value: &str);
	/// `element.style.setProperty(name, value)`, required for `--custom-properties`.
	fn set_style_property(&self, element: &Self::Node, name: &str, value: &str);
	fn remove_style_property(&self, element: &Self::Node, name: &str);

	/// Reads a field of the live node. [`None`] means the field is missing or not representable.
	fn property(&self, element: &Self::Node, name: &str) -> Option<Value>;
	fn set_property(&self, element: &Self::Node, name: &str, value: &Value);
	/// Standard properties can't be deleted, but trying must not fail.
	fn delete_property(&self, element: &Self::Node, name: &str);

	fn create_listener(&self, callback: Rc<dyn Fn(&Self::Event)>) -> Self::Listener;
	/// `passive` is [`None`] if the host doesn't support passive listeners.
	fn add_event_listener(&self, element: &Self::Node, name: &str, listener: &Self::Listener, passive: Option<bool>);
	fn remove_event_listener(&self, element: &Self::Node, name: &str, listener: &Self::Listener);

	fn supports_passive(&self) -> bool {
		true
	}
}
