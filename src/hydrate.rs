//! Adoption of existing (usually server-rendered) DOM.
//!
//! Attributes can't always be mapped back to the facts that produced them, so the result is a guess.
//! Wrong guesses are harmless and only cost a few extra mutations during the first update.

use crate::{
	dom::{Dom, NodeKind},
	engine::{Engine, Mounted},
	events::EventRoot,
	facts::{Fact, Facts},
	node::{Element, Node, VNode},
	shadow::TNode,
};
use serde_json::Value;
use thiserror::Error;
use tracing::{error, instrument, trace, warn};

/// Present on every element rendered by [`crate::ssr`]. Only child elements carrying it are adopted,
/// since anything else was most likely inserted by third-party scripts before hydration.
///
/// The marker is hydrated as a plain attribute, so the first update removes it again.
pub const MARKER_ATTRIBUTE: &str = "data-arbor";

const XHTML_NAMESPACE: &str = "http://www.w3.org/1999/xhtml";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HydrateError {
	#[error("the node is already the root of a mounted or hydrated tree")]
	AlreadyManaged,
}

/// Boolean properties whose attribute name isn't simply their lower-cased name.
fn camel_case_bool_property(attribute: &str) -> &str {
	match attribute {
		"novalidate" => "noValidate",
		"readonly" => "readOnly",
		"ismap" => "isMap",
		other => other,
	}
}

impl<D: Dom> Engine<D> {
	/// Reconstructs the virtual tree for `node` and takes it over.
	///
	/// `node` itself doesn't need to carry [`MARKER_ATTRIBUTE`]. Nodes that are neither elements nor text hydrate as empty text.
	///
	/// # Errors
	///
	/// Iff `node` is already the root of a tree managed by this engine.
	#[instrument(skip(self, event_root))]
	pub fn hydrate<M: 'static>(&mut self, node: &D::Node, event_root: EventRoot<M>) -> Result<(VNode<D, M>, Mounted<D, M>), HydrateError> {
		if self.is_managed(node) {
			error!("{:?} is already managed.", node);
			return Err(HydrateError::AlreadyManaged);
		}

		let (vnode, tnode) = match self.virtualize(node) {
			Some(virtualized) => virtualized,
			None => {
				warn!("Hydrating a node that is neither element nor text. Treating it as empty text.");
				(VNode::text(""), TNode::new(node.clone()))
			}
		};

		self.manage(node.clone());
		Ok((vnode, Mounted { tnode, event_root }))
	}

	fn virtualize<M>(&self, node: &D::Node) -> Option<(VNode<D, M>, TNode<D, M>)> {
		match self.dom.kind(node) {
			NodeKind::Text => Some((VNode::text(self.dom.text_data(node)), TNode::new(node.clone()))),
			NodeKind::Other => {
				trace!("Skipping {:?}.", node);
				None
			}
			NodeKind::Element => Some(self.virtualize_element(node)),
		}
	}

	fn virtualize_element<M>(&self, node: &D::Node) -> (VNode<D, M>, TNode<D, M>) {
		let tag = self.dom.local_name(node);
		let namespace = self.dom.namespace_uri(node).filter(|namespace| namespace != XHTML_NAMESPACE);

		let mut facts = Vec::new();
		for attribute in self.dom.attributes(node) {
			if attribute.name == "style" {
				// Naive, but only wrong for values containing `;`. Those are then just reapplied once.
				for declaration in attribute.value.split(';') {
					if let Some((name, value)) = declaration.split_once(':') {
						facts.push(Fact::Style(name.trim().to_owned(), value.trim().to_owned()));
					}
				}
				continue;
			}

			let property_name = camel_case_bool_property(&attribute.name).to_owned();
			facts.push(if attribute.name == "value" {
				// The `value` attribute is really the default value, but serializers most likely wrote the property there.
				Fact::Property(attribute.name, Value::String(attribute.value))
			} else if let Some(value) = self.dom.property(node, &property_name).filter(|value| value.is_number() || (value.is_boolean() && attribute.name != "spellcheck")) {
				// `spellcheck` is enumerated, so its attribute value matters beyond presence.
				Fact::Property(property_name, value)
			} else if let Some(namespace) = attribute.namespace {
				Fact::AttributeNs(namespace, attribute.name, attribute.value)
			} else {
				Fact::Attribute(attribute.name, attribute.value)
			});
		}

		let mut tnode = TNode::new(node.clone());
		let mut children = Vec::new();
		if tag == "textarea" {
			// The text content is only the initial value. Views set `value` instead.
			let value = self.dom.property(node, "value").unwrap_or_else(|| Value::String(String::new()));
			facts.push(Fact::Property("value".to_owned(), value));
		} else {
			for child in self.dom.child_nodes(node) {
				if self.dom.kind(&child) == NodeKind::Element && !self.dom.has_attribute(&child, MARKER_ATTRIBUTE) {
					trace!("Skipping foreign element {:?}.", child);
					continue;
				}
				// Comments are skipped too. Servers put them between adjacent text nodes.
				if let Some((vchild, kid)) = self.virtualize(&child) {
					children.push(vchild);
					tnode.indexed.push(kid);
				}
			}
		}

		let vnode = VNode::new(Node::Element(Element {
			tag,
			namespace,
			facts: Facts::organize(facts),
			children,
		}));
		(vnode, tnode)
	}
}
