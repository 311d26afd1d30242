//! Static rendering, to markup or into a [`Dom`], for later [hydration](`Engine::hydrate`).
//!
//! Every element gets the [`MARKER_ATTRIBUTE`]. Facts are flattened into attributes:
//! styles into one `style` attribute, string and number properties as attributes of the same name
//! (`className` and `htmlFor` become `class` and `for`), `true` booleans as empty attributes under their lower-cased name.
//! Event handlers don't survive static rendering.
//!
//! [`Engine::hydrate`]: `crate::Engine::hydrate`

use crate::{
	dom::Dom,
	facts::Facts,
	hydrate::MARKER_ATTRIBUTE,
	node::{Node, VNode},
};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::{instrument, trace, warn};

/// Elements that can't have children and are written without closing tag.
const VOID_ELEMENTS: &[&str] = &["area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track", "wbr"];

struct StaticAttribute {
	namespace: Option<String>,
	value: String,
}

/// Flattens `facts` into attributes, sorted by name. Properties win over attributes of the same name.
fn static_attributes<D: Dom, M>(tag: &str, facts: &Facts<D, M>) -> BTreeMap<String, StaticAttribute> {
	let mut attributes = BTreeMap::new();

	for (name, value) in &facts.attributes {
		attributes.insert(name.clone(), StaticAttribute { namespace: None, value: value.clone() });
	}
	for (name, attribute) in &facts.attributes_ns {
		attributes.insert(
			name.clone(),
			StaticAttribute {
				namespace: Some(attribute.namespace.clone()),
				value: attribute.value.clone(),
			},
		);
	}

	if !facts.styles.is_empty() {
		let mut styles = facts.styles.iter().collect::<Vec<_>>();
		styles.sort();
		let style = styles.into_iter().map(|(name, value)| format!("{}: {}", name, value)).collect::<Vec<_>>().join("; ");
		attributes.insert("style".to_owned(), StaticAttribute { namespace: None, value: style });
	}

	for (name, value) in &facts.properties {
		if tag == "textarea" && name == "value" {
			// Written as content instead.
			continue;
		}
		let (name, value) = match (name.as_str(), value) {
			("className", Value::String(value)) => ("class".to_owned(), value.clone()),
			("htmlFor", Value::String(value)) => ("for".to_owned(), value.clone()),
			(name, Value::String(value)) => (name.to_owned(), value.clone()),
			(name, Value::Number(value)) => (name.to_owned(), value.to_string()),
			(name, Value::Bool(true)) => (name.to_ascii_lowercase(), String::new()),
			(name, value) => {
				trace!("Property {:?} = {} has no static representation.", name, value);
				continue;
			}
		};
		attributes.insert(name, StaticAttribute { namespace: None, value });
	}

	if !facts.events.is_empty() {
		trace!("Leaving out {} event handler(s).", facts.events.len());
	}

	attributes.insert(MARKER_ATTRIBUTE.to_owned(), StaticAttribute { namespace: None, value: String::new() });
	attributes
}

fn textarea_value<D: Dom, M>(tag: &str, facts: &Facts<D, M>) -> Option<String> {
	match facts.properties.get("value") {
		Some(Value::String(value)) if tag == "textarea" => Some(value.clone()),
		_ => None,
	}
}

/// Whether `vnode` renders as a text node.
fn is_text<D: Dom, M>(vnode: &VNode<D, M>) -> bool {
	match &**vnode {
		Node::Text(_) => true,
		Node::Tagger { inner, .. } => is_text(inner),
		Node::Thunk(memo) => is_text(&memo.force()),
		Node::Element(_) | Node::Keyed(_) | Node::Custom(_) => false,
	}
}

/// Renders `vnode` into a detached live tree.
///
/// Unlike [`to_html`], this can render [`Node::Custom`] nodes, through their own render function.
#[instrument(skip(dom, vnode))]
pub fn build<D: Dom, M>(dom: &D, vnode: &VNode<D, M>) -> D::Node {
	match &**vnode {
		Node::Text(text) => dom.create_text_node(text),
		Node::Element(element) => {
			let live = build_element(dom, &element.tag, element.namespace.as_deref(), &element.facts);
			for child in &element.children {
				dom.append_child(&live, &build(dom, child));
			}
			live
		}
		Node::Keyed(element) => {
			let live = build_element(dom, &element.tag, element.namespace.as_deref(), &element.facts);
			for (_, child) in element.children.iter() {
				dom.append_child(&live, &build(dom, child));
			}
			live
		}
		Node::Custom(custom) => {
			let live = custom.render(dom);
			set_static_attributes(dom, &live, &static_attributes("", &custom.facts));
			live
		}
		Node::Tagger { inner, .. } => build(dom, inner),
		Node::Thunk(memo) => build(dom, &memo.force()),
	}
}

fn build_element<D: Dom, M>(dom: &D, tag: &str, namespace: Option<&str>, facts: &Facts<D, M>) -> D::Node {
	let live = match namespace {
		Some(namespace) => dom.create_element_ns(namespace, tag),
		None => dom.create_element(tag),
	};
	set_static_attributes(dom, &live, &static_attributes(tag, facts));
	if let Some(value) = textarea_value(tag, facts) {
		dom.append_child(&live, &dom.create_text_node(&value));
	}
	live
}

fn set_static_attributes<D: Dom>(dom: &D, element: &D::Node, attributes: &BTreeMap<String, StaticAttribute>) {
	for (name, attribute) in attributes {
		match &attribute.namespace {
			Some(namespace) => dom.set_attribute_ns(element, namespace, name, &attribute.value),
			None => dom.set_attribute(element, name, &attribute.value),
		}
	}
}

/// Serializes `vnode` as HTML.
///
/// [`Node::Custom`] nodes are left out, since they can only be rendered into a live DOM.
#[must_use]
pub fn to_html<D: Dom, M>(vnode: &VNode<D, M>) -> String {
	let mut html = String::new();
	write_node(&mut html, vnode);
	html
}

fn write_node<D: Dom, M>(html: &mut String, vnode: &VNode<D, M>) {
	match &**vnode {
		Node::Text(text) => escape_into(html, text, false),
		Node::Element(element) => {
			write_open(html, &element.tag, &element.facts);
			write_children(html, element.children.iter());
			write_close(html, &element.tag, element.namespace.is_some(), &element.facts);
		}
		Node::Keyed(element) => {
			write_open(html, &element.tag, &element.facts);
			write_children(html, element.children.iter().map(|(_, child)| child));
			write_close(html, &element.tag, element.namespace.is_some(), &element.facts);
		}
		Node::Custom(_) => warn!("Custom nodes can't be serialized. Leaving it out."),
		Node::Tagger { inner, .. } => write_node(html, inner),
		Node::Thunk(memo) => write_node(html, &memo.force()),
	}
}

fn write_open<D: Dom, M>(html: &mut String, tag: &str, facts: &Facts<D, M>) {
	html.push('<');
	html.push_str(tag);
	for (name, attribute) in static_attributes(tag, facts) {
		html.push(' ');
		html.push_str(&name);
		html.push_str("=\"");
		escape_into(html, &attribute.value, true);
		html.push('"');
	}
	html.push('>');
}

fn write_children<'a, D: Dom + 'a, M: 'a>(html: &mut String, children: impl Iterator<Item = &'a VNode<D, M>>) {
	let mut after_text = false;
	for child in children {
		let text = is_text(child);
		if text && after_text {
			// Otherwise the parser would merge the two.
			html.push_str("<!---->");
		}
		after_text = text;
		write_node(html, child);
	}
}

fn write_close<D: Dom, M>(html: &mut String, tag: &str, namespaced: bool, facts: &Facts<D, M>) {
	if let Some(value) = textarea_value(tag, facts) {
		escape_into(html, &value, false);
	}
	if !namespaced && VOID_ELEMENTS.contains(&tag) {
		return;
	}
	html.push_str("</");
	html.push_str(tag);
	html.push('>');
}

fn escape_into(html: &mut String, text: &str, attribute: bool) {
	for c in text.chars() {
		match c {
			'&' => html.push_str("&amp;"),
			'<' => html.push_str("&lt;"),
			'>' => html.push_str("&gt;"),
			'"' if attribute => html.push_str("&quot;"),
			c => html.push(c),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::{facts::Fact, memory::MemoryDom};

	type VNode = super::VNode<MemoryDom, ()>;

	#[test]
	fn markup() {
		let vnode = VNode::element(
			"div",
			vec![
				Fact::attribute("id", "root"),
				Fact::style("color", "red"),
				Fact::style("margin", "0"),
				Fact::property("className", "a"),
				Fact::property("readOnly", true),
				Fact::property("hidden", false),
				Fact::on("click", crate::Handler::normal(|_| Some(()))),
			],
			vec![
				VNode::text("a < b"),
				VNode::text("c"),
				VNode::element("br", vec![], vec![]),
				VNode::element("textarea", vec![Fact::property("value", "\"quoted\"")], vec![]),
			],
		);
		assert_eq!(
			to_html(&vnode),
			"<div class=\"a\" data-arbor=\"\" id=\"root\" readonly=\"\" style=\"color: red; margin: 0\">\
			a &lt; b<!---->c<br data-arbor=\"\"><textarea data-arbor=\"\">\"quoted\"</textarea></div>"
		);
	}

	#[test]
	fn unsafe_names_stay_inert() {
		let vnode = VNode::element("script", vec![Fact::attribute("onclick", "alert(1)"), Fact::attribute("href", "javascript:alert(1)")], vec![]);
		assert_eq!(to_html(&vnode), "<p data-arbor=\"\" data-onclick=\"alert(1)\" href=\"\"></p>");
	}
}
