//! An in-process [`Dom`] that records every mutation it receives.
//!
//! [`MemoryDom`] stands in for a browser in native tests and for server-side rendering into a DOM.
//! Invalid operations (the ones a browser would throw on) are logged, counted in [`MemoryDom::errors`] and otherwise ignored.
//!
//! A handful of standard properties are reflected onto attributes the way browsers do it,
//! which is enough to exercise property/attribute precedence and hydration:
//!
//! - boolean: `disabled`, `hidden`, `readOnly`, `required`, `multiple`, `autofocus`, `noValidate`, `isMap`, `open`,
//!   and (read from the attribute, but never written back) `checked`, `selected`, `muted`,
//! - string: `id`, `className` (`class`), `title`, `name`, `lang`, `dir`,
//! - `value`, which defaults to the `value` attribute or, for `<textarea>`, to the text content.
//!
//! Standard properties can't be deleted. Any other property is a plain expando.

use crate::dom::{Attribute, Dom, DomEvent, NodeKind};
use core::{
	cell::{Cell, RefCell},
	fmt,
};
use hashbrown::HashMap;
use serde_json::Value;
use std::rc::Rc;
use tracing::{error, trace};

const XHTML_NAMESPACE: &str = "http://www.w3.org/1999/xhtml";

/// (property, attribute, whether assigning the property writes the attribute)
const BOOLEAN_PROPERTIES: &[(&str, &str, bool)] = &[
	("disabled", "disabled", true),
	("hidden", "hidden", true),
	("readOnly", "readonly", true),
	("required", "required", true),
	("multiple", "multiple", true),
	("autofocus", "autofocus", true),
	("noValidate", "novalidate", true),
	("isMap", "ismap", true),
	("open", "open", true),
	("checked", "checked", false),
	("selected", "selected", false),
	("muted", "muted", false),
];

const STRING_PROPERTIES: &[(&str, &str)] = &[("id", "id"), ("className", "class"), ("title", "title"), ("name", "name"), ("lang", "lang"), ("dir", "dir")];

/// A node handle. Only meaningful for the [`MemoryDom`] that created it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

/// One recorded mutation.
#[derive(Debug, Clone, PartialEq)]
pub enum Mutation {
	/// Also used for appends, with `before: None`.
	Insert {
		parent: NodeId,
		node: NodeId,
		before: Option<NodeId>,
	},
	Move {
		parent: NodeId,
		node: NodeId,
		before: Option<NodeId>,
	},
	Remove {
		parent: NodeId,
		node: NodeId,
	},
	Replace {
		parent: NodeId,
		new: NodeId,
		old: NodeId,
	},
	Text {
		node: NodeId,
		data: String,
	},
	SetAttribute {
		node: NodeId,
		namespace: Option<String>,
		name: String,
		value: String,
	},
	RemoveAttribute {
		node: NodeId,
		namespace: Option<String>,
		name: String,
	},
	/// `value: None` means the style was removed.
	Style {
		node: NodeId,
		name: String,
		value: Option<String>,
	},
	Property {
		node: NodeId,
		name: String,
		value: Value,
	},
	DeleteProperty {
		node: NodeId,
		name: String,
	},
	AddListener {
		node: NodeId,
		name: String,
		passive: Option<bool>,
	},
	RemoveListener {
		node: NodeId,
		name: String,
	},
}

impl Mutation {
	/// Whether this changes the tree structure rather than a single node.
	#[must_use]
	pub fn is_structural(&self) -> bool {
		matches!(self, Mutation::Insert { .. } | Mutation::Move { .. } | Mutation::Remove { .. } | Mutation::Replace { .. })
	}
}

/// A native listener of [`MemoryDom`]. Identity is [`Rc`] pointer identity.
#[derive(Clone)]
pub struct MemoryListener(Rc<dyn Fn(&MemoryEvent)>);

impl MemoryListener {
	fn same(&self, other: &Self) -> bool {
		Rc::ptr_eq(&self.0, &other.0)
	}
}

impl fmt::Debug for MemoryListener {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "MemoryListener({:p})", Rc::as_ptr(&self.0).cast::<()>())
	}
}

/// A dispatched event. Bubbles from the target towards the root.
#[derive(Debug)]
pub struct MemoryEvent {
	name: String,
	target: NodeId,
	detail: Value,
	propagation_stopped: Cell<bool>,
	default_prevented: Cell<bool>,
}

impl MemoryEvent {
	#[must_use]
	pub fn name(&self) -> &str {
		&self.name
	}

	#[must_use]
	pub fn target(&self) -> NodeId {
		self.target
	}

	/// Arbitrary payload, standing in for the fields of a browser event.
	#[must_use]
	pub fn detail(&self) -> &Value {
		&self.detail
	}

	#[must_use]
	pub fn propagation_stopped(&self) -> bool {
		self.propagation_stopped.get()
	}

	#[must_use]
	pub fn default_prevented(&self) -> bool {
		self.default_prevented.get()
	}
}

impl DomEvent for MemoryEvent {
	fn stop_propagation(&self) {
		self.propagation_stopped.set(true);
	}

	fn prevent_default(&self) {
		self.default_prevented.set(true);
	}
}

#[derive(Debug)]
struct ElementData {
	tag: String,
	namespace: Option<String>,
	attributes: Vec<Attribute>,
	styles: Vec<(String, String)>,
	properties: HashMap<String, Value>,
	listeners: Vec<(String, MemoryListener, Option<bool>)>,
}

#[derive(Debug)]
enum Payload {
	Text(String),
	Comment(String),
	Element(ElementData),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Insertion {
	Done,
	/// A node inserted before itself stays where it is.
	Unchanged,
	Refused,
}

#[derive(Debug)]
struct NodeData {
	parent: Option<NodeId>,
	children: Vec<NodeId>,
	payload: Payload,
}

/// See the [module documentation](`self`).
#[derive(Debug, Default)]
pub struct MemoryDom {
	nodes: RefCell<Vec<NodeData>>,
	mutations: RefCell<Vec<Mutation>>,
	errors: Cell<usize>,
	move_before: bool,
}

fn local_part(name: &str) -> &str {
	name.rsplit(':').next().unwrap_or(name)
}

fn parse_styles(style: &str) -> Vec<(String, String)> {
	style
		.split(';')
		.filter_map(|declaration| declaration.split_once(':'))
		.map(|(name, value)| (name.trim().to_owned(), value.trim().to_owned()))
		.filter(|(name, value)| !name.is_empty() && !value.is_empty())
		.collect()
}

fn format_styles(styles: &[(String, String)]) -> String {
	styles.iter().map(|(name, value)| format!("{}: {}", name, value)).collect::<Vec<_>>().join("; ")
}

/// Converts like a JavaScript string assignment would.
fn stringify(value: &Value) -> String {
	match value {
		Value::String(string) => string.clone(),
		other => other.to_string(),
	}
}

/// JavaScript truthiness.
fn truthy(value: &Value) -> bool {
	match value {
		Value::Null => false,
		Value::Bool(flag) => *flag,
		Value::Number(number) => number.as_f64().map_or(false, |number| number != 0.0 && !number.is_nan()),
		Value::String(string) => !string.is_empty(),
		Value::Array(_) | Value::Object(_) => true,
	}
}

impl MemoryDom {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	/// A host that supports state-preserving moves, so that reorders are recorded as [`Mutation::Move`].
	#[must_use]
	pub fn with_move_before() -> Self {
		Self {
			move_before: true,
			..Self::default()
		}
	}

	/// All mutations recorded so far.
	#[must_use]
	pub fn mutations(&self) -> Vec<Mutation> {
		self.mutations.borrow().clone()
	}

	pub fn take_mutations(&self) -> Vec<Mutation> {
		self.mutations.take()
	}

	pub fn clear_mutations(&self) {
		self.mutations.borrow_mut().clear();
	}

	/// How many invalid operations were attempted.
	#[must_use]
	pub fn errors(&self) -> usize {
		self.errors.get()
	}

	pub fn create_comment(&self, data: &str) -> NodeId {
		self.push(Payload::Comment(data.to_owned()))
	}

	#[must_use]
	pub fn attribute(&self, element: NodeId, name: &str) -> Option<String> {
		let nodes = self.nodes.borrow();
		match &nodes[element.0].payload {
			Payload::Element(data) if name == "style" => Some(format_styles(&data.styles)).filter(|_| !data.styles.is_empty()),
			Payload::Element(data) => data.attributes.iter().find(|attribute| attribute.name == name).map(|attribute| attribute.value.clone()),
			Payload::Text(_) | Payload::Comment(_) => None,
		}
	}

	#[must_use]
	pub fn style(&self, element: NodeId, name: &str) -> Option<String> {
		let nodes = self.nodes.borrow();
		match &nodes[element.0].payload {
			Payload::Element(data) => data.styles.iter().find(|(style, _)| style == name).map(|(_, value)| value.clone()),
			Payload::Text(_) | Payload::Comment(_) => None,
		}
	}

	/// How many listeners for `name` are attached to `element`.
	#[must_use]
	pub fn listener_count(&self, element: NodeId, name: &str) -> usize {
		let nodes = self.nodes.borrow();
		match &nodes[element.0].payload {
			Payload::Element(data) => data.listeners.iter().filter(|(event, _, _)| event == name).count(),
			Payload::Text(_) | Payload::Comment(_) => 0,
		}
	}

	/// The `passive` flags the listeners for `name` were registered with.
	#[must_use]
	pub fn listener_passive(&self, element: NodeId, name: &str) -> Vec<Option<bool>> {
		let nodes = self.nodes.borrow();
		match &nodes[element.0].payload {
			Payload::Element(data) => data.listeners.iter().filter(|(event, _, _)| event == name).map(|(_, _, passive)| *passive).collect(),
			Payload::Text(_) | Payload::Comment(_) => Vec::new(),
		}
	}

	/// Dispatches a bubbling event at `target` and returns it once it's done.
	pub fn dispatch(&self, target: NodeId, name: &str, detail: Value) -> MemoryEvent {
		let event = MemoryEvent {
			name: name.to_owned(),
			target,
			detail,
			propagation_stopped: Cell::new(false),
			default_prevented: Cell::new(false),
		};

		let mut current = Some(target);
		while let Some(node) = current {
			// Cloned out, since listeners may well mutate the DOM.
			let listeners = {
				let nodes = self.nodes.borrow();
				match &nodes[node.0].payload {
					Payload::Element(data) => data.listeners.iter().filter(|(event, _, _)| event == name).map(|(_, listener, _)| listener.clone()).collect(),
					Payload::Text(_) | Payload::Comment(_) => Vec::new(),
				}
			};
			for listener in listeners {
				(listener.0)(&event);
			}
			if event.propagation_stopped() {
				break;
			}
			current = self.nodes.borrow()[node.0].parent;
		}
		event
	}

	/// Serializes `node` and its descendants.
	#[must_use]
	pub fn outer_html(&self, node: NodeId) -> String {
		let mut html = String::new();
		self.write_html(&mut html, node);
		html
	}

	fn write_html(&self, html: &mut String, node: NodeId) {
		let nodes = self.nodes.borrow();
		let data = &nodes[node.0];
		match &data.payload {
			Payload::Text(text) => html.push_str(text),
			Payload::Comment(comment) => {
				html.push_str("<!--");
				html.push_str(comment);
				html.push_str("-->");
			}
			Payload::Element(element) => {
				html.push('<');
				html.push_str(&element.tag);
				for attribute in &element.attributes {
					html.push(' ');
					html.push_str(&attribute.name);
					html.push_str("=\"");
					html.push_str(&attribute.value);
					html.push('"');
				}
				if !element.styles.is_empty() {
					html.push_str(" style=\"");
					html.push_str(&format_styles(&element.styles));
					html.push('"');
				}
				html.push('>');
				let children = data.children.clone();
				let tag = element.tag.clone();
				drop(nodes);
				for child in children {
					self.write_html(html, child);
				}
				html.push_str("</");
				html.push_str(&tag);
				html.push('>');
			}
		}
	}

	fn push(&self, payload: Payload) -> NodeId {
		let mut nodes = self.nodes.borrow_mut();
		nodes.push(NodeData {
			parent: None,
			children: Vec::new(),
			payload,
		});
		NodeId(nodes.len() - 1)
	}

	fn log(&self, mutation: Mutation) {
		trace!(?mutation);
		self.mutations.borrow_mut().push(mutation);
	}

	fn fail(&self, message: &str) {
		error!("{}", message);
		self.errors.set(self.errors.get() + 1);
	}

	fn is_element(&self, node: NodeId) -> bool {
		matches!(self.nodes.borrow()[node.0].payload, Payload::Element(_))
	}

	/// Whether `ancestor` is `node` or one of its ancestors.
	fn is_inclusive_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
		let nodes = self.nodes.borrow();
		let mut current = Some(node);
		while let Some(id) = current {
			if id == ancestor {
				return true;
			}
			current = nodes[id.0].parent;
		}
		false
	}

	/// Validates an insertion of `child` into `parent`, as browsers do.
	fn can_insert(&self, parent: NodeId, child: NodeId) -> bool {
		if !self.is_element(parent) {
			self.fail("Only elements can have children.");
			return false;
		}
		if self.is_inclusive_ancestor(child, parent) {
			self.fail("A node can't be inserted into itself or its descendants.");
			return false;
		}
		true
	}

	fn detach(&self, node: NodeId) {
		let mut nodes = self.nodes.borrow_mut();
		if let Some(parent) = nodes[node.0].parent.take() {
			nodes[parent.0].children.retain(|child| *child != node);
		}
	}

	/// Shared by `insertBefore` and `moveBefore`.
	fn insert(&self, parent: NodeId, child: NodeId, reference: Option<NodeId>) -> Insertion {
		if !self.can_insert(parent, child) {
			return Insertion::Refused;
		}
		if let Some(reference) = reference {
			if self.nodes.borrow()[reference.0].parent != Some(parent) {
				self.fail("The reference node is not a child of the parent.");
				return Insertion::Refused;
			}
			if reference == child {
				return Insertion::Unchanged;
			}
		}

		self.detach(child);
		let mut nodes = self.nodes.borrow_mut();
		let index = match reference {
			Some(reference) => nodes[parent.0].children.iter().position(|sibling| *sibling == reference).unwrap_or(nodes[parent.0].children.len()),
			None => nodes[parent.0].children.len(),
		};
		nodes[parent.0].children.insert(index, child);
		nodes[child.0].parent = Some(parent);
		Insertion::Done
	}

	fn with_element<T>(&self, element: NodeId, operation: &str, f: impl FnOnce(&mut ElementData) -> T) -> Option<T> {
		let mut nodes = self.nodes.borrow_mut();
		match &mut nodes[element.0].payload {
			Payload::Element(data) => Some(f(data)),
			Payload::Text(_) | Payload::Comment(_) => {
				drop(nodes);
				self.fail(&format!("{} requires an element.", operation));
				None
			}
		}
	}

	fn text_content(&self, node: NodeId) -> String {
		let nodes = self.nodes.borrow();
		match &nodes[node.0].payload {
			Payload::Text(text) | Payload::Comment(text) => text.clone(),
			Payload::Element(_) => {
				let children = nodes[node.0].children.clone();
				drop(nodes);
				children.into_iter().filter(|child| !matches!(self.nodes.borrow()[child.0].payload, Payload::Comment(_))).map(|child| self.text_content(child)).collect()
			}
		}
	}

	fn write_attribute(data: &mut ElementData, namespace: Option<&str>, name: &str, value: &str) {
		if namespace.is_none() && name == "style" {
			data.styles = parse_styles(value);
			return;
		}
		let existing = data.attributes.iter_mut().find(|attribute| match namespace {
			Some(namespace) => attribute.namespace.as_deref() == Some(namespace) && local_part(&attribute.name) == local_part(name),
			None => attribute.namespace.is_none() && attribute.name == name,
		});
		match existing {
			Some(attribute) => attribute.value = value.to_owned(),
			None => data.attributes.push(Attribute {
				name: name.to_owned(),
				namespace: namespace.map(ToOwned::to_owned),
				value: value.to_owned(),
			}),
		}
	}

	/// Returns whether there was anything to remove.
	fn erase_attribute(data: &mut ElementData, namespace: Option<&str>, name: &str) -> bool {
		if namespace.is_none() && name == "style" {
			let had_styles = !data.styles.is_empty();
			data.styles.clear();
			return had_styles;
		}
		let before = data.attributes.len();
		data.attributes.retain(|attribute| match namespace {
			Some(namespace) => !(attribute.namespace.as_deref() == Some(namespace) && local_part(&attribute.name) == local_part(name)),
			None => !(attribute.namespace.is_none() && attribute.name == name),
		});
		data.attributes.len() != before
	}

	fn plain_attribute(data: &ElementData, name: &str) -> Option<String> {
		data.attributes.iter().find(|attribute| attribute.namespace.is_none() && attribute.name == name).map(|attribute| attribute.value.clone())
	}

	fn write_style(&self, element: NodeId, name: &str, value: &str) {
		let written = self.with_element(element, "Setting a style", |data| {
			data.styles.retain(|(style, _)| style != name);
			if !value.is_empty() {
				data.styles.push((name.to_owned(), value.to_owned()));
			}
		});
		if written.is_some() {
			self.log(Mutation::Style {
				node: element,
				name: name.to_owned(),
				value: Some(value.to_owned()).filter(|value| !value.is_empty()),
			});
		}
	}
}

impl Dom for MemoryDom {
	type Node = NodeId;
	type Event = MemoryEvent;
	type Listener = MemoryListener;

	fn create_text_node(&self, data: &str) -> NodeId {
		self.push(Payload::Text(data.to_owned()))
	}

	fn create_element(&self, tag: &str) -> NodeId {
		self.create_element_ns(XHTML_NAMESPACE, tag)
	}

	fn create_element_ns(&self, namespace: &str, tag: &str) -> NodeId {
		self.push(Payload::Element(ElementData {
			tag: tag.to_owned(),
			namespace: Some(namespace.to_owned()),
			attributes: Vec::new(),
			styles: Vec::new(),
			properties: HashMap::new(),
			listeners: Vec::new(),
		}))
	}

	fn kind(&self, node: &NodeId) -> NodeKind {
		match self.nodes.borrow()[node.0].payload {
			Payload::Text(_) => NodeKind::Text,
			Payload::Element(_) => NodeKind::Element,
			Payload::Comment(_) => NodeKind::Other,
		}
	}

	fn parent_node(&self, node: &NodeId) -> Option<NodeId> {
		self.nodes.borrow()[node.0].parent
	}

	fn first_child(&self, node: &NodeId) -> Option<NodeId> {
		self.nodes.borrow()[node.0].children.first().copied()
	}

	fn next_sibling(&self, node: &NodeId) -> Option<NodeId> {
		let nodes = self.nodes.borrow();
		let siblings = &nodes[nodes[node.0].parent?.0].children;
		let index = siblings.iter().position(|sibling| sibling == node)?;
		siblings.get(index + 1).copied()
	}

	fn previous_sibling(&self, node: &NodeId) -> Option<NodeId> {
		let nodes = self.nodes.borrow();
		let siblings = &nodes[nodes[node.0].parent?.0].children;
		let index = siblings.iter().position(|sibling| sibling == node)?;
		index.checked_sub(1).map(|index| siblings[index])
	}

	fn child_nodes(&self, node: &NodeId) -> Vec<NodeId> {
		self.nodes.borrow()[node.0].children.clone()
	}

	fn append_child(&self, parent: &NodeId, child: &NodeId) {
		self.insert_before(parent, child, None);
	}

	fn insert_before(&self, parent: &NodeId, child: &NodeId, reference: Option<&NodeId>) {
		if self.insert(*parent, *child, reference.copied()) == Insertion::Done {
			self.log(Mutation::Insert {
				parent: *parent,
				node: *child,
				before: reference.copied(),
			});
		}
	}

	fn remove_child(&self, parent: &NodeId, child: &NodeId) {
		if self.nodes.borrow()[child.0].parent != Some(*parent) {
			return self.fail("The node to be removed is not a child of this node.");
		}
		self.detach(*child);
		self.log(Mutation::Remove { parent: *parent, node: *child });
	}

	fn replace_child(&self, parent: &NodeId, new_child: &NodeId, old_child: &NodeId) {
		if self.nodes.borrow()[old_child.0].parent != Some(*parent) {
			return self.fail("The node to be replaced is not a child of this node.");
		}
		if !self.can_insert(*parent, *new_child) {
			return;
		}
		if new_child == old_child {
			return;
		}

		self.detach(*new_child);
		let mut nodes = self.nodes.borrow_mut();
		if let Some(index) = nodes[parent.0].children.iter().position(|child| child == old_child) {
			nodes[parent.0].children[index] = *new_child;
		}
		nodes[old_child.0].parent = None;
		nodes[new_child.0].parent = Some(*parent);
		drop(nodes);
		self.log(Mutation::Replace {
			parent: *parent,
			new: *new_child,
			old: *old_child,
		});
	}

	fn supports_move_before(&self) -> bool {
		self.move_before
	}

	fn move_before(&self, parent: &NodeId, child: &NodeId, reference: Option<&NodeId>) {
		if !self.move_before {
			return self.insert_before(parent, child, reference);
		}
		if self.nodes.borrow()[child.0].parent != Some(*parent) {
			return self.fail("Only attached children can be moved within their parent.");
		}
		if self.insert(*parent, *child, reference.copied()) == Insertion::Done {
			self.log(Mutation::Move {
				parent: *parent,
				node: *child,
				before: reference.copied(),
			});
		}
	}

	fn text_data(&self, node: &NodeId) -> String {
		self.text_content(*node)
	}

	fn set_text_data(&self, node: &NodeId, data: &str) {
		let mut nodes = self.nodes.borrow_mut();
		match &mut nodes[node.0].payload {
			Payload::Text(text) | Payload::Comment(text) => *text = data.to_owned(),
			Payload::Element(_) => {
				drop(nodes);
				return self.fail("Only character data has data.");
			}
		}
		drop(nodes);
		self.log(Mutation::Text { node: *node, data: data.to_owned() });
	}

	fn local_name(&self, element: &NodeId) -> String {
		match &self.nodes.borrow()[element.0].payload {
			Payload::Element(data) => data.tag.clone(),
			Payload::Text(_) | Payload::Comment(_) => String::new(),
		}
	}

	fn namespace_uri(&self, element: &NodeId) -> Option<String> {
		match &self.nodes.borrow()[element.0].payload {
			Payload::Element(data) => data.namespace.clone(),
			Payload::Text(_) | Payload::Comment(_) => None,
		}
	}

	fn attributes(&self, element: &NodeId) -> Vec<Attribute> {
		match &self.nodes.borrow()[element.0].payload {
			Payload::Element(data) => {
				let mut attributes = data.attributes.clone();
				if !data.styles.is_empty() {
					attributes.push(Attribute {
						name: "style".to_owned(),
						namespace: None,
						value: format_styles(&data.styles),
					});
				}
				attributes
			}
			Payload::Text(_) | Payload::Comment(_) => Vec::new(),
		}
	}

	fn has_attribute(&self, element: &NodeId, name: &str) -> bool {
		self.attribute(*element, name).is_some()
	}

	fn set_attribute(&self, element: &NodeId, name: &str, value: &str) {
		if self.with_element(*element, "setAttribute", |data| Self::write_attribute(data, None, name, value)).is_some() {
			self.log(Mutation::SetAttribute {
				node: *element,
				namespace: None,
				name: name.to_owned(),
				value: value.to_owned(),
			});
		}
	}

	fn remove_attribute(&self, element: &NodeId, name: &str) {
		if self.with_element(*element, "removeAttribute", |data| Self::erase_attribute(data, None, name)) == Some(true) {
			self.log(Mutation::RemoveAttribute {
				node: *element,
				namespace: None,
				name: name.to_owned(),
			});
		}
	}

	fn set_attribute_ns(&self, element: &NodeId, namespace: &str, name: &str, value: &str) {
		if self.with_element(*element, "setAttributeNS", |data| Self::write_attribute(data, Some(namespace), name, value)).is_some() {
			self.log(Mutation::SetAttribute {
				node: *element,
				namespace: Some(namespace.to_owned()),
				name: name.to_owned(),
				value: value.to_owned(),
			});
		}
	}

	fn remove_attribute_ns(&self, element: &NodeId, namespace: &str, name: &str) {
		if self.with_element(*element, "removeAttributeNS", |data| Self::erase_attribute(data, Some(namespace), name)) == Some(true) {
			self.log(Mutation::RemoveAttribute {
				node: *element,
				namespace: Some(namespace.to_owned()),
				name: name.to_owned(),
			});
		}
	}

	fn set_style(&self, element: &NodeId, name: &str, value: &str) {
		self.write_style(*element, name, value);
	}

	fn set_style_property(&self, element: &NodeId, name: &str, value: &str) {
		self.write_style(*element, name, value);
	}

	fn remove_style_property(&self, element: &NodeId, name: &str) {
		self.write_style(*element, name, "");
	}

	fn property(&self, element: &NodeId, name: &str) -> Option<Value> {
		let nodes = self.nodes.borrow();
		let data = match &nodes[element.0].payload {
			Payload::Element(data) => data,
			Payload::Text(_) | Payload::Comment(_) => return None,
		};
		if let Some(value) = data.properties.get(name) {
			return Some(value.clone());
		}
		if let Some((_, attribute, _)) = BOOLEAN_PROPERTIES.iter().find(|(property, _, _)| *property == name) {
			return Some(Value::Bool(Self::plain_attribute(data, attribute).is_some()));
		}
		if let Some((_, attribute)) = STRING_PROPERTIES.iter().find(|(property, _)| *property == name) {
			return Some(Value::String(Self::plain_attribute(data, attribute).unwrap_or_default()));
		}
		match name {
			"value" if data.tag == "textarea" => {
				drop(nodes);
				Some(Value::String(self.text_content(*element)))
			}
			"value" => Some(Value::String(Self::plain_attribute(data, "value").unwrap_or_default())),
			_ => None,
		}
	}

	fn set_property(&self, element: &NodeId, name: &str, value: &Value) {
		let written = self.with_element(*element, "Setting a property", |data| {
			if let Some((_, attribute, writes_attribute)) = BOOLEAN_PROPERTIES.iter().find(|(property, _, _)| *property == name) {
				if *writes_attribute {
					if truthy(value) {
						Self::write_attribute(data, None, attribute, "");
					} else {
						Self::erase_attribute(data, None, attribute);
					}
				} else {
					data.properties.insert(name.to_owned(), Value::Bool(truthy(value)));
				}
			} else if let Some((_, attribute)) = STRING_PROPERTIES.iter().find(|(property, _)| *property == name) {
				Self::write_attribute(data, None, attribute, &stringify(value));
			} else if name == "value" {
				let value = if value.is_null() { String::new() } else { stringify(value) };
				data.properties.insert(name.to_owned(), Value::String(value));
			} else {
				data.properties.insert(name.to_owned(), value.clone());
			}
		});
		if written.is_some() {
			self.log(Mutation::Property {
				node: *element,
				name: name.to_owned(),
				value: value.clone(),
			});
		}
	}

	fn delete_property(&self, element: &NodeId, name: &str) {
		let standard = name == "value" || BOOLEAN_PROPERTIES.iter().any(|(property, _, _)| *property == name) || STRING_PROPERTIES.iter().any(|(property, _)| *property == name);
		if standard {
			return trace!("{:?} is a standard property and can't be deleted.", name);
		}
		if self.with_element(*element, "Deleting a property", |data| data.properties.remove(name).is_some()) == Some(true) {
			self.log(Mutation::DeleteProperty { node: *element, name: name.to_owned() });
		}
	}

	fn create_listener(&self, callback: Rc<dyn Fn(&MemoryEvent)>) -> MemoryListener {
		MemoryListener(callback)
	}

	fn add_event_listener(&self, element: &NodeId, name: &str, listener: &MemoryListener, passive: Option<bool>) {
		let added = self.with_element(*element, "addEventListener", |data| {
			if data.listeners.iter().any(|(event, existing, _)| event == name && existing.same(listener)) {
				false
			} else {
				data.listeners.push((name.to_owned(), listener.clone(), passive));
				true
			}
		});
		if added == Some(true) {
			self.log(Mutation::AddListener {
				node: *element,
				name: name.to_owned(),
				passive,
			});
		}
	}

	fn remove_event_listener(&self, element: &NodeId, name: &str, listener: &MemoryListener) {
		let removed = self.with_element(*element, "removeEventListener", |data| {
			let before = data.listeners.len();
			data.listeners.retain(|(event, existing, _)| !(event == name && existing.same(listener)));
			data.listeners.len() != before
		});
		if removed == Some(true) {
			self.log(Mutation::RemoveListener { node: *element, name: name.to_owned() });
		}
	}
}
