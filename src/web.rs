//! The browser host, through [`web_sys`].
//!
//! Failing DOM calls are logged at error level and otherwise ignored,
//! except for element creation, which rethrows into JavaScript since there's no sensible fallback.

use crate::dom::{Attribute, Dom, DomEvent, NodeKind};
use core::cell::RefCell;
use js_sys::{Function, Object, Reflect, JSON};
use serde_json::{Number, Value};
use std::rc::Rc;
use tracing::{error, instrument, trace};
use wasm_bindgen::{closure::Closure, throw_val, JsCast, JsValue};
use web_sys::{AddEventListenerOptions, CharacterData, CssStyleDeclaration, Document, Element};

/// A [`Dom`] backed by a browser [***Document***](https://developer.mozilla.org/en-US/docs/Web/API/Document).
#[derive(Debug)]
pub struct WebDom {
	document: Document,
	move_before: bool,
	/// Indexed by `passive`.
	event_listener_options_cache: RefCell<[Option<AddEventListenerOptions>; 2]>,
}

impl WebDom {
	#[must_use]
	#[instrument]
	pub fn new(document: Document) -> Self {
		let move_before = Reflect::has(document.as_ref(), &JsValue::from_str("moveBefore")).unwrap_or(false);
		trace!(move_before);
		Self {
			document,
			move_before,
			event_listener_options_cache: RefCell::new([None, None]),
		}
	}

	#[must_use]
	pub fn document(&self) -> &Document {
		&self.document
	}

	fn style(element: &web_sys::Node) -> Option<CssStyleDeclaration> {
		match Reflect::get(element.as_ref(), &JsValue::from_str("style")) {
			Ok(style) if style.is_object() => Some(style.unchecked_into()),
			Ok(_) => {
				error!("{:?} has no style object.", element);
				None
			}
			Err(error) => {
				error!("Failed to get style object: {:?}", error);
				None
			}
		}
	}

	fn element(node: &web_sys::Node) -> Option<&Element> {
		let element = node.dyn_ref::<Element>();
		if element.is_none() {
			error!("Expected an element but found {:?}.", node);
		}
		element
	}
}

fn to_js(value: &Value) -> JsValue {
	match value {
		Value::Null => JsValue::NULL,
		Value::Bool(flag) => JsValue::from_bool(*flag),
		Value::Number(number) => number.as_f64().map_or(JsValue::NULL, JsValue::from_f64),
		Value::String(string) => JsValue::from_str(string),
		Value::Array(_) | Value::Object(_) => JSON::parse(&value.to_string()).unwrap_or_else(|error| {
			error!("Failed to convert {} to JavaScript: {:?}", value, error);
			JsValue::UNDEFINED
		}),
	}
}

/// Objects and functions aren't representable.
fn from_js(value: &JsValue) -> Option<Value> {
	if value.is_null() {
		Some(Value::Null)
	} else if let Some(flag) = value.as_bool() {
		Some(Value::Bool(flag))
	} else if let Some(number) = value.as_f64() {
		Number::from_f64(number).map(Value::Number)
	} else {
		value.as_string().map(Value::String)
	}
}

impl DomEvent for web_sys::Event {
	fn stop_propagation(&self) {
		web_sys::Event::stop_propagation(self);
	}

	fn prevent_default(&self) {
		web_sys::Event::prevent_default(self);
	}
}

impl Dom for WebDom {
	type Node = web_sys::Node;
	type Event = web_sys::Event;
	type Listener = Closure<dyn Fn(web_sys::Event)>;

	fn create_text_node(&self, data: &str) -> web_sys::Node {
		self.document.create_text_node(data).into()
	}

	fn create_element(&self, tag: &str) -> web_sys::Node {
		match self.document.create_element(tag) {
			Ok(element) => element.into(),
			Err(error) => throw_val(error),
		}
	}

	fn create_element_ns(&self, namespace: &str, tag: &str) -> web_sys::Node {
		match self.document.create_element_ns(Some(namespace), tag) {
			Ok(element) => element.into(),
			Err(error) => throw_val(error),
		}
	}

	fn kind(&self, node: &web_sys::Node) -> NodeKind {
		match node.node_type() {
			web_sys::Node::TEXT_NODE => NodeKind::Text,
			web_sys::Node::ELEMENT_NODE => NodeKind::Element,
			_ => NodeKind::Other,
		}
	}

	fn parent_node(&self, node: &web_sys::Node) -> Option<web_sys::Node> {
		node.parent_node()
	}

	fn first_child(&self, node: &web_sys::Node) -> Option<web_sys::Node> {
		node.first_child()
	}

	fn next_sibling(&self, node: &web_sys::Node) -> Option<web_sys::Node> {
		node.next_sibling()
	}

	fn previous_sibling(&self, node: &web_sys::Node) -> Option<web_sys::Node> {
		node.previous_sibling()
	}

	fn child_nodes(&self, node: &web_sys::Node) -> Vec<web_sys::Node> {
		let child_nodes = node.child_nodes();
		(0..child_nodes.length()).filter_map(|i| child_nodes.get(i)).collect()
	}

	fn append_child(&self, parent: &web_sys::Node, child: &web_sys::Node) {
		if let Err(error) = parent.append_child(child) {
			error!("Failed to append child: {:?}", error);
		}
	}

	fn insert_before(&self, parent: &web_sys::Node, child: &web_sys::Node, reference: Option<&web_sys::Node>) {
		if let Err(error) = parent.insert_before(child, reference) {
			error!("Failed to insert node: {:?}", error);
		}
	}

	fn remove_child(&self, parent: &web_sys::Node, child: &web_sys::Node) {
		if let Err(error) = parent.remove_child(child) {
			error!("Failed to remove the node: {:?}", error);
		}
	}

	fn replace_child(&self, parent: &web_sys::Node, new_child: &web_sys::Node, old_child: &web_sys::Node) {
		if let Err(error) = parent.replace_child(new_child, old_child) {
			error!("Failed to replace the node: {:?}", error);
		}
	}

	fn supports_move_before(&self) -> bool {
		self.move_before
	}

	fn move_before(&self, parent: &web_sys::Node, child: &web_sys::Node, reference: Option<&web_sys::Node>) {
		let move_before = match Reflect::get(parent.as_ref(), &JsValue::from_str("moveBefore")).map(<JsValue as JsCast>::dyn_into::<Function>) {
			Ok(Ok(move_before)) => move_before,
			_ => return self.insert_before(parent, child, reference),
		};
		let null = JsValue::NULL;
		if let Err(error) = move_before.call2(parent.as_ref(), child.as_ref(), reference.map_or(&null, AsRef::as_ref)) {
			error!("Failed to move node: {:?}", error);
		}
	}

	fn text_data(&self, node: &web_sys::Node) -> String {
		match node.dyn_ref::<CharacterData>() {
			Some(character_data) => character_data.data(),
			None => node.text_content().unwrap_or_default(),
		}
	}

	fn set_text_data(&self, node: &web_sys::Node, data: &str) {
		match node.dyn_ref::<CharacterData>() {
			Some(character_data) => character_data.set_data(data),
			None => error!("Expected character data but found {:?}.", node),
		}
	}

	fn local_name(&self, element: &web_sys::Node) -> String {
		element.dyn_ref::<Element>().map(Element::local_name).unwrap_or_default()
	}

	fn namespace_uri(&self, element: &web_sys::Node) -> Option<String> {
		element.dyn_ref::<Element>().and_then(Element::namespace_uri)
	}

	fn attributes(&self, element: &web_sys::Node) -> Vec<Attribute> {
		let attributes = match element.dyn_ref::<Element>() {
			Some(element) => element.attributes(),
			None => return Vec::new(),
		};
		(0..attributes.length())
			.filter_map(|i| attributes.item(i))
			.map(|attribute| Attribute {
				name: attribute.name(),
				namespace: attribute.namespace_uri(),
				value: attribute.value(),
			})
			.collect()
	}

	fn has_attribute(&self, element: &web_sys::Node, name: &str) -> bool {
		element.dyn_ref::<Element>().map_or(false, |element| element.has_attribute(name))
	}

	fn set_attribute(&self, element: &web_sys::Node, name: &str, value: &str) {
		if let Some(element) = Self::element(element) {
			if let Err(error) = element.set_attribute(name, value) {
				error!("Failed to set attribute {:?}: {:?}", name, error);
			}
		}
	}

	fn remove_attribute(&self, element: &web_sys::Node, name: &str) {
		if let Some(element) = Self::element(element) {
			if let Err(error) = element.remove_attribute(name) {
				error!("Failed to remove attribute {:?}: {:?}", name, error);
			}
		}
	}

	fn set_attribute_ns(&self, element: &web_sys::Node, namespace: &str, name: &str, value: &str) {
		if let Some(element) = Self::element(element) {
			if let Err(error) = element.set_attribute_ns(Some(namespace), name, value) {
				error!("Failed to set attribute {:?} in {:?}: {:?}", name, namespace, error);
			}
		}
	}

	fn remove_attribute_ns(&self, element: &web_sys::Node, namespace: &str, name: &str) {
		// `removeAttributeNS` expects the local name.
		let local_name = name.rsplit(':').next().unwrap_or(name);
		if let Some(element) = Self::element(element) {
			if let Err(error) = element.remove_attribute_ns(Some(namespace), local_name) {
				error!("Failed to remove attribute {:?} in {:?}: {:?}", name, namespace, error);
			}
		}
	}

	fn set_style(&self, element: &web_sys::Node, name: &str, value: &str) {
		if let Some(style) = Self::style(element) {
			if let Err(error) = Reflect::set(style.as_ref(), &JsValue::from_str(name), &JsValue::from_str(value)) {
				error!("Failed to set style {:?}: {:?}", name, error);
			}
		}
	}

	fn set_style_property(&self, element: &web_sys::Node, name: &str, value: &str) {
		if let Some(style) = Self::style(element) {
			if let Err(error) = style.set_property(name, value) {
				error!("Failed to set style property {:?}: {:?}", name, error);
			}
		}
	}

	fn remove_style_property(&self, element: &web_sys::Node, name: &str) {
		if let Some(style) = Self::style(element) {
			if let Err(error) = style.remove_property(name) {
				error!("Failed to remove style property {:?}: {:?}", name, error);
			}
		}
	}

	fn property(&self, element: &web_sys::Node, name: &str) -> Option<Value> {
		match Reflect::get(element.as_ref(), &JsValue::from_str(name)) {
			Ok(value) if value.is_undefined() => None,
			Ok(value) => from_js(&value),
			Err(error) => {
				error!("Failed to read property {:?}: {:?}", name, error);
				None
			}
		}
	}

	fn set_property(&self, element: &web_sys::Node, name: &str, value: &Value) {
		match Reflect::set(element.as_ref(), &JsValue::from_str(name), &to_js(value)) {
			Ok(true) => (),
			Ok(false) => error!("Property {:?} is read-only.", name),
			Err(error) => error!("Failed to set property {:?}: {:?}", name, error),
		}
	}

	fn delete_property(&self, element: &web_sys::Node, name: &str) {
		match Reflect::delete_property(element.unchecked_ref::<Object>(), &JsValue::from_str(name)) {
			Ok(true) => (),
			Ok(false) => trace!("Property {:?} can't be deleted.", name),
			Err(error) => error!("Failed to delete property {:?}: {:?}", name, error),
		}
	}

	fn create_listener(&self, callback: Rc<dyn Fn(&web_sys::Event)>) -> Self::Listener {
		Closure::wrap(Box::new(move |event: web_sys::Event| callback(&event)) as Box<dyn Fn(web_sys::Event)>)
	}

	fn add_event_listener(&self, element: &web_sys::Node, name: &str, listener: &Self::Listener, passive: Option<bool>) {
		let function = listener.as_ref().unchecked_ref::<Function>();
		let result = match passive {
			Some(passive) => {
				let mut cache = self.event_listener_options_cache.borrow_mut();
				let options = cache[usize::from(passive)].get_or_insert_with(|| {
					let mut options = AddEventListenerOptions::new();
					options.passive(passive);
					options
				});
				element.add_event_listener_with_callback_and_add_event_listener_options(name, function, options)
			}
			None => element.add_event_listener_with_callback(name, function),
		};
		if let Err(error) = result {
			error!("Failed to add event listener {:?}: {:?}", name, error);
		}
	}

	fn remove_event_listener(&self, element: &web_sys::Node, name: &str, listener: &Self::Listener) {
		if let Err(error) = element.remove_event_listener_with_callback(name, listener.as_ref().unchecked_ref()) {
			error!("Failed to remove event listener {:?}: {:?}", name, error);
		}
	}
}
