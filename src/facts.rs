//! Declared element facts: styles, properties, attributes, namespaced attributes and event handlers.

use crate::{
	dom::Dom,
	events::Handler,
	sanitize::{no_inner_html_or_form_action, no_javascript_or_html_uri, no_javascript_or_html_value, no_on_or_form_action},
};
use core::fmt;
use hashbrown::HashMap;
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NsAttribute {
	pub namespace: String,
	pub value: String,
}

/// A single declared fact, before organization.
///
/// The variants are taken verbatim.
/// The lower-case constructors apply the XSS checks from [`crate::sanitize`] and should be preferred for anything built from untrusted input.
pub enum Fact<D: Dom, M> {
	Style(String, String),
	Property(String, Value),
	Attribute(String, String),
	/// namespace, name, value
	AttributeNs(String, String, String),
	Event(String, Handler<D, M>),
}

impl<D: Dom, M> Fact<D, M> {
	pub fn style(name: impl Into<String>, value: impl Into<String>) -> Self {
		Fact::Style(name.into(), value.into())
	}

	pub fn property(name: &str, value: impl Into<Value>) -> Self {
		Fact::Property(no_inner_html_or_form_action(name).into_owned(), no_javascript_or_html_value(value.into()))
	}

	pub fn attribute(name: &str, value: &str) -> Self {
		Fact::Attribute(no_on_or_form_action(name).into_owned(), no_javascript_or_html_uri(value).to_owned())
	}

	pub fn attribute_ns(namespace: impl Into<String>, name: &str, value: &str) -> Self {
		Fact::AttributeNs(namespace.into(), no_on_or_form_action(name).into_owned(), no_javascript_or_html_uri(value).to_owned())
	}

	pub fn on(name: impl Into<String>, handler: Handler<D, M>) -> Self {
		Fact::Event(name.into(), handler)
	}
}

impl<D: Dom, M> Clone for Fact<D, M> {
	fn clone(&self) -> Self {
		match self {
			Fact::Style(name, value) => Fact::Style(name.clone(), value.clone()),
			Fact::Property(name, value) => Fact::Property(name.clone(), value.clone()),
			Fact::Attribute(name, value) => Fact::Attribute(name.clone(), value.clone()),
			Fact::AttributeNs(namespace, name, value) => Fact::AttributeNs(namespace.clone(), name.clone(), value.clone()),
			Fact::Event(name, handler) => Fact::Event(name.clone(), handler.clone()),
		}
	}
}

impl<D: Dom, M> fmt::Debug for Fact<D, M> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Fact::Style(name, value) => f.debug_tuple("Style").field(name).field(value).finish(),
			Fact::Property(name, value) => f.debug_tuple("Property").field(name).field(value).finish(),
			Fact::Attribute(name, value) => f.debug_tuple("Attribute").field(name).field(value).finish(),
			Fact::AttributeNs(namespace, name, value) => f.debug_tuple("AttributeNs").field(namespace).field(name).field(value).finish(),
			Fact::Event(name, handler) => f.debug_tuple("Event").field(name).field(handler).finish(),
		}
	}
}

/// Organized facts of one element. Later declarations of the same name win,
/// except for `class` attributes and `className` properties, which accumulate.
pub struct Facts<D: Dom, M> {
	pub styles: HashMap<String, String>,
	pub properties: HashMap<String, Value>,
	pub attributes: HashMap<String, String>,
	pub attributes_ns: HashMap<String, NsAttribute>,
	pub events: HashMap<String, Handler<D, M>>,
}

impl<D: Dom, M> Facts<D, M> {
	#[must_use]
	pub fn organize(facts: impl IntoIterator<Item = Fact<D, M>>) -> Self {
		let mut organized = Self::default();
		for fact in facts {
			match fact {
				Fact::Style(name, value) => {
					organized.styles.insert(name, value);
				}
				Fact::Property(name, value) => {
					let value = match (name.as_str(), organized.properties.get(&name), value) {
						("className", Some(Value::String(existing)), Value::String(class)) => Value::String(format!("{} {}", existing, class)),
						(_, _, value) => value,
					};
					organized.properties.insert(name, value);
				}
				Fact::Attribute(name, value) => {
					let value = match (name.as_str(), organized.attributes.get(&name)) {
						("class", Some(existing)) => format!("{} {}", existing, value),
						_ => value,
					};
					organized.attributes.insert(name, value);
				}
				Fact::AttributeNs(namespace, name, value) => {
					organized.attributes_ns.insert(name, NsAttribute { namespace, value });
				}
				Fact::Event(name, handler) => {
					organized.events.insert(name, handler);
				}
			}
		}
		organized
	}

	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.styles.is_empty() && self.properties.is_empty() && self.attributes.is_empty() && self.attributes_ns.is_empty() && self.events.is_empty()
	}
}

impl<D: Dom, M> Default for Facts<D, M> {
	fn default() -> Self {
		Self {
			styles: HashMap::new(),
			properties: HashMap::new(),
			attributes: HashMap::new(),
			attributes_ns: HashMap::new(),
			events: HashMap::new(),
		}
	}
}

impl<D: Dom, M> Clone for Facts<D, M> {
	fn clone(&self) -> Self {
		Self {
			styles: self.styles.clone(),
			properties: self.properties.clone(),
			attributes: self.attributes.clone(),
			attributes_ns: self.attributes_ns.clone(),
			events: self.events.clone(),
		}
	}
}

impl<D: Dom, M> fmt::Debug for Facts<D, M> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Facts")
			.field("styles", &self.styles)
			.field("properties", &self.properties)
			.field("attributes", &self.attributes)
			.field("attributes_ns", &self.attributes_ns)
			.field("events", &self.events.keys().collect::<Vec<_>>())
			.finish()
	}
}

impl<D: Dom, M> FromIterator<Fact<D, M>> for Facts<D, M> {
	fn from_iter<T: IntoIterator<Item = Fact<D, M>>>(iter: T) -> Self {
		Self::organize(iter)
	}
}
