//! Ordered fact mutations for a single element.

use crate::{
	dom::Dom,
	events::{apply_events, EventRoot, Listeners},
	facts::Facts,
	redact,
};
use hashbrown::HashMap;
use serde_json::Value;
use tracing::{instrument, level_filters::STATIC_MAX_LEVEL, trace, Level};

/// Brings `element` from `old` to `new` facts.
///
/// Properties are applied last and compared against the live element rather than `old`,
/// so they win over attributes of the same name and undo user edits of e.g. `value`.
#[instrument(skip(dom, old, new, root, listeners))]
pub(crate) fn apply_facts<D: Dom, M: 'static>(dom: &D, element: &D::Node, old: &Facts<D, M>, new: &Facts<D, M>, root: &EventRoot<M>, listeners: &mut Listeners<D, M>) {
	remove_styles(dom, element, &old.styles, &new.styles);
	remove_properties(dom, element, &old.properties, &new.properties);
	remove_attributes(dom, element, old, new);

	apply_styles(dom, element, &old.styles, &new.styles);
	apply_attributes(dom, element, old, new);
	apply_properties(dom, element, &new.properties);

	if !old.events.is_empty() || !new.events.is_empty() {
		apply_events(dom, element, root, &new.events, listeners);
	}
}

/// Standard style names never start with a dash, custom properties always do.
fn is_custom_property(name: &str) -> bool {
	name.starts_with('-')
}

fn remove_styles<D: Dom>(dom: &D, element: &D::Node, old: &HashMap<String, String>, new: &HashMap<String, String>) {
	for name in old.keys().filter(|name| !new.contains_key(*name)) {
		if is_custom_property(name) {
			dom.remove_style_property(element, name);
		} else {
			dom.set_style(element, name, "");
		}
	}
}

fn apply_styles<D: Dom>(dom: &D, element: &D::Node, old: &HashMap<String, String>, new: &HashMap<String, String>) {
	for (name, value) in new {
		if old.get(name) == Some(value) {
			continue;
		}
		if is_custom_property(name) {
			dom.set_style_property(element, name, value);
		} else {
			dom.set_style(element, name, value);
		}
	}
}

fn remove_properties<D: Dom>(dom: &D, element: &D::Node, old: &HashMap<String, Value>, new: &HashMap<String, Value>) {
	for (name, value) in old.iter().filter(|(name, _)| !new.contains_key(*name)) {
		// Most string properties default to the empty string, most boolean ones to `false`.
		match value {
			Value::String(_) => dom.set_property(element, name, &Value::String(String::new())),
			Value::Bool(_) => dom.set_property(element, name, &Value::Bool(false)),
			_ => (),
		}
		dom.delete_property(element, name);
	}
}

/// Re-applies properties that differ from the live element's.
///
/// Properties can be changed by user interaction (`value`, `checked`, …) and are normalized by the host,
/// so this deliberately doesn't look at the previous facts.
pub(crate) fn apply_properties<D: Dom>(dom: &D, element: &D::Node, properties: &HashMap<String, Value>) {
	for (name, value) in properties {
		if dom.property(element, name).as_ref() == Some(value) {
			continue;
		}
		if STATIC_MAX_LEVEL >= Level::TRACE {
			trace!(name = %name, value = %redact(&value.to_string()), "Setting property.");
		}
		dom.set_property(element, name, value);
	}
}

fn remove_attributes<D: Dom, M>(dom: &D, element: &D::Node, old: &Facts<D, M>, new: &Facts<D, M>) {
	for name in old.attributes.keys().filter(|name| !new.attributes.contains_key(*name)) {
		dom.remove_attribute(element, name);
	}
	for (name, attribute) in old.attributes_ns.iter().filter(|(name, _)| !new.attributes_ns.contains_key(*name)) {
		dom.remove_attribute_ns(element, &attribute.namespace, name);
	}
}

fn apply_attributes<D: Dom, M>(dom: &D, element: &D::Node, old: &Facts<D, M>, new: &Facts<D, M>) {
	for (name, value) in &new.attributes {
		if old.attributes.get(name) != Some(value) {
			dom.set_attribute(element, name, value);
		}
	}
	for (name, attribute) in &new.attributes_ns {
		match old.attributes_ns.get(name) {
			Some(previous) if previous == attribute => (),
			Some(previous) if previous.namespace != attribute.namespace => {
				dom.remove_attribute_ns(element, &previous.namespace, name);
				dom.set_attribute_ns(element, &attribute.namespace, name, &attribute.value);
			}
			_ => dom.set_attribute_ns(element, &attribute.namespace, name, &attribute.value),
		}
	}
}
