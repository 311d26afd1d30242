//! XSS vector checks.
//!
//! Browsers accept tabs and other whitespace inside URI schemes, so `"\tjava\tSCRIPT:alert(1)"` behaves
//! exactly like `"javascript:alert(1)"`. The patterns below tolerate that as well as any casing.

use regex::Regex;
use serde_json::Value;
use std::{borrow::Cow, sync::OnceLock};

fn script_tag() -> &'static Regex {
	static RE: OnceLock<Regex> = OnceLock::new();
	RE.get_or_init(|| Regex::new(r"(?i)^script$").unwrap())
}

fn on_or_form_action() -> &'static Regex {
	static RE: OnceLock<Regex> = OnceLock::new();
	RE.get_or_init(|| Regex::new(r"(?i)^(on|formAction$)").unwrap())
}

fn javascript_uri() -> &'static Regex {
	static RE: OnceLock<Regex> = OnceLock::new();
	RE.get_or_init(|| Regex::new(r"(?i)^\s*j\s*a\s*v\s*a\s*s\s*c\s*r\s*i\s*p\s*t\s*:").unwrap())
}

fn javascript_or_html_uri() -> &'static Regex {
	static RE: OnceLock<Regex> = OnceLock::new();
	RE.get_or_init(|| {
		Regex::new(r"(?i)^\s*(j\s*a\s*v\s*a\s*s\s*c\s*r\s*i\s*p\s*t\s*:|d\s*a\s*t\s*a\s*:\s*t\s*e\s*x\s*t\s*/\s*h\s*t\s*m\s*l\s*(,|;))").unwrap()
	})
}

/// `<script>` becomes an inert `<p>`.
#[must_use]
pub fn no_script(tag: &str) -> &str {
	if script_tag().is_match(tag) {
		"p"
	} else {
		tag
	}
}

/// Event handler attributes and `formAction` are redirected to inert `data-*` attributes.
#[must_use]
pub fn no_on_or_form_action(name: &str) -> Cow<'_, str> {
	if on_or_form_action().is_match(name) {
		Cow::Owned(format!("data-{}", name))
	} else {
		Cow::Borrowed(name)
	}
}

#[must_use]
pub fn no_inner_html_or_form_action(name: &str) -> Cow<'_, str> {
	match name {
		"innerHTML" | "outerHTML" | "formAction" => Cow::Owned(format!("data-{}", name)),
		_ => Cow::Borrowed(name),
	}
}

/// For `href`-like values, where `data:` URIs are legitimate.
#[must_use]
pub fn no_javascript_uri(value: &str) -> &str {
	if javascript_uri().is_match(value) {
		""
	} else {
		value
	}
}

#[must_use]
pub fn no_javascript_or_html_uri(value: &str) -> &str {
	if javascript_or_html_uri().is_match(value) {
		""
	} else {
		value
	}
}

/// Checks string values and arrays (which JavaScript would stringify comma-separated when assigned).
#[must_use]
pub fn no_javascript_or_html_value(value: Value) -> Value {
	let suspicious = match &value {
		Value::String(string) => javascript_or_html_uri().is_match(string),
		Value::Array(items) => javascript_or_html_uri().is_match(&stringify_array(items)),
		_ => false,
	};
	if suspicious {
		Value::String(String::new())
	} else {
		value
	}
}

fn stringify_array(items: &[Value]) -> String {
	items
		.iter()
		.map(|item| match item {
			Value::Null => String::new(),
			Value::String(string) => string.clone(),
			Value::Array(nested) => stringify_array(nested),
			Value::Object(_) => "[object Object]".to_owned(),
			other => other.to_string(),
		})
		.collect::<Vec<_>>()
		.join(",")
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;

	#[test]
	fn obfuscated_javascript_uris() {
		assert_eq!(no_javascript_or_html_uri("\tjava\tscript:alert(1)"), "");
		assert_eq!(no_javascript_or_html_uri("  JavaScript :alert(1)"), "");
		assert_eq!(no_javascript_uri("j a v a s c r i p t:void(0)"), "");
		assert_eq!(no_javascript_or_html_uri("https://example.com/javascript:"), "https://example.com/javascript:");
	}

	#[test]
	fn html_data_uris() {
		assert_eq!(no_javascript_or_html_uri("data:text/html,<script>alert(1)</script>"), "");
		assert_eq!(no_javascript_or_html_uri("DATA: text / html ;base64,AAAA"), "");
		assert_eq!(no_javascript_uri("data:text/html,hi"), "data:text/html,hi");
		assert_eq!(no_javascript_or_html_uri("data:image/png;base64,AAAA"), "data:image/png;base64,AAAA");
	}

	#[test]
	fn names() {
		assert_eq!(no_script("SCRIPT"), "p");
		assert_eq!(no_script("scripts"), "scripts");
		assert_eq!(no_on_or_form_action("onclick"), "data-onclick");
		assert_eq!(no_on_or_form_action("OnLoad"), "data-OnLoad");
		assert_eq!(no_on_or_form_action("formaction"), "data-formaction");
		assert_eq!(no_on_or_form_action("formActions"), "formActions");
		assert_eq!(no_on_or_form_action("title"), "title");
		assert_eq!(no_inner_html_or_form_action("innerHTML"), "data-innerHTML");
		assert_eq!(no_inner_html_or_form_action("value"), "value");
	}

	#[test]
	fn json_values() {
		assert_eq!(no_javascript_or_html_value(json!("javascript:alert(1)")), json!(""));
		assert_eq!(no_javascript_or_html_value(json!(["javascript:alert(1)", 2])), json!(""));
		assert_eq!(no_javascript_or_html_value(json!(true)), json!(true));
		assert_eq!(no_javascript_or_html_value(json!("fine")), json!("fine"));
	}
}
