use arbor_dom::{
	memory::{MemoryDom, MemoryEvent, Mutation},
	Dom, Fact, Handled, Handler,
};
use serde_json::{json, Value};

mod memory_harness_;
use memory_harness_::{Harness, VNode};

fn button(handler: Handler<MemoryDom, String>) -> VNode {
	VNode::element("button", vec![Fact::on("click", handler)], vec![VNode::text("Click me")])
}

fn listener_mutations(mutations: &[Mutation]) -> Vec<&Mutation> {
	mutations.iter().filter(|mutation| matches!(mutation, Mutation::AddListener { .. } | Mutation::RemoveListener { .. })).collect()
}

#[test]
fn click() {
	let harness = Harness::mount(button(Handler::normal(|_| Some("clicked".to_owned()))));
	assert_eq!(harness.take_messages(), Vec::<(String, bool)>::new());

	let event = harness.dom().dispatch(harness.root(), "click", Value::Null);
	assert!(!event.propagation_stopped());
	assert!(!event.default_prevented());
	assert_eq!(harness.take_messages(), vec![("clicked".to_owned(), false)]);
}

#[test]
fn declined_events_send_nothing() {
	let harness = Harness::mount(button(Handler::normal(|event: &MemoryEvent| event.detail().as_str().map(ToOwned::to_owned))));
	harness.dom().dispatch(harness.root(), "click", Value::Null);
	assert_eq!(harness.take_messages(), Vec::<(String, bool)>::new());
	harness.dom().dispatch(harness.root(), "click", json!("decoded"));
	assert_eq!(harness.take_messages(), vec![("decoded".to_owned(), false)]);
}

#[test]
fn bubbling_from_text() {
	let harness = Harness::mount(button(Handler::normal(|_| Some("clicked".to_owned()))));
	let text = harness.dom().first_child(&harness.root()).unwrap();
	harness.dom().dispatch(text, "click", Value::Null);
	assert_eq!(harness.take_messages(), vec![("clicked".to_owned(), false)]);
}

#[test]
fn new_handlers_reuse_the_listener() {
	let mut harness = Harness::mount(button(Handler::normal(|_| Some("first".to_owned()))));
	let mutations = harness.update(button(Handler::normal(|_| Some("second".to_owned()))));
	assert_eq!(listener_mutations(&mutations), Vec::<&Mutation>::new());

	harness.dom().dispatch(harness.root(), "click", Value::Null);
	assert_eq!(harness.take_messages(), vec![("second".to_owned(), false)]);
	assert_eq!(harness.dom().listener_count(harness.root(), "click"), 1);
}

#[test]
fn kind_changes_replace_the_listener() {
	let mut harness = Harness::mount(button(Handler::normal(|_| Some("normal".to_owned()))));
	let root = harness.root();
	assert_eq!(harness.dom().listener_passive(root, "click"), vec![Some(true)]);

	let mutations = harness.update(button(Handler::may_prevent_default(|_| Some(("prevent".to_owned(), true)))));
	assert_eq!(
		listener_mutations(&mutations),
		vec![
			&Mutation::RemoveListener {
				node: root,
				name: "click".to_owned(),
			},
			&Mutation::AddListener {
				node: root,
				name: "click".to_owned(),
				passive: Some(false),
			},
		]
	);
	assert_eq!(harness.dom().listener_passive(root, "click"), vec![Some(false)]);

	let event = harness.dom().dispatch(root, "click", Value::Null);
	assert!(event.default_prevented());
	assert!(!event.propagation_stopped());
	assert_eq!(harness.take_messages(), vec![("prevent".to_owned(), false)]);
}

#[test]
fn stopping_propagation_is_synchronous() {
	let inner = VNode::element("span", vec![Fact::on("click", Handler::may_stop_propagation(|_| Some(("inner".to_owned(), true))))], vec![]);
	let harness = Harness::mount(VNode::element("div", vec![Fact::on("click", Handler::normal(|_| Some("outer".to_owned())))], vec![inner]));

	let span = harness.dom().first_child(&harness.root()).unwrap();
	let event = harness.dom().dispatch(span, "click", Value::Null);
	assert!(event.propagation_stopped());
	assert_eq!(harness.take_messages(), vec![("inner".to_owned(), true)]);
}

#[test]
fn custom_handlers() {
	let harness = Harness::mount(button(Handler::custom(|_| {
		Some(Handled {
			message: "custom".to_owned(),
			stop_propagation: false,
			prevent_default: true,
		})
	})));
	assert_eq!(harness.dom().listener_passive(harness.root(), "click"), vec![Some(false)]);
	assert!(harness.dom().dispatch(harness.root(), "click", Value::Null).default_prevented());
	assert_eq!(harness.take_messages(), vec![("custom".to_owned(), false)]);
}

#[test]
fn taggers_remap_messages() {
	let view = |prefix: &'static str| {
		let list = VNode::element("div", vec![], vec![button(Handler::normal(|_| Some("clicked".to_owned()))).map(move |message| format!("{}/{}", prefix, message))]);
		list.map(|message| format!("app/{}", message))
	};
	let mut harness = Harness::mount(view("item"));
	let target = harness.dom().first_child(&harness.root()).unwrap();
	harness.dom().dispatch(target, "click", Value::Null);
	assert_eq!(harness.take_messages(), vec![("app/item/clicked".to_owned(), false)]);

	let mutations = harness.update(view("other"));
	assert_eq!(listener_mutations(&mutations), Vec::<&Mutation>::new());
	harness.dom().dispatch(target, "click", Value::Null);
	assert_eq!(harness.take_messages(), vec![("app/other/clicked".to_owned(), false)]);
}

#[test]
fn mapped_handlers() {
	let harness = Harness::mount(button(Handler::normal(|_| Some("clicked".to_owned())).map(|message| message.to_uppercase())));
	harness.dom().dispatch(harness.root(), "click", Value::Null);
	assert_eq!(harness.take_messages(), vec![("CLICKED".to_owned(), false)]);
}

#[test]
fn identical_nodes_follow_the_new_root() {
	let shared = button(Handler::normal(|_| Some("clicked".to_owned())));
	let mut harness = Harness::mount(shared.clone().map(|message| format!("a/{}", message)));
	let root = harness.root();

	let mutations = harness.update(shared.map(|message| format!("b/{}", message)));
	assert_eq!(mutations, Vec::<Mutation>::new());
	harness.dom().dispatch(root, "click", Value::Null);
	assert_eq!(harness.take_messages(), vec![("b/clicked".to_owned(), false)]);
}

#[test]
fn removed_events_detach_the_listener() {
	let mut harness = Harness::mount(button(Handler::normal(|_| Some("clicked".to_owned()))));
	let root = harness.root();
	let mutations = harness.update(VNode::element("button", vec![], vec![VNode::text("Click me")]));
	assert_eq!(
		mutations,
		vec![Mutation::RemoveListener {
			node: root,
			name: "click".to_owned(),
		}]
	);
	harness.dom().dispatch(root, "click", Value::Null);
	assert_eq!(harness.take_messages(), Vec::<(String, bool)>::new());
}
