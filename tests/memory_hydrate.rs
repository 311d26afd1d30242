use arbor_dom::{
	memory::{MemoryDom, Mutation, NodeId},
	ssr, Dom, Engine, EventRoot, Fact, Handler, HydrateError, Node, MARKER_ATTRIBUTE,
};
use serde_json::Value;
use std::{cell::RefCell, rc::Rc};

mod memory_harness_;
use memory_harness_::{init_logging, VNode};

const SVG: &str = "http://www.w3.org/2000/svg";

/// Statically renders `view` into a fresh `<body>`.
fn serve(view: &VNode) -> (Engine<MemoryDom>, NodeId) {
	init_logging();
	let engine = Engine::new(MemoryDom::new());
	let body = engine.dom().create_element("body");
	let root = ssr::build(engine.dom(), view);
	engine.dom().append_child(&body, &root);
	(engine, root)
}

fn recorder() -> (EventRoot<String>, Rc<RefCell<Vec<String>>>) {
	let messages: Rc<RefCell<Vec<String>>> = Rc::default();
	let event_root: EventRoot<String> = {
		let messages = Rc::clone(&messages);
		Rc::new(move |message: String, _: bool| messages.borrow_mut().push(message))
	};
	(event_root, messages)
}

fn marker_removals(mutations: &[Mutation]) -> usize {
	mutations
		.iter()
		.filter(|mutation| matches!(mutation, Mutation::RemoveAttribute { namespace: None, name, .. } if name == MARKER_ATTRIBUTE))
		.count()
}

#[test]
fn round_trip_only_drops_markers() {
	let view = VNode::element(
		"div",
		vec![Fact::attribute("class", "greeting"), Fact::attribute("id", "main"), Fact::style("color", "red")],
		vec![
			VNode::text("Hello"),
			VNode::text("world"),
			VNode::element("input", vec![Fact::property("value", "typed"), Fact::property("readOnly", true)], vec![]),
			VNode::element("textarea", vec![Fact::property("value", "notes")], vec![]),
			VNode::element_ns(SVG, "svg", vec![Fact::attribute("viewBox", "0 0 1 1")], vec![]),
		],
	);
	let (mut engine, root) = serve(&view);
	let (event_root, _) = recorder();

	let (hydrated, mut mounted) = engine.hydrate(&root, event_root).unwrap();
	assert!(engine.is_managed(&root));
	assert_eq!(mounted.root(), &root);
	engine.dom().clear_mutations();

	let live = engine.update(&mut mounted, &hydrated, &view);
	assert_eq!(live, root);

	let mutations = engine.dom().take_mutations();
	assert_eq!(marker_removals(&mutations), 4, "{:?}", mutations);
	assert_eq!(mutations.len(), 4, "{:?}", mutations);
	assert!(!engine.dom().outer_html(root).contains(MARKER_ATTRIBUTE));
	assert_eq!(engine.dom().errors(), 0);
}

#[test]
fn foreign_nodes_are_skipped() {
	let view = VNode::element("div", vec![], vec![VNode::text("a"), VNode::element("span", vec![], vec![VNode::text("b")])]);
	let (mut engine, root) = serve(&view);
	let (aside, comment) = {
		let dom = engine.dom();
		let span = dom.child_nodes(&root)[1];
		let aside = dom.create_element("aside");
		let comment = dom.create_comment("");
		dom.insert_before(&root, &aside, Some(&span));
		dom.insert_before(&root, &comment, Some(&span));
		(aside, comment)
	};
	let (event_root, _) = recorder();

	let (hydrated, mut mounted) = engine.hydrate(&root, event_root).unwrap();
	match &*hydrated {
		Node::Element(element) => assert_eq!(element.children.len(), 2),
		_ => panic!("Expected an element."),
	}
	assert_eq!(mounted.shadow().indexed().len(), 2);
	engine.dom().clear_mutations();

	engine.update(&mut mounted, &hydrated, &view);
	let mutations = engine.dom().take_mutations();
	assert_eq!(marker_removals(&mutations), 2, "{:?}", mutations);
	assert_eq!(mutations.len(), 2, "{:?}", mutations);
	assert_eq!(engine.dom().parent_node(&aside), Some(root));
	assert_eq!(engine.dom().parent_node(&comment), Some(root));
	assert_eq!(engine.dom().outer_html(root), "<div>a<aside></aside><!----><span>b</span></div>");
}

#[test]
fn handlers_attach_on_the_first_update() {
	let view = VNode::element("button", vec![Fact::on("click", Handler::normal(|_| Some("clicked".to_owned())))], vec![VNode::text("Click me")]);
	let (mut engine, root) = serve(&view);
	let (event_root, messages) = recorder();

	let (hydrated, mut mounted) = engine.hydrate(&root, event_root).unwrap();
	assert_eq!(engine.dom().listener_count(root, "click"), 0);

	engine.update(&mut mounted, &hydrated, &view);
	assert_eq!(engine.dom().listener_count(root, "click"), 1);
	engine.dom().dispatch(root, "click", Value::Null);
	assert_eq!(messages.take(), vec!["clicked".to_owned()]);
}

#[test]
fn managed_nodes_are_refused() {
	let view = VNode::element("div", vec![], vec![]);
	let (mut engine, root) = serve(&view);

	let (first, _) = recorder();
	assert!(engine.hydrate(&root, first).is_ok());
	let (second, _) = recorder();
	assert_eq!(engine.hydrate(&root, second).err(), Some(HydrateError::AlreadyManaged));

	let placeholder = engine.dom().create_element("div");
	let body = engine.dom().create_element("body");
	engine.dom().append_child(&body, &placeholder);
	let (event_root, _) = recorder();
	let mounted = engine.mount(&placeholder, &view, event_root);
	let (third, _) = recorder();
	assert_eq!(engine.hydrate(mounted.root(), third).err(), Some(HydrateError::AlreadyManaged));
}

#[test]
fn text_roots() {
	let (mut engine, root) = serve(&VNode::text("plain"));
	let (event_root, _) = recorder();
	let (hydrated, _) = engine.hydrate(&root, event_root).unwrap();
	assert!(matches!(&*hydrated, Node::Text(text) if text == "plain"));
}

#[test]
fn other_roots_become_empty_text() {
	init_logging();
	let mut engine = Engine::new(MemoryDom::new());
	let comment = engine.dom().create_comment("server");
	let (event_root, _) = recorder();

	let (hydrated, mounted) = engine.hydrate(&comment, event_root).unwrap();
	assert!(matches!(&*hydrated, Node::Text(text) if text.is_empty()));
	assert_eq!(mounted.root(), &comment);
	assert!(engine.is_managed(&comment));
}

#[test]
fn markup_matches_static_rendering() {
	let view = VNode::element("p", vec![Fact::attribute("title", "x")], vec![VNode::text("a"), VNode::text("b")]);
	assert_eq!(ssr::to_html(&view), "<p data-arbor=\"\" title=\"x\">a<!---->b</p>");
	let (engine, root) = serve(&view);
	assert_eq!(engine.dom().outer_html(root), "<p data-arbor=\"\" title=\"x\">ab</p>");
}
