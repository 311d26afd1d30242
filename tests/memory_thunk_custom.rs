use arbor_dom::{
	memory::{MemoryDom, Mutation, NodeId},
	Dep, Deps, Dom, Fact, Handler, Patch,
};
use serde_json::Value;
use std::{cell::Cell, rc::Rc};

mod memory_harness_;
use memory_harness_::{Harness, VNode};

thread_local! {
	static VIEW_CALLS: Cell<usize> = Cell::new(0);
}

fn counter(count: &u32) -> VNode {
	VIEW_CALLS.with(|calls| calls.set(calls.get() + 1));
	VNode::element("span", vec![], vec![VNode::text(count.to_string())])
}

fn labelled(label: &&'static str, count: &u32) -> VNode {
	VIEW_CALLS.with(|calls| calls.set(calls.get() + 1));
	VNode::text(format!("{}: {}", label, count))
}

fn view_calls() -> usize {
	VIEW_CALLS.with(Cell::get)
}

#[test]
fn lazy_views_run_only_for_new_arguments() {
	let base = view_calls();
	let mut harness = Harness::mount(VNode::lazy(counter, 1));
	assert_eq!(view_calls() - base, 1);
	assert_eq!(harness.html(), "<span>1</span>");

	assert_eq!(harness.update(VNode::lazy(counter, 1)), Vec::<Mutation>::new());
	assert_eq!(view_calls() - base, 1);

	let mutations = harness.update(VNode::lazy(counter, 2));
	assert_eq!(view_calls() - base, 2);
	assert_eq!(mutations.len(), 1, "{:?}", mutations);
	assert!(matches!(&mutations[0], Mutation::Text { data, .. } if data == "2"));

	// The cached node is handed on, so later unchanged passes don't run the view either.
	harness.update(VNode::lazy(counter, 2));
	harness.update(VNode::lazy(counter, 2));
	assert_eq!(view_calls() - base, 2);
}

#[test]
fn lazy2_compares_both_arguments() {
	let mut harness = Harness::mount(VNode::lazy2(labelled, "a", 1));
	let calls = view_calls();
	harness.update(VNode::lazy2(labelled, "a", 1));
	assert_eq!(view_calls(), calls);
	harness.update(VNode::lazy2(labelled, "b", 1));
	assert_eq!(view_calls(), calls + 1);
	assert_eq!(harness.html(), "b: 1");
}

#[test]
fn thunks_compare_references_by_identity() {
	let produced = Rc::new(Cell::new(0));
	let thunk = |model: &Rc<String>| {
		let (model, produced) = (Rc::clone(model), Rc::clone(&produced));
		VNode::thunk(Deps(vec![Dep::reference(&model)]), move || {
			produced.set(produced.get() + 1);
			VNode::text(model.as_str())
		})
	};

	let first = Rc::new("first".to_owned());
	let mut harness = Harness::mount(thunk(&first));
	harness.update(thunk(&first));
	assert_eq!(produced.get(), 1);

	// Equal content, but another allocation.
	let copy = Rc::new("first".to_owned());
	assert_eq!(harness.update(thunk(&copy)), Vec::<Mutation>::new());
	assert_eq!(produced.get(), 2);

	harness.update(thunk(&Rc::new("second".to_owned())));
	assert_eq!(produced.get(), 3);
	assert_eq!(harness.html(), "second");
}

#[test]
fn thunks_diff_against_plain_nodes() {
	let plain = || VNode::element("p", vec![], vec![VNode::text("same")]);
	let mut harness = Harness::mount(VNode::thunk(Deps::default(), plain));
	let root = harness.root();
	assert_eq!(harness.update(plain()), Vec::<Mutation>::new());
	assert_eq!(harness.update(VNode::thunk(Deps::default(), plain)), Vec::<Mutation>::new());
	assert_eq!(harness.root(), root);
}

fn render_meter(dom: &MemoryDom, level: &u32) -> NodeId {
	let meter = dom.create_element("meter");
	dom.set_attribute(&meter, "value", &level.to_string());
	meter
}

fn diff_meter(old: &u32, new: &u32) -> Option<Patch<MemoryDom>> {
	if old == new {
		return None;
	}
	let value = new.to_string();
	Some(Box::new(move |dom: &MemoryDom, meter: &NodeId| dom.set_attribute(meter, "value", &value)))
}

fn render_progress(dom: &MemoryDom, level: &u32) -> NodeId {
	let progress = dom.create_element("progress");
	dom.set_attribute(&progress, "max", "100");
	dom.set_attribute(&progress, "value", &level.to_string());
	progress
}

fn meter(level: u32) -> VNode {
	VNode::custom(vec![Fact::attribute("class", "level")], level, render_meter, diff_meter)
}

#[test]
fn custom_nodes_patch_their_model() {
	let mut harness = Harness::mount(meter(1));
	let root = harness.root();
	assert_eq!(harness.html(), "<meter value=\"1\" class=\"level\"></meter>");

	assert_eq!(harness.update(meter(1)), Vec::<Mutation>::new());
	assert_eq!(
		harness.update(meter(2)),
		vec![Mutation::SetAttribute {
			node: root,
			namespace: None,
			name: "value".to_owned(),
			value: "2".to_owned(),
		}]
	);
	assert_eq!(harness.root(), root);
}

#[test]
fn custom_nodes_with_another_renderer_are_redrawn() {
	let mut harness = Harness::mount(meter(1));
	let root = harness.root();

	let mutations = harness.update(VNode::custom(vec![], 1_u32, render_progress, diff_meter));
	assert!(mutations.iter().any(|mutation| matches!(mutation, Mutation::Replace { old, .. } if *old == root)), "{:?}", mutations);
	assert_ne!(harness.root(), root);
	assert_eq!(harness.dom().local_name(&harness.root()), "progress");
}

#[test]
fn custom_nodes_take_facts() {
	let harness = Harness::mount(VNode::custom(vec![Fact::on("click", Handler::normal(|_| Some("metered".to_owned())))], 3_u32, render_meter, diff_meter));
	harness.dom().dispatch(harness.root(), "click", Value::Null);
	assert_eq!(harness.take_messages(), vec![("metered".to_owned(), false)]);
}
