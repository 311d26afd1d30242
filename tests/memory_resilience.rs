use arbor_dom::{
	memory::{MemoryDom, Mutation},
	Dom, Engine, EventRoot,
};
use std::rc::Rc;

mod memory_harness_;
use memory_harness_::{init_logging, Harness, VNode};

fn paragraph(texts: &[&str]) -> VNode {
	VNode::element("p", vec![], texts.iter().map(|text| VNode::text(*text)))
}

#[test]
fn removed_children_come_back() {
	let view = |inner: &str| VNode::element("div", vec![], vec![VNode::text("a"), VNode::element("span", vec![], vec![VNode::text(inner)])]);
	let mut harness = Harness::mount(view("x"));
	let root = harness.root();
	let span = harness.dom().child_nodes(&root)[1];
	harness.dom().remove_child(&root, &span);

	harness.update(view("y"));
	assert_eq!(harness.html(), "<div>a<span>y</span></div>");
	assert_eq!(harness.dom().child_nodes(&root)[1], span);
	assert_eq!(harness.dom().errors(), 0);
}

#[test]
fn detached_children_are_redrawn_in_place() {
	let mut harness = Harness::mount(VNode::element("div", vec![], vec![VNode::text("a"), VNode::element("span", vec![], vec![]), VNode::text("b")]));
	let root = harness.root();
	let span = harness.dom().child_nodes(&root)[1];
	harness.dom().remove_child(&root, &span);

	harness.update(VNode::element("div", vec![], vec![VNode::text("a"), VNode::element("p", vec![], vec![]), VNode::text("b")]));
	assert_eq!(harness.html(), "<div>a<p></p>b</div>");
	assert_eq!(harness.dom().parent_node(&span), None);
	assert_eq!(harness.dom().errors(), 0);
}

#[test]
fn redrawing_a_detached_node_asks_for_reinsertion() {
	init_logging();
	let mut engine = Engine::new(MemoryDom::new());
	let root: EventRoot<String> = Rc::new(|_: String, _: bool| ());

	let x = VNode::element("div", vec![], vec![]);
	let y = VNode::element("span", vec![], vec![]);
	let mut tnode = engine.render(&x, &root);
	let old = tnode.live().clone();

	let outcome = engine.diff(&x, &y, &root, &mut tnode);
	assert!(outcome.needs_reinsertion);
	assert!(!outcome.externally_altered);
	assert_ne!(outcome.live, old);
	assert_eq!(&outcome.live, tnode.live());
	assert_eq!(engine.dom().local_name(&outcome.live), "span");
	assert_eq!(engine.dom().errors(), 0);
}

#[test]
fn detached_roots_stay_detached() {
	let mut harness = Harness::mount(VNode::element("div", vec![], vec![]));
	let old = harness.root();
	harness.dom().remove_child(&harness.body, &old);

	let next = VNode::element("span", vec![], vec![]);
	let previous = std::mem::replace(&mut harness.current, next.clone());
	let live = harness.engine.update(&mut harness.mounted, &previous, &next);

	assert_ne!(live, old);
	assert_eq!(harness.root(), live);
	assert_eq!(harness.dom().parent_node(&live), None);
	assert!(harness.engine.is_managed(&live));
	assert!(!harness.engine.is_managed(&old));
	assert!(harness.dom().child_nodes(&harness.body).is_empty());
}

#[test]
fn translated_text_is_recovered() {
	let mut harness = Harness::mount(paragraph(&["Hello", " world"]));
	let root = harness.root();
	let texts = harness.dom().child_nodes(&root);

	// What a page translator might do.
	let font = harness.dom().create_element("font");
	let translated = harness.dom().create_text_node("Hallo");
	harness.dom().append_child(&font, &translated);
	harness.dom().replace_child(&root, &font, &texts[0]);
	harness.dom().set_text_data(&texts[1], " Welt");
	assert!(!harness.engine.ever_translated());

	harness.update(paragraph(&["Hi", " world"]));
	assert_eq!(harness.html(), "<p>Hi world</p>");
	assert!(harness.engine.ever_translated());

	let fresh = harness.dom().child_nodes(&root);
	assert_eq!(fresh.len(), 2);
	assert!(texts.iter().all(|text| !fresh.contains(text)));
	assert_eq!(harness.dom().parent_node(&font), None);
	assert_eq!(harness.dom().errors(), 0);

	// From now on, text is replaced rather than edited.
	let mutations = harness.update(paragraph(&["Hey", " world"]));
	assert_eq!(harness.html(), "<p>Hey world</p>");
	assert!(mutations.iter().any(|mutation| matches!(mutation, Mutation::Replace { old, .. } if *old == fresh[0])), "{:?}", mutations);
	assert!(!mutations.iter().any(|mutation| matches!(mutation, Mutation::Text { .. })), "{:?}", mutations);
	assert!(harness.engine.ever_translated());
}

#[test]
fn edited_text_is_recovered() {
	let mut harness = Harness::mount(paragraph(&["Hello"]));
	let root = harness.root();
	let text = harness.dom().first_child(&root).unwrap();
	harness.dom().set_text_data(&text, "Hallo");

	harness.update(paragraph(&["Hi"]));
	assert_eq!(harness.html(), "<p>Hi</p>");
	assert_ne!(harness.dom().first_child(&root), Some(text));
	assert!(harness.engine.ever_translated());
}

#[test]
fn foreign_elements_survive_recovery() {
	let mut harness = Harness::mount(paragraph(&["Hello"]));
	let root = harness.root();
	let text = harness.dom().first_child(&root).unwrap();
	let foreign = harness.dom().create_element("b");
	harness.dom().append_child(&root, &foreign);
	harness.dom().set_text_data(&text, "Hallo");

	harness.update(paragraph(&["Hi"]));
	assert_eq!(harness.dom().parent_node(&foreign), Some(root));
	assert_eq!(harness.html(), "<p><b></b>Hi</p>");
}

#[test]
fn attached_siblings_are_not_moved_during_recovery() {
	let view = |text: &str| VNode::element("p", vec![], vec![VNode::element("span", vec![], vec![]), VNode::text(text)]);
	let mut harness = Harness::mount(view("Hello"));
	let root = harness.root();
	let (span, text) = {
		let children = harness.dom().child_nodes(&root);
		(children[0], children[1])
	};
	let foreign = harness.dom().create_element("b");
	harness.dom().insert_before(&root, &foreign, Some(&text));
	harness.dom().set_text_data(&text, "Hallo");

	let mutations = harness.update(view("Hi"));
	assert_eq!(harness.html(), "<p><span></span><b></b>Hi</p>");
	assert_eq!(harness.dom().child_nodes(&root)[0], span);
	assert!(
		!mutations.iter().any(|mutation| matches!(mutation, Mutation::Insert { node, .. } | Mutation::Move { node, .. } if *node == span || *node == foreign)),
		"{:?}",
		mutations
	);
	assert!(harness.engine.ever_translated());
}

#[test]
fn text_swapped_for_font_is_cleaned_up_when_redrawn() {
	let mut harness = Harness::mount(paragraph(&["Hello"]));
	let root = harness.root();
	let text = harness.dom().first_child(&root).unwrap();

	let font = harness.dom().create_element("font");
	let translated = harness.dom().create_text_node("Hallo");
	harness.dom().append_child(&font, &translated);
	harness.dom().replace_child(&root, &font, &text);

	harness.update(VNode::element("p", vec![], vec![VNode::element("span", vec![], vec![])]));
	assert_eq!(harness.html(), "<p><span></span></p>");
	assert_eq!(harness.dom().parent_node(&font), None);
	assert!(harness.engine.ever_translated());
	assert_eq!(harness.dom().errors(), 0);
}

#[test]
fn unchanged_text_is_left_alone() {
	let mut harness = Harness::mount(paragraph(&["Hello"]));
	let root = harness.root();
	let text = harness.dom().first_child(&root).unwrap();
	harness.dom().set_text_data(&text, "Hallo");

	assert_eq!(harness.update(paragraph(&["Hello"])), Vec::<Mutation>::new());
	assert_eq!(harness.html(), "<p>Hallo</p>");
	assert!(!harness.engine.ever_translated());
}
