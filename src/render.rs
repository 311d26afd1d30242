use crate::{
	apply::apply_facts,
	dom::Dom,
	engine::Engine,
	events::{compose, EventRoot},
	facts::Facts,
	node::{Element, Node, VNode},
	redact,
	shadow::TNode,
};
use tracing::{instrument, trace_span};

impl<D: Dom> Engine<D> {
	/// Creates the live nodes for `vnode` along with their shadow tree.
	///
	/// The result is detached. Thunks on the way are forced.
	#[instrument(skip(self, vnode, root))]
	pub fn render<M: 'static>(&self, vnode: &VNode<D, M>, root: &EventRoot<M>) -> TNode<D, M> {
		match &**vnode {
			Node::Text(text) => {
				let span = trace_span!("Rendering text", text = redact(text));
				let _enter = span.enter();
				TNode::new(self.dom.create_text_node(text))
			}
			Node::Element(element) => {
				let mut tnode = self.create_element(element, root);
				for child in &element.children {
					let kid = self.render(child, root);
					self.dom.append_child(&tnode.live, &kid.live);
					tnode.indexed.push(kid);
				}
				tnode
			}
			Node::Keyed(element) => {
				let mut tnode = self.create_element(element, root);
				for (key, child) in element.children.iter() {
					let kid = self.render(child, root);
					self.dom.append_child(&tnode.live, &kid.live);
					tnode.keyed.insert(key.to_owned(), kid);
				}
				tnode
			}
			Node::Custom(custom) => {
				let span = trace_span!("Rendering custom node");
				let _enter = span.enter();
				let mut tnode = TNode::new(custom.render(&self.dom));
				apply_facts(&self.dom, &tnode.live, &Facts::default(), &custom.facts, root, &mut tnode.listeners);
				tnode
			}
			Node::Tagger { map, inner } => self.render(inner, &compose(root, map)),
			Node::Thunk(memo) => self.render(&memo.force(), root),
		}
	}

	fn create_element<M: 'static, C>(&self, element: &Element<D, M, C>, root: &EventRoot<M>) -> TNode<D, M> {
		let span = trace_span!("Rendering element", tag = element.tag.as_str(), namespace = ?element.namespace);
		let _enter = span.enter();

		let live = match &element.namespace {
			Some(namespace) => self.dom.create_element_ns(namespace, &element.tag),
			None => self.dom.create_element(&element.tag),
		};
		let mut tnode = TNode::new(live);
		apply_facts(&self.dom, &tnode.live, &Facts::default(), &element.facts, root, &mut tnode.listeners);
		tnode
	}
}
