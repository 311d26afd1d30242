#![allow(dead_code)]

use arbor_dom::{
	memory::{MemoryDom, Mutation, NodeId},
	Dom, Engine, EventRoot, Mounted,
};
use std::{cell::RefCell, mem, rc::Rc};

pub type VNode = arbor_dom::VNode<MemoryDom, String>;

pub fn init_logging() {
	//TODO: Fail on warnings and errors in tests that don't provoke them.
	tracing_subscriber::fmt().with_test_writer().with_max_level(tracing::Level::TRACE).try_init().ok();
}

/// A mounted view inside a `<body>`, recording the messages it sends.
pub struct Harness {
	pub engine: Engine<MemoryDom>,
	pub body: NodeId,
	pub mounted: Mounted<MemoryDom, String>,
	pub current: VNode,
	pub messages: Rc<RefCell<Vec<(String, bool)>>>,
}

impl Harness {
	pub fn mount(vnode: VNode) -> Self {
		Self::mount_into(MemoryDom::new(), vnode)
	}

	pub fn mount_into(dom: MemoryDom, vnode: VNode) -> Self {
		init_logging();

		let body = dom.create_element("body");
		let placeholder = dom.create_text_node("");
		dom.append_child(&body, &placeholder);

		let messages: Rc<RefCell<Vec<(String, bool)>>> = Rc::default();
		let event_root: EventRoot<String> = {
			let messages = Rc::clone(&messages);
			Rc::new(move |message: String, synchronous: bool| messages.borrow_mut().push((message, synchronous)))
		};

		let mut engine = Engine::new(dom);
		let mounted = engine.mount(&placeholder, &vnode, event_root);
		engine.dom().clear_mutations();

		Self {
			engine,
			body,
			mounted,
			current: vnode,
			messages,
		}
	}

	/// Runs one pass from the current view to `next` and returns the mutations it caused.
	pub fn update(&mut self, next: VNode) -> Vec<Mutation> {
		self.engine.dom().clear_mutations();
		let previous = mem::replace(&mut self.current, next.clone());
		self.engine.update(&mut self.mounted, &previous, &next);
		self.engine.dom().take_mutations()
	}

	pub fn dom(&self) -> &MemoryDom {
		self.engine.dom()
	}

	pub fn root(&self) -> NodeId {
		*self.mounted.root()
	}

	pub fn html(&self) -> String {
		self.dom().outer_html(self.root())
	}

	pub fn take_messages(&self) -> Vec<(String, bool)> {
		self.messages.take()
	}
}

pub fn structural(mutations: &[Mutation]) -> Vec<&Mutation> {
	mutations.iter().filter(|mutation| mutation.is_structural()).collect()
}
