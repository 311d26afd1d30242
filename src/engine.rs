use crate::{
	dom::Dom,
	events::EventRoot,
	node::VNode,
	shadow::TNode,
};
use core::fmt;
use tracing::{instrument, trace, warn};

/// Renders, patches and hydrates virtual trees against one [`Dom`].
///
/// The engine also remembers whether it has ever seen text that was rewritten by a third party (usually a page translator).
/// Once that happened, text changes are applied by replacing text nodes rather than editing them,
/// since translators tend to keep references to the nodes they rewrote.
pub struct Engine<D: Dom> {
	pub(crate) dom: D,
	pub(crate) ever_translated: bool,
	managed: Vec<D::Node>,
}

/// A mounted (or hydrated) virtual tree.
pub struct Mounted<D: Dom, M> {
	pub(crate) tnode: TNode<D, M>,
	pub(crate) event_root: EventRoot<M>,
}

impl<D: Dom, M> Mounted<D, M> {
	/// The current live root node.
	#[must_use]
	pub fn root(&self) -> &D::Node {
		self.tnode.live()
	}

	#[must_use]
	pub fn shadow(&self) -> &TNode<D, M> {
		&self.tnode
	}
}

impl<D: Dom, M> fmt::Debug for Mounted<D, M> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Mounted").field("tnode", &self.tnode).finish_non_exhaustive()
	}
}

impl<D: Dom> Engine<D> {
	#[must_use]
	pub fn new(dom: D) -> Self {
		Self {
			dom,
			ever_translated: false,
			managed: Vec::new(),
		}
	}

	#[must_use]
	pub fn dom(&self) -> &D {
		&self.dom
	}

	/// Whether externally rewritten text was detected at any point. Never resets.
	#[must_use]
	pub fn ever_translated(&self) -> bool {
		self.ever_translated
	}

	/// Whether `node` is the root of a mounted or hydrated tree.
	#[must_use]
	pub fn is_managed(&self, node: &D::Node) -> bool {
		self.managed.contains(node)
	}

	pub(crate) fn manage(&mut self, node: D::Node) {
		self.managed.push(node);
	}

	/// Renders `vnode` and puts it in place of `root`.
	///
	/// If `root` isn't attached anywhere, the rendered tree is left detached too.
	#[instrument(skip(self, vnode, event_root))]
	pub fn mount<M: 'static>(&mut self, root: &D::Node, vnode: &VNode<D, M>, event_root: EventRoot<M>) -> Mounted<D, M> {
		let tnode = self.render(vnode, &event_root);
		match self.dom.parent_node(root) {
			Some(parent) => self.dom.replace_child(&parent, tnode.live(), root),
			None => warn!("Mount point {:?} has no parent. The rendered tree stays detached.", root),
		}
		self.manage(tnode.live().clone());
		Mounted { tnode, event_root }
	}

	/// Patches `mounted` from `previous` to `next` and returns the current live root,
	/// which differs from before if the root had to be redrawn.
	#[instrument(skip(self, mounted, previous, next))]
	pub fn update<M: 'static>(&mut self, mounted: &mut Mounted<D, M>, previous: &VNode<D, M>, next: &VNode<D, M>) -> D::Node {
		let before = mounted.tnode.live().clone();
		let event_root = mounted.event_root.clone();
		let outcome = self.diff(previous, next, &event_root, &mut mounted.tnode);

		if outcome.needs_reinsertion {
			warn!("The root was redrawn while detached. The new root is detached too.");
		}
		if outcome.live != before {
			trace!("Root replaced.");
			self.managed.retain(|managed| managed != &before);
			self.manage(outcome.live.clone());
		}
		outcome.live
	}

	/// Forgets `mounted` and removes its event listeners. The live nodes are left where they are.
	#[instrument(skip(self, mounted))]
	pub fn unmount<M>(&mut self, mounted: Mounted<D, M>) {
		let root = mounted.tnode.live();
		self.managed.retain(|managed| managed != root);
		release(&self.dom, &mounted.tnode);
	}
}

impl<D: Dom + fmt::Debug> fmt::Debug for Engine<D> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Engine")
			.field("dom", &self.dom)
			.field("ever_translated", &self.ever_translated)
			.field("managed", &self.managed)
			.finish()
	}
}

fn release<D: Dom, M>(dom: &D, tnode: &TNode<D, M>) {
	for (name, callback) in &tnode.listeners {
		dom.remove_event_listener(&tnode.live, name, callback.listener());
	}
	for child in tnode.indexed.iter().chain(tnode.keyed.values()) {
		release(dom, child);
	}
}
