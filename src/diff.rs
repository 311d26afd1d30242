use crate::{
	apply::{apply_facts, apply_properties},
	dom::{Dom, NodeKind},
	engine::Engine,
	events::{compose, refresh_roots, EventRoot},
	node::{Element, KeyedChildren, Node, VNode},
	position, redact,
	shadow::{self, TNode},
};
use tracing::{error, instrument, trace, trace_span, warn};

/// What happened to a slot during [`Engine::diff`].
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use]
pub struct DiffOutcome<N> {
	/// The slot's live node after the diff.
	pub live: N,
	/// The slot was a text node whose content had been changed by someone else, so it wasn't updated.
	pub externally_altered: bool,
	/// The slot was redrawn while its old node was detached, so the new node is detached as well.
	pub needs_reinsertion: bool,
}

impl<N> DiffOutcome<N> {
	fn in_place(live: N) -> Self {
		Self {
			live,
			externally_altered: false,
			needs_reinsertion: false,
		}
	}
}

/// Positional access to a list of children and their shadow nodes.
pub(crate) trait ChildList<D: Dom, M> {
	fn count(&self) -> usize;
	fn child(&self, i: usize) -> &VNode<D, M>;
	fn shadow<'a>(&self, i: usize, tnode: &'a mut TNode<D, M>) -> Option<&'a mut TNode<D, M>>;
}

impl<D: Dom, M> ChildList<D, M> for Vec<VNode<D, M>> {
	fn count(&self) -> usize {
		self.len()
	}

	fn child(&self, i: usize) -> &VNode<D, M> {
		&self[i]
	}

	fn shadow<'a>(&self, i: usize, tnode: &'a mut TNode<D, M>) -> Option<&'a mut TNode<D, M>> {
		tnode.indexed.get_mut(i)
	}
}

impl<D: Dom, M> ChildList<D, M> for KeyedChildren<D, M> {
	fn count(&self) -> usize {
		self.len()
	}

	fn child(&self, i: usize) -> &VNode<D, M> {
		KeyedChildren::child(self, i)
	}

	fn shadow<'a>(&self, i: usize, tnode: &'a mut TNode<D, M>) -> Option<&'a mut TNode<D, M>> {
		tnode.keyed.get_mut(self.key(i))
	}
}

/// The text a child renders to, looking through taggers and thunks.
fn text_of<D: Dom, M>(vnode: &VNode<D, M>) -> Option<String> {
	match &**vnode {
		Node::Text(text) => Some(text.clone()),
		Node::Tagger { inner, .. } => text_of(inner),
		Node::Thunk(memo) => text_of(&memo.force()),
		Node::Element(_) | Node::Keyed(_) | Node::Custom(_) => None,
	}
}

fn same_kind<D: Dom, M, X, Y>(x: &Element<D, M, X>, y: &Element<D, M, Y>) -> bool {
	x.tag == y.tag && x.namespace == y.namespace
}

impl<D: Dom> Engine<D> {
	/// Patches the live nodes in `tnode` from `x` to `y`.
	///
	/// `tnode` must be the shadow node that was rendered (or last diffed) for `x`.
	#[instrument(skip(self, x, y, root, tnode))]
	pub fn diff<M: 'static>(&mut self, x: &VNode<D, M>, y: &VNode<D, M>, root: &EventRoot<M>, tnode: &mut TNode<D, M>) -> DiffOutcome<D::Node> {
		if VNode::ptr_eq(x, y) {
			trace!("Identical node. Quick visit only.");
			self.quick_visit(y, root, tnode);
			return DiffOutcome::in_place(tnode.live.clone());
		}

		match (&**x, &**y) {
			(Node::Tagger { inner, .. }, _) => self.diff(inner, y, root, tnode),
			(_, Node::Tagger { map, inner }) => self.diff(x, inner, &compose(root, map), tnode),

			(Node::Thunk(x_memo), Node::Thunk(y_memo)) => {
				if x_memo.matches(y_memo) {
					let span = trace_span!("Thunk dependencies unchanged");
					let _enter = span.enter();
					let cached = x_memo.force();
					y_memo.adopt(cached.clone());
					self.quick_visit(&cached, root, tnode);
					DiffOutcome::in_place(tnode.live.clone())
				} else {
					self.diff(&x_memo.force(), &y_memo.force(), root, tnode)
				}
			}
			(Node::Thunk(x_memo), _) => self.diff(&x_memo.force(), y, root, tnode),
			(_, Node::Thunk(y_memo)) => self.diff(x, &y_memo.force(), root, tnode),

			(Node::Text(x_text), Node::Text(y_text)) => self.diff_text(x_text, y_text, tnode),

			(Node::Element(x_element), Node::Element(y_element)) if same_kind(x_element, y_element) => {
				self.diff_element(x_element, y_element, root, tnode, |engine, live, tnode| engine.diff_kids(live, &x_element.children, &y_element.children, root, tnode))
			}
			(Node::Keyed(x_element), Node::Keyed(y_element)) if same_kind(x_element, y_element) => {
				self.diff_element(x_element, y_element, root, tnode, |engine, live, tnode| engine.diff_keyed_kids(live, &x_element.children, &y_element.children, root, tnode))
			}
			(Node::Element(x_element), Node::Keyed(y_element)) if same_kind(x_element, y_element) => {
				self.diff_element(x_element, y_element, root, tnode, |engine, live, tnode| {
					trace!("Keying previously unkeyed children.");
					let x_children = shadow::upkey(&x_element.children, &y_element.children, tnode);
					engine.diff_keyed_kids(live, &x_children, &y_element.children, root, tnode)
				})
			}
			(Node::Keyed(x_element), Node::Element(y_element)) if same_kind(x_element, y_element) => {
				self.diff_element(x_element, y_element, root, tnode, |engine, live, tnode| {
					trace!("Dropping child keys.");
					let x_children = shadow::dekey(&x_element.children, tnode);
					engine.diff_kids(live, &x_children, &y_element.children, root, tnode)
				})
			}

			(Node::Custom(x_custom), Node::Custom(y_custom)) if y_custom.same_renderer(x_custom) => {
				let span = trace_span!("Diffing custom node");
				let _enter = span.enter();
				let live = tnode.live.clone();
				apply_facts(&self.dom, &live, &x_custom.facts, &y_custom.facts, root, &mut tnode.listeners);
				if let Some(patch) = y_custom.patch_from(x_custom) {
					trace!("Applying model patch.");
					patch(&self.dom, &live);
				}
				DiffOutcome::in_place(live)
			}

			_ => self.redraw(x, y, root, tnode),
		}
	}

	/// Re-applies properties and points callbacks at `root`, without any other mutations.
	pub(crate) fn quick_visit<M: 'static>(&self, y: &VNode<D, M>, root: &EventRoot<M>, tnode: &mut TNode<D, M>) {
		match &**y {
			Node::Text(_) => (),
			Node::Element(element) => {
				apply_properties(&self.dom, &tnode.live, &element.facts.properties);
				refresh_roots(&tnode.listeners, root);
				for (child, kid) in element.children.iter().zip(tnode.indexed.iter_mut()) {
					self.quick_visit(child, root, kid);
				}
			}
			Node::Keyed(element) => {
				apply_properties(&self.dom, &tnode.live, &element.facts.properties);
				refresh_roots(&tnode.listeners, root);
				for (key, child) in element.children.iter() {
					match tnode.keyed.get_mut(key) {
						Some(kid) => self.quick_visit(child, root, kid),
						None => error!("Shadow tree mismatch: No shadow node for key {:?}.", key),
					}
				}
			}
			Node::Custom(custom) => {
				apply_properties(&self.dom, &tnode.live, &custom.facts.properties);
				refresh_roots(&tnode.listeners, root);
			}
			Node::Tagger { map, inner } => self.quick_visit(inner, &compose(root, map), tnode),
			Node::Thunk(memo) => self.quick_visit(&memo.force(), root, tnode),
		}
	}

	fn diff_text<M>(&mut self, x_text: &str, y_text: &str, tnode: &mut TNode<D, M>) -> DiffOutcome<D::Node> {
		let span = trace_span!("Diffing text", x_text = redact(x_text), y_text = redact(y_text));
		let _enter = span.enter();

		let live = tnode.live.clone();
		if x_text == y_text {
			return DiffOutcome::in_place(live);
		}

		let parent = self.dom.parent_node(&live);
		let data = self.dom.text_data(&live);
		if parent.is_none() || data != x_text {
			warn!(data = redact(&data), "Text node was changed or removed externally.");
			return DiffOutcome {
				live,
				externally_altered: true,
				needs_reinsertion: false,
			};
		}

		if self.ever_translated {
			// Translators keep track of the nodes they rewrote, so editing them in place can confuse them.
			let fresh = self.dom.create_text_node(y_text);
			if let Some(parent) = parent {
				self.dom.replace_child(&parent, &fresh, &live);
			}
			tnode.live = fresh.clone();
			DiffOutcome::in_place(fresh)
		} else {
			self.dom.set_text_data(&live, y_text);
			DiffOutcome::in_place(live)
		}
	}

	fn diff_element<M: 'static, X, Y: ChildList<D, M>>(
		&mut self,
		x: &Element<D, M, X>,
		y: &Element<D, M, Y>,
		root: &EventRoot<M>,
		tnode: &mut TNode<D, M>,
		diff_children: impl FnOnce(&mut Self, &D::Node, &mut TNode<D, M>) -> bool,
	) -> DiffOutcome<D::Node> {
		let span = trace_span!("Diffing element", tag = y.tag.as_str());
		let _enter = span.enter();

		let live = tnode.live.clone();
		apply_facts(&self.dom, &live, &x.facts, &y.facts, root, &mut tnode.listeners);
		if diff_children(self, &live, tnode) {
			self.ever_translated = true;
			self.recover_translation(&live, &y.children, tnode);
		}
		DiffOutcome::in_place(live)
	}

	/// Diffs unkeyed children pairwise, then removes or appends the difference.
	///
	/// Returns whether any child was found externally altered.
	fn diff_kids<M: 'static>(&mut self, parent: &D::Node, xs: &[VNode<D, M>], ys: &[VNode<D, M>], root: &EventRoot<M>, tnode: &mut TNode<D, M>) -> bool {
		if tnode.indexed.len() != xs.len() {
			error!("Shadow tree mismatch: {} shadow children for {} virtual children.", tnode.indexed.len(), xs.len());
		}

		let mut altered = false;
		let mut anchor = None;
		for ((x, y), kid) in xs.iter().zip(ys).zip(tnode.indexed.iter_mut()) {
			let outcome = self.diff(x, y, root, kid);
			altered |= outcome.externally_altered;
			anchor = position::settle_after(&self.dom, parent, &outcome.live, anchor, outcome.needs_reinsertion);
		}

		let common = tnode.indexed.len().min(xs.len()).min(ys.len());
		for kid in tnode.indexed.drain(common..) {
			position::remove(&self.dom, &kid.live);
		}
		for y in &ys[common..] {
			let kid = self.render(y, root);
			self.dom.append_child(parent, &kid.live);
			tnode.indexed.push(kid);
		}
		altered
	}

	/// Gives every text child of `parent` a fresh live node and clears out what a translator left behind.
	///
	/// Loose text nodes and `<font>` elements that aren't ours are removed. Other foreign nodes stay,
	/// and so do our nodes that are still attached.
	#[instrument(skip(self, children, tnode))]
	fn recover_translation<M>(&mut self, parent: &D::Node, children: &impl ChildList<D, M>, tnode: &mut TNode<D, M>) {
		let mut ours = Vec::with_capacity(children.count());
		for i in 0..children.count() {
			let kid = match children.shadow(i, tnode) {
				Some(kid) => kid,
				None => {
					error!("Shadow tree mismatch: No shadow node for child {}.", i);
					continue;
				}
			};
			if let Some(text) = text_of(children.child(i)) {
				kid.live = self.dom.create_text_node(&text);
			}
			ours.push(kid.live.clone());
		}

		for debris in self.dom.child_nodes(parent) {
			if ours.contains(&debris) {
				continue;
			}
			let is_debris = match self.dom.kind(&debris) {
				NodeKind::Text => true,
				NodeKind::Element => self.dom.local_name(&debris).eq_ignore_ascii_case("font"),
				NodeKind::Other => false,
			};
			if is_debris {
				trace!("Removing {:?}.", debris);
				self.dom.remove_child(parent, &debris);
			}
		}

		let mut next: Option<D::Node> = None;
		for live in ours.iter().rev() {
			match self.dom.parent_node(live) {
				Some(current) if &current == parent => trace!("{:?} stays where it is.", live),
				Some(_) => {
					warn!("{:?} was moved out of {:?}. Leaving it there.", live, parent);
					continue;
				}
				None => position::insert_before(&self.dom, parent, live, next.as_ref()),
			}
			next = Some(live.clone());
		}
	}

	/// Renders `y` from scratch and swaps it in for `tnode`'s live node.
	fn redraw<M: 'static>(&mut self, x: &VNode<D, M>, y: &VNode<D, M>, root: &EventRoot<M>, tnode: &mut TNode<D, M>) -> DiffOutcome<D::Node> {
		let span = trace_span!("Redrawing");
		let _enter = span.enter();

		let old = tnode.live.clone();
		let was_text = self.dom.kind(&old) == NodeKind::Text;
		*tnode = self.render(y, root);
		let live = tnode.live.clone();

		match self.dom.parent_node(&old) {
			Some(parent) => {
				let externally_altered = was_text && !matches!(&**x, Node::Text(text) if self.dom.text_data(&old) == *text);
				self.dom.replace_child(&parent, &live, &old);
				DiffOutcome {
					live,
					externally_altered,
					needs_reinsertion: false,
				}
			}
			None => {
				warn!("Redrew a detached node. It needs to be reinserted.");
				// Translators swap out our text nodes wholesale, so a missing one counts as altered.
				DiffOutcome {
					live,
					externally_altered: was_text,
					needs_reinsertion: true,
				}
			}
		}
	}
}
