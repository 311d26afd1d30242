//! The virtual node model.

use crate::{
	dom::Dom,
	events::Tagger,
	facts::{Fact, Facts},
	memo::{Dep, Deps, Memo},
	sanitize::no_script,
};
use core::{any::Any, fmt, ops::Deref};
use hashbrown::HashMap;
use std::rc::Rc;

/// A reference-counted virtual node.
///
/// Cloning is cheap, and the differ skips any pair of handles that point to the same node.
pub struct VNode<D: Dom, M>(Rc<Node<D, M>>);

/// The closed set of node variants.
pub enum Node<D: Dom, M> {
	Text(String),
	Element(Element<D, M, Vec<VNode<D, M>>>),
	Keyed(Element<D, M, KeyedChildren<D, M>>),
	Custom(Custom<D, M>),
	/// Remaps messages from `inner`'s handlers. Has no presence in the DOM.
	Tagger {
		map: Tagger<M>,
		inner: VNode<D, M>,
	},
	/// Deferred until needed, and skipped entirely while its dependencies stay equal.
	Thunk(Memo<Deps, VNode<D, M>>),
}

pub struct Element<D: Dom, M, C> {
	pub tag: String,
	/// [`None`] means XHTML.
	pub namespace: Option<String>,
	pub facts: Facts<D, M>,
	pub children: C,
}

/// Ordered, uniquely keyed children.
pub struct KeyedChildren<D: Dom, M> {
	entries: Vec<(String, VNode<D, M>)>,
	index: HashMap<String, usize>,
}

/// Postfix appended to duplicate keys until they are unique.
pub const DUPLICATE_KEY_POSTFIX: &str = "_1";

impl<D: Dom, M> KeyedChildren<D, M> {
	/// Duplicate keys are renamed by appending [`DUPLICATE_KEY_POSTFIX`] as often as needed,
	/// so `["x", "x", "x"]` becomes `["x", "x_1", "x_1_1"]`.
	pub fn new(children: impl IntoIterator<Item = (String, VNode<D, M>)>) -> Self {
		let children = children.into_iter();
		let mut entries = Vec::with_capacity(children.size_hint().0);
		let mut index = HashMap::with_capacity(children.size_hint().0);
		for (mut key, child) in children {
			while index.contains_key(&key) {
				key.push_str(DUPLICATE_KEY_POSTFIX);
			}
			index.insert(key.clone(), entries.len());
			entries.push((key, child));
		}
		Self { entries, index }
	}

	#[must_use]
	pub fn len(&self) -> usize {
		self.entries.len()
	}

	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	/// # Panics
	///
	/// Iff `i` is out of bounds.
	#[must_use]
	pub fn key(&self, i: usize) -> &str {
		&self.entries[i].0
	}

	/// # Panics
	///
	/// Iff `i` is out of bounds.
	#[must_use]
	pub fn child(&self, i: usize) -> &VNode<D, M> {
		&self.entries[i].1
	}

	#[must_use]
	pub fn position(&self, key: &str) -> Option<usize> {
		self.index.get(key).copied()
	}

	#[must_use]
	pub fn contains_key(&self, key: &str) -> bool {
		self.index.contains_key(key)
	}

	#[must_use]
	pub fn get(&self, key: &str) -> Option<&VNode<D, M>> {
		self.position(key).map(|i| self.child(i))
	}

	pub fn iter(&self) -> impl Iterator<Item = (&str, &VNode<D, M>)> {
		self.entries.iter().map(|(key, child)| (key.as_str(), child))
	}
}

/// Returned by [`Custom`] model diffs and run against the live node.
pub type Patch<D> = Box<dyn FnOnce(&D, &<D as Dom>::Node)>;

/// A node with its own rendering and patching logic, for content the differ shouldn't look into.
pub struct Custom<D: Dom, M> {
	pub facts: Facts<D, M>,
	model: Rc<dyn Any>,
	renderer: usize,
	render: Rc<dyn Fn(&D) -> D::Node>,
	diff: Rc<dyn Fn(&dyn Any) -> Option<Patch<D>>>,
}

impl<D: Dom, M> Custom<D, M> {
	#[must_use]
	pub fn model(&self) -> &dyn Any {
		&*self.model
	}

	pub(crate) fn render(&self, dom: &D) -> D::Node {
		(self.render)(dom)
	}

	/// Custom nodes are only diffed against each other if they share a render function.
	#[must_use]
	pub fn same_renderer(&self, other: &Self) -> bool {
		self.renderer == other.renderer
	}

	pub(crate) fn patch_from(&self, old: &Self) -> Option<Patch<D>> {
		(self.diff)(old.model())
	}
}

impl<D: Dom, M> VNode<D, M> {
	#[must_use]
	pub fn new(node: Node<D, M>) -> Self {
		Self(Rc::new(node))
	}

	#[must_use]
	pub fn ptr_eq(this: &Self, other: &Self) -> bool {
		Rc::ptr_eq(&this.0, &other.0)
	}

	pub fn text(content: impl Into<String>) -> Self {
		Self::new(Node::Text(content.into()))
	}

	pub fn element(tag: &str, facts: impl IntoIterator<Item = Fact<D, M>>, children: impl IntoIterator<Item = VNode<D, M>>) -> Self {
		Self::new(Node::Element(Element {
			tag: no_script(tag).to_owned(),
			namespace: None,
			facts: Facts::organize(facts),
			children: children.into_iter().collect(),
		}))
	}

	pub fn element_ns(namespace: impl Into<String>, tag: &str, facts: impl IntoIterator<Item = Fact<D, M>>, children: impl IntoIterator<Item = VNode<D, M>>) -> Self {
		Self::new(Node::Element(Element {
			tag: no_script(tag).to_owned(),
			namespace: Some(namespace.into()),
			facts: Facts::organize(facts),
			children: children.into_iter().collect(),
		}))
	}

	pub fn keyed<K: Into<String>>(tag: &str, facts: impl IntoIterator<Item = Fact<D, M>>, children: impl IntoIterator<Item = (K, VNode<D, M>)>) -> Self {
		Self::new(Node::Keyed(Element {
			tag: no_script(tag).to_owned(),
			namespace: None,
			facts: Facts::organize(facts),
			children: KeyedChildren::new(children.into_iter().map(|(key, child)| (key.into(), child))),
		}))
	}

	pub fn keyed_ns<K: Into<String>>(
		namespace: impl Into<String>,
		tag: &str,
		facts: impl IntoIterator<Item = Fact<D, M>>,
		children: impl IntoIterator<Item = (K, VNode<D, M>)>,
	) -> Self {
		Self::new(Node::Keyed(Element {
			tag: no_script(tag).to_owned(),
			namespace: Some(namespace.into()),
			facts: Facts::organize(facts),
			children: KeyedChildren::new(children.into_iter().map(|(key, child)| (key.into(), child))),
		}))
	}

	/// `render` creates the live node (facts are applied afterwards).
	/// `diff` compares the previous model with the current one and may return a patch for the live node.
	///
	/// Nodes with different `render` functions are redrawn instead of diffed.
	pub fn custom<Model: 'static>(facts: impl IntoIterator<Item = Fact<D, M>>, model: Model, render: fn(&D, &Model) -> D::Node, diff: fn(&Model, &Model) -> Option<Patch<D>>) -> Self {
		let model = Rc::new(model);
		Self::new(Node::Custom(Custom {
			facts: Facts::organize(facts),
			model: Rc::clone(&model) as Rc<dyn Any>,
			renderer: render as usize,
			render: Rc::new({
				let model = Rc::clone(&model);
				move |dom: &D| render(dom, &model)
			}),
			diff: Rc::new(move |old: &dyn Any| old.downcast_ref::<Model>().and_then(|old| diff(old, &model))),
		}))
	}

	/// Remaps every message produced below this node.
	#[must_use]
	pub fn map(self, map: impl Fn(M) -> M + 'static) -> Self {
		Self::new(Node::Tagger { map: Rc::new(map), inner: self })
	}

	/// A node produced on demand, and not at all while an earlier node with equal `deps` is already in place.
	pub fn thunk(deps: Deps, produce: impl Fn() -> Self + 'static) -> Self {
		Self::new(Node::Thunk(Memo::new(deps, produce)))
	}

	/// [`VNode::thunk`] keyed on `view` and `a`.
	pub fn lazy<A: PartialEq + 'static>(view: fn(&A) -> Self, a: A) -> Self
	where
		M: 'static,
	{
		let a = Rc::new(a);
		Self::thunk(Deps(vec![Dep::value(view as usize), Dep::value(Rc::clone(&a))]), move || view(&a))
	}

	/// [`VNode::thunk`] keyed on `view`, `a` and `b`.
	pub fn lazy2<A: PartialEq + 'static, B: PartialEq + 'static>(view: fn(&A, &B) -> Self, a: A, b: B) -> Self
	where
		M: 'static,
	{
		let (a, b) = (Rc::new(a), Rc::new(b));
		Self::thunk(Deps(vec![Dep::value(view as usize), Dep::value(Rc::clone(&a)), Dep::value(Rc::clone(&b))]), move || view(&a, &b))
	}
}

impl<D: Dom, M> Clone for VNode<D, M> {
	fn clone(&self) -> Self {
		Self(Rc::clone(&self.0))
	}
}

impl<D: Dom, M> Deref for VNode<D, M> {
	type Target = Node<D, M>;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}

impl<D: Dom, M> fmt::Debug for VNode<D, M> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		(*self.0).fmt(f)
	}
}

impl<D: Dom, M> fmt::Debug for Node<D, M> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Node::Text(text) => f.debug_tuple("Text").field(text).finish(),
			Node::Element(element) => element.fmt(f),
			Node::Keyed(element) => element.fmt(f),
			Node::Custom(custom) => f.debug_struct("Custom").field("facts", &custom.facts).finish_non_exhaustive(),
			Node::Tagger { inner, .. } => f.debug_struct("Tagger").field("inner", inner).finish_non_exhaustive(),
			Node::Thunk(memo) => f.debug_tuple("Thunk").field(memo).finish(),
		}
	}
}

impl<D: Dom, M, C: fmt::Debug> fmt::Debug for Element<D, M, C> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Element")
			.field("tag", &self.tag)
			.field("namespace", &self.namespace)
			.field("facts", &self.facts)
			.field("children", &self.children)
			.finish()
	}
}

impl<D: Dom, M> fmt::Debug for KeyedChildren<D, M> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_map().entries(self.iter()).finish()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::memory::MemoryDom;

	#[test]
	fn duplicate_keys() {
		let children = KeyedChildren::<MemoryDom, ()>::new(["x", "y", "x", "x", "x_1"].iter().map(|key| ((*key).to_owned(), VNode::text(*key))));
		assert_eq!(children.iter().map(|(key, _)| key).collect::<Vec<_>>(), ["x", "y", "x_1", "x_1_1", "x_1_1_1"]);
		assert_eq!(children.position("x_1_1"), Some(3));
		assert!(matches!(&**children.child(2), Node::Text(text) if text == "x"));
	}
}
