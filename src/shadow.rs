//! The shadow tree, which remembers which live node was rendered for which virtual node.

use crate::{
	dom::Dom,
	events::Listeners,
	node::{KeyedChildren, VNode, DUPLICATE_KEY_POSTFIX},
};
use core::{fmt, mem};
use hashbrown::{HashMap, HashSet};
use tracing::error;

/// Shadow node of a single rendered slot.
///
/// `live` is whatever was last rendered there. Third parties may have detached or moved it since.
pub struct TNode<D: Dom, M> {
	pub(crate) live: D::Node,
	pub(crate) indexed: Vec<TNode<D, M>>,
	pub(crate) keyed: HashMap<String, TNode<D, M>>,
	pub(crate) listeners: Listeners<D, M>,
}

impl<D: Dom, M> TNode<D, M> {
	pub(crate) fn new(live: D::Node) -> Self {
		Self {
			live,
			indexed: Vec::new(),
			keyed: HashMap::new(),
			listeners: HashMap::new(),
		}
	}

	#[must_use]
	pub fn live(&self) -> &D::Node {
		&self.live
	}

	/// Shadow children of a plain element, in order.
	#[must_use]
	pub fn indexed(&self) -> &[TNode<D, M>] {
		&self.indexed
	}

	#[must_use]
	pub fn keyed(&self, key: &str) -> Option<&TNode<D, M>> {
		self.keyed.get(key)
	}

	/// Event names with a bound native listener.
	pub fn listened(&self) -> impl Iterator<Item = &str> {
		self.listeners.keys().map(String::as_str)
	}
}

impl<D: Dom, M> fmt::Debug for TNode<D, M> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("TNode")
			.field("live", &self.live)
			.field("indexed", &self.indexed)
			.field("keyed", &self.keyed)
			.field("listeners", &self.listeners.keys().collect::<Vec<_>>())
			.finish()
	}
}

/// Gives `old`, a plain child list, the keys of `new` by position so that the two can be diffed as keyed lists.
///
/// Old children past the end of `new` get synthetic `"{index}_1"` keys that don't collide with any of `new`'s.
/// Their shadow nodes move from `tnode.indexed` to `tnode.keyed` accordingly.
pub(crate) fn upkey<D: Dom, M>(old: &[VNode<D, M>], new: &KeyedChildren<D, M>, tnode: &mut TNode<D, M>) -> KeyedChildren<D, M> {
	let mut taken = HashSet::new();
	let keys = (0..old.len())
		.map(|i| {
			let mut key = if i < new.len() { new.key(i).to_owned() } else { format!("{}{}", i, DUPLICATE_KEY_POSTFIX) };
			while (i >= new.len() && new.contains_key(&key)) || taken.contains(&key) {
				key.push_str(DUPLICATE_KEY_POSTFIX);
			}
			taken.insert(key.clone());
			key
		})
		.collect::<Vec<_>>();

	let indexed = mem::take(&mut tnode.indexed);
	if indexed.len() != old.len() {
		error!("Shadow tree mismatch: {} shadow children for {} virtual children.", indexed.len(), old.len());
	}
	tnode.keyed = keys.iter().cloned().zip(indexed).collect();

	KeyedChildren::new(keys.into_iter().zip(old.iter().cloned()))
}

/// The reverse of [`upkey`]: `old`'s shadow nodes move back into `tnode.indexed`, in order.
pub(crate) fn dekey<D: Dom, M>(old: &KeyedChildren<D, M>, tnode: &mut TNode<D, M>) -> Vec<VNode<D, M>> {
	let mut keyed = mem::take(&mut tnode.keyed);
	let mut children = Vec::with_capacity(old.len());
	for (key, child) in old.iter() {
		match keyed.remove(key) {
			Some(shadow) => {
				tnode.indexed.push(shadow);
				children.push(child.clone());
			}
			None => {
				error!("Shadow tree mismatch: No shadow node for key {:?}. Skipping it.", key);
			}
		}
	}
	children
}
