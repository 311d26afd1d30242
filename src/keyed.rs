//! Keyed child list reconciliation.
//!
//! Both ends of the lists are swept for matching keys first, removing vanished and inserting brand-new entries on the way.
//! When both ends stall, a swap check catches entries that traded places (moving at most two nodes per round).
//! Whatever is left in the middle is resolved left to right.

use crate::{
	dom::Dom,
	engine::Engine,
	events::EventRoot,
	node::{KeyedChildren, VNode},
	position,
	shadow::TNode,
};
use core::mem;
use hashbrown::HashMap;
use tracing::{error, instrument, trace};

impl<D: Dom> Engine<D> {
	/// Returns whether any child was found externally altered.
	#[allow(clippy::too_many_lines)]
	#[instrument(skip(self, xs, ys, root, tnode))]
	pub(crate) fn diff_keyed_kids<M: 'static>(&mut self, parent: &D::Node, xs: &KeyedChildren<D, M>, ys: &KeyedChildren<D, M>, root: &EventRoot<M>, tnode: &mut TNode<D, M>) -> bool {
		// Entries are taken out of `old` as they're matched, so "still in `old`" means "not handled yet".
		let mut old = mem::take(&mut tnode.keyed);
		let mut placed = HashMap::with_capacity(ys.len());
		let mut altered = false;

		let (mut x_lo, mut x_hi) = (0, xs.len());
		let (mut y_lo, mut y_hi) = (0, ys.len());
		let mut lower: Option<D::Node> = None;
		let mut upper: Option<D::Node> = None;

		loop {
			while x_lo < x_hi && y_lo < y_hi {
				let (x_key, y_key) = (xs.key(x_lo), ys.key(y_lo));
				if !old.contains_key(x_key) {
					x_lo += 1;
				} else if x_key == y_key {
					let (live, outcome_altered, needs_reinsertion) = self.diff_entry(y_key, xs.child(x_lo), ys.child(y_lo), root, &mut old, &mut placed);
					altered |= outcome_altered;
					lower = position::settle_after(&self.dom, parent, &live, lower, needs_reinsertion);
					x_lo += 1;
					y_lo += 1;
				} else if !ys.contains_key(x_key) {
					self.remove_entry(x_key, &mut old);
					x_lo += 1;
				} else if !old.contains_key(y_key) {
					let live = self.render_entry(y_key, ys.child(y_lo), root, &mut placed);
					position::insert_after(&self.dom, parent, &live, lower.as_ref());
					lower = Some(live);
					y_lo += 1;
				} else {
					break;
				}
			}

			while x_lo < x_hi && y_lo < y_hi {
				let (x_key, y_key) = (xs.key(x_hi - 1), ys.key(y_hi - 1));
				if !old.contains_key(x_key) {
					x_hi -= 1;
				} else if x_key == y_key {
					let (live, outcome_altered, needs_reinsertion) = self.diff_entry(y_key, xs.child(x_hi - 1), ys.child(y_hi - 1), root, &mut old, &mut placed);
					altered |= outcome_altered;
					upper = position::settle_before(&self.dom, parent, &live, upper, needs_reinsertion);
					x_hi -= 1;
					y_hi -= 1;
				} else if !ys.contains_key(x_key) {
					self.remove_entry(x_key, &mut old);
					x_hi -= 1;
				} else if !old.contains_key(y_key) {
					let live = self.render_entry(y_key, ys.child(y_hi - 1), root, &mut placed);
					position::insert_before(&self.dom, parent, &live, upper.as_ref());
					upper = Some(live);
					y_hi -= 1;
				} else {
					break;
				}
			}

			if x_lo >= x_hi || y_lo >= y_hi {
				break;
			}

			// Keys are captured before either move so that a single remaining entry isn't handled twice.
			let (x_low, x_high) = (xs.key(x_lo), xs.key(x_hi - 1));
			let (y_low, y_high) = (ys.key(y_lo), ys.key(y_hi - 1));
			let mut swapped = false;

			if x_low == y_high && old.contains_key(x_low) {
				trace!("Swap: {:?} moves to the back.", x_low);
				let (live, outcome_altered, needs_reinsertion) = self.diff_entry(y_high, xs.child(x_lo), ys.child(y_hi - 1), root, &mut old, &mut placed);
				altered |= outcome_altered;
				upper = position::place_before(&self.dom, parent, &live, upper, needs_reinsertion);
				x_lo += 1;
				y_hi -= 1;
				swapped = true;
			}

			if x_high == y_low && x_lo < x_hi && y_lo < y_hi && old.contains_key(x_high) {
				trace!("Swap: {:?} moves to the front.", x_high);
				let (live, outcome_altered, needs_reinsertion) = self.diff_entry(y_low, xs.child(x_hi - 1), ys.child(y_lo), root, &mut old, &mut placed);
				altered |= outcome_altered;
				lower = position::place_after(&self.dom, parent, &live, lower, needs_reinsertion);
				x_hi -= 1;
				y_lo += 1;
				swapped = true;
			}

			if !swapped {
				break;
			}
		}

		for j in y_lo..y_hi {
			let y_key = ys.key(j);
			match xs.get(y_key) {
				Some(x) if old.contains_key(y_key) => {
					let (live, outcome_altered, needs_reinsertion) = self.diff_entry(y_key, x, ys.child(j), root, &mut old, &mut placed);
					altered |= outcome_altered;
					lower = position::place_after(&self.dom, parent, &live, lower, needs_reinsertion);
				}
				_ => {
					let live = self.render_entry(y_key, ys.child(j), root, &mut placed);
					position::insert_after(&self.dom, parent, &live, lower.as_ref());
					lower = Some(live);
				}
			}
		}

		for (key, gone) in old.drain() {
			trace!("Removing {:?}.", key);
			position::remove(&self.dom, &gone.live);
		}

		tnode.keyed = placed;
		altered
	}

	/// Diffs the entry under `key`, moving its shadow node from `old` to `placed`.
	///
	/// Returns the live node, whether it was externally altered and whether it needs to be (re)inserted.
	#[allow(clippy::too_many_arguments)]
	fn diff_entry<M: 'static>(
		&mut self,
		key: &str,
		x: &VNode<D, M>,
		y: &VNode<D, M>,
		root: &EventRoot<M>,
		old: &mut HashMap<String, TNode<D, M>>,
		placed: &mut HashMap<String, TNode<D, M>>,
	) -> (D::Node, bool, bool) {
		let mut kid = match old.remove(key) {
			Some(kid) => kid,
			None => {
				error!("Shadow tree mismatch: No shadow node for key {:?}. Rendering it anew.", key);
				let live = self.render_entry(key, y, root, placed);
				return (live, false, true);
			}
		};
		let outcome = self.diff(x, y, root, &mut kid);
		placed.insert(key.to_owned(), kid);
		(outcome.live, outcome.externally_altered, outcome.needs_reinsertion)
	}

	fn render_entry<M: 'static>(&self, key: &str, y: &VNode<D, M>, root: &EventRoot<M>, placed: &mut HashMap<String, TNode<D, M>>) -> D::Node {
		let kid = self.render(y, root);
		let live = kid.live.clone();
		placed.insert(key.to_owned(), kid);
		live
	}

	fn remove_entry<M>(&self, key: &str, old: &mut HashMap<String, TNode<D, M>>) {
		if let Some(gone) = old.remove(key) {
			trace!("Removing {:?}.", key);
			position::remove(&self.dom, &gone.live);
		}
	}
}
