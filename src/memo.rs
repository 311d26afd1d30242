//! Lazily produced, dependency-keyed values.

use core::{
	any::Any,
	cell::RefCell,
	fmt::{self, Debug},
};
use std::rc::Rc;

/// Object-safe equality for [`Dep::Value`], implemented for everything that is [`PartialEq`].
pub trait DynEq {
	#[doc(hidden)]
	fn as_any(&self) -> &dyn Any;
	#[doc(hidden)]
	fn dyn_eq(&self, other: &dyn DynEq) -> bool;
}

impl<T: PartialEq + 'static> DynEq for T {
	fn as_any(&self) -> &dyn Any {
		self
	}

	fn dyn_eq(&self, other: &dyn DynEq) -> bool {
		other.as_any().downcast_ref::<T>().map_or(false, |other| self == other)
	}
}

/// One dependency of a [`Memo`].
///
/// Values compare with [`PartialEq`] (and never equal a value of another type).
/// References compare by pointer identity, which is the only sensible choice for closures.
#[derive(Clone)]
pub enum Dep {
	Value(Rc<dyn DynEq>),
	Ref { address: usize, _keep_alive: Rc<dyn Any> },
}

impl Dep {
	pub fn value<T: PartialEq + 'static>(value: T) -> Self {
		Dep::Value(Rc::new(value))
	}

	/// Keeps `reference` alive so that its address can't be reused while the dependency exists.
	pub fn reference<T: ?Sized + 'static>(reference: &Rc<T>) -> Self {
		Dep::Ref {
			address: Rc::as_ptr(reference).cast::<()>() as usize,
			_keep_alive: Rc::new(Rc::clone(reference)),
		}
	}
}

impl PartialEq for Dep {
	fn eq(&self, other: &Self) -> bool {
		match (self, other) {
			(Dep::Value(a), Dep::Value(b)) => a.dyn_eq(&**b),
			(Dep::Ref { address: a, .. }, Dep::Ref { address: b, .. }) => a == b,
			_ => false,
		}
	}
}

impl Debug for Dep {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Dep::Value(_) => f.write_str("Dep::Value(..)"),
			Dep::Ref { address, .. } => write!(f, "Dep::Ref({:#x})", address),
		}
	}
}

/// Dependencies compare elementwise and must have the same length to be equal.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Deps(pub Vec<Dep>);

impl FromIterator<Dep> for Deps {
	fn from_iter<T: IntoIterator<Item = Dep>>(iter: T) -> Self {
		Self(iter.into_iter().collect())
	}
}

/// A value produced on first demand and cached, keyed by `K`.
///
/// Two memos with equal keys are assumed to produce equal values, so one can [adopt](`Memo::adopt`) the other's.
pub struct Memo<K, V> {
	key: K,
	produce: Box<dyn Fn() -> V>,
	cached: RefCell<Option<V>>,
}

impl<K: PartialEq, V: Clone> Memo<K, V> {
	pub fn new(key: K, produce: impl Fn() -> V + 'static) -> Self {
		Self {
			key,
			produce: Box::new(produce),
			cached: RefCell::new(None),
		}
	}

	pub fn key(&self) -> &K {
		&self.key
	}

	#[must_use]
	pub fn matches(&self, other: &Self) -> bool {
		self.key == other.key
	}

	/// Returns the cached value, producing it first if necessary.
	pub fn force(&self) -> V {
		if let Some(value) = &*self.cached.borrow() {
			return value.clone();
		}
		// `produce` may force other memos, so no borrow is held while it runs.
		let value = (self.produce)();
		*self.cached.borrow_mut() = Some(value.clone());
		value
	}

	#[must_use]
	pub fn cached(&self) -> Option<V> {
		self.cached.borrow().clone()
	}

	/// Stores a value produced elsewhere under an equal key.
	pub fn adopt(&self, value: V) {
		*self.cached.borrow_mut() = Some(value);
	}
}

impl<K: Debug, V> Debug for Memo<K, V> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Memo")
			.field("key", &self.key)
			.field("cached", &self.cached.try_borrow().map(|cached| cached.is_some()))
			.finish_non_exhaustive()
	}
}
