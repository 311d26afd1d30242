//! Event handlers and the per-node callbacks that dispatch them.
//!
//! Each bound event name owns exactly one native listener. Re-renders swap the handler and event root
//! inside the listener's [`Binding`] cell, so listeners are only removed and re-added when a handler's
//! [`HandlerKind`] changes (which also changes passive-listener eligibility).

use crate::dom::{Dom, DomEvent};
use core::{cell::RefCell, fmt};
use hashbrown::HashMap;
use std::rc::Rc;
use tracing::{instrument, trace, trace_span};

/// The single outward channel. The `bool` is `true` for events that must be handled synchronously,
/// which is implied by stopping propagation.
pub type EventRoot<M> = Rc<dyn Fn(M, bool)>;

/// Remaps messages on their way out.
pub type Tagger<M> = Rc<dyn Fn(M) -> M>;

/// Result of a [`Handler::Custom`] decode.
#[derive(Debug, Clone, PartialEq)]
pub struct Handled<M> {
	pub message: M,
	pub stop_propagation: bool,
	pub prevent_default: bool,
}

/// An event decoder. Returning [`None`] means the event is ignored.
pub enum Handler<D: Dom, M> {
	Normal(Rc<dyn Fn(&D::Event) -> Option<M>>),
	/// The `bool` requests [`DomEvent::stop_propagation`].
	MayStopPropagation(Rc<dyn Fn(&D::Event) -> Option<(M, bool)>>),
	/// The `bool` requests [`DomEvent::prevent_default`].
	MayPreventDefault(Rc<dyn Fn(&D::Event) -> Option<(M, bool)>>),
	Custom(Rc<dyn Fn(&D::Event) -> Option<Handled<M>>>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum HandlerKind {
	Normal = 0,
	MayStopPropagation = 1,
	MayPreventDefault = 2,
	Custom = 3,
}

impl HandlerKind {
	/// Handlers that can't prevent the default action may be registered as passive listeners.
	#[must_use]
	pub fn is_passive_eligible(self) -> bool {
		self < HandlerKind::MayPreventDefault
	}
}

impl<D: Dom, M> Clone for Handler<D, M> {
	fn clone(&self) -> Self {
		match self {
			Handler::Normal(decode) => Handler::Normal(Rc::clone(decode)),
			Handler::MayStopPropagation(decode) => Handler::MayStopPropagation(Rc::clone(decode)),
			Handler::MayPreventDefault(decode) => Handler::MayPreventDefault(Rc::clone(decode)),
			Handler::Custom(decode) => Handler::Custom(Rc::clone(decode)),
		}
	}
}

impl<D: Dom, M> Handler<D, M> {
	#[must_use]
	pub fn kind(&self) -> HandlerKind {
		match self {
			Handler::Normal(_) => HandlerKind::Normal,
			Handler::MayStopPropagation(_) => HandlerKind::MayStopPropagation,
			Handler::MayPreventDefault(_) => HandlerKind::MayPreventDefault,
			Handler::Custom(_) => HandlerKind::Custom,
		}
	}
}

impl<D: Dom, M> fmt::Debug for Handler<D, M> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "Handler::{:?}", self.kind())
	}
}

impl<D: Dom, M: 'static> Handler<D, M> {
	pub fn normal(decode: impl Fn(&D::Event) -> Option<M> + 'static) -> Self {
		Handler::Normal(Rc::new(decode))
	}

	pub fn may_stop_propagation(decode: impl Fn(&D::Event) -> Option<(M, bool)> + 'static) -> Self {
		Handler::MayStopPropagation(Rc::new(decode))
	}

	pub fn may_prevent_default(decode: impl Fn(&D::Event) -> Option<(M, bool)> + 'static) -> Self {
		Handler::MayPreventDefault(Rc::new(decode))
	}

	pub fn custom(decode: impl Fn(&D::Event) -> Option<Handled<M>> + 'static) -> Self {
		Handler::Custom(Rc::new(decode))
	}

	/// Remaps the produced message, keeping the kind and propagation flags.
	#[must_use]
	pub fn map(self, tagger: impl Fn(M) -> M + 'static) -> Self {
		let tagger = Rc::new(tagger);
		match self {
			Handler::Normal(decode) => Handler::Normal(Rc::new(move |event: &D::Event| decode(event).map(|message| tagger(message)))),
			Handler::MayStopPropagation(decode) => {
				Handler::MayStopPropagation(Rc::new(move |event: &D::Event| decode(event).map(|(message, stop)| (tagger(message), stop))))
			}
			Handler::MayPreventDefault(decode) => {
				Handler::MayPreventDefault(Rc::new(move |event: &D::Event| decode(event).map(|(message, prevent)| (tagger(message), prevent))))
			}
			Handler::Custom(decode) => Handler::Custom(Rc::new(move |event: &D::Event| {
				decode(event).map(|handled| Handled {
					message: tagger(handled.message),
					..handled
				})
			})),
		}
	}

	fn decode(&self, event: &D::Event) -> Option<Handled<M>> {
		match self {
			Handler::Normal(decode) => decode(event).map(|message| Handled {
				message,
				stop_propagation: false,
				prevent_default: false,
			}),
			Handler::MayStopPropagation(decode) => decode(event).map(|(message, stop_propagation)| Handled {
				message,
				stop_propagation,
				prevent_default: false,
			}),
			Handler::MayPreventDefault(decode) => decode(event).map(|(message, prevent_default)| Handled {
				message,
				stop_propagation: false,
				prevent_default,
			}),
			Handler::Custom(decode) => decode(event),
		}
	}
}

/// Wraps `root` so that messages pass through `tagger` first.
pub(crate) fn compose<M: 'static>(root: &EventRoot<M>, tagger: &Tagger<M>) -> EventRoot<M> {
	let root = Rc::clone(root);
	let tagger = Rc::clone(tagger);
	Rc::new(move |message, synchronous| root(tagger(message), synchronous))
}

/// What a native listener currently dispatches to. Swapped in place on re-render.
struct Binding<D: Dom, M> {
	handler: Handler<D, M>,
	root: EventRoot<M>,
}

/// A native listener together with its swappable [`Binding`].
pub(crate) struct Callback<D: Dom, M> {
	binding: Rc<RefCell<Binding<D, M>>>,
	listener: D::Listener,
}

impl<D: Dom, M: 'static> Callback<D, M> {
	fn new(dom: &D, handler: Handler<D, M>, root: EventRoot<M>) -> Self {
		let binding = Rc::new(RefCell::new(Binding { handler, root }));
		let listener = dom.create_listener({
			let binding = Rc::clone(&binding);
			Rc::new(move |event: &D::Event| dispatch(&binding, event))
		});
		Self { binding, listener }
	}

	fn kind(&self) -> HandlerKind {
		self.binding.borrow().handler.kind()
	}

	fn rebind(&self, handler: Handler<D, M>, root: EventRoot<M>) {
		*self.binding.borrow_mut() = Binding { handler, root };
	}

	pub(crate) fn set_root(&self, root: EventRoot<M>) {
		self.binding.borrow_mut().root = root;
	}
}

impl<D: Dom, M> Callback<D, M> {
	pub(crate) fn listener(&self) -> &D::Listener {
		&self.listener
	}
}

fn dispatch<D: Dom, M: 'static>(binding: &RefCell<Binding<D, M>>, event: &D::Event) {
	// Copied out so that the event root may re-enter the engine.
	let (handler, root) = {
		let binding = binding.borrow();
		(binding.handler.clone(), Rc::clone(&binding.root))
	};

	let span = trace_span!("dispatch", kind = ?handler.kind());
	let _enter = span.enter();

	let Handled {
		message,
		stop_propagation,
		prevent_default,
	} = match handler.decode(event) {
		Some(handled) => handled,
		None => return trace!("Handler declined the event."),
	};

	if stop_propagation {
		event.stop_propagation();
	}
	if prevent_default {
		event.prevent_default();
	}
	root(message, stop_propagation);
}

pub(crate) type Listeners<D, M> = HashMap<String, Callback<D, M>>;

/// Brings the native listeners of `element` in line with `events`.
#[instrument(skip(dom, root, events, listeners))]
pub(crate) fn apply_events<D: Dom, M: 'static>(dom: &D, element: &D::Node, root: &EventRoot<M>, events: &HashMap<String, Handler<D, M>>, listeners: &mut Listeners<D, M>) {
	for (name, handler) in events {
		if let Some(callback) = listeners.get(name) {
			if callback.kind() == handler.kind() {
				callback.rebind(handler.clone(), Rc::clone(root));
				continue;
			}
			trace!("Handler kind for {:?} changed from {:?} to {:?}. Replacing the listener.", name, callback.kind(), handler.kind());
			dom.remove_event_listener(element, name, &callback.listener);
		}

		let callback = Callback::new(dom, handler.clone(), Rc::clone(root));
		let passive = if dom.supports_passive() { Some(handler.kind().is_passive_eligible()) } else { None };
		dom.add_event_listener(element, name, &callback.listener, passive);
		listeners.insert(name.clone(), callback);
	}

	listeners.retain(|name, callback| {
		if events.contains_key(name) {
			true
		} else {
			dom.remove_event_listener(element, name, &callback.listener);
			false
		}
	});
}

/// Points every existing callback at the current event root, without touching native listeners.
pub(crate) fn refresh_roots<D: Dom, M: 'static>(listeners: &Listeners<D, M>, root: &EventRoot<M>) {
	for callback in listeners.values() {
		callback.set_root(Rc::clone(root));
	}
}
