#![doc(html_root_url = "https://docs.rs/arbor-dom/0.1.0")]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

//! A keyed virtual DOM differ that tolerates third-party DOM mutation.
//!
//! Views are described as immutable [`VNode`] trees. An [`Engine`] renders them into a live [`Dom`],
//! then patches the live tree in place as new views come in, keeping a shadow tree ([`TNode`]) of the live nodes it owns.
//!
//! The engine never assumes that the live tree still looks the way it left it:
//! Browser extensions and machine translation regularly replace text nodes or wrap them in `<font>` elements,
//! and detached or relocated nodes are reinserted rather than causing failures.
//!
//! Two hosts are provided: [`WebDom`] for browsers and [`MemoryDom`], which records mutations and runs natively.

#[cfg(doctest)]
pub mod readme {
	doc_comment::doctest!("../README.md");
}

mod apply;
mod diff;
pub mod dom;
mod engine;
pub mod events;
pub mod facts;
mod hydrate;
mod keyed;
pub mod memo;
pub mod memory;
pub mod node;
mod position;
mod render;
pub mod sanitize;
pub mod shadow;
pub mod ssr;
pub mod web;

pub use diff::DiffOutcome;
pub use dom::{Attribute, Dom, DomEvent, NodeKind};
pub use engine::{Engine, Mounted};
pub use events::{EventRoot, Handled, Handler, HandlerKind, Tagger};
pub use facts::{Fact, Facts, NsAttribute};
pub use hydrate::{HydrateError, MARKER_ATTRIBUTE};
pub use memo::{Dep, Deps};
pub use memory::MemoryDom;
pub use node::{Node, Patch, VNode};
pub use shadow::TNode;
pub use web::WebDom;

/// Keeps page content out of log fields unless the `"dangerous-logging"` feature is enabled.
#[cfg(feature = "dangerous-logging")]
pub(crate) fn redact(value: &str) -> &str {
	value
}

/// Keeps page content out of log fields unless the `"dangerous-logging"` feature is enabled.
#[cfg(not(feature = "dangerous-logging"))]
pub(crate) fn redact(_value: &str) -> &str {
	"<redacted>"
}
