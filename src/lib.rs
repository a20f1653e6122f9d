//! A minimal client-side UI framework: a virtual-node model, a diff/patch reconciliation
//! engine over an in-process live tree, an observable state store, an event-dispatch layer
//! and a hash-based router.
//!
//! The flow per state transition: the store notifies its subscriber, the subscriber rebuilds a
//! full virtual tree from current state, [`diff::diff`] compares it against the retained old
//! tree, [`patch::apply`] mutates the live root accordingly, and the new tree becomes the old
//! one for the next cycle. [`app::App`] packages that loop.
//!
//! Everything is single-threaded and synchronous; no operation blocks or spawns work. No error
//! in this crate is fatal: rendering and patching degrade to logged, best-effort fallbacks,
//! with a stale or partially updated live tree as the worst case.

#![warn(clippy::pedantic)]

pub mod app;
pub mod diff;
pub mod dom;
pub mod event;
pub mod node;
pub mod patch;
pub mod render;
pub mod router;
pub mod store;

pub use app::App;
pub use diff::{diff, AttrPatch, Patch};
pub use dom::{LiveHandle, LiveNode};
pub use event::{dispatch, Event, Listener};
pub use node::{attr, flag, listener, AttrValue, VAttribute, VChildren, VElement, VNode};
pub use patch::apply;
pub use render::{render, render_sequence};
pub use router::Router;
pub use store::{Store, Subscription};
