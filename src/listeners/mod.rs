//! Listener callbacks, dispatch-sequence entries and declarative discovery.
//!
//! ## Contents
//! - [`Listener`], [`ListenerId`], [`ListenerFn`] — wrapped callbacks with
//!   stable identities
//! - [`ListenerEntry`] — listener-or-phase-marker elements of a dispatch
//!   snapshot
//! - [`Subscriber`], [`Subscription`] — the discovery contract consumed by
//!   [`EventBus::register`](crate::EventBus::register)

mod listener;
mod subscriber;

pub use listener::{Listener, ListenerEntry, ListenerFn, ListenerId};
pub use subscriber::{Subscriber, Subscription};
