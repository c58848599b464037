//! Event data model: descriptors, the event trait, priorities and the
//! filterable family.
//!
//! ## Contents
//! - [`EventInfo`], [`EventType`] — static per-type descriptors forming the
//!   inheritance tree
//! - [`Event`], [`EventState`], [`EventResult`] — the postable trait and
//!   its per-instance dispatch state
//! - [`Priority`] — listener ordering tiers (highest first)
//! - [`FilterKey`], [`GenericEvent`] — runtime-filterable events
//!
//! See `registry/mod.rs` for how descriptors map to listener storage.

mod event;
mod generic;
mod info;
mod priority;

pub use event::{Event, EventResult, EventState};
pub use generic::{generic_event_type, FilterKey, GenericEvent};
pub use info::{EventInfo, EventType};
pub use priority::Priority;

pub(crate) use info::MAX_CHAIN_DEPTH;
