//! # eventvisor
//!
//! **Eventvisor** is an in-process publish/subscribe event-dispatch
//! library for Rust.
//!
//! It provides typed events arranged in an inheritance tree, listeners
//! ordered by priority, cancellation and tri-state results, filterable
//! generic events, and any number of independent buses sharing one
//! lazily built listener registry. Dispatch is synchronous: the posting
//! thread runs every listener in a deterministic order.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!  ┌─────────────┐       ┌─────────────┐      ┌──────────────────┐
//!  │ EventInfo   │ ◄──── │ EventInfo   │      │  Subscriber      │
//!  │ ("Base")    │ parent│ ("Derived") │      │  (user target)   │
//!  └──────┬──────┘       └──────┬──────┘      └────────┬─────────┘
//!         │ mirrors             │ mirrors              │ register
//!         ▼                     ▼                      ▼
//! ┌───────────────────────────────────────────────────────────────┐
//! │  EventRegistry (shared across buses)                          │
//! │  - ListenerNode per event type, parent-linked                 │
//! │  - ListenerSet per (type, bus): 5 priority buckets +          │
//! │    cached dispatch snapshot (dirty flag, atomic publish)      │
//! │  - memoized per-type metadata (cancelable / result / generic) │
//! └──────┬─────────────────────────────────────────┬──────────────┘
//!        │ ordered(bus 0)                          │ ordered(bus 1)
//!        ▼                                         ▼
//! ┌──────────────────┐                    ┌──────────────────┐
//! │  EventBus #0     │                    │  EventBus #1     │
//! │  post(event) ────┼─► listeners        │  (independent    │
//! │  highest→lowest, │    of the event's  │   listener sets, │
//! │  subtype first   │    type + parents  │   same registry) │
//! └──────────────────┘                    └──────────────────┘
//! ```
//!
//! ### Dispatch order
//! For a posted event, listeners registered for its exact type *and* for
//! every ancestor type are merged into one sequence:
//! - priority tiers run `Highest → High → Normal → Low → Lowest`;
//! - within a tier, subtype listeners run before supertype listeners;
//! - each non-empty tier is preceded by a phase marker that advances the
//!   event's phase (when phase tracking is on);
//! - a listener failure stops the post immediately, notifies the bus's
//!   exception handler, and propagates the error to the poster.
//!
//! ## Features
//! | Feature | Description |
//! |---------|-------------|
//! | Typed event tree | `static` [`EventInfo`] descriptors with parent links; capability flags inherit down the chain |
//! | Priorities & phases | Five [`Priority`] tiers; the event records the phase currently dispatching |
//! | Cancellation & results | Opt-in per type; posting reports whether the event ended canceled |
//! | Generic events | [`GenericEvent`] instances carry a [`FilterKey`]; listeners see only matching keys |
//! | Multiple buses | Independent [`EventBus`] domains over one shared [`EventRegistry`] |
//! | Cached ordering | Dispatch order rebuilt lazily on mutation, read lock-free otherwise |
//! | Failure side channel | [`ExceptionHandler`] sees the full snapshot and failing index; errors still propagate |
//! | Lifecycle | `start` / `shutdown` toggle; a shut-down bus ignores posts |
//!
//! ## Usage
//! ```rust
//! use std::any::Any;
//! use eventvisor::{
//!     Event, EventBus, EventInfo, EventRegistry, EventState, EventType, Priority,
//! };
//!
//! static TICK: EventInfo = EventInfo::new("TickEvent").cancelable();
//!
//! struct TickEvent {
//!     state: EventState,
//!     count: u32,
//! }
//!
//! impl Event for TickEvent {
//!     fn event_type(&self) -> EventType {
//!         EventType::new(&TICK)
//!     }
//!     fn state(&self) -> &EventState {
//!         &self.state
//!     }
//!     fn state_mut(&mut self) -> &mut EventState {
//!         &mut self.state
//!     }
//!     fn as_any(&self) -> &dyn Any {
//!         self
//!     }
//!     fn as_any_mut(&mut self) -> &mut dyn Any {
//!         self
//!     }
//! }
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let bus = EventBus::builder()
//!         .with_registry(EventRegistry::new())
//!         .build()?;
//!
//!     bus.add_listener_at(EventType::new(&TICK), Priority::High, |event| {
//!         if let Some(tick) = event.downcast_mut::<TickEvent>() {
//!             tick.count += 1;
//!         }
//!         Ok(())
//!     })?;
//!
//!     let mut event = TickEvent {
//!         state: EventState::new(),
//!         count: 0,
//!     };
//!     let canceled = bus.post(&mut event)?;
//!     assert!(!canceled);
//!     assert_eq!(event.count, 1);
//!     Ok(())
//! }
//! ```
//!
//! ## Modules
//! - [`events`](crate::events) — descriptors, the [`Event`] trait, state,
//!   priorities, generic events
//! - [`listeners`](crate::listeners) — listener handles, subscriptions,
//!   the [`Subscriber`] trait
//! - [`registry`](crate::registry) — shared listener storage and the
//!   cached dispatch order
//! - [`bus`](crate::bus) — construction, dispatch, lifecycle, failure
//!   reporting
//! - [`error`](crate::error) — the crate's error types

pub mod bus;
pub mod error;
pub mod events;
pub mod listeners;
pub mod registry;

pub use bus::{BusBuilder, DispatchErrorMessage, EventBus, ExceptionHandler};
pub use error::{ConfigError, ListenerError, PostError, RegisterError, RegistryError};
pub use events::{
    generic_event_type, Event, EventInfo, EventResult, EventState, EventType, FilterKey,
    GenericEvent, Priority,
};
pub use listeners::{Listener, ListenerEntry, ListenerFn, ListenerId, Subscriber, Subscription};
pub use registry::{EventRegistry, ListenerNode, ListenerSet, TypeMeta};
