//! # The event trait and per-instance dispatch state.
//!
//! [`Event`] is the object-safe trait every postable value implements. An
//! event instance is transient: it is created immediately before a
//! [`post`](crate::EventBus::post), mutated by listeners and phase markers
//! during that one call, and discarded afterwards. The bus never retains it.
//!
//! ## State carried on the instance
//! - **cancel flag** — meaningful only when the event's type is declared
//!   cancelable; once set, later listeners that did not opt into canceled
//!   events are skipped (iteration itself continues).
//! - **result** — a tri-state [`EventResult`], meaningful only for types
//!   declared `has_result`.
//! - **phase** — the [`Priority`] tier currently being dispatched,
//!   strictly increasing within one post.
//!
//! ## Subtype composition
//! Rust has no class inheritance, so subtype events embed their supertype
//! and expose it through [`Event::parent_event`] /
//! [`Event::parent_event_mut`]. The shared [`EventState`] lives in the
//! outermost base struct and accessors delegate to it, so a listener
//! working through a supertype view observes the same cancel/result/phase
//! state as the poster:
//!
//! ```rust
//! use eventvisor::{Event, EventInfo, EventState, EventType};
//! use std::any::Any;
//!
//! static BASE: EventInfo = EventInfo::new("BaseEvent").cancelable();
//! static CHILD: EventInfo = EventInfo::new("ChildEvent").parent(EventType::new(&BASE));
//!
//! #[derive(Default)]
//! struct BaseEvent { state: EventState }
//!
//! impl Event for BaseEvent {
//!     fn event_type(&self) -> EventType { EventType::new(&BASE) }
//!     fn state(&self) -> &EventState { &self.state }
//!     fn state_mut(&mut self) -> &mut EventState { &mut self.state }
//!     fn as_any(&self) -> &dyn Any { self }
//!     fn as_any_mut(&mut self) -> &mut dyn Any { self }
//! }
//!
//! #[derive(Default)]
//! struct ChildEvent { base: BaseEvent }
//!
//! impl Event for ChildEvent {
//!     fn event_type(&self) -> EventType { EventType::new(&CHILD) }
//!     fn state(&self) -> &EventState { self.base.state() }
//!     fn state_mut(&mut self) -> &mut EventState { self.base.state_mut() }
//!     fn as_any(&self) -> &dyn Any { self }
//!     fn as_any_mut(&mut self) -> &mut dyn Any { self }
//!     fn parent_event(&self) -> Option<&dyn Event> { Some(&self.base) }
//!     fn parent_event_mut(&mut self) -> Option<&mut dyn Event> { Some(&mut self.base) }
//! }
//! ```

use std::any::Any;

use super::generic::FilterKey;
use super::info::EventType;
use super::priority::Priority;

/// Tri-state outcome carried by events whose type declares `has_result`.
///
/// Interpretation is up to the individual event type; the bus only stores
/// and returns it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum EventResult {
    Deny,
    #[default]
    Default,
    Allow,
}

/// Mutable per-instance dispatch state, embedded in every event struct.
#[derive(Debug, Clone, Default)]
pub struct EventState {
    canceled: bool,
    result: EventResult,
    phase: Option<Priority>,
}

impl EventState {
    /// Fresh state: not canceled, [`EventResult::Default`], no phase.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current cancel flag.
    #[must_use]
    pub fn is_canceled(&self) -> bool {
        self.canceled
    }

    /// Current result value.
    #[must_use]
    pub fn result(&self) -> EventResult {
        self.result
    }

    /// Priority tier last entered during dispatch, if phase tracking ran.
    #[must_use]
    pub fn phase(&self) -> Option<Priority> {
        self.phase
    }

    pub(crate) fn set_canceled(&mut self, canceled: bool) {
        self.canceled = canceled;
    }

    pub(crate) fn set_result(&mut self, result: EventResult) {
        self.result = result;
    }

    pub(crate) fn set_phase(&mut self, phase: Priority) {
        self.phase = Some(phase);
    }
}

/// An event value that can be posted on an [`EventBus`](crate::EventBus).
///
/// Implementations declare their type through a static
/// [`EventInfo`](crate::EventInfo) descriptor and embed an [`EventState`].
/// See the module docs for the composition pattern used to model subtypes.
pub trait Event: Any {
    /// The declared type of this event.
    fn event_type(&self) -> EventType;

    /// Shared per-instance dispatch state.
    fn state(&self) -> &EventState;

    /// Mutable access to the dispatch state.
    fn state_mut(&mut self) -> &mut EventState;

    /// Upcast to `Any` for downcasting to the concrete type.
    fn as_any(&self) -> &dyn Any;

    /// Mutable upcast to `Any`.
    fn as_any_mut(&mut self) -> &mut dyn Any;

    /// View of this event as its embedded supertype, if it has one.
    fn parent_event(&self) -> Option<&dyn Event> {
        None
    }

    /// Mutable view of this event as its embedded supertype.
    fn parent_event_mut(&mut self) -> Option<&mut dyn Event> {
        None
    }

    /// Runtime filter key, for members of the generic event family.
    fn filter_key(&self) -> Option<FilterKey> {
        None
    }
}

impl dyn Event {
    /// True if this event's type (or an ancestor) is declared cancelable.
    #[must_use]
    pub fn is_cancelable(&self) -> bool {
        self.event_type().is_cancelable()
    }

    /// Current cancel flag. Always `false` for non-cancelable types.
    #[must_use]
    pub fn is_canceled(&self) -> bool {
        self.state().is_canceled()
    }

    /// Sets the cancel flag.
    ///
    /// # Panics
    /// Panics if the event's type is not cancelable; calling this on such
    /// a type is a contract violation by the listener, not a runtime
    /// condition the poster can trigger.
    pub fn set_canceled(&mut self, canceled: bool) {
        assert!(
            self.is_cancelable(),
            "attempted to cancel non-cancelable event type `{}`",
            self.event_type()
        );
        self.state_mut().set_canceled(canceled);
    }

    /// True if this event's type (or an ancestor) carries a result.
    #[must_use]
    pub fn has_result(&self) -> bool {
        self.event_type().has_result()
    }

    /// Current result value.
    #[must_use]
    pub fn result(&self) -> EventResult {
        self.state().result()
    }

    /// Sets the result value.
    ///
    /// # Panics
    /// Panics if the event's type does not carry a result.
    pub fn set_result(&mut self, result: EventResult) {
        assert!(
            self.has_result(),
            "attempted to set result on event type `{}` which does not carry one",
            self.event_type()
        );
        self.state_mut().set_result(result);
    }

    /// Priority tier currently being dispatched, if phase tracking is on.
    #[must_use]
    pub fn phase(&self) -> Option<Priority> {
        self.state().phase()
    }

    /// Advances the dispatch phase. Called by the bus when it crosses a
    /// phase marker; listeners have no reason to call this.
    ///
    /// # Panics
    /// Panics if `phase` is not strictly later than the current phase.
    /// Phases only move forward within one post; reusing an event instance
    /// across posts trips this on the second post.
    pub fn set_phase(&mut self, phase: Priority) {
        if let Some(current) = self.state().phase() {
            assert!(
                phase > current,
                "attempted to set event phase to `{phase}` when already `{current}`"
            );
        }
        self.state_mut().set_phase(phase);
    }

    /// Downcasts to a concrete event type, walking embedded supertype
    /// views. Succeeds when the event *is* a `T` or embeds one.
    #[must_use]
    pub fn downcast_ref<T: Event>(&self) -> Option<&T> {
        if self.as_any().is::<T>() {
            return self.as_any().downcast_ref::<T>();
        }
        self.parent_event()?.downcast_ref::<T>()
    }

    /// Mutable variant of [`downcast_ref`](Self::downcast_ref).
    #[must_use]
    pub fn downcast_mut<T: Event>(&mut self) -> Option<&mut T> {
        if self.as_any().is::<T>() {
            return self.as_any_mut().downcast_mut::<T>();
        }
        self.parent_event_mut()?.downcast_mut::<T>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::info::EventInfo;

    static CANCELABLE: EventInfo = EventInfo::new("CancelableEvent").cancelable();
    static RESULTFUL: EventInfo = EventInfo::new("ResultfulEvent").has_result();
    static PLAIN: EventInfo = EventInfo::new("PlainEvent");

    struct Stub {
        ty: EventType,
        state: EventState,
    }

    impl Stub {
        fn new(info: &'static EventInfo) -> Self {
            Self {
                ty: EventType::new(info),
                state: EventState::new(),
            }
        }
    }

    impl Event for Stub {
        fn event_type(&self) -> EventType {
            self.ty
        }
        fn state(&self) -> &EventState {
            &self.state
        }
        fn state_mut(&mut self) -> &mut EventState {
            &mut self.state
        }
        fn as_any(&self) -> &dyn Any {
            self
        }
        fn as_any_mut(&mut self) -> &mut dyn Any {
            self
        }
    }

    #[test]
    fn test_cancel_round_trip() {
        let mut ev = Stub::new(&CANCELABLE);
        let ev: &mut dyn Event = &mut ev;
        assert!(ev.is_cancelable());
        assert!(!ev.is_canceled());
        ev.set_canceled(true);
        assert!(ev.is_canceled());
        ev.set_canceled(false);
        assert!(!ev.is_canceled());
    }

    #[test]
    #[should_panic(expected = "non-cancelable")]
    fn test_cancel_on_plain_event_panics() {
        let mut ev = Stub::new(&PLAIN);
        let ev: &mut dyn Event = &mut ev;
        ev.set_canceled(true);
    }

    #[test]
    fn test_result_round_trip() {
        let mut ev = Stub::new(&RESULTFUL);
        let ev: &mut dyn Event = &mut ev;
        assert_eq!(ev.result(), EventResult::Default);
        ev.set_result(EventResult::Allow);
        assert_eq!(ev.result(), EventResult::Allow);
    }

    #[test]
    #[should_panic(expected = "does not carry one")]
    fn test_result_on_plain_event_panics() {
        let mut ev = Stub::new(&PLAIN);
        let ev: &mut dyn Event = &mut ev;
        ev.set_result(EventResult::Deny);
    }

    #[test]
    fn test_phase_is_monotonic() {
        let mut ev = Stub::new(&PLAIN);
        let ev: &mut dyn Event = &mut ev;
        assert_eq!(ev.phase(), None);
        ev.set_phase(Priority::Highest);
        ev.set_phase(Priority::Normal);
        assert_eq!(ev.phase(), Some(Priority::Normal));
    }

    #[test]
    #[should_panic(expected = "attempted to set event phase")]
    fn test_phase_cannot_move_backwards() {
        let mut ev = Stub::new(&PLAIN);
        let ev: &mut dyn Event = &mut ev;
        ev.set_phase(Priority::Normal);
        ev.set_phase(Priority::Normal);
    }
}
