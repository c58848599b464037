//! # Filterable ("generic") events.
//!
//! A generic event carries a runtime [`FilterKey`] in addition to its event
//! type, letting listeners subscribe to a subset of instances of one type.
//! Listeners for this family must be added through
//! [`add_generic_listener`](crate::EventBus::add_generic_listener), which
//! installs an equality predicate on the key; instances with a different
//! key are skipped silently.
//!
//! [`GenericEvent<F>`] is the ready-made family member: all of its
//! monomorphizations share a single descriptor (and therefore a single
//! registry node), and the per-instance key does the narrowing. Custom
//! event types join the family by declaring
//! [`EventInfo::generic`](crate::EventInfo::generic) and overriding
//! [`Event::filter_key`](crate::Event::filter_key).

use std::any::{Any, TypeId};
use std::marker::PhantomData;

use super::event::{Event, EventState};
use super::info::{EventInfo, EventType};

/// Runtime filter value of a generic event, keyed by a Rust type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FilterKey(TypeId);

impl FilterKey {
    /// The key identifying filter type `F`.
    #[must_use]
    pub fn of<F: 'static>() -> Self {
        Self(TypeId::of::<F>())
    }
}

/// Shared descriptor for every `GenericEvent<F>` monomorphization.
///
/// Rust does not allow a `static` per generic instantiation, so the whole
/// family lives under one registry node; filter predicates select within it.
static GENERIC_EVENT: EventInfo = EventInfo::new("GenericEvent").generic();

/// Returns the event type shared by the `GenericEvent` family.
#[must_use]
pub fn generic_event_type() -> EventType {
    EventType::new(&GENERIC_EVENT)
}

/// A plain filterable event, narrowed by the type parameter `F`.
pub struct GenericEvent<F: 'static> {
    state: EventState,
    _filter: PhantomData<fn() -> F>,
}

impl<F: 'static> GenericEvent<F> {
    /// Creates an instance whose filter key is `FilterKey::of::<F>()`.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: EventState::new(),
            _filter: PhantomData,
        }
    }
}

impl<F: 'static> Default for GenericEvent<F> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: 'static> Event for GenericEvent<F> {
    fn event_type(&self) -> EventType {
        generic_event_type()
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

    fn filter_key(&self) -> Option<FilterKey> {
        Some(FilterKey::of::<F>())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_key_distinguishes_types() {
        assert_eq!(FilterKey::of::<String>(), FilterKey::of::<String>());
        assert_ne!(FilterKey::of::<String>(), FilterKey::of::<u32>());
    }

    #[test]
    fn test_generic_event_reports_its_key() {
        let ev = GenericEvent::<Vec<String>>::new();
        let ev: &dyn Event = &ev;
        assert_eq!(ev.filter_key(), Some(FilterKey::of::<Vec<String>>()));
        assert!(ev.event_type().is_generic());
    }

    #[test]
    fn test_family_shares_one_event_type() {
        let a = GenericEvent::<String>::new();
        let b = GenericEvent::<u32>::new();
        assert_eq!(a.event_type(), b.event_type());
    }
}
