//! # The event bus: registration, dispatch, lifecycle.
//!
//! [`EventBus`] is one independent dispatch domain. Any number of buses
//! coexist in a process; they share the lazily built registry node graph
//! but nothing else — registering on one bus never causes invocation on
//! another.
//!
//! ## Dispatch
//! ```text
//! post(event)
//!   ├─ shutdown? ──────────────► Ok(false), nothing invoked
//!   ├─ type check (optional) ──► Err(InvalidEventType)
//!   ├─ resolve node, load cached dispatch snapshot (atomic, lock-free)
//!   └─ for each entry, in order:
//!        phase marker ─► advance event phase (if phase tracking on)
//!        listener ─────► invoke; on error: notify exception handler
//!                        with (bus, event, snapshot, index, error),
//!                        then return the error — fail-fast
//! ```
//! Posting is synchronous: the calling thread runs every listener, and a
//! listener may itself post (including back onto the same bus), recursing
//! on the same stack. Listeners added while a post is in flight are not
//! guaranteed to be seen by it — the snapshot is taken at call time.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use crate::error::{ListenerError, PostError, RegisterError};
use crate::events::{Event, EventType, FilterKey, Priority};
use crate::listeners::{Listener, ListenerEntry, ListenerFn, ListenerId, Subscriber, Subscription};
use crate::registry::EventRegistry;

use super::builder::BusBuilder;
use super::handler::ExceptionHandler;

/// Bookkeeping for one registered target.
///
/// Holds the target's `Arc` for the lifetime of the registration: the
/// bookkeeping key is the allocation address, so the allocation must stay
/// pinned until `unregister` or a recycled address would alias a live
/// entry and swallow the new target's registration.
struct TargetEntry {
    _target: Arc<dyn Subscriber>,
    ids: Vec<ListenerId>,
}

/// One independent pub/sub dispatch domain.
///
/// Built via [`EventBus::builder`]. Cheap to share behind an `Arc`; all
/// methods take `&self`.
pub struct EventBus {
    id: usize,
    registry: Arc<EventRegistry>,
    /// target key → listener ids created for it; supports bulk unregister.
    targets: DashMap<usize, TargetEntry>,
    track_phases: bool,
    check_types_on_dispatch: bool,
    base_type: EventType,
    exception_handler: ExceptionHandler,
    shutdown: AtomicBool,
}

impl EventBus {
    /// Starts building a bus.
    #[must_use]
    pub fn builder() -> BusBuilder {
        BusBuilder::new()
    }

    pub(crate) fn new_internal(
        registry: Arc<EventRegistry>,
        track_phases: bool,
        check_types_on_dispatch: bool,
        start_shutdown: bool,
        base_type: EventType,
        exception_handler: ExceptionHandler,
    ) -> Self {
        let id = registry.allocate_bus_id();
        Self {
            id,
            registry,
            targets: DashMap::new(),
            track_phases,
            check_types_on_dispatch,
            base_type,
            exception_handler,
            shutdown: AtomicBool::new(start_shutdown),
        }
    }

    /// This bus's id, unique within its registry.
    #[must_use]
    pub fn id(&self) -> usize {
        self.id
    }

    /// The base type all events on this bus must be subtypes of.
    #[must_use]
    pub fn base_type(&self) -> EventType {
        self.base_type
    }

    // ---- Registration ----

    /// Registers every listener a target declares.
    ///
    /// Idempotent per target: a second call for an already-registered
    /// target is a no-op. All declared subscriptions are validated before
    /// any is installed — on failure nothing is registered for the target.
    ///
    /// # Errors
    /// [`RegisterError::NotAssignable`] if a declared event type is not a
    /// subtype of the bus base type; [`RegisterError::Resolution`] if a
    /// declared event type's node cannot be resolved.
    pub fn register(&self, target: &Arc<dyn Subscriber>) -> Result<(), RegisterError> {
        let key = Self::target_key(target);
        if self.targets.contains_key(&key) {
            return Ok(());
        }

        let subscriptions = Arc::clone(target).subscriptions();
        for subscription in &subscriptions {
            self.ensure_assignable(subscription.event_type(), subscription.label())?;
            // Resolve every node up front so a malformed type also fails
            // the whole call before anything is installed.
            self.registry.node(subscription.event_type())?;
        }

        let mut ids = Vec::with_capacity(subscriptions.len());
        for subscription in subscriptions {
            ids.push(self.install(subscription)?);
        }

        match self.targets.entry(key) {
            Entry::Vacant(slot) => {
                slot.insert(TargetEntry {
                    _target: Arc::clone(target),
                    ids,
                });
            }
            Entry::Occupied(_) => {
                // Lost a race with a concurrent register of the same
                // target; the published registration wins.
                for id in ids {
                    self.registry.unregister_all(self.id, id);
                }
            }
        }
        Ok(())
    }

    /// Removes every listener previously created for the target, across
    /// all registry nodes for this bus. Unknown targets are a no-op;
    /// re-registering afterwards creates fresh listeners.
    pub fn unregister(&self, target: &Arc<dyn Subscriber>) {
        if let Some((_, entry)) = self.targets.remove(&Self::target_key(target)) {
            for id in entry.ids {
                self.registry.unregister_all(self.id, id);
            }
        }
    }

    /// Adds a functional listener at [`Priority::Normal`] that skips
    /// canceled events.
    ///
    /// # Errors
    /// [`RegisterError::GenericEventType`] when `event_type` belongs to
    /// the generic family (use [`add_generic_listener`](Self::add_generic_listener));
    /// otherwise as [`register`](Self::register).
    pub fn add_listener<F>(
        &self,
        event_type: EventType,
        callback: F,
    ) -> Result<ListenerId, RegisterError>
    where
        F: Fn(&mut dyn Event) -> Result<(), ListenerError> + Send + Sync + 'static,
    {
        self.add_listener_with(event_type, Priority::Normal, false, callback)
    }

    /// Adds a functional listener at the given priority that skips
    /// canceled events.
    pub fn add_listener_at<F>(
        &self,
        event_type: EventType,
        priority: Priority,
        callback: F,
    ) -> Result<ListenerId, RegisterError>
    where
        F: Fn(&mut dyn Event) -> Result<(), ListenerError> + Send + Sync + 'static,
    {
        self.add_listener_with(event_type, priority, false, callback)
    }

    /// Adds a functional listener with explicit priority and
    /// receive-canceled flag.
    pub fn add_listener_with<F>(
        &self,
        event_type: EventType,
        priority: Priority,
        receive_canceled: bool,
        callback: F,
    ) -> Result<ListenerId, RegisterError>
    where
        F: Fn(&mut dyn Event) -> Result<(), ListenerError> + Send + Sync + 'static,
    {
        if self.registry.is_generic(event_type) {
            return Err(RegisterError::GenericEventType {
                event_type: event_type.name(),
            });
        }
        if event_type.is_root() {
            tracing::warn!(
                bus_id = self.id,
                "adding a listener for the root event type; it will receive every event on this bus"
            );
        }
        self.install(
            Subscription::new(event_type, std::any::type_name::<F>(), callback)
                .with_priority(priority)
                .with_receive_canceled(receive_canceled),
        )
    }

    /// Adds a listener for a generic (filterable) event type that only
    /// sees instances whose filter key is `FilterKey::of::<Flt>()`.
    /// Runs at [`Priority::Normal`] and skips canceled events.
    pub fn add_generic_listener<Flt, F>(
        &self,
        event_type: EventType,
        callback: F,
    ) -> Result<ListenerId, RegisterError>
    where
        Flt: 'static,
        F: Fn(&mut dyn Event) -> Result<(), ListenerError> + Send + Sync + 'static,
    {
        self.add_generic_listener_with::<Flt, F>(event_type, Priority::Normal, false, callback)
    }

    /// Generic-listener variant with an explicit priority.
    pub fn add_generic_listener_at<Flt, F>(
        &self,
        event_type: EventType,
        priority: Priority,
        callback: F,
    ) -> Result<ListenerId, RegisterError>
    where
        Flt: 'static,
        F: Fn(&mut dyn Event) -> Result<(), ListenerError> + Send + Sync + 'static,
    {
        self.add_generic_listener_with::<Flt, F>(event_type, priority, false, callback)
    }

    /// Generic-listener variant with explicit priority and
    /// receive-canceled flag.
    pub fn add_generic_listener_with<Flt, F>(
        &self,
        event_type: EventType,
        priority: Priority,
        receive_canceled: bool,
        callback: F,
    ) -> Result<ListenerId, RegisterError>
    where
        Flt: 'static,
        F: Fn(&mut dyn Event) -> Result<(), ListenerError> + Send + Sync + 'static,
    {
        self.install(
            Subscription::new(event_type, std::any::type_name::<F>(), callback)
                .with_priority(priority)
                .with_receive_canceled(receive_canceled)
                .with_filter(FilterKey::of::<Flt>()),
        )
    }

    /// Removes a functional listener by the id `add_listener` returned,
    /// scanning every registry node for this bus.
    pub fn remove_listener(&self, id: ListenerId) {
        self.registry.unregister_all(self.id, id);
    }

    // ---- Dispatch ----

    /// Posts an event to every listener registered for its type or an
    /// ancestor type, in priority order.
    ///
    /// Returns `Ok(true)` iff the event's type is cancelable and the event
    /// ended the post canceled. A shut-down bus returns `Ok(false)`
    /// without invoking anything.
    ///
    /// # Errors
    /// [`PostError::InvalidEventType`] when dispatch type checking is
    /// enabled and the event's type is not a subtype of the bus base type;
    /// [`PostError::Listener`] when a listener fails (the exception
    /// handler has already been notified; later listeners were skipped);
    /// [`PostError::Resolution`] when the event type's node cannot be
    /// resolved.
    pub fn post(&self, event: &mut dyn Event) -> Result<bool, PostError> {
        self.post_with(event, |listener, event| listener.invoke(event))
    }

    /// Posts with a custom invoker wrapping every listener invocation
    /// (tracing, timing, ...). Ordering and error semantics are identical
    /// to [`post`](Self::post); phase markers are not passed to the
    /// invoker.
    pub fn post_with<D>(&self, event: &mut dyn Event, mut invoker: D) -> Result<bool, PostError>
    where
        D: FnMut(&Listener, &mut dyn Event) -> Result<(), ListenerError>,
    {
        if self.shutdown.load(Ordering::Acquire) {
            return Ok(false);
        }

        let event_type = event.event_type();
        if self.check_types_on_dispatch && !event_type.extends(self.base_type) {
            return Err(PostError::InvalidEventType {
                event_type: event_type.name(),
                base_type: self.base_type.name(),
            });
        }

        let entries = self.registry.node(event_type)?.ordered(self.id);
        for (index, entry) in entries.iter().enumerate() {
            match entry {
                ListenerEntry::Phase(priority) => {
                    if self.track_phases {
                        event.set_phase(*priority);
                    }
                }
                ListenerEntry::Callback(listener) => {
                    if let Err(error) = invoker(listener, event) {
                        (self.exception_handler)(self, &*event, &entries, index, &error);
                        return Err(PostError::Listener {
                            index,
                            source: error,
                        });
                    }
                }
            }
        }

        Ok(self.registry.is_cancelable(event_type) && event.state().is_canceled())
    }

    // ---- Lifecycle ----

    /// Transitions to `Started`; posts are delivered again. Idempotent.
    pub fn start(&self) {
        self.shutdown.store(false, Ordering::Release);
    }

    /// Transitions to `Shutdown`; every subsequent post is a silent no-op
    /// until [`start`](Self::start). Idempotent.
    pub fn shutdown(&self) {
        tracing::warn!(
            bus_id = self.id,
            "event bus shutting down; future events will not be posted"
        );
        self.shutdown.store(true, Ordering::Release);
    }

    /// True while the bus ignores posts.
    #[must_use]
    pub fn is_shutdown(&self) -> bool {
        self.shutdown.load(Ordering::Acquire)
    }

    // ---- Internals ----

    /// Identity key of a registration target: the address of its shared
    /// allocation, stable for the lifetime of the `Arc`.
    fn target_key(target: &Arc<dyn Subscriber>) -> usize {
        Arc::as_ptr(target) as *const () as usize
    }

    fn ensure_assignable(&self, event_type: EventType, label: &str) -> Result<(), RegisterError> {
        if !self.base_type.is_root() && !event_type.extends(self.base_type) {
            return Err(RegisterError::NotAssignable {
                label: label.to_owned(),
                event_type: event_type.name(),
                base_type: self.base_type.name(),
            });
        }
        Ok(())
    }

    /// Validates one subscription, wraps its callback with the cancel and
    /// filter gates, and inserts it into this bus's listener set on the
    /// event type's node.
    fn install(&self, subscription: Subscription) -> Result<ListenerId, RegisterError> {
        let (event_type, priority, receive_canceled, filter, label, callback) =
            subscription.into_parts();
        self.ensure_assignable(event_type, &label)?;

        let listener = Listener::new(label, Self::guarded(receive_canceled, filter, callback));
        let id = listener.id();
        self.registry
            .node(event_type)?
            .register(self.id, priority, listener);
        Ok(id)
    }

    /// Wraps a callback so canceled events reach it only when it opted in,
    /// and (for generic listeners) only matching filter keys pass.
    fn guarded(
        receive_canceled: bool,
        filter: Option<FilterKey>,
        callback: Arc<ListenerFn>,
    ) -> Arc<ListenerFn> {
        Arc::new(move |event: &mut dyn Event| {
            if let Some(expected) = filter {
                if event.filter_key() != Some(expected) {
                    return Ok(());
                }
            }
            if !receive_canceled && event.is_cancelable() && event.is_canceled() {
                return Ok(());
            }
            callback(event)
        })
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("id", &self.id)
            .field("base_type", &self.base_type)
            .field("track_phases", &self.track_phases)
            .field("check_types_on_dispatch", &self.check_types_on_dispatch)
            .field("shutdown", &self.shutdown.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}
