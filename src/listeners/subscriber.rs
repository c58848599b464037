//! # Declarative listener discovery.
//!
//! [`Subscriber`] is the discovery contract consumed by
//! [`EventBus::register`](crate::EventBus::register): a target describes its
//! listener methods as a manifest of [`Subscription`] entries, each naming
//! the event type, priority, receive-canceled flag and the bound callback.
//! The bus trusts those facts verbatim (the attribute-scanning step of the
//! original runtime lives outside the core) and only validates what it must:
//! base-type assignability against the bus configuration.
//!
//! ## Example (skeleton)
//! ```rust
//! use std::sync::Arc;
//! use eventvisor::{EventInfo, EventType, Priority, Subscriber, Subscription};
//!
//! static TICK: EventInfo = EventInfo::new("TickEvent");
//!
//! struct TickCounter;
//!
//! impl Subscriber for TickCounter {
//!     fn subscriptions(self: Arc<Self>) -> Vec<Subscription> {
//!         vec![
//!             Subscription::new(EventType::new(&TICK), "TickCounter::on_tick", move |_ev| {
//!                 // count the tick...
//!                 Ok(())
//!             })
//!             .with_priority(Priority::High),
//!         ]
//!     }
//! }
//! ```

use std::sync::Arc;

use crate::error::ListenerError;
use crate::events::{Event, EventType, FilterKey, Priority};

use super::listener::ListenerFn;

/// Contract for registration targets.
///
/// `subscriptions` is called once per successful `register` call; the
/// returned entries are validated as a whole and then installed. Targets
/// typically capture `Arc` clones of themselves (or of the state they
/// need) inside the callbacks.
pub trait Subscriber: Send + Sync + 'static {
    /// Declarative manifest of this target's listeners.
    fn subscriptions(self: Arc<Self>) -> Vec<Subscription>;
}

/// One declared listener of a [`Subscriber`].
pub struct Subscription {
    event_type: EventType,
    priority: Priority,
    receive_canceled: bool,
    filter: Option<FilterKey>,
    label: String,
    callback: Arc<ListenerFn>,
}

impl Subscription {
    /// Creates a subscription with default priority ([`Priority::Normal`]),
    /// not receiving canceled events, and no filter.
    ///
    /// `label` names the listener in logs and dispatch error reports;
    /// conventionally `Type::method`.
    #[must_use]
    pub fn new<F>(event_type: EventType, label: impl Into<String>, callback: F) -> Self
    where
        F: Fn(&mut dyn Event) -> Result<(), ListenerError> + Send + Sync + 'static,
    {
        Self {
            event_type,
            priority: Priority::Normal,
            receive_canceled: false,
            filter: None,
            label: label.into(),
            callback: Arc::new(callback),
        }
    }

    /// Sets the invocation priority.
    #[must_use]
    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    /// Opts this listener into receiving already-canceled events.
    #[must_use]
    pub fn with_receive_canceled(mut self, receive_canceled: bool) -> Self {
        self.receive_canceled = receive_canceled;
        self
    }

    /// Restricts this listener to generic events carrying the given key.
    /// Required when `event_type` belongs to the generic family and the
    /// listener wants narrowing; without it the listener sees every
    /// instance of the type.
    #[must_use]
    pub fn with_filter(mut self, filter: FilterKey) -> Self {
        self.filter = Some(filter);
        self
    }

    /// Declared event type.
    #[must_use]
    pub fn event_type(&self) -> EventType {
        self.event_type
    }

    /// Declared priority.
    #[must_use]
    pub fn priority(&self) -> Priority {
        self.priority
    }

    /// Whether canceled events are delivered.
    #[must_use]
    pub fn receive_canceled(&self) -> bool {
        self.receive_canceled
    }

    /// Declared filter key, if any.
    #[must_use]
    pub fn filter(&self) -> Option<FilterKey> {
        self.filter
    }

    /// Diagnostic label.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    pub(crate) fn into_parts(
        self,
    ) -> (
        EventType,
        Priority,
        bool,
        Option<FilterKey>,
        String,
        Arc<ListenerFn>,
    ) {
        (
            self.event_type,
            self.priority,
            self.receive_canceled,
            self.filter,
            self.label,
            self.callback,
        )
    }
}
