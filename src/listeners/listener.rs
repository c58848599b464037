//! # Registered listener callbacks and dispatch-sequence entries.
//!
//! [`Listener`] wraps the user callback behind an `Arc` so one registration
//! can sit in a bucket, in the cached dispatch snapshot, and in the bus
//! bookkeeping at the same time. Identity for removal is the
//! [`ListenerId`] allocated at wrap time, never the closure address.
//!
//! [`ListenerEntry`] is what the rebuilt dispatch sequence actually holds:
//! either a real listener or a phase marker tagged with a priority. The
//! marker is an explicit variant — dispatch asks
//! [`is_phase_marker`](ListenerEntry::is_phase_marker) rather than
//! inspecting runtime types.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::error::ListenerError;
use crate::events::{Event, Priority};

/// Callback signature stored for every listener.
///
/// Listeners receive the posted event as `&mut dyn Event` and may mutate
/// its cancel/result state; a returned error aborts the post (fail-fast)
/// after the bus notifies its exception handler.
pub type ListenerFn = dyn Fn(&mut dyn Event) -> Result<(), ListenerError> + Send + Sync;

/// Process-wide listener id allocator.
static NEXT_LISTENER_ID: AtomicU64 = AtomicU64::new(0);

/// Stable identity of one registered listener, used for removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

impl ListenerId {
    fn next() -> Self {
        Self(NEXT_LISTENER_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// A registered callback with a stable identity and a diagnostic label.
#[derive(Clone)]
pub struct Listener {
    id: ListenerId,
    label: Arc<str>,
    callback: Arc<ListenerFn>,
}

impl Listener {
    /// Wraps a callback, allocating a fresh [`ListenerId`].
    #[must_use]
    pub fn new(label: impl Into<String>, callback: Arc<ListenerFn>) -> Self {
        Self {
            id: ListenerId::next(),
            label: Arc::from(label.into()),
            callback,
        }
    }

    /// Identity used by unregistration.
    #[must_use]
    pub fn id(&self) -> ListenerId {
        self.id
    }

    /// Human-readable label for logs and error reports.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Delivers the event to the callback.
    pub fn invoke(&self, event: &mut dyn Event) -> Result<(), ListenerError> {
        (self.callback)(event)
    }
}

impl fmt::Debug for Listener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Listener")
            .field("id", &self.id)
            .field("label", &self.label)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for Listener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label)
    }
}

/// One element of a rebuilt dispatch sequence.
#[derive(Clone)]
pub enum ListenerEntry {
    /// Synthetic marker preceding each non-empty priority group. When phase
    /// tracking is enabled, crossing it advances the event's phase; when
    /// disabled it is skipped without side effect.
    Phase(Priority),
    /// A real registered listener.
    Callback(Listener),
}

impl ListenerEntry {
    /// Explicit phase-marker test used by dispatch.
    #[must_use]
    pub fn is_phase_marker(&self) -> bool {
        matches!(self, ListenerEntry::Phase(_))
    }

    /// The wrapped listener, if this entry is one.
    #[must_use]
    pub fn as_listener(&self) -> Option<&Listener> {
        match self {
            ListenerEntry::Callback(listener) => Some(listener),
            ListenerEntry::Phase(_) => None,
        }
    }
}

impl fmt::Display for ListenerEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ListenerEntry::Phase(priority) => write!(f, "<phase {priority}>"),
            ListenerEntry::Callback(listener) => fmt::Display::fmt(listener, f),
        }
    }
}

impl fmt::Debug for ListenerEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ListenerEntry::Phase(priority) => f.debug_tuple("Phase").field(priority).finish(),
            ListenerEntry::Callback(listener) => f.debug_tuple("Callback").field(listener).finish(),
        }
    }
}
