//! # Dispatch failure reporting.
//!
//! When a listener fails during a post, the bus notifies its
//! [`ExceptionHandler`] with the full dispatch context — the bus, the
//! event, the complete ordered snapshot, the failing index and the error —
//! and then surfaces the same error to the poster. The handler is a side
//! channel: it cannot mask, replace or suppress the original error.
//!
//! The default handler logs a [`DispatchErrorMessage`], a multi-line dump
//! of the snapshot with the failing listener called out by index.

use std::fmt;
use std::sync::Arc;

use crate::error::ListenerError;
use crate::events::Event;
use crate::listeners::ListenerEntry;

use super::bus::EventBus;

/// Side-channel callback invoked when a listener fails during a post.
///
/// Arguments: the posting bus, the event being dispatched, the full
/// ordered listener snapshot, the index of the failing entry, and the
/// error. After the handler returns, the original error propagates to the
/// poster unchanged.
pub type ExceptionHandler =
    Arc<dyn Fn(&EventBus, &dyn Event, &[ListenerEntry], usize, &ListenerError) + Send + Sync>;

/// Snapshot of the bus state at the moment a listener failed, with a
/// log-friendly `Display` implementation.
pub struct DispatchErrorMessage<'a> {
    event: &'a dyn Event,
    entries: &'a [ListenerEntry],
    index: usize,
    error: &'a ListenerError,
}

impl<'a> DispatchErrorMessage<'a> {
    #[must_use]
    pub fn new(
        event: &'a dyn Event,
        entries: &'a [ListenerEntry],
        index: usize,
        error: &'a ListenerError,
    ) -> Self {
        Self {
            event,
            entries,
            index,
            error,
        }
    }

    /// Index of the failing entry within [`listeners`](Self::listeners).
    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }

    /// The complete ordered snapshot that was being dispatched.
    #[must_use]
    pub fn listeners(&self) -> &[ListenerEntry] {
        self.entries
    }

    /// The failing listener's error.
    #[must_use]
    pub fn error(&self) -> &ListenerError {
        self.error
    }
}

impl fmt::Display for DispatchErrorMessage<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "exception caught during firing event `{}`: {}",
            self.event.event_type(),
            self.error
        )?;
        writeln!(f, "\tindex: {}", self.index)?;
        writeln!(f, "\tlisteners:")?;
        for (i, entry) in self.entries.iter().enumerate() {
            writeln!(f, "\t\t{i}: {entry}")?;
        }
        Ok(())
    }
}

/// Log-and-propagate: the handler installed when a builder sets none.
pub(crate) fn default_exception_handler() -> ExceptionHandler {
    Arc::new(|bus, event, entries, index, error| {
        tracing::error!(
            bus_id = bus.id(),
            "{}",
            DispatchErrorMessage::new(event, entries, index, error)
        );
    })
}
