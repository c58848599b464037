//! Error types used by the eventvisor registry and bus.
//!
//! This module defines four error enums, one per failure surface:
//!
//! - [`RegistryError`] — the registry could not resolve a listener node
//!   for an event type (malformed descriptor chain).
//! - [`RegisterError`] — a listener or subscriber failed validation and
//!   nothing was registered for it.
//! - [`ConfigError`] — a [`BusBuilder`](crate::BusBuilder) was given an
//!   invalid configuration.
//! - [`PostError`] — a `post` call failed, either before dispatch
//!   (type check, node resolution) or because a listener returned an error.
//!
//! Listener callbacks report failures as [`ListenerError`], an opaque boxed
//! error. The bus never swallows one: it notifies the exception handler and
//! then surfaces the same error to the poster as [`PostError::Listener`].
//!
//! All enums provide `as_label()` returning a short stable snake_case label
//! for logs/metrics.

use thiserror::Error;

/// Opaque error type produced by listener callbacks.
///
/// Listeners may fail with any error; the bus carries it verbatim back to
/// the poster after notifying the exception handler.
pub type ListenerError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// # Errors produced while resolving listener nodes.
///
/// Raised the first time a malformed event type is referenced, from either
/// a registration call or a post.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum RegistryError {
    /// The descriptor chain for an event type could not be walked to the
    /// root (a cycle, or a chain deeper than the supported maximum).
    #[error("cannot resolve listener node for event type `{event_type}`: {reason}")]
    Resolution {
        /// Name of the offending event type.
        event_type: &'static str,
        /// Human-readable description of what went wrong.
        reason: String,
    },
}

impl RegistryError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            RegistryError::Resolution { .. } => "registry_resolution_failed",
        }
    }
}

/// # Errors produced by listener registration.
///
/// When registering a [`Subscriber`](crate::Subscriber), the whole call
/// fails atomically: no listener of the offending target is inserted.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum RegisterError {
    /// The listener's event type is not a subtype of the bus base type.
    #[error("listener `{label}` takes event type `{event_type}` which is not a subtype of the bus base type `{base_type}`")]
    NotAssignable {
        /// Diagnostic label of the offending listener.
        label: String,
        /// Name of the listener's declared event type.
        event_type: &'static str,
        /// Name of the bus base type.
        base_type: &'static str,
    },

    /// A generic (filterable) event type was passed to a non-generic
    /// registration method.
    #[error("cannot register a listener for generic event type `{event_type}` with add_listener, use add_generic_listener")]
    GenericEventType {
        /// Name of the generic event type.
        event_type: &'static str,
    },

    /// Listener node resolution failed for the declared event type.
    #[error(transparent)]
    Resolution(#[from] RegistryError),
}

impl RegisterError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            RegisterError::NotAssignable { .. } => "register_not_assignable",
            RegisterError::GenericEventType { .. } => "register_generic_event_type",
            RegisterError::Resolution(_) => "register_resolution_failed",
        }
    }
}

/// # Errors produced by [`BusBuilder::build`](crate::BusBuilder::build).
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The configured base type is a concrete event type. Base types must
    /// be marker (capability) descriptors, or the root event type.
    #[error("bus base type `{base_type}` must be a marker event type")]
    NonMarkerBaseType {
        /// Name of the rejected base type.
        base_type: &'static str,
    },
}

impl ConfigError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            ConfigError::NonMarkerBaseType { .. } => "config_non_marker_base_type",
        }
    }
}

/// # Errors produced by posting an event.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum PostError {
    /// Type checking is enabled and the posted event's type is not a
    /// subtype of the bus base type. No listener was invoked.
    #[error("cannot post event of type `{event_type}` to this bus; must be a subtype of `{base_type}`")]
    InvalidEventType {
        /// Name of the posted event's type.
        event_type: &'static str,
        /// Name of the bus base type.
        base_type: &'static str,
    },

    /// A listener failed during dispatch. Listeners after `index` were not
    /// invoked; the exception handler was notified before this was returned.
    #[error("listener at index {index} failed: {source}")]
    Listener {
        /// Position of the failing listener in the dispatch snapshot.
        index: usize,
        /// The error returned by the listener, verbatim.
        source: ListenerError,
    },

    /// Listener node resolution failed for the posted event's type.
    #[error(transparent)]
    Resolution(#[from] RegistryError),
}

impl PostError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            PostError::InvalidEventType { .. } => "post_invalid_event_type",
            PostError::Listener { .. } => "post_listener_failed",
            PostError::Resolution(_) => "post_resolution_failed",
        }
    }

    /// Consumes the error and returns the underlying listener error, if any.
    pub fn into_listener_error(self) -> Option<ListenerError> {
        match self {
            PostError::Listener { source, .. } => Some(source),
            _ => None,
        }
    }
}
