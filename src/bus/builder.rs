//! # Bus construction.
//!
//! [`BusBuilder`] collects the configuration surface of one dispatch
//! domain and builds an [`EventBus`] from it. Defaults:
//!
//! | option                    | default                         |
//! |---------------------------|---------------------------------|
//! | `track_phases`            | `true`                          |
//! | `check_types_on_dispatch` | `false` (or env toggle)         |
//! | `start_shutdown`          | `false`                         |
//! | `base_type`               | [`EventType::root`]             |
//! | `exception_handler`       | log-and-propagate               |
//! | `registry`                | [`EventRegistry::global`]       |
//!
//! The environment variable `EVENTVISOR_CHECK_TYPES_ON_DISPATCH` turns
//! dispatch type checking on for every bus in the process. It is read
//! once, at the first bus construction; values other than `true`/`false`
//! log a warning and default to `false`.

use std::sync::{Arc, OnceLock};

use crate::error::ConfigError;
use crate::events::EventType;
use crate::registry::EventRegistry;

use super::bus::EventBus;
use super::handler::{default_exception_handler, ExceptionHandler};

/// Process-wide dispatch type-check override.
const CHECK_TYPES_ENV_VAR: &str = "EVENTVISOR_CHECK_TYPES_ON_DISPATCH";

/// Reads the env toggle once; unparsable values warn and default to false.
fn check_types_env() -> bool {
    static VALUE: OnceLock<bool> = OnceLock::new();
    *VALUE.get_or_init(|| {
        let Ok(raw) = std::env::var(CHECK_TYPES_ENV_VAR) else {
            return false;
        };
        match raw.trim().to_ascii_lowercase().parse::<bool>() {
            Ok(value) => value,
            Err(_) => {
                tracing::warn!(
                    value = %raw,
                    "failed to parse {CHECK_TYPES_ENV_VAR}, defaulting to false"
                );
                false
            }
        }
    })
}

/// Builder for constructing an [`EventBus`] with optional features.
pub struct BusBuilder {
    track_phases: bool,
    check_types_on_dispatch: bool,
    start_shutdown: bool,
    base_type: EventType,
    exception_handler: Option<ExceptionHandler>,
    registry: Option<Arc<EventRegistry>>,
}

impl BusBuilder {
    /// Creates a builder with the defaults listed in the module docs.
    #[must_use]
    pub fn new() -> Self {
        Self {
            track_phases: true,
            check_types_on_dispatch: false,
            start_shutdown: false,
            base_type: EventType::root(),
            exception_handler: None,
            registry: None,
        }
    }

    /// Enables or disables phase tracking: when disabled, phase markers in
    /// the dispatch sequence are skipped and posted events keep a `None`
    /// phase.
    #[must_use]
    pub fn with_track_phases(mut self, track_phases: bool) -> Self {
        self.track_phases = track_phases;
        self
    }

    /// Sets the side-channel handler notified when a listener fails.
    /// The original error still propagates to the poster afterwards.
    #[must_use]
    pub fn with_exception_handler(mut self, handler: ExceptionHandler) -> Self {
        self.exception_handler = Some(handler);
        self
    }

    /// Builds the bus already shut down; [`EventBus::start`] brings it up.
    #[must_use]
    pub fn start_shutdown(mut self) -> Self {
        self.start_shutdown = true;
        self
    }

    /// Makes `post` verify that posted events are subtypes of the bus base
    /// type. Also enabled process-wide by the env toggle (see module docs).
    #[must_use]
    pub fn check_types_on_dispatch(mut self) -> Self {
        self.check_types_on_dispatch = true;
        self
    }

    /// Constrains this bus to events that are subtypes of `base_type`.
    /// Must be a marker descriptor (or the root); enforced by `build`.
    #[must_use]
    pub fn with_base_type(mut self, base_type: EventType) -> Self {
        self.base_type = base_type;
        self
    }

    /// Shares an explicit registry instead of the process-global one.
    /// Buses on separate registries have fully independent node graphs,
    /// which is how tests isolate themselves.
    #[must_use]
    pub fn with_registry(mut self, registry: Arc<EventRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Builds the bus, allocating its id and growing every existing
    /// registry node with a listener-set slot for it.
    ///
    /// # Errors
    /// [`ConfigError::NonMarkerBaseType`] if the configured base type is a
    /// concrete (non-marker, non-root) event type.
    pub fn build(self) -> Result<EventBus, ConfigError> {
        if !self.base_type.is_root() && !self.base_type.is_marker() {
            return Err(ConfigError::NonMarkerBaseType {
                base_type: self.base_type.name(),
            });
        }
        let registry = self.registry.unwrap_or_else(EventRegistry::global);
        let handler = self
            .exception_handler
            .unwrap_or_else(default_exception_handler);
        Ok(EventBus::new_internal(
            registry,
            self.track_phases,
            self.check_types_on_dispatch || check_types_env(),
            self.start_shutdown,
            self.base_type,
            handler,
        ))
    }
}

impl Default for BusBuilder {
    fn default() -> Self {
        Self::new()
    }
}
