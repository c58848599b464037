//! # Static event-type descriptors.
//!
//! Every event type declares exactly one [`EventInfo`] in a `static`,
//! describing its place in the event hierarchy and its capabilities
//! (cancelable, carries a result, filterable, marker). [`EventType`] is the
//! cheap `Copy` handle over that descriptor that the rest of the crate keys
//! on; identity, equality and hashing all use the descriptor's address, so
//! a descriptor must live in a `static` (never a promoted `const`).
//!
//! ## Declaring an event type
//! ```rust
//! use eventvisor::{EventInfo, EventType};
//!
//! static TICK: EventInfo = EventInfo::new("TickEvent").cancelable();
//! static SERVER_TICK: EventInfo =
//!     EventInfo::new("ServerTickEvent").parent(EventType::new(&TICK));
//!
//! assert!(EventType::new(&SERVER_TICK).extends(EventType::new(&TICK)));
//! assert!(EventType::new(&SERVER_TICK).is_cancelable()); // inherited
//! ```
//!
//! ## Capability inheritance
//! `cancelable`, `has_result` and `generic` are inherited down the chain:
//! a type has the capability if any ancestor declares it. `marker` is not
//! inherited; it flags abstract capability types (never instantiated,
//! usable as a bus base type).

use std::fmt;
use std::hash::{Hash, Hasher};

/// Static descriptor for one event type.
///
/// Declared once per type in a `static` and referenced through
/// [`EventType`]. All fields are fixed at declaration time.
#[derive(Debug)]
pub struct EventInfo {
    name: &'static str,
    parent: Option<EventType>,
    cancelable: bool,
    has_result: bool,
    generic: bool,
    marker: bool,
}

impl EventInfo {
    /// Creates a descriptor with no parent (a direct child of the root)
    /// and no capabilities.
    #[must_use]
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            parent: None,
            cancelable: false,
            has_result: false,
            generic: false,
            marker: false,
        }
    }

    /// Sets the immediate supertype. Types without an explicit parent hang
    /// directly off [`EventType::root`].
    #[must_use]
    pub const fn parent(mut self, parent: EventType) -> Self {
        self.parent = Some(parent);
        self
    }

    /// Marks events of this type (and its subtypes) cancelable.
    #[must_use]
    pub const fn cancelable(mut self) -> Self {
        self.cancelable = true;
        self
    }

    /// Marks events of this type (and its subtypes) as carrying a result.
    #[must_use]
    pub const fn has_result(mut self) -> Self {
        self.has_result = true;
        self
    }

    /// Marks this type (and its subtypes) as part of the generic
    /// (filterable) event family. Listeners for such types must be added
    /// with `add_generic_listener`.
    #[must_use]
    pub const fn generic(mut self) -> Self {
        self.generic = true;
        self
    }

    /// Marks this type as an abstract marker (capability) type. Marker
    /// types are never instantiated and are the only types accepted as a
    /// bus base type besides the root.
    #[must_use]
    pub const fn marker(mut self) -> Self {
        self.marker = true;
        self
    }
}

/// The root of the event hierarchy. Every chain of `parent` links ends here.
static ROOT: EventInfo = EventInfo::new("Event");

/// Upper bound on descriptor-chain depth; chains longer than this are
/// treated as malformed (almost certainly a cycle).
pub(crate) const MAX_CHAIN_DEPTH: usize = 64;

/// Handle identifying one event type.
///
/// `Copy`, pointer-sized; equality and hashing use the address of the
/// underlying [`EventInfo`].
#[derive(Clone, Copy)]
pub struct EventType(&'static EventInfo);

impl EventType {
    /// Wraps a static descriptor. Usable in `static` initializers.
    #[must_use]
    pub const fn new(info: &'static EventInfo) -> Self {
        Self(info)
    }

    /// The root event type. All events are subtypes of it.
    #[must_use]
    pub fn root() -> Self {
        Self(&ROOT)
    }

    /// Name declared on the descriptor.
    #[must_use]
    pub fn name(self) -> &'static str {
        self.0.name
    }

    /// Immediate supertype. `None` only for the root; types declared
    /// without an explicit parent report the root.
    #[must_use]
    pub fn parent(self) -> Option<EventType> {
        if self == Self::root() {
            return None;
        }
        Some(self.0.parent.unwrap_or_else(Self::root))
    }

    /// True if this type is the hierarchy root.
    #[must_use]
    pub fn is_root(self) -> bool {
        self == Self::root()
    }

    /// True if this type is a marker (capability) descriptor.
    #[must_use]
    pub fn is_marker(self) -> bool {
        self.0.marker
    }

    /// True if `self` is `base` or a (transitive) subtype of it.
    ///
    /// O(depth) pointer chase up the parent chain.
    #[must_use]
    pub fn extends(self, base: EventType) -> bool {
        let mut cur = Some(self);
        let mut hops = 0;
        while let Some(ty) = cur {
            if ty == base {
                return true;
            }
            cur = ty.parent();
            hops += 1;
            if hops > MAX_CHAIN_DEPTH {
                return false;
            }
        }
        false
    }

    /// True if this type or any ancestor is declared cancelable.
    #[must_use]
    pub fn is_cancelable(self) -> bool {
        self.any_in_chain(|info| info.cancelable)
    }

    /// True if this type or any ancestor is declared as carrying a result.
    #[must_use]
    pub fn has_result(self) -> bool {
        self.any_in_chain(|info| info.has_result)
    }

    /// True if this type belongs to the generic (filterable) event family.
    #[must_use]
    pub fn is_generic(self) -> bool {
        self.any_in_chain(|info| info.generic)
    }

    fn any_in_chain(self, pred: impl Fn(&EventInfo) -> bool) -> bool {
        let mut cur = Some(self);
        let mut hops = 0;
        while let Some(ty) = cur {
            if pred(ty.0) {
                return true;
            }
            cur = ty.parent();
            hops += 1;
            if hops > MAX_CHAIN_DEPTH {
                return false;
            }
        }
        false
    }
}

impl PartialEq for EventType {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.0, other.0)
    }
}

impl Eq for EventType {}

impl Hash for EventType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        (self.0 as *const EventInfo).hash(state);
    }
}

impl fmt::Debug for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("EventType").field(&self.0.name).finish()
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    static BASE: EventInfo = EventInfo::new("Base").cancelable();
    static MID: EventInfo = EventInfo::new("Mid").parent(EventType::new(&BASE));
    static LEAF: EventInfo = EventInfo::new("Leaf")
        .parent(EventType::new(&MID))
        .has_result();
    static OTHER: EventInfo = EventInfo::new("Other");

    #[test]
    fn test_parent_chain_ends_at_root() {
        let leaf = EventType::new(&LEAF);
        assert_eq!(leaf.parent(), Some(EventType::new(&MID)));
        assert_eq!(EventType::new(&BASE).parent(), Some(EventType::root()));
        assert_eq!(EventType::root().parent(), None);
    }

    #[test]
    fn test_extends_is_reflexive_and_transitive() {
        let base = EventType::new(&BASE);
        let leaf = EventType::new(&LEAF);
        assert!(leaf.extends(leaf));
        assert!(leaf.extends(base));
        assert!(leaf.extends(EventType::root()));
        assert!(!base.extends(leaf));
        assert!(!EventType::new(&OTHER).extends(base));
    }

    #[test]
    fn test_capabilities_inherit_down_the_chain() {
        let leaf = EventType::new(&LEAF);
        assert!(leaf.is_cancelable());
        assert!(leaf.has_result());
        assert!(!EventType::new(&MID).has_result());
        assert!(!EventType::root().is_cancelable());
        assert!(!EventType::root().has_result());
    }

    #[test]
    fn test_identity_is_by_descriptor_address() {
        assert_eq!(EventType::new(&BASE), EventType::new(&BASE));
        assert_ne!(EventType::new(&BASE), EventType::new(&OTHER));
    }
}
