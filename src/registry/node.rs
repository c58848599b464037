//! # Per-event-type registry nodes.
//!
//! One [`ListenerNode`] exists per [`EventType`], created on first
//! reference by the [`EventRegistry`](crate::registry::EventRegistry). The
//! node graph is a forest exactly mirroring the event-type inheritance
//! tree; a node's parent link is fixed at creation and never changes.
//!
//! Each node holds one [`ListenerSet`] per bus id, indexed by id. The
//! vector grows when a new bus is built ([`resize`](ListenerNode::resize))
//! and every new slot is linked once to the parent node's set for the same
//! id, so listener inheritance stays per-bus.

use std::sync::Arc;

use parking_lot::RwLock;

use crate::events::{EventType, Priority};
use crate::listeners::{Listener, ListenerEntry, ListenerId};

use super::set::ListenerSet;

/// Listener storage for one event type across all buses.
pub struct ListenerNode {
    event_type: EventType,
    /// Registry node of the parent event type, not the type itself.
    parent: Option<Arc<ListenerNode>>,
    /// One set per bus id; grown by `resize`, never shrunk.
    sets: RwLock<Vec<Arc<ListenerSet>>>,
}

impl ListenerNode {
    pub(crate) fn new(event_type: EventType, parent: Option<Arc<ListenerNode>>) -> Self {
        Self {
            event_type,
            parent,
            sets: RwLock::new(Vec::new()),
        }
    }

    /// The event type this node stores listeners for.
    #[must_use]
    pub fn event_type(&self) -> EventType {
        self.event_type
    }

    /// Grows the per-bus set vector to `max` slots, parent first so each
    /// new slot can link to the parent's set for the same bus id. Slots are
    /// linked exactly once, at creation. A `max` at or below the current
    /// width is a no-op.
    pub(crate) fn resize(&self, max: usize) {
        if let Some(parent) = &self.parent {
            parent.resize(max);
        }
        let mut sets = self.sets.write();
        while sets.len() < max {
            let set = match &self.parent {
                Some(parent) => ListenerSet::with_parent(&parent.set(sets.len())),
                None => ListenerSet::new(),
            };
            sets.push(set);
        }
    }

    /// The set for one bus id. The registry sizes every node up to the
    /// highest allocated bus id before handing the id out, so the slot is
    /// always present.
    #[must_use]
    pub fn set(&self, bus_id: usize) -> Arc<ListenerSet> {
        Arc::clone(&self.sets.read()[bus_id])
    }

    /// Inserts a listener into this node's set for `bus_id`.
    pub fn register(&self, bus_id: usize, priority: Priority, listener: Listener) {
        self.set(bus_id).register(priority, listener);
    }

    /// Removes a listener from this node's set for `bus_id`, if present.
    pub fn unregister(&self, bus_id: usize, id: ListenerId) -> bool {
        self.set(bus_id).unregister(id)
    }

    /// Merged dispatch order for `bus_id` (see [`ListenerSet::ordered`]).
    #[must_use]
    pub fn ordered(&self, bus_id: usize) -> Arc<Vec<ListenerEntry>> {
        self.set(bus_id).ordered()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventInfo;
    use crate::listeners::ListenerFn;

    static BASE: EventInfo = EventInfo::new("NodeBase");
    static SUB: EventInfo = EventInfo::new("NodeSub").parent(EventType::new(&BASE));

    fn listener(label: &str) -> Listener {
        let noop: Arc<ListenerFn> = Arc::new(|_| Ok(()));
        Listener::new(label, noop)
    }

    #[test]
    fn test_resize_is_idempotent_and_parent_first() {
        let base = Arc::new(ListenerNode::new(EventType::new(&BASE), None));
        let sub = Arc::new(ListenerNode::new(
            EventType::new(&SUB),
            Some(Arc::clone(&base)),
        ));
        sub.resize(2);
        sub.resize(1);
        // Parent grew through the child's resize.
        base.register(1, Priority::Normal, listener("base"));
        assert_eq!(sub.ordered(1).len(), 2);
    }

    #[test]
    fn test_bus_slots_are_isolated() {
        let node = Arc::new(ListenerNode::new(EventType::new(&BASE), None));
        node.resize(2);
        node.register(0, Priority::Normal, listener("bus0"));
        assert_eq!(node.ordered(0).len(), 2);
        assert!(node.ordered(1).is_empty());
    }

    #[test]
    fn test_inheritance_links_are_per_bus() {
        let base = Arc::new(ListenerNode::new(EventType::new(&BASE), None));
        let sub = Arc::new(ListenerNode::new(
            EventType::new(&SUB),
            Some(Arc::clone(&base)),
        ));
        sub.resize(2);
        base.register(0, Priority::Normal, listener("base-bus0"));
        assert_eq!(sub.ordered(0).len(), 2);
        assert!(sub.ordered(1).is_empty());
    }
}
