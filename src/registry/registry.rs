//! # Process-scoped event registry.
//!
//! [`EventRegistry`] owns everything shared across buses: the
//! `EventType → ListenerNode` map, the memoized per-type metadata, the
//! master list of every node ever created, and the bus-id allocator. Buses
//! share one registry; [`EventRegistry::global`] is the process-wide
//! default, and tests can build isolated registries with
//! [`EventRegistry::new`].
//!
//! ## Locking discipline
//! - Node and metadata maps sit behind read-preferring `RwLock`s. Misses
//!   compute outside any lock (parent resolution can recurse and, in
//!   principle, be expensive), then re-check under the write lock before
//!   inserting — a race-inserted entry wins and the candidate is dropped.
//! - The master list mutex guards the list and the current bus-slot width
//!   together; it is held only to append, resize or iterate, never while
//!   invoking user code.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};

use parking_lot::{Mutex, RwLock};

use crate::error::RegistryError;
use crate::events::{EventType, MAX_CHAIN_DEPTH};
use crate::listeners::ListenerId;

use super::node::ListenerNode;

/// Memoized per-type capability flags, computed once per registry.
#[derive(Debug, Clone, Copy)]
pub struct TypeMeta {
    /// Type (or an ancestor) is declared cancelable.
    pub cancelable: bool,
    /// Type (or an ancestor) carries a result.
    pub has_result: bool,
    /// Type belongs to the generic (filterable) family.
    pub generic: bool,
}

/// Master node list plus the bus-slot width all nodes are sized to.
/// One mutex for both keeps "every node has `bus_slots` slots" atomic.
struct MasterList {
    nodes: Vec<Arc<ListenerNode>>,
    bus_slots: usize,
}

/// Shared listener-registry state for any number of buses.
pub struct EventRegistry {
    nodes: RwLock<HashMap<EventType, Arc<ListenerNode>>>,
    meta: RwLock<HashMap<EventType, TypeMeta>>,
    master: Mutex<MasterList>,
    next_bus_id: AtomicUsize,
}

impl EventRegistry {
    /// Creates an isolated registry (own node graph, own bus ids).
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            nodes: RwLock::new(HashMap::new()),
            meta: RwLock::new(HashMap::new()),
            master: Mutex::new(MasterList {
                nodes: Vec::new(),
                bus_slots: 0,
            }),
            next_bus_id: AtomicUsize::new(0),
        })
    }

    /// The process-wide default registry, shared by buses built without an
    /// explicit one.
    #[must_use]
    pub fn global() -> Arc<Self> {
        static GLOBAL: OnceLock<Arc<EventRegistry>> = OnceLock::new();
        Arc::clone(GLOBAL.get_or_init(Self::new))
    }

    /// Allocates the next bus id and grows every existing node to provide
    /// a listener set slot for it. Nodes created later are sized to the
    /// new width at creation time.
    pub(crate) fn allocate_bus_id(&self) -> usize {
        let id = self.next_bus_id.fetch_add(1, Ordering::Relaxed);
        let mut master = self.master.lock();
        if id + 1 > master.bus_slots {
            master.bus_slots = id + 1;
            for node in &master.nodes {
                node.resize(id + 1);
            }
        }
        id
    }

    /// Resolves (creating on first reference) the listener node for an
    /// event type. Parents are always resolved before children, so the
    /// node graph mirrors the descriptor tree at all times.
    ///
    /// # Errors
    /// [`RegistryError::Resolution`] if the descriptor chain cannot be
    /// walked to the root within [`MAX_CHAIN_DEPTH`] levels (a cycle among
    /// the declared parents).
    pub fn node(&self, event_type: EventType) -> Result<Arc<ListenerNode>, RegistryError> {
        self.node_at_depth(event_type, 0)
    }

    fn node_at_depth(
        &self,
        event_type: EventType,
        depth: usize,
    ) -> Result<Arc<ListenerNode>, RegistryError> {
        if depth > MAX_CHAIN_DEPTH {
            return Err(RegistryError::Resolution {
                event_type: event_type.name(),
                reason: format!(
                    "descriptor parent chain exceeds {MAX_CHAIN_DEPTH} levels; \
                     the declared parents most likely form a cycle"
                ),
            });
        }

        if let Some(node) = self.nodes.read().get(&event_type) {
            return Ok(Arc::clone(node));
        }

        // Miss: resolve the parent chain before taking any write lock.
        let parent = match event_type.parent() {
            Some(parent_type) => Some(self.node_at_depth(parent_type, depth + 1)?),
            None => None,
        };
        let candidate = Arc::new(ListenerNode::new(event_type, parent));

        let mut nodes = self.nodes.write();
        if let Some(existing) = nodes.get(&event_type) {
            // Lost the race; the published node wins.
            return Ok(Arc::clone(existing));
        }
        {
            let mut master = self.master.lock();
            candidate.resize(master.bus_slots);
            master.nodes.push(Arc::clone(&candidate));
        }
        nodes.insert(event_type, Arc::clone(&candidate));
        Ok(candidate)
    }

    /// Memoized capability flags for an event type.
    #[must_use]
    pub fn meta(&self, event_type: EventType) -> TypeMeta {
        if let Some(meta) = self.meta.read().get(&event_type) {
            return *meta;
        }
        // Chain walk outside the lock; identical on both sides of a race.
        let computed = TypeMeta {
            cancelable: event_type.is_cancelable(),
            has_result: event_type.has_result(),
            generic: event_type.is_generic(),
        };
        *self.meta.write().entry(event_type).or_insert(computed)
    }

    /// True if events of this type can be canceled.
    #[must_use]
    pub fn is_cancelable(&self, event_type: EventType) -> bool {
        self.meta(event_type).cancelable
    }

    /// True if events of this type carry a result.
    #[must_use]
    pub fn has_result(&self, event_type: EventType) -> bool {
        self.meta(event_type).has_result
    }

    /// True if the type belongs to the generic (filterable) family.
    #[must_use]
    pub fn is_generic(&self, event_type: EventType) -> bool {
        self.meta(event_type).generic
    }

    /// Removes one listener from the given bus across *every* node in this
    /// registry. Cost is proportional to the total node count; listener
    /// wrappers may sit under a different node than the caller expects, so
    /// the scan is exhaustive by design of the original contract.
    pub fn unregister_all(&self, bus_id: usize, id: ListenerId) {
        let nodes: Vec<Arc<ListenerNode>> = self.master.lock().nodes.clone();
        for node in nodes {
            node.unregister(bus_id, id);
        }
    }
}
