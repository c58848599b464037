//! # Priority-bucketed listener storage with a cached dispatch order.
//!
//! One [`ListenerSet`] exists per (event type, bus id) pair. It owns five
//! priority buckets plus a lazily rebuilt, atomically published snapshot of
//! the fully merged dispatch order for that pair.
//!
//! ## Inheritance merge
//! A set is linked at creation to the parent event type's set for the same
//! bus id and inherits its listeners, including ones added to the parent
//! later. The effective order for one post is, per priority tier from
//! `Highest` to `Lowest`: a phase marker, then this set's own bucket, then
//! the parent's merged bucket for that tier (recursively up the chain) —
//! so subtype listeners of a tier run before supertype listeners of the
//! same tier, and empty tiers contribute nothing.
//!
//! ## Invalidation and publication
//! ```text
//! register/unregister ──► bucket mutation (under lock)
//!                         └─► dirty = true, recursively on all child sets
//!
//! ordered() ── clean ──► ArcSwap load (no lock)
//!          └── dirty ──► rebuild: parent first, clear dirty, collect
//!                        buckets, publish new snapshot atomically
//! ```
//! The dirty flag is cleared *before* the buckets are read, so a mutation
//! racing a rebuild re-marks the set and the next read rebuilds again. A
//! dispatch that already loaded the old snapshot keeps using it — snapshot
//! at call time, never a half-built sequence.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use arc_swap::ArcSwapOption;
use parking_lot::Mutex;

use crate::events::Priority;
use crate::listeners::{Listener, ListenerEntry, ListenerId};

/// Listener storage for one (event type, bus id) pair.
pub struct ListenerSet {
    /// Same-bus set of the parent event type; fixed at creation.
    parent: Option<Arc<ListenerSet>>,
    /// Same-bus sets of child event types, notified on invalidation.
    children: Mutex<Vec<Weak<ListenerSet>>>,
    buckets: Mutex<[Vec<Listener>; Priority::COUNT]>,
    dirty: AtomicBool,
    cache: ArcSwapOption<Vec<ListenerEntry>>,
}

impl ListenerSet {
    /// Creates a root-level set (no parent to inherit from).
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self {
            parent: None,
            children: Mutex::new(Vec::new()),
            buckets: Mutex::new(Default::default()),
            dirty: AtomicBool::new(true),
            cache: ArcSwapOption::const_empty(),
        })
    }

    /// Creates a set inheriting from `parent` and links it as a child so
    /// parent mutations invalidate this set's cache.
    pub(crate) fn with_parent(parent: &Arc<ListenerSet>) -> Arc<Self> {
        let set = Arc::new(Self {
            parent: Some(Arc::clone(parent)),
            children: Mutex::new(Vec::new()),
            buckets: Mutex::new(Default::default()),
            dirty: AtomicBool::new(true),
            cache: ArcSwapOption::const_empty(),
        });
        parent.children.lock().push(Arc::downgrade(&set));
        set
    }

    /// Appends a listener to the bucket for `priority` and invalidates this
    /// set and every descendant.
    pub fn register(&self, priority: Priority, listener: Listener) {
        self.buckets.lock()[priority.index()].push(listener);
        self.invalidate();
    }

    /// Removes the listener with the given id from whichever buckets hold
    /// it. Returns true (and invalidates) if anything was removed.
    pub fn unregister(&self, id: ListenerId) -> bool {
        let removed = {
            let mut buckets = self.buckets.lock();
            let mut removed = false;
            for bucket in buckets.iter_mut() {
                let before = bucket.len();
                bucket.retain(|listener| listener.id() != id);
                removed |= bucket.len() != before;
            }
            removed
        };
        if removed {
            self.invalidate();
        }
        removed
    }

    /// Returns the merged dispatch order for this set, rebuilding the
    /// cached snapshot if a mutation dirtied it. Clean reads are a single
    /// atomic load.
    pub fn ordered(&self) -> Arc<Vec<ListenerEntry>> {
        if !self.dirty.load(Ordering::Acquire) {
            if let Some(cached) = self.cache.load_full() {
                return cached;
            }
        }
        self.rebuild()
    }

    fn rebuild(&self) -> Arc<Vec<ListenerEntry>> {
        // Parent-before-child: a fresh parent cache keeps rebuild cost
        // proportional to the dirtied subtree.
        if let Some(parent) = &self.parent {
            if parent.dirty.load(Ordering::Acquire) {
                parent.rebuild();
            }
        }

        // Clear before reading the buckets: a concurrent mutation lands
        // after this store and re-dirties the set, forcing another rebuild.
        self.dirty.store(false, Ordering::Release);

        let mut entries = Vec::new();
        for priority in Priority::ALL {
            let group_start = entries.len();
            entries.push(ListenerEntry::Phase(priority));
            self.collect(priority, &mut entries);
            if entries.len() == group_start + 1 {
                // Empty tier: drop the marker again.
                entries.pop();
            }
        }

        let snapshot = Arc::new(entries);
        self.cache.store(Some(Arc::clone(&snapshot)));
        snapshot
    }

    /// Appends this set's bucket for `priority`, then the parent's merged
    /// bucket, preserving child-before-parent order within the tier.
    fn collect(&self, priority: Priority, out: &mut Vec<ListenerEntry>) {
        {
            let buckets = self.buckets.lock();
            out.extend(
                buckets[priority.index()]
                    .iter()
                    .cloned()
                    .map(ListenerEntry::Callback),
            );
        }
        if let Some(parent) = &self.parent {
            parent.collect(priority, out);
        }
    }

    fn invalidate(&self) {
        self.dirty.store(true, Ordering::Release);
        let children = {
            let mut guard = self.children.lock();
            guard.retain(|child| child.strong_count() > 0);
            guard.clone()
        };
        for child in children {
            if let Some(child) = child.upgrade() {
                child.invalidate();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::listeners::ListenerFn;

    fn listener(label: &str) -> Listener {
        let noop: Arc<ListenerFn> = Arc::new(|_| Ok(()));
        Listener::new(label, noop)
    }

    fn labels(entries: &[ListenerEntry]) -> Vec<String> {
        entries.iter().map(|e| e.to_string()).collect()
    }

    #[test]
    fn test_empty_set_orders_to_nothing() {
        let set = ListenerSet::new();
        assert!(set.ordered().is_empty());
    }

    #[test]
    fn test_marker_precedes_each_non_empty_tier() {
        let set = ListenerSet::new();
        set.register(Priority::Low, listener("low"));
        set.register(Priority::Highest, listener("hi"));
        assert_eq!(
            labels(&set.ordered()),
            vec!["<phase highest>", "hi", "<phase low>", "low"]
        );
    }

    #[test]
    fn test_child_listeners_precede_parent_within_tier() {
        let parent = ListenerSet::new();
        let child = ListenerSet::with_parent(&parent);
        parent.register(Priority::Normal, listener("parent"));
        child.register(Priority::Normal, listener("child"));
        assert_eq!(
            labels(&child.ordered()),
            vec!["<phase normal>", "child", "parent"]
        );
    }

    #[test]
    fn test_parent_mutation_invalidates_child_cache() {
        let parent = ListenerSet::new();
        let child = ListenerSet::with_parent(&parent);
        child.register(Priority::Normal, listener("child"));
        assert_eq!(child.ordered().len(), 2);

        parent.register(Priority::High, listener("late-parent"));
        assert_eq!(
            labels(&child.ordered()),
            vec!["<phase high>", "late-parent", "<phase normal>", "child"]
        );
    }

    #[test]
    fn test_unregister_by_id() {
        let set = ListenerSet::new();
        let l = listener("gone");
        let id = l.id();
        set.register(Priority::Normal, l);
        set.register(Priority::Normal, listener("stays"));
        assert!(set.unregister(id));
        assert!(!set.unregister(id));
        assert_eq!(labels(&set.ordered()), vec!["<phase normal>", "stays"]);
    }

    #[test]
    fn test_snapshot_is_stable_across_later_mutations() {
        let set = ListenerSet::new();
        set.register(Priority::Normal, listener("first"));
        let snapshot = set.ordered();
        set.register(Priority::Normal, listener("second"));
        assert_eq!(snapshot.len(), 2);
        assert_eq!(set.ordered().len(), 3);
    }

    #[test]
    fn test_grandchild_invalidation_propagates() {
        let a = ListenerSet::new();
        let b = ListenerSet::with_parent(&a);
        let c = ListenerSet::with_parent(&b);
        assert!(c.ordered().is_empty());
        a.register(Priority::Lowest, listener("root"));
        assert_eq!(labels(&c.ordered()), vec!["<phase lowest>", "root"]);
    }
}
