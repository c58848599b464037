//! Listener storage: the node forest mirroring the event-type tree.
//!
//! ## Contents
//! - [`EventRegistry`] — process-scoped shared state: node map, metadata
//!   memoization, master node list, bus-id allocation
//! - [`ListenerNode`] — per-event-type node with one listener set per bus
//! - [`ListenerSet`] — priority buckets plus the cached, atomically
//!   published dispatch order for one (type, bus) pair
//!
//! ## Wiring
//! ```text
//! EventRegistry ──► ListenerNode(Base) ──► sets[bus 0] ◄─┐ inherits
//!        │                 ▲                             │
//!        │                 │ parent                      │
//!        └───────► ListenerNode(Derived) ─► sets[bus 0] ─┘
//! ```

mod node;
mod registry;
mod set;

pub use node::ListenerNode;
pub use registry::{EventRegistry, TypeMeta};
pub use set::ListenerSet;
