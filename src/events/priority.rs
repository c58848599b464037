//! # Listener priority levels.
//!
//! [`Priority`] orders listener invocation within one post: `Highest`
//! listeners run first, `Lowest` run last. The discriminant doubles as the
//! bucket index inside a [`ListenerSet`](crate::registry::ListenerSet),
//! so the variants must stay dense and zero-based.
//!
//! During dispatch the priority currently being processed is recorded on
//! the event as its *phase* (see [`Event`](crate::events::Event)), updated
//! by phase markers immediately before the listeners of that priority run.

use std::fmt;

/// The priority with which to execute an event listener.
///
/// Lower discriminant = earlier execution. The default is [`Priority::Normal`].
#[repr(usize)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Priority {
    Highest = 0,
    High = 1,
    #[default]
    Normal = 2,
    Low = 3,
    Lowest = 4,
}

impl Priority {
    /// Number of priority levels (and listener buckets per set).
    pub const COUNT: usize = 5;

    /// All priorities in dispatch order, highest first.
    pub const ALL: [Priority; Priority::COUNT] = [
        Priority::Highest,
        Priority::High,
        Priority::Normal,
        Priority::Low,
        Priority::Lowest,
    ];

    /// Bucket index of this priority inside a listener set.
    #[inline]
    #[must_use]
    pub fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Priority::Highest => "highest",
            Priority::High => "high",
            Priority::Normal => "normal",
            Priority::Low => "low",
            Priority::Lowest => "lowest",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dispatch_order_is_highest_first() {
        let mut sorted = Priority::ALL;
        sorted.sort();
        assert_eq!(sorted, Priority::ALL);
        assert_eq!(Priority::ALL[0], Priority::Highest);
        assert_eq!(Priority::ALL[Priority::COUNT - 1], Priority::Lowest);
    }

    #[test]
    fn test_index_matches_position() {
        for (i, p) in Priority::ALL.iter().enumerate() {
            assert_eq!(p.index(), i);
        }
    }

    #[test]
    fn test_default_is_normal() {
        assert_eq!(Priority::default(), Priority::Normal);
    }
}
