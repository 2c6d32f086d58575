//! Bounded history of readings.

use std::collections::VecDeque;
use std::sync::Arc;

/// Number of readings kept when no capacity is configured.
pub const DEFAULT_HISTORY_CAPACITY: usize = 20;

/// Fixed-capacity, arrival-ordered store.
///
/// Appending to a full buffer evicts exactly one entry, the oldest. There is
/// no way to remove or clear entries; consumers only ever see immutable
/// [`snapshot`](Self::snapshot)s.
///
/// # Example
///
/// ```
/// use gaswatch::HistoryBuffer;
///
/// let mut history = HistoryBuffer::new(3);
/// for r in ["r1", "r2", "r3", "r4"] {
///     history.append(r);
/// }
/// assert_eq!(&*history.snapshot(), &["r2", "r3", "r4"]);
/// ```
#[derive(Debug, Clone)]
pub struct HistoryBuffer<T> {
    entries: VecDeque<T>,
    capacity: usize,
    total_appended: u64,
}

impl<T> Default for HistoryBuffer<T> {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY)
    }
}

impl<T> HistoryBuffer<T> {
    /// Create an empty buffer. A capacity of zero is raised to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
            total_appended: 0,
        }
    }

    /// Append an entry, evicting the oldest if the buffer is full.
    pub fn append(&mut self, entry: T) {
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(entry);
        self.total_appended += 1;
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of appends over the buffer's lifetime, including evicted entries.
    pub fn total_appended(&self) -> u64 {
        self.total_appended
    }

    /// Most recently appended entry.
    pub fn latest(&self) -> Option<&T> {
        self.entries.back()
    }

    /// Iterate oldest first.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &T> + ExactSizeIterator {
        self.entries.iter()
    }
}

impl<T: Clone> HistoryBuffer<T> {
    /// Immutable copy of the contents, oldest first.
    pub fn snapshot(&self) -> Arc<[T]> {
        self.entries.iter().cloned().collect()
    }
}
