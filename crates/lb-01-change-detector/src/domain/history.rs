//! Bounded most-recent-first buffer of processed entries.

use parking_lot::Mutex;
use shared_types::HistoryEntry;
use std::collections::VecDeque;

/// Capacity of the recent-history buffer.
pub const MAX_HISTORY: usize = 50;

/// Most-recent-first sequence of simplified log entries.
///
/// Used only for status and diagnostics; the oldest entries are evicted on
/// overflow. Writes come from the detector's sequential tick, reads from
/// concurrent status queries.
#[derive(Debug)]
pub struct RecentHistory {
    entries: Mutex<VecDeque<HistoryEntry>>,
    capacity: usize,
}

impl RecentHistory {
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(MAX_HISTORY)
    }

    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
        }
    }

    /// Prepend an entry, evicting the oldest beyond capacity.
    pub fn push(&self, entry: HistoryEntry) {
        let mut entries = self.entries.lock();
        entries.push_front(entry);
        while entries.len() > self.capacity {
            entries.pop_back();
        }
    }

    /// Snapshot, most recent first.
    #[must_use]
    pub fn snapshot(&self) -> Vec<HistoryEntry> {
        self.entries.lock().iter().cloned().collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl Default for RecentHistory {
    fn default() -> Self {
        Self::new()
    }
}
