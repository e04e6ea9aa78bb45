pub mod persister;
pub mod store;

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

pub use persister::Persister;
pub use store::JsonLinesStore;

/// How many crashed rounds are kept in memory.
pub const HISTORY_CAPACITY: usize = 50;

/// Snapshot of a round taken the moment it crashes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub id: String,
    pub crash_point: f64,
    pub hash: String,
    pub commitment: String,
    /// Unix millis of the crash tick.
    pub crashed_at: i64,
}

/// Bounded newest-first ring of crashed rounds.
#[derive(Debug)]
pub struct History {
    entries: VecDeque<HistoryEntry>,
    capacity: usize,
}

impl Default for History {
    fn default() -> Self {
        Self::with_capacity(HISTORY_CAPACITY)
    }
}

impl History {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Insert at the front, evicting the oldest entry when full.
    pub fn record(&mut self, entry: HistoryEntry) {
        self.entries.push_front(entry);
        while self.entries.len() > self.capacity {
            self.entries.pop_back();
        }
    }

    /// Newest first.
    pub fn list(&self) -> Vec<HistoryEntry> {
        self.entries.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(n: usize) -> HistoryEntry {
        HistoryEntry {
            id: format!("round-{n}"),
            crash_point: 1.0 + n as f64 / 100.0,
            hash: format!("hash-{n}"),
            commitment: format!("commit-{n}"),
            crashed_at: n as i64,
        }
    }

    #[test]
    fn newest_first() {
        let mut history = History::default();
        history.record(entry(1));
        history.record(entry(2));
        history.record(entry(3));
        let ids: Vec<_> = history.list().into_iter().map(|e| e.id).collect();
        assert_eq!(ids, ["round-3", "round-2", "round-1"]);
    }

    #[test]
    fn evicts_oldest_past_capacity() {
        let mut history = History::default();
        for n in 0..HISTORY_CAPACITY + 7 {
            history.record(entry(n));
        }
        assert_eq!(history.len(), HISTORY_CAPACITY);

        let list = history.list();
        assert_eq!(list[0].id, format!("round-{}", HISTORY_CAPACITY + 6));
        // Rounds 0..=6 were the oldest and are gone.
        assert_eq!(list[HISTORY_CAPACITY - 1].id, "round-7");
        assert!(list.iter().all(|e| e.crashed_at >= 7));
    }

    #[test]
    fn starts_empty() {
        let history = History::default();
        assert_eq!(history.len(), 0);
        assert!(history.list().is_empty());
    }

    #[test]
    fn entry_serializes_camel_case() {
        let json = serde_json::to_value(entry(4)).unwrap();
        assert_eq!(json["crashPoint"], 1.04);
        assert_eq!(json["crashedAt"], 4);
    }
}
