//! Capacity eviction policy.
//!
//! A full cache makes room for a new key by dropping the entry with the
//! oldest timestamp. The victim is found by a linear scan under the write
//! lock, O(n) per eviction. That is fine for a few thousand entries; larger
//! bounds want an ordered index keyed by `(seen_at, seq)` so the choice of
//! victim stays the same.

use std::collections::HashMap;

use crate::cache::Entry;

/// Returns the key with the smallest `(seen_at, seq)`.
///
/// Timestamps can tie at clock resolution; the sequence number then picks
/// the earliest insertion.
pub(crate) fn oldest_key(entries: &HashMap<String, Entry>) -> Option<String> {
    entries
        .iter()
        .min_by_key(|(_, e)| (e.seen_at, e.seq))
        .map(|(k, _)| k.clone())
}

/// Returns true if inserting `key` must first evict an entry.
pub(crate) fn needs_eviction(
    entries: &HashMap<String, Entry>,
    key: &str,
    max_entries: usize,
) -> bool {
    max_entries > 0 && entries.len() >= max_entries && !entries.contains_key(key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::time::Instant;

    fn entry(seen_at: Instant, seq: u64) -> Entry {
        Entry { seen_at, seq }
    }

    #[test]
    fn test_oldest_by_timestamp() {
        let now = Instant::now();
        let mut entries = HashMap::new();
        entries.insert("new".to_string(), entry(now + Duration::from_millis(5), 0));
        entries.insert("old".to_string(), entry(now, 1));
        entries.insert("mid".to_string(), entry(now + Duration::from_millis(2), 2));

        assert_eq!(oldest_key(&entries).as_deref(), Some("old"));
    }

    #[test]
    fn test_ties_break_by_insertion_order() {
        let now = Instant::now();
        let mut entries = HashMap::new();
        for (seq, key) in ["c", "a", "b"].iter().enumerate() {
            entries.insert(key.to_string(), entry(now, seq as u64));
        }

        assert_eq!(oldest_key(&entries).as_deref(), Some("c"));
    }

    #[test]
    fn test_empty_has_no_victim() {
        assert!(oldest_key(&HashMap::new()).is_none());
    }

    #[test]
    fn test_needs_eviction() {
        let now = Instant::now();
        let mut entries = HashMap::new();
        entries.insert("a".to_string(), entry(now, 0));
        entries.insert("b".to_string(), entry(now, 1));

        assert!(needs_eviction(&entries, "c", 2));
        assert!(!needs_eviction(&entries, "a", 2), "refresh never evicts");
        assert!(!needs_eviction(&entries, "c", 3));
        assert!(!needs_eviction(&entries, "c", 0), "zero means unbounded");
    }
}
