//! Common traits for contact.

// ═══════════════════════════════════════════════════════════════════════════════
// PRESENCE STORE TRAIT
// ═══════════════════════════════════════════════════════════════════════════════

/// Interface for "have I seen this key recently?" stores.
///
/// Implementations might use:
/// - A lock-guarded map with a background reaper (the default cache)
/// - A sharded concurrent map when lock contention matters
/// - A fixed answer in tests
///
/// None of the operations can fail.
pub trait PresenceStore: Send + Sync {
    /// Returns true if `key` is present and not expired.
    fn exists(&self, key: &str) -> bool;

    /// Records or refreshes `key` with the current time.
    fn add(&self, key: &str);

    /// Records `key` unless it is present and fresh.
    ///
    /// Returns true if the key was recorded.
    fn try_add(&self, key: &str) -> bool;

    /// Returns the number of physically stored entries, expired ones included.
    fn len(&self) -> usize;

    /// Returns true if nothing is stored.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
