//! Request admission on top of a presence store.
//!
//! An identity (typically an email address) is admitted once per TTL. A
//! repeat within the TTL is refused with `ContactError::Throttled`, which the
//! surrounding service reports as "too many requests".

use tracing::{debug, instrument};

use contact_core::error::{ContactError, Result};
use contact_core::traits::PresenceStore;

use crate::cache::PresenceCache;

/// Admits or rejects requests by identity.
#[derive(Debug)]
pub struct RequestThrottle<S: PresenceStore = PresenceCache> {
    store: S,
}

impl<S: PresenceStore> RequestThrottle<S> {
    /// Creates a throttle backed by `store`.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Normalizes an identity for lookup (trimmed, lowercase).
    fn normalize(identity: &str) -> String {
        identity.trim().to_lowercase()
    }

    /// Admits `identity` and remembers it, or rejects it.
    ///
    /// Fails with `ValidationError` for an empty identity and `Throttled`
    /// if the identity was admitted within the TTL.
    #[instrument(skip_all)]
    pub fn admit(&self, identity: &str) -> Result<()> {
        let normalized = Self::normalize(identity);
        if normalized.is_empty() {
            return Err(ContactError::ValidationError("missing identity".into()));
        }

        if self.store.try_add(&normalized) {
            Ok(())
        } else {
            debug!("Rejecting repeat request");
            Err(ContactError::Throttled(normalized))
        }
    }

    /// Returns true if `identity` would currently be rejected.
    pub fn is_throttled(&self, identity: &str) -> bool {
        self.store.exists(&Self::normalize(identity))
    }

    /// Returns the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }
}
