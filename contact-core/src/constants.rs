//! Defaults and environment keys for the presence cache.

use std::time::Duration;

// ═══════════════════════════════════════════════════════════════════════════════
// CACHE DEFAULTS
// ═══════════════════════════════════════════════════════════════════════════════

/// Default time-to-live for a remembered key.
pub const DEFAULT_TTL: Duration = Duration::from_secs(60);

/// The reap interval derived from a TTL is `ttl / REAP_INTERVAL_DIVISOR`.
pub const REAP_INTERVAL_DIVISOR: u32 = 10;

/// Default sweep period (DEFAULT_TTL / REAP_INTERVAL_DIVISOR).
pub const DEFAULT_REAP_INTERVAL: Duration = Duration::from_secs(6);

/// Default upper bound on remembered keys. Zero means unbounded.
pub const DEFAULT_MAX_ENTRIES: usize = 10;

// ═══════════════════════════════════════════════════════════════════════════════
// ENVIRONMENT
// ═══════════════════════════════════════════════════════════════════════════════

/// TTL in milliseconds.
pub const ENV_TTL_MS: &str = "CONTACT_CACHE_TTL_MS";

/// Reap interval in milliseconds.
pub const ENV_REAP_INTERVAL_MS: &str = "CONTACT_CACHE_REAP_INTERVAL_MS";

/// Maximum entry count.
pub const ENV_MAX_ENTRIES: &str = "CONTACT_CACHE_MAX_ENTRIES";
