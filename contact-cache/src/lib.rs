//! TTL-bounded presence cache for throttling repeated contact requests.
//!
//! Remembers recently seen keys under a TTL and an optional entry bound,
//! with a background reaper that removes expired entries.

mod cache;
mod config;
mod eviction;
mod reaper;
mod throttle;

pub use cache::{CacheStats, PresenceCache};
pub use config::CacheConfig;
pub use throttle::RequestThrottle;
