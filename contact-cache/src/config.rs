//! Cache configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use contact_core::constants::{
    DEFAULT_MAX_ENTRIES, DEFAULT_REAP_INTERVAL, DEFAULT_TTL, ENV_MAX_ENTRIES,
    ENV_REAP_INTERVAL_MS, ENV_TTL_MS, REAP_INTERVAL_DIVISOR,
};
use contact_core::error::{ContactError, Result};

/// Cache configuration.
///
/// Durations serialize as integer milliseconds.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Age at which an entry stops counting as present
    #[serde(rename = "ttl_ms", with = "millis")]
    pub ttl: Duration,
    /// Period between background sweeps
    #[serde(rename = "reap_interval_ms", with = "millis")]
    pub reap_interval: Duration,
    /// Maximum number of entries (0 = unbounded)
    pub max_entries: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: DEFAULT_TTL,
            reap_interval: DEFAULT_REAP_INTERVAL,
            max_entries: DEFAULT_MAX_ENTRIES,
        }
    }
}

impl CacheConfig {
    /// Creates an unbounded configuration.
    pub fn new(ttl: Duration, reap_interval: Duration) -> Self {
        Self {
            ttl,
            reap_interval,
            max_entries: 0,
        }
    }

    /// Derives a configuration from a per-identity request time limit.
    ///
    /// The limit becomes the TTL, sweeps run ten times per TTL and at most
    /// `DEFAULT_MAX_ENTRIES` identities are remembered.
    pub fn from_time_limit(limit: Duration) -> Self {
        Self {
            ttl: limit,
            reap_interval: limit / REAP_INTERVAL_DIVISOR,
            max_entries: DEFAULT_MAX_ENTRIES,
        }
    }

    /// Sets the maximum entry count.
    pub fn with_max_entries(mut self, max_entries: usize) -> Self {
        self.max_entries = max_entries;
        self
    }

    /// Sets the reap interval.
    pub fn with_reap_interval(mut self, reap_interval: Duration) -> Self {
        self.reap_interval = reap_interval;
        self
    }

    /// Returns true if `max_entries` bounds the cache.
    pub fn is_bounded(&self) -> bool {
        self.max_entries > 0
    }

    /// Checks the TTL and reap interval.
    pub fn validate(&self) -> Result<()> {
        if self.ttl.is_zero() {
            return Err(ContactError::InvalidTtl(self.ttl));
        }
        if self.reap_interval.is_zero() || self.reap_interval > self.ttl {
            return Err(ContactError::InvalidReapInterval {
                reap_interval: self.reap_interval,
                ttl: self.ttl,
            });
        }
        Ok(())
    }

    /// Loads configuration from the environment (and `.env`, if present).
    ///
    /// Unset variables keep their defaults. A TTL without an explicit reap
    /// interval derives the interval from the TTL.
    pub fn from_env() -> Result<Self> {
        let config = Self::load_env()?;
        config.validate()?;
        Ok(config)
    }

    /// Parses the environment like [`from_env`](Self::from_env) without
    /// validating, so callers can layer overrides before a single
    /// [`validate`](Self::validate).
    pub fn load_env() -> Result<Self> {
        let _ = dotenvy::dotenv();
        Self::load_lookup(|key| std::env::var(key).ok())
    }

    /// Parses and validates a JSON document. Missing fields keep their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config = Self::load_json(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Parses a JSON document without validating.
    pub fn load_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    fn load_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(ttl) = parse_var::<u64>(&lookup, ENV_TTL_MS)? {
            config.ttl = Duration::from_millis(ttl);
            config.reap_interval = config.ttl / REAP_INTERVAL_DIVISOR;
        }
        if let Some(reap) = parse_var::<u64>(&lookup, ENV_REAP_INTERVAL_MS)? {
            config.reap_interval = Duration::from_millis(reap);
        }
        if let Some(max) = parse_var::<usize>(&lookup, ENV_MAX_ENTRIES)? {
            config.max_entries = max;
        }

        Ok(config)
    }
}

fn parse_var<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Result<Option<T>>
where
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| ContactError::ConfigError(format!("{}={:?}: {}", key, raw, e))),
    }
}

mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(u64::try_from(value.as_millis()).unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use test_case::test_case;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_is_valid() {
        let config = CacheConfig::default();
        assert!(config.validate().is_ok());
        assert!(config.is_bounded());
    }

    #[test_case(0, 0 ; "zero ttl")]
    #[test_case(0, 100 ; "zero ttl with interval")]
    fn test_invalid_ttl(ttl_ms: u64, reap_ms: u64) {
        let config =
            CacheConfig::new(Duration::from_millis(ttl_ms), Duration::from_millis(reap_ms));
        assert!(matches!(config.validate(), Err(ContactError::InvalidTtl(_))));
    }

    #[test_case(1000, 2000 ; "interval above ttl")]
    #[test_case(1000, 0 ; "zero interval")]
    fn test_invalid_reap_interval(ttl_ms: u64, reap_ms: u64) {
        let config =
            CacheConfig::new(Duration::from_millis(ttl_ms), Duration::from_millis(reap_ms));
        assert!(matches!(
            config.validate(),
            Err(ContactError::InvalidReapInterval { .. })
        ));
    }

    #[test_case(1000, 100 ; "interval below ttl")]
    #[test_case(1000, 1000 ; "interval equals ttl")]
    fn test_valid_intervals(ttl_ms: u64, reap_ms: u64) {
        let config =
            CacheConfig::new(Duration::from_millis(ttl_ms), Duration::from_millis(reap_ms));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_time_limit() {
        let config = CacheConfig::from_time_limit(Duration::from_secs(30));
        assert_eq!(config.ttl, Duration::from_secs(30));
        assert_eq!(config.reap_interval, Duration::from_secs(3));
        assert_eq!(config.max_entries, DEFAULT_MAX_ENTRIES);
    }

    #[test]
    fn test_lookup_defaults() {
        let config = CacheConfig::load_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config, CacheConfig::default());
    }

    #[test]
    fn test_lookup_ttl_derives_interval() {
        let config = CacheConfig::load_lookup(lookup_from(&[(ENV_TTL_MS, "5000")])).unwrap();
        assert_eq!(config.ttl, Duration::from_secs(5));
        assert_eq!(config.reap_interval, Duration::from_millis(500));
    }

    #[test]
    fn test_lookup_all_values() {
        let config = CacheConfig::load_lookup(lookup_from(&[
            (ENV_TTL_MS, "2000"),
            (ENV_REAP_INTERVAL_MS, "250"),
            (ENV_MAX_ENTRIES, " 0 "),
        ]))
        .unwrap();
        assert_eq!(config.reap_interval, Duration::from_millis(250));
        assert!(!config.is_bounded());
    }

    #[test]
    fn test_lookup_rejects_garbage() {
        let result = CacheConfig::load_lookup(lookup_from(&[(ENV_MAX_ENTRIES, "lots")]));
        assert!(matches!(result, Err(ContactError::ConfigError(_))));
    }

    #[test]
    fn test_lookup_leaves_validation_to_caller() {
        let config = CacheConfig::load_lookup(lookup_from(&[
            (ENV_TTL_MS, "1000"),
            (ENV_REAP_INTERVAL_MS, "2000"),
        ]))
        .unwrap();
        assert!(matches!(
            config.validate(),
            Err(ContactError::InvalidReapInterval { .. })
        ));

        let fixed = config.with_reap_interval(Duration::from_millis(100));
        assert!(fixed.validate().is_ok());
    }

    #[test]
    fn test_json_uses_millis() {
        let config = CacheConfig::new(Duration::from_secs(1), Duration::from_millis(100))
            .with_max_entries(3);
        let json = serde_json::to_value(&config).unwrap();
        assert_eq!(json["ttl_ms"], 1000);
        assert_eq!(json["reap_interval_ms"], 100);

        let parsed: CacheConfig = serde_json::from_str(r#"{"ttl_ms": 1000}"#).unwrap();
        assert_eq!(parsed.ttl, Duration::from_secs(1));
        assert_eq!(parsed.max_entries, DEFAULT_MAX_ENTRIES);
    }

    #[test]
    fn test_from_json() {
        let config =
            CacheConfig::from_json(r#"{"ttl_ms": 2000, "reap_interval_ms": 500, "max_entries": 0}"#)
                .unwrap();
        assert_eq!(config.ttl, Duration::from_secs(2));
        assert_eq!(config.reap_interval, Duration::from_millis(500));
        assert!(!config.is_bounded());
    }

    #[test]
    fn test_from_json_rejects_malformed() {
        let result = CacheConfig::from_json("{ttl_ms: 2000");
        assert!(matches!(result, Err(ContactError::JsonError(_))));
        assert!(result.unwrap_err().is_config_error());
    }

    #[test]
    fn test_from_json_validates() {
        let json = r#"{"ttl_ms": 1000, "reap_interval_ms": 2000}"#;
        assert!(CacheConfig::load_json(json).is_ok());
        assert!(matches!(
            CacheConfig::from_json(json),
            Err(ContactError::InvalidReapInterval { .. })
        ));
    }
}
