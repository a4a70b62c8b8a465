//! Error types for the contact presence cache.
//!
//! Construction is the only fallible cache operation. The remaining variants
//! belong to configuration loading and request admission.

use std::time::Duration;

use thiserror::Error;

/// Result type alias using `ContactError`.
pub type Result<T> = std::result::Result<T, ContactError>;

/// Main error type for all contact operations.
#[derive(Debug, Error)]
pub enum ContactError {
    // ═══════════════════════════════════════════════════════════════════════════
    // CONSTRUCTION ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// TTL must be greater than zero.
    #[error("Invalid ttl: {0:?} (must be greater than zero)")]
    InvalidTtl(Duration),

    /// Reap interval must be non-zero and no larger than the TTL.
    #[error("Invalid reap interval: {reap_interval:?} (must be non-zero and at most ttl {ttl:?})")]
    InvalidReapInterval {
        /// Requested sweep period.
        reap_interval: Duration,
        /// Configured TTL.
        ttl: Duration,
    },

    /// No Tokio runtime available to host the reaper task.
    #[error("No Tokio runtime available to start the reaper")]
    MissingRuntime,

    // ═══════════════════════════════════════════════════════════════════════════
    // CONFIGURATION ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Configuration value could not be parsed.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// JSON configuration document could not be parsed.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    // ═══════════════════════════════════════════════════════════════════════════
    // ADMISSION ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Request input failed validation.
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Identity was already seen within the TTL.
    #[error("Too many requests for '{0}'")]
    Throttled(String),
}

impl ContactError {
    /// Returns true if this error stems from bad configuration.
    ///
    /// These are fatal to construction and must be propagated to the caller.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            ContactError::InvalidTtl(_)
                | ContactError::InvalidReapInterval { .. }
                | ContactError::MissingRuntime
                | ContactError::ConfigError(_)
                | ContactError::JsonError(_)
        )
    }

    /// Returns true if this error is a refused admission.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            ContactError::Throttled(_) | ContactError::ValidationError(_)
        )
    }
}
