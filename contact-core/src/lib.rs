//! # Contact Core
//!
//! Shared building blocks for the contact request throttle:
//!
//! - **Errors**: construction, configuration and admission failures
//! - **Constants**: cache defaults and environment keys
//! - **Traits**: the `PresenceStore` interface the admission layer depends on
//!
//! ## Example
//!
//! ```rust
//! use contact_core::{ContactError, DEFAULT_TTL};
//! use std::time::Duration;
//!
//! let err = ContactError::InvalidTtl(Duration::ZERO);
//! assert!(err.is_config_error());
//! assert!(DEFAULT_TTL > Duration::ZERO);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, clippy::all)]

pub mod constants;
pub mod error;
pub mod traits;

// Re-export commonly used items at crate root
pub use constants::*;
pub use error::{ContactError, Result};
pub use traits::*;
