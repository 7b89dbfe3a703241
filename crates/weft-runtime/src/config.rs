#![forbid(unsafe_code)]

//! Runtime-wide settings.
//!
//! [`RuntimeConfig`] collects the knobs that decide how strictly the runtime
//! treats recoverable failures. With the `config-files` feature it can be
//! loaded from TOML or JSON at startup.
//!
//! # Loading
//!
//! ```toml
//! # weft.toml
//! strict_handlers = true
//! event_queue_limit = 256
//! ```
//!
//! ```rust,ignore
//! let config = RuntimeConfig::from_toml_file("weft.toml")?;
//! let config = RuntimeConfig::from_json_str(json)?;
//! ```
//!
//! # Defaults
//!
//! The defaults are best-effort: rejected config values are kept silently
//! and unresolvable handlers leave their listener inert with a warning.

#[cfg(feature = "config-files")]
use std::path::Path;

#[cfg(feature = "config-files")]
use serde::{Deserialize, Serialize};

use weft_core::RejectPolicy;

/// Runtime behavior switches.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "config-files", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config-files", serde(default))]
pub struct RuntimeConfig {
    /// Fail the dispatch when a listener's handler cannot be resolved,
    /// instead of leaving the listener inert.
    pub strict_handlers: bool,

    /// Surface declined config values as errors instead of keeping the
    /// previous value.
    pub strict_validation: bool,

    /// Maximum events queued while a dispatch is in progress.
    pub event_queue_limit: usize,

    /// Emit a warning for every listener left inert.
    pub log_inert_listeners: bool,

    /// Commits slower than this are logged at `warn`.
    pub slow_commit_ms: u64,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            strict_handlers: false,
            strict_validation: false,
            event_queue_limit: 1024,
            log_inert_listeners: true,
            slow_commit_ms: 16,
        }
    }
}

impl RuntimeConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_strict_handlers(mut self, strict: bool) -> Self {
        self.strict_handlers = strict;
        self
    }

    #[must_use]
    pub fn with_strict_validation(mut self, strict: bool) -> Self {
        self.strict_validation = strict;
        self
    }

    #[must_use]
    pub fn with_event_queue_limit(mut self, limit: usize) -> Self {
        self.event_queue_limit = limit;
        self
    }

    #[must_use]
    pub fn with_log_inert_listeners(mut self, log: bool) -> Self {
        self.log_inert_listeners = log;
        self
    }

    #[must_use]
    pub fn with_slow_commit_ms(mut self, ms: u64) -> Self {
        self.slow_commit_ms = ms;
        self
    }

    /// Reject policy handed to every new config store.
    #[must_use]
    pub fn reject_policy(&self) -> RejectPolicy {
        if self.strict_validation {
            RejectPolicy::Strict
        } else {
            RejectPolicy::Silent
        }
    }

    /// Load from a TOML string.
    #[cfg(feature = "config-files")]
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigFileError> {
        toml::from_str(s).map_err(ConfigFileError::Toml)
    }

    /// Load from a TOML file on disk.
    #[cfg(feature = "config-files")]
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigFileError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(ConfigFileError::Io)?;
        Self::from_toml_str(&content)
    }

    /// Load from a JSON string.
    #[cfg(feature = "config-files")]
    pub fn from_json_str(s: &str) -> Result<Self, ConfigFileError> {
        serde_json::from_str(s).map_err(ConfigFileError::Json)
    }

    /// Load from a JSON file on disk.
    #[cfg(feature = "config-files")]
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigFileError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(ConfigFileError::Io)?;
        Self::from_json_str(&content)
    }
}

/// Errors that can occur when loading a [`RuntimeConfig`].
#[cfg(feature = "config-files")]
#[derive(Debug, thiserror::Error)]
pub enum ConfigFileError {
    #[error("I/O error: {0}")]
    Io(#[source] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[source] toml::de::Error),
    #[error("JSON parse error: {0}")]
    Json(#[source] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_best_effort() {
        let c = RuntimeConfig::default();
        assert!(!c.strict_handlers);
        assert_eq!(c.reject_policy(), RejectPolicy::Silent);
        assert_eq!(c.event_queue_limit, 1024);
    }

    #[test]
    fn builders_chain() {
        let c = RuntimeConfig::new()
            .with_strict_validation(true)
            .with_event_queue_limit(4);
        assert_eq!(c.reject_policy(), RejectPolicy::Strict);
        assert_eq!(c.event_queue_limit, 4);
    }

    #[cfg(feature = "config-files")]
    #[test]
    fn loads_partial_toml() {
        let c = RuntimeConfig::from_toml_str("strict_handlers = true\n").unwrap();
        assert!(c.strict_handlers);
        assert_eq!(c.event_queue_limit, 1024);
    }

    #[cfg(feature = "config-files")]
    #[test]
    fn loads_json() {
        let c = RuntimeConfig::from_json_str(r#"{"event_queue_limit": 8}"#).unwrap();
        assert_eq!(c.event_queue_limit, 8);
        assert!(RuntimeConfig::from_json_str("{").is_err());
    }
}
