//! Core error types for ringline-core.
//!
//! Nothing here is fatal. Lifecycle errors are absorbed at the trigger
//! boundary as benign no-ops; resource errors degrade a side effect while
//! the state machine stays correct.

use std::path::PathBuf;
use thiserror::Error;

use crate::lifecycle::CallState;

/// Errors produced by the lifecycle state machine and the action router.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LifecycleError {
    /// A new call was begun while another is active or unconsumed.
    #[error("A call is already active (state: {state})")]
    AlreadyActive { state: CallState },

    /// The action does not apply to the current state. Losing one side of
    /// a resolution race ends here; callers treat it as a no-op.
    #[error("Action '{action}' is invalid in state '{state}'")]
    InvalidTransition {
        action: &'static str,
        state: CallState,
    },

    /// Raw inbound token outside the routing vocabulary.
    #[error("Unknown action token '{action}'")]
    UnknownAction { action: String },
}

/// The audible-alert resource could not be acquired.
///
/// The ring session proceeds silently; the lifecycle is unaffected.
#[derive(Error, Debug, Clone)]
#[error("Audible resource unavailable: {reason}")]
pub struct ResourceUnavailable {
    pub reason: String,
}

impl ResourceUnavailable {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Configuration directory could not be determined or created
    #[error("Cannot access configuration directory: {0}")]
    DataDir(String),

    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Key outside the configuration schema
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),
}
