//! Configuration errors
//!
//! Every failure in this crate is a deterministic configuration mistake caught
//! when a hazard or level is built. Nothing fails once a hazard is ticking.

use std::path::PathBuf;

use thiserror::Error;

use crate::sim::ChannelKind;

/// Rejected hazard or level configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A state machine was given no phases
    #[error("{hazard}: phase table is empty")]
    EmptyPhaseTable { hazard: String },

    /// A duration is negative, not finite, or zero where a positive value is required
    #[error("{hazard}: invalid duration for '{field}': {value}")]
    InvalidDuration {
        hazard: String,
        field: String,
        value: f32,
    },

    /// A cyclic phase table whose durations sum to zero
    #[error("{hazard}: cyclic phase table has zero total duration")]
    ZeroCycle { hazard: String },

    /// Initial phase index does not exist
    #[error("{hazard}: initial phase {index} out of range ({len} phases)")]
    InvalidPhaseIndex {
        hazard: String,
        index: usize,
        len: usize,
    },

    /// A collaborator the hazard cannot run without was not supplied
    #[error("{hazard}: missing required {channel} collaborator")]
    MissingCollaborator { hazard: String, channel: ChannelKind },

    /// Any other out-of-range setting
    #[error("{hazard}: invalid value for '{field}': {reason}")]
    InvalidValue {
        hazard: String,
        field: String,
        reason: String,
    },

    /// Level JSON could not be parsed
    #[error("failed to parse level: {0}")]
    Parse(#[from] serde_json::Error),

    /// Level file could not be read
    #[error("failed to read level file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ConfigError {
    /// Check that a duration is finite and non-negative (zero allowed)
    pub fn check_duration(hazard: &str, field: &str, value: f32) -> Result<(), ConfigError> {
        if value.is_finite() && value >= 0.0 {
            Ok(())
        } else {
            Err(ConfigError::InvalidDuration {
                hazard: hazard.to_string(),
                field: field.to_string(),
                value,
            })
        }
    }

    /// Check that a duration is finite and strictly positive
    pub fn check_positive(hazard: &str, field: &str, value: f32) -> Result<(), ConfigError> {
        if value.is_finite() && value > 0.0 {
            Ok(())
        } else {
            Err(ConfigError::InvalidDuration {
                hazard: hazard.to_string(),
                field: field.to_string(),
                value,
            })
        }
    }

    /// Build an `InvalidValue` error
    pub fn invalid(hazard: &str, field: &str, reason: impl Into<String>) -> ConfigError {
        ConfigError::InvalidValue {
            hazard: hazard.to_string(),
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}
