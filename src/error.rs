//! Error handling module for hyprstrap
//!
//! Only two things can stop an installation: a device path that does not
//! exist, and (under the halt policy) a failed external command. Everything
//! else is reported and the procedure moves on.

use std::path::PathBuf;

use thiserror::Error;

use crate::stage::{InstallStage, StageTransitionError};

/// Main error type for hyprstrap
#[derive(Error, Debug)]
pub enum InstallError {
    /// The selected device path is not present on the filesystem
    #[error("Device not found: {}", .0.display())]
    DeviceNotFound(PathBuf),

    /// The device size could not be queried or parsed
    #[error("Could not determine size of {}: {reason}", device.display())]
    DeviceSize { device: PathBuf, reason: String },

    /// A command failed while the halt-on-error policy was active
    #[error(
        "{stage} failed: `{command}` exited with {}",
        exit_code.map_or_else(|| "no exit code".to_string(), |c| format!("code {c}"))
    )]
    StepFailed {
        stage: InstallStage,
        command: String,
        exit_code: Option<i32>,
    },

    /// Configuration file could not be loaded, parsed or validated
    #[error("Configuration error: {0}")]
    Config(String),

    /// Validation errors (user input, config values)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Install stage machine transition errors
    #[error("Install transition error: {0}")]
    Transition(#[from] StageTransitionError),

    /// IO errors (prompt, console)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for installer operations
pub type Result<T> = std::result::Result<T, InstallError>;

impl InstallError {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Process exit status for this error.
    ///
    /// Every fatal error exits with 1; a missing device is the case the
    /// installer is built around, the rest follow it.
    pub fn exit_code(&self) -> i32 {
        1
    }

    /// True if the error was raised before any disk was touched.
    pub fn is_pre_destructive(&self) -> bool {
        matches!(
            self,
            Self::DeviceNotFound(_)
                | Self::DeviceSize { .. }
                | Self::Config(_)
                | Self::Validation(_)
        )
    }
}
