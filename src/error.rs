use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced by discovery, binding and the controller lookup API.
///
/// Unknown hardware codes are never turned into an error; they are logged and
/// dropped where they are routed.
#[derive(Debug, Error)]
pub enum InputError {
    /// No attached device satisfies the request. This is the normal state while
    /// waiting for a controller to be plugged in or paired, retry after a delay.
    #[error("No matching controller found: {message}")]
    NotFound { message: String },

    /// The caller asked for a control the controller doesn't have.
    #[error("Unknown control '{0}'")]
    UnknownControl(String),

    #[error("Failed to grab device {}: {source}", device.display())]
    Grab {
        device: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Invalid controller profile: {0}")]
    Profile(String),

    #[error(transparent)]
    Io(#[from] io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl InputError {
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    /// True for the "nothing attached yet" family of errors.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

pub type Result<T> = std::result::Result<T, InputError>;
