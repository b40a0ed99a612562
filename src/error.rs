//! WgPeer Error Types

use std::path::PathBuf;
use std::process::ExitStatus;

use thiserror::Error;

/// Result type alias for WgPeer operations
pub type Result<T> = std::result::Result<T, Error>;

/// WgPeer error types
#[derive(Error, Debug)]
pub enum Error {
    // Settings errors
    #[error("Settings file not found: {}", .0.display())]
    SettingsNotFound(PathBuf),

    #[error("Invalid settings file: {0}")]
    SettingsParse(#[from] dotenvy::Error),

    #[error("Missing required setting: {0}")]
    MissingSetting(&'static str),

    #[error("Invalid peer name: {0:?}")]
    InvalidPeerName(String),

    // Store errors
    #[error("Failed to {action} {}: {source}", .path.display())]
    Fs {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("File is empty: {}", .0.display())]
    EmptyFile(PathBuf),

    #[error("Peer already exists: {0}")]
    PeerExists(String),

    #[error("No free address left: slot {0} is beyond 10.0.0.254")]
    AddressSpaceExhausted(usize),

    #[error("Failed to lock {}: {source}", .path.display())]
    Lock {
        path: PathBuf,
        #[source]
        source: nix::Error,
    },

    // External process errors
    #[error("Failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} failed ({status}): {stderr}")]
    CommandFailed {
        program: String,
        status: ExitStatus,
        stderr: String,
    },

    #[error("{0} produced no output")]
    EmptyOutput(String),

    // Output
    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to write output: {0}")]
    Output(#[source] std::io::Error),
}

/// Broad class of a failure, used when reporting it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Settings source or command-line input
    Settings,
    /// Reading or writing the store
    Filesystem,
    /// An external command could not run or failed
    Process,
    /// Producing the command's own output
    Output,
}

impl Error {
    /// Wrap an I/O error with the action and path that caused it
    pub fn fs(action: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Fs {
            action,
            path: path.into(),
            source,
        }
    }

    /// Classify this error
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::SettingsNotFound(_)
            | Error::SettingsParse(_)
            | Error::MissingSetting(_)
            | Error::InvalidPeerName(_) => ErrorCategory::Settings,
            Error::Spawn { .. } | Error::CommandFailed { .. } | Error::EmptyOutput(_) => {
                ErrorCategory::Process
            }
            Error::Fs { .. }
            | Error::EmptyFile(_)
            | Error::PeerExists(_)
            | Error::AddressSpaceExhausted(_)
            | Error::Lock { .. } => ErrorCategory::Filesystem,
            Error::Json(_) | Error::Output(_) => ErrorCategory::Output,
        }
    }
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ErrorCategory::Settings => "settings",
            ErrorCategory::Filesystem => "filesystem",
            ErrorCategory::Process => "process",
            ErrorCategory::Output => "output",
        };
        f.write_str(name)
    }
}
