//! Error types for client lifecycle operations.

use std::fmt;
use std::path::PathBuf;

use ovpn_validation::{CommandError, ValidationError};
use thiserror::Error;

/// Result type alias for lifecycle operations.
pub type Result<T> = std::result::Result<T, Error>;

/// A file the lifecycle manager expects under the installation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Artifact {
    /// The base client configuration template.
    ClientTemplate,
    /// The CA certificate (`pki/ca.crt`).
    CaCertificate,
    /// A client certificate (`pki/issued/<name>.crt`).
    ClientCertificate,
    /// A client private key (`pki/private/<name>.key`).
    ClientKey,
}

impl fmt::Display for Artifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::ClientTemplate => "client template",
            Self::CaCertificate => "CA certificate",
            Self::ClientCertificate => "client certificate",
            Self::ClientKey => "client private key",
        };
        f.write_str(s)
    }
}

/// Errors that can occur while managing clients or reading session state.
#[derive(Debug, Error)]
pub enum Error {
    /// No supported easy-rsa layout exists on this host.
    #[error("no supported OpenVPN installation found (searched: {})", join_paths(.searched))]
    InstallationNotFound {
        /// easy-rsa roots that were probed, in order.
        searched: Vec<PathBuf>,
    },

    /// An external command exited non-zero, timed out or could not start.
    #[error("command '{command}' failed ({}): {stderr}", describe_exit(.exit_code))]
    CommandFailed {
        /// The command line that was run.
        command: String,
        /// Exit code, absent when the process never exited on its own.
        exit_code: Option<i32>,
        /// Captured diagnostics.
        stderr: String,
    },

    /// An expected certificate, key or template file is missing.
    #[error("{artifact} not found at {}", .path.display())]
    ArtifactNotFound {
        /// Which artifact is missing.
        artifact: Artifact,
        /// Where it was expected.
        path: PathBuf,
    },

    /// The status log does not exist or cannot be read.
    #[error("status log unavailable at {}: {reason}", .path.display())]
    LogUnavailable {
        /// Path of the status log.
        path: PathBuf,
        /// Underlying cause.
        reason: String,
    },

    /// The status log exists but its client list section cannot be located.
    #[error("status log format invalid: {reason}")]
    LogFormatInvalid {
        /// What was missing or out of place.
        reason: String,
    },

    /// A client name or other input was rejected before any work was done.
    #[error("invalid input: {0}")]
    InvalidInput(#[from] ValidationError),

    /// Reading a file under the installation failed.
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        /// File being accessed.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// Configuration could not be loaded or is inconsistent.
    #[error("configuration error: {0}")]
    Config(String),
}

fn join_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

#[allow(clippy::ref_option)]
fn describe_exit(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {code}"),
        None => "no exit code".to_string(),
    }
}

impl Error {
    /// Creates an `Io` error for `path`.
    #[must_use]
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Creates an `ArtifactNotFound` error.
    #[must_use]
    pub fn artifact_not_found(artifact: Artifact, path: impl Into<PathBuf>) -> Self {
        Self::ArtifactNotFound {
            artifact,
            path: path.into(),
        }
    }

    /// Returns true when no installation could be located.
    #[must_use]
    pub fn is_installation_missing(&self) -> bool {
        matches!(self, Self::InstallationNotFound { .. })
    }

    /// Returns true for missing certificate, key or template files.
    #[must_use]
    pub fn is_artifact_not_found(&self) -> bool {
        matches!(self, Self::ArtifactNotFound { .. })
    }

    /// Returns true for external command failures, including timeouts.
    #[must_use]
    pub fn is_command_failure(&self) -> bool {
        matches!(self, Self::CommandFailed { .. })
    }
}

impl From<CommandError> for Error {
    fn from(err: CommandError) -> Self {
        match err {
            CommandError::NonZeroExit {
                command,
                exit_code,
                stderr,
            } => Self::CommandFailed {
                command,
                exit_code: Some(exit_code),
                stderr,
            },
            CommandError::TimedOut {
                command,
                timeout_secs,
            } => Self::CommandFailed {
                command,
                exit_code: None,
                stderr: format!("timed out after {timeout_secs}s and was killed"),
            },
            CommandError::ExecutionFailed { command, message } => Self::CommandFailed {
                command,
                exit_code: None,
                stderr: message,
            },
            CommandError::ValidationFailed(e) => Self::InvalidInput(e),
        }
    }
}
