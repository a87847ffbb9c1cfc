//! CLI error types.

use std::fmt;

/// CLI-specific errors.
#[derive(Debug)]
pub enum CliError {
    /// Invalid configuration.
    Config(String),
    /// A lifecycle or log operation failed.
    Pki(ovpn_pki::Error),
    /// An operation reported failure; its outcome was already printed.
    Failed(String),
    /// Output formatting error.
    Format(String),
    /// IO error.
    Io(std::io::Error),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "configuration error: {msg}"),
            Self::Pki(e) => write!(f, "{e}"),
            Self::Failed(msg) => write!(f, "{msg}"),
            Self::Format(msg) => write!(f, "format error: {msg}"),
            Self::Io(e) => write!(f, "IO error: {e}"),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Pki(e) => Some(e),
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<ovpn_pki::Error> for CliError {
    fn from(err: ovpn_pki::Error) -> Self {
        match err {
            ovpn_pki::Error::Config(msg) => Self::Config(msg),
            other => Self::Pki(other),
        }
    }
}
