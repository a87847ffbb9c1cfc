//! Connected session listing from the OpenVPN status log.

use std::io::Write;
use std::path::PathBuf;

use ovpn_pki::parse_active_sessions;

use crate::error::CliError;
use crate::output::{OutputFormat, SessionList};

/// Sessions command executor.
pub struct SessionsCommand {
    status_log: PathBuf,
}

impl SessionsCommand {
    /// Create a sessions command reading `status_log`.
    #[must_use]
    pub fn new(status_log: impl Into<PathBuf>) -> Self {
        Self {
            status_log: status_log.into(),
        }
    }

    /// Execute the sessions command.
    ///
    /// # Errors
    ///
    /// Returns an error if the log is missing, malformed or output fails.
    pub async fn execute<W: Write>(&self, writer: &mut W, format: &OutputFormat) -> Result<(), CliError> {
        let sessions = parse_active_sessions(&self.status_log).await?;
        format.write(writer, &SessionList { sessions })
    }
}
