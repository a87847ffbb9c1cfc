//! Installation details.

use std::io::Write;
use std::path::PathBuf;

use ovpn_pki::{Installation, CONFIG_EXTENSION, VPN_NAME};

use crate::error::CliError;
use crate::output::{InstallationInfo, OutputFormat};

/// Info command executor.
pub struct InfoCommand {
    status_log: PathBuf,
}

impl InfoCommand {
    /// Create an info command; `status_log` is reported alongside the installation.
    #[must_use]
    pub fn new(status_log: impl Into<PathBuf>) -> Self {
        Self {
            status_log: status_log.into(),
        }
    }

    /// Describe `installation`.
    #[must_use]
    pub fn describe(&self, installation: &Installation) -> InstallationInfo {
        InstallationInfo {
            vpn: VPN_NAME.to_string(),
            extension: CONFIG_EXTENSION.to_string(),
            layout: installation.layout_name().to_string(),
            easy_rsa: installation.easy_rsa().to_path_buf(),
            pki: installation.pki().to_path_buf(),
            client_template: installation.client_template().map(PathBuf::from),
            tunnel_key: installation.tunnel_key().cloned(),
            crl_destination: installation.crl_destination().to_path_buf(),
            status_log: self.status_log.clone(),
        }
    }

    /// Execute the info command.
    ///
    /// # Errors
    ///
    /// Returns an error if output fails.
    pub fn execute<W: Write>(
        &self,
        writer: &mut W,
        format: &OutputFormat,
        installation: &Installation,
    ) -> Result<(), CliError> {
        format.write(writer, &self.describe(installation))
    }
}
