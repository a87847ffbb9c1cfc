//! Manager configuration.
//!
//! Every field has a default, so an empty file is a valid configuration:
//!
//! ```toml
//! validity_days = 825
//! crl_owner = "openvpn:openvpn"
//!
//! [[layouts]]
//! name = "custom"
//! easy_rsa = "/opt/openvpn/easy-rsa"
//! client_template = "/opt/openvpn/client.txt"
//! tls_crypt = "/opt/openvpn/tc.key"
//! crl_destination = "/opt/openvpn/crl.pem"
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use ovpn_validation::{sanitize_owner, SystemExecutor, DEFAULT_SEARCH_PATH};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::layout::{default_layouts, Layout, Locator};
use crate::sessions::DEFAULT_STATUS_LOG;

/// Default certificate and CRL validity.
pub const DEFAULT_VALIDITY_DAYS: u32 = 3650;

/// Default owner of the published CRL.
pub const DEFAULT_CRL_OWNER: &str = ovpn_validation::NOBODY_OWNER;

/// Default per-command timeout in seconds.
pub const DEFAULT_COMMAND_TIMEOUT_SECS: u64 = 120;

/// Configuration for a [`crate::ClientManager`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ManagerConfig {
    /// Candidate layouts in precedence order.
    pub layouts: Vec<Layout>,
    /// `--days` passed to `build-client-full` and `gen-crl`.
    pub validity_days: u32,
    /// `user[:group]` given to the published CRL.
    pub crl_owner: String,
    /// Upper bound on each external command.
    pub command_timeout_secs: u64,
    /// `PATH` handed to external commands.
    pub search_path: String,
    /// OpenVPN status log.
    pub status_log: PathBuf,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            layouts: default_layouts(),
            validity_days: DEFAULT_VALIDITY_DAYS,
            crl_owner: DEFAULT_CRL_OWNER.to_string(),
            command_timeout_secs: DEFAULT_COMMAND_TIMEOUT_SECS,
            search_path: DEFAULT_SEARCH_PATH.to_string(),
            status_log: PathBuf::from(DEFAULT_STATUS_LOG),
        }
    }
}

impl ManagerConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or validated.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!(
                "failed to read config file '{}': {e}",
                path.display()
            ))
        })?;

        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is invalid or fails validation.
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(content).map_err(|e| Error::Config(format!("invalid TOML: {e}")))?;

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any value is out of range.
    pub fn validate(&self) -> Result<()> {
        if self.layouts.is_empty() {
            return Err(Error::Config(
                "at least one layout must be configured".to_string(),
            ));
        }

        for layout in &self.layouts {
            if layout.name.trim().is_empty() {
                return Err(Error::Config("layout name cannot be empty".to_string()));
            }
            if !layout.easy_rsa.is_absolute() {
                return Err(Error::Config(format!(
                    "layout '{}': easy_rsa must be an absolute path",
                    layout.name
                )));
            }
        }

        if self.validity_days == 0 {
            return Err(Error::Config(
                "validity_days must be greater than 0".to_string(),
            ));
        }

        if self.command_timeout_secs == 0 {
            return Err(Error::Config(
                "command_timeout_secs must be greater than 0".to_string(),
            ));
        }

        if self.search_path.trim().is_empty() {
            return Err(Error::Config("search_path cannot be empty".to_string()));
        }

        sanitize_owner(&self.crl_owner)
            .map_err(|e| Error::Config(format!("crl_owner: {e}")))?;

        Ok(())
    }

    /// Per-command timeout.
    #[must_use]
    pub fn command_timeout(&self) -> Duration {
        Duration::from_secs(self.command_timeout_secs)
    }

    /// Locator over the configured layouts.
    #[must_use]
    pub fn locator(&self) -> Locator {
        Locator::new(self.layouts.clone())
    }

    /// Process executor honoring the configured search path and timeout.
    #[must_use]
    pub fn executor(&self) -> SystemExecutor {
        SystemExecutor::new()
            .with_search_path(&self.search_path)
            .with_timeout(self.command_timeout())
    }
}
