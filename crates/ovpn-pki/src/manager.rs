//! Client lifecycle operations on top of easy-rsa.
//!
//! The manager discovers the installation lazily on first use and then
//! keeps it for its whole lifetime. Mutations run easy-rsa through a
//! [`CommandExecutor`]; reads go straight to the PKI tree.
//!
//! # Example
//!
//! ```rust,no_run
//! # async fn example() -> ovpn_pki::Result<()> {
//! use ovpn_pki::{ClientManager, ManagerConfig};
//!
//! let manager = ClientManager::from_config(&ManagerConfig::default())?;
//! manager.create("alice").await?;
//! let bundle = manager.get_config("alice").await?;
//! assert!(bundle.contains("<cert>"));
//! # Ok(())
//! # }
//! ```

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use once_cell::sync::OnceCell;
use ovpn_validation::{
    nobody_owner, sanitize_client_name, sanitize_owner, AllowedProgram, ClientName, CommandExecutor,
    OwnerSpec, SafeCommand, Sanitized, SystemExecutor,
};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::bundle::BundleMaterial;
use crate::config::{ManagerConfig, DEFAULT_VALIDITY_DAYS};
use crate::error::{Artifact, Error, Result};
use crate::index::list_active_clients;
use crate::layout::{Installation, Locator};
use crate::lock::ClientLocks;

/// Whether a mutation changed the PKI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Change {
    /// The command sequence ran to completion.
    Applied,
    /// The client was already in the requested state.
    Unchanged,
}

impl Change {
    /// Returns true if the PKI was modified.
    #[must_use]
    pub const fn is_applied(self) -> bool {
        matches!(self, Self::Applied)
    }
}

/// Creates, revokes and exports OpenVPN clients.
#[derive(Debug)]
pub struct ClientManager<E = SystemExecutor> {
    locator: Locator,
    installation: OnceCell<Installation>,
    executor: E,
    validity_days: u32,
    crl_owner: Sanitized<OwnerSpec>,
    locks: ClientLocks,
}

impl ClientManager<SystemExecutor> {
    /// Build a manager that runs real processes per `config`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the configuration does not validate.
    pub fn from_config(config: &ManagerConfig) -> Result<Self> {
        config.validate()?;
        Self::new(config.locator(), config.executor())
            .with_validity_days(config.validity_days)
            .with_crl_owner(&config.crl_owner)
    }
}

impl<E: CommandExecutor> ClientManager<E> {
    /// Create a manager with default validity and CRL owner.
    #[must_use]
    pub fn new(locator: Locator, executor: E) -> Self {
        Self {
            locator,
            installation: OnceCell::new(),
            executor,
            validity_days: DEFAULT_VALIDITY_DAYS,
            crl_owner: nobody_owner(),
            locks: ClientLocks::new(),
        }
    }

    /// Set `--days` for issued certificates and CRLs.
    #[must_use]
    pub fn with_validity_days(mut self, days: u32) -> Self {
        self.validity_days = days;
        self
    }

    /// Set the owner of the published CRL.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if `owner` is not a `user[:group]` spec.
    pub fn with_crl_owner(mut self, owner: &str) -> Result<Self> {
        self.crl_owner = sanitize_owner(owner)?;
        Ok(self)
    }

    /// The command executor.
    #[must_use]
    pub fn executor(&self) -> &E {
        &self.executor
    }

    /// Configured validity in days.
    #[must_use]
    pub fn validity_days(&self) -> u32 {
        self.validity_days
    }

    /// The installation, discovered on first call.
    ///
    /// A failed discovery is not cached; the next call probes again.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InstallationNotFound`] if no layout is present.
    pub fn installation(&self) -> Result<&Installation> {
        self.installation.get_or_try_init(|| self.locator.resolve())
    }

    /// Names of active clients in index order.
    ///
    /// A host without an installation has no clients.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the index exists but cannot be read.
    pub async fn list(&self) -> Result<Vec<String>> {
        let installation = match self.installation() {
            Ok(installation) => installation,
            Err(e) if e.is_installation_missing() => {
                debug!(error = %e, "listing clients without an installation");
                return Ok(Vec::new());
            }
            Err(e) => return Err(e),
        };

        list_active_clients(installation).await
    }

    /// Issue a certificate and key for `name`.
    ///
    /// Does nothing if `name` is already active.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] for a bad name, and
    /// [`Error::CommandFailed`] if easy-rsa fails.
    pub async fn create(&self, name: &str) -> Result<Change> {
        let name = sanitize_client_name(name)?;
        let installation = self.installation()?;
        let _guard = self.locks.acquire(name.as_str()).await;

        if self.is_active(installation, &name).await? {
            info!(client = %name, "client already active");
            return Ok(Change::Unchanged);
        }

        info!(client = %name, days = self.validity_days, "issuing client certificate");
        SafeCommand::new(AllowedProgram::EasyRsa)
            .current_dir(installation.easy_rsa())
            .arg("--batch")
            .arg(self.days_arg())
            .arg("build-client-full")
            .arg(name.as_str())
            .arg("nopass")
            .execute_with(&self.executor)
            .await?;

        Ok(Change::Applied)
    }

    /// Revoke `name` and publish the regenerated CRL.
    ///
    /// Does nothing if `name` is not active. A failure after revocation
    /// leaves the client revoked but not yet enforced; recover with
    /// [`Self::refresh_crl`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] for a bad name, and
    /// [`Error::CommandFailed`] for the first step that fails.
    pub async fn remove(&self, name: &str) -> Result<Change> {
        let name = sanitize_client_name(name)?;
        let installation = self.installation()?;
        let _guard = self.locks.acquire(name.as_str()).await;

        if !self.is_active(installation, &name).await? {
            info!(client = %name, "client not active");
            return Ok(Change::Unchanged);
        }

        info!(client = %name, "revoking client certificate");
        SafeCommand::new(AllowedProgram::EasyRsa)
            .current_dir(installation.easy_rsa())
            .arg("--batch")
            .arg("revoke")
            .arg(name.as_str())
            .execute_with(&self.executor)
            .await?;

        if let Err(e) = self.publish_crl(installation).await {
            warn!(
                client = %name,
                error = %e,
                "client revoked but CRL not published; run refresh-crl"
            );
            return Err(e);
        }

        Ok(Change::Applied)
    }

    /// Regenerate the CRL and publish it for the server.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CommandFailed`] for the first step that fails.
    pub async fn refresh_crl(&self) -> Result<()> {
        let installation = self.installation()?;
        self.publish_crl(installation).await
    }

    /// Render the inline `.ovpn` bundle for `name`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ArtifactNotFound`] if the template, CA, certificate
    /// or key is missing, and [`Error::Io`] for other read failures.
    pub async fn get_config(&self, name: &str) -> Result<String> {
        let name = sanitize_client_name(name)?;
        let installation = self.installation()?;

        let template_path = installation.client_template().ok_or_else(|| {
            Error::artifact_not_found(Artifact::ClientTemplate, expected_template(installation))
        })?;

        let template = read_artifact(Artifact::ClientTemplate, template_path).await?;
        let cert = read_artifact(
            Artifact::ClientCertificate,
            &installation.cert_path(name.as_str()),
        )
        .await?;
        let key = read_artifact(Artifact::ClientKey, &installation.key_path(name.as_str())).await?;
        let ca = read_artifact(Artifact::CaCertificate, &installation.ca_path()).await?;

        let tunnel_key = match installation.tunnel_key() {
            Some(tunnel_key) => match tokio::fs::read_to_string(&tunnel_key.path).await {
                Ok(body) => Some((tunnel_key.kind, body)),
                Err(e) => {
                    warn!(
                        path = %tunnel_key.path.display(),
                        error = %e,
                        "tunnel key no longer readable, omitting it"
                    );
                    None
                }
            },
            None => None,
        };

        debug!(client = %name, "rendering client bundle");
        Ok(BundleMaterial {
            template,
            ca,
            cert,
            key,
            tunnel_key,
        }
        .render())
    }

    async fn is_active(
        &self,
        installation: &Installation,
        name: &Sanitized<ClientName>,
    ) -> Result<bool> {
        let active = list_active_clients(installation).await?;
        Ok(active.iter().any(|n| n == name.as_str()))
    }

    async fn publish_crl(&self, installation: &Installation) -> Result<()> {
        SafeCommand::new(AllowedProgram::EasyRsa)
            .current_dir(installation.easy_rsa())
            .arg("--batch")
            .arg(self.days_arg())
            .arg("gen-crl")
            .execute_with(&self.executor)
            .await?;

        let destination = installation.crl_destination();
        SafeCommand::new(AllowedProgram::Copy)
            .path_arg(installation.crl_path())
            .path_arg(destination)
            .execute_with(&self.executor)
            .await?;

        SafeCommand::new(AllowedProgram::Chown)
            .arg(self.crl_owner.as_str())
            .path_arg(destination)
            .execute_with(&self.executor)
            .await?;

        info!(crl = %destination.display(), owner = %self.crl_owner, "published CRL");
        Ok(())
    }

    fn days_arg(&self) -> String {
        format!("--days={}", self.validity_days)
    }
}

fn expected_template(installation: &Installation) -> PathBuf {
    installation
        .layout()
        .client_template
        .clone()
        .unwrap_or_else(|| installation.easy_rsa().join("client-template.txt"))
}

async fn read_artifact(artifact: Artifact, path: &Path) -> Result<String> {
    match tokio::fs::read_to_string(path).await {
        Ok(contents) => Ok(contents),
        Err(e) if e.kind() == ErrorKind::NotFound => Err(Error::artifact_not_found(artifact, path)),
        Err(e) => Err(Error::io(path, e)),
    }
}
