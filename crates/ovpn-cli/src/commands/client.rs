//! Client lifecycle commands: list, create, remove, refresh-crl, config.

use std::io::Write;
use std::path::{Path, PathBuf};

use ovpn_pki::{bundle_file_name, Change, ClientManager, Outcome};
use ovpn_validation::{CommandExecutor, SystemExecutor};
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::error::CliError;
use crate::output::{ClientBundle, ClientList, OutputFormat};

/// Client command executor.
pub struct ClientCommand<E = SystemExecutor> {
    manager: ClientManager<E>,
}

impl<E: CommandExecutor> ClientCommand<E> {
    /// Create a client command over `manager`.
    #[must_use]
    pub fn new(manager: ClientManager<E>) -> Self {
        Self { manager }
    }

    /// The underlying manager.
    #[must_use]
    pub fn manager(&self) -> &ClientManager<E> {
        &self.manager
    }

    /// List active clients.
    ///
    /// # Errors
    ///
    /// Returns an error if the index cannot be read or output fails.
    pub async fn list<W: Write>(&self, writer: &mut W, format: &OutputFormat) -> Result<(), CliError> {
        let clients = self.manager.list().await?;
        format.write(writer, &ClientList { clients })
    }

    /// Issue a new client.
    ///
    /// # Errors
    ///
    /// Returns [`CliError::Failed`] after printing the outcome if creation fails.
    pub async fn create<W: Write>(
        &self,
        writer: &mut W,
        format: &OutputFormat,
        name: &str,
    ) -> Result<(), CliError> {
        let result = self.manager.create(name).await;
        report(writer, format, Outcome::from_result(result, |change| match change {
            Change::Applied => format!("client '{name}' created"),
            Change::Unchanged => format!("client '{name}' already exists"),
        }))
    }

    /// Revoke a client.
    ///
    /// # Errors
    ///
    /// Returns [`CliError::Failed`] after printing the outcome if revocation fails.
    pub async fn remove<W: Write>(
        &self,
        writer: &mut W,
        format: &OutputFormat,
        name: &str,
    ) -> Result<(), CliError> {
        let result = self.manager.remove(name).await;
        report(writer, format, Outcome::from_result(result, |change| match change {
            Change::Applied => format!("client '{name}' revoked"),
            Change::Unchanged => format!("client '{name}' is not active"),
        }))
    }

    /// Regenerate and publish the CRL.
    ///
    /// # Errors
    ///
    /// Returns [`CliError::Failed`] after printing the outcome if any step fails.
    pub async fn refresh_crl<W: Write>(
        &self,
        writer: &mut W,
        format: &OutputFormat,
    ) -> Result<(), CliError> {
        let result = self.manager.refresh_crl().await;
        report(writer, format, Outcome::from_result(result, |()| "CRL published".to_string()))
    }

    /// Print the client's bundle, or save it when `output` is given.
    ///
    /// # Errors
    ///
    /// Returns an error if the bundle cannot be rendered or written.
    pub async fn config<W: Write>(
        &self,
        writer: &mut W,
        format: &OutputFormat,
        name: &str,
        output: Option<&Path>,
    ) -> Result<(), CliError> {
        let config = self.manager.get_config(name).await?;

        let Some(output) = output else {
            let bundle = ClientBundle {
                client: name.to_string(),
                file_name: bundle_file_name(name),
                config,
            };
            return format.write(writer, &bundle);
        };

        let path = bundle_destination(output, name);
        write_private(&path, &config).await?;
        debug!(client = %name, path = %path.display(), "wrote client bundle");

        format.write(
            writer,
            &Outcome::ok(format!(
                "configuration for '{name}' written to {}",
                path.display()
            )),
        )
    }
}

/// Print `outcome` and turn a failure into an error for the exit status.
fn report<W: Write>(writer: &mut W, format: &OutputFormat, outcome: Outcome) -> Result<(), CliError> {
    format.write(writer, &outcome)?;
    if outcome.success {
        Ok(())
    } else {
        Err(CliError::Failed(outcome.message))
    }
}

fn bundle_destination(output: &Path, name: &str) -> PathBuf {
    if output.is_dir() {
        output.join(bundle_file_name(name))
    } else {
        output.to_path_buf()
    }
}

/// Bundles embed the client's private key; the file is owner-only from creation.
async fn write_private(path: &Path, contents: &str) -> Result<(), CliError> {
    let mut options = tokio::fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    options.mode(0o600);

    let mut file = options.open(path).await?;

    // An existing file keeps its old mode on open.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        file.set_permissions(std::fs::Permissions::from_mode(0o600)).await?;
    }

    file.write_all(contents.as_bytes()).await?;
    file.sync_all().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Format;
    use ovpn_pki::{Layout, Locator};
    use ovpn_validation::FakeExecutor;
    use std::fs;

    fn fixture(root: &Path) -> ClientCommand<FakeExecutor> {
        let pki = root.join("easy-rsa/pki");
        fs::create_dir_all(pki.join("issued")).expect("mkdir");
        fs::create_dir_all(pki.join("private")).expect("mkdir");
        fs::write(root.join("client-template.txt"), "client\ncipher AES-256-CBC\n").expect("write");
        fs::write(pki.join("ca.crt"), "CA").expect("write");
        fs::write(pki.join("issued/alice.crt"), "CERT").expect("write");
        fs::write(pki.join("private/alice.key"), "KEY").expect("write");
        fs::write(pki.join("index.txt"), "V\t1\t\t01\tunknown\t/CN=alice\n").expect("write");

        let locator = Locator::new(vec![Layout::rooted_at("test", root)]);
        ClientCommand::new(ClientManager::new(locator, FakeExecutor::new()))
    }

    fn output(buf: Vec<u8>) -> String {
        String::from_utf8(buf).expect("utf-8")
    }

    #[tokio::test]
    async fn list_prints_clients() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let cmd = fixture(tmp.path());
        let mut buf = Vec::new();

        cmd.list(&mut buf, &OutputFormat::default()).await.expect("list");
        assert!(output(buf).contains("alice"));
    }

    #[tokio::test]
    async fn create_reports_outcome() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let cmd = fixture(tmp.path());
        let mut buf = Vec::new();

        cmd.create(&mut buf, &OutputFormat::default(), "bob")
            .await
            .expect("create");
        assert_eq!(output(buf), "OK: client 'bob' created\n");
        assert_eq!(cmd.manager().executor().invocations().len(), 1);
    }

    #[tokio::test]
    async fn create_existing_reports_already_exists() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let cmd = fixture(tmp.path());
        let mut buf = Vec::new();

        cmd.create(&mut buf, &OutputFormat::default(), "alice")
            .await
            .expect("create");
        assert_eq!(output(buf), "OK: client 'alice' already exists\n");
    }

    #[tokio::test]
    async fn failed_remove_prints_outcome_and_errors() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let cmd = fixture(tmp.path());
        cmd.manager().executor().push_failure(1, "revoke failed");
        let mut buf = Vec::new();

        let err = cmd
            .remove(&mut buf, &OutputFormat::new(Format::Json), "alice")
            .await
            .unwrap_err();
        assert!(matches!(err, CliError::Failed(_)));

        let printed: serde_json::Value = serde_json::from_slice(&buf).expect("json outcome");
        assert_eq!(printed["success"], false);
        assert!(printed["message"]
            .as_str()
            .is_some_and(|m| m.contains("revoke failed")));
    }

    #[tokio::test]
    async fn invalid_name_is_a_failed_outcome() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let cmd = fixture(tmp.path());
        let mut buf = Vec::new();

        let result = cmd.create(&mut buf, &OutputFormat::default(), "../etc").await;
        assert!(result.is_err());
        assert!(output(buf).starts_with("FAILED: invalid input"));
        assert!(cmd.manager().executor().invocations().is_empty());
    }

    #[tokio::test]
    async fn config_prints_bundle() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let cmd = fixture(tmp.path());
        let mut buf = Vec::new();

        cmd.config(&mut buf, &OutputFormat::default(), "alice", None)
            .await
            .expect("config");
        let text = output(buf);
        assert!(text.starts_with("client\ncipher AES-128-CBC\n"));
        assert!(text.contains("<key>\nKEY\n</key>\n"));
    }

    #[tokio::test]
    async fn config_writes_into_directory() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let cmd = fixture(tmp.path());
        let out_dir = tempfile::tempdir().expect("tempdir");
        let mut buf = Vec::new();

        cmd.config(&mut buf, &OutputFormat::default(), "alice", Some(out_dir.path()))
            .await
            .expect("config");

        let written = out_dir.path().join("alice.ovpn");
        assert!(fs::read_to_string(&written).expect("bundle").contains("<cert>\nCERT\n</cert>"));
        assert!(output(buf).starts_with("OK: configuration for 'alice' written to"));

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = fs::metadata(&written).expect("metadata").permissions().mode();
            assert_eq!(mode & 0o777, 0o600);
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn config_narrows_existing_target_before_writing() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = tempfile::tempdir().expect("tempdir");
        let cmd = fixture(tmp.path());
        let target = tmp.path().join("alice-old.ovpn");
        fs::write(&target, "stale contents that are much longer than the bundle itself ".repeat(4))
            .expect("write");
        fs::set_permissions(&target, fs::Permissions::from_mode(0o644)).expect("chmod");
        let mut buf = Vec::new();

        cmd.config(&mut buf, &OutputFormat::default(), "alice", Some(&target))
            .await
            .expect("config");

        let mode = fs::metadata(&target).expect("metadata").permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
        let written = fs::read_to_string(&target).expect("bundle");
        assert!(written.starts_with("client\n"));
        assert!(!written.contains("stale"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn private_write_creates_owner_only_file() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = tempfile::tempdir().expect("tempdir");
        let path = tmp.path().join("fresh.ovpn");

        write_private(&path, "<key>\nKEY\n</key>\n").await.expect("write");

        let mode = fs::metadata(&path).expect("metadata").permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
        assert_eq!(fs::read_to_string(&path).expect("read"), "<key>\nKEY\n</key>\n");
    }

    #[tokio::test]
    async fn config_for_unknown_client_fails() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let cmd = fixture(tmp.path());
        let mut buf = Vec::new();

        let err = cmd
            .config(&mut buf, &OutputFormat::default(), "ghost", None)
            .await
            .unwrap_err();
        assert!(matches!(err, CliError::Pki(e) if e.is_artifact_not_found()));
        assert!(buf.is_empty());
    }
}
