//! End-to-end tests for the `ovpn-admin` binary.
//!
//! Only read paths and pre-command failures are exercised here; nothing in
//! these tests needs a real easy-rsa.

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const STATUS: &str = "\
OpenVPN CLIENT LIST
Updated,Tue Mar 12 09:41:07 2024
Common Name,Real Address,Bytes Received,Bytes Sent,Connected Since
alice,203.0.113.7:51234,4096,1024,Tue Mar 12 08:02:44 2024
bob,198.51.100.20:40112,0,0,Tue Mar 12 09:15:02 2024
ROUTING TABLE
";

/// A temp OpenVPN tree with one active and one revoked client, plus a
/// config file pointing at it.
struct Fixture {
    dir: TempDir,
}

impl Fixture {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        let pki = root.join("easy-rsa/pki");
        fs::create_dir_all(pki.join("issued")).unwrap();
        fs::create_dir_all(pki.join("private")).unwrap();

        fs::write(root.join("client-template.txt"), "client\ndev tun\ncipher AES-256-CBC\n").unwrap();
        fs::write(root.join("tls-crypt.key"), "STATIC").unwrap();
        fs::write(pki.join("ca.crt"), "CA").unwrap();
        fs::write(pki.join("issued/alice.crt"), "ALICE-CERT").unwrap();
        fs::write(pki.join("private/alice.key"), "ALICE-KEY").unwrap();
        fs::write(
            pki.join("index.txt"),
            "V\t360101000000Z\t\t01\tunknown\t/CN=alice\nR\t360101000000Z\t240101000000Z\t02\tunknown\t/CN=bob\n",
        )
        .unwrap();
        fs::write(root.join("status.log"), STATUS).unwrap();

        let fixture = Self { dir };
        fixture.write_config(&fixture.root().to_path_buf());
        fixture
    }

    fn root(&self) -> &Path {
        self.dir.path()
    }

    fn config_path(&self) -> PathBuf {
        self.root().join("ovpn-admin.toml")
    }

    fn write_config(&self, layout_root: &Path) {
        let config = format!(
            r#"
status_log = '{status}'

[[layouts]]
name = "fixture"
easy_rsa = '{root}/easy-rsa'
client_template = '{root}/client-template.txt'
tls_crypt = '{root}/tls-crypt.key'
crl_destination = '{root}/crl.pem'
"#,
            status = self.root().join("status.log").display(),
            root = layout_root.display(),
        );
        fs::write(self.config_path(), config).unwrap();
    }

    fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("ovpn-admin").unwrap();
        cmd.env_remove("OVPN_STATUS_LOG")
            .env_remove("RUST_LOG")
            .env("OVPN_ADMIN_CONFIG", self.config_path());
        cmd
    }
}

#[test]
fn help_lists_commands() {
    Command::cargo_bin("ovpn-admin")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("refresh-crl"))
        .stdout(predicate::str::contains("sessions"));
}

#[test]
fn list_shows_only_valid_clients() {
    let fixture = Fixture::new();
    fixture
        .cmd()
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("alice"))
        .stdout(predicate::str::contains("bob").not());
}

#[test]
fn list_without_installation_is_empty() {
    let fixture = Fixture::new();
    fixture.write_config(&fixture.root().join("elsewhere"));

    fixture
        .cmd()
        .args(["--format", "json", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"clients\": []"));
}

#[test]
fn config_prints_inline_bundle() {
    let fixture = Fixture::new();
    fixture
        .cmd()
        .args(["config", "alice"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("client\ndev tun\ncipher AES-128-CBC\n"))
        .stdout(predicate::str::contains("<cert>\nALICE-CERT\n</cert>"))
        .stdout(predicate::str::ends_with("<tls-crypt>\nSTATIC\n</tls-crypt>\n"));
}

#[test]
fn config_writes_file() {
    let fixture = Fixture::new();
    let out = fixture.root().join("out");
    fs::create_dir(&out).unwrap();

    fixture
        .cmd()
        .args(["config", "alice", "-o"])
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::starts_with("OK: "));

    assert!(out.join("alice.ovpn").exists());
}

#[test]
fn config_for_unknown_client_fails() {
    let fixture = Fixture::new();
    fixture
        .cmd()
        .args(["config", "mallory"])
        .assert()
        .failure()
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("client certificate not found"));
}

#[test]
fn invalid_name_fails_before_running_anything() {
    let fixture = Fixture::new();
    fixture
        .cmd()
        .args(["--format", "json", "create", "../../etc/passwd"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("\"success\": false"));
}

#[test]
fn removing_inactive_client_is_a_no_op() {
    let fixture = Fixture::new();
    fixture
        .cmd()
        .args(["remove", "bob"])
        .assert()
        .success()
        .stdout("OK: client 'bob' is not active\n");
}

#[test]
fn info_reports_layout() {
    let fixture = Fixture::new();
    fixture
        .cmd()
        .arg("info")
        .assert()
        .success()
        .stdout(predicate::str::contains("Layout:           fixture"))
        .stdout(predicate::str::contains("(tls-crypt)"));
}

#[test]
fn info_without_installation_fails() {
    let fixture = Fixture::new();
    fixture.write_config(&fixture.root().join("elsewhere"));

    fixture
        .cmd()
        .arg("info")
        .assert()
        .failure()
        .stderr(predicate::str::contains("no supported OpenVPN installation found"));
}

#[test]
fn sessions_from_configured_log() {
    let fixture = Fixture::new();
    fixture
        .cmd()
        .arg("sessions")
        .assert()
        .success()
        .stdout(predicate::str::contains("alice"))
        .stdout(predicate::str::contains("Total: 2 session(s)"));
}

#[test]
fn sessions_log_flag_overrides_config() {
    let fixture = Fixture::new();
    fixture
        .cmd()
        .args(["sessions", "--log"])
        .arg(fixture.root().join("missing.log"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("status log unavailable"));
}

#[test]
fn invalid_config_is_reported() {
    let fixture = Fixture::new();
    fs::write(fixture.config_path(), "validity_days = 0\n").unwrap();

    fixture
        .cmd()
        .arg("list")
        .assert()
        .failure()
        .stderr(predicate::str::contains("validity_days must be greater than 0"));
}
