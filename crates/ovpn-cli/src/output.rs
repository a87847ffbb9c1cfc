//! Output formatting for CLI commands.
//!
//! Supports table (human-readable) and JSON output formats.

use std::io::Write;
use std::path::PathBuf;

use ovpn_pki::{Outcome, SessionRecord, TunnelKey};
use serde::Serialize;

use crate::cli::Format;
use crate::error::CliError;

/// Output formatter that handles both table and JSON output.
#[derive(Debug, Clone)]
pub struct OutputFormat {
    format: Format,
}

impl OutputFormat {
    /// Create a new output formatter.
    #[must_use]
    pub const fn new(format: Format) -> Self {
        Self { format }
    }

    /// Write a serializable value to the output.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub fn write<W, T>(&self, writer: &mut W, value: &T) -> Result<(), CliError>
    where
        W: Write,
        T: Serialize + TableDisplay,
    {
        match self.format {
            Format::Json => {
                serde_json::to_writer_pretty(&mut *writer, value)
                    .map_err(|e| CliError::Format(format!("JSON serialization failed: {e}")))?;
                writeln!(writer)?;
            }
            Format::Table => {
                value.write_table(writer)?;
            }
        }
        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn to_string<T>(&self, value: &T) -> Result<String, CliError>
    where
        T: Serialize + TableDisplay,
    {
        let mut buf = Vec::new();
        self.write(&mut buf, value)?;
        String::from_utf8(buf).map_err(|e| CliError::Format(format!("UTF-8 error: {e}")))
    }
}

impl Default for OutputFormat {
    fn default() -> Self {
        Self::new(Format::Table)
    }
}

/// Trait for types that can be displayed as a table.
pub trait TableDisplay {
    /// Write the value as a human-readable table.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError>;
}

impl TableDisplay for Outcome {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        let status = if self.success { "OK" } else { "FAILED" };
        writeln!(writer, "{status}: {}", self.message)?;
        Ok(())
    }
}

/// Active clients.
#[derive(Debug, Clone, Serialize)]
pub struct ClientList {
    /// Client names in issue order.
    pub clients: Vec<String>,
}

impl TableDisplay for ClientList {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        if self.clients.is_empty() {
            writeln!(writer, "No active clients")?;
            return Ok(());
        }

        writeln!(writer, "CLIENT")?;
        writeln!(writer, "{}", "─".repeat(32))?;
        for client in &self.clients {
            writeln!(writer, "{client}")?;
        }

        writeln!(writer)?;
        writeln!(writer, "Total: {} client(s)", self.clients.len())?;
        Ok(())
    }
}

/// Connected sessions.
#[derive(Debug, Clone, Serialize)]
pub struct SessionList {
    /// Sessions in log order.
    pub sessions: Vec<SessionRecord>,
}

impl TableDisplay for SessionList {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        if self.sessions.is_empty() {
            writeln!(writer, "No connected clients")?;
            return Ok(());
        }

        writeln!(
            writer,
            "{:<24}  {:<22}  {:>12}  {:>12}  {:<24}",
            "CLIENT", "ADDRESS", "RECEIVED", "SENT", "CONNECTED SINCE"
        )?;
        writeln!(writer, "{}", "─".repeat(102))?;

        for session in &self.sessions {
            writeln!(
                writer,
                "{:<24}  {:<22}  {:>12}  {:>12}  {:<24}",
                truncate(&session.common_name, 24),
                truncate(&session.real_address, 22),
                format_bytes(session.bytes_received),
                format_bytes(session.bytes_sent),
                session.connected_since
            )?;
        }

        writeln!(writer)?;
        writeln!(writer, "Total: {} session(s)", self.sessions.len())?;
        Ok(())
    }
}

/// Detected installation.
#[derive(Debug, Clone, Serialize)]
pub struct InstallationInfo {
    /// VPN type.
    pub vpn: String,
    /// Client bundle extension.
    pub extension: String,
    /// Name of the matched layout.
    pub layout: String,
    /// easy-rsa root.
    pub easy_rsa: PathBuf,
    /// PKI directory.
    pub pki: PathBuf,
    /// Client template, if present.
    pub client_template: Option<PathBuf>,
    /// Tunnel key, if present.
    pub tunnel_key: Option<TunnelKey>,
    /// Published CRL location.
    pub crl_destination: PathBuf,
    /// Status log consulted by `sessions`.
    pub status_log: PathBuf,
}

impl TableDisplay for InstallationInfo {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        writeln!(writer, "{} Installation", self.vpn)?;
        writeln!(writer, "══════════════════════════════════")?;
        writeln!(writer, "Layout:           {}", self.layout)?;
        writeln!(writer, "easy-rsa:         {}", self.easy_rsa.display())?;
        writeln!(writer, "PKI:              {}", self.pki.display())?;
        writeln!(writer, "Client template:  {}", display_optional(self.client_template.as_ref()))?;
        match &self.tunnel_key {
            Some(key) => writeln!(
                writer,
                "Tunnel key:       {} ({})",
                key.path.display(),
                key.kind.tag()
            )?,
            None => writeln!(writer, "Tunnel key:       -")?,
        }
        writeln!(writer, "CRL:              {}", self.crl_destination.display())?;
        writeln!(writer, "Status log:       {}", self.status_log.display())?;
        writeln!(writer, "Bundle extension: .{}", self.extension)?;
        Ok(())
    }
}

/// A rendered client configuration.
#[derive(Debug, Clone, Serialize)]
pub struct ClientBundle {
    /// Client name.
    pub client: String,
    /// Suggested file name.
    pub file_name: String,
    /// Inline configuration text.
    pub config: String,
}

impl TableDisplay for ClientBundle {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        writer.write_all(self.config.as_bytes())?;
        Ok(())
    }
}

fn display_optional(path: Option<&PathBuf>) -> String {
    path.map_or_else(|| "-".to_string(), |p| p.display().to_string())
}

fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KiB", "MiB", "GiB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{value:.1} {}", UNITS[unit])
    }
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else if max_len > 3 {
        let head: String = s.chars().take(max_len - 3).collect();
        format!("{head}...")
    } else {
        s.chars().take(max_len).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ovpn_pki::TunnelKeyKind;

    fn session(name: &str) -> SessionRecord {
        SessionRecord {
            common_name: name.into(),
            real_address: "203.0.113.7:51234".into(),
            bytes_received: 2048,
            bytes_sent: 512,
            connected_since: "Tue Mar 12 08:02:44 2024".into(),
            connected_at: None,
        }
    }

    #[test]
    fn output_format_default_is_table() {
        let fmt = OutputFormat::default();
        assert_eq!(fmt.format, Format::Table);
    }

    #[test]
    fn outcome_table_output() {
        let fmt = OutputFormat::default();
        assert_eq!(
            fmt.to_string(&Outcome::ok("client alice created")).expect("format"),
            "OK: client alice created\n"
        );
        assert_eq!(
            fmt.to_string(&Outcome::failure("boom")).expect("format"),
            "FAILED: boom\n"
        );
    }

    #[test]
    fn outcome_json_output() {
        let fmt = OutputFormat::new(Format::Json);
        let output = fmt.to_string(&Outcome::ok("done")).expect("format");
        assert!(output.contains("\"success\": true"));
        assert!(output.contains("\"message\": \"done\""));
    }

    #[test]
    fn client_list_table_output() {
        let list = ClientList {
            clients: vec!["alice".into(), "bob".into()],
        };
        let output = OutputFormat::default().to_string(&list).expect("format");
        assert!(output.contains("alice\nbob\n"));
        assert!(output.contains("Total: 2 client(s)"));
    }

    #[test]
    fn empty_client_list() {
        let list = ClientList { clients: vec![] };
        let output = OutputFormat::default().to_string(&list).expect("format");
        assert_eq!(output, "No active clients\n");

        let json = OutputFormat::new(Format::Json).to_string(&list).expect("format");
        assert!(json.contains("\"clients\": []"));
    }

    #[test]
    fn session_list_table_output() {
        let list = SessionList {
            sessions: vec![session("alice"), session("bob")],
        };
        let output = OutputFormat::default().to_string(&list).expect("format");
        assert!(output.contains("CONNECTED SINCE"));
        assert!(output.contains("alice"));
        assert!(output.contains("2.0 KiB"));
        assert!(output.contains("512 B"));
        assert!(output.contains("Total: 2 session(s)"));
    }

    #[test]
    fn installation_info_table_output() {
        let info = InstallationInfo {
            vpn: "OpenVPN".into(),
            extension: "ovpn".into(),
            layout: "standalone".into(),
            easy_rsa: "/etc/openvpn/easy-rsa".into(),
            pki: "/etc/openvpn/easy-rsa/pki".into(),
            client_template: None,
            tunnel_key: Some(TunnelKey {
                kind: TunnelKeyKind::Crypt,
                path: "/etc/openvpn/tls-crypt.key".into(),
            }),
            crl_destination: "/etc/openvpn/crl.pem".into(),
            status_log: "/var/log/openvpn/status.log".into(),
        };
        let output = OutputFormat::default().to_string(&info).expect("format");
        assert!(output.starts_with("OpenVPN Installation"));
        assert!(output.contains("Client template:  -"));
        assert!(output.contains("/etc/openvpn/tls-crypt.key (tls-crypt)"));
        assert!(output.contains("Bundle extension: .ovpn"));
    }

    #[test]
    fn bundle_table_output_is_raw_config() {
        let bundle = ClientBundle {
            client: "alice".into(),
            file_name: "alice.ovpn".into(),
            config: "client\n<ca>\nCA\n</ca>\n".into(),
        };
        let output = OutputFormat::default().to_string(&bundle).expect("format");
        assert_eq!(output, "client\n<ca>\nCA\n</ca>\n");
    }

    #[test]
    fn format_bytes_units() {
        assert_eq!(format_bytes(0), "0 B");
        assert_eq!(format_bytes(1536), "1.5 KiB");
        assert_eq!(format_bytes(5 * 1024 * 1024), "5.0 MiB");
    }

    #[test]
    fn truncate_long_string() {
        assert_eq!(truncate("hello world", 8), "hello...");
        assert_eq!(truncate("hello", 10), "hello");
        assert_eq!(truncate("hello", 3), "hel");
    }
}
