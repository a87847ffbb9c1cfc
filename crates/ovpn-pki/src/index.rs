//! easy-rsa index reader.
//!
//! `pki/index.txt` is the OpenSSL CA database: one certificate per line,
//! tab-separated, with the status flag in the first column and the subject
//! DN (`/CN=alice`) in the last. Only the flag and the `CN=` component
//! matter here.

use serde::Serialize;
use tracing::debug;

use crate::error::{Error, Result};
use crate::layout::Installation;

/// Status flag of an index line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CertStatus {
    /// `V`
    Valid,
    /// `R`
    Revoked,
    /// `E`
    Expired,
    /// Any other leading character.
    Unknown(char),
}

impl CertStatus {
    fn from_flag(flag: char) -> Self {
        match flag {
            'V' => Self::Valid,
            'R' => Self::Revoked,
            'E' => Self::Expired,
            other => Self::Unknown(other),
        }
    }
}

/// One parsed line of the index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexEntry {
    /// Status flag.
    pub status: CertStatus,
    /// Value of the `CN=` component, if the line carries one.
    pub common_name: Option<String>,
}

impl IndexEntry {
    /// Parse one index line. Blank lines yield `None`.
    #[must_use]
    pub fn parse(line: &str) -> Option<Self> {
        let flag = line.chars().next().filter(|c| !c.is_whitespace())?;

        let common_name = line
            .split('/')
            .find_map(|part| part.strip_prefix("CN="))
            .map(str::trim)
            .filter(|cn| !cn.is_empty())
            .map(str::to_string);

        Some(Self {
            status: CertStatus::from_flag(flag),
            common_name,
        })
    }

    /// The client name, if this entry denotes an active client.
    #[must_use]
    pub fn active_name(&self) -> Option<&str> {
        match self.status {
            CertStatus::Valid => self.common_name.as_deref(),
            _ => None,
        }
    }
}

/// Names of valid clients in file order.
///
/// Lines are decoded one at a time. A line that is not UTF-8, or a valid
/// line without a usable `CN=`, is skipped; it never aborts the read.
#[must_use]
pub fn active_clients(contents: impl AsRef<[u8]>) -> Vec<String> {
    let mut names = Vec::new();
    for (lineno, raw) in contents.as_ref().split(|b| *b == b'\n').enumerate() {
        let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
        let Ok(line) = std::str::from_utf8(raw) else {
            debug!(line = lineno + 1, "skipping index line that is not valid UTF-8");
            continue;
        };
        let Some(entry) = IndexEntry::parse(line) else {
            continue;
        };
        match (entry.status, entry.active_name()) {
            (CertStatus::Valid, Some(name)) => names.push(name.to_string()),
            (CertStatus::Valid, None) => {
                debug!(line = lineno + 1, "skipping valid index entry without common name");
            }
            _ => {}
        }
    }
    names
}

/// Read the installation's index and list active client names.
///
/// A missing index means no client was ever issued and yields an empty list.
///
/// # Errors
///
/// Returns [`Error::Io`] if the index exists but cannot be read.
pub async fn list_active_clients(installation: &Installation) -> Result<Vec<String>> {
    let path = installation.index_path();
    match tokio::fs::read(&path).await {
        Ok(contents) => Ok(active_clients(contents)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(index = %path.display(), "index file absent, no clients issued yet");
            Ok(Vec::new())
        }
        Err(e) => Err(Error::io(path, e)),
    }
}
