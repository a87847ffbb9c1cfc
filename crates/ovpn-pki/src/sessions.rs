//! OpenVPN status log parsing.
//!
//! The server rewrites its status file periodically. In the version 1
//! format the client list section looks like:
//!
//! ```text
//! OpenVPN CLIENT LIST
//! Updated,Thu Jun 18 08:12:15 2015
//! Common Name,Real Address,Bytes Received,Bytes Sent,Connected Since
//! alice,203.0.113.7:51234,24683,19721,Thu Jun 18 04:23:03 2015
//! ROUTING TABLE
//! ```

use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use serde::Serialize;
use tracing::debug;

use crate::error::{Error, Result};

/// Where OpenVPN writes its status file by default.
pub const DEFAULT_STATUS_LOG: &str = "/var/log/openvpn/status.log";

/// First line of the client list section.
pub const CLIENT_LIST_MARKER: &str = "OpenVPN CLIENT LIST";

/// First line after the client list section.
pub const ROUTING_TABLE_MARKER: &str = "ROUTING TABLE";

const UPDATED_PREFIX: &str = "Updated,";
const HEADER_PREFIX: &str = "Common Name,";
const MIN_FIELDS: usize = 5;

/// Timestamp formats seen in the `Connected Since` column.
const CONNECTED_SINCE_FORMATS: &[&str] = &["%a %b %e %H:%M:%S %Y", "%Y-%m-%d %H:%M:%S"];

/// One connected client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionRecord {
    /// Certificate common name.
    pub common_name: String,
    /// Remote `ip:port`.
    pub real_address: String,
    /// Bytes received from the client.
    pub bytes_received: u64,
    /// Bytes sent to the client.
    pub bytes_sent: u64,
    /// `Connected Since` exactly as logged.
    pub connected_since: String,
    /// `Connected Since` parsed as server local time, when recognizable.
    pub connected_at: Option<NaiveDateTime>,
}

impl SessionRecord {
    /// Parse one client list row. Rows that are too short or carry
    /// non-numeric byte counters yield `None`.
    #[must_use]
    pub fn parse(row: &str) -> Option<Self> {
        let fields: Vec<&str> = row.split(',').collect();
        if fields.len() < MIN_FIELDS {
            return None;
        }

        let bytes_received = fields[2].trim().parse().ok()?;
        let bytes_sent = fields[3].trim().parse().ok()?;
        let connected_since = fields[4].trim().to_string();

        Some(Self {
            common_name: fields[0].trim().to_string(),
            real_address: fields[1].trim().to_string(),
            bytes_received,
            bytes_sent,
            connected_at: parse_connected_since(&connected_since),
            connected_since,
        })
    }
}

fn parse_connected_since(value: &str) -> Option<NaiveDateTime> {
    CONNECTED_SINCE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
}

/// Parse the client list section of a status log.
///
/// # Errors
///
/// Returns [`Error::LogFormatInvalid`] if either marker is missing or the
/// routing table marker comes before the client list marker.
pub fn parse_status(contents: &str) -> Result<Vec<SessionRecord>> {
    let lines: Vec<&str> = contents.lines().map(str::trim_end).collect();

    let start = lines
        .iter()
        .position(|l| *l == CLIENT_LIST_MARKER)
        .ok_or_else(|| Error::LogFormatInvalid {
            reason: format!("missing '{CLIENT_LIST_MARKER}' marker"),
        })?;

    let end = lines[start + 1..]
        .iter()
        .position(|l| *l == ROUTING_TABLE_MARKER)
        .map(|offset| start + 1 + offset)
        .ok_or_else(|| Error::LogFormatInvalid {
            reason: format!("missing '{ROUTING_TABLE_MARKER}' marker after client list"),
        })?;

    // The timestamp and the column header only ever sit directly under the marker.
    let mut rows = lines[start + 1..end].iter().copied().peekable();
    rows.next_if(|row| row.starts_with(UPDATED_PREFIX));
    rows.next_if(|row| row.starts_with(HEADER_PREFIX));

    let mut sessions = Vec::new();
    for row in rows {
        if row.is_empty() {
            continue;
        }
        match SessionRecord::parse(row) {
            Some(record) => sessions.push(record),
            None => debug!(%row, "skipping malformed client list row"),
        }
    }

    Ok(sessions)
}

/// Read and parse the status log at `path`.
///
/// # Errors
///
/// Returns [`Error::LogUnavailable`] if the file cannot be read and
/// [`Error::LogFormatInvalid`] if its markers cannot be found.
pub async fn parse_active_sessions(path: impl AsRef<Path>) -> Result<Vec<SessionRecord>> {
    let path = path.as_ref();
    let contents = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| Error::LogUnavailable {
            path: PathBuf::from(path),
            reason: e.to_string(),
        })?;

    parse_status(&contents)
}
