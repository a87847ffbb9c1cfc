//! Command-line argument parsing with clap.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// ovpn-admin - OpenVPN client management for easy-rsa hosts.
#[derive(Parser, Debug, Clone)]
#[command(name = "ovpn-admin")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Configuration file (TOML). Built-in defaults apply when absent.
    #[arg(short, long, env = "OVPN_ADMIN_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output format.
    #[arg(short, long, value_enum, default_value_t = Format::Table)]
    pub format: Format,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum Format {
    /// Human-readable table format.
    #[default]
    Table,
    /// JSON output for scripting.
    Json,
}

/// Top-level subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// List active clients.
    List,

    /// Issue a certificate and key for a new client.
    Create {
        /// Client name (certificate common name).
        name: String,
    },

    /// Revoke a client and publish the updated CRL.
    Remove {
        /// Client name to revoke.
        name: String,
    },

    /// Regenerate and republish the CRL.
    ///
    /// Use after a `remove` that failed once the client was already revoked.
    RefreshCrl,

    /// Print or save a client's inline `.ovpn` configuration.
    Config {
        /// Client name.
        name: String,

        /// Write to this file (or `<dir>/<name>.ovpn` for a directory).
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show connected clients from the server status log.
    Sessions {
        /// Status log path, overriding the configured one.
        #[arg(short, long, env = "OVPN_STATUS_LOG")]
        log: Option<PathBuf>,
    },

    /// Show the detected installation.
    Info,
}
