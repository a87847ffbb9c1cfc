//! # ovpn-cli
//!
//! The `ovpn-admin` command-line interface.
//!
//! Provides commands for:
//! - Listing, creating and revoking OpenVPN clients
//! - Exporting inline `.ovpn` client configurations
//! - Republishing the CRL
//! - Showing connected sessions from the server status log
//!
//! # Architecture
//!
//! All work is delegated to [`ovpn_pki`]; this crate only parses arguments,
//! loads configuration and formats results.
//!
//! ```text
//! ┌────────────┐               ┌──────────┐   argv   ┌───────────────┐
//! │ ovpn-admin │──────────────►│ ovpn-pki │─────────►│ easyrsa/cp/.. │
//! └────────────┘               └──────────┘          └───────────────┘
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod cli;
pub mod commands;
pub mod error;
pub mod output;

pub use cli::{Cli, Commands, Format};
pub use error::CliError;
pub use output::OutputFormat;
