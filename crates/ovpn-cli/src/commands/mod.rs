//! CLI command implementations.
//!
//! Each submodule implements a specific CLI command:
//! - [`client`] - Client lifecycle (list, create, remove, refresh-crl, config)
//! - [`sessions`] - Connected sessions from the status log
//! - [`info`] - Detected installation

pub mod client;
pub mod info;
pub mod sessions;

pub use client::ClientCommand;
pub use info::InfoCommand;
pub use sessions::SessionsCommand;
