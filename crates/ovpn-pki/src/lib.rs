//! OpenVPN client lifecycle management on top of easy-rsa.
//!
//! This crate provides:
//! - **Installation discovery**: [`Locator`] probes the known easy-rsa layouts
//! - **Index reading**: active clients straight from `pki/index.txt`
//! - **Lifecycle**: [`ClientManager`] creates, revokes and exports clients
//! - **Sessions**: [`parse_active_sessions`] reads the server status log
//!
//! # Example
//!
//! ```rust,no_run
//! # async fn example() -> ovpn_pki::Result<()> {
//! use ovpn_pki::{parse_active_sessions, ClientManager, ManagerConfig};
//!
//! let config = ManagerConfig::default();
//! let manager = ClientManager::from_config(&config)?;
//!
//! for name in manager.list().await? {
//!     println!("{name}");
//! }
//!
//! for session in parse_active_sessions(&config.status_log).await? {
//!     println!("{} from {}", session.common_name, session.real_address);
//! }
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod bundle;
pub mod config;
pub mod error;
pub mod index;
pub mod layout;
pub mod lock;
pub mod manager;
pub mod outcome;
pub mod sessions;

pub use bundle::{bundle_file_name, BundleMaterial, CONFIG_EXTENSION};
pub use config::ManagerConfig;
pub use error::{Artifact, Error, Result};
pub use index::{active_clients, list_active_clients, CertStatus, IndexEntry};
pub use layout::{default_layouts, Installation, Layout, Locator, TunnelKey, TunnelKeyKind};
pub use lock::ClientLocks;
pub use manager::{Change, ClientManager};
pub use outcome::Outcome;
pub use sessions::{parse_active_sessions, parse_status, SessionRecord, DEFAULT_STATUS_LOG};

/// VPN type reported to callers.
pub const VPN_NAME: &str = "OpenVPN";
