//! Input validation and safe command execution for ovpn-admin.
//!
//! Every value that ends up as a file name under the PKI tree or as an
//! argument to easy-rsa passes through this crate first.
//!
//! # Security Features
//!
//! - **Command injection prevention**: [`command::SafeCommand`] never invokes
//!   a shell and rejects NUL/CR/LF in arguments
//! - **Path traversal protection**: client names can never contain `/` or `..`
//! - **Type-safe wrappers**: `Sanitized<T>` types prove validation was performed
//!
//! # Client Names
//!
//! ```
//! use ovpn_validation::sanitize_client_name;
//!
//! let name = sanitize_client_name("alice")?;
//! assert_eq!(name.as_str(), "alice");
//!
//! assert!(sanitize_client_name("-batch").is_err());
//! assert!(sanitize_client_name("../../etc/passwd").is_err());
//! # Ok::<(), ovpn_validation::ValidationError>(())
//! ```
//!
//! # Safe Command Execution
//!
//! ```rust,no_run
//! # async fn example() -> Result<(), ovpn_validation::command::CommandError> {
//! use ovpn_validation::command::{AllowedProgram, SafeCommand, SystemExecutor};
//!
//! SafeCommand::new(AllowedProgram::Chown)
//!     .arg("nobody:nogroup")
//!     .arg("/etc/openvpn/crl.pem")
//!     .execute_with(&SystemExecutor::new())
//!     .await?;
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

#[cfg(feature = "command")]
pub mod command;
mod error;
mod sanitized;
mod strings;

#[cfg(feature = "command")]
pub use command::{
    AllowedProgram, CommandError, CommandExecutor, CommandOutput, CommandSpec, FakeExecutor,
    SafeCommand, SystemExecutor, DEFAULT_COMMAND_TIMEOUT, DEFAULT_SEARCH_PATH,
};
pub use error::{ValidationError, ValidationErrorKind};
pub use sanitized::{ClientName, OwnerSpec, Sanitized, SanitizationKind};
pub use strings::{nobody_owner, sanitize_client_name, sanitize_owner, NOBODY_OWNER};

/// Maximum length for client names (the X.509 common name upper bound).
pub const MAX_CLIENT_NAME_LENGTH: usize = 64;

/// Maximum length for `user[:group]` ownership specs.
pub const MAX_OWNER_LENGTH: usize = 128;
