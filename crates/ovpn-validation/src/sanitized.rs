//! Sanitized value wrapper types with marker traits.

use std::fmt;
use std::marker::PhantomData;

/// Marker trait for sanitization kinds.
pub trait SanitizationKind: private::Sealed {}

mod private {
    pub trait Sealed {}
}

/// Marker for VPN client names (certificate common names).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClientName;
impl private::Sealed for ClientName {}
impl SanitizationKind for ClientName {}

/// Marker for `user[:group]` ownership specs passed to `chown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OwnerSpec;
impl private::Sealed for OwnerSpec {}
impl SanitizationKind for OwnerSpec {}

/// A wrapper for validated values with type-level guarantees.
///
/// The type parameter `K` records which validator produced the value, so a
/// client name can never be passed where an owner spec is expected.
///
/// # Example
///
/// ```
/// use ovpn_validation::{sanitize_client_name, ClientName, Sanitized};
///
/// let name: Sanitized<ClientName> = sanitize_client_name("alice")?;
/// assert_eq!(name.as_str(), "alice");
/// # Ok::<(), ovpn_validation::ValidationError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Sanitized<K: SanitizationKind> {
    value: String,
    _marker: PhantomData<K>,
}

impl<K: SanitizationKind> Sanitized<K> {
    /// Wrap a value that has already passed its validator.
    #[must_use]
    pub(crate) fn new(value: String) -> Self {
        Self {
            value,
            _marker: PhantomData,
        }
    }

    /// Get the sanitized string as a slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.value
    }

    /// Consume the wrapper and return the inner value.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.value
    }
}

impl<K: SanitizationKind> AsRef<str> for Sanitized<K> {
    fn as_ref(&self) -> &str {
        &self.value
    }
}

impl<K: SanitizationKind> fmt::Display for Sanitized<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)
    }
}
