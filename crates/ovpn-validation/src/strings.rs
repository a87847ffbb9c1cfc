//! String validation and sanitization functions.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::ValidationError;
use crate::sanitized::{ClientName, OwnerSpec, Sanitized};
use crate::{MAX_CLIENT_NAME_LENGTH, MAX_OWNER_LENGTH};

/// Regex for valid client names.
///
/// The first character can never be `-`, so a name is never mistaken for an
/// easy-rsa option.
static CLIENT_NAME_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9][A-Za-z0-9._@-]*$").unwrap_or_else(|_| unreachable!())
});

/// Regex for `user[:group]` ownership specs.
static OWNER_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9_][A-Za-z0-9_.-]*(:[A-Za-z0-9_][A-Za-z0-9_.-]*)?$")
        .unwrap_or_else(|_| unreachable!())
});

/// Owner of the published CRL when none is configured.
pub const NOBODY_OWNER: &str = "nobody:nogroup";

/// Check for null bytes in input.
fn check_null_bytes(field: &str, input: &str) -> Result<(), ValidationError> {
    if input.contains('\0') {
        return Err(ValidationError::null_byte(field));
    }
    Ok(())
}

/// Check for control characters (newlines, tabs, escape sequences).
fn check_control_chars(field: &str, input: &str) -> Result<(), ValidationError> {
    if input.chars().any(char::is_control) {
        return Err(ValidationError::control_characters(field));
    }
    Ok(())
}

/// Sanitize and validate a VPN client name.
///
/// The name becomes the certificate common name, an easy-rsa argument and a
/// file name under `issued/` and `private/`. Client names must:
/// - Be 1-64 characters after trimming
/// - Start with an ASCII letter or digit
/// - Contain only ASCII letters, digits, `.`, `_`, `@` and `-`
/// - Never contain `..`
///
/// # Errors
///
/// Returns `ValidationError` if the name is invalid.
///
/// # Example
///
/// ```
/// use ovpn_validation::sanitize_client_name;
///
/// let name = sanitize_client_name("laptop-alice")?;
/// assert_eq!(name.as_str(), "laptop-alice");
/// assert!(sanitize_client_name("../ca").is_err());
/// # Ok::<(), ovpn_validation::ValidationError>(())
/// ```
pub fn sanitize_client_name(name: &str) -> Result<Sanitized<ClientName>, ValidationError> {
    let field = "client_name";
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::empty(field));
    }

    if name.len() > MAX_CLIENT_NAME_LENGTH {
        return Err(ValidationError::too_long(
            field,
            MAX_CLIENT_NAME_LENGTH,
            name.len(),
        ));
    }

    check_null_bytes(field, name)?;
    check_control_chars(field, name)?;

    if name.contains("..") {
        return Err(ValidationError::path_traversal(field, ".."));
    }

    if !CLIENT_NAME_REGEX.is_match(name) {
        return Err(ValidationError::invalid_format(
            field,
            "alphanumeric start, then alphanumeric/'.'/'_'/'@'/'-'",
            name,
        ));
    }

    Ok(Sanitized::new(name.to_string()))
}

/// Sanitize and validate a `user[:group]` ownership spec for `chown`.
///
/// # Errors
///
/// Returns `ValidationError` if the spec is empty or malformed.
pub fn sanitize_owner(owner: &str) -> Result<Sanitized<OwnerSpec>, ValidationError> {
    let field = "owner";
    let owner = owner.trim();

    if owner.is_empty() {
        return Err(ValidationError::empty(field));
    }

    if owner.len() > MAX_OWNER_LENGTH {
        return Err(ValidationError::too_long(field, MAX_OWNER_LENGTH, owner.len()));
    }

    check_null_bytes(field, owner)?;

    if !OWNER_REGEX.is_match(owner) {
        return Err(ValidationError::invalid_format(field, "user[:group]", owner));
    }

    Ok(Sanitized::new(owner.to_string()))
}

/// [`NOBODY_OWNER`], already validated.
#[must_use]
pub fn nobody_owner() -> Sanitized<OwnerSpec> {
    Sanitized::new(NOBODY_OWNER.to_string())
}
