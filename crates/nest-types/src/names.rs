//! Validation for bucket and key names entered by a user.
//!
//! The store itself accepts any non-empty byte string as a name. Names typed
//! into a front end must additionally survive the `/`-joined string form of a
//! path, so they are checked here before they reach the store:
//! - Must be non-empty
//! - Must not contain the path separator `/`
//! - Must not contain whitespace

use crate::error::PathError;
use crate::path::SEPARATOR;

/// Validate a user-supplied bucket or key name.
///
/// # Examples
///
/// ```
/// use nest_types::names::validate_name;
///
/// assert!(validate_name("users").is_ok());
/// assert!(validate_name("").is_err());
/// assert!(validate_name("a/b").is_err());
/// assert!(validate_name("has space").is_err());
/// ```
pub fn validate_name(name: &str) -> Result<(), PathError> {
    if name.is_empty() {
        return Err(PathError::InvalidName {
            name: name.to_string(),
            reason: "name must not be empty".into(),
        });
    }

    if name.contains(SEPARATOR) {
        return Err(PathError::InvalidName {
            name: name.to_string(),
            reason: format!("name must not contain '{SEPARATOR}'"),
        });
    }

    if name.chars().any(char::is_whitespace) {
        return Err(PathError::InvalidName {
            name: name.to_string(),
            reason: "name cannot contain spaces".into(),
        });
    }

    Ok(())
}
