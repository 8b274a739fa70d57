//! Handle Value Object
//!
//! The public login handle ("user id" in API terms). Generated from the
//! account holder's name plus a random suffix so that handles stay unique
//! without coordination; uniqueness is still enforced by the store.

use kernel::error::app_error::{AppError, AppResult};
use rand::Rng;
use rand::distr::Alphanumeric;
use serde::{Deserialize, Serialize};

/// Length of the random suffix appended to generated handles
const HANDLE_SUFFIX_LENGTH: usize = 8;

/// Maximum handle length
const HANDLE_MAX_LENGTH: usize = 80;

/// Account handle value object
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Handle(String);

impl Handle {
    /// Generate a handle as `{first}.{last}{suffix}`
    ///
    /// Name parts are lowercased with whitespace stripped; the suffix is
    /// 8 random lowercase alphanumeric characters.
    pub fn generate(first_name: &str, last_name: &str) -> Self {
        let first = sanitize_name_part(first_name);
        let last = sanitize_name_part(last_name);

        let suffix: String = rand::rng()
            .sample_iter(&Alphanumeric)
            .take(HANDLE_SUFFIX_LENGTH)
            .map(|b| (b as char).to_ascii_lowercase())
            .collect();

        Self(format!("{}.{}{}", first, last, suffix))
    }

    /// Create from user-supplied input with validation
    pub fn new(handle: impl Into<String>) -> AppResult<Self> {
        let handle = handle.into().trim().to_lowercase();

        if handle.is_empty() {
            return Err(AppError::bad_request("Handle cannot be empty"));
        }

        if handle.len() > HANDLE_MAX_LENGTH {
            return Err(AppError::bad_request(format!(
                "Handle must be at most {} characters",
                HANDLE_MAX_LENGTH
            )));
        }

        Ok(Self(handle))
    }

    /// Create from database value (assumed already validated)
    pub fn from_db(handle: impl Into<String>) -> Self {
        Self(handle.into())
    }

    /// Get the handle as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Convert to string for database storage
    pub fn into_db(self) -> String {
        self.0
    }
}

/// Lowercase a name part, keeping only alphanumeric characters
fn sanitize_name_part(part: &str) -> String {
    let cleaned: String = part
        .trim()
        .to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric())
        .collect();

    if cleaned.is_empty() {
        "user".to_string()
    } else {
        cleaned
    }
}

impl std::fmt::Display for Handle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for Handle {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_shape() {
        let handle = Handle::generate("Jane", "Doe");
        assert!(handle.as_str().starts_with("jane.doe"));
        assert_eq!(handle.as_str().len(), "jane.doe".len() + HANDLE_SUFFIX_LENGTH);
    }

    #[test]
    fn test_generate_unique() {
        let a = Handle::generate("Jane", "Doe");
        let b = Handle::generate("Jane", "Doe");
        assert_ne!(a, b);
    }

    #[test]
    fn test_generate_sanitizes_names() {
        let handle = Handle::generate("  Mary Ann ", "O'Brien");
        assert!(handle.as_str().starts_with("maryann.obrien"));
    }

    #[test]
    fn test_generate_empty_names() {
        let handle = Handle::generate("", "");
        assert!(handle.as_str().starts_with("user.user"));
    }

    #[test]
    fn test_new_validation() {
        assert!(Handle::new("jane.doe1a2b3c4d").is_ok());
        assert!(Handle::new("").is_err());
        assert!(Handle::new("x".repeat(HANDLE_MAX_LENGTH + 1)).is_err());
    }
}
