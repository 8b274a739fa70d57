//! Phone Value Object
//!
//! Represents a validated phone number. Stored in a normalized form:
//! optional leading `+`, digits only (separators stripped).

use kernel::error::app_error::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Minimum digit count for a plausible phone number
const PHONE_MIN_DIGITS: usize = 7;

/// Maximum digit count (ITU-T E.164 allows 15)
const PHONE_MAX_DIGITS: usize = 15;

/// Phone number value object
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Phone(String);

impl Phone {
    /// Create a new phone number with validation
    ///
    /// Accepts digits with optional `+` prefix and common separators
    /// (spaces, dashes, dots, parentheses), which are stripped.
    pub fn new(phone: impl Into<String>) -> AppResult<Self> {
        let raw = phone.into();
        let trimmed = raw.trim();

        if trimmed.is_empty() {
            return Err(AppError::bad_request("Phone number cannot be empty"));
        }

        let has_plus = trimmed.starts_with('+');
        let mut digits = String::new();

        for ch in trimmed.chars().skip(if has_plus { 1 } else { 0 }) {
            match ch {
                '0'..='9' => digits.push(ch),
                ' ' | '-' | '.' | '(' | ')' => continue,
                _ => {
                    return Err(AppError::bad_request("Phone number contains invalid characters"));
                }
            }
        }

        if digits.len() < PHONE_MIN_DIGITS {
            return Err(AppError::bad_request(format!(
                "Phone number must have at least {} digits",
                PHONE_MIN_DIGITS
            )));
        }

        if digits.len() > PHONE_MAX_DIGITS {
            return Err(AppError::bad_request(format!(
                "Phone number must have at most {} digits",
                PHONE_MAX_DIGITS
            )));
        }

        let normalized = if has_plus {
            format!("+{}", digits)
        } else {
            digits
        };

        Ok(Self(normalized))
    }

    /// Create from database value (assumed already normalized)
    pub fn from_db(phone: impl Into<String>) -> Self {
        Self(phone.into())
    }

    /// Get the phone number as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Convert to string for database storage
    pub fn into_db(self) -> String {
        self.0
    }
}

impl FromStr for Phone {
    type Err = AppError;

    fn from_str(s: &str) -> AppResult<Self> {
        Phone::new(s)
    }
}

impl std::fmt::Display for Phone {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for Phone {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phone_valid() {
        assert!(Phone::new("+14155552671").is_ok());
        assert!(Phone::new("415-555-2671").is_ok());
        assert!(Phone::new("(415) 555 2671").is_ok());
        assert!(Phone::new("0123456789").is_ok());
    }

    #[test]
    fn test_phone_invalid() {
        assert!(Phone::new("").is_err());
        assert!(Phone::new("12345").is_err()); // Too few digits
        assert!(Phone::new("12345678901234567890").is_err()); // Too many
        assert!(Phone::new("call-me-maybe").is_err());
    }

    #[test]
    fn test_phone_normalization() {
        let phone = Phone::new("+1 (415) 555-2671").unwrap();
        assert_eq!(phone.as_str(), "+14155552671");

        let phone = Phone::new("415.555.2671").unwrap();
        assert_eq!(phone.as_str(), "4155552671");
    }
}
