//! OTP Value Object
//!
//! Six-digit one-time codes for email verification and password reset.
//! Codes are kept in canonical string form: comparison is a trimmed
//! string equality, so a stored `"042317"` only ever matches the exact
//! six characters, never a numerically-equal `"42317"`.

use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Inclusive lower bound of generated codes (always 6 digits)
const OTP_MIN: u32 = 100_000;

/// Inclusive upper bound of generated codes
const OTP_MAX: u32 = 999_999;

/// OTP verification failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum OtpError {
    /// Supplied code does not match the stored one
    #[error("Invalid OTP")]
    Mismatch,

    /// Stored code is past its expiry (or has none)
    #[error("OTP has expired")]
    Expired,
}

/// One-time code in canonical string form
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OtpCode(String);

impl OtpCode {
    /// Issue a fresh code and its expiry timestamp
    pub fn issue(validity: Duration) -> (Self, DateTime<Utc>) {
        let code: u32 = rand::rng().random_range(OTP_MIN..=OTP_MAX);
        (Self(code.to_string()), Utc::now() + validity)
    }

    /// Restore from a stored value
    pub fn from_db(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    /// Verify a supplied code against stored state
    ///
    /// The mismatch check runs first; expiry is only reported for a code
    /// the caller actually knows. A missing expiry fails closed.
    pub fn verify(
        stored: Option<&OtpCode>,
        expires_at: Option<DateTime<Utc>>,
        supplied: &str,
        now: DateTime<Utc>,
    ) -> Result<(), OtpError> {
        let stored = stored.ok_or(OtpError::Mismatch)?;

        if stored.0.trim() != supplied.trim() {
            return Err(OtpError::Mismatch);
        }

        match expires_at {
            Some(expiry) if now <= expiry => Ok(()),
            _ => Err(OtpError::Expired),
        }
    }

    /// Get the code as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OtpCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_six_digits() {
        for _ in 0..100 {
            let (code, _) = OtpCode::issue(Duration::hours(4));
            assert_eq!(code.as_str().len(), 6);
            assert!(code.as_str().chars().all(|c| c.is_ascii_digit()));
            assert_ne!(code.as_str().as_bytes()[0], b'0');
        }
    }

    #[test]
    fn test_issue_expiry() {
        let before = Utc::now();
        let (_, expiry) = OtpCode::issue(Duration::hours(4));
        assert!(expiry >= before + Duration::hours(4));
        assert!(expiry <= Utc::now() + Duration::hours(4));
    }

    #[test]
    fn test_verify_match() {
        let now = Utc::now();
        let stored = OtpCode::from_db("123456");
        assert_eq!(
            OtpCode::verify(Some(&stored), Some(now + Duration::hours(1)), "123456", now),
            Ok(())
        );
        // Surrounding whitespace is tolerated
        assert_eq!(
            OtpCode::verify(Some(&stored), Some(now + Duration::hours(1)), " 123456 ", now),
            Ok(())
        );
    }

    #[test]
    fn test_verify_mismatch() {
        let now = Utc::now();
        let stored = OtpCode::from_db("123456");
        assert_eq!(
            OtpCode::verify(Some(&stored), Some(now + Duration::hours(1)), "654321", now),
            Err(OtpError::Mismatch)
        );
        assert_eq!(
            OtpCode::verify(None, Some(now + Duration::hours(1)), "123456", now),
            Err(OtpError::Mismatch)
        );
    }

    #[test]
    fn test_leading_zero_is_not_numeric_equality() {
        let now = Utc::now();
        let expiry = Some(now + Duration::hours(1));

        // "000123" and "123" are numerically equal but must not match
        let stored = OtpCode::from_db("000123");
        assert_eq!(
            OtpCode::verify(Some(&stored), expiry, "123", now),
            Err(OtpError::Mismatch)
        );

        let stored = OtpCode::from_db("123");
        assert_eq!(
            OtpCode::verify(Some(&stored), expiry, "000123", now),
            Err(OtpError::Mismatch)
        );
    }

    #[test]
    fn test_verify_expired() {
        let now = Utc::now();
        let stored = OtpCode::from_db("123456");

        assert_eq!(
            OtpCode::verify(Some(&stored), Some(now - Duration::seconds(1)), "123456", now),
            Err(OtpError::Expired)
        );

        // Missing expiry fails closed
        assert_eq!(
            OtpCode::verify(Some(&stored), None, "123456", now),
            Err(OtpError::Expired)
        );
    }

    #[test]
    fn test_mismatch_wins_over_expiry() {
        let now = Utc::now();
        let stored = OtpCode::from_db("123456");
        assert_eq!(
            OtpCode::verify(Some(&stored), Some(now - Duration::hours(1)), "999999", now),
            Err(OtpError::Mismatch)
        );
    }
}
