//! Account Status Value Object
//!
//! Lifecycle status of an account. New accounts start as `Pending` and
//! become `Active` only through OTP verification; the remaining states
//! are operator-driven.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Account lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountStatus {
    /// Signed up but OTP verification not completed
    #[default]
    Pending,

    /// Verified, fully functional account
    Active,

    /// Deactivated account - cannot login
    Inactive,

    /// Blocked by an operator - cannot login
    Blocked,

    /// Suspended by an operator - cannot login
    Suspend,
}

impl AccountStatus {
    /// Get string code for database storage and API
    #[inline]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Active => "active",
            Self::Inactive => "inactive",
            Self::Blocked => "blocked",
            Self::Suspend => "suspend",
        }
    }

    /// Check if login is allowed
    #[inline]
    pub const fn can_login(&self) -> bool {
        matches!(self, Self::Active)
    }

    /// Create from string code
    #[inline]
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "pending" => Some(Self::Pending),
            "active" => Some(Self::Active),
            "inactive" => Some(Self::Inactive),
            "blocked" => Some(Self::Blocked),
            "suspend" => Some(Self::Suspend),
            _ => None,
        }
    }
}

impl fmt::Display for AccountStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}
