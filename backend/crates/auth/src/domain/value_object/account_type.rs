//! Account Type Value Object
//!
//! Subscription tier of an account. The tier drives the device registry
//! capacity; roles with registry bypass are handled separately.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Device limit for tiers without an explicit entry
const DEFAULT_DEVICE_LIMIT: usize = 3;

/// Account subscription tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountType {
    /// Free tier (default device limit)
    #[default]
    Free,

    /// Basic tier - 5 devices
    Basic,

    /// Premium tier - 10 devices
    Premium,

    /// Business tier - 15 devices
    Business,
}

impl AccountType {
    /// Get string code for database storage and API
    #[inline]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Free => "free",
            Self::Basic => "basic",
            Self::Premium => "premium",
            Self::Business => "business",
        }
    }

    /// Maximum number of registered devices for this tier
    #[inline]
    pub const fn device_limit(&self) -> usize {
        match self {
            Self::Basic => 5,
            Self::Premium => 10,
            Self::Business => 15,
            Self::Free => DEFAULT_DEVICE_LIMIT,
        }
    }

    /// Create from string code (unknown codes fall back to Free)
    #[inline]
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "free" => Some(Self::Free),
            "basic" => Some(Self::Basic),
            "premium" => Some(Self::Premium),
            "business" => Some(Self::Business),
            _ => None,
        }
    }
}

impl fmt::Display for AccountType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}
