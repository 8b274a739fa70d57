//! Unique ID Value Object
//!
//! System-wide opaque account identifier: a fixed `SYSEGGEN` prefix plus
//! 14 random hex characters. Exposed in API responses and token claims
//! instead of the internal UUID.

use serde::{Deserialize, Serialize};

/// Fixed prefix for generated unique ids
const UNIQUE_ID_PREFIX: &str = "SYSEGGEN";

/// Number of random hex characters after the prefix
const UNIQUE_ID_HEX_LENGTH: usize = 14;

/// Opaque account identifier value object
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UniqueId(String);

impl UniqueId {
    /// Generate a fresh unique id
    pub fn generate() -> Self {
        let hex = platform::crypto::random_hex(UNIQUE_ID_HEX_LENGTH);
        Self(format!("{}{}", UNIQUE_ID_PREFIX, hex))
    }

    /// Create from database value (assumed already generated here)
    pub fn from_db(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the id as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Convert to string for database storage
    pub fn into_db(self) -> String {
        self.0
    }
}

impl std::fmt::Display for UniqueId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for UniqueId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
