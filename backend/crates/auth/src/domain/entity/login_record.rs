//! Login Record Entity
//!
//! Snapshot of the latest login, keyed by account id. Observability
//! only - auth decisions always re-check the Account itself.

use chrono::{DateTime, Utc};
use kernel::id::AccountId;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::entity::account::Account;
use crate::domain::value_object::{account_status::AccountStatus, user_role::UserRole};

/// Presence state recorded for the latest session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CurrentStatus {
    /// Session is live
    #[default]
    Active,

    /// User signed out
    Logout,

    /// Session idle beyond the hibernation threshold
    Hibernating,

    /// Client reported backgrounded state
    Background,
}

impl CurrentStatus {
    /// Get string code for database storage and API
    #[inline]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Logout => "logout",
            Self::Hibernating => "hibernating",
            Self::Background => "background",
        }
    }

    /// Create from string code
    #[inline]
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "active" => Some(Self::Active),
            "logout" => Some(Self::Logout),
            "hibernating" => Some(Self::Hibernating),
            "background" => Some(Self::Background),
            _ => None,
        }
    }
}

impl fmt::Display for CurrentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Login record entity (one per account, upserted on login)
#[derive(Debug, Clone)]
pub struct LoginRecord {
    /// Owning account
    pub account_id: AccountId,
    /// Name snapshot
    pub first_name: String,
    /// Name snapshot
    pub last_name: String,
    /// Email snapshot
    pub email: String,
    /// Handle snapshot
    pub handle: String,
    /// Role at login time
    pub role: UserRole,
    /// Account status at login time
    pub status: AccountStatus,
    /// Active flag at login time
    pub is_active: bool,
    /// Device registry snapshot
    pub devices: Vec<String>,
    /// Presence state
    pub current_status: CurrentStatus,
    /// Last login time
    pub last_login_at: Option<DateTime<Utc>>,
    /// Last logout time
    pub last_logout_at: Option<DateTime<Utc>>,
    /// Created timestamp
    pub created_at: DateTime<Utc>,
    /// Updated timestamp
    pub updated_at: DateTime<Utc>,
}

impl LoginRecord {
    /// Build a fresh snapshot from the account state at login
    pub fn from_account(account: &Account) -> Self {
        let now = Utc::now();

        Self {
            account_id: account.account_id,
            first_name: account.first_name.clone(),
            last_name: account.last_name.clone(),
            email: account.email.as_str().to_string(),
            handle: account.handle.as_str().to_string(),
            role: account.role,
            status: account.status,
            is_active: account.is_active,
            devices: account.devices.clone(),
            current_status: CurrentStatus::Active,
            last_login_at: account.last_login_at,
            last_logout_at: account.last_logout_at,
            created_at: now,
            updated_at: now,
        }
    }

    /// Mark the session as logged out
    pub fn mark_logout(&mut self) {
        let now = Utc::now();
        self.current_status = CurrentStatus::Logout;
        self.last_logout_at = Some(now);
        self.updated_at = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_current_status_codes() {
        assert_eq!(CurrentStatus::from_code("active"), Some(CurrentStatus::Active));
        assert_eq!(CurrentStatus::from_code("logout"), Some(CurrentStatus::Logout));
        assert_eq!(
            CurrentStatus::from_code("hibernating"),
            Some(CurrentStatus::Hibernating)
        );
        assert_eq!(
            CurrentStatus::from_code("background"),
            Some(CurrentStatus::Background)
        );
        assert_eq!(CurrentStatus::from_code("away"), None);
    }

    #[test]
    fn test_mark_logout() {
        let mut record = LoginRecord {
            account_id: kernel::id::AccountId::new(),
            first_name: "Jane".to_string(),
            last_name: "Doe".to_string(),
            email: "jane@example.com".to_string(),
            handle: "jane.doe1a2b3c4d".to_string(),
            role: UserRole::User,
            status: AccountStatus::Active,
            is_active: true,
            devices: vec!["d1".to_string()],
            current_status: CurrentStatus::Active,
            last_login_at: Some(Utc::now()),
            last_logout_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        record.mark_logout();
        assert_eq!(record.current_status, CurrentStatus::Logout);
        assert!(record.last_logout_at.is_some());
    }
}
