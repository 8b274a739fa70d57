//! Account Entity
//!
//! Aggregate root for the authentication subsystem. Holds identity,
//! credential state, the OTP pair, the active token pair, and the
//! per-account device registry.

use chrono::{DateTime, Duration, Utc};
use kernel::id::AccountId;
use platform::password::HashedPassword;
use thiserror::Error;

use crate::domain::value_object::{
    account_status::AccountStatus, account_type::AccountType, email::Email, handle::Handle,
    otp::{OtpCode, OtpError}, phone::Phone, unique_id::UniqueId, user_role::UserRole,
};

/// Result of admitting a device into the registry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceAdmission {
    /// Device id was already registered
    Known,
    /// Device id was appended to the registry
    Registered,
}

/// Device registry at capacity for the account's tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Device limit reached for {tier} accounts ({limit} devices)")]
pub struct DeviceLimitExceeded {
    pub tier: AccountType,
    pub limit: usize,
}

/// Account entity
#[derive(Debug, Clone)]
pub struct Account {
    /// Internal UUID identifier
    pub account_id: AccountId,
    /// Public login handle (unique)
    pub handle: Handle,
    /// Opaque system-wide identifier (unique)
    pub unique_id: UniqueId,
    /// Email address (unique)
    pub email: Email,
    /// Phone number (unique)
    pub phone: Phone,
    /// First name
    pub first_name: String,
    /// Last name
    pub last_name: String,
    /// URL slug derived from the name
    pub slug: String,
    /// Argon2id PHC hash; raw passwords never reach the entity
    pub password_hash: HashedPassword,
    /// Lifecycle status
    pub status: AccountStatus,
    /// Subscription tier (drives the device limit)
    pub account_type: AccountType,
    /// Role (User, Admin, SuperAdmin)
    pub role: UserRole,
    /// Must agree with status for login
    pub is_active: bool,
    /// Soft-delete flag
    pub is_deleted: bool,
    /// Set on login, cleared on logout
    pub is_logged_in: bool,
    /// Pending one-time code, if any
    pub otp: Option<OtpCode>,
    /// Expiry of the pending code
    pub otp_expires_at: Option<DateTime<Utc>>,
    /// Current access token
    pub auth_token: Option<String>,
    /// Absolute expiry of the access token
    pub auth_token_expires_at: Option<DateTime<Utc>>,
    /// Current refresh token (single active token)
    pub refresh_token: Option<String>,
    /// Absolute expiry of the refresh token
    pub refresh_token_expires_at: Option<DateTime<Utc>>,
    /// Registered device ids (ordered, no duplicates)
    pub devices: Vec<String>,
    /// Last successful login time
    pub last_login_at: Option<DateTime<Utc>>,
    /// Last logout time
    pub last_logout_at: Option<DateTime<Utc>>,
    /// Created timestamp
    pub created_at: DateTime<Utc>,
    /// Updated timestamp
    pub updated_at: DateTime<Utc>,
}

impl Account {
    /// Create a new pending account from signup input
    ///
    /// Generates the handle, unique id, slug and the first OTP. The
    /// account starts `Pending` and inactive; only OTP verification
    /// moves it to `Active`.
    pub fn sign_up(
        first_name: String,
        last_name: String,
        email: Email,
        phone: Phone,
        password_hash: HashedPassword,
        account_type: AccountType,
        otp_validity: Duration,
    ) -> Self {
        let now = Utc::now();
        let handle = Handle::generate(&first_name, &last_name);
        let slug = make_slug(&first_name, &last_name);
        let (otp, otp_expires_at) = OtpCode::issue(otp_validity);

        Self {
            account_id: AccountId::new(),
            handle,
            unique_id: UniqueId::generate(),
            email,
            phone,
            first_name,
            last_name,
            slug,
            password_hash,
            status: AccountStatus::Pending,
            account_type,
            role: UserRole::default(),
            is_active: false,
            is_deleted: false,
            is_logged_in: false,
            otp: Some(otp),
            otp_expires_at: Some(otp_expires_at),
            auth_token: None,
            auth_token_expires_at: None,
            refresh_token: None,
            refresh_token_expires_at: None,
            devices: Vec::new(),
            last_login_at: None,
            last_logout_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Issue a fresh OTP, replacing any pending one
    pub fn issue_otp(&mut self, validity: Duration) -> OtpCode {
        let (otp, expires_at) = OtpCode::issue(validity);
        self.otp = Some(otp.clone());
        self.otp_expires_at = Some(expires_at);
        self.touch();
        otp
    }

    /// Verify a supplied code against the pending OTP
    ///
    /// Does not mutate; callers clear the fields on success.
    pub fn verify_otp(&self, supplied: &str, now: DateTime<Utc>) -> Result<(), OtpError> {
        OtpCode::verify(self.otp.as_ref(), self.otp_expires_at, supplied, now)
    }

    /// Clear the pending OTP pair (after successful use)
    pub fn clear_otp(&mut self) {
        self.otp = None;
        self.otp_expires_at = None;
        self.touch();
    }

    /// Activate the account after OTP verification
    pub fn activate(&mut self) {
        self.status = AccountStatus::Active;
        self.is_active = true;
        self.clear_otp();
    }

    /// Admit a device into the registry
    ///
    /// Known ids are admitted without mutation. New ids are appended
    /// while under the tier limit; admin roles bypass the limit.
    pub fn admit_device(&mut self, device_id: &str) -> Result<DeviceAdmission, DeviceLimitExceeded> {
        if self.devices.iter().any(|d| d == device_id) {
            return Ok(DeviceAdmission::Known);
        }

        let limit = self.account_type.device_limit();
        if !self.role.bypasses_device_limit() && self.devices.len() >= limit {
            return Err(DeviceLimitExceeded {
                tier: self.account_type,
                limit,
            });
        }

        self.devices.push(device_id.to_string());
        self.touch();
        Ok(DeviceAdmission::Registered)
    }

    /// Record a successful login
    pub fn record_login(&mut self) {
        let now = Utc::now();
        self.is_logged_in = true;
        self.last_login_at = Some(now);
        self.updated_at = now;
    }

    /// Store a new token pair with absolute expiries
    pub fn set_tokens(
        &mut self,
        auth_token: String,
        auth_expires_at: DateTime<Utc>,
        refresh_token: String,
        refresh_expires_at: DateTime<Utc>,
    ) {
        self.auth_token = Some(auth_token);
        self.auth_token_expires_at = Some(auth_expires_at);
        self.refresh_token = Some(refresh_token);
        self.refresh_token_expires_at = Some(refresh_expires_at);
        self.touch();
    }

    /// Store only a refresh token (signup issues one before first login)
    pub fn set_refresh_token(&mut self, refresh_token: String, expires_at: DateTime<Utc>) {
        self.refresh_token = Some(refresh_token);
        self.refresh_token_expires_at = Some(expires_at);
        self.touch();
    }

    /// Record a logout: clear tokens and the logged-in flag
    pub fn record_logout(&mut self) {
        let now = Utc::now();
        self.auth_token = None;
        self.auth_token_expires_at = None;
        self.refresh_token = None;
        self.refresh_token_expires_at = None;
        self.is_logged_in = false;
        self.last_logout_at = Some(now);
        self.updated_at = now;
    }

    /// Replace the password hash (password reset)
    pub fn set_password(&mut self, password_hash: HashedPassword) {
        self.password_hash = password_hash;
        self.touch();
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// Build the URL slug: lowercased name with non-alphanumeric runs
/// collapsed to single hyphens
pub fn make_slug(first_name: &str, last_name: &str) -> String {
    let combined = format!("{} {}", first_name, last_name).to_lowercase();
    let mut slug = String::with_capacity(combined.len());
    let mut pending_hyphen = false;

    for ch in combined.chars() {
        if ch.is_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(ch);
        } else {
            pending_hyphen = true;
        }
    }

    slug
}

#[cfg(test)]
mod tests {
    use super::*;
    use platform::password::ClearTextPassword;

    fn test_account(account_type: AccountType, role: UserRole) -> Account {
        let hash = ClearTextPassword::new("Str0ng&Secret!".to_string())
            .unwrap()
            .hash(None)
            .unwrap();

        let mut account = Account::sign_up(
            "Jane".to_string(),
            "Doe".to_string(),
            Email::new("jane@example.com").unwrap(),
            Phone::new("+14155552671").unwrap(),
            hash,
            account_type,
            Duration::hours(4),
        );
        account.role = role;
        account
    }

    #[test]
    fn test_sign_up_defaults() {
        let account = test_account(AccountType::Free, UserRole::User);

        assert_eq!(account.status, AccountStatus::Pending);
        assert!(!account.is_active);
        assert!(!account.is_deleted);
        assert!(!account.is_logged_in);
        assert!(account.otp.is_some());
        assert!(account.otp_expires_at.is_some());
        assert!(account.devices.is_empty());
        assert!(account.handle.as_str().starts_with("jane.doe"));
        assert!(account.unique_id.as_str().starts_with("SYSEGGEN"));
        assert_eq!(account.slug, "jane-doe");
    }

    #[test]
    fn test_make_slug() {
        assert_eq!(make_slug("Jane", "Doe"), "jane-doe");
        assert_eq!(make_slug("Mary Ann", "O'Brien"), "mary-ann-o-brien");
        assert_eq!(make_slug("  Jean--Luc ", "Picard"), "jean-luc-picard");
    }

    #[test]
    fn test_activate_clears_otp() {
        let mut account = test_account(AccountType::Free, UserRole::User);
        account.activate();

        assert_eq!(account.status, AccountStatus::Active);
        assert!(account.is_active);
        assert!(account.otp.is_none());
        assert!(account.otp_expires_at.is_none());
    }

    #[test]
    fn test_admit_device_known_and_new() {
        let mut account = test_account(AccountType::Free, UserRole::User);

        assert_eq!(account.admit_device("d1"), Ok(DeviceAdmission::Registered));
        assert_eq!(account.admit_device("d1"), Ok(DeviceAdmission::Known));
        assert_eq!(account.devices, vec!["d1"]);
    }

    #[test]
    fn test_admit_device_limit_boundary() {
        let mut account = test_account(AccountType::Free, UserRole::User);

        // Free tier: 3 devices admitted, 4th rejected
        for i in 0..3 {
            assert_eq!(
                account.admit_device(&format!("d{}", i)),
                Ok(DeviceAdmission::Registered)
            );
        }
        assert_eq!(
            account.admit_device("d3"),
            Err(DeviceLimitExceeded {
                tier: AccountType::Free,
                limit: 3
            })
        );
        assert_eq!(account.devices.len(), 3);

        // A known device is still admitted at capacity
        assert_eq!(account.admit_device("d0"), Ok(DeviceAdmission::Known));
    }

    #[test]
    fn test_admit_device_tier_limits() {
        for (tier, limit) in [
            (AccountType::Basic, 5),
            (AccountType::Premium, 10),
            (AccountType::Business, 15),
        ] {
            let mut account = test_account(tier, UserRole::User);
            for i in 0..limit {
                assert_eq!(
                    account.admit_device(&format!("d{}", i)),
                    Ok(DeviceAdmission::Registered)
                );
            }
            assert!(account.admit_device("one-more").is_err());
        }
    }

    #[test]
    fn test_admin_bypasses_device_limit() {
        let mut account = test_account(AccountType::Free, UserRole::Admin);

        for i in 0..20 {
            assert_eq!(
                account.admit_device(&format!("d{}", i)),
                Ok(DeviceAdmission::Registered)
            );
        }
        assert_eq!(account.devices.len(), 20);
    }

    #[test]
    fn test_login_logout_cycle() {
        let mut account = test_account(AccountType::Free, UserRole::User);
        account.activate();

        account.record_login();
        account.set_tokens(
            "access".to_string(),
            Utc::now() + Duration::minutes(15),
            "refresh".to_string(),
            Utc::now() + Duration::days(7),
        );
        assert!(account.is_logged_in);
        assert!(account.auth_token.is_some());
        assert!(account.refresh_token.is_some());

        account.record_logout();
        assert!(!account.is_logged_in);
        assert!(account.auth_token.is_none());
        assert!(account.auth_token_expires_at.is_none());
        assert!(account.refresh_token.is_none());
        assert!(account.refresh_token_expires_at.is_none());
        assert!(account.last_logout_at.is_some());
    }

    #[test]
    fn test_issue_otp_replaces_pending() {
        let mut account = test_account(AccountType::Free, UserRole::User);
        let first = account.otp.clone().unwrap();
        let second = account.issue_otp(Duration::minutes(15));

        assert_eq!(account.otp.as_ref(), Some(&second));
        // Re-issue may rarely collide, so only assert state consistency
        let _ = first;
        assert!(account.otp_expires_at.is_some());
    }
}
