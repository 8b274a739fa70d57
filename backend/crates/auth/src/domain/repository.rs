//! Repository Traits
//!
//! Interfaces for data persistence. Implementations live in the
//! infrastructure layer (`infra::postgres`, `infra::memory`).

use chrono::{DateTime, Utc};
use kernel::id::AccountId;

use crate::domain::entity::{account::Account, login_record::LoginRecord};
use crate::domain::value_object::{email::Email, handle::Handle, phone::Phone};
use crate::error::AuthResult;

/// Account repository trait
#[trait_variant::make(AccountRepository: Send)]
pub trait LocalAccountRepository {
    /// Create a new account
    async fn create(&self, account: &Account) -> AuthResult<()>;

    /// Find account by ID
    async fn find_by_id(&self, account_id: &AccountId) -> AuthResult<Option<Account>>;

    /// Find account by email
    async fn find_by_email(&self, email: &Email) -> AuthResult<Option<Account>>;

    /// Find account by phone number
    async fn find_by_phone(&self, phone: &Phone) -> AuthResult<Option<Account>>;

    /// Find account by email and handle together (password reset entry)
    async fn find_by_email_and_handle(
        &self,
        email: &Email,
        handle: &Handle,
    ) -> AuthResult<Option<Account>>;

    /// Check if email is already registered
    async fn exists_by_email(&self, email: &Email) -> AuthResult<bool>;

    /// Check if phone number is already registered
    async fn exists_by_phone(&self, phone: &Phone) -> AuthResult<bool>;

    /// Persist the full account state
    async fn save(&self, account: &Account) -> AuthResult<()>;

    /// Conditionally persist the token pair
    ///
    /// Writes the new token fields only while the stored refresh token
    /// still equals `expected_refresh`. Returns `false` when the stored
    /// value moved underneath us (concurrent login/refresh/logout).
    async fn save_tokens_if_refresh_matches(
        &self,
        account_id: &AccountId,
        expected_refresh: &str,
        auth_token: &str,
        auth_expires_at: DateTime<Utc>,
        refresh_token: &str,
        refresh_expires_at: DateTime<Utc>,
    ) -> AuthResult<bool>;

    /// Count active accounts
    async fn count_active(&self) -> AuthResult<u64>;

    /// Delete an account
    async fn delete(&self, account_id: &AccountId) -> AuthResult<()>;
}

/// Login record repository trait
#[trait_variant::make(LoginRecordRepository: Send)]
pub trait LocalLoginRecordRepository {
    /// Insert or replace the record for the account
    async fn upsert(&self, record: &LoginRecord) -> AuthResult<()>;

    /// Find the record for an account
    async fn find_by_account_id(&self, account_id: &AccountId) -> AuthResult<Option<LoginRecord>>;

    /// Persist record state (record must exist)
    async fn save(&self, record: &LoginRecord) -> AuthResult<()>;
}
