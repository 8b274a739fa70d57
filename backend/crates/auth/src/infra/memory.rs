//! In-Memory Store
//!
//! Mutex-guarded maps implementing both repository traits. Backs the
//! use-case tests; not meant for production use.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use kernel::id::AccountId;
use uuid::Uuid;

use crate::domain::entity::{account::Account, login_record::LoginRecord};
use crate::domain::repository::{AccountRepository, LoginRecordRepository};
use crate::domain::value_object::{
    account_status::AccountStatus, email::Email, handle::Handle, phone::Phone,
};
use crate::error::{AuthError, AuthResult};

/// In-memory implementation of the auth repositories
#[derive(Default)]
pub struct InMemoryAuthStore {
    accounts: Mutex<HashMap<Uuid, Account>>,
    records: Mutex<HashMap<Uuid, LoginRecord>>,
}

impl InMemoryAuthStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock_accounts(&self) -> std::sync::MutexGuard<'_, HashMap<Uuid, Account>> {
        self.accounts
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn lock_records(&self) -> std::sync::MutexGuard<'_, HashMap<Uuid, LoginRecord>> {
        self.records
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl AccountRepository for InMemoryAuthStore {
    async fn create(&self, account: &Account) -> AuthResult<()> {
        let mut accounts = self.lock_accounts();
        if accounts.values().any(|a| a.email == account.email) {
            return Err(AuthError::EmailTaken);
        }
        if accounts.values().any(|a| a.phone == account.phone) {
            return Err(AuthError::PhoneTaken);
        }
        accounts.insert(account.account_id.into_uuid(), account.clone());
        Ok(())
    }

    async fn find_by_id(&self, account_id: &AccountId) -> AuthResult<Option<Account>> {
        Ok(self.lock_accounts().get(account_id.as_uuid()).cloned())
    }

    async fn find_by_email(&self, email: &Email) -> AuthResult<Option<Account>> {
        Ok(self
            .lock_accounts()
            .values()
            .find(|a| &a.email == email)
            .cloned())
    }

    async fn find_by_phone(&self, phone: &Phone) -> AuthResult<Option<Account>> {
        Ok(self
            .lock_accounts()
            .values()
            .find(|a| &a.phone == phone)
            .cloned())
    }

    async fn find_by_email_and_handle(
        &self,
        email: &Email,
        handle: &Handle,
    ) -> AuthResult<Option<Account>> {
        Ok(self
            .lock_accounts()
            .values()
            .find(|a| &a.email == email && &a.handle == handle)
            .cloned())
    }

    async fn exists_by_email(&self, email: &Email) -> AuthResult<bool> {
        Ok(self.lock_accounts().values().any(|a| &a.email == email))
    }

    async fn exists_by_phone(&self, phone: &Phone) -> AuthResult<bool> {
        Ok(self.lock_accounts().values().any(|a| &a.phone == phone))
    }

    async fn save(&self, account: &Account) -> AuthResult<()> {
        self.lock_accounts()
            .insert(account.account_id.into_uuid(), account.clone());
        Ok(())
    }

    async fn save_tokens_if_refresh_matches(
        &self,
        account_id: &AccountId,
        expected_refresh: &str,
        auth_token: &str,
        auth_expires_at: DateTime<Utc>,
        refresh_token: &str,
        refresh_expires_at: DateTime<Utc>,
    ) -> AuthResult<bool> {
        let mut accounts = self.lock_accounts();
        let Some(account) = accounts.get_mut(account_id.as_uuid()) else {
            return Ok(false);
        };
        if account.refresh_token.as_deref() != Some(expected_refresh) {
            return Ok(false);
        }
        account.set_tokens(
            auth_token.to_string(),
            auth_expires_at,
            refresh_token.to_string(),
            refresh_expires_at,
        );
        Ok(true)
    }

    async fn count_active(&self) -> AuthResult<u64> {
        Ok(self
            .lock_accounts()
            .values()
            .filter(|a| a.status == AccountStatus::Active && a.is_active && !a.is_deleted)
            .count() as u64)
    }

    async fn delete(&self, account_id: &AccountId) -> AuthResult<()> {
        self.lock_accounts().remove(account_id.as_uuid());
        self.lock_records().remove(account_id.as_uuid());
        Ok(())
    }
}

impl LoginRecordRepository for InMemoryAuthStore {
    async fn upsert(&self, record: &LoginRecord) -> AuthResult<()> {
        self.lock_records()
            .insert(record.account_id.into_uuid(), record.clone());
        Ok(())
    }

    async fn find_by_account_id(&self, account_id: &AccountId) -> AuthResult<Option<LoginRecord>> {
        Ok(self.lock_records().get(account_id.as_uuid()).cloned())
    }

    async fn save(&self, record: &LoginRecord) -> AuthResult<()> {
        let mut records = self.lock_records();
        if !records.contains_key(record.account_id.as_uuid()) {
            return Err(AuthError::LoginRecordNotFound);
        }
        records.insert(record.account_id.into_uuid(), record.clone());
        Ok(())
    }
}
