//! Sign Out Use Case
//!
//! Marks the login record as logged out and clears the account's token
//! state. The account side is idempotent; the record side requires a
//! record to exist.

use std::sync::Arc;

use kernel::id::AccountId;

use crate::domain::repository::{AccountRepository, LoginRecordRepository};
use crate::error::{AuthError, AuthResult};

/// Sign out use case
pub struct SignOutUseCase<R, L>
where
    R: AccountRepository,
    L: LoginRecordRepository,
{
    accounts: Arc<R>,
    login_records: Arc<L>,
}

impl<R, L> SignOutUseCase<R, L>
where
    R: AccountRepository,
    L: LoginRecordRepository,
{
    pub fn new(accounts: Arc<R>, login_records: Arc<L>) -> Self {
        Self {
            accounts,
            login_records,
        }
    }

    pub async fn execute(&self, account_id: &AccountId) -> AuthResult<()> {
        let mut record = self
            .login_records
            .find_by_account_id(account_id)
            .await?
            .ok_or(AuthError::LoginRecordNotFound)?;
        record.mark_logout();
        self.login_records.save(&record).await?;

        let mut account = self
            .accounts
            .find_by_id(account_id)
            .await?
            .ok_or(AuthError::AccountNotFound)?;
        account.record_logout();
        self.accounts.save(&account).await?;

        tracing::info!(account_id = %account_id, "Account signed out");

        Ok(())
    }
}
