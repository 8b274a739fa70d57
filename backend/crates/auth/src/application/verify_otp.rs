//! Verify OTP Use Case
//!
//! Moves a pending account to active after the holder proves control
//! of the email address.

use std::sync::Arc;

use chrono::Utc;

use crate::domain::entity::account::Account;
use crate::domain::repository::AccountRepository;
use crate::domain::value_object::email::Email;
use crate::error::{AuthError, AuthResult};
use crate::notify::{Notification, NotificationKind, Notifier};

/// Verify OTP input
pub struct VerifyOtpInput {
    pub email: String,
    pub otp: String,
}

/// Verify OTP use case
pub struct VerifyOtpUseCase<R, N>
where
    R: AccountRepository,
    N: Notifier + Sync + 'static,
{
    accounts: Arc<R>,
    notifier: Arc<N>,
}

impl<R, N> VerifyOtpUseCase<R, N>
where
    R: AccountRepository,
    N: Notifier + Sync + 'static,
{
    pub fn new(accounts: Arc<R>, notifier: Arc<N>) -> Self {
        Self { accounts, notifier }
    }

    pub async fn execute(&self, input: VerifyOtpInput) -> AuthResult<Account> {
        let email = Email::new(&input.email).map_err(|e| AuthError::Validation(e.to_string()))?;

        let mut account = self
            .accounts
            .find_by_email(&email)
            .await?
            .ok_or(AuthError::AccountNotFound)?;

        account.verify_otp(&input.otp, Utc::now())?;

        // Single-use: activation clears the OTP pair
        account.activate();
        self.accounts.save(&account).await?;

        // Welcome mail goes out after the response
        let notifier = self.notifier.clone();
        let note = Notification::for_account(&account, NotificationKind::Welcome);
        tokio::spawn(async move {
            notifier.notify(note).await;
        });

        tracing::info!(account_id = %account.account_id, "Account verified");

        Ok(account)
    }
}
