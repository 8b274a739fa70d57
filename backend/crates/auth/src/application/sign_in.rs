//! Sign In Use Case
//!
//! Authenticates an account, admits the device into the registry, and
//! issues a fresh token pair. Checks run in a fixed order: existence,
//! status gates, device admission, then the password.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use platform::password::ClearTextPassword;

use crate::application::config::AuthConfig;
use crate::application::ensure_can_sign_in;
use crate::domain::entity::{
    account::{Account, DeviceAdmission},
    login_record::LoginRecord,
};
use crate::domain::repository::{AccountRepository, LoginRecordRepository};
use crate::domain::value_object::email::Email;
use crate::error::{AuthError, AuthResult};
use crate::notify::{Notification, NotificationKind, Notifier};
use crate::token::TokenIssuer;

/// Sign in input
pub struct SignInInput {
    pub email: String,
    pub password: String,
    /// Resolved device id (header value or synthesized fallback)
    pub device_id: String,
}

/// Sign in output
#[derive(Debug)]
pub struct SignInOutput {
    pub account: Account,
    pub access_token: String,
    pub access_expires_at: DateTime<Utc>,
    pub refresh_token: String,
    pub refresh_expires_at: DateTime<Utc>,
    /// Whether this login registered a new device
    pub new_device: bool,
}

/// Sign in use case
pub struct SignInUseCase<R, L, N>
where
    R: AccountRepository,
    L: LoginRecordRepository,
    N: Notifier + Sync + 'static,
{
    accounts: Arc<R>,
    login_records: Arc<L>,
    notifier: Arc<N>,
    config: Arc<AuthConfig>,
    tokens: TokenIssuer,
}

impl<R, L, N> SignInUseCase<R, L, N>
where
    R: AccountRepository,
    L: LoginRecordRepository,
    N: Notifier + Sync + 'static,
{
    pub fn new(
        accounts: Arc<R>,
        login_records: Arc<L>,
        notifier: Arc<N>,
        config: Arc<AuthConfig>,
    ) -> Self {
        let tokens = TokenIssuer::from_config(&config);
        Self {
            accounts,
            login_records,
            notifier,
            config,
            tokens,
        }
    }

    pub async fn execute(&self, input: SignInInput) -> AuthResult<SignInOutput> {
        let email = Email::new(&input.email).map_err(|e| AuthError::Validation(e.to_string()))?;

        let mut account = self
            .accounts
            .find_by_email(&email)
            .await?
            .ok_or(AuthError::AccountNotFound)?;

        ensure_can_sign_in(&account)?;

        let admission = account.admit_device(&input.device_id)?;

        let password = ClearTextPassword::for_verification(input.password);
        if !account.password_hash.verify(&password, self.config.pepper()) {
            return Err(AuthError::InvalidCredentials);
        }

        // New token pair; the previous refresh token stops being valid
        // the moment this save lands
        let now = Utc::now();
        account.record_login();
        let (access_token, access_expires_at) = self.tokens.issue_access(&account, now);
        let (refresh_token, refresh_expires_at) =
            self.tokens.issue_refresh(&account.account_id, now);
        account.set_tokens(
            access_token.clone(),
            access_expires_at,
            refresh_token.clone(),
            refresh_expires_at,
        );

        self.accounts.save(&account).await?;
        self.login_records
            .upsert(&LoginRecord::from_account(&account))
            .await?;

        let new_device = admission == DeviceAdmission::Registered;
        if new_device {
            let notifier = self.notifier.clone();
            let note = Notification::for_account(
                &account,
                NotificationKind::NewDevice {
                    device_id: input.device_id.clone(),
                },
            );
            tokio::spawn(async move {
                notifier.notify(note).await;
            });
        }

        tracing::info!(
            account_id = %account.account_id,
            device_id = %input.device_id,
            new_device,
            "Account signed in"
        );

        Ok(SignInOutput {
            account,
            access_token,
            access_expires_at,
            refresh_token,
            refresh_expires_at,
            new_device,
        })
    }
}
