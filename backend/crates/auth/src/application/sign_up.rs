//! Sign Up Use Case
//!
//! Creates a pending account, issues the verification OTP, and stores
//! an initial refresh token.

use std::sync::Arc;

use chrono::Utc;
use platform::password::ClearTextPassword;

use crate::application::config::AuthConfig;
use crate::domain::entity::account::Account;
use crate::domain::repository::AccountRepository;
use crate::domain::value_object::{
    account_type::AccountType, email::Email, phone::Phone,
};
use crate::error::{AuthError, AuthResult};
use crate::notify::{Notification, NotificationKind, Notifier};
use crate::token::TokenIssuer;

/// Sign up input
pub struct SignUpInput {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub password: String,
    /// Tier code; unknown or absent falls back to Free
    pub account_type: Option<String>,
}

/// Sign up output
#[derive(Debug)]
pub struct SignUpOutput {
    /// The created account (pending, no password material exposed)
    pub account: Account,
    /// Refresh token stored at signup
    pub refresh_token: String,
}

/// Sign up use case
pub struct SignUpUseCase<R, N>
where
    R: AccountRepository,
    N: Notifier + Sync + 'static,
{
    accounts: Arc<R>,
    notifier: Arc<N>,
    config: Arc<AuthConfig>,
    tokens: TokenIssuer,
}

impl<R, N> SignUpUseCase<R, N>
where
    R: AccountRepository,
    N: Notifier + Sync + 'static,
{
    pub fn new(accounts: Arc<R>, notifier: Arc<N>, config: Arc<AuthConfig>) -> Self {
        let tokens = TokenIssuer::from_config(&config);
        Self {
            accounts,
            notifier,
            config,
            tokens,
        }
    }

    pub async fn execute(&self, input: SignUpInput) -> AuthResult<SignUpOutput> {
        let email = Email::new(&input.email).map_err(|e| AuthError::Validation(e.to_string()))?;
        let phone = Phone::new(&input.phone).map_err(|e| AuthError::Validation(e.to_string()))?;

        if self.accounts.exists_by_email(&email).await? {
            return Err(AuthError::EmailTaken);
        }
        if self.accounts.exists_by_phone(&phone).await? {
            return Err(AuthError::PhoneTaken);
        }

        let password = ClearTextPassword::new(input.password)?;
        let password_hash = password.hash(self.config.pepper())?;

        let account_type = input
            .account_type
            .as_deref()
            .and_then(AccountType::from_code)
            .unwrap_or_default();

        let mut account = Account::sign_up(
            input.first_name,
            input.last_name,
            email,
            phone,
            password_hash,
            account_type,
            self.config.otp_validity,
        );

        // A refresh token is stored from day one; the access token only
        // appears after the first successful sign-in
        let now = Utc::now();
        let (refresh_token, refresh_expires_at) =
            self.tokens.issue_refresh(&account.account_id, now);
        account.set_refresh_token(refresh_token.clone(), refresh_expires_at);

        self.accounts.create(&account).await?;

        // OTP delivery is best-effort, off the response path
        if let Some(code) = account.otp.as_ref().map(|c| c.as_str().to_string()) {
            let notifier = self.notifier.clone();
            let note = Notification::for_account(&account, NotificationKind::Otp { code });
            tokio::spawn(async move {
                notifier.notify(note).await;
            });
        }

        tracing::info!(
            account_id = %account.account_id,
            handle = %account.handle,
            "Account signed up"
        );

        Ok(SignUpOutput {
            account,
            refresh_token,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_object::account_status::AccountStatus;
    use crate::infra::memory::InMemoryAuthStore;
    use crate::notify::test_support::RecordingNotifier;

    fn use_case() -> (
        SignUpUseCase<InMemoryAuthStore, RecordingNotifier>,
        Arc<InMemoryAuthStore>,
        Arc<RecordingNotifier>,
    ) {
        let store = Arc::new(InMemoryAuthStore::new());
        let notifier = Arc::new(RecordingNotifier::new());
        let config = Arc::new(AuthConfig::development());
        (
            SignUpUseCase::new(store.clone(), notifier.clone(), config),
            store,
            notifier,
        )
    }

    fn input(email: &str, phone: &str) -> SignUpInput {
        SignUpInput {
            first_name: "Jane".to_string(),
            last_name: "Doe".to_string(),
            email: email.to_string(),
            phone: phone.to_string(),
            password: "Str0ng&Secret!".to_string(),
            account_type: Some("basic".to_string()),
        }
    }

    #[tokio::test]
    async fn test_sign_up_creates_pending_account() {
        let (use_case, store, _) = use_case();

        let output = use_case
            .execute(input("jane@example.com", "+14155552671"))
            .await
            .unwrap();

        assert_eq!(output.account.status, AccountStatus::Pending);
        assert!(!output.account.is_active);
        assert!(output.account.otp.is_some());
        assert!(!output.refresh_token.is_empty());

        let stored = store
            .find_by_email(&Email::new("jane@example.com").unwrap())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.refresh_token.as_deref(), Some(output.refresh_token.as_str()));
        assert_eq!(stored.account_type, AccountType::Basic);
    }

    #[tokio::test]
    async fn test_sign_up_duplicate_email() {
        let (use_case, _, _) = use_case();

        use_case
            .execute(input("jane@example.com", "+14155552671"))
            .await
            .unwrap();

        let err = use_case
            .execute(input("jane@example.com", "+14155552672"))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::EmailTaken));
    }

    #[tokio::test]
    async fn test_sign_up_duplicate_phone() {
        let (use_case, _, _) = use_case();

        use_case
            .execute(input("jane@example.com", "+14155552671"))
            .await
            .unwrap();

        let err = use_case
            .execute(input("jane2@example.com", "+14155552671"))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::PhoneTaken));
    }

    #[tokio::test]
    async fn test_sign_up_weak_password() {
        let (use_case, _, _) = use_case();

        let mut weak = input("jane@example.com", "+14155552671");
        weak.password = "short".to_string();

        let err = use_case.execute(weak).await.unwrap_err();
        assert!(matches!(err, AuthError::PasswordValidation(_)));
    }

    #[tokio::test]
    async fn test_sign_up_unknown_tier_defaults_to_free() {
        let (use_case, _, _) = use_case();

        let mut req = input("jane@example.com", "+14155552671");
        req.account_type = Some("enterprise".to_string());

        let output = use_case.execute(req).await.unwrap();
        assert_eq!(output.account.account_type, AccountType::Free);
    }
}
