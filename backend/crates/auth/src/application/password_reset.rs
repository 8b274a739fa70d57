//! Password Reset Use Cases
//!
//! Linear three-step sub-machine. Each step hands the client a signed,
//! short-lived stage token for the next one, so skipping a step fails
//! closed:
//!
//! 1. Request: email + handle, same gates as sign-in; issues an OTP and
//!    a stage-1 token.
//! 2. Verify OTP: stage-1 token + code; returns a stage-2 token bound
//!    to a fingerprint of the current password hash.
//! 3. Set password: stage-2 token + new password; the fingerprint check
//!    makes the token single-use - once the password changes, any
//!    outstanding stage-2 token dies with it.

use std::sync::Arc;

use chrono::Utc;
use platform::password::ClearTextPassword;

use crate::application::config::AuthConfig;
use crate::application::ensure_can_sign_in;
use crate::domain::repository::AccountRepository;
use crate::domain::value_object::{email::Email, handle::Handle};
use crate::error::{AuthError, AuthResult};
use crate::notify::{Notification, NotificationKind, Notifier};
use crate::token::{ResetStage, TokenIssuer, password_fingerprint};

/// Stage token handed to the client for the next step
#[derive(Debug)]
pub struct ResetStageOutput {
    pub reset_token: String,
}

// ============================================================================
// Step 1: Request Reset
// ============================================================================

/// Request reset input
pub struct RequestResetInput {
    pub email: String,
    pub handle: String,
}

/// Request reset use case
pub struct RequestResetUseCase<R, N>
where
    R: AccountRepository,
    N: Notifier + Sync + 'static,
{
    accounts: Arc<R>,
    notifier: Arc<N>,
    config: Arc<AuthConfig>,
    tokens: TokenIssuer,
}

impl<R, N> RequestResetUseCase<R, N>
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

    pub async fn execute(&self, input: RequestResetInput) -> AuthResult<ResetStageOutput> {
        let email = Email::new(&input.email).map_err(|e| AuthError::Validation(e.to_string()))?;
        let handle =
            Handle::new(&input.handle).map_err(|e| AuthError::Validation(e.to_string()))?;

        let mut account = self
            .accounts
            .find_by_email_and_handle(&email, &handle)
            .await?
            .ok_or(AuthError::AccountNotFound)?;

        ensure_can_sign_in(&account)?;

        let code = account.issue_otp(self.config.otp_validity);
        self.accounts.save(&account).await?;

        let notifier = self.notifier.clone();
        let note = Notification::for_account(
            &account,
            NotificationKind::Otp {
                code: code.as_str().to_string(),
            },
        );
        tokio::spawn(async move {
            notifier.notify(note).await;
        });

        let reset_token =
            self.tokens
                .issue_reset(&account.account_id, ResetStage::Otp, None, Utc::now());

        tracing::info!(account_id = %account.account_id, "Password reset requested");

        Ok(ResetStageOutput { reset_token })
    }
}

// ============================================================================
// Step 2: Verify Reset OTP
// ============================================================================

/// Verify reset OTP input
pub struct VerifyResetOtpInput {
    pub reset_token: String,
    pub otp: String,
}

/// Verify reset OTP use case
pub struct VerifyResetOtpUseCase<R>
where
    R: AccountRepository,
{
    accounts: Arc<R>,
    tokens: TokenIssuer,
}

impl<R> VerifyResetOtpUseCase<R>
where
    R: AccountRepository,
{
    pub fn new(accounts: Arc<R>, config: Arc<AuthConfig>) -> Self {
        let tokens = TokenIssuer::from_config(&config);
        Self { accounts, tokens }
    }

    pub async fn execute(&self, input: VerifyResetOtpInput) -> AuthResult<ResetStageOutput> {
        let now = Utc::now();
        let claims = self
            .tokens
            .verify_reset(&input.reset_token, ResetStage::Otp, now)?;
        let account_id = claims.account_id()?;

        let mut account = self
            .accounts
            .find_by_id(&account_id)
            .await?
            .ok_or(AuthError::AccountNotFound)?;

        account.verify_otp(&input.otp, now)?;
        account.clear_otp();
        self.accounts.save(&account).await?;

        // Bind stage 2 to the password hash as it stands right now
        let fingerprint = password_fingerprint(&account.password_hash);
        let reset_token = self.tokens.issue_reset(
            &account.account_id,
            ResetStage::Password,
            Some(fingerprint),
            now,
        );

        Ok(ResetStageOutput { reset_token })
    }
}

// ============================================================================
// Step 3: Set New Password
// ============================================================================

/// Set new password input
pub struct SetNewPasswordInput {
    pub reset_token: String,
    pub new_password: String,
}

/// Set new password use case
pub struct SetNewPasswordUseCase<R>
where
    R: AccountRepository,
{
    accounts: Arc<R>,
    config: Arc<AuthConfig>,
    tokens: TokenIssuer,
}

impl<R> SetNewPasswordUseCase<R>
where
    R: AccountRepository,
{
    pub fn new(accounts: Arc<R>, config: Arc<AuthConfig>) -> Self {
        let tokens = TokenIssuer::from_config(&config);
        Self {
            accounts,
            config,
            tokens,
        }
    }

    pub async fn execute(&self, input: SetNewPasswordInput) -> AuthResult<()> {
        let now = Utc::now();
        let claims = self
            .tokens
            .verify_reset(&input.reset_token, ResetStage::Password, now)?;
        let account_id = claims.account_id()?;

        let mut account = self
            .accounts
            .find_by_id(&account_id)
            .await?
            .ok_or(AuthError::AccountNotFound)?;

        // Single-use: the fingerprint only matches while the password
        // the token was issued against is still in place
        let current = password_fingerprint(&account.password_hash);
        if claims.fp.as_deref() != Some(current.as_str()) {
            return Err(AuthError::TokenStale);
        }

        let password = ClearTextPassword::new(input.new_password)?;
        let password_hash = password.hash(self.config.pepper())?;
        account.set_password(password_hash);
        self.accounts.save(&account).await?;

        tracing::info!(account_id = %account_id, "Password reset completed");

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::sign_in::tests::Fixture;
    use crate::application::sign_in::SignInInput;

    async fn fixture() -> (Fixture, String) {
        let fixture = Fixture::with_verified_account("jane@example.com", "+14155552671").await;
        let account = fixture
            .store
            .find_by_email(&Email::new("jane@example.com").unwrap())
            .await
            .unwrap()
            .unwrap();
        let handle = account.handle.as_str().to_string();
        (fixture, handle)
    }

    fn request_use_case(
        f: &Fixture,
    ) -> RequestResetUseCase<crate::infra::memory::InMemoryAuthStore, crate::notify::test_support::RecordingNotifier>
    {
        RequestResetUseCase::new(f.store.clone(), f.notifier.clone(), f.config.clone())
    }

    async fn stored_otp(f: &Fixture) -> String {
        f.store
            .find_by_email(&Email::new("jane@example.com").unwrap())
            .await
            .unwrap()
            .unwrap()
            .otp
            .unwrap()
            .as_str()
            .to_string()
    }

    #[tokio::test]
    async fn test_full_reset_flow() {
        let (fixture, handle) = fixture().await;

        // Step 1
        let stage1 = request_use_case(&fixture)
            .execute(RequestResetInput {
                email: "jane@example.com".to_string(),
                handle,
            })
            .await
            .unwrap();

        // Step 2
        let otp = stored_otp(&fixture).await;
        let verify = VerifyResetOtpUseCase::new(fixture.store.clone(), fixture.config.clone());
        let stage2 = verify
            .execute(VerifyResetOtpInput {
                reset_token: stage1.reset_token,
                otp,
            })
            .await
            .unwrap();

        // Step 3
        let set = SetNewPasswordUseCase::new(fixture.store.clone(), fixture.config.clone());
        set.execute(SetNewPasswordInput {
            reset_token: stage2.reset_token,
            new_password: "Fresh&Secret99!".to_string(),
        })
        .await
        .unwrap();

        // Old password is gone, new one works
        let sign_in = fixture.sign_in();
        let err = sign_in
            .execute(SignInInput {
                email: "jane@example.com".to_string(),
                password: "Str0ng&Secret!".to_string(),
                device_id: "d1".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));

        sign_in
            .execute(SignInInput {
                email: "jane@example.com".to_string(),
                password: "Fresh&Secret99!".to_string(),
                device_id: "d1".to_string(),
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_request_reset_wrong_handle() {
        let (fixture, _) = fixture().await;

        let err = request_use_case(&fixture)
            .execute(RequestResetInput {
                email: "jane@example.com".to_string(),
                handle: "someone.else1234".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::AccountNotFound));
    }

    #[tokio::test]
    async fn test_stage_tokens_cannot_be_swapped() {
        let (fixture, handle) = fixture().await;

        let stage1 = request_use_case(&fixture)
            .execute(RequestResetInput {
                email: "jane@example.com".to_string(),
                handle,
            })
            .await
            .unwrap();

        // A stage-1 token does not authorize the final step
        let set = SetNewPasswordUseCase::new(fixture.store.clone(), fixture.config.clone());
        let err = set
            .execute(SetNewPasswordInput {
                reset_token: stage1.reset_token,
                new_password: "Fresh&Secret99!".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::TokenInvalid));
    }

    #[tokio::test]
    async fn test_stage2_token_is_single_use() {
        let (fixture, handle) = fixture().await;

        let stage1 = request_use_case(&fixture)
            .execute(RequestResetInput {
                email: "jane@example.com".to_string(),
                handle,
            })
            .await
            .unwrap();

        let otp = stored_otp(&fixture).await;
        let verify = VerifyResetOtpUseCase::new(fixture.store.clone(), fixture.config.clone());
        let stage2 = verify
            .execute(VerifyResetOtpInput {
                reset_token: stage1.reset_token,
                otp,
            })
            .await
            .unwrap();

        let set = SetNewPasswordUseCase::new(fixture.store.clone(), fixture.config.clone());
        set.execute(SetNewPasswordInput {
            reset_token: stage2.reset_token.clone(),
            new_password: "Fresh&Secret99!".to_string(),
        })
        .await
        .unwrap();

        // Replay with the same token: the fingerprint no longer matches
        let err = set
            .execute(SetNewPasswordInput {
                reset_token: stage2.reset_token,
                new_password: "Another&Secret7!".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::TokenStale));
    }

    #[tokio::test]
    async fn test_reset_otp_is_single_use() {
        let (fixture, handle) = fixture().await;

        let stage1 = request_use_case(&fixture)
            .execute(RequestResetInput {
                email: "jane@example.com".to_string(),
                handle,
            })
            .await
            .unwrap();

        let otp = stored_otp(&fixture).await;
        let verify = VerifyResetOtpUseCase::new(fixture.store.clone(), fixture.config.clone());
        verify
            .execute(VerifyResetOtpInput {
                reset_token: stage1.reset_token.clone(),
                otp: otp.clone(),
            })
            .await
            .unwrap();

        // The OTP was cleared on first use
        let err = verify
            .execute(VerifyResetOtpInput {
                reset_token: stage1.reset_token,
                otp,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::OtpMismatch));
    }

    #[tokio::test]
    async fn test_reset_requires_active_account() {
        let (fixture, handle) = fixture().await;

        {
            let email = Email::new("jane@example.com").unwrap();
            let mut account = fixture.store.find_by_email(&email).await.unwrap().unwrap();
            account.status = crate::domain::value_object::account_status::AccountStatus::Blocked;
            fixture.store.save(&account).await.unwrap();
        }

        let err = request_use_case(&fixture)
            .execute(RequestResetInput {
                email: "jane@example.com".to_string(),
                handle,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::AccountBlocked));
    }
}
