//! Refresh Access Token Use Case
//!
//! Trades a valid refresh token for a new access token. Refresh is
//! single-active-token: the supplied token must equal the stored one
//! textually, and the new access token is persisted with a
//! compare-and-swap on that stored value so a concurrent login or
//! logout is never overwritten.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::application::config::AuthConfig;
use crate::domain::repository::AccountRepository;
use crate::error::{AuthError, AuthResult};
use crate::token::TokenIssuer;

/// Refresh output
#[derive(Debug)]
pub struct RefreshOutput {
    pub access_token: String,
    pub access_expires_at: DateTime<Utc>,
}

/// Refresh access token use case
pub struct RefreshAccessTokenUseCase<R>
where
    R: AccountRepository,
{
    accounts: Arc<R>,
    tokens: TokenIssuer,
}

impl<R> RefreshAccessTokenUseCase<R>
where
    R: AccountRepository,
{
    pub fn new(accounts: Arc<R>, config: Arc<AuthConfig>) -> Self {
        let tokens = TokenIssuer::from_config(&config);
        Self { accounts, tokens }
    }

    pub async fn execute(&self, refresh_token: &str) -> AuthResult<RefreshOutput> {
        let now = Utc::now();
        let claims = self.tokens.verify_refresh(refresh_token, now)?;
        let account_id = claims.account_id()?;

        let account = self
            .accounts
            .find_by_id(&account_id)
            .await?
            .ok_or(AuthError::AccountNotFound)?;

        // Single-active-token check against the stored value
        if account.refresh_token.as_deref() != Some(refresh_token) {
            return Err(AuthError::TokenStale);
        }
        let refresh_expires_at = account
            .refresh_token_expires_at
            .ok_or_else(|| AuthError::Internal("Stored refresh token without expiry".to_string()))?;

        let (access_token, access_expires_at) = self.tokens.issue_access(&account, now);

        // CAS: only land the new access token while the refresh token
        // we validated is still the stored one
        let swapped = self
            .accounts
            .save_tokens_if_refresh_matches(
                &account_id,
                refresh_token,
                &access_token,
                access_expires_at,
                refresh_token,
                refresh_expires_at,
            )
            .await?;

        if !swapped {
            return Err(AuthError::TokenStale);
        }

        tracing::debug!(account_id = %account_id, "Access token refreshed");

        Ok(RefreshOutput {
            access_token,
            access_expires_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::sign_in::tests::Fixture;
    use crate::application::sign_in::{SignInInput, SignInUseCase};
    use crate::domain::value_object::email::Email;
    use crate::token::TokenIssuer;
    use kernel::id::AccountId;

    async fn signed_in_fixture() -> (Fixture, String) {
        let fixture = Fixture::with_verified_account("jane@example.com", "+14155552671").await;
        let sign_in = fixture.sign_in();
        let output = sign_in
            .execute(SignInInput {
                email: "jane@example.com".to_string(),
                password: "Str0ng&Secret!".to_string(),
                device_id: "d1".to_string(),
            })
            .await
            .unwrap();
        (fixture, output.refresh_token)
    }

    #[tokio::test]
    async fn test_refresh_issues_new_access_token() {
        let (fixture, refresh_token) = signed_in_fixture().await;
        let use_case = RefreshAccessTokenUseCase::new(fixture.store.clone(), fixture.config.clone());

        let output = use_case.execute(&refresh_token).await.unwrap();
        assert!(output.access_expires_at > Utc::now());

        // The stored access token moved; the refresh token did not
        let stored = fixture
            .store
            .find_by_email(&Email::new("jane@example.com").unwrap())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.auth_token.as_deref(), Some(output.access_token.as_str()));
        assert_eq!(stored.refresh_token.as_deref(), Some(refresh_token.as_str()));
    }

    #[tokio::test]
    async fn test_refresh_with_garbage_token() {
        let (fixture, _) = signed_in_fixture().await;
        let use_case = RefreshAccessTokenUseCase::new(fixture.store, fixture.config);

        let err = use_case.execute("not.a.token").await.unwrap_err();
        assert!(matches!(err, AuthError::TokenInvalid));
    }

    #[tokio::test]
    async fn test_refresh_after_second_login_is_stale() {
        let (fixture, old_refresh) = signed_in_fixture().await;

        // Second login rotates the stored refresh token
        let sign_in = SignInUseCase::new(
            fixture.store.clone(),
            fixture.store.clone(),
            fixture.notifier.clone(),
            fixture.config.clone(),
        );
        sign_in
            .execute(SignInInput {
                email: "jane@example.com".to_string(),
                password: "Str0ng&Secret!".to_string(),
                device_id: "d1".to_string(),
            })
            .await
            .unwrap();

        let use_case = RefreshAccessTokenUseCase::new(fixture.store, fixture.config);
        let err = use_case.execute(&old_refresh).await.unwrap_err();
        assert!(matches!(err, AuthError::TokenStale));
    }

    #[tokio::test]
    async fn test_refresh_unknown_account() {
        let (fixture, _) = signed_in_fixture().await;

        // Well-signed token for an account that does not exist
        let issuer = TokenIssuer::from_config(&fixture.config);
        let (token, _) = issuer.issue_refresh(&AccountId::new(), Utc::now());

        let use_case = RefreshAccessTokenUseCase::new(fixture.store, fixture.config);
        let err = use_case.execute(&token).await.unwrap_err();
        assert!(matches!(err, AuthError::AccountNotFound));
    }
}
