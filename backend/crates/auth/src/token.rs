//! Token Issuer
//!
//! HS256 compact JWTs built on the workspace HMAC stack. Access and
//! refresh tokens are signed with distinct secrets; password-reset
//! stage tokens use a third, derived secret.
//!
//! Claims are canonical per token type and parsed with
//! `deny_unknown_fields`: a token carrying claims we do not know, or
//! missing ones we require, is rejected outright.

use chrono::{DateTime, Duration, Utc};
use kernel::id::AccountId;
use platform::crypto;
use platform::password::HashedPassword;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use thiserror::Error;
use uuid::Uuid;

use crate::application::config::AuthConfig;
use crate::domain::entity::account::Account;
use crate::domain::value_object::{account_status::AccountStatus, user_role::UserRole};

/// Token verification failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TokenError {
    /// Signature valid but past `exp`
    #[error("Token has expired")]
    Expired,

    /// Malformed token, bad signature, or non-canonical claims
    #[error("Invalid token")]
    Invalid,
}

/// Claims carried by an access token
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AccessClaims {
    /// Account UUID
    pub sub: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub handle: String,
    pub unique_id: String,
    pub role: UserRole,
    pub status: AccountStatus,
    pub is_active: bool,
    pub is_deleted: bool,
    /// Issued-at (unix seconds)
    pub iat: i64,
    /// Expiry (unix seconds)
    pub exp: i64,
}

impl AccessClaims {
    /// Parse the subject back into an account id
    pub fn account_id(&self) -> Result<AccountId, TokenError> {
        Uuid::parse_str(&self.sub)
            .map(AccountId::from_uuid)
            .map_err(|_| TokenError::Invalid)
    }
}

/// Claims carried by a refresh token
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RefreshClaims {
    /// Account UUID
    pub sub: String,
    /// Unique token id, so consecutive logins never mint equal tokens
    pub jti: String,
    pub iat: i64,
    pub exp: i64,
}

impl RefreshClaims {
    /// Parse the subject back into an account id
    pub fn account_id(&self) -> Result<AccountId, TokenError> {
        Uuid::parse_str(&self.sub)
            .map(AccountId::from_uuid)
            .map_err(|_| TokenError::Invalid)
    }
}

/// Stage of the password-reset sub-machine a reset token authorizes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResetStage {
    /// May call verify-reset-otp
    #[serde(rename = "reset_otp")]
    Otp,
    /// May call set-new-password
    #[serde(rename = "reset_password")]
    Password,
}

/// Claims carried by a password-reset stage token
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ResetClaims {
    /// Account UUID
    pub sub: String,
    /// Authorized stage
    pub stage: ResetStage,
    /// Fingerprint of the password hash the token was issued against
    /// (stage-2 only; makes the token single-use)
    pub fp: Option<String>,
    pub iat: i64,
    pub exp: i64,
}

impl ResetClaims {
    /// Parse the subject back into an account id
    pub fn account_id(&self) -> Result<AccountId, TokenError> {
        Uuid::parse_str(&self.sub)
            .map(AccountId::from_uuid)
            .map_err(|_| TokenError::Invalid)
    }
}

/// Short fingerprint of a password hash, bound into stage-2 reset tokens
pub fn password_fingerprint(hash: &HashedPassword) -> String {
    crypto::to_hex(&crypto::sha256(hash.as_phc_string().as_bytes()))
}

trait ExpiringClaims {
    fn expires_at(&self) -> i64;
}

impl ExpiringClaims for AccessClaims {
    fn expires_at(&self) -> i64 {
        self.exp
    }
}

impl ExpiringClaims for RefreshClaims {
    fn expires_at(&self) -> i64 {
        self.exp
    }
}

impl ExpiringClaims for ResetClaims {
    fn expires_at(&self) -> i64 {
        self.exp
    }
}

/// Issues and verifies the three token families
#[derive(Clone)]
pub struct TokenIssuer {
    access_secret: Vec<u8>,
    refresh_secret: Vec<u8>,
    reset_secret: Vec<u8>,
    access_ttl: Duration,
    refresh_ttl: Duration,
    reset_ttl: Duration,
}

impl TokenIssuer {
    /// Build an issuer from application configuration
    pub fn from_config(config: &AuthConfig) -> Self {
        Self {
            access_secret: config.access_secret.clone(),
            refresh_secret: config.refresh_secret.clone(),
            reset_secret: config.reset_secret.clone(),
            access_ttl: config.access_ttl,
            refresh_ttl: config.refresh_ttl,
            reset_ttl: config.reset_ttl,
        }
    }

    /// Issue an access token for the account
    pub fn issue_access(&self, account: &Account, now: DateTime<Utc>) -> (String, DateTime<Utc>) {
        let expires_at = now + self.access_ttl;
        let claims = AccessClaims {
            sub: account.account_id.to_string(),
            first_name: account.first_name.clone(),
            last_name: account.last_name.clone(),
            email: account.email.as_str().to_string(),
            handle: account.handle.as_str().to_string(),
            unique_id: account.unique_id.as_str().to_string(),
            role: account.role,
            status: account.status,
            is_active: account.is_active,
            is_deleted: account.is_deleted,
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };
        (encode(&claims, &self.access_secret), expires_at)
    }

    /// Issue a refresh token for the account
    pub fn issue_refresh(
        &self,
        account_id: &AccountId,
        now: DateTime<Utc>,
    ) -> (String, DateTime<Utc>) {
        let expires_at = now + self.refresh_ttl;
        let claims = RefreshClaims {
            sub: account_id.to_string(),
            jti: Uuid::new_v4().to_string(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };
        (encode(&claims, &self.refresh_secret), expires_at)
    }

    /// Issue a password-reset stage token
    pub fn issue_reset(
        &self,
        account_id: &AccountId,
        stage: ResetStage,
        fingerprint: Option<String>,
        now: DateTime<Utc>,
    ) -> String {
        let claims = ResetClaims {
            sub: account_id.to_string(),
            stage,
            fp: fingerprint,
            iat: now.timestamp(),
            exp: (now + self.reset_ttl).timestamp(),
        };
        encode(&claims, &self.reset_secret)
    }

    /// Verify an access token
    pub fn verify_access(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<AccessClaims, TokenError> {
        decode(token, &self.access_secret, now)
    }

    /// Verify a refresh token
    pub fn verify_refresh(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<RefreshClaims, TokenError> {
        decode(token, &self.refresh_secret, now)
    }

    /// Verify a reset token and that it authorizes `expected_stage`
    pub fn verify_reset(
        &self,
        token: &str,
        expected_stage: ResetStage,
        now: DateTime<Utc>,
    ) -> Result<ResetClaims, TokenError> {
        let claims: ResetClaims = decode(token, &self.reset_secret, now)?;
        if claims.stage != expected_stage {
            return Err(TokenError::Invalid);
        }
        Ok(claims)
    }
}

impl std::fmt::Debug for TokenIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenIssuer")
            .field("access_ttl", &self.access_ttl)
            .field("refresh_ttl", &self.refresh_ttl)
            .field("reset_ttl", &self.reset_ttl)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Compact JWT encoding
// ============================================================================

fn encode<T: Serialize>(claims: &T, secret: &[u8]) -> String {
    // Header is constant: HS256
    let header = crypto::to_base64url(br#"{"alg":"HS256","typ":"JWT"}"#);
    let payload = crypto::to_base64url(
        serde_json::to_vec(claims)
            .unwrap_or_else(|_| b"{}".to_vec())
            .as_slice(),
    );

    let signing_input = format!("{}.{}", header, payload);
    let signature = crypto::hmac_sha256(secret, signing_input.as_bytes());

    format!("{}.{}", signing_input, crypto::to_base64url(&signature))
}

fn decode<T>(token: &str, secret: &[u8], now: DateTime<Utc>) -> Result<T, TokenError>
where
    T: DeserializeOwned + ExpiringClaims,
{
    let mut parts = token.split('.');
    let (Some(header), Some(payload), Some(signature), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(TokenError::Invalid);
    };

    let signing_input = format!("{}.{}", header, payload);
    let expected = crypto::hmac_sha256(secret, signing_input.as_bytes());
    let supplied = crypto::from_base64url(signature).map_err(|_| TokenError::Invalid)?;

    if !crypto::constant_time_eq(&expected, &supplied) {
        return Err(TokenError::Invalid);
    }

    // Header must name the only algorithm we sign with
    let header_bytes = crypto::from_base64url(header).map_err(|_| TokenError::Invalid)?;
    let header_json: serde_json::Value =
        serde_json::from_slice(&header_bytes).map_err(|_| TokenError::Invalid)?;
    if header_json.get("alg").and_then(|v| v.as_str()) != Some("HS256") {
        return Err(TokenError::Invalid);
    }

    let payload_bytes = crypto::from_base64url(payload).map_err(|_| TokenError::Invalid)?;
    let claims: T = serde_json::from_slice(&payload_bytes).map_err(|_| TokenError::Invalid)?;

    if now.timestamp() > claims.expires_at() {
        return Err(TokenError::Expired);
    }

    Ok(claims)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entity::account::Account;
    use crate::domain::value_object::{
        account_type::AccountType, email::Email, phone::Phone,
    };
    use platform::password::ClearTextPassword;

    fn issuer() -> TokenIssuer {
        TokenIssuer::from_config(&AuthConfig::development())
    }

    fn account() -> Account {
        let hash = ClearTextPassword::new("Str0ng&Secret!".to_string())
            .unwrap()
            .hash(None)
            .unwrap();
        Account::sign_up(
            "Jane".to_string(),
            "Doe".to_string(),
            Email::new("jane@example.com").unwrap(),
            Phone::new("+14155552671").unwrap(),
            hash,
            AccountType::Free,
            Duration::hours(4),
        )
    }

    #[test]
    fn test_access_roundtrip() {
        let issuer = issuer();
        let account = account();
        let now = Utc::now();

        let (token, expires_at) = issuer.issue_access(&account, now);
        assert!(expires_at > now);

        let claims = issuer.verify_access(&token, now).unwrap();
        assert_eq!(claims.sub, account.account_id.to_string());
        assert_eq!(claims.email, "jane@example.com");
        assert_eq!(claims.handle, account.handle.as_str());
        assert_eq!(claims.unique_id, account.unique_id.as_str());
        assert_eq!(claims.account_id().unwrap(), account.account_id);
        assert!(!claims.is_active);
    }

    #[test]
    fn test_refresh_roundtrip() {
        let issuer = issuer();
        let id = AccountId::new();
        let now = Utc::now();

        let (token, _) = issuer.issue_refresh(&id, now);
        let claims = issuer.verify_refresh(&token, now).unwrap();
        assert_eq!(claims.account_id().unwrap(), id);
    }

    #[test]
    fn test_secrets_are_distinct() {
        let issuer = issuer();
        let account = account();
        let now = Utc::now();

        // An access token must not verify as a refresh token
        let (access, _) = issuer.issue_access(&account, now);
        assert_eq!(issuer.verify_refresh(&access, now), Err(TokenError::Invalid));

        // Nor a refresh token as an access token
        let (refresh, _) = issuer.issue_refresh(&account.account_id, now);
        assert_eq!(issuer.verify_access(&refresh, now), Err(TokenError::Invalid));
    }

    #[test]
    fn test_expired_token() {
        let issuer = issuer();
        let account = account();
        let issued_at = Utc::now() - Duration::hours(1);

        let (token, _) = issuer.issue_access(&account, issued_at);
        let later = issued_at + Duration::hours(2);
        assert_eq!(issuer.verify_access(&token, later), Err(TokenError::Expired));
    }

    #[test]
    fn test_tampered_payload() {
        let issuer = issuer();
        let account = account();
        let now = Utc::now();

        let (token, _) = issuer.issue_access(&account, now);
        let mut parts: Vec<&str> = token.split('.').collect();

        let forged_payload = crypto::to_base64url(b"{\"sub\":\"forged\"}");
        parts[1] = &forged_payload;
        let forged = parts.join(".");

        assert_eq!(issuer.verify_access(&forged, now), Err(TokenError::Invalid));
    }

    #[test]
    fn test_unknown_claims_rejected() {
        let issuer = issuer();
        let config = AuthConfig::development();
        let now = Utc::now();

        // A refresh-shaped payload with an extra claim, correctly signed
        let payload = serde_json::json!({
            "sub": Uuid::new_v4().to_string(),
            "jti": Uuid::new_v4().to_string(),
            "iat": now.timestamp(),
            "exp": (now + Duration::days(1)).timestamp(),
            "setemail": "evil@example.com",
        });
        let header = crypto::to_base64url(br#"{"alg":"HS256","typ":"JWT"}"#);
        let body = crypto::to_base64url(payload.to_string().as_bytes());
        let signing_input = format!("{}.{}", header, body);
        let sig = crypto::hmac_sha256(&config.refresh_secret, signing_input.as_bytes());
        let token = format!("{}.{}", signing_input, crypto::to_base64url(&sig));

        let issuer_for_config = TokenIssuer::from_config(&config);
        assert_eq!(
            issuer_for_config.verify_refresh(&token, now),
            Err(TokenError::Invalid)
        );
        // The issuer with a different secret rejects it too
        assert_eq!(issuer.verify_refresh(&token, now), Err(TokenError::Invalid));
    }

    #[test]
    fn test_malformed_token() {
        let issuer = issuer();
        let now = Utc::now();

        assert_eq!(issuer.verify_access("", now), Err(TokenError::Invalid));
        assert_eq!(issuer.verify_access("a.b", now), Err(TokenError::Invalid));
        assert_eq!(issuer.verify_access("a.b.c.d", now), Err(TokenError::Invalid));
        assert_eq!(
            issuer.verify_access("not base64!.nope.nah", now),
            Err(TokenError::Invalid)
        );
    }

    #[test]
    fn test_reset_stage_enforced() {
        let issuer = issuer();
        let id = AccountId::new();
        let now = Utc::now();

        let stage1 = issuer.issue_reset(&id, ResetStage::Otp, None, now);
        assert!(issuer.verify_reset(&stage1, ResetStage::Otp, now).is_ok());
        assert_eq!(
            issuer.verify_reset(&stage1, ResetStage::Password, now),
            Err(TokenError::Invalid)
        );

        let stage2 = issuer.issue_reset(&id, ResetStage::Password, Some("fp".to_string()), now);
        let claims = issuer.verify_reset(&stage2, ResetStage::Password, now).unwrap();
        assert_eq!(claims.fp.as_deref(), Some("fp"));
    }
}
