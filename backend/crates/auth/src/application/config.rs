//! Application Configuration
//!
//! Configuration for the Auth application layer. Token secrets come
//! from the environment and their absence is startup-fatal.

use chrono::Duration;
use kernel::error::app_error::{AppError, AppResult};

/// Environment variable holding the access-token secret
const ENV_ACCESS_SECRET: &str = "AUTH_ACCESS_TOKEN_SECRET";

/// Environment variable holding the refresh-token secret
const ENV_REFRESH_SECRET: &str = "AUTH_REFRESH_TOKEN_SECRET";

/// Optional environment variable holding the password pepper
const ENV_PASSWORD_PEPPER: &str = "AUTH_PASSWORD_PEPPER";

/// Auth application configuration
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Secret signing access tokens
    pub access_secret: Vec<u8>,
    /// Secret signing refresh tokens (must differ from access)
    pub refresh_secret: Vec<u8>,
    /// Secret signing password-reset stage tokens (derived)
    pub reset_secret: Vec<u8>,
    /// Access token lifetime (15 minutes)
    pub access_ttl: Duration,
    /// Refresh token lifetime (7 days)
    pub refresh_ttl: Duration,
    /// OTP validity window (4 hours)
    pub otp_validity: Duration,
    /// Reset stage token lifetime (15 minutes)
    pub reset_ttl: Duration,
    /// Password pepper (optional, application-wide secret)
    pub password_pepper: Option<Vec<u8>>,
}

impl AuthConfig {
    /// Load configuration from the environment
    ///
    /// Missing or too-short token secrets are a hard error; the binary
    /// must refuse to start rather than sign tokens with a weak key.
    pub fn from_env() -> AppResult<Self> {
        let access_secret = require_secret(ENV_ACCESS_SECRET)?;
        let refresh_secret = require_secret(ENV_REFRESH_SECRET)?;

        if access_secret == refresh_secret {
            return Err(AppError::internal(format!(
                "{} and {} must not be equal",
                ENV_ACCESS_SECRET, ENV_REFRESH_SECRET
            )));
        }

        let password_pepper = std::env::var(ENV_PASSWORD_PEPPER)
            .ok()
            .filter(|p| !p.is_empty())
            .map(|p| p.into_bytes());

        Ok(Self {
            reset_secret: derive_reset_secret(&refresh_secret),
            access_secret,
            refresh_secret,
            access_ttl: Duration::minutes(15),
            refresh_ttl: Duration::days(7),
            otp_validity: Duration::hours(4),
            reset_ttl: Duration::minutes(15),
            password_pepper,
        })
    }

    /// Create config with random secrets (for development and tests)
    pub fn development() -> Self {
        let access_secret = platform::crypto::random_bytes(32);
        let refresh_secret = platform::crypto::random_bytes(32);

        Self {
            reset_secret: derive_reset_secret(&refresh_secret),
            access_secret,
            refresh_secret,
            access_ttl: Duration::minutes(15),
            refresh_ttl: Duration::days(7),
            otp_validity: Duration::hours(4),
            reset_ttl: Duration::minutes(15),
            password_pepper: None,
        }
    }

    /// Get password pepper as slice
    pub fn pepper(&self) -> Option<&[u8]> {
        self.password_pepper.as_deref()
    }
}

/// Read a secret that must be present and at least 32 bytes
fn require_secret(name: &str) -> AppResult<Vec<u8>> {
    let value = std::env::var(name)
        .map_err(|_| AppError::internal(format!("{} must be set", name)))?;

    if value.len() < 32 {
        return Err(AppError::internal(format!(
            "{} must be at least 32 bytes",
            name
        )));
    }

    Ok(value.into_bytes())
}

/// Derive the reset-token secret from the refresh secret
///
/// Keeps reset tokens in their own verification domain without a third
/// operator-managed secret.
fn derive_reset_secret(refresh_secret: &[u8]) -> Vec<u8> {
    platform::crypto::hmac_sha256(refresh_secret, b"password-reset-stage").to_vec()
}
