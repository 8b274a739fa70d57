//! API DTOs (Data Transfer Objects)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::entity::account::Account;

// ============================================================================
// Account View
// ============================================================================

/// Account as exposed over the API
///
/// Password material, the pending OTP, and stored tokens never leave
/// the server through this type.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountResponse {
    pub account_id: String,
    pub handle: String,
    pub unique_id: String,
    pub email: String,
    pub phone: String,
    pub first_name: String,
    pub last_name: String,
    pub slug: String,
    pub status: String,
    pub account_type: String,
    pub role: String,
    pub is_active: bool,
    pub is_logged_in: bool,
    pub devices: Vec<String>,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl AccountResponse {
    pub fn from_account(account: &Account) -> Self {
        Self {
            account_id: account.account_id.to_string(),
            handle: account.handle.as_str().to_string(),
            unique_id: account.unique_id.as_str().to_string(),
            email: account.email.as_str().to_string(),
            phone: account.phone.as_str().to_string(),
            first_name: account.first_name.clone(),
            last_name: account.last_name.clone(),
            slug: account.slug.clone(),
            status: account.status.code().to_string(),
            account_type: account.account_type.code().to_string(),
            role: account.role.code().to_string(),
            is_active: account.is_active,
            is_logged_in: account.is_logged_in,
            devices: account.devices.clone(),
            last_login_at: account.last_login_at,
            created_at: account.created_at,
        }
    }
}

// ============================================================================
// Sign Up
// ============================================================================

/// Sign up request
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignUpRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub password: String,
    /// Subscription tier code; defaults to the free tier
    pub account_type: Option<String>,
}

/// Sign up response
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignUpResponse {
    pub account: AccountResponse,
    pub refresh_token: String,
}

// ============================================================================
// OTP Verification
// ============================================================================

/// OTP verification request
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyOtpRequest {
    pub email: String,
    pub otp: String,
}

// ============================================================================
// Sign In
// ============================================================================

/// Sign in request
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignInRequest {
    pub email: String,
    pub password: String,
}

/// Sign in response
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignInResponse {
    pub account: AccountResponse,
    pub access_token: String,
    pub access_token_expires_at: DateTime<Utc>,
    pub refresh_token: String,
    pub refresh_token_expires_at: DateTime<Utc>,
    /// True when this login registered a new device
    pub new_device: bool,
}

// ============================================================================
// Refresh
// ============================================================================

/// Refresh request
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Refresh response
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshResponse {
    pub access_token: String,
    pub access_token_expires_at: DateTime<Utc>,
}

// ============================================================================
// Password Reset
// ============================================================================

/// Reset request (step 1)
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestResetRequest {
    pub email: String,
    pub handle: String,
}

/// Stage token handed back for the next reset step
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetStageResponse {
    pub reset_token: String,
}

/// Reset OTP verification request (step 2)
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyResetOtpRequest {
    pub reset_token: String,
    pub otp: String,
}

/// New password submission (step 3)
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetNewPasswordRequest {
    pub reset_token: String,
    pub new_password: String,
}
