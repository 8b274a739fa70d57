//! HTTP Handlers

use axum::Json;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::{Extension, extract::ConnectInfo};
use std::sync::Arc;

use platform::client::resolve_client_identity;

use crate::application::config::AuthConfig;
use crate::application::{
    RefreshAccessTokenUseCase, RequestResetInput, RequestResetUseCase, SetNewPasswordInput,
    SetNewPasswordUseCase, SignInInput, SignInUseCase, SignOutUseCase, SignUpInput, SignUpUseCase,
    VerifyOtpInput, VerifyOtpUseCase, VerifyResetOtpInput, VerifyResetOtpUseCase,
};
use crate::domain::repository::{AccountRepository, LoginRecordRepository};
use crate::error::{AuthError, AuthResult};
use crate::notify::Notifier;
use crate::presentation::dto::{
    AccountResponse, RefreshRequest, RefreshResponse, RequestResetRequest, ResetStageResponse,
    SetNewPasswordRequest, SignInRequest, SignInResponse, SignUpRequest, SignUpResponse,
    VerifyOtpRequest, VerifyResetOtpRequest,
};
use crate::token::AccessClaims;

/// Shared state for auth handlers
pub struct AuthAppState<R, N>
where
    R: AccountRepository + LoginRecordRepository + Send + Sync + 'static,
    N: Notifier + Send + Sync + 'static,
{
    pub repo: Arc<R>,
    pub notifier: Arc<N>,
    pub config: Arc<AuthConfig>,
}

impl<R, N> Clone for AuthAppState<R, N>
where
    R: AccountRepository + LoginRecordRepository + Send + Sync + 'static,
    N: Notifier + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            repo: self.repo.clone(),
            notifier: self.notifier.clone(),
            config: self.config.clone(),
        }
    }
}

// ============================================================================
// Sign Up
// ============================================================================

/// POST /api/auth/signup
pub async fn sign_up<R, N>(
    State(state): State<AuthAppState<R, N>>,
    Json(req): Json<SignUpRequest>,
) -> AuthResult<(StatusCode, Json<SignUpResponse>)>
where
    R: AccountRepository + LoginRecordRepository + Send + Sync + 'static,
    N: Notifier + Send + Sync + 'static,
{
    let use_case = SignUpUseCase::new(
        state.repo.clone(),
        state.notifier.clone(),
        state.config.clone(),
    );

    let output = use_case
        .execute(SignUpInput {
            first_name: req.first_name,
            last_name: req.last_name,
            email: req.email,
            phone: req.phone,
            password: req.password,
            account_type: req.account_type,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(SignUpResponse {
            account: AccountResponse::from_account(&output.account),
            refresh_token: output.refresh_token,
        }),
    ))
}

// ============================================================================
// OTP Verification
// ============================================================================

/// POST /api/auth/verify-otp
pub async fn verify_otp<R, N>(
    State(state): State<AuthAppState<R, N>>,
    Json(req): Json<VerifyOtpRequest>,
) -> AuthResult<Json<AccountResponse>>
where
    R: AccountRepository + LoginRecordRepository + Send + Sync + 'static,
    N: Notifier + Send + Sync + 'static,
{
    let use_case = VerifyOtpUseCase::new(state.repo.clone(), state.notifier.clone());

    let account = use_case
        .execute(VerifyOtpInput {
            email: req.email,
            otp: req.otp,
        })
        .await?;

    Ok(Json(AccountResponse::from_account(&account)))
}

// ============================================================================
// Sign In
// ============================================================================

/// POST /api/auth/signin
pub async fn sign_in<R, N>(
    State(state): State<AuthAppState<R, N>>,
    headers: HeaderMap,
    ConnectInfo(addr): ConnectInfo<std::net::SocketAddr>,
    Json(req): Json<SignInRequest>,
) -> AuthResult<Json<SignInResponse>>
where
    R: AccountRepository + LoginRecordRepository + Send + Sync + 'static,
    N: Notifier + Send + Sync + 'static,
{
    let client = resolve_client_identity(&headers, Some(addr.ip()));

    let use_case = SignInUseCase::new(
        state.repo.clone(),
        state.repo.clone(),
        state.notifier.clone(),
        state.config.clone(),
    );

    let output = use_case
        .execute(SignInInput {
            email: req.email,
            password: req.password,
            device_id: client.device_id,
        })
        .await?;

    Ok(Json(SignInResponse {
        account: AccountResponse::from_account(&output.account),
        access_token: output.access_token,
        access_token_expires_at: output.access_expires_at,
        refresh_token: output.refresh_token,
        refresh_token_expires_at: output.refresh_expires_at,
        new_device: output.new_device,
    }))
}

// ============================================================================
// Refresh
// ============================================================================

/// POST /api/auth/refresh
pub async fn refresh_token<R, N>(
    State(state): State<AuthAppState<R, N>>,
    Json(req): Json<RefreshRequest>,
) -> AuthResult<Json<RefreshResponse>>
where
    R: AccountRepository + LoginRecordRepository + Send + Sync + 'static,
    N: Notifier + Send + Sync + 'static,
{
    let use_case = RefreshAccessTokenUseCase::new(state.repo.clone(), state.config.clone());

    let output = use_case.execute(&req.refresh_token).await?;

    Ok(Json(RefreshResponse {
        access_token: output.access_token,
        access_token_expires_at: output.access_expires_at,
    }))
}

// ============================================================================
// Sign Out (requires authentication)
// ============================================================================

/// POST /api/auth/signout
pub async fn sign_out<R, N>(
    State(state): State<AuthAppState<R, N>>,
    Extension(claims): Extension<AccessClaims>,
) -> AuthResult<StatusCode>
where
    R: AccountRepository + LoginRecordRepository + Send + Sync + 'static,
    N: Notifier + Send + Sync + 'static,
{
    let account_id = claims.account_id()?;

    let use_case = SignOutUseCase::new(state.repo.clone(), state.repo.clone());
    use_case.execute(&account_id).await?;

    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// Current Account (requires authentication)
// ============================================================================

/// GET /api/auth/me
pub async fn me<R, N>(
    State(state): State<AuthAppState<R, N>>,
    Extension(claims): Extension<AccessClaims>,
) -> AuthResult<Json<AccountResponse>>
where
    R: AccountRepository + LoginRecordRepository + Send + Sync + 'static,
    N: Notifier + Send + Sync + 'static,
{
    let account_id = claims.account_id()?;

    let account = state
        .repo
        .find_by_id(&account_id)
        .await?
        .ok_or(AuthError::AccountNotFound)?;

    Ok(Json(AccountResponse::from_account(&account)))
}

// ============================================================================
// Password Reset
// ============================================================================

/// POST /api/auth/password/request-reset
pub async fn request_password_reset<R, N>(
    State(state): State<AuthAppState<R, N>>,
    Json(req): Json<RequestResetRequest>,
) -> AuthResult<Json<ResetStageResponse>>
where
    R: AccountRepository + LoginRecordRepository + Send + Sync + 'static,
    N: Notifier + Send + Sync + 'static,
{
    let use_case = RequestResetUseCase::new(
        state.repo.clone(),
        state.notifier.clone(),
        state.config.clone(),
    );

    let output = use_case
        .execute(RequestResetInput {
            email: req.email,
            handle: req.handle,
        })
        .await?;

    Ok(Json(ResetStageResponse {
        reset_token: output.reset_token,
    }))
}

/// POST /api/auth/password/verify-otp
pub async fn verify_password_reset_otp<R, N>(
    State(state): State<AuthAppState<R, N>>,
    Json(req): Json<VerifyResetOtpRequest>,
) -> AuthResult<Json<ResetStageResponse>>
where
    R: AccountRepository + LoginRecordRepository + Send + Sync + 'static,
    N: Notifier + Send + Sync + 'static,
{
    let use_case = VerifyResetOtpUseCase::new(state.repo.clone(), state.config.clone());

    let output = use_case
        .execute(VerifyResetOtpInput {
            reset_token: req.reset_token,
            otp: req.otp,
        })
        .await?;

    Ok(Json(ResetStageResponse {
        reset_token: output.reset_token,
    }))
}

/// POST /api/auth/password/reset
pub async fn set_new_password<R, N>(
    State(state): State<AuthAppState<R, N>>,
    Json(req): Json<SetNewPasswordRequest>,
) -> AuthResult<StatusCode>
where
    R: AccountRepository + LoginRecordRepository + Send + Sync + 'static,
    N: Notifier + Send + Sync + 'static,
{
    let use_case = SetNewPasswordUseCase::new(state.repo.clone(), state.config.clone());

    use_case
        .execute(SetNewPasswordInput {
            reset_token: req.reset_token,
            new_password: req.new_password,
        })
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
