//! Application Layer - Use Cases

pub mod config;
pub mod password_reset;
pub mod refresh_token;
pub mod sign_in;
pub mod sign_out;
pub mod sign_up;
pub mod verify_otp;

pub use password_reset::{
    RequestResetInput, RequestResetUseCase, ResetStageOutput, SetNewPasswordInput,
    SetNewPasswordUseCase, VerifyResetOtpInput, VerifyResetOtpUseCase,
};
pub use refresh_token::{RefreshAccessTokenUseCase, RefreshOutput};
pub use sign_in::{SignInInput, SignInOutput, SignInUseCase};
pub use sign_out::SignOutUseCase;
pub use sign_up::{SignUpInput, SignUpOutput, SignUpUseCase};
pub use verify_otp::{VerifyOtpInput, VerifyOtpUseCase};

use crate::domain::entity::account::Account;
use crate::domain::value_object::account_status::AccountStatus;
use crate::error::{AuthError, AuthResult};

/// Gate shared by sign-in and password-reset entry
///
/// Soft-deleted accounts are reported as missing; every non-active
/// status maps to its own message.
pub(crate) fn ensure_can_sign_in(account: &Account) -> AuthResult<()> {
    if account.is_deleted {
        return Err(AuthError::AccountNotFound);
    }

    match account.status {
        AccountStatus::Active if account.is_active => Ok(()),
        // Status and flag must agree
        AccountStatus::Active => Err(AuthError::AccountInactive),
        AccountStatus::Pending => Err(AuthError::AccountNotVerified),
        AccountStatus::Inactive => Err(AuthError::AccountInactive),
        AccountStatus::Blocked => Err(AuthError::AccountBlocked),
        AccountStatus::Suspend => Err(AuthError::AccountSuspended),
    }
}
