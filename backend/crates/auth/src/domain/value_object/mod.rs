pub mod account_status;
pub mod account_type;
pub mod email;
pub mod handle;
pub mod otp;
pub mod phone;
pub mod unique_id;
pub mod user_role;
