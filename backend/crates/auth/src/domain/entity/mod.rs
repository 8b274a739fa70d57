pub mod account;
pub mod login_record;
