//! PostgreSQL Repository Implementations

use chrono::{DateTime, Utc};
use kernel::id::AccountId;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::entity::{
    account::Account,
    login_record::{CurrentStatus, LoginRecord},
};
use crate::domain::repository::{AccountRepository, LoginRecordRepository};
use crate::domain::value_object::{
    account_status::AccountStatus, account_type::AccountType, email::Email, handle::Handle,
    otp::OtpCode, phone::Phone, unique_id::UniqueId, user_role::UserRole,
};
use crate::error::{AuthError, AuthResult};
use platform::password::HashedPassword;

const ACCOUNT_COLUMNS: &str = r#"
    account_id,
    handle,
    unique_id,
    email,
    phone,
    first_name,
    last_name,
    slug,
    password_hash,
    status,
    account_type,
    role,
    is_active,
    is_deleted,
    is_logged_in,
    otp,
    otp_expires_at,
    auth_token,
    auth_token_expires_at,
    refresh_token,
    refresh_token_expires_at,
    devices,
    last_login_at,
    last_logout_at,
    created_at,
    updated_at
"#;

/// PostgreSQL-backed auth store
#[derive(Clone)]
pub struct PgAuthStore {
    pool: PgPool,
}

impl PgAuthStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch_account(&self, predicate: &str, bind: &str) -> AuthResult<Option<Account>> {
        let query = format!(
            "SELECT {} FROM accounts WHERE {} AND is_deleted = FALSE",
            ACCOUNT_COLUMNS, predicate
        );
        let row = sqlx::query_as::<_, AccountRow>(&query)
            .bind(bind)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|r| r.into_account()).transpose()
    }
}

// ============================================================================
// Account Repository Implementation
// ============================================================================

impl AccountRepository for PgAuthStore {
    async fn create(&self, account: &Account) -> AuthResult<()> {
        sqlx::query(
            r#"
            INSERT INTO accounts (
                account_id,
                handle,
                unique_id,
                email,
                phone,
                first_name,
                last_name,
                slug,
                password_hash,
                status,
                account_type,
                role,
                is_active,
                is_deleted,
                is_logged_in,
                otp,
                otp_expires_at,
                auth_token,
                auth_token_expires_at,
                refresh_token,
                refresh_token_expires_at,
                devices,
                last_login_at,
                last_logout_at,
                created_at,
                updated_at
            ) VALUES (
                $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13,
                $14, $15, $16, $17, $18, $19, $20, $21, $22, $23, $24, $25, $26
            )
            "#,
        )
        .bind(account.account_id.as_uuid())
        .bind(account.handle.as_str())
        .bind(account.unique_id.as_str())
        .bind(account.email.as_str())
        .bind(account.phone.as_str())
        .bind(&account.first_name)
        .bind(&account.last_name)
        .bind(&account.slug)
        .bind(account.password_hash.as_phc_string())
        .bind(account.status.code())
        .bind(account.account_type.code())
        .bind(account.role.code())
        .bind(account.is_active)
        .bind(account.is_deleted)
        .bind(account.is_logged_in)
        .bind(account.otp.as_ref().map(|o| o.as_str()))
        .bind(account.otp_expires_at)
        .bind(account.auth_token.as_deref())
        .bind(account.auth_token_expires_at)
        .bind(account.refresh_token.as_deref())
        .bind(account.refresh_token_expires_at)
        .bind(&account.devices)
        .bind(account.last_login_at)
        .bind(account.last_logout_at)
        .bind(account.created_at)
        .bind(account.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_by_id(&self, account_id: &AccountId) -> AuthResult<Option<Account>> {
        let query = format!(
            "SELECT {} FROM accounts WHERE account_id = $1 AND is_deleted = FALSE",
            ACCOUNT_COLUMNS
        );
        let row = sqlx::query_as::<_, AccountRow>(&query)
            .bind(account_id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;

        row.map(|r| r.into_account()).transpose()
    }

    async fn find_by_email(&self, email: &Email) -> AuthResult<Option<Account>> {
        self.fetch_account("email = $1", email.as_str()).await
    }

    async fn find_by_phone(&self, phone: &Phone) -> AuthResult<Option<Account>> {
        self.fetch_account("phone = $1", phone.as_str()).await
    }

    async fn find_by_email_and_handle(
        &self,
        email: &Email,
        handle: &Handle,
    ) -> AuthResult<Option<Account>> {
        let query = format!(
            "SELECT {} FROM accounts WHERE email = $1 AND handle = $2 AND is_deleted = FALSE",
            ACCOUNT_COLUMNS
        );
        let row = sqlx::query_as::<_, AccountRow>(&query)
            .bind(email.as_str())
            .bind(handle.as_str())
            .fetch_optional(&self.pool)
            .await?;

        row.map(|r| r.into_account()).transpose()
    }

    async fn exists_by_email(&self, email: &Email) -> AuthResult<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM accounts WHERE email = $1)",
        )
        .bind(email.as_str())
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn exists_by_phone(&self, phone: &Phone) -> AuthResult<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM accounts WHERE phone = $1)",
        )
        .bind(phone.as_str())
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn save(&self, account: &Account) -> AuthResult<()> {
        sqlx::query(
            r#"
            UPDATE accounts SET
                handle = $2,
                email = $3,
                phone = $4,
                first_name = $5,
                last_name = $6,
                slug = $7,
                password_hash = $8,
                status = $9,
                account_type = $10,
                role = $11,
                is_active = $12,
                is_deleted = $13,
                is_logged_in = $14,
                otp = $15,
                otp_expires_at = $16,
                auth_token = $17,
                auth_token_expires_at = $18,
                refresh_token = $19,
                refresh_token_expires_at = $20,
                devices = $21,
                last_login_at = $22,
                last_logout_at = $23,
                updated_at = $24
            WHERE account_id = $1
            "#,
        )
        .bind(account.account_id.as_uuid())
        .bind(account.handle.as_str())
        .bind(account.email.as_str())
        .bind(account.phone.as_str())
        .bind(&account.first_name)
        .bind(&account.last_name)
        .bind(&account.slug)
        .bind(account.password_hash.as_phc_string())
        .bind(account.status.code())
        .bind(account.account_type.code())
        .bind(account.role.code())
        .bind(account.is_active)
        .bind(account.is_deleted)
        .bind(account.is_logged_in)
        .bind(account.otp.as_ref().map(|o| o.as_str()))
        .bind(account.otp_expires_at)
        .bind(account.auth_token.as_deref())
        .bind(account.auth_token_expires_at)
        .bind(account.refresh_token.as_deref())
        .bind(account.refresh_token_expires_at)
        .bind(&account.devices)
        .bind(account.last_login_at)
        .bind(account.last_logout_at)
        .bind(account.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn save_tokens_if_refresh_matches(
        &self,
        account_id: &AccountId,
        expected_refresh: &str,
        auth_token: &str,
        auth_expires_at: DateTime<Utc>,
        refresh_token: &str,
        refresh_expires_at: DateTime<Utc>,
    ) -> AuthResult<bool> {
        // The WHERE clause is the compare half of the compare-and-swap
        let updated = sqlx::query(
            r#"
            UPDATE accounts SET
                auth_token = $3,
                auth_token_expires_at = $4,
                refresh_token = $5,
                refresh_token_expires_at = $6,
                updated_at = NOW()
            WHERE account_id = $1 AND refresh_token = $2
            "#,
        )
        .bind(account_id.as_uuid())
        .bind(expected_refresh)
        .bind(auth_token)
        .bind(auth_expires_at)
        .bind(refresh_token)
        .bind(refresh_expires_at)
        .execute(&self.pool)
        .await?
        .rows_affected();

        Ok(updated == 1)
    }

    async fn count_active(&self) -> AuthResult<u64> {
        let count = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM accounts
            WHERE status = 'active' AND is_active = TRUE AND is_deleted = FALSE
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(count as u64)
    }

    async fn delete(&self, account_id: &AccountId) -> AuthResult<()> {
        sqlx::query("DELETE FROM accounts WHERE account_id = $1")
            .bind(account_id.as_uuid())
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}

// ============================================================================
// Login Record Repository Implementation
// ============================================================================

impl LoginRecordRepository for PgAuthStore {
    async fn upsert(&self, record: &LoginRecord) -> AuthResult<()> {
        sqlx::query(
            r#"
            INSERT INTO login_records (
                account_id,
                first_name,
                last_name,
                email,
                handle,
                role,
                status,
                is_active,
                devices,
                current_status,
                last_login_at,
                last_logout_at,
                created_at,
                updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            ON CONFLICT (account_id) DO UPDATE SET
                first_name = EXCLUDED.first_name,
                last_name = EXCLUDED.last_name,
                email = EXCLUDED.email,
                handle = EXCLUDED.handle,
                role = EXCLUDED.role,
                status = EXCLUDED.status,
                is_active = EXCLUDED.is_active,
                devices = EXCLUDED.devices,
                current_status = EXCLUDED.current_status,
                last_login_at = EXCLUDED.last_login_at,
                last_logout_at = EXCLUDED.last_logout_at,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(record.account_id.as_uuid())
        .bind(&record.first_name)
        .bind(&record.last_name)
        .bind(&record.email)
        .bind(&record.handle)
        .bind(record.role.code())
        .bind(record.status.code())
        .bind(record.is_active)
        .bind(&record.devices)
        .bind(record.current_status.code())
        .bind(record.last_login_at)
        .bind(record.last_logout_at)
        .bind(record.created_at)
        .bind(record.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_by_account_id(&self, account_id: &AccountId) -> AuthResult<Option<LoginRecord>> {
        let row = sqlx::query_as::<_, LoginRecordRow>(
            r#"
            SELECT
                account_id,
                first_name,
                last_name,
                email,
                handle,
                role,
                status,
                is_active,
                devices,
                current_status,
                last_login_at,
                last_logout_at,
                created_at,
                updated_at
            FROM login_records
            WHERE account_id = $1
            "#,
        )
        .bind(account_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| r.into_record()).transpose()
    }

    async fn save(&self, record: &LoginRecord) -> AuthResult<()> {
        let updated = sqlx::query(
            r#"
            UPDATE login_records SET
                devices = $2,
                current_status = $3,
                last_login_at = $4,
                last_logout_at = $5,
                updated_at = $6
            WHERE account_id = $1
            "#,
        )
        .bind(record.account_id.as_uuid())
        .bind(&record.devices)
        .bind(record.current_status.code())
        .bind(record.last_login_at)
        .bind(record.last_logout_at)
        .bind(record.updated_at)
        .execute(&self.pool)
        .await?
        .rows_affected();

        if updated == 0 {
            return Err(AuthError::LoginRecordNotFound);
        }

        Ok(())
    }
}

// ============================================================================
// Row Types for sqlx mapping
// ============================================================================

#[derive(sqlx::FromRow)]
struct AccountRow {
    account_id: Uuid,
    handle: String,
    unique_id: String,
    email: String,
    phone: String,
    first_name: String,
    last_name: String,
    slug: String,
    password_hash: String,
    status: String,
    account_type: String,
    role: String,
    is_active: bool,
    is_deleted: bool,
    is_logged_in: bool,
    otp: Option<String>,
    otp_expires_at: Option<DateTime<Utc>>,
    auth_token: Option<String>,
    auth_token_expires_at: Option<DateTime<Utc>>,
    refresh_token: Option<String>,
    refresh_token_expires_at: Option<DateTime<Utc>>,
    devices: Vec<String>,
    last_login_at: Option<DateTime<Utc>>,
    last_logout_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl AccountRow {
    fn into_account(self) -> AuthResult<Account> {
        let status = AccountStatus::from_code(&self.status)
            .ok_or_else(|| AuthError::Internal(format!("Unknown account status: {}", self.status)))?;
        let account_type = AccountType::from_code(&self.account_type).ok_or_else(|| {
            AuthError::Internal(format!("Unknown account type: {}", self.account_type))
        })?;
        let role = UserRole::from_code(&self.role)
            .ok_or_else(|| AuthError::Internal(format!("Unknown role: {}", self.role)))?;
        let password_hash = HashedPassword::from_phc_string(self.password_hash)
            .map_err(|e| AuthError::Internal(format!("Invalid password hash: {}", e)))?;

        Ok(Account {
            account_id: AccountId::from_uuid(self.account_id),
            handle: Handle::from_db(self.handle),
            unique_id: UniqueId::from_db(self.unique_id),
            email: Email::from_db(self.email),
            phone: Phone::from_db(self.phone),
            first_name: self.first_name,
            last_name: self.last_name,
            slug: self.slug,
            password_hash,
            status,
            account_type,
            role,
            is_active: self.is_active,
            is_deleted: self.is_deleted,
            is_logged_in: self.is_logged_in,
            otp: self.otp.map(OtpCode::from_db),
            otp_expires_at: self.otp_expires_at,
            auth_token: self.auth_token,
            auth_token_expires_at: self.auth_token_expires_at,
            refresh_token: self.refresh_token,
            refresh_token_expires_at: self.refresh_token_expires_at,
            devices: self.devices,
            last_login_at: self.last_login_at,
            last_logout_at: self.last_logout_at,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct LoginRecordRow {
    account_id: Uuid,
    first_name: String,
    last_name: String,
    email: String,
    handle: String,
    role: String,
    status: String,
    is_active: bool,
    devices: Vec<String>,
    current_status: String,
    last_login_at: Option<DateTime<Utc>>,
    last_logout_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl LoginRecordRow {
    fn into_record(self) -> AuthResult<LoginRecord> {
        let role = UserRole::from_code(&self.role)
            .ok_or_else(|| AuthError::Internal(format!("Unknown role: {}", self.role)))?;
        let status = AccountStatus::from_code(&self.status)
            .ok_or_else(|| AuthError::Internal(format!("Unknown account status: {}", self.status)))?;
        let current_status = CurrentStatus::from_code(&self.current_status).ok_or_else(|| {
            AuthError::Internal(format!("Unknown session status: {}", self.current_status))
        })?;

        Ok(LoginRecord {
            account_id: AccountId::from_uuid(self.account_id),
            first_name: self.first_name,
            last_name: self.last_name,
            email: self.email,
            handle: self.handle,
            role,
            status,
            is_active: self.is_active,
            devices: self.devices,
            current_status,
            last_login_at: self.last_login_at,
            last_logout_at: self.last_logout_at,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}
