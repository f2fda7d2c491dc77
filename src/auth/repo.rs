use async_trait::async_trait;
use sqlx::PgPool;

use crate::{
    auth::repo_types::{ActionTokenRow, NewUser, TokenPurpose, User},
    error::AuthError,
    membership::machine::MembershipStatus,
};

/// Durable record of accounts. All reads and writes are atomic per account;
/// the unique constraint on lower(email) is enforced by the store.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AuthError>;
    async fn find_by_id(&self, id: i64) -> Result<Option<User>, AuthError>;
    /// Fails with `DuplicateEmail` when the normalized email is taken.
    async fn create(&self, draft: NewUser) -> Result<User, AuthError>;
    /// Also stamps `member_since` the first time a status becomes Active.
    async fn update_status(&self, id: i64, status: MembershipStatus) -> Result<(), AuthError>;
    async fn update_password_hash(&self, id: i64, hash: &str) -> Result<(), AuthError>;
    async fn touch_last_login(&self, id: i64) -> Result<(), AuthError>;
    async fn admin_exists(&self) -> Result<bool, AuthError>;
}

/// Persistence for single-use action tokens. Consumption is conditional on
/// the current unconsumed state so two concurrent redemptions cannot both
/// succeed.
#[async_trait]
pub trait ActionTokenStore: Send + Sync {
    async fn insert(&self, row: ActionTokenRow) -> Result<(), AuthError>;
    /// Atomically consume a live (unconsumed, unexpired) token. Returns the
    /// owning account id when this call won the consumption.
    async fn consume(&self, token: &str, purpose: TokenPurpose) -> Result<Option<i64>, AuthError>;
    async fn find(
        &self,
        token: &str,
        purpose: TokenPurpose,
    ) -> Result<Option<ActionTokenRow>, AuthError>;
}

pub trait AuthStore: CredentialStore + ActionTokenStore {}
impl<T: CredentialStore + ActionTokenStore> AuthStore for T {}

const USER_COLUMNS: &str = "id, email, password_hash, first_name, last_name, phone, user_type, \
     role, membership_status, is_active, member_since, last_login, created_at";

/// Postgres-backed store.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CredentialStore for PgStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AuthError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE lower(email) = lower($1)"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<User>, AuthError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn create(&self, draft: NewUser) -> Result<User, AuthError> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users
                (email, password_hash, first_name, last_name, phone,
                 user_type, role, membership_status, is_active)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(&draft.email)
        .bind(&draft.password_hash)
        .bind(&draft.first_name)
        .bind(&draft.last_name)
        .bind(&draft.phone)
        .bind(draft.user_type)
        .bind(&draft.role)
        .bind(draft.membership_status)
        .bind(draft.is_active)
        .fetch_one(&self.pool)
        .await?;
        Ok(user)
    }

    async fn update_status(&self, id: i64, status: MembershipStatus) -> Result<(), AuthError> {
        sqlx::query(
            r#"
            UPDATE users
            SET membership_status = $2,
                member_since = CASE
                    WHEN $2 = 'Active'::membership_status THEN COALESCE(member_since, now())
                    ELSE member_since
                END
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(status)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn update_password_hash(&self, id: i64, hash: &str) -> Result<(), AuthError> {
        sqlx::query("UPDATE users SET password_hash = $2 WHERE id = $1")
            .bind(id)
            .bind(hash)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn touch_last_login(&self, id: i64) -> Result<(), AuthError> {
        sqlx::query("UPDATE users SET last_login = now() WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn admin_exists(&self) -> Result<bool, AuthError> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM users WHERE role = 'Admin' OR user_type = 'Admin'::user_type)",
        )
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }
}

#[async_trait]
impl ActionTokenStore for PgStore {
    async fn insert(&self, row: ActionTokenRow) -> Result<(), AuthError> {
        sqlx::query(
            r#"
            INSERT INTO action_tokens (token, user_id, purpose, issued_at, expires_at, consumed)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(&row.token)
        .bind(row.user_id)
        .bind(row.purpose)
        .bind(row.issued_at)
        .bind(row.expires_at)
        .bind(row.consumed)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn consume(&self, token: &str, purpose: TokenPurpose) -> Result<Option<i64>, AuthError> {
        // compare-and-set: at most one caller sees a row come back
        let user_id = sqlx::query_scalar::<_, i64>(
            r#"
            UPDATE action_tokens
            SET consumed = TRUE
            WHERE token = $1 AND purpose = $2 AND consumed = FALSE AND expires_at > now()
            RETURNING user_id
            "#,
        )
        .bind(token)
        .bind(purpose)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user_id)
    }

    async fn find(
        &self,
        token: &str,
        purpose: TokenPurpose,
    ) -> Result<Option<ActionTokenRow>, AuthError> {
        let row = sqlx::query_as::<_, ActionTokenRow>(
            r#"
            SELECT token, user_id, purpose, issued_at, expires_at, consumed
            FROM action_tokens
            WHERE token = $1 AND purpose = $2
            "#,
        )
        .bind(token)
        .bind(purpose)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }
}
