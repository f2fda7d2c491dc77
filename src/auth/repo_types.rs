use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;

use crate::membership::machine::MembershipStatus;

/// Coarse authorization role, orthogonal to `UserType` (which routes
/// dashboards) and to `MembershipStatus` (which gates access at all).
pub const ROLE_USER: &str = "User";
pub const ROLE_ADMIN: &str = "Admin";

/// What kind of member an account is; decides which dashboard it may reach.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_type")]
pub enum UserType {
    Socio,
    Atleta,
    Treinador,
    Admin,
}

/// Account record in the database.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: i64,
    pub email: String, // stored lowercase
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub user_type: UserType,
    pub role: String,
    pub membership_status: MembershipStatus,
    /// Soft-disable flag; `false` blocks login regardless of status.
    pub is_active: bool,
    /// Set when the status first becomes Active, never cleared.
    pub member_since: Option<OffsetDateTime>,
    pub last_login: Option<OffsetDateTime>,
    pub created_at: OffsetDateTime,
}

/// Draft for account creation; the store assigns id and created_at.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub user_type: UserType,
    pub role: String,
    pub membership_status: MembershipStatus,
    pub is_active: bool,
}

/// Purpose of a single-use action token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "token_purpose")]
pub enum TokenPurpose {
    Activation,
    PasswordReset,
}

/// Persisted single-use token backing the activation and reset ceremonies.
/// Redeemable exactly once and only before expiry.
#[derive(Debug, Clone, FromRow)]
pub struct ActionTokenRow {
    pub token: String,
    pub user_id: i64,
    pub purpose: TokenPurpose,
    pub issued_at: OffsetDateTime,
    pub expires_at: OffsetDateTime,
    pub consumed: bool,
}
