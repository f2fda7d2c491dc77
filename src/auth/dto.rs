use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::auth::repo_types::{User, UserType};
use crate::membership::machine::MembershipStatus;

/// Request body for member registration.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    /// Defaults to Socio; Admin is rejected.
    pub user_type: Option<UserType>,
}

/// Response returned after registration; the account stays Pending until
/// the emailed activation link is used.
#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub user_id: i64,
    pub email: String,
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct ActivateRequest {
    pub token: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Response returned after login.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub expires_at: OffsetDateTime,
    pub user: PublicUser,
}

#[derive(Debug, Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct ResetPasswordRequest {
    pub token: String,
    pub new_password: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Public part of an account, safe to return to its owner.
#[derive(Debug, Serialize)]
pub struct PublicUser {
    pub id: i64,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub user_type: UserType,
}

impl From<&User> for PublicUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            user_type: user.user_type,
        }
    }
}

/// Authenticated profile, `/me`.
#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub id: i64,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub user_type: UserType,
    pub membership_status: MembershipStatus,
    pub member_since: Option<OffsetDateTime>,
    pub created_at: OffsetDateTime,
}

impl From<&User> for ProfileResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            phone: user.phone.clone(),
            user_type: user.user_type,
            membership_status: user.membership_status,
            member_since: user.member_since,
            created_at: user.created_at,
        }
    }
}

/// Identity payload returned by the role-gated dashboard probes.
#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    pub dashboard: &'static str,
    pub user_id: i64,
    pub email: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn public_user_never_serializes_a_password_hash() {
        let response = PublicUser {
            id: 1,
            email: "test@example.com".into(),
            first_name: "Ana".into(),
            last_name: "Silva".into(),
            user_type: UserType::Socio,
        };
        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("test@example.com"));
        assert!(json.contains("Socio"));
        assert!(!json.contains("password"));
    }
}
