use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::auth::repo_types::{User, UserType};
use crate::membership::machine::MembershipStatus;
use crate::membership::repo::Payment;

/// Request body for recording a quota payment against an account.
#[derive(Debug, Deserialize)]
pub struct RecordPaymentRequest {
    pub user_id: i64,
    pub amount: Decimal,
    pub method: String,
}

#[derive(Debug, Serialize)]
pub struct PaymentRecorded {
    pub payment: Payment,
    pub membership_status: MembershipStatus,
}

#[derive(Debug, Serialize)]
pub struct TransitionResponse {
    pub user_id: i64,
    pub membership_status: MembershipStatus,
}

/// Administrative status detail. This is the only place the precise
/// Pending/Suspended/Cancelled distinction is disclosed.
#[derive(Debug, Serialize)]
pub struct StatusDetailResponse {
    pub user_id: i64,
    pub email: String,
    pub user_type: UserType,
    pub role: String,
    pub membership_status: MembershipStatus,
    pub is_active: bool,
    pub member_since: Option<OffsetDateTime>,
    pub last_login: Option<OffsetDateTime>,
}

impl From<&User> for StatusDetailResponse {
    fn from(user: &User) -> Self {
        Self {
            user_id: user.id,
            email: user.email.clone(),
            user_type: user.user_type,
            role: user.role.clone(),
            membership_status: user.membership_status,
            is_active: user.is_active,
            member_since: user.member_since,
            last_login: user.last_login,
        }
    }
}
