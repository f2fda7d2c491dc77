use serde::{Deserialize, Serialize};

use crate::error::AuthError;

/// Lifecycle stage of an account's standing with the club, independent of
/// login credentials and of the `is_active` kill switch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "membership_status")]
pub enum MembershipStatus {
    Pending,
    Active,
    Suspended,
    Cancelled,
}

/// Events that may move an account between membership statuses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MembershipTrigger {
    /// Email-confirmation token redeemed.
    Activation,
    AdminSuspend,
    AdminCancel,
    /// Member-initiated withdrawal.
    MemberWithdraw,
    AdminReinstate,
    /// A qualifying quota payment was recorded; reactivates from any status.
    QualifyingPayment,
    /// Administrative re-registration of a cancelled account.
    AdminReregister,
}

/// Apply a trigger to the current status. Pairs outside the transition
/// table are rejected with `InvalidTransition`.
pub fn apply(
    status: MembershipStatus,
    trigger: MembershipTrigger,
) -> Result<MembershipStatus, AuthError> {
    use MembershipStatus::*;
    use MembershipTrigger::*;
    match (status, trigger) {
        (_, QualifyingPayment) => Ok(Active),
        (Pending, Activation) => Ok(Active),
        (Active, AdminSuspend) => Ok(Suspended),
        (Active, AdminCancel) => Ok(Cancelled),
        (Active, MemberWithdraw) => Ok(Cancelled),
        (Suspended, AdminReinstate) => Ok(Active),
        (Cancelled, AdminReregister) => Ok(Pending),
        _ => Err(AuthError::InvalidTransition),
    }
}

/// Only fully active members may authenticate. Pending accounts must finish
/// activation first; Suspended and Cancelled block login entirely.
pub fn can_login(status: MembershipStatus) -> bool {
    status == MembershipStatus::Active
}

#[cfg(test)]
mod tests {
    use super::*;
    use MembershipStatus::*;
    use MembershipTrigger::*;

    const ALL_STATUSES: [MembershipStatus; 4] = [Pending, Active, Suspended, Cancelled];
    const ALL_TRIGGERS: [MembershipTrigger; 7] = [
        Activation,
        AdminSuspend,
        AdminCancel,
        MemberWithdraw,
        AdminReinstate,
        QualifyingPayment,
        AdminReregister,
    ];

    fn expected(
        status: MembershipStatus,
        trigger: MembershipTrigger,
    ) -> Option<MembershipStatus> {
        match (status, trigger) {
            (_, QualifyingPayment) => Some(Active),
            (Pending, Activation) => Some(Active),
            (Active, AdminSuspend) => Some(Suspended),
            (Active, AdminCancel) => Some(Cancelled),
            (Active, MemberWithdraw) => Some(Cancelled),
            (Suspended, AdminReinstate) => Some(Active),
            (Cancelled, AdminReregister) => Some(Pending),
            _ => None,
        }
    }

    #[test]
    fn every_status_trigger_pair_matches_the_table() {
        for status in ALL_STATUSES {
            for trigger in ALL_TRIGGERS {
                match expected(status, trigger) {
                    Some(next) => {
                        assert_eq!(
                            apply(status, trigger).expect("transition should be allowed"),
                            next,
                            "{status:?} + {trigger:?}"
                        );
                    }
                    None => {
                        assert!(
                            matches!(apply(status, trigger), Err(AuthError::InvalidTransition)),
                            "{status:?} + {trigger:?} should be rejected"
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn qualifying_payment_reactivates_from_any_status() {
        for status in ALL_STATUSES {
            assert_eq!(apply(status, QualifyingPayment).unwrap(), Active);
        }
    }

    #[test]
    fn cancelled_is_terminal_except_reregistration_and_payment() {
        for trigger in ALL_TRIGGERS {
            let result = apply(Cancelled, trigger);
            match trigger {
                AdminReregister => assert_eq!(result.unwrap(), Pending),
                QualifyingPayment => assert_eq!(result.unwrap(), Active),
                _ => assert!(matches!(result, Err(AuthError::InvalidTransition))),
            }
        }
    }

    #[test]
    fn only_active_members_can_login() {
        assert!(can_login(Active));
        assert!(!can_login(Pending));
        assert!(!can_login(Suspended));
        assert!(!can_login(Cancelled));
    }
}
