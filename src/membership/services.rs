use tracing::info;

use crate::{
    auth::repo::CredentialStore,
    auth::repo_types::User,
    error::AuthError,
    membership::machine::{self, MembershipTrigger},
};

/// Apply a membership trigger to an account and persist the new status.
/// Returns the account as it looks after the transition.
pub async fn apply_trigger<S: CredentialStore + ?Sized>(
    store: &S,
    user_id: i64,
    trigger: MembershipTrigger,
) -> Result<User, AuthError> {
    let user = store
        .find_by_id(user_id)
        .await?
        .ok_or(AuthError::NotFound)?;

    let next = machine::apply(user.membership_status, trigger)?;
    store.update_status(user.id, next).await?;
    info!(user_id = %user.id, from = ?user.membership_status, to = ?next, trigger = ?trigger, "membership transition");

    store.find_by_id(user_id).await?.ok_or(AuthError::NotFound)
}
