use base64ct::{Base64UrlUnpadded, Encoding};
use rand::{rngs::OsRng, RngCore};
use time::{Duration, OffsetDateTime};
use tracing::debug;

use crate::{
    auth::repo::ActionTokenStore,
    auth::repo_types::{ActionTokenRow, TokenPurpose},
    error::AuthError,
};

/// 32 random bytes, url-safe base64. The opaque value is the credential;
/// account ids never appear in links.
pub fn generate_token() -> String {
    let mut bytes = [0u8; 32];
    OsRng.fill_bytes(&mut bytes);
    Base64UrlUnpadded::encode_string(&bytes)
}

/// Persist a fresh single-use token for an account and return its opaque value.
pub async fn issue<S: ActionTokenStore + ?Sized>(
    store: &S,
    user_id: i64,
    purpose: TokenPurpose,
    ttl: Duration,
) -> Result<String, AuthError> {
    let token = generate_token();
    let now = OffsetDateTime::now_utc();
    store
        .insert(ActionTokenRow {
            token: token.clone(),
            user_id,
            purpose,
            issued_at: now,
            expires_at: now + ttl,
            consumed: false,
        })
        .await?;
    debug!(user_id, purpose = ?purpose, "action token issued");
    Ok(token)
}

/// Redeem a token: consumption and validation are one atomic step, so at
/// most one concurrent caller succeeds. The losing paths are classified as
/// `InvalidToken` (unknown), `Expired` (past expiry, whether or not it was
/// ever used) or `AlreadyConsumed`.
pub async fn redeem<S: ActionTokenStore + ?Sized>(
    store: &S,
    token: &str,
    purpose: TokenPurpose,
) -> Result<i64, AuthError> {
    if let Some(user_id) = store.consume(token, purpose).await? {
        debug!(user_id, purpose = ?purpose, "action token redeemed");
        return Ok(user_id);
    }
    match store.find(token, purpose).await? {
        None => Err(AuthError::InvalidToken),
        Some(row) if row.expires_at <= OffsetDateTime::now_utc() => Err(AuthError::Expired),
        Some(_) => Err(AuthError::AlreadyConsumed),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::auth::testing::MemStore;

    #[test]
    fn generated_tokens_are_long_and_unique() {
        let a = generate_token();
        let b = generate_token();
        assert_ne!(a, b);
        assert!(a.len() >= 40);
        assert!(!a.contains('='));
    }

    #[tokio::test]
    async fn issue_then_redeem_returns_the_account() {
        let store = MemStore::new();
        let token = issue(&store, 42, TokenPurpose::Activation, Duration::hours(48))
            .await
            .expect("issue");
        let user_id = redeem(&store, &token, TokenPurpose::Activation)
            .await
            .expect("redeem");
        assert_eq!(user_id, 42);
    }

    #[tokio::test]
    async fn second_redemption_fails_with_already_consumed() {
        let store = MemStore::new();
        let token = issue(&store, 1, TokenPurpose::PasswordReset, Duration::hours(1))
            .await
            .expect("issue");
        redeem(&store, &token, TokenPurpose::PasswordReset)
            .await
            .expect("first redemption");
        let err = redeem(&store, &token, TokenPurpose::PasswordReset)
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::AlreadyConsumed));
    }

    #[tokio::test]
    async fn unknown_token_is_invalid() {
        let store = MemStore::new();
        let err = redeem(&store, "no-such-token", TokenPurpose::Activation)
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidToken));
    }

    #[tokio::test]
    async fn wrong_purpose_is_invalid() {
        let store = MemStore::new();
        let token = issue(&store, 1, TokenPurpose::Activation, Duration::hours(1))
            .await
            .expect("issue");
        let err = redeem(&store, &token, TokenPurpose::PasswordReset)
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidToken));
    }

    #[tokio::test]
    async fn expired_token_is_rejected_even_if_unconsumed() {
        let store = MemStore::new();
        let token = issue(&store, 1, TokenPurpose::Activation, Duration::seconds(-1))
            .await
            .expect("issue");
        let err = redeem(&store, &token, TokenPurpose::Activation)
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Expired));
    }

    #[tokio::test]
    async fn expired_token_is_rejected_even_if_consumed() {
        let store = MemStore::new();
        let now = OffsetDateTime::now_utc();
        store
            .insert(ActionTokenRow {
                token: "stale".into(),
                user_id: 1,
                purpose: TokenPurpose::Activation,
                issued_at: now - Duration::hours(3),
                expires_at: now - Duration::hours(1),
                consumed: true,
            })
            .await
            .expect("insert");
        let err = redeem(&store, "stale", TokenPurpose::Activation)
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Expired));
    }

    #[tokio::test]
    async fn parallel_redemptions_have_exactly_one_winner() {
        let store = Arc::new(MemStore::new());
        let token = issue(store.as_ref(), 9, TokenPurpose::Activation, Duration::hours(1))
            .await
            .expect("issue");

        let mut handles = Vec::new();
        for _ in 0..8 {
            let store = store.clone();
            let token = token.clone();
            handles.push(tokio::spawn(async move {
                redeem(store.as_ref(), &token, TokenPurpose::Activation).await
            }));
        }

        let mut successes = 0;
        let mut consumed_errors = 0;
        for handle in handles {
            match handle.await.expect("task") {
                Ok(user_id) => {
                    assert_eq!(user_id, 9);
                    successes += 1;
                }
                Err(AuthError::AlreadyConsumed) => consumed_errors += 1,
                Err(other) => panic!("unexpected error: {other:?}"),
            }
        }
        assert_eq!(successes, 1);
        assert_eq!(consumed_errors, 7);
    }
}
