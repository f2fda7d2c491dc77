use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use base64ct::{Base64UrlUnpadded, Encoding};
use lazy_static::lazy_static;
use rand::{rngs::OsRng, RngCore};
use tracing::error;

pub fn hash_password(plain: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let hash = argon2
        .hash_password(plain.as_bytes(), &salt)
        .map_err(|e| {
            error!(error = %e, "argon2 hash_password error");
            anyhow::anyhow!(e.to_string())
        })?
        .to_string();
    Ok(hash)
}

pub fn verify_password(plain: &str, hash: &str) -> anyhow::Result<bool> {
    let parsed = PasswordHash::new(hash).map_err(|e| {
        error!(error = %e, "argon2 parse hash error");
        anyhow::anyhow!(e.to_string())
    })?;
    Ok(Argon2::default()
        .verify_password(plain.as_bytes(), &parsed)
        .is_ok())
}

/// Hash of a random password nobody knows. Logins for unknown emails verify
/// against this so the failure path costs the same as a real check and the
/// response time does not reveal whether the email exists.
pub fn dummy_hash() -> &'static str {
    lazy_static! {
        static ref DUMMY: String = {
            let mut bytes = [0u8; 32];
            OsRng.fill_bytes(&mut bytes);
            hash_password(&Base64UrlUnpadded::encode_string(&bytes)).unwrap_or_default()
        };
    }
    &DUMMY
}

/// Minimum 8 characters with at least one uppercase, one lowercase, one
/// digit and one non-alphanumeric character.
pub fn is_strong_password(password: &str) -> bool {
    password.len() >= 8
        && password.chars().any(|c| c.is_uppercase())
        && password.chars().any(|c| c.is_lowercase())
        && password.chars().any(|c| c.is_ascii_digit())
        && password.chars().any(|c| !c.is_alphanumeric())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_and_verify_roundtrip() {
        let password = "Secur3P@ssw0rd!";
        let hash = hash_password(password).expect("hashing should succeed");
        assert!(verify_password(password, &hash).expect("verify should succeed"));
    }

    #[test]
    fn verify_rejects_wrong_password() {
        let password = "correct-horse-battery-staple";
        let hash = hash_password(password).expect("hashing should succeed");
        assert!(!verify_password("wrong-password", &hash).expect("verify should not error"));
    }

    #[test]
    fn verify_errors_on_malformed_hash() {
        let err = verify_password("anything", "not-a-valid-hash").unwrap_err();
        assert!(!err.to_string().is_empty());
    }

    #[test]
    fn two_hashes_of_the_same_password_differ() {
        let password = "Secur3P@ssw0rd!";
        let a = hash_password(password).expect("hash");
        let b = hash_password(password).expect("hash");
        assert_ne!(a, b);
    }

    #[test]
    fn dummy_hash_never_verifies_a_real_password() {
        assert!(!verify_password("anything", dummy_hash()).expect("verify should not error"));
    }

    #[test]
    fn strength_rule_matches_the_policy() {
        assert!(is_strong_password("P@ssw0rd"));
        assert!(is_strong_password("Str0ng!pass"));
        assert!(!is_strong_password("Sh0rt!a")); // 7 chars
        assert!(!is_strong_password("alllower1!"));
        assert!(!is_strong_password("ALLUPPER1!"));
        assert!(!is_strong_password("NoDigits!"));
        assert!(!is_strong_password("NoSpecial1"));
    }
}
