use lazy_static::lazy_static;
use regex::Regex;
use time::{Duration, OffsetDateTime};
use tracing::{debug, info, warn};

use crate::{
    auth::jwt::{Claims, JwtKeys},
    auth::password::{dummy_hash, hash_password, is_strong_password, verify_password},
    auth::repo::{AuthStore, CredentialStore},
    auth::repo_types::{NewUser, TokenPurpose, User, UserType, ROLE_ADMIN, ROLE_USER},
    auth::tokens,
    config::AppConfig,
    error::AuthError,
    membership::machine::{self, MembershipStatus, MembershipTrigger},
    notify::Mailer,
};

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Input for account registration, already decoupled from the HTTP body.
#[derive(Debug, Clone)]
pub struct Registration {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub user_type: UserType,
}

/// Result of a successful login.
#[derive(Debug, Clone)]
pub struct LoginSession {
    pub token: String,
    pub expires_at: OffsetDateTime,
    pub user: User,
}

/// Named permission checked during authorization. Role `Admin` (or an Admin
/// account type) grants everything; otherwise each dashboard requires the
/// matching account type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    AdminDashboard,
    MemberDashboard,
    AthleteDashboard,
    CoachDashboard,
    ManageMembership,
}

impl Capability {
    pub fn granted_to(self, role: &str, user_type: UserType) -> bool {
        if role == ROLE_ADMIN || user_type == UserType::Admin {
            return true;
        }
        match self {
            Capability::AdminDashboard | Capability::ManageMembership => false,
            Capability::MemberDashboard => user_type == UserType::Socio,
            Capability::AthleteDashboard => user_type == UserType::Atleta,
            Capability::CoachDashboard => user_type == UserType::Treinador,
        }
    }
}

/// Check verified session claims against a required capability.
pub fn authorize(claims: &Claims, capability: Capability) -> Result<(), AuthError> {
    if capability.granted_to(&claims.role, claims.user_type) {
        Ok(())
    } else {
        Err(AuthError::Forbidden)
    }
}

/// Create a Pending account, issue its activation token and hand the
/// activation link to the mailer. The mail dispatch happens after the store
/// writes commit; its failure is logged and never rolls anything back.
pub async fn register(
    store: &dyn AuthStore,
    mailer: &dyn Mailer,
    cfg: &AppConfig,
    registration: Registration,
) -> Result<User, AuthError> {
    let email = normalize_email(&registration.email);
    if !is_valid_email(&email) {
        return Err(AuthError::InvalidInput("Invalid email".into()));
    }
    if !is_strong_password(&registration.password) {
        return Err(AuthError::InvalidInput(
            "Password must be at least 8 characters with upper and lower case letters, a digit and a symbol".into(),
        ));
    }
    if registration.user_type == UserType::Admin {
        return Err(AuthError::InvalidInput(
            "Administrator accounts cannot self-register".into(),
        ));
    }

    let password_hash = hash_password(&registration.password)?;
    let user = store
        .create(NewUser {
            email: email.clone(),
            password_hash,
            first_name: registration.first_name,
            last_name: registration.last_name,
            phone: registration.phone,
            user_type: registration.user_type,
            role: ROLE_USER.to_string(),
            membership_status: MembershipStatus::Pending,
            is_active: true,
        })
        .await?;

    let token = tokens::issue(
        store,
        user.id,
        TokenPurpose::Activation,
        Duration::hours(cfg.tokens.activation_hours),
    )
    .await?;

    let link = cfg.activation_link(&token);
    if let Err(e) = mailer.send_activation(&user.email, &user.first_name, &link).await {
        warn!(error = %e, user_id = %user.id, "activation email delivery failed");
    }

    info!(user_id = %user.id, email = %user.email, "user registered");
    Ok(user)
}

/// Redeem an activation token and move the account out of Pending. A token
/// redeemed after a qualifying payment already activated the account is a
/// no-op success.
pub async fn activate(store: &dyn AuthStore, token: &str) -> Result<User, AuthError> {
    let user_id = tokens::redeem(store, token, TokenPurpose::Activation).await?;
    let user = store
        .find_by_id(user_id)
        .await?
        .ok_or(AuthError::InvalidToken)?;

    match machine::apply(user.membership_status, MembershipTrigger::Activation) {
        Ok(next) => {
            store.update_status(user.id, next).await?;
            info!(user_id = %user.id, "account activated");
        }
        Err(_) if user.membership_status == MembershipStatus::Active => {
            debug!(user_id = %user.id, "activation token redeemed for already-active account");
        }
        Err(e) => return Err(e),
    }

    store.find_by_id(user_id).await?.ok_or(AuthError::InvalidToken)
}

/// Verify credentials and membership standing, then mint a session token.
///
/// Unknown email and wrong password return the identical error; the unknown
/// path still performs an argon2 verification so the two are comparable in
/// latency as well.
pub async fn login(
    store: &dyn AuthStore,
    keys: &JwtKeys,
    email: &str,
    password: &str,
) -> Result<LoginSession, AuthError> {
    let email = normalize_email(email);

    let user = match store.find_by_email(&email).await? {
        Some(user) => user,
        None => {
            let _ = verify_password(password, dummy_hash());
            debug!("login for unknown email");
            return Err(AuthError::InvalidCredentials);
        }
    };

    if !verify_password(password, &user.password_hash)? {
        debug!(user_id = %user.id, "login with wrong password");
        return Err(AuthError::InvalidCredentials);
    }

    // is_active is the absolute override; membership status gates after it
    if !user.is_active || !machine::can_login(user.membership_status) {
        warn!(user_id = %user.id, status = ?user.membership_status, is_active = user.is_active, "login refused for inactive account");
        return Err(AuthError::AccountNotActive);
    }

    if let Err(e) = store.touch_last_login(user.id).await {
        warn!(error = %e, user_id = %user.id, "failed to record last login");
    }

    let (token, expires_at) = keys.sign(&user)?;
    info!(user_id = %user.id, email = %user.email, "user logged in");
    Ok(LoginSession {
        token,
        expires_at,
        user,
    })
}

/// Issue a reset token and mail the link when the address belongs to an
/// account; otherwise do nothing observable. Always succeeds so responses
/// cannot be used to probe which emails are registered.
pub async fn request_password_reset(
    store: &dyn AuthStore,
    mailer: &dyn Mailer,
    cfg: &AppConfig,
    email: &str,
) -> Result<(), AuthError> {
    let email = normalize_email(email);
    let user = match store.find_by_email(&email).await? {
        Some(user) => user,
        None => {
            debug!("password reset requested for unknown email");
            return Ok(());
        }
    };

    let token = tokens::issue(
        store,
        user.id,
        TokenPurpose::PasswordReset,
        Duration::minutes(cfg.tokens.reset_minutes),
    )
    .await?;

    let link = cfg.reset_link(&token);
    if let Err(e) = mailer.send_password_reset(&user.email, &link).await {
        warn!(error = %e, user_id = %user.id, "reset email delivery failed");
    }

    info!(user_id = %user.id, "password reset requested");
    Ok(())
}

/// Redeem a reset token and replace the account's password hash.
pub async fn reset_password(
    store: &dyn AuthStore,
    token: &str,
    new_password: &str,
) -> Result<(), AuthError> {
    if !is_strong_password(new_password) {
        return Err(AuthError::InvalidInput(
            "Password must be at least 8 characters with upper and lower case letters, a digit and a symbol".into(),
        ));
    }

    let user_id = tokens::redeem(store, token, TokenPurpose::PasswordReset).await?;
    let hash = hash_password(new_password)?;
    store.update_password_hash(user_id, &hash).await?;
    info!(user_id, "password reset completed");
    Ok(())
}

/// First-run bootstrap: create an Active admin account from operator-supplied
/// credentials when no admin exists yet. A no-op when the variables are unset
/// or an admin is already present.
pub async fn bootstrap_admin(store: &dyn AuthStore, cfg: &AppConfig) -> Result<(), AuthError> {
    let (email, password) = match (&cfg.admin_email, &cfg.admin_password) {
        (Some(email), Some(password)) => (normalize_email(email), password.clone()),
        _ => return Ok(()),
    };

    if store.admin_exists().await? {
        debug!("admin account already present, skipping bootstrap");
        return Ok(());
    }
    if !is_valid_email(&email) {
        return Err(AuthError::InvalidInput("Invalid admin email".into()));
    }
    if !is_strong_password(&password) {
        return Err(AuthError::InvalidInput(
            "Admin bootstrap password does not meet the strength policy".into(),
        ));
    }

    let password_hash = hash_password(&password)?;
    let user = store
        .create(NewUser {
            email,
            password_hash,
            first_name: "Admin".into(),
            last_name: "Clube".into(),
            phone: None,
            user_type: UserType::Admin,
            role: ROLE_ADMIN.to_string(),
            membership_status: MembershipStatus::Active,
            is_active: true,
        })
        .await?;
    store
        .update_status(user.id, MembershipStatus::Active)
        .await?;

    info!(user_id = %user.id, email = %user.email, "bootstrap admin account created");
    Ok(())
}
