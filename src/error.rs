use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Domain errors surfaced by the identity and membership flows.
///
/// Everything except `Infrastructure` is a recoverable, typed outcome that
/// maps to a client-facing status. `Infrastructure` wraps store or mailer
/// failures and is never shown to clients beyond a generic 500.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("email already registered")]
    DuplicateEmail,

    /// Unknown email and wrong password collapse into this single value.
    #[error("invalid email or password")]
    InvalidCredentials,

    /// Login refused because of membership status or a disabled account.
    /// The response body stays generic; the specific status is only visible
    /// through the membership admin endpoints.
    #[error("account is not active")]
    AccountNotActive,

    #[error("invalid token")]
    InvalidToken,

    #[error("token expired")]
    Expired,

    #[error("token already used")]
    AlreadyConsumed,

    #[error("authentication required")]
    Unauthorized,

    #[error("insufficient permissions")]
    Forbidden,

    #[error("membership transition not allowed")]
    InvalidTransition,

    #[error("record not found")]
    NotFound,

    #[error("{0}")]
    InvalidInput(String),

    #[error(transparent)]
    Infrastructure(#[from] anyhow::Error),
}

impl From<sqlx::Error> for AuthError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db) = &err {
            // the only unique constraint in the schema is lower(email)
            if db.is_unique_violation() {
                return AuthError::DuplicateEmail;
            }
        }
        AuthError::Infrastructure(err.into())
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, message): (StatusCode, String) = match &self {
            AuthError::DuplicateEmail => (StatusCode::CONFLICT, "Email already registered".into()),
            AuthError::InvalidCredentials => {
                (StatusCode::UNAUTHORIZED, "Invalid email or password".into())
            }
            AuthError::AccountNotActive => (StatusCode::FORBIDDEN, "Account is not active".into()),
            AuthError::InvalidToken => (StatusCode::BAD_REQUEST, "Link inválido.".into()),
            AuthError::Expired => (StatusCode::GONE, "Link expirado.".into()),
            AuthError::AlreadyConsumed => (StatusCode::GONE, "Link já utilizado.".into()),
            AuthError::Unauthorized => {
                (StatusCode::UNAUTHORIZED, "Authentication required".into())
            }
            AuthError::Forbidden => (StatusCode::FORBIDDEN, "Insufficient permissions".into()),
            AuthError::InvalidTransition => {
                (StatusCode::CONFLICT, "Membership transition not allowed".into())
            }
            AuthError::NotFound => (StatusCode::NOT_FOUND, "Not found".into()),
            AuthError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AuthError::Infrastructure(e) => {
                error!(error = %e, "infrastructure error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An unexpected error occurred".into(),
                )
            }
        };
        (status, Json(json!({ "message": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_errors_map_to_expected_statuses() {
        let cases = [
            (AuthError::DuplicateEmail, StatusCode::CONFLICT),
            (AuthError::InvalidCredentials, StatusCode::UNAUTHORIZED),
            (AuthError::AccountNotActive, StatusCode::FORBIDDEN),
            (AuthError::InvalidToken, StatusCode::BAD_REQUEST),
            (AuthError::Expired, StatusCode::GONE),
            (AuthError::AlreadyConsumed, StatusCode::GONE),
            (AuthError::Unauthorized, StatusCode::UNAUTHORIZED),
            (AuthError::Forbidden, StatusCode::FORBIDDEN),
            (AuthError::InvalidTransition, StatusCode::CONFLICT),
            (AuthError::NotFound, StatusCode::NOT_FOUND),
        ];
        for (err, expected) in cases {
            assert_eq!(err.into_response().status(), expected);
        }
    }

    #[test]
    fn infrastructure_errors_hide_details() {
        let err = AuthError::Infrastructure(anyhow::anyhow!("connection refused to 10.0.0.3"));
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
