use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::instrument;

use crate::{
    auth::{
        dto::{
            ActivateRequest, DashboardResponse, ForgotPasswordRequest, LoginRequest,
            LoginResponse, MessageResponse, ProfileResponse, PublicUser, RegisterRequest,
            RegisterResponse, ResetPasswordRequest,
        },
        extractors::AuthUser,
        jwt::JwtKeys,
        repo::CredentialStore,
        repo_types::UserType,
        services::{self, Capability, Registration},
    },
    error::AuthError,
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/ativar-conta", post(activate))
        .route("/auth/login", post(login))
        .route("/auth/forgot-password", post(forgot_password))
        .route("/auth/reset-password", post(reset_password))
}

pub fn me_routes() -> Router<AppState> {
    Router::new().route("/me", get(get_me))
}

pub fn dashboard_routes() -> Router<AppState> {
    Router::new()
        .route("/dashboard/admin", get(admin_dashboard))
        .route("/dashboard/socio", get(socio_dashboard))
        .route("/dashboard/atleta", get(atleta_dashboard))
        .route("/dashboard/treinador", get(treinador_dashboard))
}

#[instrument(skip(state, payload))]
async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>), AuthError> {
    let user = services::register(
        state.store.as_ref(),
        state.mailer.as_ref(),
        &state.config,
        Registration {
            email: payload.email,
            password: payload.password,
            first_name: payload.first_name,
            last_name: payload.last_name,
            phone: payload.phone,
            user_type: payload.user_type.unwrap_or(UserType::Socio),
        },
    )
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            user_id: user.id,
            email: user.email,
            message: "Registration successful. Check your email to activate the account.".into(),
        }),
    ))
}

#[instrument(skip(state, payload))]
async fn activate(
    State(state): State<AppState>,
    Json(payload): Json<ActivateRequest>,
) -> Result<Json<MessageResponse>, AuthError> {
    services::activate(state.store.as_ref(), &payload.token).await?;
    Ok(Json(MessageResponse {
        message: "Conta ativada com sucesso.".into(),
    }))
}

#[instrument(skip(state, payload))]
async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AuthError> {
    let keys = JwtKeys::from_ref(&state);
    let session = services::login(
        state.store.as_ref(),
        &keys,
        &payload.email,
        &payload.password,
    )
    .await?;

    Ok(Json(LoginResponse {
        token: session.token,
        expires_at: session.expires_at,
        user: PublicUser::from(&session.user),
    }))
}

#[instrument(skip(state, payload))]
async fn forgot_password(
    State(state): State<AppState>,
    Json(payload): Json<ForgotPasswordRequest>,
) -> Result<Json<MessageResponse>, AuthError> {
    services::request_password_reset(
        state.store.as_ref(),
        state.mailer.as_ref(),
        &state.config,
        &payload.email,
    )
    .await?;
    // identical response whether or not the email exists
    Ok(Json(MessageResponse {
        message: "Se o email existir, receberá instruções para recuperar a password.".into(),
    }))
}

#[instrument(skip(state, payload))]
async fn reset_password(
    State(state): State<AppState>,
    Json(payload): Json<ResetPasswordRequest>,
) -> Result<Json<MessageResponse>, AuthError> {
    services::reset_password(state.store.as_ref(), &payload.token, &payload.new_password).await?;
    Ok(Json(MessageResponse {
        message: "Password alterada com sucesso.".into(),
    }))
}

#[instrument(skip(state))]
async fn get_me(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
) -> Result<Json<ProfileResponse>, AuthError> {
    let user = state
        .store
        .find_by_id(claims.sub)
        .await?
        .ok_or(AuthError::Unauthorized)?;
    Ok(Json(ProfileResponse::from(&user)))
}

async fn admin_dashboard(
    AuthUser(claims): AuthUser,
) -> Result<Json<DashboardResponse>, AuthError> {
    services::authorize(&claims, Capability::AdminDashboard)?;
    Ok(Json(DashboardResponse {
        dashboard: "admin",
        user_id: claims.sub,
        email: claims.email,
    }))
}

async fn socio_dashboard(
    AuthUser(claims): AuthUser,
) -> Result<Json<DashboardResponse>, AuthError> {
    services::authorize(&claims, Capability::MemberDashboard)?;
    Ok(Json(DashboardResponse {
        dashboard: "socio",
        user_id: claims.sub,
        email: claims.email,
    }))
}

async fn atleta_dashboard(
    AuthUser(claims): AuthUser,
) -> Result<Json<DashboardResponse>, AuthError> {
    services::authorize(&claims, Capability::AthleteDashboard)?;
    Ok(Json(DashboardResponse {
        dashboard: "atleta",
        user_id: claims.sub,
        email: claims.email,
    }))
}

async fn treinador_dashboard(
    AuthUser(claims): AuthUser,
) -> Result<Json<DashboardResponse>, AuthError> {
    services::authorize(&claims, Capability::CoachDashboard)?;
    Ok(Json(DashboardResponse {
        dashboard: "treinador",
        user_id: claims.sub,
        email: claims.email,
    }))
}
