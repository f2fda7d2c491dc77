use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::instrument;

use crate::{
    auth::extractors::AuthUser,
    auth::jwt::Claims,
    auth::repo::CredentialStore,
    auth::services::{authorize, Capability},
    error::AuthError,
    membership::dto::{PaymentRecorded, RecordPaymentRequest, StatusDetailResponse, TransitionResponse},
    membership::machine::MembershipTrigger,
    membership::repo::{self, Payment},
    membership::services,
    state::AppState,
};

pub fn membership_routes() -> Router<AppState> {
    Router::new()
        .route("/membership/payments", post(record_payment))
        .route("/membership/withdraw", post(withdraw))
        .route("/membership/:id", get(status_detail))
        .route("/membership/:id/payments", get(payment_history))
        .route("/membership/:id/suspend", post(suspend))
        .route("/membership/:id/cancel", post(cancel))
        .route("/membership/:id/reinstate", post(reinstate))
        .route("/membership/:id/reregister", post(reregister))
}

/// Record a quota payment and apply the qualifying-payment trigger. The
/// payment row is written first; the status update follows, and a payment
/// for an already-active member simply keeps the account Active.
#[instrument(skip(state, claims, payload))]
async fn record_payment(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Json(payload): Json<RecordPaymentRequest>,
) -> Result<(StatusCode, Json<PaymentRecorded>), AuthError> {
    authorize(&claims, Capability::ManageMembership)?;

    if payload.amount <= Decimal::ZERO {
        return Err(AuthError::InvalidInput("Amount must be positive".into()));
    }
    if payload.method.trim().is_empty() {
        return Err(AuthError::InvalidInput("Payment method is required".into()));
    }
    state
        .store
        .find_by_id(payload.user_id)
        .await?
        .ok_or(AuthError::NotFound)?;

    let payment = repo::record_payment(&state.db, payload.user_id, payload.amount, &payload.method)
        .await
        .map_err(AuthError::Infrastructure)?;

    let user = services::apply_trigger(
        state.store.as_ref(),
        payload.user_id,
        MembershipTrigger::QualifyingPayment,
    )
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(PaymentRecorded {
            payment,
            membership_status: user.membership_status,
        }),
    ))
}

/// Member-initiated withdrawal: cancels the caller's own membership.
#[instrument(skip(state, claims))]
async fn withdraw(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
) -> Result<Json<TransitionResponse>, AuthError> {
    let user = services::apply_trigger(
        state.store.as_ref(),
        claims.sub,
        MembershipTrigger::MemberWithdraw,
    )
    .await?;
    Ok(Json(TransitionResponse {
        user_id: user.id,
        membership_status: user.membership_status,
    }))
}

#[instrument(skip(state, claims))]
async fn status_detail(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<StatusDetailResponse>, AuthError> {
    authorize(&claims, Capability::ManageMembership)?;
    let user = state.store.find_by_id(id).await?.ok_or(AuthError::NotFound)?;
    Ok(Json(StatusDetailResponse::from(&user)))
}

#[derive(Debug, Deserialize)]
struct HistoryParams {
    limit: Option<i64>,
    offset: Option<i64>,
}

#[instrument(skip(state, claims))]
async fn payment_history(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Path(id): Path<i64>,
    Query(params): Query<HistoryParams>,
) -> Result<Json<Vec<Payment>>, AuthError> {
    authorize(&claims, Capability::ManageMembership)?;
    state.store.find_by_id(id).await?.ok_or(AuthError::NotFound)?;
    let rows = repo::list_by_user(
        &state.db,
        id,
        params.limit.unwrap_or(50).clamp(1, 200),
        params.offset.unwrap_or(0).max(0),
    )
    .await
    .map_err(AuthError::Infrastructure)?;
    Ok(Json(rows))
}

async fn admin_transition(
    state: &AppState,
    claims: &Claims,
    id: i64,
    trigger: MembershipTrigger,
) -> Result<Json<TransitionResponse>, AuthError> {
    authorize(claims, Capability::ManageMembership)?;
    let user = services::apply_trigger(state.store.as_ref(), id, trigger).await?;
    Ok(Json(TransitionResponse {
        user_id: user.id,
        membership_status: user.membership_status,
    }))
}

#[instrument(skip(state, claims))]
async fn suspend(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<TransitionResponse>, AuthError> {
    admin_transition(&state, &claims, id, MembershipTrigger::AdminSuspend).await
}

#[instrument(skip(state, claims))]
async fn cancel(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<TransitionResponse>, AuthError> {
    admin_transition(&state, &claims, id, MembershipTrigger::AdminCancel).await
}

#[instrument(skip(state, claims))]
async fn reinstate(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<TransitionResponse>, AuthError> {
    admin_transition(&state, &claims, id, MembershipTrigger::AdminReinstate).await
}

#[instrument(skip(state, claims))]
async fn reregister(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<TransitionResponse>, AuthError> {
    admin_transition(&state, &claims, id, MembershipTrigger::AdminReregister).await
}
