use crate::state::AppState;
use axum::Router;

mod dto;
pub mod handlers;
pub mod machine;
pub mod repo;
pub mod services;

pub fn router() -> Router<AppState> {
    Router::new().merge(handlers::membership_routes())
}
