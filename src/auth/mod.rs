use axum::Router;

use crate::state::AppState;

pub mod claims;
pub mod dto;
pub(crate) mod extractors;
pub mod handlers;
pub mod jwt;
pub mod password;

pub fn router() -> Router<AppState> {
    Router::new().merge(handlers::auth_routes())
}
