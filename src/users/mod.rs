use axum::Router;

use crate::state::AppState;

pub mod dto;
pub mod handlers;
pub mod repo;
pub mod seed;

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(handlers::profile_routes())
        .merge(handlers::image_routes())
}
