use axum::{
    extract::State,
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use tracing::instrument;

use crate::auth::extractors::AuthUser;
use crate::error::ApiError;
use crate::matching::dto::{MatchRequestBody, MatchResponse, RespondRequest};
use crate::matching::service;
use crate::state::AppState;

pub fn match_routes() -> Router<AppState> {
    Router::new()
        .route("/match", post(request_match))
        .route("/match/requests", get(list_requests))
        .route("/match/respond", post(respond))
        .route("/match/cancel", delete(cancel))
}

#[instrument(skip(state, actor, payload), fields(mentee = %actor.0.email))]
pub async fn request_match(
    State(state): State<AppState>,
    actor: AuthUser,
    Json(payload): Json<MatchRequestBody>,
) -> Result<Json<MatchResponse>, ApiError> {
    let record =
        service::request_match(&state, &actor.0, &payload.mentor_email, &payload.message).await?;
    Ok(Json(record.into()))
}

#[instrument(skip(state, actor), fields(caller = %actor.0.email))]
pub async fn list_requests(
    State(state): State<AppState>,
    actor: AuthUser,
) -> Result<Json<Vec<MatchResponse>>, ApiError> {
    let records = service::list_requests(&state, &actor.0).await?;
    Ok(Json(records.into_iter().map(MatchResponse::from).collect()))
}

#[instrument(skip(state, actor, payload), fields(mentor = %actor.0.email))]
pub async fn respond(
    State(state): State<AppState>,
    actor: AuthUser,
    Json(payload): Json<RespondRequest>,
) -> Result<Json<MatchResponse>, ApiError> {
    let record =
        service::respond(&state, &actor.0, &payload.mentee_email, payload.accept).await?;
    Ok(Json(record.into()))
}

#[instrument(skip(state, actor), fields(mentee = %actor.0.email))]
pub async fn cancel(
    State(state): State<AppState>,
    actor: AuthUser,
) -> Result<StatusCode, ApiError> {
    service::cancel(&state, &actor.0).await?;
    Ok(StatusCode::NO_CONTENT)
}
