use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use lazy_static::lazy_static;
use regex::Regex;
use tracing::{info, instrument, warn};

use crate::auth::{
    dto::{LoginRequest, SignupRequest, SignupResponse, TokenResponse},
    jwt::JwtKeys,
    password::{hash_password, verify_password},
};
use crate::error::ApiError;
use crate::state::AppState;
use crate::users::repo::NewUser;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/signup", post(signup))
        .route("/login", post(login))
}

#[instrument(skip(state, payload))]
pub async fn signup(
    State(state): State<AppState>,
    Json(mut payload): Json<SignupRequest>,
) -> Result<(StatusCode, Json<SignupResponse>), ApiError> {
    payload.email = payload.email.trim().to_lowercase();

    if !is_valid_email(&payload.email) {
        warn!(email = %payload.email, "invalid email");
        return Err(ApiError::Validation("invalid email".into()));
    }

    if payload.password.len() < 8 {
        warn!("password too short");
        return Err(ApiError::Validation("password too short".into()));
    }

    let hash = hash_password(&payload.password)?;

    let user = state
        .users
        .create(NewUser {
            email: payload.email,
            password_hash: hash,
            name: payload.name,
            role: payload.role,
            bio: String::new(),
            tech_stack: String::new(),
        })
        .await?;

    info!(email = %user.email, role = ?user.role, "user registered");
    Ok((
        StatusCode::CREATED,
        Json(SignupResponse {
            email: user.email,
            name: user.name,
            role: user.role,
        }),
    ))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(mut payload): Json<LoginRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    payload.email = payload.email.trim().to_lowercase();

    let user = state
        .users
        .find(&payload.email)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("invalid credentials".into()))?;

    let ok = verify_password(&payload.password, &user.password_hash)?;
    if !ok {
        warn!(email = %payload.email, "login invalid password");
        return Err(ApiError::Unauthorized("invalid credentials".into()));
    }

    let keys = JwtKeys::from_ref(&state);
    let access_token = keys.sign(&user)?;

    info!(email = %user.email, "user logged in");
    Ok(Json(TokenResponse {
        access_token,
        token_type: "bearer".into(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_validation() {
        assert!(is_valid_email("user@example.com"));
        assert!(is_valid_email("a.b+c@sub.domain.org"));
        assert!(!is_valid_email("no-at-sign"));
        assert!(!is_valid_email("two@at@signs.com"));
        assert!(!is_valid_email("spaces in@mail.com"));
        assert!(!is_valid_email("user@nodot"));
    }
}
