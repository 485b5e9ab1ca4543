use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};

use crate::auth::jwt::JwtKeys;
use crate::error::ApiError;
use crate::state::AppState;
use crate::users::repo::User;

/// Authenticated identity for the current request: token verified, then the
/// subject re-resolved against the user store. Claims are not trusted as
/// the source of truth; a deleted or role-changed account must reflect
/// current store state.
pub struct AuthUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .ok_or_else(|| ApiError::Unauthorized("missing Authorization header".into()))?;

        let token = auth
            .strip_prefix("Bearer ")
            .or_else(|| auth.strip_prefix("bearer "))
            .ok_or_else(|| ApiError::Unauthorized("invalid auth scheme".into()))?;

        let keys = JwtKeys::from_ref(state);
        let claims = keys.verify(token)?;

        let user = state
            .users
            .find(&claims.sub)
            .await?
            .ok_or_else(|| ApiError::Unauthorized("unknown subject".into()))?;

        Ok(AuthUser(user))
    }
}
