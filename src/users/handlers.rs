use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::header,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use bytes::Bytes;
use tracing::{info, instrument, warn};

use crate::auth::extractors::AuthUser;
use crate::error::ApiError;
use crate::state::AppState;
use crate::users::dto::{
    ImageUploadResponse, PlaceholderImage, ProfileResponse, UpdateProfileRequest,
};
use crate::users::repo::{ProfileUpdate, UserRole};

const MAX_IMAGE_BYTES: usize = 1024 * 1024;

pub fn profile_routes() -> Router<AppState> {
    Router::new()
        .route("/profile", get(get_profile))
        .route("/profile", put(update_profile))
}

pub fn image_routes() -> Router<AppState> {
    Router::new()
        .route("/profile/image", post(upload_profile_image))
        .route("/profile/image/:email", get(fetch_profile_image))
        // Generous transport cap; the 1 MiB business limit is checked below.
        .layer(DefaultBodyLimit::max(5 * 1024 * 1024))
}

#[instrument(skip(actor), fields(email = %actor.0.email))]
pub async fn get_profile(actor: AuthUser) -> Json<ProfileResponse> {
    Json(actor.0.into())
}

#[instrument(skip(state, actor, payload), fields(email = %actor.0.email))]
pub async fn update_profile(
    State(state): State<AppState>,
    actor: AuthUser,
    Json(payload): Json<UpdateProfileRequest>,
) -> Result<Json<ProfileResponse>, ApiError> {
    let updated = state
        .users
        .update_profile(
            &actor.0.email,
            ProfileUpdate {
                name: payload.name,
                bio: payload.bio,
                tech_stack: payload.tech_stack,
                role: payload.role,
            },
        )
        .await?;
    info!(email = %updated.email, role = ?updated.role, "profile updated");
    Ok(Json(updated.into()))
}

/// Extension for an accepted upload file name, `None` for anything else.
fn image_extension(filename: &str) -> Option<&'static str> {
    if filename.ends_with(".jpg") {
        Some(".jpg")
    } else if filename.ends_with(".png") {
        Some(".png")
    } else {
        None
    }
}

fn content_type_for(key: &str) -> &'static str {
    if key.ends_with(".png") {
        "image/png"
    } else {
        "image/jpeg"
    }
}

#[instrument(skip(state, actor, multipart), fields(email = %actor.0.email))]
pub async fn upload_profile_image(
    State(state): State<AppState>,
    actor: AuthUser,
    mut multipart: Multipart,
) -> Result<Json<ImageUploadResponse>, ApiError> {
    let mut upload: Option<(String, Bytes)> = None;
    while let Ok(Some(field)) = multipart.next_field().await {
        if field.name() == Some("file") {
            let filename = field
                .file_name()
                .map(|s| s.to_string())
                .ok_or_else(|| ApiError::Validation("file name is required".into()))?;
            let data = field
                .bytes()
                .await
                .map_err(|e| ApiError::Validation(format!("unreadable upload: {e}")))?;
            upload = Some((filename, data));
            break;
        }
    }
    let (filename, data) =
        upload.ok_or_else(|| ApiError::Validation("file field is required".into()))?;

    let ext = image_extension(&filename)
        .ok_or_else(|| ApiError::Validation("only .jpg or .png files are allowed".into()))?;
    if data.len() > MAX_IMAGE_BYTES {
        warn!(size = data.len(), "upload exceeds size limit");
        return Err(ApiError::Validation("image must be 1MB or smaller".into()));
    }

    let key = format!("{}{}", actor.0.email, ext);
    state.images.put(&key, data).await?;
    state.users.set_profile_image(&actor.0.email, &key).await?;

    info!(key = %key, "profile image stored");
    Ok(Json(ImageUploadResponse {
        image_url: format!("/api/profile/image/{}", actor.0.email),
    }))
}

#[instrument(skip(state))]
pub async fn fetch_profile_image(
    State(state): State<AppState>,
    Path(email): Path<String>,
) -> Result<Response, ApiError> {
    let user = state
        .users
        .find(&email)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("no user {email}")))?;

    if let Some(key) = &user.profile_image {
        if let Some(bytes) = state.images.get(key).await? {
            let headers = [(header::CONTENT_TYPE, content_type_for(key))];
            return Ok((headers, bytes).into_response());
        }
    }

    let text = match user.role {
        UserRole::Mentor => "MENTOR",
        UserRole::Mentee => "MENTEE",
    };
    Ok(Json(PlaceholderImage {
        url: format!("https://placehold.co/500x500.jpg?text={text}"),
    })
    .into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepted_extensions() {
        assert_eq!(image_extension("me.jpg"), Some(".jpg"));
        assert_eq!(image_extension("me.png"), Some(".png"));
        assert_eq!(image_extension("me.jpeg"), None);
        assert_eq!(image_extension("me.gif"), None);
        assert_eq!(image_extension("jpg"), None);
    }

    #[test]
    fn content_types_follow_the_key() {
        assert_eq!(content_type_for("a@x.com.png"), "image/png");
        assert_eq!(content_type_for("a@x.com.jpg"), "image/jpeg");
    }

    #[test]
    fn size_limit_is_one_mebibyte() {
        assert_eq!(MAX_IMAGE_BYTES, 1_048_576);
    }
}
