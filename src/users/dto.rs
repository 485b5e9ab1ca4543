use serde::{Deserialize, Serialize};

use crate::users::repo::{User, UserRole};

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub email: String,
    pub name: String,
    pub role: UserRole,
    pub bio: String,
    pub tech_stack: String,
}

impl From<User> for ProfileResponse {
    fn from(u: User) -> Self {
        Self {
            email: u.email,
            name: u.name,
            role: u.role,
            bio: u.bio,
            tech_stack: u.tech_stack,
        }
    }
}

/// Request body for profile update. Email is immutable and absent here.
#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    pub name: String,
    #[serde(default)]
    pub bio: String,
    #[serde(default)]
    pub tech_stack: String,
    pub role: UserRole,
}

#[derive(Debug, Serialize)]
pub struct ImageUploadResponse {
    pub image_url: String,
}

/// Fallback when a user has no stored image.
#[derive(Debug, Serialize)]
pub struct PlaceholderImage {
    pub url: String,
}
