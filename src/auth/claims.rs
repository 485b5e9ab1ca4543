use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::users::repo::UserRole;

/// JWT payload. Derived from a verified token on each request and never
/// persisted server-side.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub iss: String,   // issuer
    pub sub: String,   // subject: the user's email
    pub aud: String,   // audience
    pub exp: usize,    // expires at (unix timestamp)
    pub nbf: usize,    // not before
    pub iat: usize,    // issued at
    pub jti: Uuid,     // unique token id
    pub name: String,
    pub email: String,
    pub role: UserRole,
}
