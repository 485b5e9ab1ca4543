use axum::extract::FromRef;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use time::{Duration as TimeDuration, OffsetDateTime};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::auth::claims::Claims;
use crate::config::JwtConfig;
use crate::error::ApiError;
use crate::state::AppState;
use crate::users::repo::User;

/// Holds JWT signing and verification keys with config data.
#[derive(Clone)]
pub struct JwtKeys {
    pub encoding: EncodingKey,
    pub decoding: DecodingKey,
    pub issuer: String,
    pub audience: String,
    pub ttl: TimeDuration,
}

impl JwtKeys {
    pub fn from_config(cfg: &JwtConfig) -> Self {
        Self {
            encoding: EncodingKey::from_secret(cfg.secret.as_bytes()),
            decoding: DecodingKey::from_secret(cfg.secret.as_bytes()),
            issuer: cfg.issuer.clone(),
            audience: cfg.audience.clone(),
            ttl: TimeDuration::minutes(cfg.ttl_minutes),
        }
    }

    /// Issue a token carrying the user's identity claims. Expiry is
    /// `iat + ttl`; there is no refresh mechanism, expired tokens require a
    /// full re-login.
    pub fn sign(&self, user: &User) -> anyhow::Result<String> {
        let now = OffsetDateTime::now_utc();
        let exp = now + self.ttl;
        let claims = Claims {
            iss: self.issuer.clone(),
            sub: user.email.clone(),
            aud: self.audience.clone(),
            exp: exp.unix_timestamp() as usize,
            nbf: now.unix_timestamp() as usize,
            iat: now.unix_timestamp() as usize,
            jti: Uuid::new_v4(),
            name: user.name.clone(),
            email: user.email.clone(),
            role: user.role,
        };
        let token = encode(&Header::default(), &claims, &self.encoding)?;
        debug!(email = %user.email, role = ?user.role, "jwt signed");
        Ok(token)
    }

    /// Verify signature, expiry, not-before and issuer. The audience claim
    /// is carried but not enforced, matching the clients in the wild.
    pub fn verify(&self, token: &str) -> Result<Claims, ApiError> {
        let mut validation = Validation::default();
        validation.set_issuer(std::slice::from_ref(&self.issuer));
        validation.validate_aud = false;
        validation.validate_nbf = true;
        let data = decode::<Claims>(token, &self.decoding, &validation).map_err(|e| {
            warn!(error = %e, "jwt verification failed");
            ApiError::Unauthorized("invalid or expired token".into())
        })?;
        if data.claims.sub.is_empty() {
            return Err(ApiError::Unauthorized("token has no subject".into()));
        }
        debug!(email = %data.claims.sub, "jwt verified");
        Ok(data.claims)
    }
}

impl FromRef<AppState> for JwtKeys {
    fn from_ref(state: &AppState) -> Self {
        JwtKeys::from_config(&state.config.jwt)
    }
}
