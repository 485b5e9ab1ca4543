use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt: JwtConfig,
    pub image_dir: String,
    pub seed_demo_users: bool,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")?;
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET")?,
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "mentormatch".into()),
            audience: std::env::var("JWT_AUDIENCE")
                .unwrap_or_else(|_| "mentormatch-users".into()),
            ttl_minutes: std::env::var("JWT_TTL_MINUTES")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(60),
        };
        let image_dir = std::env::var("IMAGE_DIR").unwrap_or_else(|_| "profile_images".into());
        let seed_demo_users = std::env::var("SEED_DEMO_USERS")
            .map(|v| v == "true" || v == "1")
            .unwrap_or(false);
        Ok(Self {
            database_url,
            jwt,
            image_dir,
            seed_demo_users,
        })
    }
}
