use std::sync::Arc;

use anyhow::Context;
use sqlx::postgres::PgPoolOptions;

use crate::config::{AppConfig, JwtConfig};
use crate::matching::repo::{MatchStore, MemoryMatchStore, PgMatchStore};
use crate::storage::{FsImageStore, ImageStore, MemoryImageStore};
use crate::users::repo::{MemoryUserStore, PgUserStore, UserStore};

#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserStore>,
    pub matches: Arc<dyn MatchStore>,
    pub images: Arc<dyn ImageStore>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);

        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(&config.database_url)
            .await
            .context("connect to database")?;

        if let Err(e) = sqlx::migrate!("./migrations").run(&pool).await {
            tracing::warn!(error = %e, "migration failed; continuing");
        }

        let images = Arc::new(FsImageStore::new(&config.image_dir)?) as Arc<dyn ImageStore>;

        Ok(Self {
            users: Arc::new(PgUserStore::new(pool.clone())),
            matches: Arc::new(PgMatchStore::new(pool)),
            images,
            config,
        })
    }

    /// Fully in-memory state for tests and local experiments; no database
    /// or filesystem required.
    pub fn in_memory() -> Self {
        let config = Arc::new(AppConfig {
            database_url: "memory".into(),
            jwt: JwtConfig {
                secret: "test-secret".into(),
                issuer: "test-issuer".into(),
                audience: "test-aud".into(),
                ttl_minutes: 5,
            },
            image_dir: "unused".into(),
            seed_demo_users: false,
        });
        Self {
            users: Arc::new(MemoryUserStore::default()),
            matches: Arc::new(MemoryMatchStore::default()),
            images: Arc::new(MemoryImageStore::default()),
            config,
        }
    }
}
