use anyhow::{Context, Result};
use sqlx::{postgres::PgPoolOptions, PgPool};
use tracing::info;

use crate::config::Config;

pub mod readings;
pub mod sessions;
pub mod users;

pub use readings::ReadingRepository;
pub use sessions::SessionRepository;
pub use users::UserRepository;

pub struct PgRepo {
    pub pool: PgPool,
}

impl PgRepo {
    pub async fn connect(cfg: &Config) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(cfg.db.max_connections)
            .connect(&cfg.db.url)
            .await
            .context("Failed to create database pool")?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .context("Failed to run database migrations")?;
        info!("database pool ready, migrations applied");

        Ok(Self { pool })
    }

    /// Get a user repository
    pub fn users(&self) -> UserRepository {
        UserRepository::new(&self.pool)
    }

    /// Get a session repository
    pub fn sessions(&self) -> SessionRepository {
        SessionRepository::new(&self.pool)
    }

    /// Get a reading repository
    pub fn readings(&self) -> ReadingRepository {
        ReadingRepository::new(&self.pool)
    }
}
