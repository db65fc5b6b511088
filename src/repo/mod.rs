use crate::config::Config;
use anyhow::Result;

pub struct Repositories {
    pub db: crate::repo::pg::PgRepo,
}

impl Repositories {
    pub async fn new(cfg: &Config) -> Result<Self> {
        Ok(Self {
            db: crate::repo::pg::PgRepo::connect(cfg).await?,
        })
    }
}

pub mod pg;
