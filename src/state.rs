use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};
use std::sync::Arc;

use crate::config::AppConfig;
use crate::ingest::IngestQueue;

#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub config: Arc<AppConfig>,
    pub ingest: IngestQueue,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);

        let db = PgPoolOptions::new()
            .max_connections(10)
            .connect(&config.database.url())
            .await
            .context("connect to database")?;

        tokio::fs::create_dir_all(&config.upload.dir)
            .await
            .context("create upload directory")?;

        let ingest = IngestQueue::start(db.clone(), &config.ingest);

        Ok(Self { db, config, ingest })
    }
}
