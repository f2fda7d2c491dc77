use std::sync::Arc;

use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::{
    auth::repo::{AuthStore, PgStore},
    config::AppConfig,
    notify::{LogMailer, Mailer},
};

#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub config: Arc<AppConfig>,
    pub store: Arc<dyn AuthStore>,
    pub mailer: Arc<dyn Mailer>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);

        let db = PgPoolOptions::new()
            .max_connections(10)
            .connect(&config.database_url)
            .await
            .context("connect to database")?;

        let store = Arc::new(PgStore::new(db.clone())) as Arc<dyn AuthStore>;
        let mailer = Arc::new(LogMailer) as Arc<dyn Mailer>;

        Ok(Self {
            db,
            config,
            store,
            mailer,
        })
    }

    pub fn from_parts(
        db: PgPool,
        config: Arc<AppConfig>,
        store: Arc<dyn AuthStore>,
        mailer: Arc<dyn Mailer>,
    ) -> Self {
        Self {
            db,
            config,
            store,
            mailer,
        }
    }
}
