use std::sync::Arc;

use crate::config::AppConfig;
use crate::db;
use crate::users::{MemoryUserRepo, PgUserRepo, UserRepo};

#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<dyn UserRepo>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);

        let repo = match &config.database_url {
            Some(url) => {
                let pool = db::connect(url, &config).await?;
                db::ensure_schema(&pool).await?;
                Arc::new(PgUserRepo::new(pool)) as Arc<dyn UserRepo>
            }
            None => {
                tracing::warn!("DATABASE_URL not set; using in-memory user store");
                Arc::new(MemoryUserRepo::new()) as Arc<dyn UserRepo>
            }
        };

        Ok(Self { repo, config })
    }

    pub fn from_parts(repo: Arc<dyn UserRepo>, config: Arc<AppConfig>) -> Self {
        Self { repo, config }
    }

    pub fn in_memory() -> Self {
        Self::from_parts(
            Arc::new(MemoryUserRepo::new()),
            Arc::new(AppConfig::for_tests()),
        )
    }
}
