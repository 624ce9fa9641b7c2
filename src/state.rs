use crate::config::AppConfig;
use sqlx::SqlitePool;
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub config: Arc<AppConfig>,
    /// Held for the whole read-and-write of a CSV mirror update.
    pub csv_lock: Arc<Mutex<()>>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);
        let db = crate::db::connect(&config.database_url).await?;
        crate::db::init_schema(&db).await?;
        Ok(Self::from_parts(db, config))
    }

    pub fn from_parts(db: SqlitePool, config: Arc<AppConfig>) -> Self {
        Self {
            db,
            config,
            csv_lock: Arc::new(Mutex::new(())),
        }
    }

    /// State backed by a fresh database and CSV path inside `dir`.
    #[cfg(test)]
    pub async fn fake(dir: &std::path::Path, strategy: crate::mirror::CsvStrategy) -> Self {
        let database_url = format!("sqlite://{}", dir.join("users.db").display());
        let db = crate::db::connect(&database_url)
            .await
            .expect("connect test database");
        crate::db::init_schema(&db).await.expect("create schema");

        let config = Arc::new(AppConfig {
            database_url,
            admin_token: "test-token".into(),
            csv_path: dir.join("users_backup.csv"),
            csv_strategy: strategy,
            host: "127.0.0.1".into(),
            port: 0,
        });
        Self::from_parts(db, config)
    }
}
