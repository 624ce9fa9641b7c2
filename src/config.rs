use std::path::PathBuf;

use anyhow::Context;

use crate::mirror::CsvStrategy;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub admin_token: String,
    pub csv_path: PathBuf,
    pub csv_strategy: CsvStrategy,
    pub host: String,
    pub port: u16,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the config from any key/value source; `from_env` passes the
    /// process environment.
    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let admin_token = get("ADMIN_TOKEN").context("ADMIN_TOKEN must be set")?;
        anyhow::ensure!(!admin_token.is_empty(), "ADMIN_TOKEN must not be empty");

        let database_url = get("DATABASE_URL").unwrap_or_else(|| "sqlite://users.db".into());
        let csv_path = get("CSV_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("users_backup.csv"));
        let csv_strategy = match get("CSV_STRATEGY") {
            Some(v) => v.parse::<CsvStrategy>()?,
            None => CsvStrategy::default(),
        };

        let host = get("APP_HOST").unwrap_or_else(|| "0.0.0.0".into());
        // Hosting platforms hand out PORT; APP_PORT is the local override.
        let port = get("PORT")
            .or_else(|| get("APP_PORT"))
            .map(|v| v.parse::<u16>().with_context(|| format!("invalid port {v:?}")))
            .transpose()?
            .unwrap_or(5000);

        Ok(Self {
            database_url,
            admin_token,
            csv_path,
            csv_strategy,
            host,
            port,
        })
    }

    /// File name sent in the download's Content-Disposition header.
    pub fn csv_file_name(&self) -> String {
        self.csv_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "users_backup.csv".into())
    }
}
