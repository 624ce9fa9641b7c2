//! Pulls the CSV export from a running signup service into a local file.
//!
//! The local copy is only replaced after a complete 2xx body has been
//! received and written to a sibling temp file, so any failure leaves the
//! previous backup untouched.

use std::{
    io::Write,
    path::{Path, PathBuf},
    time::Duration,
};

use reqwest::{Client, StatusCode, Url};
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::debug;

use crate::mirror::parent_dir;

#[derive(Debug, Error)]
pub enum BackupError {
    #[error("invalid service url: {0}")]
    InvalidUrl(String),
    #[error("HTTP error: {0}")]
    Status(StatusCode),
    #[error("connection error: {0}")]
    Connect(#[source] reqwest::Error),
    #[error("timeout error: server took too long to respond")]
    Timeout(#[source] reqwest::Error),
    #[error("unexpected error: {0}")]
    Other(#[source] reqwest::Error),
    #[error("could not write backup to {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl From<reqwest::Error> for BackupError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            BackupError::Timeout(e)
        } else if e.is_connect() {
            BackupError::Connect(e)
        } else {
            BackupError::Other(e)
        }
    }
}

#[derive(Debug, Clone)]
pub struct BackupConfig {
    pub base_url: Url,
    pub token: String,
    pub dest: PathBuf,
    pub timeout: Duration,
}

pub struct BackupPuller {
    client: Client,
    url: Url,
    dest: PathBuf,
}

impl BackupPuller {
    pub fn new(cfg: BackupConfig) -> Result<Self, BackupError> {
        let url = download_url(&cfg.base_url, &cfg.token)?;
        let client = Client::builder().timeout(cfg.timeout).build()?;
        Ok(Self {
            client,
            url,
            dest: cfg.dest,
        })
    }

    pub fn dest(&self) -> &Path {
        &self.dest
    }

    /// Fetch the export and replace the destination file. Returns the number
    /// of bytes written.
    pub async fn pull(&self) -> Result<usize, BackupError> {
        debug!(host = ?self.url.host_str(), "requesting csv export");
        let response = self.client.get(self.url.clone()).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(BackupError::Status(status));
        }
        let body = response.bytes().await?;

        let dest = self.dest.clone();
        let len = body.len();
        tokio::task::spawn_blocking(move || replace_file(&dest, &body))
            .await
            .map_err(|e| BackupError::Write {
                path: self.dest.clone(),
                source: std::io::Error::other(e),
            })??;
        Ok(len)
    }
}

/// `<base>/download_csv?token=<token>`, keeping any path prefix on `base`.
pub fn download_url(base: &Url, token: &str) -> Result<Url, BackupError> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| BackupError::InvalidUrl(base.to_string()))?
        .pop_if_empty()
        .push("download_csv");
    url.set_query(None);
    url.query_pairs_mut().append_pair("token", token);
    Ok(url)
}

fn replace_file(dest: &Path, body: &[u8]) -> Result<(), BackupError> {
    let write_err = |source| BackupError::Write {
        path: dest.to_path_buf(),
        source,
    };
    let mut tmp = NamedTempFile::new_in(parent_dir(dest)).map_err(write_err)?;
    tmp.write_all(body).map_err(write_err)?;
    tmp.as_file().sync_all().map_err(write_err)?;
    tmp.persist(dest).map_err(|e| write_err(e.error))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{extract::Query, http::StatusCode as AxumStatus, routing::get, Router};
    use std::collections::HashMap;

    const CSV: &str = "id,fullname,email,idnumber,role\r\n1,Ana Cruz,ana@example.com,0222-0282,Student\r\n";

    async fn export(Query(q): Query<HashMap<String, String>>) -> Result<&'static str, AxumStatus> {
        match q.get("token").map(String::as_str) {
            Some("s3cret") => Ok(CSV),
            _ => Err(AxumStatus::FORBIDDEN),
        }
    }

    async fn slow() -> &'static str {
        tokio::time::sleep(Duration::from_secs(5)).await;
        CSV
    }

    async fn spawn_server() -> Url {
        let app = Router::new()
            .route("/download_csv", get(export))
            .route("/slow/download_csv", get(slow));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        Url::parse(&format!("http://{addr}/")).unwrap()
    }

    fn puller(base_url: Url, token: &str, dest: &Path, timeout: Duration) -> BackupPuller {
        BackupPuller::new(BackupConfig {
            base_url,
            token: token.into(),
            dest: dest.to_path_buf(),
            timeout,
        })
        .unwrap()
    }

    #[test]
    fn download_url_appends_route_and_encodes_token() {
        let base = Url::parse("https://signup.example.com").unwrap();
        let url = download_url(&base, "a b&c").unwrap();
        assert_eq!(
            url.as_str(),
            "https://signup.example.com/download_csv?token=a+b%26c"
        );

        let prefixed = Url::parse("https://example.com/forms/").unwrap();
        let url = download_url(&prefixed, "t").unwrap();
        assert_eq!(url.as_str(), "https://example.com/forms/download_csv?token=t");
    }

    #[test]
    fn download_url_rejects_non_hierarchical_base() {
        let base = Url::parse("mailto:admin@example.com").unwrap();
        assert!(matches!(download_url(&base, "t"), Err(BackupError::InvalidUrl(_))));
    }

    #[tokio::test]
    async fn pull_overwrites_destination() {
        let base = spawn_server().await;
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("users_backup.csv");
        std::fs::write(&dest, "old backup that is longer than the new one ....................................................").unwrap();

        let n = puller(base, "s3cret", &dest, Duration::from_secs(10))
            .pull()
            .await
            .unwrap();

        assert_eq!(n, CSV.len());
        assert_eq!(std::fs::read_to_string(&dest).unwrap(), CSV);
    }

    #[tokio::test]
    async fn rejected_token_leaves_previous_backup() {
        let base = spawn_server().await;
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("users_backup.csv");
        std::fs::write(&dest, "previous").unwrap();

        let err = puller(base, "wrong", &dest, Duration::from_secs(10))
            .pull()
            .await
            .unwrap_err();

        assert!(matches!(err, BackupError::Status(s) if s == StatusCode::FORBIDDEN));
        assert!(err.to_string().starts_with("HTTP error: 403"));
        assert_eq!(std::fs::read_to_string(&dest).unwrap(), "previous");
    }

    #[tokio::test]
    async fn unreachable_service_is_a_connection_error() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("users_backup.csv");

        let base = Url::parse(&format!("http://{addr}/")).unwrap();
        let err = puller(base, "s3cret", &dest, Duration::from_secs(10))
            .pull()
            .await
            .unwrap_err();

        assert!(matches!(err, BackupError::Connect(_)), "{err}");
        assert!(!dest.exists());
    }

    #[tokio::test]
    async fn slow_service_times_out() {
        let base = spawn_server().await.join("slow/").unwrap();
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("users_backup.csv");
        std::fs::write(&dest, "previous").unwrap();

        let err = puller(base, "s3cret", &dest, Duration::from_millis(200))
            .pull()
            .await
            .unwrap_err();

        assert!(matches!(err, BackupError::Timeout(_)), "{err}");
        assert_eq!(std::fs::read_to_string(&dest).unwrap(), "previous");
    }

    #[tokio::test]
    async fn unwritable_destination_is_a_write_error() {
        let base = spawn_server().await;
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("no-such-dir").join("users_backup.csv");

        let err = puller(base, "s3cret", &dest, Duration::from_secs(10))
            .pull()
            .await
            .unwrap_err();

        assert!(matches!(err, BackupError::Write { .. }), "{err}");
    }
}
