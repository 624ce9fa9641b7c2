use std::{path::PathBuf, process::ExitCode, time::Duration};

use clap::Parser;
use reqwest::Url;
use signup::{
    backup::{BackupConfig, BackupPuller},
    logging,
};

/// Download the signup CSV export from a running service.
#[derive(Debug, Parser)]
#[command(name = "pull_backup", version)]
struct Args {
    /// Base URL of the signup service, e.g. https://signup.example.com
    #[arg(long, env = "BACKUP_BASE_URL")]
    base_url: Url,

    /// Shared download secret (the service's ADMIN_TOKEN).
    #[arg(long, env = "ADMIN_TOKEN", hide_env_values = true)]
    token: String,

    /// Where to store the CSV; replaced only on success.
    #[arg(long, env = "BACKUP_PATH", default_value = "users_backup.csv")]
    dest: PathBuf,

    #[arg(long, env = "BACKUP_TIMEOUT_SECS", default_value_t = 10)]
    timeout_secs: u64,
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    logging::init_tracing("signup=info,pull_backup=info");
    let args = Args::parse();

    let puller = match BackupPuller::new(BackupConfig {
        base_url: args.base_url,
        token: args.token,
        dest: args.dest,
        timeout: Duration::from_secs(args.timeout_secs),
    }) {
        Ok(p) => p,
        Err(e) => {
            tracing::error!(error = %e, "backup not started");
            return ExitCode::FAILURE;
        }
    };

    match puller.pull().await {
        Ok(bytes) => {
            tracing::info!(path = %puller.dest().display(), bytes, "backup downloaded");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, path = %puller.dest().display(), "backup failed");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dest_and_timeout_have_defaults() {
        let args = Args::try_parse_from([
            "pull_backup",
            "--base-url",
            "https://signup.example.com/",
            "--token",
            "s3cret",
            "--dest",
            "/tmp/users_backup.csv",
        ])
        .unwrap();
        assert_eq!(args.base_url.as_str(), "https://signup.example.com/");
        assert_eq!(args.token, "s3cret");
        assert_eq!(args.dest, PathBuf::from("/tmp/users_backup.csv"));
        assert_eq!(args.timeout_secs, 10);
    }

    #[test]
    fn timeout_can_be_overridden() {
        let args = Args::try_parse_from([
            "pull_backup",
            "--base-url",
            "http://localhost:5000",
            "--token",
            "t",
            "--timeout-secs",
            "3",
        ])
        .unwrap();
        assert_eq!(args.timeout_secs, 3);
    }

    #[test]
    fn malformed_base_url_is_rejected() {
        let err = Args::try_parse_from(["pull_backup", "--base-url", "not a url", "--token", "t"])
            .unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }
}
