//! CSV mirror of the `users` table.
//!
//! The table is the source of truth; the CSV only exists for export. Two
//! policies are supported: `append` writes one row per signup, `rewrite`
//! regenerates the whole file from storage and swaps it in atomically.

use std::{
    fs::OpenOptions,
    path::{Path, PathBuf},
    str::FromStr,
};

use anyhow::Context;
use tempfile::NamedTempFile;
use tracing::debug;

use crate::{signup::repo_types::User, state::AppState};

pub const APPEND_HEADER: [&str; 4] = ["fullname", "email", "idnumber", "role"];
pub const REWRITE_HEADER: [&str; 5] = ["id", "fullname", "email", "idnumber", "role"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CsvStrategy {
    Append,
    #[default]
    Rewrite,
}

impl FromStr for CsvStrategy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "append" => Ok(CsvStrategy::Append),
            "rewrite" | "full-rewrite" => Ok(CsvStrategy::Rewrite),
            other => anyhow::bail!("unknown CSV_STRATEGY {other:?}, expected append or rewrite"),
        }
    }
}

/// Bring the CSV file up to date after `user` was committed.
pub async fn sync_after_insert(state: &AppState, user: &User) -> anyhow::Result<()> {
    let _guard = state.csv_lock.lock().await;
    let path = state.config.csv_path.clone();

    match state.config.csv_strategy {
        CsvStrategy::Append => {
            let user = user.clone();
            tokio::task::spawn_blocking(move || append_row(&path, &user))
                .await
                .context("csv append task")??;
        }
        CsvStrategy::Rewrite => {
            let users = User::list_all(&state.db)
                .await
                .context("load users for csv rewrite")?;
            tokio::task::spawn_blocking(move || rewrite_all(&path, &users))
                .await
                .context("csv rewrite task")??;
        }
    }
    Ok(())
}

/// Append one row, writing the header first when the file is new.
pub fn append_row(path: &Path, user: &User) -> anyhow::Result<()> {
    let is_new = !path.exists();
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("open {}", path.display()))?;

    let mut wtr = csv::Writer::from_writer(file);
    if is_new {
        wtr.write_record(APPEND_HEADER)?;
    }
    wtr.write_record([
        user.fullname.as_str(),
        user.email.as_str(),
        user.idnumber.as_str(),
        user.role.as_str(),
    ])?;
    wtr.flush()?;
    debug!(path = %path.display(), user_id = user.id, "csv row appended");
    Ok(())
}

/// Replace the file with a full snapshot of `users`.
pub fn rewrite_all(path: &Path, users: &[User]) -> anyhow::Result<()> {
    let dir = parent_dir(path);
    let mut tmp = NamedTempFile::new_in(&dir)
        .with_context(|| format!("create temp file in {}", dir.display()))?;

    {
        let mut wtr = csv::Writer::from_writer(&mut tmp);
        wtr.write_record(REWRITE_HEADER)?;
        for user in users {
            let id = user.id.to_string();
            wtr.write_record([
                id.as_str(),
                user.fullname.as_str(),
                user.email.as_str(),
                user.idnumber.as_str(),
                user.role.as_str(),
            ])?;
        }
        wtr.flush()?;
    }

    tmp.as_file().sync_all()?;
    tmp.persist(path)
        .with_context(|| format!("replace {}", path.display()))?;
    debug!(path = %path.display(), rows = users.len(), "csv rewritten");
    Ok(())
}

pub(crate) fn parent_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    }
}
