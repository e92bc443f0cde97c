//! Snapshot lifecycle: naming, restore-on-start, create-on-cycle, retention.
//!
//! Snapshot names embed a fixed-width timestamp, so lexicographic order is
//! creation order. Restore and create never run concurrently; the supervisor
//! sequences them on a single task.

use std::fs;
use std::io;
use std::path::PathBuf;

use chrono::Local;
use tempfile::{Builder as TempFileBuilder, NamedTempFile};
use thiserror::Error;
use tracing::{info, warn};

use crate::archive;
use crate::remote::{RemoteError, RemoteStore};

pub const SNAPSHOT_PREFIX: &str = "snap_core_";
pub const SNAPSHOT_SUFFIX: &str = ".tar.gz";

/// Most-recent snapshots kept remotely after each create.
pub const RETENTION_LIMIT: usize = 5;

const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

#[derive(Error, Debug)]
pub enum SnapshotError {
    #[error("remote store error: {0}")]
    Remote(#[from] RemoteError),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// What `restore` did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RestoreOutcome {
    /// No snapshot existed remotely; the workspace is left untouched.
    FreshStart,
    /// The named snapshot was extracted over a recreated workspace.
    Restored(String),
}

/// What `create` did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreateOutcome {
    /// The workspace directory does not exist yet; nothing to snapshot.
    Skipped,
    /// The named snapshot was uploaded and `pruned` old snapshots removed.
    Uploaded { name: String, pruned: usize },
}

/// Owns the naming, ordering and retention policy for one workspace against
/// one remote directory.
pub struct SnapshotManager {
    workspace: PathBuf,
}

impl SnapshotManager {
    pub fn new(workspace: PathBuf) -> Self {
        Self { workspace }
    }

    /// Replace the workspace with the contents of the latest remote snapshot.
    ///
    /// The workspace is removed wholesale and recreated before extraction, so
    /// a restored tree is never merged with leftover local state. An empty
    /// remote directory is a fresh start, not an error.
    pub async fn restore(&self, store: &RemoteStore) -> Result<RestoreOutcome, SnapshotError> {
        let mut snapshots = filter_snapshots(store.list().await?);
        snapshots.sort();
        let Some(latest) = snapshots.last() else {
            info!("no snapshot found, fresh start");
            return Ok(RestoreOutcome::FreshStart);
        };

        info!(snapshot = %latest, "restoring latest snapshot");
        // Dropped on every exit path, including extraction failure.
        let staging = NamedTempFile::new()?;
        store.download(latest, staging.path()).await?;

        if self.workspace.exists() {
            fs::remove_dir_all(&self.workspace)?;
        }
        fs::create_dir_all(&self.workspace)?;
        archive::unpack(staging.path(), &self.workspace)?;

        info!(snapshot = %latest, "state restored");
        Ok(RestoreOutcome::Restored(latest.clone()))
    }

    /// Archive the workspace, upload it under a fresh timestamped name, then
    /// prune the remote directory down to [`RETENTION_LIMIT`] snapshots.
    ///
    /// Pruning is per-entry best-effort: a failed delete is logged and the
    /// remaining excess entries are still attempted.
    pub async fn create(&self, store: &RemoteStore) -> Result<CreateOutcome, SnapshotError> {
        if !self.workspace.exists() {
            return Ok(CreateOutcome::Skipped);
        }

        let name = snapshot_name(&Local::now().format(TIMESTAMP_FORMAT).to_string());
        let staging = TempFileBuilder::new().suffix(SNAPSHOT_SUFFIX).tempfile()?;
        archive::pack(&self.workspace, staging.path())?;

        info!(snapshot = %name, "uploading snapshot");
        store.upload(staging.path(), &name).await?;
        drop(staging);

        let mut snapshots = filter_snapshots(store.list().await?);
        snapshots.sort();
        let mut pruned = 0;
        for old in excess_snapshots(&snapshots) {
            match store.delete(old).await {
                Ok(()) => {
                    info!(snapshot = %old, "pruned old snapshot");
                    pruned += 1;
                }
                Err(err) => warn!(snapshot = %old, error = %err, "failed to prune snapshot"),
            }
        }

        Ok(CreateOutcome::Uploaded { name, pruned })
    }
}

pub fn snapshot_name(timestamp: &str) -> String {
    format!("{SNAPSHOT_PREFIX}{timestamp}{SNAPSHOT_SUFFIX}")
}

/// Both the prefix and the suffix must match; the remote directory may hold
/// arbitrary unrelated files.
pub fn is_snapshot_name(name: &str) -> bool {
    name.starts_with(SNAPSHOT_PREFIX) && name.ends_with(SNAPSHOT_SUFFIX)
}

fn filter_snapshots(entries: Vec<String>) -> Vec<String> {
    entries.into_iter().filter(|n| is_snapshot_name(n)).collect()
}

/// Oldest entries beyond the retention window, given an ascending-sorted list.
fn excess_snapshots(sorted: &[String]) -> &[String] {
    let excess = sorted.len().saturating_sub(RETENTION_LIMIT);
    &sorted[..excess]
}
