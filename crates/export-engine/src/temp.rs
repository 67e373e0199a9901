//! Request-scoped temporary artifact registry.
//!
//! Every ephemeral path created while serving one export request is
//! registered here and deleted exactly once: either early (per-group
//! renders, concat lists) or in the final sweep that runs on both the
//! success and the failure branch. Deletion is best-effort; a failed
//! delete is logged and never escalated.

use std::path::{Path, PathBuf};

use rand::Rng;

/// What a temporary path holds; used only for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    Annotation,
    Render,
    ConcatList,
}

/// Tracked temporary paths for one export request.
///
/// Owned by the request entry point; nothing here is shared across
/// requests, so no locking is needed.
#[derive(Debug, Default)]
pub struct TempArtifacts {
    tracked: Vec<(PathBuf, ArtifactKind)>,
}

impl TempArtifacts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a created path for eventual deletion.
    pub fn register(&mut self, path: impl Into<PathBuf>, kind: ArtifactKind) {
        let path = path.into();
        tracing::debug!(path = %path.display(), ?kind, "Tracking temp artifact");
        self.tracked.push((path, kind));
    }

    pub fn tracked_paths(&self) -> Vec<&Path> {
        self.tracked.iter().map(|(p, _)| p.as_path()).collect()
    }

    /// Delete one tracked path now and drop it from the registry, so
    /// the final sweep has nothing left to do for it.
    pub async fn remove_now(&mut self, path: &Path) {
        if let Some(pos) = self.tracked.iter().position(|(p, _)| p == path) {
            let (path, kind) = self.tracked.remove(pos);
            delete_best_effort(&path, kind).await;
        }
    }

    /// Delete everything still tracked. Runs once per exit path; a
    /// second call finds the registry empty.
    pub async fn sweep(&mut self) -> usize {
        let drained: Vec<_> = self.tracked.drain(..).collect();
        let count = drained.len();
        for (path, kind) in drained {
            delete_best_effort(&path, kind).await;
        }
        count
    }
}

async fn delete_best_effort(path: &Path, kind: ArtifactKind) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => {
            tracing::debug!(path = %path.display(), ?kind, "Deleted temp artifact");
        }
        Err(err) => {
            tracing::warn!(
                path = %path.display(),
                ?kind,
                error = %err,
                "Failed to delete temp artifact"
            );
        }
    }
}

/// A unique path in the OS temp directory. The millisecond timestamp
/// plus random suffix keeps concurrent and repeated exports from
/// colliding without any cross-request lock.
pub fn unique_temp_path(prefix: &str, extension: &str) -> PathBuf {
    let millis = chrono::Utc::now().timestamp_millis();
    let nonce: u32 = rand::thread_rng().gen_range(0..1_000_000);
    std::env::temp_dir().join(format!("{prefix}_{millis}_{nonce:06}.{extension}"))
}
