//! Per-request scratch directory
//!
//! Every intermediate file of one request lives in its own temporary directory.
//! Cleanup runs on every exit path of the orchestrator; a file that cannot be
//! removed is logged and counted but never changes the outcome of the request.

use ingress_core::{IngestError, IngestResult};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub struct Scratch {
    dir: TempDir,
    artifacts: Vec<PathBuf>,
}

impl Scratch {
    pub fn create(root: &Path) -> IngestResult<Self> {
        std::fs::create_dir_all(root).map_err(|e| {
            IngestError::soft(format!(
                "Failed to create scratch root {}: {}",
                root.display(),
                e
            ))
        })?;

        let dir = tempfile::Builder::new()
            .prefix("ingress-")
            .tempdir_in(root)
            .map_err(|e| IngestError::soft(format!("Failed to create scratch dir: {}", e)))?;

        Ok(Self {
            dir,
            artifacts: Vec::new(),
        })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Path of a named artifact inside the scratch dir, tracked for cleanup.
    pub fn artifact(&mut self, name: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        self.track(path.clone());
        path
    }

    pub fn track(&mut self, path: PathBuf) {
        if !self.artifacts.contains(&path) {
            self.artifacts.push(path);
        }
    }

    /// Remove every tracked artifact and then the directory itself.
    ///
    /// Returns the number of removals that failed.
    pub fn cleanup(self) -> usize {
        let mut failures = 0;

        for path in &self.artifacts {
            match std::fs::remove_file(path) {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => {
                    failures += 1;
                    tracing::error!(
                        path = %path.display(),
                        error = %e,
                        "Failed to remove scratch file"
                    );
                }
            }
        }

        let dir_path = self.dir.path().to_path_buf();
        if let Err(e) = self.dir.close() {
            failures += 1;
            tracing::error!(
                path = %dir_path.display(),
                error = %e,
                "Failed to remove scratch directory"
            );
        }

        failures
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cleanup_removes_artifacts_and_dir() {
        let root = tempfile::tempdir().unwrap();
        let mut scratch = Scratch::create(root.path()).unwrap();

        let raw = scratch.artifact("abc_cat.png");
        std::fs::write(&raw, b"raw").unwrap();
        let normalized = raw.with_extension("jpeg");
        std::fs::write(&normalized, b"jpeg").unwrap();
        scratch.track(normalized.clone());

        let dir = scratch.path().to_path_buf();
        assert_eq!(scratch.cleanup(), 0);

        assert!(!raw.exists());
        assert!(!normalized.exists());
        assert!(!dir.exists());
        assert_eq!(std::fs::read_dir(root.path()).unwrap().count(), 0);
    }

    #[test]
    fn artifacts_never_written_are_not_failures() {
        let root = tempfile::tempdir().unwrap();
        let mut scratch = Scratch::create(root.path()).unwrap();
        scratch.artifact("never_fetched.jpeg");
        assert_eq!(scratch.cleanup(), 0);
    }

    #[test]
    fn tracking_is_idempotent() {
        let root = tempfile::tempdir().unwrap();
        let mut scratch = Scratch::create(root.path()).unwrap();
        let path = scratch.artifact("a.jpeg");
        scratch.track(path);
        assert_eq!(scratch.artifacts.len(), 1);
    }

    #[test]
    fn concurrent_requests_get_distinct_dirs() {
        let root = tempfile::tempdir().unwrap();
        let a = Scratch::create(root.path()).unwrap();
        let b = Scratch::create(root.path()).unwrap();
        assert_ne!(a.path(), b.path());
    }
}
