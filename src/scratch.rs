//
// scratch.rs
// Dicom-Convert-rs
//
// Scratch directory for intermediate files: unique path allocation and age-based sweeping of stale entries.
//
// Thales Matheus Mendonça Santos - December 2025

use std::fs;
use std::path::{Component, Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, SystemTime};

use chrono::Utc;
use tracing::debug;
use walkdir::WalkDir;

use crate::error::{ConvertError, Result};

/// Entries older than this are removed by a sweep.
pub const DEFAULT_MAX_AGE: Duration = Duration::from_secs(10 * 60);

#[derive(Debug)]
pub struct ScratchSpace {
    root: PathBuf,
    max_age: Duration,
    counter: AtomicU64,
}

/// What a sweep did. Entries that could not be inspected or removed are only counted.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SweepReport {
    pub removed: Vec<PathBuf>,
    pub skipped: usize,
}

impl ScratchSpace {
    pub fn new(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        // Create the directory eagerly so allocations never race on a missing root.
        fs::create_dir_all(&root).map_err(|source| ConvertError::Scratch {
            path: root.clone(),
            source,
        })?;
        Ok(Self {
            root,
            max_age: DEFAULT_MAX_AGE,
            counter: AtomicU64::new(0),
        })
    }

    pub fn with_max_age(mut self, max_age: Duration) -> Self {
        self.max_age = max_age;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn max_age(&self) -> Duration {
        self.max_age
    }

    /// Reserve a path inside the scratch directory. The file itself is not created.
    ///
    /// Generated names combine a millisecond timestamp, the process id and a per-space
    /// counter, so two allocations from the same space never collide. Explicit names may
    /// contain subdirectories but must stay inside the root.
    pub fn allocate(&self, name: Option<&str>) -> Result<PathBuf> {
        let name = match name {
            Some(name) => {
                let relative = Path::new(name);
                let escapes = relative
                    .components()
                    .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
                if escapes || name.is_empty() {
                    return Err(ConvertError::InvalidConfiguration(format!(
                        "Scratch name {name:?} must be a relative path inside the scratch directory"
                    )));
                }
                relative.to_path_buf()
            }
            None => PathBuf::from(format!(
                "{}-{}-{}",
                Utc::now().timestamp_millis(),
                std::process::id(),
                self.counter.fetch_add(1, Ordering::Relaxed)
            )),
        };

        let path = self.root.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| ConvertError::Scratch {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        Ok(path)
    }

    /// Remove every file whose modification time is older than the configured age.
    pub fn sweep(&self) -> SweepReport {
        self.sweep_at(SystemTime::now())
    }

    /// Same as [`sweep`](Self::sweep) with an explicit notion of "now".
    pub fn sweep_at(&self, now: SystemTime) -> SweepReport {
        let mut report = SweepReport::default();

        for entry in WalkDir::new(&self.root).min_depth(1) {
            let Ok(entry) = entry else {
                report.skipped += 1;
                continue;
            };
            if !entry.file_type().is_file() {
                continue;
            }

            let modified = match entry.metadata().map(|m| m.modified()) {
                Ok(Ok(modified)) => modified,
                _ => {
                    report.skipped += 1;
                    continue;
                }
            };
            // Timestamps in the future count as fresh.
            let age = now.duration_since(modified).unwrap_or(Duration::ZERO);
            if age <= self.max_age {
                continue;
            }

            match fs::remove_file(entry.path()) {
                Ok(()) => {
                    debug!(path = %entry.path().display(), age_secs = age.as_secs(), "Removed stale scratch file");
                    report.removed.push(entry.into_path());
                }
                Err(err) => {
                    debug!(path = %entry.path().display(), error = %err, "Could not remove scratch file");
                    report.skipped += 1;
                }
            }
        }

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::fs::File;
    use tempfile::tempdir;

    fn touch(path: &Path, modified: SystemTime) {
        let file = File::create(path).expect("create file");
        file.set_modified(modified).expect("set mtime");
    }

    #[test]
    fn new_creates_nested_root() {
        let dir = tempdir().expect("tmpdir");
        let root = dir.path().join("a/b/.temp");
        let scratch = ScratchSpace::new(&root).expect("scratch");
        assert!(scratch.root().is_dir());
    }

    #[test]
    fn generated_names_are_unique_and_not_created() {
        let dir = tempdir().expect("tmpdir");
        let scratch = ScratchSpace::new(dir.path()).expect("scratch");

        let paths: HashSet<_> = (0..256).map(|_| scratch.allocate(None).expect("allocate")).collect();
        assert_eq!(paths.len(), 256);
        assert!(paths.iter().all(|p| p.starts_with(dir.path()) && !p.exists()));
    }

    #[test]
    fn named_allocation_creates_parent_directories() {
        let dir = tempdir().expect("tmpdir");
        let scratch = ScratchSpace::new(dir.path()).expect("scratch");

        let path = scratch.allocate(Some("series/1/frame.png")).expect("allocate");
        assert_eq!(path, dir.path().join("series/1/frame.png"));
        assert!(path.parent().expect("parent").is_dir());
        assert!(!path.exists());
    }

    #[test]
    fn named_allocation_cannot_escape_root() {
        let dir = tempdir().expect("tmpdir");
        let scratch = ScratchSpace::new(dir.path().join("scratch")).expect("scratch");

        assert!(scratch.allocate(Some("../escape")).is_err());
        assert!(scratch.allocate(Some("/etc/passwd")).is_err());
        assert!(scratch.allocate(Some("")).is_err());
    }

    #[test]
    fn sweep_removes_only_stale_files() {
        let dir = tempdir().expect("tmpdir");
        let scratch = ScratchSpace::new(dir.path()).expect("scratch");
        let now = SystemTime::now();

        let stale = scratch.allocate(Some("stale")).expect("allocate");
        let fresh = scratch.allocate(Some("fresh")).expect("allocate");
        let nested = scratch.allocate(Some("nested/stale")).expect("allocate");
        touch(&stale, now - Duration::from_secs(11 * 60));
        touch(&fresh, now - Duration::from_secs(9 * 60));
        touch(&nested, now - Duration::from_secs(60 * 60));

        let report = scratch.sweep();
        assert_eq!(report.removed.len(), 2);
        assert!(!stale.exists());
        assert!(!nested.exists());
        assert!(fresh.exists());
        // Directories are left in place.
        assert!(dir.path().join("nested").is_dir());
    }

    #[test]
    fn sweep_honours_custom_age_and_clock() {
        let dir = tempdir().expect("tmpdir");
        let scratch = ScratchSpace::new(dir.path())
            .expect("scratch")
            .with_max_age(Duration::from_secs(5));
        let path = scratch.allocate(None).expect("allocate");
        fs::write(&path, b"pixels").expect("write");

        assert!(scratch.sweep().removed.is_empty());
        let later = SystemTime::now() + Duration::from_secs(6);
        assert_eq!(scratch.sweep_at(later).removed, vec![path]);
    }
}
