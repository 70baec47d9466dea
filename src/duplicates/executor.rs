//! Removal of planned duplicates.
//!
//! This is the only stage with an irreversible side effect. Every path is
//! attempted independently: a failure is logged, recorded and skipped, and
//! the rest of the batch still runs.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{error, info};

use super::resolver::DeletionPlan;

/// How planned deletions are carried out
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteMode {
    /// Log what would be deleted without touching the filesystem
    DryRun,
    /// Permanent removal, no undo
    Delete,
}

impl DeleteMode {
    pub fn from_dry_run(dry_run: bool) -> Self {
        if dry_run {
            DeleteMode::DryRun
        } else {
            DeleteMode::Delete
        }
    }

    pub fn is_dry_run(&self) -> bool {
        *self == DeleteMode::DryRun
    }
}

impl fmt::Display for DeleteMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeleteMode::DryRun => write!(f, "dry_run"),
            DeleteMode::Delete => write!(f, "delete"),
        }
    }
}

/// Why a single path could not be removed
#[derive(Debug, Error)]
pub enum DeleteError {
    /// Already gone (deleted or moved since the scan)
    #[error("file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("permission denied: {}", .0.display())]
    PermissionDenied(PathBuf),

    /// Any other I/O failure, e.g. a locked file or a directory in its place
    #[error("I/O error for {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl DeleteError {
    fn from_io(path: &Path, source: io::Error) -> Self {
        match source.kind() {
            io::ErrorKind::NotFound => DeleteError::NotFound(path.to_path_buf()),
            io::ErrorKind::PermissionDenied => DeleteError::PermissionDenied(path.to_path_buf()),
            _ => DeleteError::Io {
                path: path.to_path_buf(),
                source,
            },
        }
    }

    pub fn path(&self) -> &Path {
        match self {
            DeleteError::NotFound(p) | DeleteError::PermissionDenied(p) => p,
            DeleteError::Io { path, .. } => path,
        }
    }
}

/// Outcome of executing a batch
#[derive(Debug, Default)]
pub struct DeletionReport {
    /// Paths handed to the executor
    pub attempted: usize,
    /// Paths actually removed (always empty in dry-run)
    pub removed: Vec<PathBuf>,
    /// Paths a dry run would have removed
    pub would_remove: Vec<PathBuf>,
    /// Bytes freed, or that would be freed in dry-run
    pub bytes_freed: u64,
    pub failures: Vec<DeleteError>,
}

impl DeletionReport {
    /// Number of files actually removed
    pub fn removed_count(&self) -> usize {
        self.removed.len()
    }

    pub fn failure_count(&self) -> usize {
        self.failures.len()
    }
}

/// Gate in front of destructive execution.
///
/// Prompting belongs to the caller; the core only asks whether the plan is
/// approved.
pub trait Confirmation {
    fn confirm(&self, plan: &DeletionPlan) -> bool;
}

/// Plan approved in advance (e.g. `--yes`, or a UI that already asked)
#[derive(Debug, Clone, Copy, Default)]
pub struct PreConfirmed;

impl Confirmation for PreConfirmed {
    fn confirm(&self, _plan: &DeletionPlan) -> bool {
        true
    }
}

/// Execute removal of `paths` in order
pub fn execute<'a, I>(paths: I, mode: DeleteMode) -> DeletionReport
where
    I: IntoIterator<Item = &'a Path>,
{
    let mut report = DeletionReport::default();

    if mode.is_dry_run() {
        info!("Dry run enabled. No files will be deleted.");
    }

    for path in paths {
        report.attempted += 1;
        let size = std::fs::symlink_metadata(path).map(|m| m.len()).unwrap_or(0);

        match mode {
            DeleteMode::DryRun => {
                info!("Would delete: {}", path.display());
                report.would_remove.push(path.to_path_buf());
                report.bytes_freed += size;
            }
            DeleteMode::Delete => match std::fs::remove_file(path) {
                Ok(()) => {
                    info!("Deleted file: {}", path.display());
                    report.removed.push(path.to_path_buf());
                    report.bytes_freed += size;
                }
                Err(e) => {
                    let err = DeleteError::from_io(path, e);
                    error!("Error deleting {}: {}", path.display(), err);
                    report.failures.push(err);
                }
            },
        }
    }

    report
}

/// Execute a whole plan once `confirmation` approves it.
///
/// Dry runs never ask. Returns `None` when the plan is declined, in which
/// case nothing was touched.
pub fn execute_confirmed(
    plan: &DeletionPlan,
    mode: DeleteMode,
    confirmation: &dyn Confirmation,
) -> Option<DeletionReport> {
    if mode == DeleteMode::Delete && !plan.is_empty() && !confirmation.confirm(plan) {
        info!("Deletion cancelled by user.");
        return None;
    }
    Some(execute(plan.paths_to_delete(), mode))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::duplicates::resolver::ResolvedGroup;
    use tempfile::TempDir;

    struct Decline;

    impl Confirmation for Decline {
        fn confirm(&self, _plan: &DeletionPlan) -> bool {
            false
        }
    }

    fn plan_for(keep: &Path, remove: &[PathBuf]) -> DeletionPlan {
        DeletionPlan {
            groups: vec![ResolvedGroup {
                keep: keep.to_path_buf(),
                remove: remove.to_vec(),
                reason: "test".to_string(),
            }],
        }
    }

    #[test]
    fn test_missing_file_is_classified() {
        let dir = TempDir::new().unwrap();
        let gone = dir.path().join("gone.png");
        let report = execute([gone.as_path()], DeleteMode::Delete);
        assert_eq!(report.removed_count(), 0);
        assert!(matches!(report.failures[0], DeleteError::NotFound(_)));
        assert_eq!(report.failures[0].path(), gone.as_path());
    }

    #[test]
    fn test_failure_does_not_stop_batch() {
        let dir = TempDir::new().unwrap();
        let gone = dir.path().join("gone.png");
        let real = dir.path().join("real.png");
        std::fs::write(&real, b"12345").unwrap();

        let report = execute([gone.as_path(), real.as_path()], DeleteMode::Delete);
        assert_eq!(report.attempted, 2);
        assert_eq!(report.failure_count(), 1);
        assert_eq!(report.removed, vec![real.clone()]);
        assert_eq!(report.bytes_freed, 5);
        assert!(!real.exists());
    }

    #[test]
    fn test_dry_run_measures_without_removing() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("a.png");
        std::fs::write(&file, b"abc").unwrap();

        let report = execute([file.as_path()], DeleteMode::DryRun);
        assert_eq!(report.removed_count(), 0);
        assert_eq!(report.would_remove, vec![file.clone()]);
        assert_eq!(report.bytes_freed, 3);
        assert!(file.exists());
    }

    #[test]
    fn test_declined_plan_touches_nothing() {
        let dir = TempDir::new().unwrap();
        let keep = dir.path().join("a.png");
        let dup = dir.path().join("b.png");
        std::fs::write(&keep, b"x").unwrap();
        std::fs::write(&dup, b"x").unwrap();

        let plan = plan_for(&keep, &[dup.clone()]);
        assert!(execute_confirmed(&plan, DeleteMode::Delete, &Decline).is_none());
        assert!(dup.exists());

        // dry runs skip the gate entirely
        let report = execute_confirmed(&plan, DeleteMode::DryRun, &Decline).unwrap();
        assert_eq!(report.would_remove, vec![dup.clone()]);
        assert!(dup.exists());

        let report = execute_confirmed(&plan, DeleteMode::Delete, &PreConfirmed).unwrap();
        assert_eq!(report.removed, vec![dup.clone()]);
        assert!(!dup.exists());
        assert!(keep.exists());
    }
}
