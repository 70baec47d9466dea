use std::path::PathBuf;
use std::str::FromStr;

use tracing::info;

use super::executor::{self, Confirmation, DeleteMode, DeletionReport};
use super::grouper::{self, DuplicateGroup};
use super::perceptual::{self, ExtractError, HashMethod, DEFAULT_HASH_SIZE};
use super::resolver::{self, CopyHeuristic, DeletionPlan, MarkerHeuristic, RetentionStrategy};
use crate::common::errors::PruneError;

/// Configuration for one pipeline run
#[derive(Debug, Clone)]
pub struct DedupConfig {
    /// Root directory to scan
    pub root: PathBuf,
    /// Maximum Hamming distance for near-duplicates (0 = exact only)
    pub threshold: u32,
    pub strategy: RetentionStrategy,
    pub hash_method: HashMethod,
    /// Hash grid side length
    pub hash_size: u32,
    /// Filename marker used by keep_first
    pub copy_marker: String,
    pub mode: DeleteMode,
    /// Show progress bars
    pub show_progress: bool,
}

impl DedupConfig {
    /// Defaults for everything but the root; dry-run unless told otherwise
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            threshold: 10,
            strategy: RetentionStrategy::default(),
            hash_method: HashMethod::default(),
            hash_size: DEFAULT_HASH_SIZE,
            copy_marker: MarkerHeuristic::default().marker().to_string(),
            mode: DeleteMode::DryRun,
            show_progress: false,
        }
    }
}

/// Parse a closed-set option.
///
/// In strict mode an unknown value is an error; otherwise `lenient` decides
/// the fallback and logs the warning, which is what older configs rely on.
pub fn parse_option<T>(value: &str, strict: bool, lenient: fn(&str) -> T) -> Result<T, PruneError>
where
    T: FromStr<Err = PruneError>,
{
    if strict {
        value.parse::<T>()
    } else {
        Ok(lenient(value))
    }
}

/// Complete results from a run
#[derive(Debug)]
pub struct RunSummary {
    pub root: PathBuf,
    pub mode: DeleteMode,
    pub strategy: RetentionStrategy,
    pub hash_method: HashMethod,
    pub threshold: u32,
    /// Candidate image files found
    pub files_scanned: usize,
    /// Files successfully hashed
    pub files_hashed: usize,
    pub distinct_hashes: usize,
    pub groups: Vec<DuplicateGroup>,
    pub plan: DeletionPlan,
    /// `None` when the deletion was declined at the confirmation gate
    pub report: Option<DeletionReport>,
    pub extract_errors: Vec<ExtractError>,
    pub duration_secs: f64,
}

impl RunSummary {
    pub fn groups_found(&self) -> usize {
        self.groups.len()
    }

    /// Files the plan marks for deletion
    pub fn files_marked(&self) -> usize {
        self.plan.len()
    }

    /// Files actually removed from disk
    pub fn files_removed(&self) -> usize {
        self.report.as_ref().map(|r| r.removed_count()).unwrap_or(0)
    }

    pub fn files_skipped(&self) -> usize {
        self.extract_errors.len()
    }

    pub fn cancelled(&self) -> bool {
        self.report.is_none()
    }
}

/// Run the full pipeline with the marker heuristic from `config`
pub fn run(config: &DedupConfig, confirmation: &dyn Confirmation) -> Result<RunSummary, PruneError> {
    let heuristic = MarkerHeuristic::new(&config.copy_marker);
    run_with(config, &heuristic, confirmation)
}

/// Run the full pipeline: extract → group → plan → execute.
///
/// Fails only on invalid input, before anything is scanned. Every per-file
/// problem is logged and reported in the summary instead.
pub fn run_with(
    config: &DedupConfig,
    heuristic: &dyn CopyHeuristic,
    confirmation: &dyn Confirmation,
) -> Result<RunSummary, PruneError> {
    let start = std::time::Instant::now();
    perceptual::validate_root(&config.root)?;

    info!(
        "Scanning '{}' with threshold {} and strategy '{}'...",
        config.root.display(),
        config.threshold,
        config.strategy
    );

    let outcome = perceptual::extract_hashes(
        &config.root,
        config.hash_method,
        config.hash_size,
        config.show_progress,
    )?;
    let files_hashed = outcome.index.file_count();
    let distinct_hashes = outcome.index.len();

    let groups = grouper::group_duplicates(outcome.index, config.threshold);
    info!("Found {} duplicate groups.", groups.len());

    let plan = resolver::build_plan(&groups, config.strategy, heuristic);
    for resolved in &plan.groups {
        info!("Kept: {}", resolved.keep.display());
        for path in &resolved.remove {
            info!("  Marked for deletion: {}", path.display());
        }
    }

    let report = executor::execute_confirmed(&plan, config.mode, confirmation);
    if let Some(ref report) = report {
        match config.mode {
            DeleteMode::DryRun => info!(
                "Dry run complete: {} files would be deleted.",
                report.would_remove.len()
            ),
            DeleteMode::Delete => info!(
                "Successfully deleted {} files ({} failed).",
                report.removed_count(),
                report.failure_count()
            ),
        }
    }

    Ok(RunSummary {
        root: config.root.clone(),
        mode: config.mode,
        strategy: config.strategy,
        hash_method: config.hash_method,
        threshold: config.threshold,
        files_scanned: outcome.files_scanned,
        files_hashed,
        distinct_hashes,
        groups,
        plan,
        report,
        extract_errors: outcome.errors,
        duration_secs: start.elapsed().as_secs_f64(),
    })
}
