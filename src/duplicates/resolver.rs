use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use tracing::warn;

use super::grouper::DuplicateGroup;
use crate::common::errors::PruneError;

/// Strategy for choosing the one file that survives in a duplicate group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RetentionStrategy {
    /// Keep the first path, after moving anything that looks like a copy
    /// to the back
    #[default]
    KeepFirst,
    /// Keep the smallest file on disk
    KeepSmallest,
}

impl RetentionStrategy {
    pub const EXPECTED: &'static str = "keep_first, keep_smallest";

    pub fn as_str(&self) -> &'static str {
        match self {
            RetentionStrategy::KeepFirst => "keep_first",
            RetentionStrategy::KeepSmallest => "keep_smallest",
        }
    }

    /// Parse, degrading to `KeepFirst` with a warning on unknown input.
    pub fn parse_lenient(value: &str) -> Self {
        value.parse().unwrap_or_else(|e| {
            warn!("{}; using keep_first instead", e);
            RetentionStrategy::KeepFirst
        })
    }
}

impl FromStr for RetentionStrategy {
    type Err = PruneError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "keep_first" => Ok(RetentionStrategy::KeepFirst),
            "keep_smallest" => Ok(RetentionStrategy::KeepSmallest),
            _ => Err(PruneError::UnsupportedOption {
                option: "retention strategy",
                value: s.to_string(),
                expected: Self::EXPECTED,
            }),
        }
    }
}

impl fmt::Display for RetentionStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Decides whether a path looks like a copy of some original.
///
/// `keep_first` only consults this through a stable sort, so any naming
/// convention can be plugged in without touching grouping or deletion.
pub trait CopyHeuristic {
    fn is_copy(&self, path: &Path) -> bool;
}

/// Case-insensitive substring match of a marker against the file name
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerHeuristic {
    marker: String,
}

impl MarkerHeuristic {
    pub fn new(marker: &str) -> Self {
        Self {
            marker: marker.to_lowercase(),
        }
    }

    pub fn marker(&self) -> &str {
        &self.marker
    }
}

impl Default for MarkerHeuristic {
    fn default() -> Self {
        Self::new("copy")
    }
}

impl CopyHeuristic for MarkerHeuristic {
    fn is_copy(&self, path: &Path) -> bool {
        if self.marker.is_empty() {
            return false;
        }
        path.file_name()
            .map(|name| name.to_string_lossy().to_lowercase().contains(&self.marker))
            .unwrap_or(false)
    }
}

impl<F> CopyHeuristic for F
where
    F: Fn(&Path) -> bool,
{
    fn is_copy(&self, path: &Path) -> bool {
        self(path)
    }
}

/// Result of resolving a duplicate group
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedGroup {
    /// The file to keep
    pub keep: PathBuf,
    /// Files to remove, in the order the strategy ranked them
    pub remove: Vec<PathBuf>,
    /// Why this file was kept
    pub reason: String,
}

/// Resolve one group into a kept path and the paths to delete.
///
/// Returns `None` for a group with no paths.
pub fn resolve_group(
    group: &DuplicateGroup,
    strategy: RetentionStrategy,
    heuristic: &dyn CopyHeuristic,
) -> Option<ResolvedGroup> {
    let (ranked, reason) = match strategy {
        RetentionStrategy::KeepFirst => {
            let mut ranked = group.paths.clone();
            ranked.sort_by_key(|p| heuristic.is_copy(p));
            (ranked, "First original in group")
        }
        RetentionStrategy::KeepSmallest => {
            let mut sized: Vec<(PathBuf, u64)> = group
                .paths
                .iter()
                // Unreadable sizes sort last
                .map(|p| (p.clone(), file_size(p).unwrap_or(u64::MAX)))
                .collect();
            // Stable, so ties keep group order
            sized.sort_by_key(|(_, size)| *size);
            (sized.into_iter().map(|(p, _)| p).collect(), "Smallest file")
        }
    };

    let mut ranked = ranked.into_iter();
    let keep = ranked.next()?;
    Some(ResolvedGroup {
        keep,
        remove: ranked.collect(),
        reason: reason.to_string(),
    })
}

fn file_size(path: &Path) -> Option<u64> {
    match std::fs::metadata(path) {
        Ok(meta) => Some(meta.len()),
        Err(e) => {
            warn!("Could not read size of '{}': {}", path.display(), e);
            None
        }
    }
}

/// Kept path and deletions for every group of a run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeletionPlan {
    pub groups: Vec<ResolvedGroup>,
}

impl DeletionPlan {
    /// Paths to delete, in group order
    pub fn paths_to_delete(&self) -> impl Iterator<Item = &Path> {
        self.groups
            .iter()
            .flat_map(|g| g.remove.iter().map(PathBuf::as_path))
    }

    pub fn kept(&self) -> impl Iterator<Item = &Path> {
        self.groups.iter().map(|g| g.keep.as_path())
    }

    /// Number of paths marked for deletion
    pub fn len(&self) -> usize {
        self.groups.iter().map(|g| g.remove.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Resolve every group with the same strategy
pub fn build_plan(
    groups: &[DuplicateGroup],
    strategy: RetentionStrategy,
    heuristic: &dyn CopyHeuristic,
) -> DeletionPlan {
    DeletionPlan {
        groups: groups
            .iter()
            .filter_map(|g| resolve_group(g, strategy, heuristic))
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::duplicates::perceptual::HashBits;

    fn group(paths: &[&str]) -> DuplicateGroup {
        DuplicateGroup {
            anchor: HashBits::from_bytes(&[0]),
            paths: paths.iter().map(PathBuf::from).collect(),
            max_distance: 0,
        }
    }

    #[test]
    fn test_strategy_parse() {
        assert_eq!(
            "keep_smallest".parse::<RetentionStrategy>().unwrap(),
            RetentionStrategy::KeepSmallest
        );
        assert_eq!(
            "Keep-First".parse::<RetentionStrategy>().unwrap(),
            RetentionStrategy::KeepFirst
        );
        assert!("keep_newest".parse::<RetentionStrategy>().is_err());
        assert_eq!(
            RetentionStrategy::parse_lenient("keep_newest"),
            RetentionStrategy::KeepFirst
        );
    }

    #[test]
    fn test_marker_is_case_insensitive_on_file_name() {
        let h = MarkerHeuristic::new("Copy");
        assert!(h.is_copy(Path::new("/x/a - COPY.jpg")));
        assert!(h.is_copy(Path::new("a copy (2).png")));
        assert!(!h.is_copy(Path::new("/copy/a.jpg")));
        assert!(!MarkerHeuristic::new("").is_copy(Path::new("copy.jpg")));
    }

    #[test]
    fn test_keep_first_moves_copies_back() {
        let g = group(&["a - copy.jpg", "a.jpg", "b - Copy.jpg", "c.jpg"]);
        let resolved = resolve_group(&g, RetentionStrategy::KeepFirst, &MarkerHeuristic::default()).unwrap();
        assert_eq!(resolved.keep, PathBuf::from("a.jpg"));
        assert_eq!(
            resolved.remove,
            vec![
                PathBuf::from("c.jpg"),
                PathBuf::from("a - copy.jpg"),
                PathBuf::from("b - Copy.jpg"),
            ]
        );
    }

    #[test]
    fn test_keep_first_accepts_closure_heuristic() {
        let g = group(&["IMG_0001_dup.png", "IMG_0001.png"]);
        let dup_suffix = |p: &Path| p.to_string_lossy().contains("_dup");
        let resolved = resolve_group(&g, RetentionStrategy::KeepFirst, &dup_suffix).unwrap();
        assert_eq!(resolved.keep, PathBuf::from("IMG_0001.png"));
    }

    #[test]
    fn test_empty_group_resolves_to_none() {
        let g = group(&[]);
        for strategy in [RetentionStrategy::KeepFirst, RetentionStrategy::KeepSmallest] {
            assert!(resolve_group(&g, strategy, &MarkerHeuristic::default()).is_none());
        }

        let groups = vec![g, group(&["a.jpg", "b.jpg"])];
        let plan = build_plan(&groups, RetentionStrategy::KeepFirst, &MarkerHeuristic::default());
        assert_eq!(plan.groups.len(), 1);
        assert_eq!(plan.len(), 1);
    }

    #[test]
    fn test_plan_counts() {
        let groups = vec![group(&["a.jpg", "b.jpg", "c.jpg"]), group(&["d.jpg", "e.jpg"])];
        let plan = build_plan(&groups, RetentionStrategy::KeepFirst, &MarkerHeuristic::default());
        assert_eq!(plan.len(), 3);
        assert_eq!(plan.kept().count(), 2);
        assert!(plan.paths_to_delete().all(|p| !plan.kept().any(|k| k == p)));
    }
}
