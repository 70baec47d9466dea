use std::io::Cursor;
use std::path::{Path, PathBuf};

use image::{ImageFormat, Rgb, RgbImage};
use tempfile::TempDir;

use picprune::common::errors::PruneError;
use picprune::duplicates::{
    self, Confirmation, DedupConfig, DeleteMode, DeletionPlan, HashMethod, PreConfirmed,
    RetentionStrategy,
};

fn gradient() -> RgbImage {
    RgbImage::from_fn(64, 64, |x, y| {
        Rgb([(x * 4) as u8, (y * 4) as u8, ((x + y) * 2) as u8])
    })
}

fn stripes() -> RgbImage {
    RgbImage::from_fn(64, 64, |x, _| {
        if (x / 4) % 2 == 0 {
            Rgb([250, 250, 250])
        } else {
            Rgb([10, 10, 10])
        }
    })
}

fn write_as(path: &Path, img: &RgbImage, format: ImageFormat) {
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, format).unwrap();
    std::fs::write(path, buf.into_inner()).unwrap();
}

fn size(path: &Path) -> u64 {
    std::fs::metadata(path).unwrap().len()
}

fn config(root: &Path, threshold: u32, strategy: RetentionStrategy, mode: DeleteMode) -> DedupConfig {
    DedupConfig {
        threshold,
        strategy,
        mode,
        ..DedupConfig::new(root)
    }
}

fn listing(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().path())
        .collect();
    files.sort();
    files
}

struct Decline;

impl Confirmation for Decline {
    fn confirm(&self, _plan: &DeletionPlan) -> bool {
        false
    }
}

// ─── Scenarios ────────────────────────────────────────────────────────────────

#[test]
fn test_keep_first_keeps_original_over_copy() {
    let dir = TempDir::new().unwrap();
    let original = dir.path().join("a.jpg");
    let copy = dir.path().join("a - copy.jpg");
    gradient().save(&original).unwrap();
    std::fs::copy(&original, &copy).unwrap();

    let cfg = config(dir.path(), 0, RetentionStrategy::KeepFirst, DeleteMode::Delete);
    let summary = duplicates::run(&cfg, &PreConfirmed).unwrap();

    assert_eq!(summary.groups_found(), 1);
    let mut members = summary.groups[0].paths.clone();
    members.sort();
    assert_eq!(members, vec![copy.clone(), original.clone()]);

    assert_eq!(summary.plan.groups[0].keep, original);
    assert_eq!(summary.plan.groups[0].remove, vec![copy.clone()]);
    assert_eq!(summary.files_removed(), 1);
    assert!(original.exists());
    assert!(!copy.exists());
}

#[test]
fn test_keep_smallest_overrides_naming() {
    let dir = TempDir::new().unwrap();
    let original = dir.path().join("a.jpg");
    let copy = dir.path().join("a - copy.jpg");
    // Same pixels; content sniffing decodes BMP and PNG bytes regardless of extension
    write_as(&original, &gradient(), ImageFormat::Bmp);
    write_as(&copy, &gradient(), ImageFormat::Png);
    assert!(size(&copy) < size(&original));

    let cfg = config(dir.path(), 0, RetentionStrategy::KeepSmallest, DeleteMode::DryRun);
    let summary = duplicates::run(&cfg, &PreConfirmed).unwrap();

    assert_eq!(summary.groups_found(), 1);
    assert_eq!(summary.plan.groups[0].keep, copy);
    assert_eq!(summary.plan.groups[0].remove, vec![original]);
}

#[test]
fn test_missing_root_fails_before_scanning() {
    let dir = TempDir::new().unwrap();
    let cfg = config(
        &dir.path().join("nope"),
        10,
        RetentionStrategy::KeepFirst,
        DeleteMode::Delete,
    );
    let err = duplicates::run(&cfg, &PreConfirmed).unwrap_err();
    assert!(matches!(err, PruneError::RootNotFound { .. }));
}

// ─── Properties ──────────────────────────────────────────────────────────────

#[test]
fn test_plan_deletes_n_minus_one_per_group() {
    let dir = TempDir::new().unwrap();
    gradient().save(dir.path().join("g1.png")).unwrap();
    for name in ["g2.png", "g3.png"] {
        std::fs::copy(dir.path().join("g1.png"), dir.path().join(name)).unwrap();
    }
    stripes().save(dir.path().join("s1.png")).unwrap();
    std::fs::copy(dir.path().join("s1.png"), dir.path().join("s2.png")).unwrap();

    let cfg = config(dir.path(), 0, RetentionStrategy::KeepFirst, DeleteMode::DryRun);
    let summary = duplicates::run(&cfg, &PreConfirmed).unwrap();

    assert_eq!(summary.groups_found(), 2);
    for (group, resolved) in summary.groups.iter().zip(&summary.plan.groups) {
        assert_eq!(resolved.remove.len(), group.len() - 1);
        assert!(!resolved.remove.contains(&resolved.keep));
        assert!(group.paths.contains(&resolved.keep));
    }
    assert_eq!(summary.files_marked(), 3);
}

#[test]
fn test_keep_smallest_kept_is_minimum() {
    let dir = TempDir::new().unwrap();
    write_as(&dir.path().join("one.bmp"), &gradient(), ImageFormat::Bmp);
    write_as(&dir.path().join("two.png"), &gradient(), ImageFormat::Png);
    std::fs::copy(dir.path().join("two.png"), dir.path().join("three.png")).unwrap();

    let cfg = config(dir.path(), 0, RetentionStrategy::KeepSmallest, DeleteMode::DryRun);
    let summary = duplicates::run(&cfg, &PreConfirmed).unwrap();

    assert_eq!(summary.groups_found(), 1);
    for resolved in &summary.plan.groups {
        let kept = size(&resolved.keep);
        assert!(resolved.remove.iter().all(|p| size(p) >= kept));
    }
    // the tied PNGs keep walk order, so the first one wins
    assert_eq!(summary.plan.groups[0].keep, dir.path().join("three.png"));
}

#[test]
fn test_keep_first_never_deletes_unmarked_when_marked_exists() {
    let dir = TempDir::new().unwrap();
    gradient().save(dir.path().join("Copy of sunset.png")).unwrap();
    for name in ["sunset (copy).png", "sunset.png", "sunset_edit.png"] {
        std::fs::copy(dir.path().join("Copy of sunset.png"), dir.path().join(name)).unwrap();
    }

    let cfg = config(dir.path(), 0, RetentionStrategy::KeepFirst, DeleteMode::DryRun);
    let summary = duplicates::run(&cfg, &PreConfirmed).unwrap();

    let is_marked = |p: &Path| p.file_name().unwrap().to_string_lossy().to_lowercase().contains("copy");
    let resolved = &summary.plan.groups[0];
    assert!(!is_marked(resolved.keep.as_path()));
    let deleted_unmarked = resolved.remove.iter().filter(|p| !is_marked(p.as_path())).count();
    // one unmarked original is kept, the other unmarked file is still a duplicate
    assert_eq!(deleted_unmarked, 1);
}

#[test]
fn test_dry_run_is_idempotent() {
    let dir = TempDir::new().unwrap();
    gradient().save(dir.path().join("a.png")).unwrap();
    std::fs::copy(dir.path().join("a.png"), dir.path().join("b.png")).unwrap();
    let before = listing(dir.path());

    let cfg = config(dir.path(), 10, RetentionStrategy::KeepFirst, DeleteMode::DryRun);
    let first = duplicates::run(&cfg, &PreConfirmed).unwrap();
    let second = duplicates::run(&cfg, &PreConfirmed).unwrap();

    assert_eq!(first.files_removed(), 0);
    assert_eq!(second.files_removed(), 0);
    assert_eq!(first.files_marked(), second.files_marked());
    assert_eq!(listing(dir.path()), before);
}

#[test]
fn test_declined_confirmation_changes_nothing() {
    let dir = TempDir::new().unwrap();
    gradient().save(dir.path().join("a.png")).unwrap();
    std::fs::copy(dir.path().join("a.png"), dir.path().join("b.png")).unwrap();
    let before = listing(dir.path());

    let cfg = config(dir.path(), 0, RetentionStrategy::KeepFirst, DeleteMode::Delete);
    let summary = duplicates::run(&cfg, &Decline).unwrap();

    assert!(summary.cancelled());
    assert_eq!(summary.files_marked(), 1);
    assert_eq!(summary.files_removed(), 0);
    assert_eq!(listing(dir.path()), before);
}

#[test]
fn test_skipped_files_do_not_stop_the_run() {
    let dir = TempDir::new().unwrap();
    gradient().save(dir.path().join("a.png")).unwrap();
    std::fs::copy(dir.path().join("a.png"), dir.path().join("b.png")).unwrap();
    std::fs::write(dir.path().join("corrupt.jpg"), b"\xff\xd8 truncated").unwrap();

    let cfg = DedupConfig {
        hash_method: HashMethod::Phash,
        ..config(dir.path(), 0, RetentionStrategy::KeepFirst, DeleteMode::Delete)
    };
    let summary = duplicates::run(&cfg, &PreConfirmed).unwrap();

    assert_eq!(summary.files_scanned, 3);
    assert_eq!(summary.files_skipped(), 1);
    assert_eq!(summary.files_removed(), 1);
    assert!(dir.path().join("corrupt.jpg").exists());
}

#[test]
fn test_empty_directory() {
    let dir = TempDir::new().unwrap();
    let cfg = config(dir.path(), 10, RetentionStrategy::KeepFirst, DeleteMode::Delete);
    let summary = duplicates::run(&cfg, &PreConfirmed).unwrap();
    assert_eq!(summary.files_scanned, 0);
    assert_eq!(summary.groups_found(), 0);
    assert_eq!(summary.files_removed(), 0);
}
