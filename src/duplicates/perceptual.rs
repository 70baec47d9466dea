use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use image::{DynamicImage, ImageReader};
use image_hasher::{HashAlg, Hasher, HasherConfig};
use indicatif::{ProgressBar, ProgressStyle};
use thiserror::Error;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::common::errors::PruneError;

/// Image extensions considered for hashing (compared case-insensitively)
pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "bmp"];

/// Default hash grid side length (8x8 = 64-bit hash)
pub const DEFAULT_HASH_SIZE: u32 = 8;

/// Check if a file is a candidate image based on extension
pub fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// Perceptual hashing algorithm
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HashMethod {
    /// DCT-based, most robust to re-encoding
    Phash,
    /// Mean of a downscaled grayscale image
    Ahash,
    /// Horizontal gradient between adjacent pixels
    #[default]
    Dhash,
}

impl HashMethod {
    pub const EXPECTED: &'static str = "phash, ahash, dhash";

    pub fn as_str(&self) -> &'static str {
        match self {
            HashMethod::Phash => "phash",
            HashMethod::Ahash => "ahash",
            HashMethod::Dhash => "dhash",
        }
    }

    /// Parse, degrading to `Phash` with a warning on unknown input.
    pub fn parse_lenient(value: &str) -> Self {
        value.parse().unwrap_or_else(|e| {
            warn!("{}; using phash instead", e);
            HashMethod::Phash
        })
    }

    fn hasher(&self, hash_size: u32) -> Hasher {
        let config = HasherConfig::new().hash_size(hash_size, hash_size);
        let config = match self {
            HashMethod::Phash => config.hash_alg(HashAlg::Median).preproc_dct(),
            HashMethod::Ahash => config.hash_alg(HashAlg::Mean),
            HashMethod::Dhash => config.hash_alg(HashAlg::Gradient),
        };
        config.to_hasher()
    }
}

impl FromStr for HashMethod {
    type Err = PruneError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "phash" => Ok(HashMethod::Phash),
            "ahash" => Ok(HashMethod::Ahash),
            "dhash" => Ok(HashMethod::Dhash),
            _ => Err(PruneError::UnsupportedOption {
                option: "hash method",
                value: s.to_string(),
                expected: Self::EXPECTED,
            }),
        }
    }
}

impl fmt::Display for HashMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fixed-width perceptual hash, compared by equality and Hamming distance
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HashBits(Box<[u8]>);

impl HashBits {
    pub fn from_bytes(bytes: &[u8]) -> Self {
        HashBits(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Width in bits
    pub fn bit_len(&self) -> u32 {
        self.0.len() as u32 * 8
    }

    /// Hamming distance: popcount of the XOR. Bytes present in only one of
    /// the two hashes are compared against zero.
    pub fn distance(&self, other: &HashBits) -> u32 {
        let common: u32 = self
            .0
            .iter()
            .zip(other.0.iter())
            .map(|(a, b)| (a ^ b).count_ones())
            .sum();
        let (longer, shorter) = if self.0.len() >= other.0.len() {
            (&self.0, &other.0)
        } else {
            (&other.0, &self.0)
        };
        let tail: u32 = longer[shorter.len()..].iter().map(|b| b.count_ones()).sum();
        common + tail
    }

    pub fn to_hex(&self) -> String {
        self.0.iter().map(|b| format!("{:02x}", b)).collect()
    }
}

impl fmt::Display for HashBits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// A successfully hashed file
#[derive(Debug, Clone)]
pub struct ImageRecord {
    pub path: PathBuf,
    pub hash: HashBits,
}

/// One exact-hash bucket of the index
#[derive(Debug, Clone)]
pub struct HashBucket {
    pub hash: HashBits,
    pub paths: Vec<PathBuf>,
}

/// Hash value → paths sharing it, in first-seen order of the hash.
///
/// Key order is what the grouper iterates and tie-breaks on, so it is
/// preserved explicitly instead of relying on a map's iteration order.
#[derive(Debug, Clone, Default)]
pub struct HashIndex {
    buckets: Vec<HashBucket>,
    positions: HashMap<HashBits, usize>,
}

impl HashIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, record: ImageRecord) {
        match self.positions.get(&record.hash) {
            Some(&idx) => self.buckets[idx].paths.push(record.path),
            None => {
                self.positions.insert(record.hash.clone(), self.buckets.len());
                self.buckets.push(HashBucket {
                    hash: record.hash,
                    paths: vec![record.path],
                });
            }
        }
    }

    pub fn get(&self, hash: &HashBits) -> Option<&[PathBuf]> {
        self.positions
            .get(hash)
            .map(|&idx| self.buckets[idx].paths.as_slice())
    }

    pub fn buckets(&self) -> &[HashBucket] {
        &self.buckets
    }

    pub fn into_buckets(self) -> Vec<HashBucket> {
        self.buckets
    }

    /// Number of distinct hashes
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Number of indexed files across all buckets
    pub fn file_count(&self) -> usize {
        self.buckets.iter().map(|b| b.paths.len()).sum()
    }
}

impl FromIterator<ImageRecord> for HashIndex {
    fn from_iter<T: IntoIterator<Item = ImageRecord>>(iter: T) -> Self {
        let mut index = HashIndex::new();
        for record in iter {
            index.insert(record);
        }
        index
    }
}

/// A single file that could not be indexed. Never fatal to the scan.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// Opening or sniffing the file failed
    #[error("Could not open '{}': {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The image decoder rejected the file
    #[error("Could not decode '{}': {source}", path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// A directory entry could not be read during the walk
    #[error("Could not read directory entry: {source}")]
    Walk {
        path: Option<PathBuf>,
        #[source]
        source: walkdir::Error,
    },
}

impl ExtractError {
    pub fn path(&self) -> Option<&Path> {
        match self {
            ExtractError::Open { path, .. } | ExtractError::Decode { path, .. } => {
                Some(path.as_path())
            }
            ExtractError::Walk { path, .. } => path.as_deref(),
        }
    }
}

/// Everything the extraction stage produces
#[derive(Debug, Default)]
pub struct ExtractOutcome {
    pub index: HashIndex,
    /// Candidate images found by extension
    pub files_scanned: usize,
    pub errors: Vec<ExtractError>,
}

/// Computes hashes with one method and width
pub struct ImageHasher {
    hasher: Hasher,
    method: HashMethod,
}

impl ImageHasher {
    pub fn new(method: HashMethod, hash_size: u32) -> Result<Self, PruneError> {
        if !(2..=64).contains(&hash_size) {
            return Err(PruneError::InvalidHashSize(hash_size));
        }
        Ok(Self {
            hasher: method.hasher(hash_size),
            method,
        })
    }

    pub fn method(&self) -> HashMethod {
        self.method
    }

    /// Decode one file and hash it. The decoded image is dropped before
    /// returning, whatever the outcome.
    pub fn hash_file(&self, path: &Path) -> Result<HashBits, ExtractError> {
        let reader = ImageReader::open(path)
            .and_then(|r| r.with_guessed_format())
            .map_err(|source| ExtractError::Open {
                path: path.to_path_buf(),
                source,
            })?;
        let img = reader.decode().map_err(|source| ExtractError::Decode {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(self.hash_image(&img))
    }

    /// Hash an already decoded image after normalizing it to RGB
    pub fn hash_image(&self, img: &DynamicImage) -> HashBits {
        let rgb = DynamicImage::ImageRgb8(img.to_rgb8());
        HashBits::from_bytes(self.hasher.hash_image(&rgb).as_bytes())
    }
}

/// Collect candidate images under `root`, in file-name order
pub fn collect_images(root: &Path, errors: &mut Vec<ExtractError>) -> Vec<PathBuf> {
    let mut files = Vec::new();

    for entry in WalkDir::new(root).follow_links(false).sort_by_file_name() {
        match entry {
            Ok(entry) => {
                if entry.file_type().is_file() && is_image(entry.path()) {
                    files.push(entry.into_path());
                }
            }
            Err(source) => {
                let path = source.path().map(Path::to_path_buf);
                let err = ExtractError::Walk { path, source };
                warn!("{}", err);
                errors.push(err);
            }
        }
    }

    files
}

/// Reject a root that is missing or not a directory before any work starts
pub fn validate_root(root: &Path) -> Result<(), PruneError> {
    let meta = std::fs::metadata(root).map_err(|source| match source.kind() {
        std::io::ErrorKind::NotFound => PruneError::RootNotFound {
            path: root.to_path_buf(),
        },
        _ => PruneError::Io {
            path: root.to_path_buf(),
            source,
        },
    })?;
    if !meta.is_dir() {
        return Err(PruneError::NotADirectory {
            path: root.to_path_buf(),
        });
    }
    Ok(())
}

/// Walk `root`, hash every candidate image and build the index.
///
/// Per-file failures are logged and collected in the outcome; only an
/// invalid root or hash size is an error.
pub fn extract_hashes(
    root: &Path,
    method: HashMethod,
    hash_size: u32,
    show_progress: bool,
) -> Result<ExtractOutcome, PruneError> {
    validate_root(root)?;
    let hasher = ImageHasher::new(method, hash_size)?;

    info!("Scanning directory: {}", root.display());
    let mut outcome = ExtractOutcome::default();
    let spinner = make_spinner(show_progress, "Collecting images...");
    let images = collect_images(root, &mut outcome.errors);
    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }
    outcome.files_scanned = images.len();

    let pb = make_progress(show_progress, images.len() as u64);
    for path in images {
        match hasher.hash_file(&path) {
            Ok(hash) => {
                debug!("{} {}", hash, path.display());
                outcome.index.insert(ImageRecord { path, hash });
            }
            Err(e) => {
                warn!("{}", e);
                outcome.errors.push(e);
            }
        }
        if let Some(ref pb) = pb {
            pb.inc(1);
        }
    }
    if let Some(pb) = pb {
        pb.finish_and_clear();
    }

    info!(
        "Scanning complete: {} images, {} distinct {} hashes, {} skipped",
        outcome.files_scanned,
        outcome.index.len(),
        hasher.method(),
        outcome.errors.len()
    );
    Ok(outcome)
}

fn make_spinner(show: bool, msg: &str) -> Option<ProgressBar> {
    if !show {
        return None;
    }
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
        pb.set_style(style);
    }
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb.set_message(msg.to_string());
    Some(pb)
}

fn make_progress(show: bool, total: u64) -> Option<ProgressBar> {
    if !show {
        return None;
    }
    let pb = ProgressBar::new(total);
    if let Ok(style) =
        ProgressStyle::default_bar().template("{spinner:.cyan} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
    {
        pb.set_style(style.progress_chars("━━░"));
    }
    pb.set_message("Hashing images...");
    Some(pb)
}
