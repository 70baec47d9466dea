use std::path::PathBuf;
use thiserror::Error;

/// Errors that stop a run or reject its configuration.
///
/// Per-file failures during hashing and deletion have their own types
/// (`ExtractError`, `DeleteError`) because they never abort a run.
/// We use `anyhow` at the top level for CLI error handling, but these
/// typed errors let callers tell fatal input apart from recoverable noise.
#[derive(Debug, Error)]
pub enum PruneError {
    /// Target directory does not exist
    #[error("Path does not exist: '{}'", path.display())]
    RootNotFound { path: PathBuf },

    /// Target path exists but is not a directory
    #[error("Not a directory: '{}'", path.display())]
    NotADirectory { path: PathBuf },

    /// An option value outside its closed set of variants
    #[error("Unsupported {option} '{value}' (expected one of: {expected})")]
    UnsupportedOption {
        option: &'static str,
        value: String,
        expected: &'static str,
    },

    /// Hash width must be at least 2 bits per side
    #[error("Invalid hash size {0}: must be between 2 and 64")]
    InvalidHashSize(u32),

    /// File system operation failed outside of per-file work
    #[error("I/O error at '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl PruneError {
    /// True for errors raised before any scanning happens.
    pub fn is_fatal_input(&self) -> bool {
        matches!(
            self,
            PruneError::RootNotFound { .. }
                | PruneError::NotADirectory { .. }
                | PruneError::InvalidHashSize(_)
        )
    }
}
