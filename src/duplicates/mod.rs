pub mod executor;
pub mod grouper;
pub mod perceptual;
pub mod pipeline;
pub mod resolver;

pub use executor::{
    execute, execute_confirmed, Confirmation, DeleteError, DeleteMode, DeletionReport,
    PreConfirmed,
};
pub use grouper::{group_duplicates, DuplicateGroup};
pub use perceptual::{
    extract_hashes, validate_root, ExtractError, ExtractOutcome, HashBits, HashIndex, HashMethod,
    ImageHasher, ImageRecord,
};
pub use pipeline::{parse_option, run, run_with, DedupConfig, RunSummary};
pub use resolver::{
    build_plan, resolve_group, CopyHeuristic, DeletionPlan, MarkerHeuristic, ResolvedGroup,
    RetentionStrategy,
};
