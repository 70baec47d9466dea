use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// picprune: find and prune exact and near-duplicate images
#[derive(Parser, Debug)]
#[command(
    name = "picprune",
    version,
    about = "Find exact and near-duplicate images and prune all but one per group",
    long_about = "picprune hashes every image under a directory with a perceptual hash,\n\
                  groups hashes within a Hamming distance threshold, keeps one file per\n\
                  group and deletes the rest. Dry-run first; deletion is permanent.",
    after_help = "EXAMPLES:\n  \
        picprune scan ~/Pictures                         List duplicate groups\n  \
        picprune scan ~/Pictures --threshold 0           Exact perceptual matches only\n  \
        picprune clean ~/Pictures --dry-run              Show what would be deleted\n  \
        picprune clean ~/Pictures --strategy keep_smallest --yes\n  \
        picprune config set threshold 5                  Change the default threshold"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output format
    #[arg(long, global = true, value_enum)]
    pub format: Option<OutputFormat>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Verbose output
    #[arg(long, short, global = true)]
    pub verbose: bool,

    /// Quiet mode, errors only
    #[arg(long, short, global = true)]
    pub quiet: bool,

    /// Write the debug log here instead of ~/.picprune/logs
    #[arg(long, global = true, value_name = "DIR", env = "PICPRUNE_LOG_DIR")]
    pub log_dir: Option<PathBuf>,

    /// Do not write a log file
    #[arg(long, global = true, conflicts_with = "log_dir")]
    pub no_log_file: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Find duplicate groups without deleting anything
    Scan {
        #[command(flatten)]
        opts: DedupArgs,

        /// Show kept and marked paths for every group
        #[arg(long)]
        detailed: bool,
    },

    /// Delete all but one image in every duplicate group
    Clean {
        #[command(flatten)]
        opts: DedupArgs,

        /// Only log what would be deleted
        #[arg(long)]
        dry_run: bool,

        /// Skip confirmation prompt
        #[arg(long, short = 'y')]
        yes: bool,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: CompletionShell,
    },
}

/// Options shared by `scan` and `clean`; unset values come from config.toml
#[derive(Args, Debug, Clone)]
pub struct DedupArgs {
    /// Directory to scan for duplicate images
    pub path: String,

    /// Maximum Hamming distance for two images to count as duplicates
    #[arg(long, short)]
    pub threshold: Option<u32>,

    /// Which file to keep: keep_first or keep_smallest
    #[arg(long, short)]
    pub strategy: Option<String>,

    /// Hash method: phash, ahash or dhash
    #[arg(long, short)]
    pub method: Option<String>,

    /// Hash grid side length (hash is SIZE x SIZE bits)
    #[arg(long, value_name = "SIZE")]
    pub hash_size: Option<u32>,

    /// Filename marker that identifies copies for keep_first
    #[arg(long, value_name = "TEXT")]
    pub copy_marker: Option<String>,

    /// Reject unknown strategy or method values instead of falling back
    #[arg(long)]
    pub strict: bool,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Reset to default configuration
    Reset,

    /// Set a configuration value
    Set {
        /// Configuration key
        key: String,
        /// Configuration value
        value: String,
    },

    /// Print the config file location
    Path,

    /// Initialize picprune directories and default config
    Init,
}

#[derive(Debug, Clone, Copy, PartialEq, ValueEnum)]
pub enum OutputFormat {
    Human,
    Json,
    Quiet,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum CompletionShell {
    Bash,
    Zsh,
    Fish,
}
