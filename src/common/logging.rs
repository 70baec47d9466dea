//! Tracing setup for the binary.
//!
//! Library code only emits `tracing` events. The binary decides where they
//! go: a console layer on stderr, plus an optional debug-level file layer
//! so every per-file decision of a run survives in `log.txt`.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

/// Name of the log file written inside the log directory
pub const LOG_FILE_NAME: &str = "log.txt";

/// Where (if anywhere) to mirror the event stream on disk
#[derive(Debug, Clone, PartialEq)]
pub enum LogFile {
    Disabled,
    /// Write `log.txt` inside this directory
    InDir(PathBuf),
}

/// Console verbosity derived from `--verbose` / `--quiet`
pub fn console_level(verbose: bool, quiet: bool) -> LevelFilter {
    if quiet {
        LevelFilter::ERROR
    } else if verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    }
}

/// Install the global subscriber.
///
/// `RUST_LOG` overrides the console level. The returned guard flushes the
/// file writer on drop and must be held for the life of the process.
pub fn init(verbose: bool, quiet: bool, log_file: &LogFile) -> Result<Option<WorkerGuard>> {
    let console_filter = EnvFilter::builder()
        .with_default_directive(console_level(verbose, quiet).into())
        .from_env_lossy();

    let console = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .with_filter(console_filter);

    match log_file {
        LogFile::Disabled => {
            tracing_subscriber::registry().with(console).init();
            Ok(None)
        }
        LogFile::InDir(dir) => {
            ensure_dir(dir)?;
            let appender = tracing_appender::rolling::never(dir, LOG_FILE_NAME);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let file = fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_filter(LevelFilter::DEBUG);
            tracing_subscriber::registry().with(console).with(file).init();
            Ok(Some(guard))
        }
    }
}

fn ensure_dir(dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create log directory: {}", dir.display()))
}
