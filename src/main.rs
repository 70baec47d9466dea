use std::io::Write;
use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use colored::Colorize;
use tracing_appender::non_blocking::WorkerGuard;

use picprune::cli::args::{Cli, Commands, CompletionShell, ConfigAction, DedupArgs, OutputFormat};
use picprune::cli::output;
use picprune::common::config::{self, Config};
use picprune::common::format;
use picprune::common::logging::{self, LogFile};
use picprune::duplicates::{
    self, parse_option, Confirmation, DedupConfig, DeleteMode, DeletionPlan, HashMethod,
    PreConfirmed, RetentionStrategy,
};

fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.no_color {
        colored::control::set_override(false);
    }

    match &cli.command {
        Commands::Scan { opts, detailed } => {
            let config = Config::load()?;
            let _guard = init_logging(&cli, Some(&config))?;
            let format = output_format(&cli, &config);
            cmd_scan(&cli, &config, format, opts, *detailed)
        }

        Commands::Clean { opts, dry_run, yes } => {
            let config = Config::load()?;
            let _guard = init_logging(&cli, Some(&config))?;
            let format = output_format(&cli, &config);
            cmd_clean(&cli, &config, format, opts, *dry_run, *yes)
        }

        // config.toml may be the broken thing being repaired, so it is not loaded here
        Commands::Config { action } => {
            let _guard = init_logging(&cli, None)?;
            cmd_config(action)
        }

        Commands::Completions { shell } => {
            use clap::CommandFactory;
            let mut cmd = Cli::command();
            let shell = match shell {
                CompletionShell::Bash => clap_complete::Shell::Bash,
                CompletionShell::Zsh => clap_complete::Shell::Zsh,
                CompletionShell::Fish => clap_complete::Shell::Fish,
            };
            clap_complete::generate(shell, &mut cmd, "picprune", &mut std::io::stdout());
            Ok(())
        }
    }
}

/// Console logging always; the file log only for runs that scan, when enabled
fn init_logging(cli: &Cli, config: Option<&Config>) -> Result<Option<WorkerGuard>> {
    let log_file = match config {
        Some(config) if !cli.no_log_file && config.log_to_file => {
            LogFile::InDir(cli.log_dir.clone().unwrap_or_else(Config::logs_dir))
        }
        _ => LogFile::Disabled,
    };
    logging::init(cli.verbose, cli.quiet, &log_file)
}

/// `--format` wins over the configured preference
fn output_format(cli: &Cli, config: &Config) -> OutputFormat {
    cli.format.unwrap_or(match config.output_format {
        config::OutputFormat::Human => OutputFormat::Human,
        config::OutputFormat::Json => OutputFormat::Json,
        config::OutputFormat::Quiet => OutputFormat::Quiet,
    })
}

/// Merge CLI flags over config file values
fn build_config(
    cli: &Cli,
    config: &Config,
    format: OutputFormat,
    opts: &DedupArgs,
    mode: DeleteMode,
) -> Result<DedupConfig> {
    let strategy = parse_option(
        opts.strategy.as_deref().unwrap_or(&config.strategy),
        opts.strict,
        RetentionStrategy::parse_lenient,
    )?;
    let hash_method = parse_option(
        opts.method.as_deref().unwrap_or(&config.hash_method),
        opts.strict,
        HashMethod::parse_lenient,
    )?;

    Ok(DedupConfig {
        root: expand_home(&opts.path),
        threshold: opts.threshold.unwrap_or(config.threshold),
        strategy,
        hash_method,
        hash_size: opts.hash_size.unwrap_or(config.hash_size),
        copy_marker: opts
            .copy_marker
            .clone()
            .unwrap_or_else(|| config.copy_marker.clone()),
        mode,
        show_progress: !cli.quiet && format == OutputFormat::Human,
    })
}

fn expand_home(path: &str) -> PathBuf {
    if path == "~" || path.starts_with("~/") {
        let home = dirs::home_dir().unwrap_or_default();
        home.join(path.trim_start_matches('~').trim_start_matches('/'))
    } else {
        PathBuf::from(path)
    }
}

// ─── Scan ─────────────────────────────────────────────────────────────────────

fn cmd_scan(
    cli: &Cli,
    config: &Config,
    format: OutputFormat,
    opts: &DedupArgs,
    detailed: bool,
) -> Result<()> {
    let dedup = build_config(cli, config, format, opts, DeleteMode::DryRun)?;
    duplicates::validate_root(&dedup.root)?;

    if dedup.show_progress {
        println!();
        println!(
            "  {} Scanning for duplicates in: {}",
            "🔍",
            format::format_path(&dedup.root).cyan()
        );
    }

    let summary = duplicates::run(&dedup, &PreConfirmed)?;

    match format {
        OutputFormat::Human => output::print_groups(&summary, detailed),
        OutputFormat::Json => output::print_json(&summary),
        OutputFormat::Quiet => output::print_quiet(&summary),
    }

    Ok(())
}

// ─── Clean ────────────────────────────────────────────────────────────────────

/// Asks on stdin before any file is removed
struct Prompt;

impl Confirmation for Prompt {
    fn confirm(&self, plan: &DeletionPlan) -> bool {
        print!(
            "\n  {} PERMANENTLY DELETE {}? [y/N] ",
            "❓",
            format::format_count(plan.len(), "file")
        );
        if std::io::stdout().flush().is_err() {
            return false;
        }

        let mut input = String::new();
        if std::io::stdin().read_line(&mut input).is_err() {
            return false;
        }
        let answer = input.trim();
        answer.eq_ignore_ascii_case("y") || answer.eq_ignore_ascii_case("yes")
    }
}

fn cmd_clean(
    cli: &Cli,
    config: &Config,
    format: OutputFormat,
    opts: &DedupArgs,
    dry_run: bool,
    yes: bool,
) -> Result<()> {
    let dedup = build_config(cli, config, format, opts, DeleteMode::from_dry_run(dry_run))?;
    duplicates::validate_root(&dedup.root)?;

    if dedup.show_progress {
        println!();
        println!(
            "  {} Cleaning duplicates in: {} (strategy: {})",
            "🧹",
            format::format_path(&dedup.root).cyan(),
            dedup.strategy
        );
    }

    let summary = if yes {
        duplicates::run(&dedup, &PreConfirmed)?
    } else {
        duplicates::run(&dedup, &Prompt)?
    };

    match format {
        OutputFormat::Human => {
            output::print_groups(&summary, true);
            output::print_clean_report(&summary);
        }
        OutputFormat::Json => output::print_json(&summary),
        OutputFormat::Quiet => output::print_quiet(&summary),
    }

    Ok(())
}

// ─── Config ───────────────────────────────────────────────────────────────────

fn cmd_config(action: &ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Init => {
            Config::init_dirs()?;
            Config::default().save()?;
            println!("  {} picprune initialized at ~/.picprune", "✓".green());
            println!("  Created: config.toml, logs/");
            Ok(())
        }
        ConfigAction::Show => {
            let config = Config::load()?;
            println!("{}", toml::to_string_pretty(&config)?);
            Ok(())
        }
        ConfigAction::Reset => {
            Config::default().save()?;
            println!("  {} Configuration reset to defaults", "✓".green());
            Ok(())
        }
        ConfigAction::Set { key, value } => {
            let mut config = Config::load()?;
            config.set(key, value)?;
            config.save()?;
            println!("  {} Set {} = {}", "✓".green(), key, value);
            Ok(())
        }
        ConfigAction::Path => {
            println!("{}", Config::config_path().display());
            Ok(())
        }
    }
}
