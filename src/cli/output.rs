use colored::*;

use crate::common::format::{format_count, format_duration, format_path, format_relative, format_size};
use crate::duplicates::{DeleteMode, RunSummary};

/// Print duplicate groups and the plan for each
pub fn print_groups(summary: &RunSummary, detailed: bool) {
    println!();
    println!("  {} picprune Duplicate Scan", "👯");
    println!("{}", "─".repeat(60).dimmed());
    println!(
        "  Scanned {} in {} ({} {} hashes, threshold {})",
        format_count(summary.files_scanned, "image").cyan(),
        format_duration(summary.duration_secs).cyan(),
        summary.distinct_hashes,
        summary.hash_method,
        summary.threshold,
    );
    if summary.files_skipped() > 0 {
        println!(
            "  {} {} could not be read",
            "⚠".yellow(),
            format_count(summary.files_skipped(), "file")
        );
    }
    println!("{}", "─".repeat(60).dimmed());
    println!();

    if summary.groups.is_empty() {
        println!("  {} No duplicates found!", "✨");
        println!();
        return;
    }

    for (i, (group, resolved)) in summary.groups.iter().zip(&summary.plan.groups).enumerate() {
        let kind = if group.is_exact() {
            "exact".red().to_string()
        } else {
            format!("similar, ≤{} bits", group.max_distance).yellow().to_string()
        };
        println!(
            "    Group {} — {} ({})",
            (i + 1).to_string().bold(),
            format_count(group.len(), "file"),
            kind,
        );

        if detailed {
            println!(
                "      {} {}",
                "keep →".dimmed(),
                format_relative(&resolved.keep, &summary.root).green()
            );
            for path in &resolved.remove {
                println!(
                    "      {} {}",
                    "  del →".dimmed(),
                    format_relative(path, &summary.root).dimmed()
                );
            }
            println!();
        }
    }

    if !detailed {
        println!();
        println!("      Run with {} to see file paths", "--detailed".cyan());
    }
    println!();
    print_totals(summary);
}

/// Print the outcome of a clean run
pub fn print_clean_report(summary: &RunSummary) {
    println!();
    match (&summary.report, summary.mode) {
        (None, _) => {
            println!("  {} Cancelled — no files were changed", "✗".red());
        }
        (Some(report), DeleteMode::DryRun) => {
            println!(
                "  {} Dry run — would delete {} ({}). No files modified.",
                "ℹ️",
                format_count(report.would_remove.len(), "file"),
                format_size(report.bytes_freed)
            );
        }
        (Some(report), DeleteMode::Delete) => {
            println!(
                "  {} Deleted {} ({} freed)",
                "✓".green(),
                format_count(report.removed_count(), "file").bold(),
                format_size(report.bytes_freed)
            );
            if !report.failures.is_empty() {
                println!(
                    "  {} {} could not be deleted:",
                    "⚠".yellow(),
                    format_count(report.failure_count(), "file")
                );
                for failure in &report.failures {
                    println!("    {} {}", "•".red(), failure);
                }
            }
        }
    }
    print_totals(summary);
}

fn print_totals(summary: &RunSummary) {
    println!(
        "  {} found, {} marked for deletion, {} removed",
        format_count(summary.groups_found(), "group"),
        format_count(summary.files_marked(), "file"),
        summary.files_removed(),
    );
    println!("  Root: {}", format_path(&summary.root).dimmed());
    println!();
}

/// One line: groups, marked, removed
pub fn print_quiet(summary: &RunSummary) {
    println!(
        "{}  {}  {}",
        summary.groups_found(),
        summary.files_marked(),
        summary.files_removed()
    );
}

pub fn summary_json(summary: &RunSummary) -> serde_json::Value {
    let groups: Vec<serde_json::Value> = summary
        .groups
        .iter()
        .zip(&summary.plan.groups)
        .map(|(group, resolved)| {
            serde_json::json!({
                "anchor_hash": group.anchor.to_hex(),
                "max_distance": group.max_distance,
                "paths": group.paths.iter().map(|p| p.display().to_string()).collect::<Vec<_>>(),
                "kept": resolved.keep.display().to_string(),
                "reason": resolved.reason,
                "to_delete": resolved.remove.iter().map(|p| p.display().to_string()).collect::<Vec<_>>(),
            })
        })
        .collect();

    let (removed, failures, bytes_freed) = match &summary.report {
        Some(r) => (
            r.removed.iter().map(|p| p.display().to_string()).collect(),
            r.failures.iter().map(|e| e.to_string()).collect(),
            r.bytes_freed,
        ),
        None => (Vec::<String>::new(), Vec::<String>::new(), 0),
    };

    serde_json::json!({
        "root": summary.root.display().to_string(),
        "mode": summary.mode.to_string(),
        "strategy": summary.strategy.to_string(),
        "hash_method": summary.hash_method.to_string(),
        "threshold": summary.threshold,
        "files_scanned": summary.files_scanned,
        "files_hashed": summary.files_hashed,
        "distinct_hashes": summary.distinct_hashes,
        "duration_secs": summary.duration_secs,
        "groups_found": summary.groups_found(),
        "files_marked": summary.files_marked(),
        "files_removed": summary.files_removed(),
        "bytes_freed": bytes_freed,
        "cancelled": summary.cancelled(),
        "groups": groups,
        "removed": removed,
        "delete_errors": failures,
        "scan_errors": summary.extract_errors.iter().map(|e| e.to_string()).collect::<Vec<_>>(),
    })
}

pub fn print_json(summary: &RunSummary) {
    match serde_json::to_string_pretty(&summary_json(summary)) {
        Ok(s) => println!("{}", s),
        Err(e) => eprintln!("Error serializing: {}", e),
    }
}
