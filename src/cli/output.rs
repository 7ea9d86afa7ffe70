//! Output formatting for CLI

use crate::Summary;
use crate::models::ProgressSnapshot;
use crate::services::format::format_size;
use crate::services::report::{DiskReport, ReportEntry};
use std::fmt::Write;

const RULE: &str =
    "================================================================================";

/// One-line progress message for stderr.
#[must_use]
pub fn format_progress(snapshot: &ProgressSnapshot) -> String {
    #[allow(clippy::cast_precision_loss)]
    let elapsed_secs = snapshot.elapsed_ms as f64 / 1000.0;
    let rate_suffix = snapshot
        .files_per_sec
        .map(|rate| format!(", ~{rate} files/s"))
        .unwrap_or_default();

    format!(
        "[{elapsed_secs:6.1}s] {} dirs, {} files ({} processed), scan errors: {}, write errors: {}{rate_suffix}",
        snapshot.dirs_seen,
        snapshot.files_seen,
        format_size(snapshot.bytes_seen),
        snapshot.scan_errors,
        snapshot.write_errors,
    )
}

/// Closing summary of a scan, quantifying everything that was not written.
#[must_use]
pub fn format_scan_summary(summary: &Summary, output: &str, error_log: &str) -> String {
    let stats = &summary.stats;
    let elapsed = summary
        .finished_at
        .duration_since(summary.started_at)
        .unwrap_or_default();

    let mut out = String::new();
    let _ = writeln!(out, "Scan completed in {:.1}s", elapsed.as_secs_f64());
    let _ = writeln!(
        out,
        "Total: {} directories, {} files ({})",
        stats.dirs_seen,
        stats.files_seen,
        format_size(summary.root_size)
    );
    let _ = writeln!(
        out,
        "Written: {} files, {} directories; skipped below threshold: {}",
        stats.files_written, stats.dirs_written, stats.files_skipped
    );
    let _ = writeln!(out, "Scan errors: {}", stats.scan_errors);
    let _ = writeln!(
        out,
        "Write errors: {} ({} rows lost)",
        stats.write_errors, summary.rows_lost
    );
    let _ = writeln!(out, "Results saved to: {output}");
    let _ = write!(out, "Errors logged to: {error_log}");
    out
}

fn write_entries(out: &mut String, entries: &[ReportEntry]) {
    for (i, entry) in entries.iter().enumerate() {
        let _ = writeln!(
            out,
            "{}. {} - {}",
            i + 1,
            entry.path,
            format_size(entry.size_bytes)
        );
    }
}

/// Plain-text disk report.
#[must_use]
pub fn format_text(report: &DiskReport) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "{RULE}");
    let _ = writeln!(out, "DISK USAGE REPORT");
    if let Some(root) = &report.root {
        let _ = writeln!(out, "Root: {root}");
    }
    let _ = writeln!(out, "{RULE}");
    let _ = writeln!(out);

    let _ = writeln!(out, "Total scanned size: {}", format_size(report.total_bytes));
    let _ = writeln!(out, "Files: {}", report.file_count);
    let _ = writeln!(out, "Directories: {}", report.dir_count);
    let _ = writeln!(
        out,
        "Average file size: {}",
        format_size(report.average_file_bytes)
    );
    let _ = writeln!(out, "Largest file: {}", format_size(report.max_file_bytes));
    if report.malformed_rows > 0 {
        let _ = writeln!(out, "Malformed rows skipped: {}", report.malformed_rows);
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "{RULE}");
    let _ = writeln!(out, "TOP {} FILES BY SIZE", report.top_files.len());
    let _ = writeln!(out, "{RULE}");
    write_entries(&mut out, &report.top_files);

    let _ = writeln!(out);
    let _ = writeln!(out, "{RULE}");
    let _ = writeln!(out, "TOP {} DIRECTORIES BY SIZE", report.top_dirs.len());
    let _ = writeln!(out, "{RULE}");
    write_entries(&mut out, &report.top_dirs);

    let _ = writeln!(out);
    let _ = writeln!(out, "{RULE}");
    let _ = writeln!(out, "FILE TYPES");
    let _ = writeln!(out, "{RULE}");
    let _ = writeln!(out, "{:<20} {:>10} {:>14} {:>14}", "extension", "count", "total", "average");
    for ext in &report.extensions {
        let _ = writeln!(
            out,
            "{:<20} {:>10} {:>14} {:>14}",
            ext.extension,
            ext.count,
            format_size(ext.total_bytes),
            format_size(ext.average_bytes)
        );
    }

    if !report.creation_months.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "{RULE}");
        let _ = writeln!(out, "SIZE BY CREATION MONTH");
        let _ = writeln!(out, "{RULE}");
        for month in &report.creation_months {
            let _ = writeln!(
                out,
                "{:<10} {:>10} {:>14}",
                month.month,
                month.count,
                format_size(month.total_bytes)
            );
        }
    }

    out
}

/// Machine-readable disk report.
#[must_use]
pub fn format_json(report: &DiskReport) -> String {
    serde_json::to_string_pretty(report).unwrap_or_else(|_| "{}".to_string())
}
