//! Summary statistics over a finished (or interrupted) record stream

use crate::io::records::RecordSet;
use crate::models::{EntryKind, EntryRecord, Timestamp};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

/// Number of extensions listed in a report.
pub const EXTENSION_LIMIT: usize = 15;

#[derive(Debug, Clone, Serialize)]
pub struct ReportEntry {
    pub path: String,
    pub size_bytes: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExtensionStats {
    pub extension: String,
    pub count: u64,
    pub total_bytes: u64,
    pub average_bytes: u64,
}

/// Files grouped by the month they were created in (`YYYY-MM`).
#[derive(Debug, Clone, Serialize)]
pub struct MonthStats {
    pub month: String,
    pub count: u64,
    pub total_bytes: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct DiskReport {
    pub root: Option<String>,
    /// Size of the root directory row, or the sum of file rows if the root row is missing.
    pub total_bytes: u64,
    pub file_count: u64,
    pub dir_count: u64,
    pub average_file_bytes: u64,
    pub max_file_bytes: u64,
    pub top_files: Vec<ReportEntry>,
    pub top_dirs: Vec<ReportEntry>,
    pub extensions: Vec<ExtensionStats>,
    /// Oldest month first; empty unless the stream carries creation times.
    pub creation_months: Vec<MonthStats>,
    pub malformed_rows: u64,
}

/// Sort by size (largest first, ties by path) and keep the first `top_k`.
#[must_use]
pub fn sort_and_limit<'a, I>(records: I, top_k: usize) -> Vec<ReportEntry>
where
    I: Iterator<Item = &'a EntryRecord>,
{
    let mut entries: Vec<ReportEntry> = records
        .map(|r| ReportEntry {
            path: r.full_path(),
            size_bytes: r.size,
        })
        .collect();

    entries.sort_by(|a, b| {
        b.size_bytes
            .cmp(&a.size_bytes)
            .then_with(|| a.path.cmp(&b.path))
    });
    entries.truncate(top_k);
    entries
}

/// Build a report over the rows of one record stream.
#[must_use]
pub fn build_report(set: &RecordSet, top_k: usize) -> DiskReport {
    let files = || set.records.iter().filter(|r| r.kind == EntryKind::File);
    let dirs = || set.records.iter().filter(|r| r.kind == EntryKind::Directory);

    let file_count = files().count() as u64;
    let dir_count = dirs().count() as u64;
    let file_bytes = files().fold(0u64, |total, r| total.saturating_add(r.size));
    let max_file_bytes = files().map(|r| r.size).max().unwrap_or(0);
    let average_file_bytes = file_bytes.checked_div(file_count).unwrap_or(0);

    let root = set.records.iter().find(|r| r.is_root());
    let total_bytes = root.map_or(file_bytes, |r| r.size);

    let mut by_extension: HashMap<&str, (u64, u64)> = HashMap::new();
    for record in files() {
        let ext = record.extension.as_deref().unwrap_or_default();
        let slot = by_extension.entry(ext).or_insert((0, 0));
        slot.0 += 1;
        slot.1 = slot.1.saturating_add(record.size);
    }

    let mut extensions: Vec<ExtensionStats> = by_extension
        .into_iter()
        .map(|(extension, (count, total_bytes))| ExtensionStats {
            extension: extension.to_string(),
            count,
            total_bytes,
            average_bytes: total_bytes / count,
        })
        .collect();
    extensions.sort_by(|a, b| {
        b.total_bytes
            .cmp(&a.total_bytes)
            .then_with(|| a.extension.cmp(&b.extension))
    });
    extensions.truncate(EXTENSION_LIMIT);

    let mut by_month: BTreeMap<String, (u64, u64)> = BTreeMap::new();
    for record in files() {
        if let Some(Timestamp::At(at)) = record.created {
            let slot = by_month.entry(at.format("%Y-%m").to_string()).or_insert((0, 0));
            slot.0 += 1;
            slot.1 = slot.1.saturating_add(record.size);
        }
    }
    let creation_months = by_month
        .into_iter()
        .map(|(month, (count, total_bytes))| MonthStats {
            month,
            count,
            total_bytes,
        })
        .collect();

    DiskReport {
        root: root.map(|r| r.name.clone()),
        total_bytes,
        file_count,
        dir_count,
        average_file_bytes,
        max_file_bytes,
        top_files: sort_and_limit(files(), top_k),
        top_dirs: sort_and_limit(dirs(), top_k),
        extensions,
        creation_months,
        malformed_rows: set.malformed_rows,
    }
}
