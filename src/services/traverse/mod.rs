//! Post-order traversal engine.
//!
//! Each directory is listed once, its subdirectories are walked to completion,
//! its direct files are sized, and only then is the directory's own record
//! emitted with the cumulative size pulled from the [`DirectoryAggregator`].
//! Invariants enforced here:
//!
//! - A directory's size includes every byte below it, whether or not the
//!   corresponding file rows were kept by the size filter.
//! - Every record is emitted before the record of its parent directory.
//! - A failure on one entry is logged once and never unwinds the walk.

pub mod progress;

use crate::ScanOptions;
use crate::models::{EntryKind, EntryRecord, ErrorItem, FailureKind, ScanStats};
use crate::services::aggregate::DirectoryAggregator;
use crate::services::error_log::ErrorLog;
use crate::services::filter::{extract_extension, extract_timestamps, should_keep};
use crate::services::sink::{RecordSink, RowCounts, SinkError};
use progress::ProgressReporter;
use std::ffi::OsString;
use std::fs::{self, FileType};
use std::io;
use std::path::{Path, PathBuf};

/// Normalize path for cross-platform storage
/// On Windows: Convert backslashes to forward slashes for consistency
/// On Unix: Use path as-is (backslash is a valid filename character)
#[cfg(windows)]
#[must_use]
pub fn normalize_path(path: &Path) -> String {
    let path_str = path.to_string_lossy();
    if path_str.contains('\\') {
        path_str.replace('\\', "/")
    } else {
        path_str.into_owned()
    }
}

#[cfg(not(windows))]
#[must_use]
pub fn normalize_path(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

/// Result of one completed walk.
#[derive(Debug, Clone)]
pub struct ScanOutcome {
    pub root_size: u64,
    pub stats: ScanStats,
    /// Most directories the aggregator tracked at once (the deepest open chain).
    pub peak_open_dirs: usize,
}

struct Child {
    name: OsString,
    path: PathBuf,
    file_type: FileType,
}

/// Drives one scan over borrowed sinks. Construct, then [`Scanner::run`].
pub struct Scanner<'a> {
    options: &'a ScanOptions,
    sink: &'a mut dyn RecordSink,
    error_log: &'a mut ErrorLog,
    aggregator: DirectoryAggregator,
    reporter: ProgressReporter,
    stats: ScanStats,
}

impl<'a> Scanner<'a> {
    #[must_use]
    pub fn new(
        options: &'a ScanOptions,
        sink: &'a mut dyn RecordSink,
        error_log: &'a mut ErrorLog,
    ) -> Self {
        let reporter = ProgressReporter::new(
            options.progress_every_files,
            options.progress_every_dirs,
            options.progress_notifier.clone(),
        );

        Self {
            options,
            sink,
            error_log,
            aggregator: DirectoryAggregator::new(),
            reporter,
            stats: ScanStats::default(),
        }
    }

    /// Walk the tree below `root`, which the caller has already validated.
    pub fn run(mut self, root: &Path) -> ScanOutcome {
        log::info!(
            "Scanning {} (threshold: {} bytes, schema: {})",
            root.display(),
            self.options.min_size_bytes,
            self.options.schema
        );

        let root_size = self.visit_directory(root, None).unwrap_or(0);

        if let Err(err) = self.sink.flush() {
            let root_str = normalize_path(root);
            let lost = err.lost_rows(None);
            self.write_error(&root_str, "Failed to flush records at end of scan", &err, lost);
        }

        self.reporter.finish(&self.stats);

        log::info!(
            "Scan finished: {} dirs, {} files ({} written, {} skipped), {} scan errors, {} write errors",
            self.stats.dirs_seen,
            self.stats.files_seen,
            self.stats.files_written,
            self.stats.files_skipped,
            self.stats.scan_errors,
            self.stats.write_errors
        );

        ScanOutcome {
            root_size,
            stats: self.stats,
            peak_open_dirs: self.aggregator.peak_len(),
        }
    }

    /// Walk one directory to completion and emit its record.
    ///
    /// Returns `None` when the directory cannot be listed; it then contributes
    /// nothing to its parent and has no record.
    fn visit_directory(&mut self, dir: &Path, parent: Option<&str>) -> Option<u64> {
        let children = match self.list_children(dir) {
            Ok(children) => children,
            Err(err) => {
                self.scan_error(dir, "Cannot list directory", &err);
                return None;
            }
        };

        self.aggregator.open(dir);
        let dir_str = normalize_path(dir);

        let (subdirs, others): (Vec<Child>, Vec<Child>) =
            children.into_iter().partition(|c| c.file_type.is_dir());

        for sub in &subdirs {
            if let Some(size) = self.visit_directory(&sub.path, Some(&dir_str)) {
                self.aggregator.record_child_size(dir, size);
            }
        }

        for child in &others {
            if child.file_type.is_file() {
                let size = self.process_file(&dir_str, child);
                self.aggregator.record_child_size(dir, size);
            } else if child.file_type.is_symlink() {
                log::debug!("Skipping symlink: {}", child.path.display());
            } else {
                log::debug!("Skipping special file: {}", child.path.display());
            }
        }

        let total = self.aggregator.finalize_and_size(dir);

        let record = match parent {
            Some(parent) => EntryRecord::directory(parent.to_string(), child_name(dir), total),
            None => EntryRecord::directory(String::new(), dir_str.clone(), total),
        };

        log::debug!(
            "Directory entry: {dir_str} (size: {total}, entries: {})",
            subdirs.len() + others.len()
        );

        self.stats.dirs_seen += 1;
        self.emit(&record);
        self.reporter.on_directory(&self.stats);

        Some(total)
    }

    /// List direct children sorted by name. The directory handle is closed on return.
    fn list_children(&mut self, dir: &Path) -> io::Result<Vec<Child>> {
        let mut children = Vec::new();

        for entry in fs::read_dir(dir)? {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    self.scan_error(dir, "Cannot read directory entry", &e);
                    continue;
                }
            };

            let path = entry.path();
            match entry.file_type() {
                Ok(file_type) => children.push(Child {
                    name: entry.file_name(),
                    path,
                    file_type,
                }),
                Err(e) => self.scan_error(&path, "Cannot determine entry type", &e),
            }
        }

        children.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(children)
    }

    /// Size one file, emit its record if kept, and return its contribution.
    fn process_file(&mut self, dir_str: &str, child: &Child) -> u64 {
        let metadata = match fs::symlink_metadata(&child.path) {
            Ok(m) => m,
            Err(err) => {
                self.scan_error(&child.path, "Cannot read file metadata", &err);
                return 0;
            }
        };

        let size = metadata.len();
        self.stats.files_seen += 1;
        self.stats.bytes_seen = self.stats.bytes_seen.saturating_add(size);

        if should_keep(size, self.options.min_size_bytes) {
            let name = child.name.to_string_lossy().into_owned();
            let extension = extract_extension(&name);

            let (created, modified) = if self.options.schema.includes_timestamps() {
                let stamps = extract_timestamps(&metadata);
                for (what, err) in &stamps.failures {
                    self.scan_error(&child.path, &format!("Cannot read {what}"), err);
                }
                (Some(stamps.created), Some(stamps.modified))
            } else {
                (None, None)
            };

            let record = EntryRecord {
                path: dir_str.to_string(),
                name,
                kind: EntryKind::File,
                size,
                extension: Some(extension),
                created,
                modified,
            };

            log::trace!("File entry: {} (size: {size})", child.path.display());
            self.emit(&record);
        } else {
            self.stats.files_skipped += 1;
            log::trace!("Below threshold: {} (size: {size})", child.path.display());
        }

        self.reporter.on_file(&self.stats);
        size
    }

    /// Hand a record to the sink. It counts as written until a failure reports it lost.
    fn emit(&mut self, record: &EntryRecord) {
        match record.kind {
            EntryKind::File => self.stats.files_written += 1,
            EntryKind::Directory => self.stats.dirs_written += 1,
        }

        if let Err(err) = self.sink.write_row(record) {
            let lost = err.lost_rows(Some(record.kind));
            let path = record.full_path();
            self.write_error(&path, &format!("Failed to write record {path}"), &err, lost);
        }
    }

    /// One failed sink operation; `lost` rows were already counted as written.
    fn write_error(&mut self, path: &str, message: &str, err: &SinkError, lost: RowCounts) {
        self.stats.write_errors += 1;
        self.stats.files_written = self.stats.files_written.saturating_sub(lost.files);
        self.stats.dirs_written = self.stats.dirs_written.saturating_sub(lost.dirs);

        let item = ErrorItem {
            kind: FailureKind::Write,
            path: path.to_string(),
            code: "WRITE".to_string(),
            message: err.to_string(),
        };
        log::warn!("{message}: {err}");

        self.sink.record_error(&item);
        self.error_log.log_error(FailureKind::Write, message, Some(err));
    }

    fn scan_error(&mut self, path: &Path, what: &str, err: &io::Error) {
        self.stats.scan_errors += 1;

        let path_str = normalize_path(path);
        let item = ErrorItem::from_io(FailureKind::Scan, &path_str, err);
        log::debug!("{what}: {path_str} ({}: {err})", item.code);

        self.sink.record_error(&item);
        self.error_log
            .log_error(FailureKind::Scan, &format!("{what}: {path_str}"), Some(err));
    }
}

fn child_name(path: &Path) -> String {
    path.file_name()
        .map_or_else(|| normalize_path(path), |n| n.to_string_lossy().into_owned())
}
