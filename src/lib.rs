//! Streaming Disk Inventory Library
//!
//! This library walks a directory tree in post-order, computing the size of
//! every file and the cumulative size of every directory, and streams one
//! record per kept entry to a crash-safe CSV sink while logging per-entry
//! failures without aborting the scan.

pub mod cli;
pub mod io;
pub mod models;
pub mod services;

pub use io::config::ScanConfig;
pub use models::{EntryKind, EntryRecord, ErrorItem, FailureKind, RecordSchema, ScanStats};
pub use services::traverse::progress::ProgressNotifier;

use services::error_log::ErrorLog;
use services::sink::csv::CsvSink;
use services::sink::memory::MemorySink;
use services::sink::{RecordSink, SinkFinish};
use services::traverse::Scanner;
use std::fmt;
use std::path::Path;
use std::result;
use std::time::SystemTime;

/// Custom error type for the library
#[derive(Debug)]
pub enum Error {
    Io(std::io::Error),
    InvalidInput(String),
    PartialFailure { completed: u64, failed: u64 },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(e) => write!(f, "I/O error: {e}"),
            Error::InvalidInput(msg) => write!(f, "Invalid input: {msg}"),
            Error::PartialFailure { completed, failed } => {
                write!(f, "Partial failure: {completed} completed, {failed} failed")
            }
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err)
    }
}

pub type Result<T> = result::Result<T, Error>;

/// Runtime options consumed by the traversal engine
#[derive(Clone, Default)]
pub struct ScanOptions {
    /// Files smaller than this are counted and aggregated but not written.
    pub min_size_bytes: u64,
    pub schema: RecordSchema,
    pub progress_every_files: u64,
    pub progress_every_dirs: u64,
    pub progress_notifier: Option<ProgressNotifier>,
}

impl fmt::Debug for ScanOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScanOptions")
            .field("min_size_bytes", &self.min_size_bytes)
            .field("schema", &self.schema)
            .field("progress_every_files", &self.progress_every_files)
            .field("progress_every_dirs", &self.progress_every_dirs)
            .field("progress_notifier", &self.progress_notifier.is_some())
            .finish()
    }
}

/// Summary result from a scan operation
#[derive(Debug)]
pub struct Summary {
    pub root: String,
    pub root_size: u64,
    pub stats: ScanStats,
    /// Records retained by in-memory scans; empty when streaming to a file.
    pub records: Vec<EntryRecord>,
    /// Failures retained by in-memory scans; file-backed scans write them to the error log.
    pub errors: Vec<ErrorItem>,
    pub rows_written: u64,
    pub rows_lost: u64,
    pub error_entries: u64,
    pub peak_open_dirs: usize,
    pub started_at: SystemTime,
    pub finished_at: SystemTime,
}

impl Summary {
    /// `Err(PartialFailure)` when any scan or write error was recorded.
    pub fn ensure_complete(&self) -> Result<()> {
        let failed = self.stats.total_errors();
        if failed == 0 {
            Ok(())
        } else {
            Err(Error::PartialFailure {
                completed: self.stats.files_seen + self.stats.dirs_seen,
                failed,
            })
        }
    }
}

/// Reject a root that is missing, not a directory, or not listable.
pub fn validate_root<P: AsRef<Path>>(root: P) -> Result<()> {
    let root = root.as_ref();
    let root_path = root.to_string_lossy();

    if !root.exists() {
        return Err(Error::InvalidInput(format!(
            "Path does not exist: {root_path}"
        )));
    }

    if !root.is_dir() {
        return Err(Error::InvalidInput(format!(
            "Path is not a directory: {root_path}"
        )));
    }

    std::fs::read_dir(root).map_err(|e| {
        Error::InvalidInput(format!("Path is not readable: {root_path} ({e})"))
    })?;

    Ok(())
}

/// Scan a directory and keep every record in memory
///
/// Intended for tests and library callers with small trees; failures are
/// returned in [`Summary::errors`] instead of being written to a log file.
pub fn scan_summary<P: AsRef<Path>>(root: P, opts: &ScanOptions) -> Result<Summary> {
    validate_root(&root)?;
    let mut error_log = ErrorLog::discard();
    scan_with_sink(root, opts, Box::new(MemorySink::new()), &mut error_log)
}

/// Scan into caller-provided sinks. The root must already be validated.
pub fn scan_with_sink<P: AsRef<Path>>(
    root: P,
    opts: &ScanOptions,
    mut sink: Box<dyn RecordSink>,
    error_log: &mut ErrorLog,
) -> Result<Summary> {
    let root = root.as_ref();
    let started_at = SystemTime::now();

    let mut outcome = Scanner::new(opts, sink.as_mut(), error_log).run(root);

    let finish = match sink.finish() {
        Ok(finish) => finish,
        Err(err) => {
            outcome.stats.write_errors += 1;
            error_log.log_error(
                FailureKind::Write,
                "Failed to close record sink",
                Some(&err),
            );
            SinkFinish::default()
        }
    };

    Ok(Summary {
        root: services::traverse::normalize_path(root),
        root_size: outcome.root_size,
        stats: outcome.stats,
        records: finish.records,
        errors: finish.errors,
        rows_written: finish.rows_written,
        rows_lost: finish.rows_lost,
        error_entries: error_log.entries(),
        peak_open_dirs: outcome.peak_open_dirs,
        started_at,
        finished_at: SystemTime::now(),
    })
}

/// Run a full scan as configured: CSV records to `config.output`, diagnostics to `config.error_log`.
///
/// Configuration and root are validated before either file is opened, so a
/// fatal error leaves nothing behind.
pub fn run_scan(config: &ScanConfig, notifier: Option<ProgressNotifier>) -> Result<Summary> {
    let mut opts = config.scan_options()?;
    opts.progress_notifier = notifier;

    validate_root(&config.root)?;

    let sink = CsvSink::create(&config.output, opts.schema, config.flush_every)?;
    let mut error_log = match ErrorLog::create(&config.error_log, &config.root) {
        Ok(log) => log,
        Err(err) => {
            drop(sink);
            if let Err(rm) = std::fs::remove_file(&config.output) {
                log::warn!("Cannot remove {} after failed start: {rm}", config.output);
            }
            return Err(Error::Io(err));
        }
    };

    log::info!(
        "Writing records to {} and errors to {}",
        config.output,
        config.error_log
    );

    scan_with_sink(&config.root, &opts, Box::new(sink), &mut error_log)
}
