//! Append-only diagnostic log for non-fatal failures.
//!
//! Every entry is flushed as soon as it is written. Failures of the log itself
//! are counted and reported through `log`, never returned to the scan.

use crate::models::{FailureKind, TIMESTAMP_FORMAT};
use chrono::Local;
use std::error::Error as StdError;
use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

const RULE_WIDTH: usize = 80;

pub struct ErrorLog {
    out: Box<dyn Write + Send>,
    entries: u64,
    failed_writes: u64,
}

impl ErrorLog {
    /// Create (truncating) the log file at `path` and write its header.
    pub fn create<P: AsRef<Path>>(path: P, scan_root: &str) -> io::Result<Self> {
        let path_ref = path.as_ref();

        if let Some(parent) = path_ref.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }

        let file = File::create(path_ref)?;
        let mut log = Self::from_writer(Box::new(file));
        log.write_header(scan_root)?;
        Ok(log)
    }

    /// Wrap an arbitrary writer without writing a header.
    #[must_use]
    pub fn from_writer(out: Box<dyn Write + Send>) -> Self {
        Self {
            out,
            entries: 0,
            failed_writes: 0,
        }
    }

    /// A log that discards everything, for callers that only want in-memory results.
    #[must_use]
    pub fn discard() -> Self {
        Self::from_writer(Box::new(io::sink()))
    }

    fn write_header(&mut self, scan_root: &str) -> io::Result<()> {
        let now = Local::now().format(TIMESTAMP_FORMAT);
        writeln!(self.out, "Disk Scan Error Log - {now}")?;
        writeln!(self.out, "Start path: {scan_root}")?;
        writeln!(self.out, "{}", "=".repeat(RULE_WIDTH))?;
        writeln!(self.out)?;
        self.out.flush()
    }

    /// Append one timestamped entry and flush it. Never fails.
    pub fn log_error(
        &mut self,
        kind: FailureKind,
        message: &str,
        cause: Option<&(dyn StdError + 'static)>,
    ) {
        self.entries += 1;

        if let Err(err) = self.write_entry(kind, message, cause) {
            self.failed_writes += 1;
            log::warn!("Error log write failed ({err}); dropped entry: {message}");
        }
    }

    fn write_entry(
        &mut self,
        kind: FailureKind,
        message: &str,
        cause: Option<&(dyn StdError + 'static)>,
    ) -> io::Result<()> {
        let now = Local::now().format(TIMESTAMP_FORMAT);
        let mut entry = format!("[{now}] [{kind}] {message}\n");

        if let Some(cause) = cause {
            entry.push_str(&format!("kind: {}\n", cause_kind(cause)));
            entry.push_str(&format!("message: {cause}\n"));

            let mut source = cause.source();
            while let Some(inner) = source {
                entry.push_str(&format!("caused by: {inner}\n"));
                source = inner.source();
            }
        }

        entry.push('\n');
        entry.push_str(&"-".repeat(RULE_WIDTH));
        entry.push_str("\n\n");

        self.out.write_all(entry.as_bytes())?;
        self.out.flush()
    }

    /// Entries submitted, including those that failed to persist.
    #[must_use]
    pub fn entries(&self) -> u64 {
        self.entries
    }

    #[must_use]
    pub fn failed_writes(&self) -> u64 {
        self.failed_writes
    }
}

fn cause_kind(cause: &(dyn StdError + 'static)) -> String {
    if let Some(io_err) = cause.downcast_ref::<io::Error>() {
        format!("{:?}", io_err.kind())
    } else if cause.is::<super::sink::SinkError>() {
        "SinkError".to_string()
    } else {
        "Error".to_string()
    }
}
