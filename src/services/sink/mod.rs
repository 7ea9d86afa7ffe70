//! Record sinks receiving traversal output without retaining everything in-memory.

use crate::models::{EntryKind, EntryRecord, ErrorItem};
use std::fmt;
use std::io;

/// Aggregated result returned by a sink after traversal completes.
#[derive(Debug, Default)]
pub struct SinkFinish {
    pub records: Vec<EntryRecord>,
    pub errors: Vec<ErrorItem>,
    pub rows_written: u64,
    pub rows_lost: u64,
}

/// Row counts split by entry kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RowCounts {
    pub files: u64,
    pub dirs: u64,
}

impl RowCounts {
    #[must_use]
    pub fn single(kind: EntryKind) -> Self {
        let mut counts = Self::default();
        counts.add(kind);
        counts
    }

    pub fn add(&mut self, kind: EntryKind) {
        match kind {
            EntryKind::File => self.files += 1,
            EntryKind::Directory => self.dirs += 1,
        }
    }

    #[must_use]
    pub fn total(&self) -> u64 {
        self.files + self.dirs
    }
}

/// Failure to persist rows. The rows are gone; the scan goes on.
///
/// `lost` covers every row dropped by the failed operation, including rows
/// accepted by earlier `write_row` calls that were still buffered.
#[derive(Debug)]
pub enum SinkError {
    Io { source: io::Error, lost: RowCounts },
    /// The sink was already closed; only the offered row is lost.
    Closed,
}

impl SinkError {
    /// Rows lost by this failure, given the row being offered when it happened.
    #[must_use]
    pub fn lost_rows(&self, offered: Option<EntryKind>) -> RowCounts {
        match self {
            SinkError::Io { lost, .. } => *lost,
            SinkError::Closed => offered.map(RowCounts::single).unwrap_or_default(),
        }
    }
}

impl fmt::Display for SinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SinkError::Io { source, lost } => {
                write!(f, "failed to persist {} row(s): {source}", lost.total())
            }
            SinkError::Closed => f.write_str("sink already closed"),
        }
    }
}

impl std::error::Error for SinkError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SinkError::Io { source, .. } => Some(source),
            SinkError::Closed => None,
        }
    }
}

impl From<SinkError> for io::Error {
    fn from(err: SinkError) -> Self {
        match err {
            SinkError::Io { source, .. } => source,
            SinkError::Closed => io::Error::other("sink already closed"),
        }
    }
}

/// Trait implemented by sinks that receive entry records and failures.
pub trait RecordSink: Send {
    /// Append one record. Implementations may buffer, so `Ok` means accepted,
    /// not persisted; a later failure reports the buffered rows it dropped.
    fn write_row(&mut self, record: &EntryRecord) -> Result<(), SinkError>;

    /// Observe a non-fatal failure. File-backed sinks leave this to the error log.
    fn record_error(&mut self, _error: &ErrorItem) {}

    /// Push buffered rows to the underlying storage.
    fn flush(&mut self) -> Result<(), SinkError> {
        Ok(())
    }

    /// Flush unconditionally and close the sink.
    fn finish(self: Box<Self>) -> io::Result<SinkFinish>;
}

pub mod csv;
pub mod memory;
