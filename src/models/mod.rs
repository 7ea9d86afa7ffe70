//! Data models for entry records, scan statistics, errors and progress

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Instant;

/// Format used for every wall-clock timestamp written by the scanner.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Written in place of a timestamp that could not be read.
pub const UNAVAILABLE: &str = "unavailable";

/// Kind of filesystem object an [`EntryRecord`] describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntryKind {
    File,
    Directory,
}

impl EntryKind {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryKind::File => "file",
            EntryKind::Directory => "dir",
        }
    }

    #[must_use]
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "file" => Some(EntryKind::File),
            "dir" | "directory" => Some(EntryKind::Directory),
            _ => None,
        }
    }
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Column layout of the output stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordSchema {
    /// `path, name, type, size, extension`
    #[default]
    Basic,
    /// Basic columns plus creation and modification times.
    Extended,
}

impl RecordSchema {
    #[must_use]
    pub fn header(&self) -> &'static [&'static str] {
        match self {
            RecordSchema::Basic => &["path", "name", "type", "size", "extension"],
            RecordSchema::Extended => &[
                "Path",
                "Name",
                "Type",
                "Size",
                "Extension",
                "DateTimeCreate",
                "DateTimeLastModification",
            ],
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordSchema::Basic => "basic",
            RecordSchema::Extended => "extended",
        }
    }

    #[must_use]
    pub fn from_label(label: &str) -> Option<Self> {
        match label.to_ascii_lowercase().as_str() {
            "basic" => Some(RecordSchema::Basic),
            "extended" => Some(RecordSchema::Extended),
            _ => None,
        }
    }

    #[must_use]
    pub fn includes_timestamps(&self) -> bool {
        matches!(self, RecordSchema::Extended)
    }
}

impl fmt::Display for RecordSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for RecordSchema {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        RecordSchema::from_label(s).ok_or_else(|| format!("unknown schema '{s}'"))
    }
}

/// A creation or modification time, or the marker for one that could not be read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timestamp {
    At(DateTime<Local>),
    Unavailable,
}

impl Timestamp {
    #[must_use]
    pub fn is_available(&self) -> bool {
        matches!(self, Timestamp::At(_))
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Timestamp::At(at) => write!(f, "{}", at.format(TIMESTAMP_FORMAT)),
            Timestamp::Unavailable => f.write_str(UNAVAILABLE),
        }
    }
}

/// One row of the output stream.
///
/// `path` is the parent directory; it is empty for the scan root, whose `name`
/// carries the root path as given.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryRecord {
    pub path: String,
    pub name: String,
    pub kind: EntryKind,
    pub size: u64,
    pub extension: Option<String>,
    pub created: Option<Timestamp>,
    pub modified: Option<Timestamp>,
}

impl EntryRecord {
    #[must_use]
    pub fn directory(path: String, name: String, size: u64) -> Self {
        Self {
            path,
            name,
            kind: EntryKind::Directory,
            size,
            extension: None,
            created: None,
            modified: None,
        }
    }

    #[must_use]
    pub fn is_root(&self) -> bool {
        self.kind == EntryKind::Directory && self.path.is_empty()
    }

    /// Full path of the entry as the record stream spells it.
    #[must_use]
    pub fn full_path(&self) -> String {
        if self.path.is_empty() {
            self.name.clone()
        } else if self.path.ends_with('/') {
            format!("{}{}", self.path, self.name)
        } else {
            format!("{}/{}", self.path, self.name)
        }
    }
}

/// Category of a non-fatal failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailureKind {
    /// An entry's listing, metadata or timestamps could not be read.
    Scan,
    /// A sink failed to persist a row.
    Write,
}

impl FailureKind {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::Scan => "scan",
            FailureKind::Write => "write",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Represents an error encountered during scanning
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorItem {
    pub kind: FailureKind,
    pub path: String,
    pub code: String,
    pub message: String,
}

impl ErrorItem {
    /// Build an item from an I/O error, classifying it with a short errno-like code.
    #[must_use]
    pub fn from_io(kind: FailureKind, path: &str, error: &std::io::Error) -> Self {
        let code = match error.kind() {
            std::io::ErrorKind::NotFound => "ENOENT",
            std::io::ErrorKind::PermissionDenied => "EACCES",
            std::io::ErrorKind::Unsupported => "ENOTSUP",
            _ => "IO",
        };

        Self {
            kind,
            path: path.to_string(),
            code: code.to_string(),
            message: error.to_string(),
        }
    }
}

/// Mutable counters owned by the traversal engine.
#[derive(Debug, Clone)]
pub struct ScanStats {
    pub files_seen: u64,
    /// File rows accepted by the sink and not since reported lost. Once the
    /// scan has finished this is the number of file rows persisted.
    pub files_written: u64,
    pub files_skipped: u64,
    pub dirs_seen: u64,
    /// Directory rows, counted like `files_written`.
    pub dirs_written: u64,
    pub bytes_seen: u64,
    pub scan_errors: u64,
    /// Failed sink operations. One failed batch flush is one error however
    /// many rows it dropped; the dropped rows are reported as rows lost.
    pub write_errors: u64,
    pub started: Instant,
}

impl Default for ScanStats {
    fn default() -> Self {
        Self {
            files_seen: 0,
            files_written: 0,
            files_skipped: 0,
            dirs_seen: 0,
            dirs_written: 0,
            bytes_seen: 0,
            scan_errors: 0,
            write_errors: 0,
            started: Instant::now(),
        }
    }
}

impl ScanStats {
    #[must_use]
    pub fn total_errors(&self) -> u64 {
        self.scan_errors + self.write_errors
    }
}

/// Point-in-time view of scan progress handed to the operator-facing notifier.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgressSnapshot {
    pub elapsed_ms: u64,
    pub files_seen: u64,
    pub files_written: u64,
    pub files_skipped: u64,
    pub dirs_seen: u64,
    pub bytes_seen: u64,
    pub scan_errors: u64,
    pub write_errors: u64,
    pub files_per_sec: Option<u64>,
    pub is_final: bool,
}
