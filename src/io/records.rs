//! Read a record stream back, tolerating both column schemas and truncated tails.

use crate::models::{EntryKind, EntryRecord, RecordSchema, TIMESTAMP_FORMAT, Timestamp};
use crate::{Error, Result};
use chrono::{Local, NaiveDateTime, TimeZone};
use csv::{ReaderBuilder, StringRecord};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Records read from a stream, plus rows that could not be parsed.
#[derive(Debug)]
pub struct RecordSet {
    pub schema: RecordSchema,
    pub records: Vec<EntryRecord>,
    pub malformed_rows: u64,
}

struct Columns {
    path: usize,
    name: usize,
    kind: usize,
    size: usize,
    extension: usize,
    /// Creation and modification columns, present in the extended schema.
    times: Option<(usize, usize)>,
}

impl Columns {
    fn locate(headers: &StringRecord) -> Result<(Self, RecordSchema)> {
        let find = |name: &str| {
            headers
                .iter()
                .position(|h| h.trim().eq_ignore_ascii_case(name))
                .ok_or_else(|| Error::InvalidInput(format!("missing column '{name}'")))
        };

        let times = find("DateTimeCreate")
            .ok()
            .zip(find("DateTimeLastModification").ok());

        let columns = Self {
            path: find("path")?,
            name: find("name")?,
            kind: find("type")?,
            size: find("size")?,
            extension: find("extension")?,
            times,
        };

        let schema = if times.is_some() {
            RecordSchema::Extended
        } else {
            RecordSchema::Basic
        };

        Ok((columns, schema))
    }

    fn parse(&self, row: &StringRecord) -> Option<EntryRecord> {
        let kind = EntryKind::from_label(row.get(self.kind)?)?;
        let size = row.get(self.size)?.trim().parse().ok()?;
        let extension = match kind {
            EntryKind::File => Some(row.get(self.extension)?.to_string()),
            EntryKind::Directory => None,
        };
        let (created, modified) = match (kind, self.times) {
            (EntryKind::File, Some((created, modified))) => (
                Some(parse_timestamp(row.get(created)?)),
                Some(parse_timestamp(row.get(modified)?)),
            ),
            _ => (None, None),
        };

        Some(EntryRecord {
            path: row.get(self.path)?.to_string(),
            name: row.get(self.name)?.to_string(),
            kind,
            size,
            extension,
            created,
            modified,
        })
    }
}

/// An unreadable or missing time is `Unavailable`, never a malformed row.
fn parse_timestamp(field: &str) -> Timestamp {
    NaiveDateTime::parse_from_str(field.trim(), TIMESTAMP_FORMAT)
        .ok()
        .and_then(|naive| Local.from_local_datetime(&naive).earliest())
        .map_or(Timestamp::Unavailable, Timestamp::At)
}

/// Read a record stream from a file on disk.
pub fn read_records<P: AsRef<Path>>(path: P) -> Result<RecordSet> {
    let file = File::open(path)?;
    read_records_from(file)
}

/// Read a record stream from any reader.
///
/// Rows with a wrong field count or an unparsable type/size are skipped and
/// counted. File timestamps are read back when the extended columns exist.
pub fn read_records_from<R: Read>(input: R) -> Result<RecordSet> {
    let mut reader = ReaderBuilder::new().flexible(true).from_reader(input);

    let headers = reader
        .headers()
        .map_err(|e| Error::InvalidInput(format!("unreadable header: {e}")))?
        .clone();
    let (columns, schema) = Columns::locate(&headers)?;
    let expected = headers.len();

    let mut records = Vec::new();
    let mut malformed_rows = 0u64;

    for row in reader.records() {
        let parsed = row
            .ok()
            .filter(|r| r.len() == expected)
            .and_then(|r| columns.parse(&r));

        match parsed {
            Some(record) => records.push(record),
            None => malformed_rows += 1,
        }
    }

    if malformed_rows > 0 {
        log::warn!("Skipped {malformed_rows} malformed row(s)");
    }

    Ok(RecordSet {
        schema,
        records,
        malformed_rows,
    })
}
