//! Streaming CSV sink that writes whole rows in periodic flushes.
//!
//! Each record is encoded into a complete CSV row before it is queued, and the
//! queue only ever reaches the file as a batch of whole rows. A process killed
//! between flushes therefore leaves the header plus complete rows only. A batch
//! that fails part-way is cut back to the last complete row before the next one
//! is written.

use super::{RecordSink, RowCounts, SinkError, SinkFinish};
use crate::models::{EntryRecord, RecordSchema};
use csv::WriterBuilder;
use std::fs::File;
use std::io::{self, Seek, SeekFrom, Write};
use std::path::Path;

/// Default number of rows buffered before flushing.
pub const DEFAULT_FLUSH_EVERY: u64 = 1_000;

/// Output able to discard a torn tail after a failed batch.
pub trait RowWriter: Write + Send {
    /// Drop every byte past `len` and continue writing from there.
    fn truncate_to(&mut self, len: u64) -> io::Result<()>;
}

impl RowWriter for File {
    fn truncate_to(&mut self, len: u64) -> io::Result<()> {
        self.set_len(len)?;
        self.seek(SeekFrom::Start(len))?;
        Ok(())
    }
}

impl RowWriter for Vec<u8> {
    fn truncate_to(&mut self, len: u64) -> io::Result<()> {
        let len = usize::try_from(len).map_err(io::Error::other)?;
        self.truncate(len);
        Ok(())
    }
}

pub struct CsvSink<W: RowWriter = File> {
    out: Option<W>,
    schema: RecordSchema,
    pending: Vec<u8>,
    pending_rows: RowCounts,
    flush_every: u64,
    /// Bytes of header and complete rows known to be in the output.
    committed: u64,
    rows_written: u64,
    rows_lost: u64,
}

impl CsvSink<File> {
    /// Create (truncating) the CSV file at `path` and write its header.
    pub fn create<P: AsRef<Path>>(path: P, schema: RecordSchema, flush_every: u64) -> io::Result<Self> {
        let path_ref = path.as_ref();

        if let Some(parent) = path_ref.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }

        let file = File::create(path_ref)?;
        Self::from_writer(file, schema, flush_every)
    }
}

impl<W: RowWriter> CsvSink<W> {
    /// Wrap an arbitrary writer. The header is written and flushed immediately.
    pub fn from_writer(mut out: W, schema: RecordSchema, flush_every: u64) -> io::Result<Self> {
        let header = encode_row(schema.header())?;
        out.write_all(&header)?;
        out.flush()?;

        Ok(Self {
            out: Some(out),
            schema,
            pending: Vec::new(),
            pending_rows: RowCounts::default(),
            flush_every: flush_every.max(1),
            committed: header.len() as u64,
            rows_written: 0,
            rows_lost: 0,
        })
    }

    /// Rows that reached the underlying writer.
    #[must_use]
    pub fn rows_written(&self) -> u64 {
        self.rows_written
    }

    /// Rows dropped because a flush failed.
    #[must_use]
    pub fn rows_lost(&self) -> u64 {
        self.rows_lost
    }

    /// Rows encoded but not yet flushed.
    #[must_use]
    pub fn pending_rows(&self) -> u64 {
        self.pending_rows.total()
    }

    fn flush_pending(&mut self) -> Result<(), SinkError> {
        let rows = self.pending_rows;
        if rows.total() == 0 {
            return Ok(());
        }

        let out = self.out.as_mut().ok_or(SinkError::Closed)?;
        let (written, result) = write_tracked(out, &self.pending);

        let batch_len = self.pending.len() as u64;
        self.pending.clear();
        self.pending_rows = RowCounts::default();

        match result {
            Ok(()) => {
                self.committed += batch_len;
                self.rows_written += rows.total();
                log::trace!("Flushed {} row(s) (total: {})", rows.total(), self.rows_written);
                Ok(())
            }
            Err(source) => {
                self.rows_lost += rows.total();
                if written > 0 {
                    self.discard_torn_tail();
                }
                Err(SinkError::Io { source, lost: rows })
            }
        }
    }

    /// Cut the output back to the last complete row. If that fails the stream
    /// can no longer be trusted, so the sink closes.
    fn discard_torn_tail(&mut self) {
        let Some(out) = self.out.as_mut() else {
            return;
        };

        if let Err(err) = out.truncate_to(self.committed) {
            log::warn!(
                "Cannot remove partial row at byte {} ({err}); closing CSV output",
                self.committed
            );
            self.out = None;
        }
    }
}

impl<W: RowWriter> RecordSink for CsvSink<W> {
    fn write_row(&mut self, record: &EntryRecord) -> Result<(), SinkError> {
        if self.out.is_none() {
            return Err(SinkError::Closed);
        }

        let fields = record_fields(record, self.schema);
        let row = encode_row(&fields).map_err(|source| {
            self.rows_lost += 1;
            SinkError::Io {
                source,
                lost: RowCounts::single(record.kind),
            }
        })?;

        self.pending.extend_from_slice(&row);
        self.pending_rows.add(record.kind);

        if self.pending_rows.total() >= self.flush_every {
            self.flush_pending()?;
        }

        Ok(())
    }

    fn flush(&mut self) -> Result<(), SinkError> {
        self.flush_pending()
    }

    fn finish(mut self: Box<Self>) -> io::Result<SinkFinish> {
        let flushed = self.flush_pending();
        self.out = None;
        flushed?;

        Ok(SinkFinish {
            records: Vec::new(),
            errors: Vec::new(),
            rows_written: self.rows_written,
            rows_lost: self.rows_lost,
        })
    }
}

impl<W: RowWriter> Drop for CsvSink<W> {
    fn drop(&mut self) {
        if self.out.is_some()
            && let Err(err) = self.flush_pending()
        {
            log::warn!("Dropping CSV sink lost buffered rows: {err}");
        }
    }
}

/// Write `buf` and flush, reporting how many bytes reached the writer even on failure.
fn write_tracked<W: Write>(out: &mut W, buf: &[u8]) -> (usize, io::Result<()>) {
    let mut written = 0;

    while written < buf.len() {
        match out.write(&buf[written..]) {
            Ok(0) => {
                return (
                    written,
                    Err(io::Error::new(io::ErrorKind::WriteZero, "failed to write whole batch")),
                );
            }
            Ok(n) => written += n,
            Err(err) if err.kind() == io::ErrorKind::Interrupted => {}
            Err(err) => return (written, Err(err)),
        }
    }

    (written, out.flush())
}

/// Column values of a record under the given schema.
#[must_use]
pub fn record_fields(record: &EntryRecord, schema: RecordSchema) -> Vec<String> {
    let mut fields = vec![
        record.path.clone(),
        record.name.clone(),
        record.kind.as_str().to_string(),
        record.size.to_string(),
        record.extension.clone().unwrap_or_default(),
    ];

    if schema.includes_timestamps() {
        fields.push(record.created.map(|t| t.to_string()).unwrap_or_default());
        fields.push(record.modified.map(|t| t.to_string()).unwrap_or_default());
    }

    fields
}

fn encode_row<I, T>(fields: I) -> io::Result<Vec<u8>>
where
    I: IntoIterator<Item = T>,
    T: AsRef<[u8]>,
{
    let mut writer = WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::with_capacity(128));
    writer.write_record(fields).map_err(io::Error::other)?;
    writer.into_inner().map_err(|err| err.into_error())
}
