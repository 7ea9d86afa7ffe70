//! In-memory sink retaining traversal results for callers that need full materialization.

use super::{RecordSink, SinkError, SinkFinish};
use crate::models::{EntryRecord, ErrorItem};
use std::io;

#[derive(Default)]
pub struct MemorySink {
    records: Vec<EntryRecord>,
    errors: Vec<ErrorItem>,
}

impl MemorySink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn records(&self) -> &[EntryRecord] {
        &self.records
    }
}

impl RecordSink for MemorySink {
    fn write_row(&mut self, record: &EntryRecord) -> Result<(), SinkError> {
        self.records.push(record.clone());
        Ok(())
    }

    fn record_error(&mut self, error: &ErrorItem) {
        self.errors.push(error.clone());
    }

    fn finish(self: Box<Self>) -> io::Result<SinkFinish> {
        let rows_written = self.records.len() as u64;
        Ok(SinkFinish {
            records: self.records,
            errors: self.errors,
            rows_written,
            rows_lost: 0,
        })
    }
}
