//! Unit tests for record sinks and row encoding

#[cfg(test)]
mod tests {
    use chrono::{Local, TimeZone};
    use dscan::models::{EntryKind, EntryRecord, ErrorItem, FailureKind, RecordSchema, Timestamp};
    use dscan::services::sink::{RecordSink, RowCounts, SinkError};
    use dscan::services::sink::csv::{CsvSink, record_fields};
    use dscan::services::sink::memory::MemorySink;
    use std::io;

    fn file(name: &str, size: u64) -> EntryRecord {
        EntryRecord {
            path: "/data/docs".to_string(),
            name: name.to_string(),
            kind: EntryKind::File,
            size,
            extension: Some("txt".to_string()),
            created: Some(Timestamp::Unavailable),
            modified: Some(Timestamp::At(
                Local.with_ymd_and_hms(2024, 3, 5, 7, 8, 9).unwrap(),
            )),
        }
    }

    #[test]
    fn test_basic_fields() {
        let fields = record_fields(&file("a.txt", 42), RecordSchema::Basic);
        assert_eq!(fields, ["/data/docs", "a.txt", "file", "42", "txt"]);
    }

    #[test]
    fn test_extended_fields() {
        let fields = record_fields(&file("a.txt", 42), RecordSchema::Extended);
        assert_eq!(fields.len(), 7);
        assert_eq!(fields[5], "unavailable");
        assert_eq!(fields[6], "2024-03-05 07:08:09");

        let dir = EntryRecord::directory("/data".to_string(), "docs".to_string(), 42);
        let fields = record_fields(&dir, RecordSchema::Extended);
        assert_eq!(fields, ["/data", "docs", "dir", "42", "", "", ""]);
    }

    #[test]
    fn test_awkward_names_stay_one_row() {
        let mut sink = CsvSink::from_writer(Vec::new(), RecordSchema::Basic, 1).unwrap();
        sink.write_row(&file("quote\"comma,\nnewline.txt", 1)).unwrap();
        assert_eq!(sink.rows_written(), 1);

        let finish = Box::new(sink).finish().unwrap();
        assert_eq!(finish.rows_written, 1);
        assert_eq!(finish.rows_lost, 0);
        assert!(finish.records.is_empty());
    }

    #[test]
    fn test_finish_flushes_remainder() {
        let mut sink = CsvSink::from_writer(Vec::new(), RecordSchema::Basic, 10).unwrap();
        for i in 0..15 {
            sink.write_row(&file(&format!("{i}.txt"), i)).unwrap();
        }
        assert_eq!(sink.rows_written(), 10);
        assert_eq!(sink.pending_rows(), 5);

        let finish = Box::new(sink).finish().unwrap();
        assert_eq!(finish.rows_written, 15);
    }

    #[test]
    fn test_zero_cadence_flushes_every_row() {
        let mut sink = CsvSink::from_writer(Vec::new(), RecordSchema::Basic, 0).unwrap();
        sink.write_row(&file("a.txt", 1)).unwrap();
        assert_eq!(sink.pending_rows(), 0);
        assert_eq!(sink.rows_written(), 1);
    }

    #[test]
    fn test_memory_sink_keeps_everything() {
        let mut sink = MemorySink::new();
        sink.write_row(&file("a.txt", 1)).unwrap();
        sink.record_error(&ErrorItem::from_io(
            FailureKind::Scan,
            "/data/x",
            &io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        ));
        assert_eq!(sink.records().len(), 1);

        let finish = Box::new(sink).finish().unwrap();
        assert_eq!(finish.rows_written, 1);
        assert_eq!(finish.errors.len(), 1);
        assert_eq!(finish.errors[0].code, "EACCES");
    }

    #[test]
    fn test_lost_rows_by_kind() {
        let mut batch = RowCounts::default();
        batch.add(EntryKind::File);
        batch.add(EntryKind::File);
        batch.add(EntryKind::Directory);

        let err = SinkError::Io {
            source: io::Error::other("disk full"),
            lost: batch,
        };
        assert_eq!(err.lost_rows(Some(EntryKind::File)), batch);
        assert!(err.to_string().starts_with("failed to persist 3 row(s)"));

        let closed = SinkError::Closed;
        assert_eq!(closed.lost_rows(Some(EntryKind::Directory)).dirs, 1);
        assert_eq!(closed.lost_rows(None).total(), 0);
    }
}
