//! Resilience tests: unreadable entries, failing sinks, and entries that are not sized

#[cfg(test)]
mod tests {
    use crate::fixtures::{find, write_file};
    use dscan::models::{EntryKind, EntryRecord, ErrorItem, FailureKind};
    use dscan::services::error_log::ErrorLog;
    use dscan::services::sink::{RecordSink, RowCounts, SinkError, SinkFinish};
    use dscan::ScanOptions;
    use std::fs;
    use std::io::{self, Write};
    use std::sync::{Arc, Mutex};
    use tempfile::TempDir;

    /// Rejects every row whose name is listed, keeps the rest.
    struct RejectingSink {
        reject: Vec<&'static str>,
        accepted: Vec<EntryRecord>,
    }

    impl RecordSink for RejectingSink {
        fn write_row(&mut self, record: &EntryRecord) -> Result<(), SinkError> {
            if self.reject.contains(&record.name.as_str()) {
                return Err(SinkError::Io {
                    source: io::Error::other("device full"),
                    lost: RowCounts::single(record.kind),
                });
            }
            self.accepted.push(record.clone());
            Ok(())
        }

        fn finish(self: Box<Self>) -> io::Result<SinkFinish> {
            Ok(SinkFinish {
                rows_written: self.accepted.len() as u64,
                records: self.accepted,
                ..Default::default()
            })
        }
    }

    #[derive(Clone, Default)]
    struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_write_failure_loses_only_that_row() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::create_dir_all(root.join("sub")).unwrap();
        write_file(root.join("sub/bad.txt"), 7).unwrap();
        write_file(root.join("sub/good.txt"), 5).unwrap();
        write_file(root.join("top.txt"), 3).unwrap();

        let buffer = SharedBuffer::default();
        let mut error_log = ErrorLog::from_writer(Box::new(buffer.clone()));
        let sink = Box::new(RejectingSink {
            reject: vec!["bad.txt"],
            accepted: Vec::new(),
        });

        let summary =
            dscan::scan_with_sink(root, &ScanOptions::default(), sink, &mut error_log).unwrap();

        assert_eq!(summary.stats.write_errors, 1);
        assert_eq!(summary.stats.files_written, 2);
        assert_eq!(summary.stats.files_seen, 3);
        assert_eq!(summary.error_entries, 1);

        // Aggregation still counts the file whose row was lost.
        assert_eq!(find(&summary.records, "sub").size, 12);
        assert_eq!(summary.root_size, 15);
        assert!(!summary.records.iter().any(|r| r.name == "bad.txt"));

        let log = String::from_utf8(buffer.0.lock().unwrap().clone()).unwrap();
        assert!(log.contains("[write] Failed to write record"));
        assert!(log.contains("bad.txt"));
        assert!(log.contains("device full"));
    }

    #[test]
    fn test_file_vanishing_mid_scan_costs_only_that_file() {
        use dscan::models::ProgressSnapshot;

        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::create_dir_all(root.join("a_sub")).unwrap();
        write_file(root.join("a_sub/inner.txt"), 4).unwrap();
        write_file(root.join("keep1.txt"), 10).unwrap();
        write_file(root.join("victim.txt"), 20).unwrap();
        write_file(root.join("keep2.txt"), 30).unwrap();

        // The root is listed before `a_sub` is walked, and its files are sized
        // after; removing the file once `a_sub` completes leaves a stale entry.
        let victim = root.join("victim.txt");
        let opts = ScanOptions {
            progress_every_files: 0,
            progress_every_dirs: 1,
            progress_notifier: Some(Arc::new(move |_: &ProgressSnapshot| {
                let _ = fs::remove_file(&victim);
            })),
            ..Default::default()
        };

        let summary = dscan::scan_summary(root, &opts).unwrap();

        let files: Vec<&str> = summary
            .records
            .iter()
            .filter(|r| r.kind == EntryKind::File)
            .map(|r| r.name.as_str())
            .collect();
        assert_eq!(files, ["inner.txt", "keep1.txt", "keep2.txt"]);

        assert_eq!(summary.stats.scan_errors, 1);
        assert_eq!(summary.error_entries, 1);
        assert_eq!(summary.errors.len(), 1);
        assert_eq!(summary.errors[0].kind, FailureKind::Scan);
        assert_eq!(summary.errors[0].code, "ENOENT");
        assert!(summary.errors[0].path.ends_with("victim.txt"));

        assert_eq!(summary.stats.files_seen, 3);
        assert_eq!(summary.root_size, 44);
        assert_eq!(find(&summary.records, "a_sub").size, 4);
    }

    #[test]
    #[cfg(unix)]
    fn test_unsearchable_directory_fails_per_file() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::create_dir_all(root.join("listed")).unwrap();
        write_file(root.join("listed/one.txt"), 8).unwrap();
        write_file(root.join("outside.txt"), 5).unwrap();

        // Readable but not searchable: names can be listed, metadata cannot be read.
        let listed = root.join("listed");
        fs::set_permissions(&listed, fs::Permissions::from_mode(0o644)).unwrap();

        if fs::symlink_metadata(listed.join("one.txt")).is_ok() {
            fs::set_permissions(&listed, fs::Permissions::from_mode(0o755)).unwrap();
            return;
        }

        let summary = dscan::scan_summary(root, &ScanOptions::default()).unwrap();
        fs::set_permissions(&listed, fs::Permissions::from_mode(0o755)).unwrap();

        assert_eq!(summary.stats.scan_errors, 1);
        assert_eq!(summary.errors[0].code, "EACCES");
        assert!(!summary.records.iter().any(|r| r.name == "one.txt"));
        assert_eq!(find(&summary.records, "listed").size, 0);
        assert_eq!(summary.root_size, 5);
    }

    #[test]
    #[cfg(unix)]
    fn test_unreadable_directory_is_skipped() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::create_dir_all(root.join("open")).unwrap();
        fs::create_dir_all(root.join("locked")).unwrap();
        write_file(root.join("open/a.txt"), 10).unwrap();
        write_file(root.join("locked/hidden.txt"), 100).unwrap();

        let locked = root.join("locked");
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

        // Privileged users can read the directory anyway; nothing to test then.
        if fs::read_dir(&locked).is_ok() {
            fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
            return;
        }

        let summary = dscan::scan_summary(root, &ScanOptions::default()).unwrap();
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

        assert_eq!(summary.stats.scan_errors, 1);
        assert_eq!(summary.errors.len(), 1);
        assert_eq!(summary.errors[0].kind, FailureKind::Scan);
        assert_eq!(summary.errors[0].code, "EACCES");
        assert!(!summary.records.iter().any(|r| r.name == "locked"));
        assert_eq!(summary.root_size, 10);
        assert_eq!(find(&summary.records, "a.txt").size, 10);
    }

    #[test]
    #[cfg(unix)]
    fn test_symlinks_are_not_sized() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        write_file(root.join("real.bin"), 64).unwrap();
        fs::create_dir_all(root.join("dir")).unwrap();
        std::os::unix::fs::symlink(root.join("real.bin"), root.join("link.bin")).unwrap();
        std::os::unix::fs::symlink(root.join("dir"), root.join("dirlink")).unwrap();

        let summary = dscan::scan_summary(root, &ScanOptions::default()).unwrap();

        assert_eq!(summary.root_size, 64);
        assert_eq!(summary.stats.files_seen, 1);
        assert_eq!(summary.stats.dirs_seen, 2);
        assert!(!summary.records.iter().any(|r| r.name == "link.bin"));
        assert!(!summary.records.iter().any(|r| r.name == "dirlink"));
        assert_eq!(summary.stats.total_errors(), 0);
    }

    #[test]
    fn test_empty_directories() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::create_dir_all(root.join("empty1")).unwrap();
        fs::create_dir_all(root.join("empty2/nested")).unwrap();

        let summary = dscan::scan_summary(root, &ScanOptions::default()).unwrap();

        assert_eq!(summary.records.len(), 4);
        assert!(summary.records.iter().all(|r| r.kind == EntryKind::Directory));
        assert!(summary.records.iter().all(|r| r.size == 0));
    }

    #[test]
    fn test_many_small_files() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();

        for i in 0..50 {
            fs::write(root.join(format!("file{i:02}.txt")), format!("{i}")).unwrap();
        }

        let summary = dscan::scan_summary(root, &ScanOptions::default()).unwrap();

        // 10 one-digit names, 40 two-digit names
        assert_eq!(summary.root_size, 10 + 80);
        assert_eq!(summary.stats.files_written, 50);

        let names: Vec<&str> = summary
            .records
            .iter()
            .filter(|r| r.kind == EntryKind::File)
            .map(|r| r.name.as_str())
            .collect();
        let mut sorted = names.clone();
        sorted.sort_unstable();
        assert_eq!(names, sorted, "entries are emitted in name order");
    }

    #[test]
    fn test_error_item_codes() {
        let denied = io::Error::new(io::ErrorKind::PermissionDenied, "nope");
        let item = ErrorItem::from_io(FailureKind::Scan, "/x", &denied);
        assert_eq!(item.code, "EACCES");

        let gone = io::Error::new(io::ErrorKind::NotFound, "gone");
        assert_eq!(ErrorItem::from_io(FailureKind::Scan, "/x", &gone).code, "ENOENT");
    }
}
