//! Unit tests for directory aggregation and report ranking

#[cfg(test)]
mod tests {
    use dscan::models::{EntryKind, EntryRecord};
    use dscan::services::aggregate::DirectoryAggregator;
    use dscan::services::report::sort_and_limit;
    use std::path::Path;

    fn dir(path: &str, name: &str, size: u64) -> EntryRecord {
        EntryRecord::directory(path.to_string(), name.to_string(), size)
    }

    #[test]
    fn test_post_order_chain() {
        // /r
        //   a/          (x: 4, b/ { y: 6 })
        //   z: 1
        let mut agg = DirectoryAggregator::new();
        let root = Path::new("/r");
        let a = Path::new("/r/a");
        let b = Path::new("/r/a/b");

        agg.open(root);
        agg.open(a);
        agg.open(b);
        agg.record_child_size(b, 6);
        let b_size = agg.finalize_and_size(b);
        agg.record_child_size(a, b_size);
        agg.record_child_size(a, 4);
        let a_size = agg.finalize_and_size(a);
        agg.record_child_size(root, a_size);
        agg.record_child_size(root, 1);

        assert_eq!(b_size, 6);
        assert_eq!(a_size, 10);
        assert_eq!(agg.finalize_and_size(root), 11);
        assert_eq!(agg.peak_len(), 3);
        assert_eq!(agg.open_len(), 0);
    }

    #[test]
    fn test_siblings_reuse_capacity() {
        let mut agg = DirectoryAggregator::new();
        let root = Path::new("/r");
        agg.open(root);

        for i in 0..100 {
            let sib = format!("/r/s{i}");
            agg.open(Path::new(&sib));
            agg.record_child_size(Path::new(&sib), 1);
            let size = agg.finalize_and_size(Path::new(&sib));
            agg.record_child_size(root, size);
        }

        assert_eq!(agg.finalize_and_size(root), 100);
        assert_eq!(agg.peak_len(), 2);
    }

    #[test]
    fn test_empty_directory_is_zero() {
        let mut agg = DirectoryAggregator::new();
        agg.open(Path::new("/empty"));
        assert_eq!(agg.finalize_and_size(Path::new("/empty")), 0);
        assert_eq!(agg.finalize_and_size(Path::new("/never-opened")), 0);
    }

    #[test]
    fn test_saturating_totals() {
        let mut agg = DirectoryAggregator::new();
        let root = Path::new("/huge");
        agg.record_child_size(root, u64::MAX);
        agg.record_child_size(root, 10);
        assert_eq!(agg.finalize_and_size(root), u64::MAX);
    }

    #[test]
    fn test_sort_and_limit() {
        let records = vec![
            dir("/r", "b", 100),
            dir("/r", "a", 500),
            dir("/r", "c", 500),
            dir("", "/r", 1100),
        ];

        let top = sort_and_limit(records.iter(), 3);

        assert_eq!(top.len(), 3);
        assert_eq!(top[0].path, "/r");
        assert_eq!(top[1].path, "/r/a");
        assert_eq!(top[2].path, "/r/c");
        assert!(records.iter().all(|r| r.kind == EntryKind::Directory));
    }

    #[test]
    fn test_sort_and_limit_larger_than_input() {
        let records = vec![dir("/r", "only", 1)];
        assert_eq!(sort_and_limit(records.iter(), 10).len(), 1);
        assert!(sort_and_limit(records.iter(), 0).is_empty());
    }
}
