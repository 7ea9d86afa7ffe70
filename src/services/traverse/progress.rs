//! Count-based progress reporting for the traversal engine.

use crate::models::{ProgressSnapshot, ScanStats};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Callback receiving progress snapshots.
pub type ProgressNotifier = Arc<dyn Fn(&ProgressSnapshot) + Send + Sync>;

/// Default number of files between progress snapshots.
pub const DEFAULT_EVERY_FILES: u64 = 5_000;
/// Default number of directories between progress snapshots.
pub const DEFAULT_EVERY_DIRS: u64 = 100;

/// Emits a snapshot every N files and every M directories. Zero disables a trigger.
pub struct ProgressReporter {
    every_files: u64,
    every_dirs: u64,
    notifier: Option<ProgressNotifier>,
    emitted: u64,
}

impl ProgressReporter {
    #[must_use]
    pub fn new(every_files: u64, every_dirs: u64, notifier: Option<ProgressNotifier>) -> Self {
        Self {
            every_files,
            every_dirs,
            notifier,
            emitted: 0,
        }
    }

    /// Called after each file is counted.
    pub fn on_file(&mut self, stats: &ScanStats) {
        if self.every_files > 0 && stats.files_seen % self.every_files == 0 {
            self.emit(stats, false);
        }
    }

    /// Called after each directory is finalized.
    pub fn on_directory(&mut self, stats: &ScanStats) {
        if self.every_dirs > 0 && stats.dirs_seen % self.every_dirs == 0 {
            self.emit(stats, false);
        }
    }

    /// Emit a closing snapshot regardless of thresholds.
    pub fn finish(&mut self, stats: &ScanStats) {
        self.emit(stats, true);
    }

    /// Snapshots handed to the notifier so far.
    #[must_use]
    pub fn emitted(&self) -> u64 {
        self.emitted
    }

    fn emit(&mut self, stats: &ScanStats, is_final: bool) {
        let Some(notifier) = &self.notifier else {
            return;
        };

        let snapshot = snapshot(stats, Instant::now(), is_final);
        notifier(&snapshot);
        self.emitted += 1;
    }
}

/// Derive a snapshot from the engine counters.
#[must_use]
pub fn snapshot(stats: &ScanStats, now: Instant, is_final: bool) -> ProgressSnapshot {
    let elapsed = now.saturating_duration_since(stats.started);

    ProgressSnapshot {
        elapsed_ms: u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
        files_seen: stats.files_seen,
        files_written: stats.files_written,
        files_skipped: stats.files_skipped,
        dirs_seen: stats.dirs_seen,
        bytes_seen: stats.bytes_seen,
        scan_errors: stats.scan_errors,
        write_errors: stats.write_errors,
        files_per_sec: compute_rate(stats.files_seen, elapsed),
        is_final,
    }
}

fn compute_rate(count: u64, elapsed: Duration) -> Option<u64> {
    let nanos = elapsed.as_nanos();
    if nanos == 0 {
        return None;
    }

    let numerator = u128::from(count) * 1_000_000_000u128;
    let rate = numerator / nanos;
    u64::try_from(rate.min(u128::from(u64::MAX))).ok()
}
