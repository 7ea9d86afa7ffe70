//! Scan configuration, loadable from and savable to JSON.

use crate::models::RecordSchema;
use crate::services::filter::threshold_bytes;
use crate::services::sink::csv::DEFAULT_FLUSH_EVERY;
use crate::services::traverse::progress::{DEFAULT_EVERY_DIRS, DEFAULT_EVERY_FILES};
use crate::{Error, Result, ScanOptions};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Everything one scan invocation needs. Immutable once the scan starts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    pub root: String,
    pub output: String,
    pub error_log: String,
    /// Minimum file size written to the output, in megabytes.
    pub min_size_mb: f64,
    pub progress_every_files: u64,
    pub progress_every_dirs: u64,
    /// Rows buffered between flushes of the output file.
    pub flush_every: u64,
    pub schema: RecordSchema,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            root: String::new(),
            output: "disk_usage.csv".to_string(),
            error_log: "disk_scan_errors.log".to_string(),
            min_size_mb: 0.0,
            progress_every_files: DEFAULT_EVERY_FILES,
            progress_every_dirs: DEFAULT_EVERY_DIRS,
            flush_every: DEFAULT_FLUSH_EVERY,
            schema: RecordSchema::Basic,
        }
    }
}

impl ScanConfig {
    /// Load a configuration file; missing keys take their defaults.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)?;
        serde_json::from_str(&text).map_err(|e| {
            Error::InvalidInput(format!("Invalid config {}: {e}", path.display()))
        })
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| Error::Io(std::io::Error::other(e)))?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Check the values and derive the engine's runtime options.
    pub fn scan_options(&self) -> Result<ScanOptions> {
        if self.root.is_empty() {
            return Err(Error::InvalidInput("root path is empty".to_string()));
        }
        if self.output.is_empty() || self.error_log.is_empty() {
            return Err(Error::InvalidInput(
                "output and error log targets must be set".to_string(),
            ));
        }
        if self.output == self.error_log {
            return Err(Error::InvalidInput(
                "output and error log must be different files".to_string(),
            ));
        }

        Ok(ScanOptions {
            min_size_bytes: threshold_bytes(self.min_size_mb)?,
            schema: self.schema,
            progress_every_files: self.progress_every_files,
            progress_every_dirs: self.progress_every_dirs,
            progress_notifier: None,
        })
    }
}
