//! Size threshold filtering and per-file metadata extraction

use crate::models::Timestamp;
use crate::{Error, Result};
use chrono::{DateTime, Local};
use std::fs::Metadata;
use std::io;

/// Bytes per megabyte used when converting the configured threshold.
pub const BYTES_PER_MB: u64 = 1024 * 1024;

/// Extension reported for files whose name carries none.
pub const NO_EXTENSION: &str = "no-extension";

/// A file is kept iff its size reaches the threshold. A zero threshold keeps everything.
#[must_use]
pub fn should_keep(file_size: u64, threshold_bytes: u64) -> bool {
    file_size >= threshold_bytes
}

/// Convert a megabyte threshold to bytes, rounding up to the next whole byte.
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
pub fn threshold_bytes(min_size_mb: f64) -> Result<u64> {
    if !min_size_mb.is_finite() || min_size_mb < 0.0 {
        return Err(Error::InvalidInput(format!(
            "minimum size must be a non-negative number of megabytes, got {min_size_mb}"
        )));
    }

    let bytes = (min_size_mb * BYTES_PER_MB as f64).ceil();
    if bytes >= u64::MAX as f64 {
        Ok(u64::MAX)
    } else {
        Ok(bytes as u64)
    }
}

/// Extension of a file name: the text after the last `.`, without the dot, case preserved.
///
/// Dotfiles such as `.bashrc`, names ending in a dot and names without any dot
/// all report [`NO_EXTENSION`].
#[must_use]
pub fn extract_extension(name: &str) -> String {
    let stem_start = name.len() - name.trim_start_matches('.').len();
    let rest = &name[stem_start..];

    match rest.rfind('.') {
        Some(idx) if idx + 1 < rest.len() => rest[idx + 1..].to_string(),
        _ => NO_EXTENSION.to_string(),
    }
}

/// Creation and modification times read independently from one metadata result.
#[derive(Debug)]
pub struct Timestamps {
    pub created: Timestamp,
    pub modified: Timestamp,
    /// One entry per timestamp that could not be read, labelled with which one.
    pub failures: Vec<(&'static str, io::Error)>,
}

/// Read both timestamps; a failure on one leaves the other untouched.
#[must_use]
pub fn extract_timestamps(metadata: &Metadata) -> Timestamps {
    let mut failures = Vec::new();

    let created = match metadata.created() {
        Ok(at) => Timestamp::At(DateTime::<Local>::from(at)),
        Err(err) => {
            failures.push(("creation time", err));
            Timestamp::Unavailable
        }
    };

    let modified = match metadata.modified() {
        Ok(at) => Timestamp::At(DateTime::<Local>::from(at)),
        Err(err) => {
            failures.push(("modification time", err));
            Timestamp::Unavailable
        }
    };

    Timestamps {
        created,
        modified,
        failures,
    }
}
