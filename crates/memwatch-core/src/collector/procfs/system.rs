//! Host memory reader for `/proc/meminfo`.

use std::path::Path;

use chrono::Utc;
use tracing::{debug, warn};

use crate::collector::procfs::parser::{lossy_lines, parse_line};
use crate::collector::procfs::process::CollectError;
use crate::collector::traits::FileSystem;
use crate::model::Snapshot;

pub const MEM_TOTAL: &str = "MemTotal";
pub const MEM_FREE: &str = "MemFree";
pub const MEM_AVAILABLE: &str = "MemAvailable";
pub const BUFFERS: &str = "Buffers";
pub const CACHED: &str = "Cached";

/// Counters kept from `/proc/meminfo`.
pub const MEMINFO_COUNTERS: [&str; 5] = [MEM_TOTAL, MEM_FREE, MEM_AVAILABLE, BUFFERS, CACHED];

/// Number of leading `/proc/meminfo` lines that are scanned.
///
/// Since Linux 3.14 the file starts with MemTotal, MemFree, MemAvailable,
/// Buffers and Cached, in that order. The rest of the file (dozens of lines)
/// is never read. On a kernel with a different layout, counters that fall
/// outside this window are simply missing from the snapshot.
pub const MEMINFO_SCAN_LINES: usize = 5;

/// Reads whole-system memory counters.
pub struct MemInfoReader<F: FileSystem> {
    fs: F,
    proc_path: String,
}

impl<F: FileSystem> MemInfoReader<F> {
    /// Creates a new host memory reader.
    ///
    /// # Arguments
    /// * `fs` - Filesystem implementation (real or mock)
    /// * `proc_path` - Base path to proc filesystem (usually "/proc")
    pub fn new(fs: F, proc_path: impl Into<String>) -> Self {
        Self {
            fs,
            proc_path: proc_path.into(),
        }
    }

    pub fn meminfo_path(&self) -> String {
        format!("{}/meminfo", self.proc_path)
    }

    /// Reads a snapshot of the host memory counters.
    ///
    /// Unparseable lines are logged and skipped.
    ///
    /// # Errors
    /// [`CollectError::SourceUnavailable`] if `/proc/meminfo` cannot be
    /// opened, [`CollectError::Read`] if reading it fails.
    pub fn read(&self) -> Result<Snapshot, CollectError> {
        let path = self.meminfo_path();
        let reader = self.fs.open(Path::new(&path)).map_err(|e| {
            CollectError::SourceUnavailable {
                path: path.clone(),
                source: e,
            }
        })?;
        let captured_at = Utc::now();

        let mut samples = Vec::with_capacity(MEMINFO_COUNTERS.len());
        for (idx, line) in lossy_lines(reader).take(MEMINFO_SCAN_LINES).enumerate() {
            let line = line.map_err(|e| CollectError::Read {
                path: path.clone(),
                source: e,
            })?;

            match parse_line(&line) {
                Ok(sample) if MEMINFO_COUNTERS.contains(&sample.name.as_str()) => {
                    samples.push(sample)
                }
                Ok(sample) => debug!("{}: ignoring counter {}", path, sample.name),
                Err(e) => warn!("{}:{}: {}", path, idx + 1, e),
            }
        }

        let snapshot = Snapshot::new(captured_at, samples);
        debug!("{} counters from {}", snapshot.len(), path);
        Ok(snapshot)
    }
}
