//! Per-process memory reader for `/proc/[pid]/status`.

use std::io;
use std::path::Path;

use chrono::Utc;
use tracing::{debug, warn};

use crate::collector::procfs::parser::{counter_name, lossy_lines, parse_line};
use crate::collector::traits::FileSystem;
use crate::model::Snapshot;

/// Virtual memory size of the process.
pub const VM_SIZE: &str = "VmSize";
/// Resident set size of the process.
pub const VM_RSS: &str = "VmRSS";

/// Counters kept from a process status file. Every other line is skipped
/// without being parsed.
pub const STATUS_COUNTERS: [&str; 2] = [VM_SIZE, VM_RSS];

/// Error type for collection failures.
///
/// All variants are fatal to the collector: without its sources it has
/// nothing to report.
#[derive(Debug)]
pub enum CollectError {
    /// A status source exists but could not be opened.
    SourceUnavailable { path: String, source: io::Error },
    /// The process status file does not exist; the process has exited.
    ProcessGone(u32),
    /// The source was opened but reading it failed.
    Read { path: String, source: io::Error },
}

impl std::fmt::Display for CollectError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CollectError::SourceUnavailable { path, source } => {
                write!(f, "cannot open {}: {}", path, source)
            }
            CollectError::ProcessGone(pid) => write!(f, "process {} disappeared", pid),
            CollectError::Read { path, source } => write!(f, "error reading {}: {}", path, source),
        }
    }
}

impl std::error::Error for CollectError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CollectError::SourceUnavailable { source, .. } | CollectError::Read { source, .. } => {
                Some(source)
            }
            CollectError::ProcessGone(_) => None,
        }
    }
}

/// Reads VmSize and VmRSS of a single process.
pub struct ProcMemInfoReader<F: FileSystem> {
    fs: F,
    proc_path: String,
}

impl<F: FileSystem> ProcMemInfoReader<F> {
    /// Creates a new process reader.
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

    /// Path of the status file for `pid`.
    pub fn status_path(&self, pid: u32) -> String {
        format!("{}/{}/status", self.proc_path, pid)
    }

    /// Reads a snapshot of the process's memory counters.
    ///
    /// The whole file is scanned, but only lines whose counter name is in
    /// [`STATUS_COUNTERS`] are parsed. A counter that is missing (kernel
    /// threads have no `Vm*` lines) leaves a hole in the snapshot.
    ///
    /// # Errors
    /// [`CollectError::ProcessGone`] if the status file does not exist,
    /// [`CollectError::SourceUnavailable`] for any other open failure.
    pub fn read(&self, pid: u32) -> Result<Snapshot, CollectError> {
        let path = self.status_path(pid);
        let reader = self.fs.open(Path::new(&path)).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => CollectError::ProcessGone(pid),
            _ => CollectError::SourceUnavailable {
                path: path.clone(),
                source: e,
            },
        })?;
        let captured_at = Utc::now();

        let mut samples = Vec::with_capacity(STATUS_COUNTERS.len());
        for (idx, line) in lossy_lines(reader).enumerate() {
            let line = line.map_err(|e| CollectError::Read {
                path: path.clone(),
                source: e,
            })?;

            if !counter_name(&line).is_some_and(|name| STATUS_COUNTERS.contains(&name)) {
                continue;
            }

            match parse_line(&line) {
                Ok(sample) => samples.push(sample),
                Err(e) => warn!("{}:{}: {}", path, idx + 1, e),
            }
        }

        let snapshot = Snapshot::new(captured_at, samples);
        debug!("pid {}: {} counters from {}", pid, snapshot.len(), path);
        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::mock::MockFs;

    #[test]
    fn test_read_process() {
        let fs = MockFs::typical_system();
        let reader = ProcMemInfoReader::new(fs, "/proc");

        let snapshot = reader.read(1000).unwrap();

        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot.value(VM_SIZE), Some(1100000));
        assert_eq!(snapshot.value(VM_RSS), Some(250000));
        assert_eq!(snapshot.get(VM_RSS).unwrap().unit.as_deref(), Some("kB"));
        // Lookalike counters are not picked up
        assert!(!snapshot.contains("VmPeak"));
        assert!(!snapshot.contains("RssAnon"));
    }

    #[test]
    fn test_read_kernel_thread_has_holes() {
        let fs = MockFs::typical_system();
        let reader = ProcMemInfoReader::new(fs, "/proc");

        let snapshot = reader.read(2).unwrap();
        assert!(snapshot.is_empty());
    }

    #[test]
    fn test_name_must_match_exactly() {
        let mut fs = MockFs::new();
        fs.add_process(7, "VmRSSx:\t10 kB\nVmRSS:\t20 kB\nVmSizeBig:\t30 kB\n");
        let reader = ProcMemInfoReader::new(fs, "/proc");

        let snapshot = reader.read(7).unwrap();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot.value(VM_RSS), Some(20));
    }

    #[test]
    fn test_bad_counter_line_is_skipped() {
        let mut fs = MockFs::new();
        fs.add_process(8, "VmSize:\tlots kB\nVmRSS:\t20 kB\n");
        let reader = ProcMemInfoReader::new(fs, "/proc");

        let snapshot = reader.read(8).unwrap();
        assert_eq!(snapshot.value(VM_SIZE), None);
        assert_eq!(snapshot.value(VM_RSS), Some(20));
    }

    #[test]
    fn test_process_gone() {
        let fs = MockFs::typical_system();
        let reader = ProcMemInfoReader::new(fs, "/proc");

        let result = reader.read(9999);
        assert!(matches!(result, Err(CollectError::ProcessGone(9999))));
    }

    #[test]
    fn test_permission_denied() {
        let mut fs = MockFs::typical_system();
        fs.add_unreadable("/proc/1000/status");
        let reader = ProcMemInfoReader::new(fs, "/proc");

        match reader.read(1000) {
            Err(CollectError::SourceUnavailable { path, source }) => {
                assert_eq!(path, "/proc/1000/status");
                assert_eq!(source.kind(), io::ErrorKind::PermissionDenied);
            }
            other => panic!("expected SourceUnavailable, got {:?}", other),
        }
    }

    #[test]
    fn test_truncated_multibyte_name_is_tolerated() {
        // comm cut at 15 bytes in the middle of a UTF-8 sequence
        let mut fs = MockFs::new();
        fs.add_bytes(
            "/proc/1/status",
            &b"Name:\tnode-\xe6\x97\nVmSize:\t1000 kB\nVmRSS:\t250 kB\n"[..],
        );
        let reader = ProcMemInfoReader::new(fs, "/proc");

        let snapshot = reader.read(1).unwrap();
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot.value(VM_SIZE), Some(1000));
        assert_eq!(snapshot.value(VM_RSS), Some(250));
    }

    #[test]
    fn test_read_failure_mid_scan() {
        let mut fs = MockFs::new();
        fs.add_failing("/proc/3/status", "Name:\tnode\nVmSize:\t1000 kB\n");
        let reader = ProcMemInfoReader::new(fs, "/proc");

        match reader.read(3) {
            Err(CollectError::Read { path, source }) => {
                assert_eq!(path, "/proc/3/status");
                assert_eq!(source.kind(), io::ErrorKind::Other);
            }
            other => panic!("expected Read, got {:?}", other),
        }
    }

    #[test]
    fn test_custom_proc_path() {
        let mut fs = MockFs::new();
        fs.add_file("/host/proc/42/status", "VmRSS:\t5 kB\n");
        let reader = ProcMemInfoReader::new(fs, "/host/proc");

        assert_eq!(reader.status_path(42), "/host/proc/42/status");
        assert_eq!(reader.read(42).unwrap().value(VM_RSS), Some(5));
    }
}
