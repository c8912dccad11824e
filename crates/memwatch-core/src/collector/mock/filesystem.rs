//! In-memory mock filesystem for testing readers without real `/proc`.

use crate::collector::traits::FileSystem;
use std::collections::{HashMap, HashSet};
use std::io::{self, BufRead, BufReader, Cursor, Read};
use std::path::{Path, PathBuf};

/// In-memory filesystem for testing.
///
/// Stores file contents in memory so tests can simulate `/proc` states,
/// including files that exist but cannot be opened.
#[derive(Debug, Clone, Default)]
pub struct MockFs {
    /// Map from path to file contents.
    files: HashMap<PathBuf, Vec<u8>>,
    /// Paths that fail to open with `PermissionDenied`.
    unreadable: HashSet<PathBuf>,
    /// Paths whose reads fail after the stored prefix has been consumed.
    failing: HashMap<PathBuf, Vec<u8>>,
}

/// Reader that always fails, appended after a failing file's prefix.
struct BrokenRead;

impl Read for BrokenRead {
    fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
        Err(io::Error::other("simulated read failure"))
    }
}

impl MockFs {
    /// Creates a new empty mock filesystem.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a file with the given content, replacing any previous content.
    pub fn add_file(&mut self, path: impl AsRef<Path>, content: impl Into<String>) {
        self.add_bytes(path, content.into().into_bytes());
    }

    /// Adds a file with raw content that need not be valid UTF-8.
    pub fn add_bytes(&mut self, path: impl AsRef<Path>, content: impl Into<Vec<u8>>) {
        let path = path.as_ref().to_path_buf();
        self.unreadable.remove(&path);
        self.failing.remove(&path);
        self.files.insert(path, content.into());
    }

    /// Adds a file that opens fine, yields `prefix` and then fails with an
    /// I/O error, as when a read races with the source going away.
    pub fn add_failing(&mut self, path: impl AsRef<Path>, prefix: impl Into<Vec<u8>>) {
        let path = path.as_ref().to_path_buf();
        self.files.remove(&path);
        self.failing.insert(path, prefix.into());
    }

    /// Marks a path as present but unreadable (e.g. another user's process).
    pub fn add_unreadable(&mut self, path: impl AsRef<Path>) {
        self.unreadable.insert(path.as_ref().to_path_buf());
    }

    /// Removes a file, as when a process exits between samples.
    pub fn remove_file(&mut self, path: impl AsRef<Path>) {
        self.files.remove(path.as_ref());
        self.failing.remove(path.as_ref());
    }

    /// Adds `/proc/[pid]/status` for a process.
    pub fn add_process(&mut self, pid: u32, status: &str) {
        self.add_file(format!("/proc/{}/status", pid), status);
    }
}

impl FileSystem for MockFs {
    fn open(&self, path: &Path) -> io::Result<Box<dyn BufRead + '_>> {
        if self.unreadable.contains(path) {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                format!("permission denied: {:?}", path),
            ));
        }
        if let Some(prefix) = self.failing.get(path) {
            let reader = Cursor::new(prefix.as_slice()).chain(BrokenRead);
            return Ok(Box::new(BufReader::new(reader)));
        }

        let content = self.files.get(path).ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("file not found: {:?}", path),
            )
        })?;
        Ok(Box::new(Cursor::new(content.as_slice())))
    }
}
