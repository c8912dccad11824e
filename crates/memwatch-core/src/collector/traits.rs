//! Abstractions for filesystem access to enable testing and mocking.
//!
//! The `FileSystem` trait allows readers to work with both the real `/proc`
//! filesystem on Linux and in-memory fixtures in tests.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

/// Abstraction for opening text sources.
///
/// Readers scan status files line by line and may stop early, so the trait
/// hands out a buffered reader instead of the whole file contents.
pub trait FileSystem: Send + Sync {
    /// Opens a file for buffered, line-oriented reading.
    ///
    /// # Errors
    /// Returns the underlying I/O error; `NotFound` and `PermissionDenied`
    /// are the kinds callers distinguish.
    fn open(&self, path: &Path) -> io::Result<Box<dyn BufRead + '_>>;
}

/// Real filesystem implementation that delegates to `std::fs`.
#[derive(Debug, Default, Clone, Copy)]
pub struct RealFs;

impl RealFs {
    pub fn new() -> Self {
        Self
    }
}

impl FileSystem for RealFs {
    fn open(&self, path: &Path) -> io::Result<Box<dyn BufRead + '_>> {
        let file = File::open(path)?;
        Ok(Box::new(BufReader::new(file)))
    }
}
