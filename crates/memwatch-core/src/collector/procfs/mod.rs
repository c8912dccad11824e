//! Readers for the Linux `/proc` filesystem.
//!
//! This module provides the line parser and the two readers that turn
//! `/proc/meminfo` and `/proc/[pid]/status` into snapshots.

pub mod parser;
pub mod process;
pub mod system;

pub use parser::{ParseError, parse_line};
pub use process::{CollectError, ProcMemInfoReader, STATUS_COUNTERS, VM_RSS, VM_SIZE};
pub use system::{
    BUFFERS, CACHED, MEM_AVAILABLE, MEM_FREE, MEM_TOTAL, MEMINFO_COUNTERS, MEMINFO_SCAN_LINES,
    MemInfoReader,
};
