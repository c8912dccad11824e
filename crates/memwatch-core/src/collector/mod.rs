//! Memory counter collection from the Linux `/proc` filesystem.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │  ┌──────────────────────┐  ┌──────────────────────┐  │
//! │  │  ProcMemInfoReader   │  │    MemInfoReader     │  │
//! │  │  - /proc/[pid]/status│  │  - /proc/meminfo     │  │
//! │  └──────────┬───────────┘  └───────────┬──────────┘  │
//! │             └─────────────┬────────────┘             │
//! │                    ┌──────▼──────┐                   │
//! │                    │ parse_line  │                   │
//! │                    └──────┬──────┘                   │
//! │                    ┌──────▼──────┐                   │
//! │                    │  FileSystem │ (trait)           │
//! │                    └──────┬──────┘                   │
//! └───────────────────────────┼──────────────────────────┘
//!                  ┌──────────┴──────────┐
//!           ┌──────▼──────┐       ┌──────▼──────┐
//!           │   RealFs    │       │   MockFs    │
//!           │  (Linux)    │       │  (Testing)  │
//!           └─────────────┘       └─────────────┘
//! ```
//!
//! # Usage
//!
//! ```
//! use memwatch_core::collector::{MemInfoReader, MockFs};
//!
//! let fs = MockFs::minimal_host();
//! let reader = MemInfoReader::new(fs, "/proc");
//! let snapshot = reader.read().unwrap();
//! assert_eq!(snapshot.value("MemTotal"), Some(1000));
//! ```

pub mod mock;
pub mod procfs;
pub mod traits;

pub use mock::MockFs;
pub use procfs::{CollectError, MemInfoReader, ParseError, ProcMemInfoReader};
pub use traits::{FileSystem, RealFs};
