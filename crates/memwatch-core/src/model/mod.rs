//! Data model shared by readers, deriver and sinks.

mod dimensions;
mod snapshot;
mod target;

pub use dimensions::{Dimension, DimensionSet, InstanceIdentity};
pub use snapshot::{Sample, Snapshot};
pub use target::{ProcessTarget, TargetParseError};
