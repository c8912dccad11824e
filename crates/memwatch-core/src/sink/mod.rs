//! Destinations for metric batches.
//!
//! The metrics backend is an external collaborator. The engine only needs a
//! blocking call that either accepts a batch or fails; a failure ends the
//! run and recovery is left to whatever supervises the process.

mod json;
mod log;
mod memory;

use std::io;

use crate::metrics::MetricDatum;
use crate::model::DimensionSet;

pub use json::JsonLinesSink;
pub use log::LogSink;
pub use memory::{MemorySink, PublishedBatch};

/// Error type for sink failures. Always fatal to the run.
#[derive(Debug)]
pub enum SinkError {
    /// Writing the batch failed.
    Io(io::Error),
    /// The batch could not be encoded.
    Encode(serde_json::Error),
    /// The backend refused the batch.
    Rejected(String),
}

impl std::fmt::Display for SinkError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SinkError::Io(e) => write!(f, "sink I/O error: {}", e),
            SinkError::Encode(e) => write!(f, "sink encode error: {}", e),
            SinkError::Rejected(msg) => write!(f, "sink rejected batch: {}", msg),
        }
    }
}

impl std::error::Error for SinkError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SinkError::Io(e) => Some(e),
            SinkError::Encode(e) => Some(e),
            SinkError::Rejected(_) => None,
        }
    }
}

impl From<io::Error> for SinkError {
    fn from(e: io::Error) -> Self {
        SinkError::Io(e)
    }
}

impl From<serde_json::Error> for SinkError {
    fn from(e: serde_json::Error) -> Self {
        SinkError::Encode(e)
    }
}

/// A metrics backend accepting one batch per call.
pub trait MetricsSink {
    /// Publishes `data` under `namespace`, tagging every point with
    /// `dimensions`.
    ///
    /// # Errors
    /// Any error means the batch was not delivered.
    fn publish(
        &mut self,
        namespace: &str,
        dimensions: &DimensionSet,
        data: &[MetricDatum],
    ) -> Result<(), SinkError>;
}

impl<S: MetricsSink + ?Sized> MetricsSink for Box<S> {
    fn publish(
        &mut self,
        namespace: &str,
        dimensions: &DimensionSet,
        data: &[MetricDatum],
    ) -> Result<(), SinkError> {
        (**self).publish(namespace, dimensions, data)
    }
}
