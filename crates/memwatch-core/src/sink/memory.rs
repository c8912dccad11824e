//! In-memory sink for tests and dry runs.

use super::{MetricsSink, SinkError};
use crate::metrics::MetricDatum;
use crate::model::DimensionSet;

/// A batch as it was handed to the sink.
#[derive(Debug, Clone, PartialEq)]
pub struct PublishedBatch {
    pub namespace: String,
    pub dimensions: DimensionSet,
    pub data: Vec<MetricDatum>,
}

/// Records every published batch.
///
/// Can be told to reject a given call to simulate a backend outage.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    batches: Vec<PublishedBatch>,
    calls: usize,
    /// 1-based call number that fails.
    fail_on_call: Option<usize>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the `call`-th publish (1-based) fail with [`SinkError::Rejected`].
    pub fn failing_on_call(call: usize) -> Self {
        Self {
            fail_on_call: Some(call),
            ..Self::default()
        }
    }

    pub fn batches(&self) -> &[PublishedBatch] {
        &self.batches
    }

    /// Number of publish calls, including rejected ones.
    pub fn calls(&self) -> usize {
        self.calls
    }

    /// Batches published under `namespace`.
    pub fn in_namespace<'a>(
        &'a self,
        namespace: &'a str,
    ) -> impl Iterator<Item = &'a PublishedBatch> {
        self.batches.iter().filter(move |b| b.namespace == namespace)
    }
}

impl MetricsSink for MemorySink {
    fn publish(
        &mut self,
        namespace: &str,
        dimensions: &DimensionSet,
        data: &[MetricDatum],
    ) -> Result<(), SinkError> {
        self.calls += 1;
        if self.fail_on_call == Some(self.calls) {
            return Err(SinkError::Rejected(format!(
                "simulated failure on call {}",
                self.calls
            )));
        }

        self.batches.push(PublishedBatch {
            namespace: namespace.to_string(),
            dimensions: dimensions.clone(),
            data: data.to_vec(),
        });
        Ok(())
    }
}
