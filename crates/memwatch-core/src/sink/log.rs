//! Sink that reports batches through `tracing` instead of a backend.

use tracing::info;

use super::{MetricsSink, SinkError};
use crate::metrics::{MetricDatum, Unit};
use crate::model::DimensionSet;

/// Logs every batch at info level. Never fails.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl LogSink {
    pub fn new() -> Self {
        Self
    }
}

/// Renders a batch as `name=value unit` pairs.
pub(crate) fn describe_batch(data: &[MetricDatum]) -> String {
    data.iter()
        .map(|d| match d.unit {
            Unit::Percent => format!("{}={:.2}%", d.name, d.value),
            Unit::Kilobytes => format!("{}={}kB", d.name, d.value),
        })
        .collect::<Vec<_>>()
        .join(", ")
}

impl MetricsSink for LogSink {
    fn publish(
        &mut self,
        namespace: &str,
        dimensions: &DimensionSet,
        data: &[MetricDatum],
    ) -> Result<(), SinkError> {
        info!("[{}] {{{}}} {}", namespace, dimensions, describe_batch(data));
        Ok(())
    }
}
