//! Metric data points and their derivation from raw snapshots.

mod derive;

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

pub use derive::{
    MEM_USED, MEM_USED_PERCENT, VM_RSS_METRIC, derive_host, derive_process, host_mem_total,
};

/// Unit tag carried by every data point.
///
/// Counters stay in the kernel's native kilobytes; nothing is converted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Unit {
    Kilobytes,
    Percent,
}

impl Unit {
    pub fn as_str(&self) -> &'static str {
        match self {
            Unit::Kilobytes => "Kilobytes",
            Unit::Percent => "Percent",
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One named value ready for the metrics backend.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricDatum {
    #[serde(rename = "metric_name")]
    pub name: String,
    pub value: f64,
    pub unit: Unit,
    pub timestamp: DateTime<Utc>,
}

impl MetricDatum {
    pub fn kilobytes(name: impl Into<String>, value: u64, timestamp: DateTime<Utc>) -> Self {
        Self {
            name: name.into(),
            value: value as f64,
            unit: Unit::Kilobytes,
            timestamp,
        }
    }

    pub fn percent(name: impl Into<String>, value: f64, timestamp: DateTime<Utc>) -> Self {
        Self {
            name: name.into(),
            value,
            unit: Unit::Percent,
            timestamp,
        }
    }
}
