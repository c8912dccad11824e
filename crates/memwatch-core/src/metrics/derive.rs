//! Derived memory metrics.
//!
//! Turns raw snapshots into the data points of one batch. Every value is in
//! the kernel's kilobytes or a percentage; a metric whose inputs are missing
//! is left out of the batch rather than reported as zero.

use crate::collector::procfs::{
    BUFFERS, CACHED, MEM_AVAILABLE, MEM_FREE, MEM_TOTAL, VM_RSS, VM_SIZE,
};
use crate::metrics::MetricDatum;
use crate::model::Snapshot;

/// `MemTotal - MemFree - Buffers - Cached`, in kilobytes.
pub const MEM_USED: &str = "MemUsed";
/// Used memory as a percentage of a total.
pub const MEM_USED_PERCENT: &str = "MemUsedPercent";
/// Emitted name of the resident set size.
pub const VM_RSS_METRIC: &str = "VmRss";

/// Returns the host's total memory if the snapshot established one.
///
/// A missing or zero `MemTotal` yields `None`, which process derivation
/// treats as "no baseline yet".
pub fn host_mem_total(snapshot: &Snapshot) -> Option<u64> {
    snapshot.value(MEM_TOTAL).filter(|total| *total > 0)
}

fn percent(part: u64, whole: u64) -> f64 {
    100.0 * part as f64 / whole as f64
}

/// Builds the host batch from a `/proc/meminfo` snapshot.
///
/// Order: MemTotal, MemFree, MemUsed, MemUsedPercent, MemAvailable.
/// MemUsed needs all four inputs and saturates at zero; MemUsedPercent
/// additionally needs a non-zero total. MemAvailable is passed through as
/// the kernel reports it.
pub fn derive_host(snapshot: &Snapshot) -> Vec<MetricDatum> {
    let ts = snapshot.captured_at();
    let mut data = Vec::with_capacity(5);

    let total = snapshot.value(MEM_TOTAL);
    let free = snapshot.value(MEM_FREE);

    if let Some(total) = total {
        data.push(MetricDatum::kilobytes(MEM_TOTAL, total, ts));
    }
    if let Some(free) = free {
        data.push(MetricDatum::kilobytes(MEM_FREE, free, ts));
    }

    if let (Some(total), Some(free), Some(buffers), Some(cached)) = (
        total,
        free,
        snapshot.value(BUFFERS),
        snapshot.value(CACHED),
    ) {
        let used = total
            .saturating_sub(free)
            .saturating_sub(buffers)
            .saturating_sub(cached);
        data.push(MetricDatum::kilobytes(MEM_USED, used, ts));

        if total > 0 {
            data.push(MetricDatum::percent(
                MEM_USED_PERCENT,
                percent(used, total),
                ts,
            ));
        }
    }

    if let Some(available) = snapshot.value(MEM_AVAILABLE) {
        data.push(MetricDatum::kilobytes(MEM_AVAILABLE, available, ts));
    }

    data
}

/// Builds the batch for one process, with every name prefixed by `label`.
///
/// `<label>MemUsedPercent` is emitted only when `host_total` holds an
/// established host MemTotal; before the first host sample there is no
/// meaningful ratio to report.
pub fn derive_process(
    label: &str,
    snapshot: &Snapshot,
    host_total: Option<u64>,
) -> Vec<MetricDatum> {
    let ts = snapshot.captured_at();
    let mut data = Vec::with_capacity(3);

    if let Some(size) = snapshot.value(VM_SIZE) {
        data.push(MetricDatum::kilobytes(format!("{label}{VM_SIZE}"), size, ts));
    }

    if let Some(rss) = snapshot.value(VM_RSS) {
        data.push(MetricDatum::kilobytes(
            format!("{label}{VM_RSS_METRIC}"),
            rss,
            ts,
        ));

        if let Some(total) = host_total.filter(|t| *t > 0) {
            data.push(MetricDatum::percent(
                format!("{label}{MEM_USED_PERCENT}"),
                percent(rss, total),
                ts,
            ));
        }
    }

    data
}
