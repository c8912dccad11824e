//! Counter samples and the snapshots that group them.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

/// A single named counter read from kernel status text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sample {
    pub name: String,
    pub value: u64,
    /// Unit as printed by the kernel (`kB`), if the line carried one.
    pub unit: Option<String>,
}

impl Sample {
    pub fn new(name: impl Into<String>, value: u64, unit: Option<String>) -> Self {
        Self {
            name: name.into(),
            value,
            unit,
        }
    }
}

/// All counters captured from one read of one source.
///
/// A snapshot is built once by a reader and only read afterwards. Missing
/// counters are simply absent; consumers use [`Snapshot::value`] and decide
/// what to do with `None`.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    captured_at: DateTime<Utc>,
    samples: BTreeMap<String, Sample>,
}

impl Snapshot {
    /// Builds a snapshot from parsed samples.
    ///
    /// If the same name shows up more than once, the last sample wins.
    pub fn new(captured_at: DateTime<Utc>, samples: impl IntoIterator<Item = Sample>) -> Self {
        Self {
            captured_at,
            samples: samples.into_iter().map(|s| (s.name.clone(), s)).collect(),
        }
    }

    /// Wall-clock time at which the read began.
    pub fn captured_at(&self) -> DateTime<Utc> {
        self.captured_at
    }

    pub fn get(&self, name: &str) -> Option<&Sample> {
        self.samples.get(name)
    }

    /// Returns the value of a counter, or `None` when it was not captured.
    pub fn value(&self, name: &str) -> Option<u64> {
        self.samples.get(name).map(|s| s.value)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.samples.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Iterates samples in name order.
    pub fn iter(&self) -> impl Iterator<Item = &Sample> {
        self.samples.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kb(name: &str, value: u64) -> Sample {
        Sample::new(name, value, Some("kB".to_string()))
    }

    #[test]
    fn test_snapshot_lookup() {
        let ts = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        let snapshot = Snapshot::new(ts, vec![kb("MemTotal", 1000), kb("MemFree", 200)]);

        assert_eq!(snapshot.captured_at(), ts);
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot.value("MemTotal"), Some(1000));
        assert_eq!(snapshot.get("MemFree").unwrap().unit.as_deref(), Some("kB"));
        assert_eq!(snapshot.value("Cached"), None);
        assert!(!snapshot.contains("Cached"));
    }

    #[test]
    fn test_snapshot_duplicate_name_last_wins() {
        let ts = DateTime::from_timestamp(0, 0).unwrap();
        let snapshot = Snapshot::new(ts, vec![kb("VmRSS", 1), kb("VmRSS", 2)]);

        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot.value("VmRSS"), Some(2));
    }

    #[test]
    fn test_snapshot_iter_is_ordered() {
        let ts = DateTime::from_timestamp(0, 0).unwrap();
        let snapshot = Snapshot::new(ts, vec![kb("VmSize", 5), kb("VmRSS", 3)]);

        let names: Vec<&str> = snapshot.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["VmRSS", "VmSize"]);
        assert!(!snapshot.is_empty());
    }
}
