//! JSON Lines sink.
//!
//! Writes one JSON document per batch, shaped like a put-metric-data
//! request, so the output can be piped into a shipper for the real backend:
//!
//! ```text
//! {"namespace":"System/Linux","metric_data":[{"metric_name":"MemTotal","value":16384000.0,
//!  "unit":"Kilobytes","timestamp":"2024-01-01T00:00:00Z","dimensions":[...]}]}
//! ```

use std::io::Write;

use serde::Serialize;

use super::{MetricsSink, SinkError};
use crate::metrics::MetricDatum;
use crate::model::DimensionSet;

#[derive(Serialize)]
struct DatumRecord<'a> {
    #[serde(flatten)]
    datum: &'a MetricDatum,
    dimensions: &'a DimensionSet,
}

#[derive(Serialize)]
struct BatchRecord<'a> {
    namespace: &'a str,
    metric_data: Vec<DatumRecord<'a>>,
}

/// Writes batches as JSON lines to any writer.
pub struct JsonLinesSink<W: Write> {
    writer: W,
}

impl<W: Write> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> MetricsSink for JsonLinesSink<W> {
    fn publish(
        &mut self,
        namespace: &str,
        dimensions: &DimensionSet,
        data: &[MetricDatum],
    ) -> Result<(), SinkError> {
        let record = BatchRecord {
            namespace,
            metric_data: data
                .iter()
                .map(|datum| DatumRecord { datum, dimensions })
                .collect(),
        };

        serde_json::to_writer(&mut self.writer, &record)?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;
    use serde_json::Value;
    use std::io;

    fn dims() -> DimensionSet {
        let mut d = DimensionSet::new();
        d.insert("InstanceID", "i-0123");
        d
    }

    #[test]
    fn test_json_lines_shape() {
        let ts = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        let data = vec![
            MetricDatum::kilobytes("MemTotal", 1000, ts),
            MetricDatum::percent("MemUsedPercent", 70.0, ts),
        ];

        let mut sink = JsonLinesSink::new(Vec::new());
        sink.publish("System/Linux", &dims(), &data).unwrap();
        sink.publish("System/Linux", &dims(), &data[..1]).unwrap();

        let out = String::from_utf8(sink.into_inner()).unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 2);

        let batch: Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(batch["namespace"], "System/Linux");
        let first = &batch["metric_data"][0];
        assert_eq!(first["metric_name"], "MemTotal");
        assert_eq!(first["value"], 1000.0);
        assert_eq!(first["unit"], "Kilobytes");
        assert_eq!(first["timestamp"], "2023-11-14T22:13:20Z");
        assert_eq!(first["dimensions"][0]["name"], "InstanceID");
        assert_eq!(first["dimensions"][0]["value"], "i-0123");
        assert_eq!(batch["metric_data"][1]["unit"], "Percent");
    }

    #[test]
    fn test_json_lines_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("metrics.jsonl");
        let file = std::fs::File::create(&path).unwrap();

        let ts = DateTime::from_timestamp(0, 0).unwrap();
        let mut sink = JsonLinesSink::new(file);
        let data = [MetricDatum::kilobytes("webVmRss", 5, ts)];
        sink.publish("System/Nodejs", &DimensionSet::new(), &data).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("\"webVmRss\""));
        assert!(content.ends_with('\n'));
    }

    struct BrokenPipe;

    impl Write for BrokenPipe {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_json_lines_write_failure() {
        let ts = DateTime::from_timestamp(0, 0).unwrap();
        let mut sink = JsonLinesSink::new(BrokenPipe);

        let err = sink
            .publish("System/Linux", &dims(), &[MetricDatum::kilobytes("MemTotal", 1, ts)])
            .unwrap_err();
        // serde_json wraps writer errors in its own error type
        assert!(matches!(err, SinkError::Encode(_) | SinkError::Io(_)));
    }
}
