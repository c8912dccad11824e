//! The sampling loop.
//!
//! One thread, no concurrency: each wake services exactly one cadence,
//! reading the source, deriving the batch and publishing it inline. The
//! host MemTotal is a plain field written by the host branch and read by
//! the process branch.

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::collector::procfs::{CollectError, MemInfoReader, ProcMemInfoReader};
use crate::collector::traits::FileSystem;
use crate::metrics::{MetricDatum, derive_host, derive_process, host_mem_total};
use crate::model::{DimensionSet, ProcessTarget};
use crate::scheduler::clock::Clock;
use crate::scheduler::schedule::{Cadence, Schedule, ScheduleError};
use crate::sink::{MetricsSink, SinkError};

/// Default namespace for host metrics.
pub const HOST_NAMESPACE: &str = "System/Linux";
/// Default namespace for per-process metrics.
pub const PROCESS_NAMESPACE: &str = "System/Nodejs";

/// Error type for a failed run. Every variant ends the run.
#[derive(Debug)]
pub enum EngineError {
    Collect(CollectError),
    Sink(SinkError),
    Schedule(ScheduleError),
}

impl std::fmt::Display for EngineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineError::Collect(e) => write!(f, "collection failed: {}", e),
            EngineError::Sink(e) => write!(f, "publishing failed: {}", e),
            EngineError::Schedule(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for EngineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            EngineError::Collect(e) => Some(e),
            EngineError::Sink(e) => Some(e),
            EngineError::Schedule(e) => Some(e),
        }
    }
}

impl From<CollectError> for EngineError {
    fn from(e: CollectError) -> Self {
        EngineError::Collect(e)
    }
}

impl From<SinkError> for EngineError {
    fn from(e: SinkError) -> Self {
        EngineError::Sink(e)
    }
}

impl From<ScheduleError> for EngineError {
    fn from(e: ScheduleError) -> Self {
        EngineError::Schedule(e)
    }
}

/// Which namespace a batch is published under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BatchKind {
    Host,
    Process,
}

/// Counters describing a finished run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Host samples taken, including the priming one.
    pub host_samples: u64,
    /// Individual process samples taken.
    pub process_samples: u64,
    /// Batches handed to the sink.
    pub batches: u64,
}

/// Drives the readers, the deriver and the sink on an epoch-aligned schedule.
pub struct Engine<F: FileSystem + Clone, S: MetricsSink, C: Clock> {
    host_reader: MemInfoReader<F>,
    process_reader: ProcMemInfoReader<F>,
    sink: S,
    clock: C,
    schedule: Schedule,
    targets: Vec<ProcessTarget>,
    dimensions: DimensionSet,
    host_namespace: String,
    process_namespace: String,
    /// Latest host MemTotal; `None` until a host sample establishes it.
    mem_total: Option<u64>,
    /// Last boundary the loop woke for.
    serviced: Option<DateTime<Utc>>,
    summary: RunSummary,
}

impl<F: FileSystem + Clone, S: MetricsSink, C: Clock> Engine<F, S, C> {
    /// Creates an engine with no targets, no dimensions and default
    /// namespaces.
    ///
    /// # Arguments
    /// * `fs` - Filesystem implementation (real or mock)
    /// * `proc_path` - Base path to proc filesystem (usually "/proc")
    /// * `sink` - Destination for metric batches
    /// * `clock` - Time source driving the schedule
    /// * `schedule` - Cadence periods
    pub fn new(fs: F, proc_path: impl Into<String>, sink: S, clock: C, schedule: Schedule) -> Self {
        let proc_path = proc_path.into();
        Self {
            host_reader: MemInfoReader::new(fs.clone(), proc_path.clone()),
            process_reader: ProcMemInfoReader::new(fs, proc_path),
            sink,
            clock,
            schedule,
            targets: Vec::new(),
            dimensions: DimensionSet::new(),
            host_namespace: HOST_NAMESPACE.to_string(),
            process_namespace: PROCESS_NAMESPACE.to_string(),
            mem_total: None,
            serviced: None,
            summary: RunSummary::default(),
        }
    }

    /// Sets the processes sampled on the process cadence.
    pub fn with_targets(mut self, targets: Vec<ProcessTarget>) -> Self {
        self.targets = targets;
        self
    }

    /// Sets the dimensions attached to every batch.
    pub fn with_dimensions(mut self, dimensions: DimensionSet) -> Self {
        self.dimensions = dimensions;
        self
    }

    /// Overrides the host and process namespaces.
    pub fn with_namespaces(mut self, host: impl Into<String>, process: impl Into<String>) -> Self {
        self.host_namespace = host.into();
        self.process_namespace = process.into();
        self
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn mem_total(&self) -> Option<u64> {
        self.mem_total
    }

    pub fn summary(&self) -> RunSummary {
        self.summary
    }

    /// Reads every target once without publishing anything.
    ///
    /// # Errors
    /// The first target whose status file cannot be opened.
    pub fn verify_targets(&self) -> Result<(), CollectError> {
        for target in &self.targets {
            let snapshot = self.process_reader.read(target.pid())?;
            debug!("target {} ok ({} counters)", target, snapshot.len());
        }
        Ok(())
    }

    /// Hands a non-empty batch to the sink under its namespace.
    fn publish(&mut self, kind: BatchKind, data: &[MetricDatum]) -> Result<(), SinkError> {
        if data.is_empty() {
            return Ok(());
        }
        let namespace = match kind {
            BatchKind::Host => &self.host_namespace,
            BatchKind::Process => &self.process_namespace,
        };
        self.sink.publish(namespace, &self.dimensions, data)?;
        self.summary.batches += 1;
        debug!("published {} points to {}", data.len(), namespace);
        Ok(())
    }

    /// Samples the host, refreshes the MemTotal baseline and publishes the
    /// host batch.
    pub fn sample_host(&mut self) -> Result<(), EngineError> {
        let snapshot = self.host_reader.read()?;
        self.mem_total = host_mem_total(&snapshot);
        self.summary.host_samples += 1;

        let data = derive_host(&snapshot);
        self.publish(BatchKind::Host, &data)?;
        Ok(())
    }

    /// Samples one process and publishes its batch.
    pub fn sample_process(&mut self, target: &ProcessTarget) -> Result<(), EngineError> {
        let snapshot = self.process_reader.read(target.pid())?;
        self.summary.process_samples += 1;

        let data = derive_process(target.label(), &snapshot, self.mem_total);
        self.publish(BatchKind::Process, &data)?;
        Ok(())
    }

    /// Samples every configured process, in configuration order.
    pub fn sample_processes(&mut self) -> Result<(), EngineError> {
        let targets = self.targets.clone();
        for target in &targets {
            self.sample_process(target)?;
        }
        Ok(())
    }

    /// Runs until the cutoff boundary.
    ///
    /// Takes one host sample immediately so the first process samples already
    /// have a MemTotal baseline, then loops: find the nearest deadline, sleep
    /// until it, service that one cadence.
    ///
    /// # Errors
    /// The first collection or sink failure; the run stops there.
    pub fn run(&mut self) -> Result<RunSummary, EngineError> {
        info!(
            "Starting sampling loop: {} targets, process every {:?}, host every {:?}, cutoff {:?}",
            self.targets.len(),
            self.schedule.period(Cadence::Process),
            self.schedule.period(Cadence::Host),
            self.schedule.period(Cadence::Cutoff),
        );

        self.sample_host()?;

        loop {
            let wake = self.schedule.next_wake_after(self.clock.now(), self.serviced);
            self.clock.sleep(wake.delay);
            self.serviced = Some(wake.at);

            match wake.cadence {
                Cadence::Cutoff => break,
                Cadence::Host => self.sample_host()?,
                Cadence::Process => self.sample_processes()?,
            }
        }

        info!(
            "Runtime over: {} host samples, {} process samples, {} batches",
            self.summary.host_samples, self.summary.process_samples, self.summary.batches
        );
        Ok(self.summary)
    }
}
