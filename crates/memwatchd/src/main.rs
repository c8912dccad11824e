//! memwatchd - memory telemetry collector.
//!
//! Samples host memory from /proc/meminfo and selected processes from
//! /proc/[pid]/status on epoch-aligned cadences and publishes the metrics.
//! The run ends at the next minute boundary; an external supervisor (cron,
//! systemd timer) is expected to start it again.

use std::error::Error;
use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};
use std::process;
use std::time::Duration;

use clap::{Parser, ValueEnum};
use tracing::{Level, debug, error, info};
use tracing_subscriber::EnvFilter;

use memwatch_core::collector::RealFs;
use memwatch_core::model::{Dimension, DimensionSet, InstanceIdentity, ProcessTarget};
use memwatch_core::scheduler::{
    Engine, EngineError, HOST_NAMESPACE, PROCESS_NAMESPACE, Schedule, SystemClock,
};
use memwatch_core::sink::{JsonLinesSink, LogSink, MetricsSink};

/// Where metric batches go.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum SinkKind {
    /// Log every batch.
    Log,
    /// One JSON document per batch (stdout or --output).
    Json,
}

/// Memory telemetry collector.
#[derive(Parser)]
#[command(
    name = "memwatchd",
    about = "Memory telemetry collector",
    version = memwatch_core::VERSION
)]
struct Args {
    /// Processes to sample, as LABEL=PID. Comma-separated, may be repeated.
    #[arg(short = 'p', long = "pids", value_name = "LABEL=PID", value_delimiter = ',')]
    pids: Vec<ProcessTarget>,

    /// Extra dimension attached to every metric. May be repeated.
    #[arg(short = 'd', long = "dimension", value_name = "KEY=VALUE")]
    dimensions: Vec<Dimension>,

    /// Instance identity document (JSON) providing InstanceID, InstanceType
    /// and ImageID dimensions.
    #[arg(long, value_name = "PATH", env = "MEMWATCH_IDENTITY_DOCUMENT")]
    identity_document: Option<PathBuf>,

    /// Metrics destination.
    #[arg(long, value_enum, default_value_t = SinkKind::Log)]
    sink: SinkKind,

    /// File to append JSON batches to (json sink). Defaults to stdout.
    #[arg(long, value_name = "PATH")]
    output: Option<PathBuf>,

    /// Namespace for host metrics.
    #[arg(long, default_value = HOST_NAMESPACE)]
    host_namespace: String,

    /// Namespace for process metrics.
    #[arg(long, default_value = PROCESS_NAMESPACE)]
    process_namespace: String,

    /// Path to /proc filesystem.
    #[arg(long, default_value = "/proc", env = "MEMWATCH_PROC_PATH")]
    proc_path: String,

    /// Process sampling period in seconds.
    #[arg(long, default_value = "5", value_parser = clap::value_parser!(u64).range(1..))]
    process_interval: u64,

    /// Host sampling period in seconds.
    #[arg(long, default_value = "15", value_parser = clap::value_parser!(u64).range(1..))]
    host_interval: u64,

    /// Run until the next multiple of this many seconds, then exit.
    #[arg(long, default_value = "60", value_parser = clap::value_parser!(u64).range(1..))]
    run_for: u64,

    /// Increase logging verbosity (-v for debug, -vv for trace). Default is info level.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Quiet mode - only show errors.
    #[arg(short, long)]
    quiet: bool,
}

/// Initializes the tracing subscriber with the appropriate log level.
/// Logs go to stderr so stdout stays free for the json sink.
fn init_logging(verbose: u8, quiet: bool) {
    let level = if quiet {
        Level::ERROR
    } else {
        match verbose {
            0 => Level::INFO,
            1 => Level::DEBUG,
            _ => Level::TRACE,
        }
    };

    let mut filter = EnvFilter::from_default_env();
    for target in ["memwatchd", "memwatch_core"] {
        if let Ok(directive) = format!("{}={}", target, level).parse() {
            filter = filter.add_directive(directive);
        }
    }

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

fn build_schedule(args: &Args) -> Result<Schedule, EngineError> {
    Ok(Schedule::new(
        Duration::from_secs(args.process_interval),
        Duration::from_secs(args.host_interval),
        Duration::from_secs(args.run_for),
    )?)
}

/// Builds the host dimensions: identity document first, then explicit
/// `--dimension` flags, which override same-named entries.
fn resolve_dimensions(
    identity_document: Option<&Path>,
    extra: &[Dimension],
) -> Result<DimensionSet, String> {
    let mut dimensions = DimensionSet::new();

    if let Some(path) = identity_document {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("cannot read identity document {}: {}", path.display(), e))?;
        let identity = InstanceIdentity::from_json(&content)
            .map_err(|e| format!("invalid identity document {}: {}", path.display(), e))?;
        if let Some(region) = &identity.region {
            debug!("Instance region: {}", region);
        }
        for d in identity.dimensions().iter() {
            dimensions.insert(d.name.clone(), d.value.clone());
        }
    }

    for d in extra {
        dimensions.insert(d.name.clone(), d.value.clone());
    }

    Ok(dimensions)
}

fn build_sink(kind: SinkKind, output: Option<&Path>) -> io::Result<Box<dyn MetricsSink>> {
    Ok(match (kind, output) {
        (SinkKind::Log, _) => Box::new(LogSink::new()),
        (SinkKind::Json, Some(path)) => {
            let file: File = OpenOptions::new().create(true).append(true).open(path)?;
            Box::new(JsonLinesSink::new(BufWriter::new(file)))
        }
        (SinkKind::Json, None) => Box::new(JsonLinesSink::new(io::stdout())),
    })
}

fn run(args: Args) -> Result<(), Box<dyn Error>> {
    info!("memwatchd {} starting", memwatch_core::VERSION);

    let schedule = build_schedule(&args)?;
    let dimensions = resolve_dimensions(args.identity_document.as_deref(), &args.dimensions)?;
    let sink = build_sink(args.sink, args.output.as_deref()).map_err(|e| {
        format!(
            "cannot open output {}: {}",
            args.output
                .as_deref()
                .map(|p| p.display().to_string())
                .unwrap_or_default(),
            e
        )
    })?;

    info!(
        "Config: proc={}, sink={:?}, targets=[{}], dimensions={{{}}}",
        args.proc_path,
        args.sink,
        args.pids
            .iter()
            .map(|t| t.to_string())
            .collect::<Vec<_>>()
            .join(","),
        dimensions
    );

    let mut engine = Engine::new(RealFs::new(), &args.proc_path, sink, SystemClock, schedule)
        .with_targets(args.pids)
        .with_dimensions(dimensions)
        .with_namespaces(args.host_namespace, args.process_namespace);

    engine.verify_targets()?;
    engine.run()?;
    Ok(())
}

fn main() {
    let args = Args::parse();

    init_logging(args.verbose, args.quiet);

    if let Err(e) = run(args) {
        error!("{}", e);
        process::exit(1);
    }
}
