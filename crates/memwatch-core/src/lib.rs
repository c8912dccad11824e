//! memwatch-core - memory telemetry sampling engine.
//!
//! Provides:
//! - `collector` - `/proc/meminfo` and `/proc/[pid]/status` readers
//! - `model` - samples, snapshots, process targets, host dimensions
//! - `metrics` - derived metrics (used memory, percent used)
//! - `sink` - metric batch destinations
//! - `scheduler` - epoch-aligned cadences and the sampling loop

pub mod collector;
pub mod metrics;
pub mod model;
pub mod scheduler;
pub mod sink;

/// Crate version, shared by the binaries.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
