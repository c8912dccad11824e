//! Epoch-aligned sampling schedule and the loop that runs it.

mod clock;
mod engine;
mod schedule;

pub use clock::{Clock, ManualClock, SystemClock};
pub use engine::{Engine, EngineError, HOST_NAMESPACE, PROCESS_NAMESPACE, RunSummary};
pub use schedule::{
    Cadence, HOST_INTERVAL, PROCESS_INTERVAL, RUN_CUTOFF, Schedule, ScheduleError, Wake,
    delay_to_boundary,
};
