//! Background job runtime: the runner, its context, payloads and sinks.

mod context;
mod outcome;
pub mod payload;
mod runner;
mod sink;

pub use context::{JobContext, Session};
pub use outcome::{JobError, JobOutcome, JobOutput};
pub use payload::{keys, now_millis, Payload, PayloadValue};
pub use runner::{Job, JobRunner, JobSpec};
pub use sink::{ChannelProgress, FaultSink, ProgressSink, ProgressUpdate, TracingFaults, TracingProgress};

#[cfg(test)]
pub(crate) use sink::testing;
