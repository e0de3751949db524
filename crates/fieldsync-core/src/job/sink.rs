//! Progress and fault sinks.
//!
//! Both are fire-and-forget: nothing they do can change a job outcome.

use std::error::Error as StdError;

/// Receives foreground progress notifications.
pub trait ProgressSink: Send + Sync {
    /// `percent` is clamped to 100 by implementations.
    fn report(&self, message: &str, percent: Option<u8>);
}

/// Receives errors worth surfacing beyond the job outcome.
pub trait FaultSink: Send + Sync {
    fn report(&self, error: &(dyn StdError + 'static), context: &str);
}

/// One progress notification (channel payload).
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressUpdate {
    pub message: String,
    pub percent: Option<u8>,
}

fn clamp(percent: Option<u8>) -> Option<u8> {
    percent.map(|p| p.min(100))
}

/// Logs progress at info level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingProgress;

impl ProgressSink for TracingProgress {
    fn report(&self, message: &str, percent: Option<u8>) {
        match clamp(percent) {
            Some(p) => tracing::info!(percent = p, "{}", message),
            None => tracing::info!("{}", message),
        }
    }
}

/// Forwards progress to a tokio channel; drops updates when the channel is full.
#[derive(Debug, Clone)]
pub struct ChannelProgress {
    tx: tokio::sync::mpsc::Sender<ProgressUpdate>,
}

impl ChannelProgress {
    pub fn new(tx: tokio::sync::mpsc::Sender<ProgressUpdate>) -> Self {
        Self { tx }
    }
}

impl ProgressSink for ChannelProgress {
    fn report(&self, message: &str, percent: Option<u8>) {
        let _ = self.tx.try_send(ProgressUpdate {
            message: message.to_string(),
            percent: clamp(percent),
        });
    }
}

/// Logs faults at error level with the full source chain.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingFaults;

impl FaultSink for TracingFaults {
    fn report(&self, error: &(dyn StdError + 'static), context: &str) {
        let mut chain = error.to_string();
        let mut source = error.source();
        while let Some(cause) = source {
            chain.push_str(": ");
            chain.push_str(&cause.to_string());
            source = cause.source();
        }
        tracing::error!(context, error = %chain, "job fault");
    }
}
