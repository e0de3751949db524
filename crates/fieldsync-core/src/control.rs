//! Job cancellation: shared cancel tokens and a registry keyed by job name.
//!
//! A running job holds a `CancelToken`; the route stitcher and the sync
//! orchestrator check it at every suspension point and unwind to a failed
//! outcome once it is set.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

/// Cloneable cancel flag; all clones observe the same state.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Shared registry of job name -> cancel token. The runtime registers a job
/// before invoking it and a signal handler cancels through the registry.
#[derive(Default)]
pub struct JobControl {
    jobs: RwLock<HashMap<String, CancelToken>>,
}

impl JobControl {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a running job; returns the token to pass in its context.
    pub fn register(&self, name: &str) -> CancelToken {
        let token = CancelToken::new();
        self.jobs
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(name.to_string(), token.clone());
        token
    }

    /// Unregister a job (call when the invocation returns).
    pub fn unregister(&self, name: &str) {
        self.jobs
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .remove(name);
    }

    /// Request cancellation of one job. Returns false if it is not running.
    pub fn request_cancel(&self, name: &str) -> bool {
        match self.jobs.read().unwrap_or_else(|e| e.into_inner()).get(name) {
            Some(token) => {
                token.cancel();
                true
            }
            None => false,
        }
    }

    /// Cancel every registered job (e.g. on Ctrl-C).
    pub fn cancel_all(&self) {
        for token in self.jobs.read().unwrap_or_else(|e| e.into_inner()).values() {
            token.cancel();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_state() {
        let token = CancelToken::new();
        let other = token.clone();
        assert!(!other.is_cancelled());
        token.cancel();
        assert!(other.is_cancelled());
    }

    #[test]
    fn registry_cancels_by_name() {
        let control = JobControl::new();
        let sync = control.register("data_sync");
        let upload = control.register("file_upload");
        assert!(control.request_cancel("data_sync"));
        assert!(sync.is_cancelled());
        assert!(!upload.is_cancelled());
        assert!(!control.request_cancel("location_report"));

        control.unregister("data_sync");
        assert!(!control.request_cancel("data_sync"));

        control.cancel_all();
        assert!(upload.is_cancelled());
    }
}
