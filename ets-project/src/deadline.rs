//! Wall-clock limit and caller cancellation for one parse invocation.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use crate::error::ImportError;

/// Deadline checked at stage boundaries and inside long loops.
///
/// Expires when its timeout elapses or when the shared cancel flag is set,
/// whichever happens first.
#[derive(Debug, Clone)]
pub struct Deadline {
    started: Instant,
    expires_at: Option<Instant>,
    cancel: Option<Arc<AtomicBool>>,
}

impl Deadline {
    /// A deadline that never expires on its own.
    pub fn unbounded() -> Self {
        Deadline {
            started: Instant::now(),
            expires_at: None,
            cancel: None,
        }
    }

    pub fn after(timeout: Duration) -> Self {
        let started = Instant::now();
        Deadline {
            started,
            expires_at: started.checked_add(timeout),
            cancel: None,
        }
    }

    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    pub fn is_expired(&self) -> bool {
        if self
            .cancel
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Relaxed))
        {
            return true;
        }
        self.expires_at.is_some_and(|at| Instant::now() >= at)
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    pub fn check(&self, stage: &'static str) -> Result<(), ImportError> {
        if self.is_expired() {
            log::warn!("parse time limit exceeded during {}", stage);
            return Err(ImportError::ParseTimeout {
                stage,
                elapsed: self.elapsed(),
            });
        }
        Ok(())
    }
}

impl Default for Deadline {
    fn default() -> Self {
        Deadline::unbounded()
    }
}
