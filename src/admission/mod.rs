//! Single-batch admission gate
//!
//! Two parts with different jobs:
//!
//! - a `running` flag, tested and set under a short `parking_lot` lock, that
//!   rejects a second submission immediately without ever waiting;
//! - a tokio `RwLock` the admitted batch holds exclusively for its whole run,
//!   so observers can block behind an active run by taking it shared.
//!
//! Both are released together when the batch drops its `RunGuard`, after its
//! final failure list has been recorded.

use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::{OwnedRwLockWriteGuard, RwLock};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum AdmissionError {
    #[error("a scrape job is already running")]
    Busy,
}

#[derive(Debug, Default)]
pub struct JobAdmissionGate {
    running: Mutex<bool>,
    run_lock: Arc<RwLock<()>>,
}

impl JobAdmissionGate {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Claim the gate without blocking
    ///
    /// The returned ticket still has to [`enter`](AdmissionTicket::enter) the
    /// exclusive section; dropping it unused releases the claim.
    pub fn try_admit(self: &Arc<Self>) -> Result<AdmissionTicket, AdmissionError> {
        let mut running = self.running.lock();
        if *running {
            return Err(AdmissionError::Busy);
        }
        *running = true;
        debug!("Admission gate: Idle -> Running");
        Ok(AdmissionTicket {
            gate: Arc::clone(self),
            armed: true,
        })
    }

    /// Whether a batch currently holds the gate
    pub fn is_running(&self) -> bool {
        *self.running.lock()
    }

    /// Wait until no batch holds the exclusive section
    pub async fn wait_idle(&self) {
        let _shared = self.run_lock.read().await;
    }

    fn release(&self) {
        *self.running.lock() = false;
        debug!("Admission gate: Running -> Idle");
    }
}

/// A successful admission that has not started running yet
#[must_use = "dropping the ticket releases the admission"]
pub struct AdmissionTicket {
    gate: Arc<JobAdmissionGate>,
    armed: bool,
}

impl AdmissionTicket {
    /// Take the exclusive hold for the duration of the run
    pub async fn enter(mut self) -> RunGuard {
        let exclusive = Arc::clone(&self.gate.run_lock).write_owned().await;
        self.armed = false;
        RunGuard {
            gate: Arc::clone(&self.gate),
            exclusive: Some(exclusive),
        }
    }
}

impl Drop for AdmissionTicket {
    fn drop(&mut self) {
        if self.armed {
            self.gate.release();
        }
    }
}

/// Exclusive hold on the gate for one running batch
pub struct RunGuard {
    gate: Arc<JobAdmissionGate>,
    exclusive: Option<OwnedRwLockWriteGuard<()>>,
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        // Shared waiters queued behind this run observe Idle when they wake
        self.gate.release();
        drop(self.exclusive.take());
    }
}
