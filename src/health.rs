//! Tri-state availability tracking for the chatbot service.
//!
//! The monitor itself is a plain state machine; the chat view owns the
//! timer that drives it and drops the task on unmount, which also stops
//! the polling.

use crate::types::HealthStatus;
use std::time::Duration;

pub const POLL_INTERVAL: Duration = Duration::from_secs(30);

#[derive(Clone, Copy, Debug, Default)]
pub struct HealthMonitor {
    status: HealthStatus,
}

impl HealthMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> HealthStatus {
        self.status
    }

    /// Every poll cycle re-enters `Checking` before the probe runs.
    pub fn begin_probe(&mut self) {
        self.status = HealthStatus::Checking;
    }

    pub fn record(&mut self, alive: bool) {
        self.status = if alive {
            HealthStatus::Online
        } else {
            HealthStatus::Offline
        };
    }
}
