//! Opt-in run telemetry.
//!
//! Events are emitted as `tracing` events on the `sprocket::telemetry`
//! target, so they go wherever the installed subscriber sends them. The
//! enabled flag comes from configuration; nothing here reads the
//! environment.

use std::time::Instant;

use tracing::info;

pub const TARGET: &str = "sprocket::telemetry";

#[derive(Debug, Clone)]
pub struct Telemetry {
    enabled: bool,
    started: Instant,
}

impl Telemetry {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            started: Instant::now(),
        }
    }

    pub fn disabled() -> Self {
        Self::new(false)
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn run_started(&self, source: &str, full: bool) {
        if self.enabled {
            info!(target: TARGET, event = "run_started", %source, full);
        }
    }

    pub fn procedures_generated(&self, rendered: usize, failed: usize) {
        if self.enabled {
            info!(target: TARGET, event = "procedures_generated", rendered, failed);
        }
    }

    pub fn run_finished(&self, success: bool) {
        if self.enabled {
            let elapsed_ms = self.started.elapsed().as_millis() as u64;
            info!(target: TARGET, event = "run_finished", success, elapsed_ms);
        }
    }
}

impl Default for Telemetry {
    fn default() -> Self {
        Self::disabled()
    }
}
