//! Perpetual capacity poll loop.
//!
//! One cycle fetches `/capacity`, renders whatever changed and then waits a
//! fixed interval.  The wait happens after every cycle no matter how it
//! ended, so a failing device never stops the loop; only a shutdown signal
//! does.  Failures are logged and never touch the last rendered snapshot.
//! A reply counts as a failure unless it carries `state == "ok"`.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::{debug, error, info};

use crate::envelope::CapacityReport;
use crate::error::Result;
use crate::transport::{HttpRequest, Transport, exchange_ok};
use crate::view::CapacityView;

pub const CAPACITY_PATH: &str = "/capacity";

/// Last successfully observed device state.  `None` until the first good
/// poll, so the first report always renders.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CapacitySnapshot {
    pub capacity: Option<i64>,
    pub visualisation: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    Changed { capacity: bool, visualisation: bool },
    Unchanged,
    Failed,
}

pub struct CapacityMonitorClient<T: Transport> {
    transport: Arc<T>,
    view: Arc<dyn CapacityView>,
    interval: Duration,
    snapshot: CapacitySnapshot,
}

impl<T: Transport> CapacityMonitorClient<T> {
    pub fn new(transport: Arc<T>, view: Arc<dyn CapacityView>, interval: Duration) -> Self {
        Self {
            transport,
            view,
            interval,
            snapshot: CapacitySnapshot::default(),
        }
    }

    pub fn snapshot(&self) -> &CapacitySnapshot {
        &self.snapshot
    }

    /// Run one poll cycle without scheduling the next one.
    pub async fn poll_once(&mut self) -> PollOutcome {
        match self.fetch().await {
            Ok(report) => self.apply(report),
            Err(err) => {
                error!(kind = ?err.kind(), "capacity poll failed: {err}");
                PollOutcome::Failed
            }
        }
    }

    /// Poll until `shutdown` becomes `true` (or its sender is dropped).
    /// Returns the number of completed cycles.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) -> u64 {
        info!(interval_ms = self.interval.as_millis() as u64, "capacity monitor started");
        let mut cycles = 0u64;
        loop {
            tokio::select! {
                biased;
                _ = shutdown_requested(&mut shutdown) => break,
                _ = self.poll_once() => {}
            }
            cycles += 1;

            tokio::select! {
                biased;
                _ = shutdown_requested(&mut shutdown) => break,
                _ = tokio::time::sleep(self.interval) => {}
            }
        }
        info!(cycles, "capacity monitor stopped");
        cycles
    }

    async fn fetch(&self) -> Result<CapacityReport> {
        let payload = exchange_ok(self.transport.as_ref(), HttpRequest::get(CAPACITY_PATH)).await?;
        Ok(serde_json::from_value(payload)?)
    }

    fn apply(&mut self, report: CapacityReport) -> PollOutcome {
        let mut capacity_changed = false;
        if let Some(capacity) = report.capacity {
            if self.snapshot.capacity != Some(capacity) {
                self.snapshot.capacity = Some(capacity);
                self.view.show_capacity(capacity);
                self.view.pulse();
                capacity_changed = true;
            }
        }

        let mut visualisation_changed = false;
        if let Some(visualisation) = report.visualisation {
            if self.snapshot.visualisation.as_deref() != Some(visualisation.as_str()) {
                self.view.show_visualisation(&visualisation);
                self.snapshot.visualisation = Some(visualisation);
                visualisation_changed = true;
            }
        }

        if capacity_changed || visualisation_changed {
            debug!(snapshot = ?self.snapshot, "capacity display updated");
            PollOutcome::Changed {
                capacity: capacity_changed,
                visualisation: visualisation_changed,
            }
        } else {
            PollOutcome::Unchanged
        }
    }
}

async fn shutdown_requested(rx: &mut watch::Receiver<bool>) {
    while !*rx.borrow_and_update() {
        if rx.changed().await.is_err() {
            return;
        }
    }
}
