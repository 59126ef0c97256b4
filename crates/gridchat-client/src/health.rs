//! Periodic bridge health polling.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use gridchat_protocol::HealthReport;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

use crate::backend::BackendApi;

/// Shared pause flag. Writers pause the monitor while they talk to the
/// bridge; the flag is advisory and only consulted at each tick.
#[derive(Debug, Clone, Default)]
pub struct PauseHandle {
    paused: Arc<AtomicBool>,
}

impl PauseHandle {
    pub fn pause(&self) {
        self.paused.store(true, Ordering::SeqCst);
    }

    pub fn resume(&self) {
        self.paused.store(false, Ordering::SeqCst);
    }

    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorState {
    Stopped,
    Running,
    Paused,
}

struct Probe {
    backend: Arc<dyn BackendApi>,
    pause: PauseHandle,
    latest: watch::Sender<Option<HealthReport>>,
}

impl Probe {
    async fn tick(&self) -> Option<HealthReport> {
        if self.pause.is_paused() {
            tracing::trace!("health tick skipped while paused");
            return None;
        }
        let report = match self.backend.health().await {
            Ok(report) => report,
            Err(e) => HealthReport::unhealthy(e.to_string()),
        };
        let changed = self
            .latest
            .borrow()
            .as_ref()
            .map_or(true, |prev| prev.is_healthy() != report.is_healthy());
        if changed {
            if report.is_healthy() {
                tracing::info!(workbook = ?report.workbook, "bridge healthy");
            } else {
                tracing::warn!(error = ?report.error, "bridge unhealthy");
            }
        }
        self.latest.send_replace(Some(report.clone()));
        Some(report)
    }
}

/// Polls `GET /health` on a fixed interval and publishes the latest report.
pub struct HealthMonitor {
    probe: Arc<Probe>,
    interval: Duration,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl HealthMonitor {
    pub fn new(backend: Arc<dyn BackendApi>, interval: Duration) -> Self {
        let (latest, _) = watch::channel(None);
        Self {
            probe: Arc::new(Probe {
                backend,
                pause: PauseHandle::default(),
                latest,
            }),
            interval,
            task: Mutex::new(None),
        }
    }

    /// Start polling. The first probe happens one interval from now. Calling
    /// this on a running monitor does nothing.
    pub fn start(&self) {
        let mut task = self.task();
        if task.is_some() {
            return;
        }
        let probe = Arc::clone(&self.probe);
        let period = self.interval;
        *task = Some(tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                probe.tick().await;
            }
        }));
        tracing::debug!(?period, "health monitor started");
    }

    /// Stop polling. The pause flag is left as it is.
    pub fn stop(&self) {
        if let Some(handle) = self.task().take() {
            handle.abort();
            tracing::debug!("health monitor stopped");
        }
    }

    pub fn pause(&self) {
        self.probe.pause.pause();
    }

    pub fn resume(&self) {
        self.probe.pause.resume();
    }

    /// A handle that pauses and resumes this monitor.
    pub fn pause_handle(&self) -> PauseHandle {
        self.probe.pause.clone()
    }

    pub fn state(&self) -> MonitorState {
        if self.task().is_none() {
            MonitorState::Stopped
        } else if self.probe.pause.is_paused() {
            MonitorState::Paused
        } else {
            MonitorState::Running
        }
    }

    /// Run one probe now, unless paused. Returns the published report.
    pub async fn tick(&self) -> Option<HealthReport> {
        self.probe.tick().await
    }

    /// Latest report; `None` until the first probe.
    pub fn latest(&self) -> Option<HealthReport> {
        self.probe.latest.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<HealthReport>> {
        self.probe.latest.subscribe()
    }

    fn task(&self) -> std::sync::MutexGuard<'_, Option<JoinHandle<()>>> {
        self.task.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Drop for HealthMonitor {
    fn drop(&mut self) {
        self.stop();
    }
}
