//! Stage Progress
//!
//! Each pipeline stage reports an integer percentage: reset to 0 when the
//! stage starts, never decreasing while it runs, and forced to 100 when it
//! ends, whether it succeeded or failed. [`StageProgress`] enforces those
//! rules and forwards accepted values to a [`ProgressSink`].

use serde::Serialize;
use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::debug;

/// Pipeline stage that reports progress
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Analysis,
    Annotation,
    Selection,
    Generation,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Analysis => "analysis",
            Stage::Annotation => "annotation",
            Stage::Selection => "selection",
            Stage::Generation => "generation",
        };
        f.write_str(name)
    }
}

/// Receiver of progress updates
pub trait ProgressSink: Send + Sync {
    fn report(&self, stage: Stage, percent: u8);
}

/// `round(completed / total * 100)`, clamped to 100. An empty batch is complete.
pub fn percent(completed: usize, total: usize) -> u8 {
    if total == 0 {
        return 100;
    }
    let value = (completed as f64 / total as f64 * 100.0).round();
    value.clamp(0.0, 100.0) as u8
}

/// Progress of one running stage
///
/// Dropping an unfinished stage finishes it, so every exit path ends at 100.
pub struct StageProgress {
    stage: Stage,
    current: AtomicU8,
    finished: AtomicBool,
    sink: Arc<dyn ProgressSink>,
}

impl StageProgress {
    /// Start a stage at 0.
    pub fn start(stage: Stage, sink: Arc<dyn ProgressSink>) -> Self {
        sink.report(stage, 0);
        Self {
            stage,
            current: AtomicU8::new(0),
            finished: AtomicBool::new(false),
            sink,
        }
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn current(&self) -> u8 {
        self.current.load(Ordering::SeqCst)
    }

    /// Report `completed` of `total` items done.
    pub fn update(&self, completed: usize, total: usize) {
        self.advance(percent(completed, total));
    }

    /// Move to `value` if it is higher than the current value.
    pub fn advance(&self, value: u8) {
        let value = value.min(100);
        let previous = self.current.fetch_max(value, Ordering::SeqCst);
        if value > previous {
            self.sink.report(self.stage, value);
        }
    }

    /// Force the stage to 100 and mark it finished.
    pub fn finish(&self) {
        if self.finished.swap(true, Ordering::SeqCst) {
            return;
        }
        let previous = self.current.swap(100, Ordering::SeqCst);
        if previous != 100 {
            self.sink.report(self.stage, 100);
        }
        debug!(stage = %self.stage, "Stage finished");
    }
}

impl Drop for StageProgress {
    fn drop(&mut self) {
        self.finish();
    }
}

/// Ceiling for simulated progress while a single request is pending
pub const PENDING_CEILING: u8 = 90;

/// Drive `future` to completion, nudging `progress` up by `step` every
/// `period` until it reaches [`PENDING_CEILING`].
///
/// For stages that wait on one opaque request and have no real progress.
pub async fn tick_while<F: Future>(
    future: F,
    progress: &StageProgress,
    period: Duration,
    step: u8,
) -> F::Output {
    tokio::pin!(future);
    let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
    loop {
        tokio::select! {
            output = &mut future => return output,
            _ = ticker.tick() => {
                let next = progress.current().saturating_add(step).min(PENDING_CEILING);
                progress.advance(next);
            }
        }
    }
}

/// Discards updates
pub struct NoopProgress;

impl ProgressSink for NoopProgress {
    fn report(&self, _stage: Stage, _percent: u8) {}
}

/// Logs every update at debug level
pub struct TracingProgress;

impl ProgressSink for TracingProgress {
    fn report(&self, stage: Stage, percent: u8) {
        debug!(stage = %stage, percent, "Progress");
    }
}

/// Latest progress value of the most recently updated stage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressSnapshot {
    pub stage: Option<Stage>,
    pub percent: u8,
}

/// Publishes updates on a tokio watch channel for UI consumers
pub struct WatchProgress {
    sender: watch::Sender<ProgressSnapshot>,
}

impl WatchProgress {
    pub fn new() -> Self {
        let (sender, _) = watch::channel(ProgressSnapshot {
            stage: None,
            percent: 0,
        });
        Self { sender }
    }

    pub fn subscribe(&self) -> watch::Receiver<ProgressSnapshot> {
        self.sender.subscribe()
    }
}

impl Default for WatchProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressSink for WatchProgress {
    fn report(&self, stage: Stage, percent: u8) {
        self.sender.send_replace(ProgressSnapshot {
            stage: Some(stage),
            percent,
        });
    }
}
