#![warn(missing_docs)]
//! # aviator-poll
//!
//! ## Purpose
//! Provides the timer abstraction and the polling scheduler for `aviator`.
//!
//! ## Responsibilities
//! - Define a backend-agnostic [`TimerDriver`] trait.
//! - Expose a tokio-backed driver for the runtime event loop.
//! - Expose a deterministic virtual-clock driver for CI and scenario tests.
//! - Own the two repeating polling timers (process status, liveness).
//!
//! ## Data flow
//! Session controller calls [`PollingScheduler::start`] -> driver arms timers ->
//! driver emits [`TimerFired`] values -> event loop hands them back to the
//! controller, which checks [`PollingScheduler::task_for`] before acting.
//!
//! ## Ownership and lifetimes
//! Timer handles are plain `Copy` ids. Only the scheduler that armed a handle
//! cancels it, so a stale tick carrying a cancelled handle is recognizable.
//!
//! ## Error model
//! Zero intervals are rejected as [`PollError::InvalidInterval`]. Arming and
//! cancelling timers cannot fail.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use thiserror::Error;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tracing::debug;

/// Reference process status poll period.
pub const DEFAULT_PROCESS_STATUS_INTERVAL_MS: u64 = 2_000;
/// Reference liveness poll period.
pub const DEFAULT_LIVENESS_INTERVAL_MS: u64 = 5_000;

/// What a timer is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerKind {
    /// Repeating process status refresh.
    ProcessStatus,
    /// Repeating liveness check while online.
    Liveness,
    /// Repeating liveness probe while offline.
    OfflineProbe,
    /// One-shot push channel reconnect.
    PushReconnect,
}

/// Opaque id of one armed timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerHandle(u64);

impl TimerHandle {
    /// Raw id, for logging.
    pub fn id(&self) -> u64 {
        self.0
    }
}

/// One timer expiry delivered to the event loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerFired {
    /// Timer that expired.
    pub handle: TimerHandle,
    /// Purpose of that timer.
    pub kind: TimerKind,
}

/// Validated polling periods.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollIntervals {
    /// Process status refresh period.
    pub process_status: Duration,
    /// Liveness check period.
    pub liveness: Duration,
}

impl PollIntervals {
    /// Creates validated intervals from milliseconds.
    ///
    /// # Errors
    /// Returns [`PollError::InvalidInterval`] when either period is zero.
    pub fn from_millis(process_status_ms: u64, liveness_ms: u64) -> Result<Self, PollError> {
        if process_status_ms == 0 {
            return Err(PollError::InvalidInterval("process status"));
        }
        if liveness_ms == 0 {
            return Err(PollError::InvalidInterval("liveness"));
        }
        Ok(Self {
            process_status: Duration::from_millis(process_status_ms),
            liveness: Duration::from_millis(liveness_ms),
        })
    }
}

impl Default for PollIntervals {
    fn default() -> Self {
        Self {
            process_status: Duration::from_millis(DEFAULT_PROCESS_STATUS_INTERVAL_MS),
            liveness: Duration::from_millis(DEFAULT_LIVENESS_INTERVAL_MS),
        }
    }
}

/// Trait implemented by concrete timer backends.
pub trait TimerDriver: Send {
    /// Arms a timer that fires every `period` until cancelled.
    fn arm_repeating(&mut self, kind: TimerKind, period: Duration) -> TimerHandle;

    /// Arms a timer that fires once after `delay`.
    fn arm_once(&mut self, kind: TimerKind, delay: Duration) -> TimerHandle;

    /// Cancels a timer. Unknown or already-fired handles are ignored.
    fn cancel(&mut self, handle: TimerHandle);
}

/// Which polling task a fired handle belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollTask {
    /// Refresh process statuses.
    ProcessStatus,
    /// Run a liveness check.
    Liveness,
}

/// Owner of the two repeating polling timers.
#[derive(Debug, Clone)]
pub struct PollingScheduler {
    intervals: PollIntervals,
    process_status: Option<TimerHandle>,
    liveness: Option<TimerHandle>,
}

impl PollingScheduler {
    /// Creates an inactive scheduler.
    pub fn new(intervals: PollIntervals) -> Self {
        Self {
            intervals,
            process_status: None,
            liveness: None,
        }
    }

    /// Clears any existing timers, then arms both polling timers.
    pub fn start(&mut self, driver: &mut dyn TimerDriver) {
        self.stop(driver);
        self.process_status = Some(
            driver.arm_repeating(TimerKind::ProcessStatus, self.intervals.process_status),
        );
        self.liveness = Some(driver.arm_repeating(TimerKind::Liveness, self.intervals.liveness));
        debug!(
            process_status_ms = self.intervals.process_status.as_millis() as u64,
            liveness_ms = self.intervals.liveness.as_millis() as u64,
            "polling started"
        );
    }

    /// Cancels both timers and resets their handles.
    pub fn stop(&mut self, driver: &mut dyn TimerDriver) {
        let mut stopped = false;
        for handle in [self.process_status.take(), self.liveness.take()]
            .into_iter()
            .flatten()
        {
            driver.cancel(handle);
            stopped = true;
        }
        if stopped {
            debug!("polling stopped");
        }
    }

    /// Returns `true` while both timers are armed.
    pub fn is_active(&self) -> bool {
        self.process_status.is_some() && self.liveness.is_some()
    }

    /// Maps a fired handle to its task; `None` for stale or foreign handles.
    pub fn task_for(&self, handle: TimerHandle) -> Option<PollTask> {
        if self.process_status == Some(handle) {
            Some(PollTask::ProcessStatus)
        } else if self.liveness == Some(handle) {
            Some(PollTask::Liveness)
        } else {
            None
        }
    }

    /// Configured intervals.
    pub fn intervals(&self) -> PollIntervals {
        self.intervals
    }
}

/// Tokio-backed driver; expiries are sent to the event loop channel.
#[derive(Debug)]
pub struct TokioTimerDriver {
    events: UnboundedSender<TimerFired>,
    next_id: u64,
    tasks: HashMap<TimerHandle, JoinHandle<()>>,
}

impl TokioTimerDriver {
    /// Creates a driver that reports expiries on `events`.
    ///
    /// Must be used from within a tokio runtime.
    pub fn new(events: UnboundedSender<TimerFired>) -> Self {
        Self {
            events,
            next_id: 0,
            tasks: HashMap::new(),
        }
    }

    fn next_handle(&mut self) -> TimerHandle {
        self.next_id += 1;
        TimerHandle(self.next_id)
    }

    fn spawn(&mut self, kind: TimerKind, period: Duration, repeating: bool) -> TimerHandle {
        // Finished one-shot tasks are pruned lazily.
        self.tasks.retain(|_, task| !task.is_finished());

        let period = period.max(Duration::from_millis(1));
        let handle = self.next_handle();
        let events = self.events.clone();
        let fired = TimerFired { handle, kind };
        let task = tokio::spawn(async move {
            let start = tokio::time::Instant::now() + period;
            let mut ticks = tokio::time::interval_at(start, period);
            ticks.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            loop {
                ticks.tick().await;
                if events.send(fired).is_err() || !repeating {
                    break;
                }
            }
        });
        self.tasks.insert(handle, task);
        handle
    }
}

impl TimerDriver for TokioTimerDriver {
    fn arm_repeating(&mut self, kind: TimerKind, period: Duration) -> TimerHandle {
        self.spawn(kind, period, true)
    }

    fn arm_once(&mut self, kind: TimerKind, delay: Duration) -> TimerHandle {
        self.spawn(kind, delay, false)
    }

    fn cancel(&mut self, handle: TimerHandle) {
        if let Some(task) = self.tasks.remove(&handle) {
            task.abort();
        }
    }
}

impl Drop for TokioTimerDriver {
    fn drop(&mut self) {
        for (_, task) in self.tasks.drain() {
            task.abort();
        }
    }
}

/// One timer armed on a [`ManualTimerDriver`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArmedTimer {
    /// Timer id.
    pub handle: TimerHandle,
    /// Timer purpose.
    pub kind: TimerKind,
    /// Virtual time of the next expiry.
    pub due_ms: u64,
    /// Repeat period; `None` for one-shot timers.
    pub period_ms: Option<u64>,
}

#[derive(Debug, Default)]
struct ManualClock {
    now_ms: u64,
    next_id: u64,
    armed: Vec<ArmedTimer>,
}

/// Deterministic virtual-clock driver for test and CI usage.
///
/// Clones share one clock, so a test can keep a clone while the controller
/// owns another.
#[derive(Debug, Clone, Default)]
pub struct ManualTimerDriver {
    clock: Arc<Mutex<ManualClock>>,
}

impl ManualTimerDriver {
    /// Creates a driver at virtual time zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current virtual time.
    pub fn now_ms(&self) -> u64 {
        self.lock().now_ms
    }

    /// Snapshot of armed timers ordered by handle.
    pub fn armed(&self) -> Vec<ArmedTimer> {
        let mut armed = self.lock().armed.clone();
        armed.sort_by_key(|timer| timer.handle);
        armed
    }

    /// Number of armed timers of `kind`.
    pub fn count(&self, kind: TimerKind) -> usize {
        self.lock()
            .armed
            .iter()
            .filter(|timer| timer.kind == kind)
            .count()
    }

    /// Fires the earliest timer due at or before `deadline_ms`.
    ///
    /// Returns `None` and moves the clock to `deadline_ms` when nothing is due.
    pub fn fire_next(&self, deadline_ms: u64) -> Option<TimerFired> {
        let mut clock = self.lock();
        let position = clock
            .armed
            .iter()
            .enumerate()
            .filter(|(_, timer)| timer.due_ms <= deadline_ms)
            .min_by_key(|(_, timer)| (timer.due_ms, timer.handle))
            .map(|(position, _)| position);

        let Some(position) = position else {
            clock.now_ms = clock.now_ms.max(deadline_ms);
            return None;
        };

        let timer = clock.armed[position];
        clock.now_ms = clock.now_ms.max(timer.due_ms);
        match timer.period_ms {
            Some(period_ms) => clock.armed[position].due_ms += period_ms,
            None => {
                clock.armed.remove(position);
            }
        }

        Some(TimerFired {
            handle: timer.handle,
            kind: timer.kind,
        })
    }

    /// Fires everything due within the next `by_ms` and returns it in order.
    pub fn advance(&self, by_ms: u64) -> Vec<TimerFired> {
        let deadline_ms = self.now_ms().saturating_add(by_ms);
        std::iter::from_fn(|| self.fire_next(deadline_ms)).collect()
    }

    fn arm(&self, kind: TimerKind, period: Duration, repeating: bool) -> TimerHandle {
        let mut clock = self.lock();
        clock.next_id += 1;
        let handle = TimerHandle(clock.next_id);
        let period_ms = (period.as_millis() as u64).max(1);
        let due_ms = clock.now_ms.saturating_add(period_ms);
        clock.armed.push(ArmedTimer {
            handle,
            kind,
            due_ms,
            period_ms: repeating.then_some(period_ms),
        });
        handle
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ManualClock> {
        self.clock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl TimerDriver for ManualTimerDriver {
    fn arm_repeating(&mut self, kind: TimerKind, period: Duration) -> TimerHandle {
        self.arm(kind, period, true)
    }

    fn arm_once(&mut self, kind: TimerKind, delay: Duration) -> TimerHandle {
        self.arm(kind, delay, false)
    }

    fn cancel(&mut self, handle: TimerHandle) {
        self.lock().armed.retain(|timer| timer.handle != handle);
    }
}

/// Polling layer error type.
#[derive(Debug, Error)]
pub enum PollError {
    /// A polling period must be positive.
    #[error("invalid {0} interval: must be greater than zero")]
    InvalidInterval(&'static str),
}
