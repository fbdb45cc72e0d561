//! Boss question countdown
//!
//! Each boss question runs a [`Countdown`]: a background task that emits
//! one [`TimerEvent::Tick`] per unit and a final [`TimerEvent::Expired`].
//! The handle owns a `CancellationToken`; cancelling it, or dropping the
//! handle, stops the task. Every event carries the [`CountdownId`] of the
//! countdown that produced it so the engine can discard events that were
//! already queued when their countdown was cancelled.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use serde::Serialize;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::debug;

static NEXT_COUNTDOWN_ID: AtomicU64 = AtomicU64::new(1);

/// Identifies one countdown run.
///
/// Ids are unique for the life of the process, so events left over from a
/// previous session can never match a countdown of the current one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct CountdownId(pub u64);

impl CountdownId {
    /// Allocates a fresh id.
    #[must_use]
    pub fn next() -> Self {
        Self(NEXT_COUNTDOWN_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl std::fmt::Display for CountdownId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Event produced by a running countdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerEvent {
    /// One unit elapsed; `remaining` units are left.
    Tick {
        /// Producing countdown
        id: CountdownId,
        /// Units left after this tick
        remaining: u32,
    },
    /// The countdown reached zero.
    Expired {
        /// Producing countdown
        id: CountdownId,
    },
}

impl TimerEvent {
    /// Countdown that produced this event.
    #[must_use]
    pub const fn id(&self) -> CountdownId {
        match self {
            Self::Tick { id, .. } | Self::Expired { id } => *id,
        }
    }
}

/// Visual escalation of the countdown indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Urgency {
    /// Plenty of time
    Calm,
    /// At or below the warning threshold
    Warning,
    /// At or below the critical threshold
    Critical,
}

impl Urgency {
    /// Urgency for `remaining` units given the two thresholds.
    #[must_use]
    pub const fn for_remaining(remaining: u32, warn_at: u32, critical_at: u32) -> Self {
        if remaining <= critical_at {
            Self::Critical
        } else if remaining <= warn_at {
            Self::Warning
        } else {
            Self::Calm
        }
    }
}

/// Handle to a running countdown.
///
/// The countdown stops when [`cancel`](Self::cancel) is called or the
/// handle is dropped, whichever comes first.
#[derive(Debug)]
pub struct Countdown {
    id: CountdownId,
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl Countdown {
    /// Starts a countdown of `units` ticks spaced `tick` apart.
    ///
    /// Must be called from within a Tokio runtime.
    #[must_use]
    pub fn start(
        id: CountdownId,
        units: u32,
        tick: Duration,
        events: mpsc::UnboundedSender<TimerEvent>,
    ) -> Self {
        let cancel = CancellationToken::new();
        let token = cancel.clone();

        let task = tokio::spawn(async move {
            let mut interval = tokio::time::interval_at(Instant::now() + tick, tick);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            let mut remaining = units;

            while remaining > 0 {
                tokio::select! {
                    biased;
                    () = token.cancelled() => {
                        debug!(countdown = %id, remaining, "countdown cancelled");
                        return;
                    }
                    _ = interval.tick() => {
                        remaining -= 1;
                        if events.send(TimerEvent::Tick { id, remaining }).is_err() {
                            return;
                        }
                    }
                }
            }

            if !token.is_cancelled() {
                debug!(countdown = %id, "countdown expired");
                let _ = events.send(TimerEvent::Expired { id });
            }
        });

        Self { id, cancel, task }
    }

    /// Identifier carried by this countdown's events.
    #[must_use]
    pub const fn id(&self) -> CountdownId {
        self.id
    }

    /// Whether the background task has stopped.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Stops the countdown. No further events are sent after this returns,
    /// although events already queued remain in the channel.
    pub fn cancel(self) {
        drop(self);
    }
}

impl Drop for Countdown {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
