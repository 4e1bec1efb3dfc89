use std::future::Future;
use std::ops::ControlFlow;
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::{Instant, interval_at};

/// Interval between countdown ticks.
pub const TICK_PERIOD: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockState {
    Idle,
    Running,
    Expired,
    Cancelled,
}

/// What a single tick did to the clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    Running { remaining_seconds: u32 },
    /// Reached zero on this tick. Returned once per countdown.
    Expired,
    /// The clock was not running; nothing changed.
    Stopped,
}

/// Whole-second countdown for a timed quiz attempt.
///
/// `Idle -> Running -> {Expired | Cancelled}`. Ticks only count while
/// running, so expiry is reported exactly once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionClock {
    state: ClockState,
    remaining_seconds: u32,
}

impl Default for SessionClock {
    fn default() -> Self {
        Self::idle()
    }
}

impl SessionClock {
    #[must_use]
    pub fn idle() -> Self {
        Self {
            state: ClockState::Idle,
            remaining_seconds: 0,
        }
    }

    /// Start a fresh countdown, or go idle when there is no limit.
    pub fn start(&mut self, limit_minutes: Option<u32>) -> ClockState {
        match limit_minutes.filter(|minutes| *minutes > 0) {
            Some(minutes) => {
                self.remaining_seconds = minutes.saturating_mul(60);
                self.state = ClockState::Running;
            }
            None => {
                self.remaining_seconds = 0;
                self.state = ClockState::Idle;
            }
        }
        self.state
    }

    pub fn tick(&mut self) -> Tick {
        if self.state != ClockState::Running {
            return Tick::Stopped;
        }
        self.remaining_seconds = self.remaining_seconds.saturating_sub(1);
        if self.remaining_seconds == 0 {
            self.state = ClockState::Expired;
            Tick::Expired
        } else {
            Tick::Running {
                remaining_seconds: self.remaining_seconds,
            }
        }
    }

    /// Stop a running countdown. Returns `false` (and does nothing) otherwise.
    pub fn cancel(&mut self) -> bool {
        if self.state == ClockState::Running {
            self.state = ClockState::Cancelled;
            true
        } else {
            false
        }
    }

    #[must_use]
    pub fn state(&self) -> ClockState {
        self.state
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.state == ClockState::Running
    }

    #[must_use]
    pub fn remaining_seconds(&self) -> u32 {
        self.remaining_seconds
    }

    /// Remaining time as `m:ss`.
    #[must_use]
    pub fn format_remaining(&self) -> String {
        format!(
            "{}:{:02}",
            self.remaining_seconds / 60,
            self.remaining_seconds % 60
        )
    }
}

/// Background task that drives a countdown. Aborted when dropped.
pub(crate) struct Ticker {
    handle: Option<JoinHandle<()>>,
}

impl Ticker {
    /// Call `on_tick` every `period` until it breaks.
    ///
    /// Returns `None` outside a Tokio runtime.
    pub(crate) fn spawn<F, Fut>(period: Duration, mut on_tick: F) -> Option<Self>
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ControlFlow<()>> + Send + 'static,
    {
        let runtime = Handle::try_current().ok()?;
        let handle = runtime.spawn(async move {
            let mut interval = interval_at(Instant::now() + period, period);
            loop {
                interval.tick().await;
                if on_tick().await.is_break() {
                    break;
                }
            }
        });
        Some(Self {
            handle: Some(handle),
        })
    }

    /// Let the task run to completion on its own.
    ///
    /// Used from inside the task itself, where aborting would cut short the
    /// work it is about to do.
    pub(crate) fn detach(mut self) {
        self.handle.take();
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
