// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Single-shot countdown timer.
//!
//! A [`DurationTimer`] runs a callback once after a configured duration.
//! The remaining time is always computed from an absolute deadline, so a
//! late wake-up never accumulates drift. Timers are either resettable
//! (a new `start` replaces the pending countdown) or non-resettable (a
//! `start` while pending is ignored).

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::types::TimeUnit;

#[derive(Debug, Default)]
struct TimerState {
    duration: Duration,
    deadline: Option<Instant>,
    task: Option<JoinHandle<()>>,
    generation: u64,
}

impl TimerState {
    fn cancel(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
        self.deadline = None;
    }
}

/// A cancellable one-shot countdown.
///
/// The countdown runs on the current tokio runtime; a `start` outside a
/// runtime logs an error and arms nothing.
///
/// # Examples
///
/// ```
/// use virtual_accessories::timer::DurationTimer;
/// use virtual_accessories::types::TimeUnit;
///
/// let timer = DurationTimer::new("Porch light", true);
/// timer.set_duration(2, TimeUnit::Hours);
/// assert_eq!(timer.duration_secs(), 7200);
/// assert!(!timer.is_running());
/// ```
#[derive(Debug)]
pub struct DurationTimer {
    name: String,
    resettable: bool,
    state: Arc<Mutex<TimerState>>,
}

impl DurationTimer {
    /// Creates an idle timer with a zero duration.
    #[must_use]
    pub fn new(name: impl Into<String>, resettable: bool) -> Self {
        Self {
            name: name.into(),
            resettable,
            state: Arc::new(Mutex::new(TimerState::default())),
        }
    }

    /// Sets the duration used by the next `start`.
    #[must_use]
    pub fn with_duration(self, amount: u64, unit: TimeUnit) -> Self {
        self.set_duration(amount, unit);
        self
    }

    /// Returns whether a `start` while pending restarts the countdown.
    #[must_use]
    pub fn is_resettable(&self) -> bool {
        self.resettable
    }

    /// Sets the duration used by the next `start`.
    pub fn set_duration(&self, amount: u64, unit: TimeUnit) {
        self.state.lock().duration = unit.to_duration(amount);
    }

    /// Sets the duration from a configuration unit string.
    ///
    /// An unrecognised unit sets the duration to zero, which leaves the
    /// timer inert.
    pub fn set_duration_in(&self, amount: u64, units: &str) {
        match units.parse::<TimeUnit>() {
            Ok(unit) => self.set_duration(amount, unit),
            Err(_) => {
                tracing::warn!(timer = %self.name, units, "Unknown timer units, timer disabled");
                self.state.lock().duration = Duration::ZERO;
            }
        }
    }

    /// Returns the configured duration in whole seconds.
    #[must_use]
    pub fn duration_secs(&self) -> u64 {
        self.state.lock().duration.as_secs()
    }

    /// Returns `true` while a callback is pending.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.state.lock().task.is_some()
    }

    /// Returns the seconds left before the callback fires, or 0 when idle.
    ///
    /// Partial seconds round up so a pending timer never reports 0.
    #[must_use]
    pub fn remaining_secs(&self) -> u64 {
        let state = self.state.lock();
        let Some(deadline) = state.deadline else {
            return 0;
        };
        let remaining = deadline.saturating_duration_since(Instant::now());
        remaining.as_secs() + u64::from(remaining.subsec_nanos() > 0)
    }

    /// Arms the timer to run `on_fire` once after the configured duration.
    ///
    /// A pending countdown is replaced, unless the timer is non-resettable,
    /// in which case this call is ignored and the original deadline kept.
    /// With a zero duration, or outside a tokio runtime, nothing is armed.
    pub fn start<F>(&self, on_fire: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let mut state = self.state.lock();

        if state.task.is_some() {
            if !self.resettable {
                tracing::debug!(timer = %self.name, "Timer already running, not resettable");
                return;
            }
            tracing::debug!(timer = %self.name, "Restarting timer");
            state.cancel();
        }

        if state.duration.is_zero() {
            tracing::debug!(timer = %self.name, "Timer duration is zero, not armed");
            return;
        }
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::error!(timer = %self.name, "No tokio runtime, timer not armed");
            return;
        };

        state.generation = state.generation.wrapping_add(1);
        let generation = state.generation;
        let deadline = Instant::now() + state.duration;
        state.deadline = Some(deadline);

        let shared = Arc::clone(&self.state);
        let name = self.name.clone();
        state.task = Some(runtime.spawn(async move {
            tokio::time::sleep_until(deadline).await;
            {
                let mut state = shared.lock();
                if state.generation != generation {
                    return;
                }
                state.task = None;
                state.deadline = None;
            }
            tracing::debug!(timer = %name, "Timer fired");
            on_fire();
        }));

        tracing::debug!(
            timer = %self.name,
            seconds = state.duration.as_secs(),
            "Timer started"
        );
    }

    /// Sets the duration, then behaves like [`start`](Self::start).
    pub fn start_with_duration<F>(&self, on_fire: F, amount: u64, units: &str)
    where
        F: FnOnce() + Send + 'static,
    {
        self.set_duration_in(amount, units);
        self.start(on_fire);
    }

    /// Cancels the pending callback, if any.
    pub fn stop(&self) {
        let mut state = self.state.lock();
        if state.task.is_some() {
            tracing::debug!(timer = %self.name, "Timer stopped");
        }
        state.cancel();
    }
}

impl Drop for DurationTimer {
    fn drop(&mut self) {
        self.state.lock().cancel();
    }
}
