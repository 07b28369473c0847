// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Timer that restores an accessory's default state.

use crate::config::TimerConfig;
use crate::timer::DurationTimer;

/// A [`DurationTimer`] bound to a `resetTimer` configuration.
///
/// Random durations are drawn again on every start.
#[derive(Debug)]
pub(crate) struct ResetTimer {
    timer: DurationTimer,
    config: TimerConfig,
}

impl ResetTimer {
    pub(crate) fn new(name: &str, config: TimerConfig) -> Self {
        Self {
            timer: DurationTimer::new(format!("{name} reset"), config.is_resettable),
            config,
        }
    }

    /// Arms the countdown, drawing a fresh duration.
    pub(crate) fn start<F>(&self, on_fire: F)
    where
        F: FnOnce() + Send + 'static,
    {
        if self.timer.is_running() && !self.timer.is_resettable() {
            // Keep the running countdown and its duration
            self.timer.start(on_fire);
            return;
        }
        let amount = self.config.draw_amount(&mut rand::thread_rng());
        self.timer
            .start_with_duration(on_fire, amount, self.config.units());
    }

    pub(crate) fn stop(&self) {
        self.timer.stop();
    }

    pub(crate) fn is_running(&self) -> bool {
        self.timer.is_running()
    }

    pub(crate) fn remaining_secs(&self) -> u64 {
        self.timer.remaining_secs()
    }
}
