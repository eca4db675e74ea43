//! One-second countdown for the active question
//!
//! The countdown never sleeps or spawns anything. Ticks are one-shot alarms
//! handed to the host through a scheduling closure, and each delivered
//! tick schedules the next. Every alarm carries a generation number;
//! cancelling the countdown bumps the generation so a tick that was already
//! in flight is recognised as stale and ignored.

use serde::{Deserialize, Serialize};

use crate::constants::timer::{CRITICAL_RATIO, WARNING_RATIO};

/// Interval between two ticks
pub const TICK: web_time::Duration = web_time::Duration::from_secs(1);

/// Alarm messages driving the countdown
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlarmMessage {
    /// One second has passed on the active question
    Tick {
        /// Index of the question the countdown was started for
        index: usize,
        /// Countdown generation the tick belongs to
        generation: u64,
    },
}

/// How urgent the remaining time is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    /// More than two thirds of the time remain
    Normal,
    /// Between one and two thirds of the time remain
    Warning,
    /// At most a third of the time remains
    Critical,
}

impl Severity {
    /// Classifies the remaining time relative to the full duration
    pub fn of(remaining: u32, total: u32) -> Self {
        if total == 0 {
            return Self::Critical;
        }

        let ratio = f64::from(remaining) / f64::from(total);

        if ratio <= CRITICAL_RATIO {
            Self::Critical
        } else if ratio <= WARNING_RATIO {
            Self::Warning
        } else {
            Self::Normal
        }
    }
}

/// Outcome of delivering a tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    /// The tick belongs to a cancelled or finished countdown
    Stale,
    /// The countdown continues with this many seconds left
    Running(u32),
    /// Time is up; the countdown has halted
    Expired,
}

/// Countdown bound to at most one question at a time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Countdown {
    /// Full duration, `None` when the timer is disabled
    seconds: Option<u32>,
    remaining: Option<u32>,
    generation: u64,
}

impl Countdown {
    /// Creates a halted countdown; `None` disables it entirely
    pub fn new(seconds: Option<u32>) -> Self {
        Self {
            seconds,
            remaining: None,
            generation: 0,
        }
    }

    /// A countdown that never runs
    pub fn disabled() -> Self {
        Self::new(None)
    }

    /// Whether the countdown can run at all
    pub fn is_enabled(&self) -> bool {
        self.seconds.is_some()
    }

    /// Whether a countdown is in progress
    pub fn is_running(&self) -> bool {
        self.remaining.is_some()
    }

    /// The configured duration, if enabled
    pub fn seconds(&self) -> Option<u32> {
        self.seconds
    }

    /// Seconds left, `None` when not running
    pub fn remaining(&self) -> Option<u32> {
        self.remaining
    }

    /// Severity of the remaining time, `None` when not running
    pub fn severity(&self) -> Option<Severity> {
        Some(Severity::of(self.remaining?, self.seconds?))
    }

    /// Starts counting down for a question
    ///
    /// Does nothing when the timer is disabled or a countdown is already
    /// running, so activating twice never restarts the clock.
    ///
    /// # Arguments
    ///
    /// * `index` - Index of the question the countdown is for
    /// * `schedule_message` - Function to schedule the first tick
    pub fn activate<S: FnMut(crate::AlarmMessage, web_time::Duration)>(
        &mut self,
        index: usize,
        schedule_message: &mut S,
    ) {
        let Some(seconds) = self.seconds else {
            return;
        };
        if self.remaining.is_some() {
            return;
        }

        self.generation += 1;
        self.remaining = Some(seconds);

        schedule_message(
            AlarmMessage::Tick {
                index,
                generation: self.generation,
            }
            .into(),
            TICK,
        );
    }

    /// Halts the countdown and invalidates every tick in flight
    pub fn cancel(&mut self) {
        if self.remaining.take().is_some() {
            self.generation += 1;
        }
    }

    /// Halts the countdown and switches to a new duration
    ///
    /// The generation keeps counting so ticks from before can never match.
    pub fn reconfigure(&mut self, seconds: Option<u32>) {
        self.cancel();
        self.seconds = seconds;
    }

    /// Cancels and starts again from the full duration
    pub fn restart<S: FnMut(crate::AlarmMessage, web_time::Duration)>(
        &mut self,
        index: usize,
        schedule_message: &mut S,
    ) {
        self.cancel();
        self.activate(index, schedule_message);
    }

    /// Delivers a tick
    ///
    /// A running countdown loses one second and schedules the following
    /// tick. When no time would be left the countdown halts and reports
    /// [`Tick::Expired`]; the caller then records the timeout.
    pub fn tick<S: FnMut(crate::AlarmMessage, web_time::Duration)>(
        &mut self,
        index: usize,
        generation: u64,
        schedule_message: &mut S,
    ) -> Tick {
        if generation != self.generation {
            return Tick::Stale;
        }
        let Some(remaining) = self.remaining else {
            return Tick::Stale;
        };

        match remaining.checked_sub(1) {
            Some(left) if left > 0 => {
                self.remaining = Some(left);
                schedule_message(AlarmMessage::Tick { index, generation }.into(), TICK);
                Tick::Running(left)
            }
            _ => {
                self.cancel();
                Tick::Expired
            }
        }
    }
}

impl Default for Countdown {
    fn default() -> Self {
        Self::disabled()
    }
}
