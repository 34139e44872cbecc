//! Timekeeping state machine for a single mode.
//!
//! Pure logic: every operation that needs the current time takes it as an
//! argument, so the whole type is trivially testable and serializable. The
//! displayed value is always derived from `(prior_elapsed, start_time,
//! running, reset, duration, now)` and never stored.

use serde::{Deserialize, Serialize};

use super::Mode;
use crate::clock::Millis;

const ZERO_STRING: &str = "00:00:00.00";
const ZERO_STRING_NO_SUBSECONDS: &str = "00:00:00";

/// Externally visible phase of a clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Reset,
    Running,
    Paused,
    /// A countdown whose remaining time reached zero (running or not).
    Expired,
}

/// State of one stopwatch or timer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeState {
    pub mode: Mode,
    /// True while the current interval is accumulating
    pub running: bool,
    /// True when never started or explicitly cleared
    pub reset: bool,
    /// Wall-clock start of the current interval; meaningless unless running
    pub start_time: Millis,
    /// Accumulated time of all completed intervals
    pub prior_elapsed: Millis,
    /// Countdown target; zero for the stopwatch
    pub duration: Millis,
}

impl TimeState {
    /// Fresh state in the `Reset` phase.
    pub fn new(mode: Mode) -> Self {
        Self {
            mode,
            running: false,
            reset: true,
            start_time: 0,
            prior_elapsed: 0,
            duration: 0,
        }
    }

    pub fn stopwatch() -> Self {
        Self::new(Mode::Stopwatch)
    }

    pub fn timer(duration: Millis) -> Self {
        Self {
            duration: duration.max(0),
            ..Self::new(Mode::Timer)
        }
    }

    /// Any state to `Reset`. Idempotent; the timer keeps its duration.
    pub fn reset(&mut self) {
        self.running = false;
        self.reset = true;
        self.start_time = 0;
        self.prior_elapsed = 0;
    }

    /// `Reset` or `Paused` to `Running`. Returns false if already running.
    pub fn start(&mut self, now: Millis) -> bool {
        if self.running {
            return false;
        }
        self.reset = false;
        self.start_time = now;
        self.running = true;
        true
    }

    /// `Running` to `Paused`, folding the current interval into
    /// `prior_elapsed`. Returns false (and changes nothing) if not running.
    pub fn pause(&mut self, now: Millis) -> bool {
        if !self.running {
            return false;
        }
        self.running = false;
        self.prior_elapsed += (now - self.start_time).max(0);
        true
    }

    /// Pause if running, else start. Returns whether the clock is now running.
    pub fn toggle(&mut self, now: Millis) -> bool {
        if self.running {
            self.pause(now);
        } else {
            self.start(now);
        }
        self.running
    }

    /// Reset the countdown and give it a new target.
    pub fn set_duration(&mut self, duration: Millis) {
        self.reset();
        self.duration = duration.max(0);
    }

    /// Elapsed time counting up, including the in-progress interval.
    pub fn elapsed(&self, now: Millis) -> Millis {
        if self.reset {
            0
        } else if !self.running {
            self.prior_elapsed
        } else {
            self.prior_elapsed + (now - self.start_time).max(0)
        }
    }

    /// Remaining countdown time, clamped at zero. `None` for the stopwatch.
    pub fn remaining(&self, now: Millis) -> Option<Millis> {
        match self.mode {
            Mode::Stopwatch => None,
            Mode::Timer => Some((self.duration - self.elapsed(now)).max(0)),
        }
    }

    /// Milliseconds that should be shown: elapsed for the stopwatch,
    /// remaining for the timer.
    pub fn display_ms(&self, now: Millis) -> Millis {
        self.remaining(now).unwrap_or_else(|| self.elapsed(now))
    }

    /// Rendered display string, `HH:MM:SS` with optional `.cc`.
    pub fn time_string(&self, now: Millis, subseconds: bool) -> String {
        if self.reset && self.mode == Mode::Stopwatch {
            return zero_string(subseconds).to_string();
        }
        format_elapsed(self.display_ms(now), subseconds)
    }

    pub fn is_expired(&self, now: Millis) -> bool {
        self.mode == Mode::Timer && !self.reset && self.elapsed(now) >= self.duration
    }

    pub fn phase(&self, now: Millis) -> Phase {
        if self.reset {
            Phase::Reset
        } else if self.is_expired(now) {
            Phase::Expired
        } else if self.running {
            Phase::Running
        } else {
            Phase::Paused
        }
    }

    /// How long until a running countdown reaches zero.
    pub fn due_in(&self, now: Millis) -> Option<Millis> {
        if self.mode != Mode::Timer || !self.running {
            return None;
        }
        self.remaining(now)
    }

    /// Stop a countdown exactly at its target.
    pub fn expire(&mut self) {
        self.running = false;
        self.reset = false;
        self.prior_elapsed = self.duration;
    }

    /// Re-establish the reset invariant on state read from outside.
    pub fn normalized(mut self) -> Self {
        if self.reset {
            self.running = false;
            self.start_time = 0;
            self.prior_elapsed = 0;
        }
        self.prior_elapsed = self.prior_elapsed.max(0);
        self.duration = self.duration.max(0);
        self
    }
}

fn zero_string(subseconds: bool) -> &'static str {
    if subseconds {
        ZERO_STRING
    } else {
        ZERO_STRING_NO_SUBSECONDS
    }
}

/// Formats milliseconds as `HH:MM:SS[.cc]`; the hour field wraps at 100.
pub fn format_elapsed(ms: Millis, subseconds: bool) -> String {
    let ms = ms.max(0);
    let cent = (ms / 10) % 100;
    let sec = (ms / 1_000) % 60;
    let min = (ms / 60_000) % 60;
    let hrs = (ms / 3_600_000) % 100;

    if subseconds {
        format!("{:02}:{:02}:{:02}.{:02}", hrs, min, sec, cent)
    } else {
        format!("{:02}:{:02}:{:02}", hrs, min, sec)
    }
}
