//! Screen countdown driven by elapsed ticks.

use serde::Serialize;
use std::time::Duration;

/// How a screen renders its remaining time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClockFormat {
    /// `m:ss`, as on the bias screen
    #[default]
    Minutes,
    /// `mm:ss`, as on the debate screen
    PaddedMinutes,
}

#[derive(Debug, Clone)]
pub struct Countdown {
    remaining: Duration,
    format: ClockFormat,
}

/// Countdown state as shown to a renderer
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimerView {
    pub seconds_left: u64,
    pub display: String,
}

impl Countdown {
    pub fn new(total: Duration) -> Self {
        Self {
            remaining: total,
            format: ClockFormat::default(),
        }
    }

    pub fn from_secs(secs: u32) -> Self {
        Self::new(Duration::from_secs(u64::from(secs)))
    }

    pub fn with_format(mut self, format: ClockFormat) -> Self {
        self.format = format;
        self
    }

    /// Subtract `elapsed`; returns true only on the tick that reaches zero
    pub fn tick(&mut self, elapsed: Duration) -> bool {
        if self.remaining.is_zero() {
            return false;
        }
        self.remaining = self.remaining.saturating_sub(elapsed);
        self.remaining.is_zero()
    }

    /// Whole seconds left, rounded up so "0" only shows once time is out
    pub fn seconds_left(&self) -> u64 {
        let secs = self.remaining.as_secs();
        if self.remaining.subsec_nanos() > 0 {
            secs + 1
        } else {
            secs
        }
    }

    pub fn display(&self) -> String {
        let secs = self.seconds_left();
        match self.format {
            ClockFormat::Minutes => format!("{}:{:02}", secs / 60, secs % 60),
            ClockFormat::PaddedMinutes => format!("{:02}:{:02}", secs / 60, secs % 60),
        }
    }

    pub fn view(&self) -> TimerView {
        TimerView {
            seconds_left: self.seconds_left(),
            display: self.display(),
        }
    }
}
