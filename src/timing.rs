//! Delay sampling between credential attempts.
//!
//! `TimingPolicy::next_delay` only samples a duration; callers do the
//! sleeping. Ranges are configured in milliseconds.

use crate::error::{ConfigError, ConfigResult};
use chrono::{Local, Timelike};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;
use std::time::Duration;

/// Delay-generation strategy for one scheduling run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum TimingMode {
    /// Uniform delay from a small fixed interval.
    #[default]
    Steady,
    /// Short delays inside the business window, longer ones outside it.
    BusinessAware,
    /// Paired with the spray attack plan; uses the business-aware distribution.
    Spray,
}

impl fmt::Display for TimingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Steady => write!(f, "steady"),
            Self::BusinessAware => write!(f, "business-aware"),
            Self::Spray => write!(f, "spray"),
        }
    }
}

impl FromStr for TimingMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "steady" => Ok(Self::Steady),
            "business-aware" | "business" => Ok(Self::BusinessAware),
            "spray" => Ok(Self::Spray),
            _ => Err(format!("unknown timing mode: {}", s)),
        }
    }
}

/// A delay interval in milliseconds, both ends inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelayRange {
    pub low_ms: u64,
    pub high_ms: u64,
}

impl DelayRange {
    pub const fn new(low_ms: u64, high_ms: u64) -> Self {
        Self { low_ms, high_ms }
    }

    /// A range that always yields zero.
    pub const fn zero() -> Self {
        Self::new(0, 0)
    }

    fn validate(&self, name: &'static str) -> ConfigResult<()> {
        if self.low_ms > self.high_ms {
            return Err(ConfigError::InvalidDelayRange {
                name,
                low_ms: self.low_ms,
                high_ms: self.high_ms,
            });
        }
        Ok(())
    }

    fn as_range(&self) -> RangeInclusive<u64> {
        self.low_ms..=self.high_ms
    }

    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Duration {
        if self.low_ms >= self.high_ms {
            return Duration::from_millis(self.low_ms);
        }
        Duration::from_millis(rng.gen_range(self.as_range()))
    }
}

/// Delay ranges and the business window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    pub steady: DelayRange,
    pub business: DelayRange,
    pub off_hours: DelayRange,
    /// First hour (local time, 0-23) of the business window.
    pub business_start_hour: u32,
    /// Last hour of the business window, inclusive.
    pub business_end_hour: u32,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            steady: DelayRange::new(500, 3000),
            business: DelayRange::new(500, 2000),
            off_hours: DelayRange::new(2000, 8000),
            business_start_hour: 9,
            business_end_hour: 17,
        }
    }
}

impl TimingConfig {
    /// All delays zero; for tests and lab use.
    pub fn immediate() -> Self {
        Self {
            steady: DelayRange::zero(),
            business: DelayRange::zero(),
            off_hours: DelayRange::zero(),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> ConfigResult<()> {
        self.steady.validate("steady")?;
        self.business.validate("business")?;
        self.off_hours.validate("off-hours")?;
        if self.business_start_hour > 23
            || self.business_end_hour > 23
            || self.business_start_hour > self.business_end_hour
        {
            return Err(ConfigError::InvalidBusinessWindow {
                start: self.business_start_hour,
                end: self.business_end_hour,
            });
        }
        Ok(())
    }

    fn in_business_window(&self, hour: u32) -> bool {
        (self.business_start_hour..=self.business_end_hour).contains(&hour)
    }
}

/// Stateless delay sampler for one timing mode.
#[derive(Debug, Clone)]
pub struct TimingPolicy {
    mode: TimingMode,
    config: TimingConfig,
}

impl TimingPolicy {
    pub fn new(mode: TimingMode, config: TimingConfig) -> Self {
        Self { mode, config }
    }

    pub fn mode(&self) -> TimingMode {
        self.mode
    }

    /// Sample the delay to wait before the next attempt.
    pub fn next_delay(&self) -> Duration {
        self.delay_for_hour(Local::now().hour())
    }

    /// Sample the delay as if the local hour were `hour`.
    pub fn delay_for_hour(&self, hour: u32) -> Duration {
        let mut rng = rand::thread_rng();
        self.range_for_hour(hour).sample(&mut rng)
    }

    fn range_for_hour(&self, hour: u32) -> &DelayRange {
        match self.mode {
            TimingMode::Steady => &self.config.steady,
            TimingMode::BusinessAware | TimingMode::Spray => {
                if self.config.in_business_window(hour) {
                    &self.config.business
                } else {
                    &self.config.off_hours
                }
            }
        }
    }
}
