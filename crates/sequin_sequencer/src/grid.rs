// SPDX-License-Identifier: MIT OR Apache-2.0
//! Timing grid used to snap effect times.

use serde::{Deserialize, Serialize};

/// A regular grid of time points, `period` seconds apart
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimingGrid {
    period: f64,
}

impl TimingGrid {
    /// Default sequence frame rate in Hz
    pub const DEFAULT_FREQUENCY: f64 = 20.0;

    /// Grid with points `period` seconds apart.
    ///
    /// Non-finite or non-positive periods produce a grid that leaves times untouched.
    pub fn with_period(period: f64) -> Self {
        Self { period }
    }

    /// Grid for a frame rate in Hz
    pub fn with_frequency(frequency: f64) -> Self {
        Self {
            period: 1.0 / frequency,
        }
    }

    /// Spacing between grid points in seconds
    pub fn period(&self) -> f64 {
        self.period
    }

    /// Frame rate in Hz
    pub fn frequency(&self) -> f64 {
        1.0 / self.period
    }

    fn is_usable(&self) -> bool {
        self.period.is_finite() && self.period > 0.0
    }

    /// Snap `time` to the nearest grid point. Exact ties go to the even multiple.
    pub fn snap(&self, time: f64) -> f64 {
        if !self.is_usable() || !time.is_finite() {
            return time;
        }
        (time / self.period).round_ties_even() * self.period
    }
}

impl Default for TimingGrid {
    fn default() -> Self {
        Self::with_frequency(Self::DEFAULT_FREQUENCY)
    }
}
