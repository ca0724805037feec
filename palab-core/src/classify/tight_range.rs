//! Tight-range (consolidation) detector.
//!
//! Over the last N bars, inclusive of the current one, a bar is flagged when
//! the window is narrow relative to its average bar, consecutive bars mostly
//! overlap, and at least half the bodies are small.

use serde::{Deserialize, Serialize};

use super::window::{RollingExtreme, Ring};
use crate::error::ConfigError;

/// Share of small-bodied bars required in the window.
const SMALL_BODY_SHARE_MIN: f64 = 0.5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TightRangeParams {
    /// Window size N.
    pub window: usize,
    /// A bar counts as small-bodied when its body ratio is below this.
    pub body_ratio_max: f64,
    /// Span over average range must be below this.
    pub span_factor_max: f64,
    /// Minimum fraction of overlapping consecutive pairs.
    pub overlap_min: f64,
}

impl Default for TightRangeParams {
    fn default() -> Self {
        Self {
            window: 10,
            body_ratio_max: 0.3,
            span_factor_max: 2.0,
            overlap_min: 0.6,
        }
    }
}

impl TightRangeParams {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.window == 0 {
            return Err(ConfigError::invalid("tight_range.window", "must be >= 1"));
        }
        if !(self.body_ratio_max >= 0.0) {
            return Err(ConfigError::invalid("tight_range.body_ratio_max", "must be >= 0"));
        }
        if !(self.span_factor_max > 0.0) {
            return Err(ConfigError::invalid("tight_range.span_factor_max", "must be > 0"));
        }
        if !(0.0..=1.0).contains(&self.overlap_min) {
            return Err(ConfigError::invalid("tight_range.overlap_min", "must be in [0, 1]"));
        }
        Ok(())
    }
}

/// Streaming tight-range detector. Feed bars in chronological order.
#[derive(Debug, Clone)]
pub struct TightRange {
    params: TightRangeParams,
    ranges: Ring<f64>,
    positive_ranges: usize,
    undefined_ranges: usize,
    small_bodies: Ring<bool>,
    small_count: usize,
    overlaps: Ring<bool>,
    overlap_count: usize,
    max_high: RollingExtreme,
    min_low: RollingExtreme,
    prev: Option<(f64, f64)>,
}

impl TightRange {
    pub fn new(params: &TightRangeParams) -> Self {
        let n = params.window;
        Self {
            params: params.clone(),
            ranges: Ring::new(n),
            positive_ranges: 0,
            undefined_ranges: 0,
            small_bodies: Ring::new(n),
            small_count: 0,
            overlaps: Ring::new(n.saturating_sub(1)),
            overlap_count: 0,
            max_high: RollingExtreme::max(n),
            min_low: RollingExtreme::min(n),
            prev: None,
        }
    }

    /// Push the next bar and report whether its trailing window is tight.
    pub fn push(&mut self, high: f64, low: f64, body_ratio: f64) -> bool {
        let range = high - low;
        self.admit_range(range, 1);
        if let Some(old) = self.ranges.push(range) {
            self.admit_range(old, -1);
        }

        let small = body_ratio < self.params.body_ratio_max;
        self.small_count += usize::from(small);
        if let Some(old) = self.small_bodies.push(small) {
            self.small_count -= usize::from(old);
        }

        if let Some((prev_high, prev_low)) = self.prev {
            let overlap = high.min(prev_high) - low.max(prev_low) > 0.0;
            self.overlap_count += usize::from(overlap);
            if let Some(old) = self.overlaps.push(overlap) {
                self.overlap_count -= usize::from(old);
            }
        }
        self.prev = Some((high, low));

        self.max_high.push(high);
        self.min_low.push(low);

        if !self.ranges.is_full() {
            return false;
        }
        self.is_tight()
    }

    /// Add (`sign = 1`) or remove (`sign = -1`) one range from the window
    /// counters.
    fn admit_range(&mut self, range: f64, sign: i8) {
        let count = |c: &mut usize| {
            if sign > 0 {
                *c += 1
            } else {
                *c -= 1
            }
        };
        if !range.is_finite() {
            count(&mut self.undefined_ranges);
            return;
        }
        if range > 0.0 {
            count(&mut self.positive_ranges);
        }
    }

    fn is_tight(&self) -> bool {
        let n = self.params.window;
        if self.undefined_ranges > 0 || self.positive_ranges == 0 {
            return false;
        }
        // Summed fresh from the window so no rounding carries across bars.
        let avg_range = self.ranges.iter().sum::<f64>() / n as f64;
        if !(avg_range > 0.0) {
            return false;
        }
        let (Some(max_high), Some(min_low)) = (self.max_high.value(), self.min_low.value()) else {
            return false;
        };
        let span_ratio = (max_high - min_low) / avg_range;

        let overlap_share = if n > 1 {
            self.overlap_count as f64 / (n - 1) as f64
        } else {
            0.0
        };
        let small_share = self.small_count as f64 / n as f64;

        span_ratio < self.params.span_factor_max
            && overlap_share >= self.params.overlap_min
            && small_share >= SMALL_BODY_SHARE_MIN
    }
}
