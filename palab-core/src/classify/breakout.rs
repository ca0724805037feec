//! Breakout labeler.
//!
//! Thresholds come from the M bars strictly before the current one; the
//! current bar's own high and low never enter its thresholds.

use serde::{Deserialize, Serialize};

use super::window::RollingExtreme;
use crate::domain::BoDir;
use crate::error::ConfigError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BreakoutParams {
    /// Look-back M.
    pub lookback: usize,
    /// Margin beyond the prior extreme, as a fraction.
    pub delta: f64,
}

impl Default for BreakoutParams {
    fn default() -> Self {
        Self {
            lookback: 20,
            delta: 0.0,
        }
    }
}

impl BreakoutParams {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.lookback == 0 {
            return Err(ConfigError::invalid("breakout.lookback", "must be >= 1"));
        }
        if !(self.delta >= 0.0 && self.delta.is_finite()) {
            return Err(ConfigError::invalid("breakout.delta", "must be a finite value >= 0"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct Breakout {
    delta: f64,
    prior_high: RollingExtreme,
    prior_low: RollingExtreme,
}

impl Breakout {
    pub fn new(params: &BreakoutParams) -> Self {
        Self {
            delta: params.delta,
            prior_high: RollingExtreme::max(params.lookback),
            prior_low: RollingExtreme::min(params.lookback),
        }
    }

    /// Label the next bar, then admit it into the prior window.
    ///
    /// With fewer than M prior bars, whatever exists is used; the first bar
    /// has none and is always `none`. Up wins when both sides break.
    pub fn push(&mut self, high: f64, low: f64) -> BoDir {
        let up = self
            .prior_high
            .value()
            .is_some_and(|max| high > max * (1.0 + self.delta));
        let down = self
            .prior_low
            .value()
            .is_some_and(|min| low < min * (1.0 - self.delta));

        self.prior_high.push(high);
        self.prior_low.push(low);

        if up {
            BoDir::Up
        } else if down {
            BoDir::Down
        } else {
            BoDir::None
        }
    }
}
