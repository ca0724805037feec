//! Gap-to-EMA20 context detector.
//!
//! Flags bars whose last `window` closes all sat on the same side of the
//! base-timeframe EMA20, far enough from it on average.

use serde::{Deserialize, Serialize};

use super::window::Ring;
use crate::error::ConfigError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GapContextParams {
    pub window: usize,
    /// Minimum mean of `|close - ema20| / ema20` over the window.
    pub min_ratio: f64,
}

impl Default for GapContextParams {
    fn default() -> Self {
        Self {
            window: 10,
            min_ratio: 0.01,
        }
    }
}

impl GapContextParams {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.window == 0 {
            return Err(ConfigError::invalid("gap_context.window", "must be >= 1"));
        }
        if !(self.min_ratio >= 0.0) {
            return Err(ConfigError::invalid("gap_context.min_ratio", "must be >= 0"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct GapContext {
    min_ratio: f64,
    distances: Ring<Option<f64>>,
    positive: usize,
    negative: usize,
}

impl GapContext {
    pub fn new(params: &GapContextParams) -> Self {
        Self {
            min_ratio: params.min_ratio,
            distances: Ring::new(params.window),
            positive: 0,
            negative: 0,
        }
    }

    /// Push the next close and its EMA20. A missing or zero EMA makes the
    /// distance undefined, which keeps every window containing it unflagged.
    pub fn push(&mut self, close: f64, ema20: Option<f64>) -> bool {
        let distance = ema20
            .filter(|&ema| ema != 0.0)
            .map(|ema| (close - ema) / ema)
            .filter(|d| d.is_finite());

        let (pos, neg) = sign_counts(distance);
        self.positive += pos;
        self.negative += neg;
        if let Some(old) = self.distances.push(distance) {
            let (pos, neg) = sign_counts(old);
            self.positive -= pos;
            self.negative -= neg;
        }

        if !self.distances.is_full() {
            return false;
        }
        let window = self.distances.len();
        if self.positive != window && self.negative != window {
            return false;
        }

        let mean_abs = self
            .distances
            .iter()
            .flatten()
            .map(|d| d.abs())
            .sum::<f64>()
            / window as f64;
        mean_abs >= self.min_ratio
    }
}

fn sign_counts(distance: Option<f64>) -> (usize, usize) {
    match distance {
        Some(d) if d > 0.0 => (1, 0),
        Some(d) if d < 0.0 => (0, 1),
        _ => (0, 0),
    }
}
