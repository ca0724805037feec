//! Aggregate statistics over the trades of one run.

use serde::{Deserialize, Serialize};

use super::engine::Rejection;
use crate::domain::{ExitReason, Trade};

/// Rejected signals by cause.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RejectionCounts {
    pub unknown_timestamp: usize,
    pub insufficient_history: usize,
    pub non_positive_risk: usize,
}

impl RejectionCounts {
    pub fn record(&mut self, rejection: &Rejection) {
        match rejection {
            Rejection::UnknownTimestamp { .. } => self.unknown_timestamp += 1,
            Rejection::InsufficientHistory { .. } => self.insufficient_history += 1,
            Rejection::NonPositiveRisk { .. } => self.non_positive_risk += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.unknown_timestamp + self.insufficient_history + self.non_positive_risk
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BacktestMetrics {
    pub trades: usize,
    /// Trades closed at the target.
    pub wins: usize,
    /// Trades closed at the stop.
    pub losses: usize,
    pub eod: usize,
    pub win_rate: f64,
    pub avg_r: f64,
    /// Mean `pnl_r` per trade; 0 with no trades.
    pub expectancy_r: f64,
    pub rejected: RejectionCounts,
}

impl BacktestMetrics {
    pub fn compute(trades: &[Trade], rejected: RejectionCounts) -> Self {
        let n = trades.len();
        let count = |reason: ExitReason| trades.iter().filter(|t| t.exit_reason == reason).count();
        let wins = count(ExitReason::Target);

        let (win_rate, avg_r) = if n == 0 {
            (0.0, 0.0)
        } else {
            let total_r: f64 = trades.iter().map(|t| t.pnl_r).sum();
            (wins as f64 / n as f64, total_r / n as f64)
        };

        Self {
            trades: n,
            wins,
            losses: count(ExitReason::Stop),
            eod: count(ExitReason::Eod),
            win_rate,
            avg_r,
            expectancy_r: avg_r,
            rejected,
        }
    }
}
