//! Trade — a resolved close-only long trade.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::TimestampMs;

/// Why a trade was closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitReason {
    Target,
    Stop,
    /// End of data: no exit condition before the series ran out.
    Eod,
}

impl ExitReason {
    pub fn as_str(self) -> &'static str {
        match self {
            ExitReason::Target => "target",
            ExitReason::Stop => "stop",
            ExitReason::Eod => "eod",
        }
    }
}

impl fmt::Display for ExitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A complete round trip: entry on a signal close, exit on a later close.
///
/// Prices are slippage-adjusted. `r` is the risk unit `entry - stop` and is
/// always positive for a recorded trade.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub t_entry: TimestampMs,
    pub t_exit: TimestampMs,
    pub entry: f64,
    pub stop: f64,
    pub target: f64,
    pub exit_price: f64,
    pub exit_reason: ExitReason,
    pub r: f64,
    pub pnl_r: f64,
    pub pnl_quote: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_reason_labels() {
        assert_eq!(ExitReason::Target.to_string(), "target");
        assert_eq!(ExitReason::Stop.to_string(), "stop");
        assert_eq!(serde_json::to_string(&ExitReason::Eod).unwrap(), "\"eod\"");
    }
}
