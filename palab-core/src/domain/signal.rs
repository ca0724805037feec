//! Signal — the funnel verdict for one annotated bar.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::TimestampMs;
use crate::error::ConfigError;

/// Identifier of the long-only trend rule.
pub const RULE_ID: &str = "SIG-V0-TREND";

/// Human-readable form of the entry condition, carried into the signals dataset.
pub const RULE_NOTES: &str = "trend_bull && !tight && (bo_up || rev_bull)";

/// Cross-timeframe regime filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum RegimeMode {
    /// Daily EMA20 > EMA50.
    #[default]
    #[serde(rename = "D_ONLY")]
    DOnly,
    /// Daily and weekly EMA20 > EMA50.
    #[serde(rename = "D_AND_W")]
    DAndW,
    /// 4-hour and daily EMA20 > EMA50.
    #[serde(rename = "H4_AND_D")]
    H4AndD,
    /// No regime filter.
    #[serde(rename = "NONE")]
    None,
}

impl RegimeMode {
    pub const ALL: [RegimeMode; 4] = [
        RegimeMode::DOnly,
        RegimeMode::DAndW,
        RegimeMode::H4AndD,
        RegimeMode::None,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            RegimeMode::DOnly => "D_ONLY",
            RegimeMode::DAndW => "D_AND_W",
            RegimeMode::H4AndD => "H4_AND_D",
            RegimeMode::None => "NONE",
        }
    }
}

impl FromStr for RegimeMode {
    type Err = ConfigError;

    /// Case-insensitive parse; unknown modes are a configuration error.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        RegimeMode::ALL
            .into_iter()
            .find(|m| m.as_str() == upper)
            .ok_or_else(|| ConfigError::UnknownRegime(s.to_string()))
    }
}

impl fmt::Display for RegimeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Funnel outcome for one bar. Every stage flag is retained for auditing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub t_close: TimestampMs,
    pub close: f64,
    pub regime_mode: RegimeMode,
    pub regime_ok: bool,
    pub bar_ok: bool,
    pub tight_ok: bool,
    pub trig_ok: bool,
    pub entry: bool,
    pub rule_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn regime_parses_case_insensitively() {
        assert_eq!("d_only".parse::<RegimeMode>(), Ok(RegimeMode::DOnly));
        assert_eq!("H4_and_D".parse::<RegimeMode>(), Ok(RegimeMode::H4AndD));
        assert_eq!(" none ".parse::<RegimeMode>(), Ok(RegimeMode::None));
    }

    #[test]
    fn unknown_regime_is_config_error() {
        assert_eq!(
            "W_ONLY".parse::<RegimeMode>(),
            Err(ConfigError::UnknownRegime("W_ONLY".into()))
        );
    }

    #[test]
    fn display_round_trips_through_parse() {
        for mode in RegimeMode::ALL {
            assert_eq!(mode.to_string().parse::<RegimeMode>(), Ok(mode));
        }
    }
}
