//! Fatal error types shared across the engine.
//!
//! Data gaps (a signal that cannot be simulated) are not errors; see
//! `backtest::Rejection`. Transport failures never leave the candle provider;
//! see `data::provider::DataError`.

use thiserror::Error;

/// Invalid run configuration. Always fatal.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("indicator period must be > 0 (got {period})")]
    NonPositivePeriod { period: usize },

    #[error("unknown regime mode '{0}' (valid: D_ONLY, D_AND_W, H4_AND_D, NONE)")]
    UnknownRegime(String),

    #[error("invalid parameter '{name}': {reason}")]
    InvalidParameter { name: String, reason: String },
}

impl ConfigError {
    pub(crate) fn invalid(name: &str, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name: name.to_string(),
            reason: reason.into(),
        }
    }
}

/// A dataset is missing columns a stage requires. Always fatal.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SchemaError {
    #[error("{dataset}: missing columns {missing:?}; available: {present:?}")]
    MissingColumns {
        dataset: String,
        missing: Vec<String>,
        present: Vec<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_columns_message_lists_both_sides() {
        let err = SchemaError::MissingColumns {
            dataset: "annotated".into(),
            missing: vec!["h1_low".into()],
            present: vec!["t_close_h1".into(), "h1_close".into()],
        };
        let msg = err.to_string();
        assert!(msg.contains("h1_low"));
        assert!(msg.contains("t_close_h1"));
        assert!(msg.contains("h1_close"));
    }

    #[test]
    fn unknown_regime_names_the_mode() {
        let err = ConfigError::UnknownRegime("WEEKLY".into());
        assert!(err.to_string().contains("WEEKLY"));
    }
}
