//! Required-column contracts for the persisted datasets.
//!
//! Each stage validates the header row of its input before parsing a single
//! record, so a malformed file fails with the complete list of what is missing.

use crate::error::SchemaError;

/// Required columns of one dataset as consumed by one stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DatasetSchema {
    pub name: &'static str,
    pub required: &'static [&'static str],
}

/// Merged MTF dataset as read by the classifier stage.
pub const MTF_FOR_ANNOTATE: DatasetSchema = DatasetSchema {
    name: "mtf_with_ema",
    required: &["t_close_h1", "h1_open", "h1_high", "h1_low", "h1_close"],
};

/// Annotated dataset as read by the signal funnel.
pub const ANNOTATED_FOR_SIGNALS: DatasetSchema = DatasetSchema {
    name: "annotated",
    required: &[
        "t_close_h1",
        "bar_type",
        "is_tight_range",
        "bo_dir",
        "reversal_bar_bull",
        "h1_close",
        "d_ema20",
        "d_ema50",
        "h4_ema20",
        "h4_ema50",
        "w_ema20",
        "w_ema50",
    ],
};

/// Annotated dataset as read for the backtest close series.
pub const ANNOTATED_FOR_CLOSES: DatasetSchema = DatasetSchema {
    name: "annotated",
    required: &["t_close_h1", "h1_close"],
};

/// Signals dataset as read by the backtest.
pub const SIGNALS_FOR_BACKTEST: DatasetSchema = DatasetSchema {
    name: "signals",
    required: &["entry", "t_close_h1", "h1_close"],
};

impl DatasetSchema {
    /// Check that every required column is present in `headers`.
    pub fn validate<S: AsRef<str>>(&self, headers: &[S]) -> Result<(), SchemaError> {
        let present: Vec<String> = headers.iter().map(|h| h.as_ref().trim().to_string()).collect();
        let mut missing: Vec<String> = self
            .required
            .iter()
            .filter(|col| !present.iter().any(|h| h == *col))
            .map(|col| col.to_string())
            .collect();

        if missing.is_empty() {
            return Ok(());
        }
        missing.sort();
        Err(SchemaError::MissingColumns {
            dataset: self.name.to_string(),
            missing,
            present,
        })
    }
}
