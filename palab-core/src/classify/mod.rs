//! Bar classifier: per-bar pattern features in one forward pass.
//!
//! Every detector consumes bars in chronological order and answers for the
//! bar just pushed, using only that bar and a bounded window behind it. The
//! classification of bar `i` is therefore identical whether or not any bar
//! after `i` exists.

pub mod body;
pub mod breakout;
pub mod gap_context;
pub mod reversal;
pub mod tight_range;
pub mod window;

pub use body::{bar_type, body_ratio};
pub use breakout::{Breakout, BreakoutParams};
pub use gap_context::{GapContext, GapContextParams};
pub use reversal::{Reversal, ReversalFlags, ReversalParams};
pub use tight_range::{TightRange, TightRangeParams};

use serde::{Deserialize, Serialize};

use crate::domain::{AnnotatedBar, MtfRow};
use crate::error::ConfigError;

/// All classifier thresholds. Missing fields take their defaults when
/// deserialized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClassifierParams {
    /// Minimum body ratio for a trend bar.
    pub body_ratio_min: f64,
    pub tight_range: TightRangeParams,
    pub breakout: BreakoutParams,
    pub reversal: ReversalParams,
    pub gap_context: GapContextParams,
}

impl Default for ClassifierParams {
    fn default() -> Self {
        Self {
            body_ratio_min: 0.3,
            tight_range: TightRangeParams::default(),
            breakout: BreakoutParams::default(),
            reversal: ReversalParams::default(),
            gap_context: GapContextParams::default(),
        }
    }
}

impl ClassifierParams {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.body_ratio_min >= 0.0) {
            return Err(ConfigError::invalid("body_ratio_min", "must be >= 0"));
        }
        self.tight_range.validate()?;
        self.breakout.validate()?;
        self.reversal.validate()?;
        self.gap_context.validate()
    }
}

/// Streaming classifier holding the state of every detector.
#[derive(Debug, Clone)]
pub struct Classifier {
    body_ratio_min: f64,
    tight_range: TightRange,
    breakout: Breakout,
    reversal: Reversal,
    gap_context: GapContext,
}

impl Classifier {
    pub fn new(params: &ClassifierParams) -> Result<Self, ConfigError> {
        params.validate()?;
        Ok(Self {
            body_ratio_min: params.body_ratio_min,
            tight_range: TightRange::new(&params.tight_range),
            breakout: Breakout::new(&params.breakout),
            reversal: Reversal::new(&params.reversal),
            gap_context: GapContext::new(&params.gap_context),
        })
    }

    /// Classify the next base bar.
    pub fn push(&mut self, row: &MtfRow) -> AnnotatedBar {
        let ratio = body_ratio(row.open, row.high, row.low, row.close);
        let reversal = self.reversal.push(row.open, row.high, row.low, row.close);

        AnnotatedBar {
            t_close: row.t_close,
            open: row.open,
            high: row.high,
            low: row.low,
            close: row.close,
            body_ratio: ratio,
            bar_type: bar_type(row.open, row.close, ratio, self.body_ratio_min),
            is_tight_range: self.tight_range.push(row.high, row.low, ratio),
            bo_dir: self.breakout.push(row.high, row.low),
            reversal_bar_bull: reversal.bull,
            reversal_bar_bear: reversal.bear,
            is_20_gap_context: self.gap_context.push(row.close, row.emas.h1.ema20),
            emas: row.emas,
        }
    }
}

/// Classify every row of a merged MTF dataset.
pub fn classify(rows: &[MtfRow], params: &ClassifierParams) -> Result<Vec<AnnotatedBar>, ConfigError> {
    let mut classifier = Classifier::new(params)?;
    Ok(rows.iter().map(|row| classifier.push(row)).collect())
}
