//! Merge per-timeframe candles and their EMAs onto the H1 timeline.

use super::align::{align_frames, AlignedRef, TimeframeSeries};
use crate::domain::{AlignedEmas, Candle, EmaPair, MtfRow, Timeframe};
use crate::error::ConfigError;
use crate::indicators::{defined, ema_on_closes};

/// Fast EMA period used by the regime filter and gap-context detector.
pub const FAST_EMA: usize = 20;
/// Slow EMA period used by the regime filter.
pub const SLOW_EMA: usize = 50;

/// Candle sequences of every timeframe for one symbol.
#[derive(Debug, Clone, Default)]
pub struct CandleSet {
    pub h1: Vec<Candle>,
    pub h4: Vec<Candle>,
    pub d1: Vec<Candle>,
    pub w1: Vec<Candle>,
}

impl CandleSet {
    pub fn get(&self, timeframe: Timeframe) -> &[Candle] {
        match timeframe {
            Timeframe::H1 => &self.h1,
            Timeframe::H4 => &self.h4,
            Timeframe::D1 => &self.d1,
            Timeframe::W1 => &self.w1,
        }
    }

    pub fn get_mut(&mut self, timeframe: Timeframe) -> &mut Vec<Candle> {
        match timeframe {
            Timeframe::H1 => &mut self.h1,
            Timeframe::H4 => &mut self.h4,
            Timeframe::D1 => &mut self.d1,
            Timeframe::W1 => &mut self.w1,
        }
    }
}

/// EMA20/EMA50 series of one timeframe, positionally aligned with its candles.
struct EmaSeries {
    fast: Vec<f64>,
    slow: Vec<f64>,
}

impl EmaSeries {
    fn compute(candles: &[Candle]) -> Result<Self, ConfigError> {
        Ok(Self {
            fast: ema_on_closes(candles, FAST_EMA)?,
            slow: ema_on_closes(candles, SLOW_EMA)?,
        })
    }

    fn at(&self, index: usize) -> EmaPair {
        EmaPair::new(
            self.fast.get(index).copied().and_then(defined),
            self.slow.get(index).copied().and_then(defined),
        )
    }

    fn at_ref(&self, aligned: Option<AlignedRef<'_>>) -> EmaPair {
        aligned.map(|r| self.at(r.index)).unwrap_or_default()
    }
}

/// Build one merged row per H1 candle.
///
/// Higher-timeframe EMAs are read at the index of the aligned (already
/// closed) candle, so no row sees a value computed from an open bar.
pub fn build_mtf_rows(set: &CandleSet) -> Result<Vec<MtfRow>, ConfigError> {
    let h1_ema = EmaSeries::compute(&set.h1)?;
    let h4_ema = EmaSeries::compute(&set.h4)?;
    let d_ema = EmaSeries::compute(&set.d1)?;
    let w_ema = EmaSeries::compute(&set.w1)?;

    let higher: Vec<TimeframeSeries<'_>> = Timeframe::HIGHER
        .iter()
        .map(|&tf| TimeframeSeries::new(tf, set.get(tf)))
        .collect();

    let rows = align_frames(&set.h1, &higher)
        .into_iter()
        .map(|frame| {
            let h4 = frame.get(Timeframe::H4);
            let d = frame.get(Timeframe::D1);
            let w = frame.get(Timeframe::W1);
            MtfRow {
                t_close: frame.t_close(),
                open: frame.base.open,
                high: frame.base.high,
                low: frame.base.low,
                close: frame.base.close,
                h4_close: h4.map(|r| r.candle.close),
                d_close: d.map(|r| r.candle.close),
                w_close: w.map(|r| r.candle.close),
                emas: AlignedEmas {
                    h1: h1_ema.at(frame.base_index),
                    h4: h4_ema.at_ref(h4),
                    d: d_ema.at_ref(d),
                    w: w_ema.at_ref(w),
                },
            }
        })
        .collect();

    Ok(rows)
}
