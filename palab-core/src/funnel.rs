//! Signal funnel: regime filter + bar-type + trigger → long entry flag.
//!
//! Stateless apart from one dataset-wide check: the weekly regime only counts
//! when enough weekly EMA50 values exist anywhere in the input.

use crate::domain::{AlignedEmas, AnnotatedBar, BarType, BoDir, RegimeMode, Signal, TimestampMs, RULE_ID};

/// Minimum count of defined weekly EMA50 values for the weekly regime to pass.
pub const MIN_WEEKLY_HISTORY: usize = 5;

/// The subset of an annotated bar the funnel reads. Flags read back from a
/// dataset may be missing; a missing flag counts as false.
#[derive(Debug, Clone, PartialEq)]
pub struct FunnelBar {
    pub t_close: TimestampMs,
    pub close: f64,
    pub bar_type: Option<BarType>,
    pub is_tight_range: Option<bool>,
    pub bo_dir: Option<BoDir>,
    pub reversal_bar_bull: Option<bool>,
    pub emas: AlignedEmas,
}

impl From<&AnnotatedBar> for FunnelBar {
    fn from(bar: &AnnotatedBar) -> Self {
        Self {
            t_close: bar.t_close,
            close: bar.close,
            bar_type: Some(bar.bar_type),
            is_tight_range: Some(bar.is_tight_range),
            bo_dir: Some(bar.bo_dir),
            reversal_bar_bull: Some(bar.reversal_bar_bull),
            emas: bar.emas,
        }
    }
}

/// Pass count of each funnel stage, each counted independently over all bars.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FunnelCounts {
    pub total: usize,
    pub regime: usize,
    pub bar: usize,
    pub tight: usize,
    pub trig: usize,
    pub entries: usize,
}

impl FunnelCounts {
    fn record(&mut self, signal: &Signal) {
        self.total += 1;
        self.regime += usize::from(signal.regime_ok);
        self.bar += usize::from(signal.bar_ok);
        self.tight += usize::from(signal.tight_ok);
        self.trig += usize::from(signal.trig_ok);
        self.entries += usize::from(signal.entry);
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SignalSet {
    pub signals: Vec<Signal>,
    pub funnel: FunnelCounts,
}

impl SignalSet {
    /// Signals whose entry flag is set, in input order.
    pub fn entries(&self) -> impl Iterator<Item = &Signal> {
        self.signals.iter().filter(|s| s.entry)
    }
}

struct RegimeFilter {
    mode: RegimeMode,
    weekly_available: bool,
}

impl RegimeFilter {
    fn new(mode: RegimeMode, bars: &[FunnelBar]) -> Self {
        let weekly_values = bars.iter().filter(|b| b.emas.w.ema50.is_some()).count();
        Self {
            mode,
            weekly_available: weekly_values >= MIN_WEEKLY_HISTORY,
        }
    }

    fn passes(&self, emas: &AlignedEmas) -> bool {
        let weekly = self.weekly_available && emas.w.is_uptrend();
        match self.mode {
            RegimeMode::DOnly => emas.d.is_uptrend(),
            RegimeMode::DAndW => emas.d.is_uptrend() && weekly,
            RegimeMode::H4AndD => emas.h4.is_uptrend() && emas.d.is_uptrend(),
            RegimeMode::None => true,
        }
    }
}

/// Run every bar through the funnel.
pub fn evaluate_signals(bars: &[FunnelBar], mode: RegimeMode) -> SignalSet {
    let regime = RegimeFilter::new(mode, bars);
    let mut funnel = FunnelCounts::default();

    let signals = bars
        .iter()
        .map(|bar| {
            let regime_ok = regime.passes(&bar.emas);
            let bar_ok = bar.bar_type == Some(BarType::TrendBull);
            let tight_ok = !bar.is_tight_range.unwrap_or(false);
            let trig_ok = bar.bo_dir == Some(BoDir::Up) || bar.reversal_bar_bull.unwrap_or(false);

            let signal = Signal {
                t_close: bar.t_close,
                close: bar.close,
                regime_mode: mode,
                regime_ok,
                bar_ok,
                tight_ok,
                trig_ok,
                entry: regime_ok && bar_ok && tight_ok && trig_ok,
                rule_id: RULE_ID.to_string(),
            };
            funnel.record(&signal);
            signal
        })
        .collect();

    SignalSet { signals, funnel }
}
