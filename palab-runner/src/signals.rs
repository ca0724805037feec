//! Signals stage: run the funnel over the annotated dataset.

use anyhow::Result;
use std::path::Path;

use palab_core::data::schema::ANNOTATED_FOR_SIGNALS;
use palab_core::domain::{RegimeMode, Signal};
use palab_core::funnel::{evaluate_signals, FunnelBar, FunnelCounts};

use crate::datasets::{read_dataset, write_dataset, AnnotatedRecord, SignalRecord};

/// Number of trailing entries reported in debug mode.
pub const DEBUG_TAIL: usize = 5;

#[derive(Debug, Clone, PartialEq)]
pub struct SignalsSummary {
    pub regime: RegimeMode,
    pub funnel: FunnelCounts,
    /// The last [`DEBUG_TAIL`] entry signals, oldest first.
    pub last_entries: Vec<Signal>,
}

/// Evaluate `input` under `regime` and write the signals dataset to `output`.
pub fn run_signals(input: &Path, output: &Path, regime: RegimeMode) -> Result<SignalsSummary> {
    let records: Vec<AnnotatedRecord> = read_dataset(input, &ANNOTATED_FOR_SIGNALS)?;
    if records.is_empty() {
        tracing::warn!(path = %input.display(), "annotated dataset has no rows");
    }

    let bars: Vec<FunnelBar> = records.iter().map(AnnotatedRecord::to_funnel_bar).collect();
    let set = evaluate_signals(&bars, regime);

    let rows: Vec<SignalRecord> = records
        .iter()
        .zip(&set.signals)
        .map(|(record, signal)| SignalRecord::new(record, signal))
        .collect();
    write_dataset(output, &rows)?;

    let entries: Vec<&Signal> = set.entries().collect();
    let last_entries = entries[entries.len().saturating_sub(DEBUG_TAIL)..]
        .iter()
        .map(|s| (*s).clone())
        .collect();

    let f = set.funnel;
    tracing::info!(
        regime = regime.as_str(),
        total = f.total,
        regime_ok = f.regime,
        entries = f.entries,
        path = %output.display(),
        "wrote signals dataset"
    );

    Ok(SignalsSummary {
        regime,
        funnel: f,
        last_entries,
    })
}
