//! Annotate stage: run the bar classifier over the merged MTF dataset.

use anyhow::{Context, Result};
use std::path::Path;

use palab_core::classify::{classify, ClassifierParams};
use palab_core::data::schema::MTF_FOR_ANNOTATE;
use palab_core::domain::{AnnotatedBar, BarType, BoDir, MtfRow};

use crate::datasets::{read_dataset, write_dataset, AnnotatedRecord, MtfRecord};

/// Flag totals of an annotated dataset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AnnotateSummary {
    pub rows: usize,
    pub trend_bull: usize,
    pub trend_bear: usize,
    pub doji: usize,
    pub tight_range: usize,
    pub bo_up: usize,
    pub bo_down: usize,
    pub reversal_bull: usize,
    pub reversal_bear: usize,
    pub gap_context: usize,
}

impl AnnotateSummary {
    pub fn from_bars(bars: &[AnnotatedBar]) -> Self {
        let mut s = Self {
            rows: bars.len(),
            ..Self::default()
        };
        for bar in bars {
            match bar.bar_type {
                BarType::TrendBull => s.trend_bull += 1,
                BarType::TrendBear => s.trend_bear += 1,
                BarType::Doji => s.doji += 1,
            }
            match bar.bo_dir {
                BoDir::Up => s.bo_up += 1,
                BoDir::Down => s.bo_down += 1,
                BoDir::None => {}
            }
            s.tight_range += usize::from(bar.is_tight_range);
            s.reversal_bull += usize::from(bar.reversal_bar_bull);
            s.reversal_bear += usize::from(bar.reversal_bar_bear);
            s.gap_context += usize::from(bar.is_20_gap_context);
        }
        s
    }
}

/// Read merged rows from `input`.
pub fn read_mtf(input: &Path) -> Result<Vec<MtfRow>> {
    let records: Vec<MtfRecord> = read_dataset(input, &MTF_FOR_ANNOTATE)?;
    Ok(records.iter().map(MtfRecord::to_row).collect())
}

/// Classify `input` and write the annotated dataset to `output`.
pub fn run_annotate(input: &Path, output: &Path, params: &ClassifierParams) -> Result<AnnotateSummary> {
    let rows = read_mtf(input)?;
    if rows.is_empty() {
        tracing::warn!(path = %input.display(), "merged dataset has no rows");
    }

    let bars = classify(&rows, params).context("Invalid classifier parameters")?;
    let records: Vec<AnnotatedRecord> = bars.iter().map(AnnotatedRecord::from).collect();
    write_dataset(output, &records)?;

    let summary = AnnotateSummary::from_bars(&bars);
    tracing::info!(
        rows = summary.rows,
        tight = summary.tight_range,
        bo_up = summary.bo_up,
        path = %output.display(),
        "wrote annotated dataset"
    );
    Ok(summary)
}
