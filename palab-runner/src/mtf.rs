//! MTF stage: fetch candles of every timeframe, merge them onto the H1
//! timeline and persist raw and merged datasets.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use palab_core::data::{build_mtf_rows, CandleProvider, CandleSet};
use palab_core::domain::{MtfRow, Timeframe};

use crate::config::Settings;
use crate::datasets::{write_dataset, CandleRecord, Dataset, MtfRecord};

/// Every timeframe, base first.
const ALL_TIMEFRAMES: [Timeframe; 4] = [Timeframe::H1, Timeframe::H4, Timeframe::D1, Timeframe::W1];

/// Result of one MTF run.
#[derive(Debug, Clone)]
pub struct MtfOutcome {
    pub symbol: String,
    /// Candles received per timeframe, base first.
    pub candle_counts: Vec<(Timeframe, usize)>,
    pub rows: Vec<MtfRow>,
    pub output: PathBuf,
}

impl MtfOutcome {
    /// Up to `n` trailing merged rows.
    pub fn tail(&self, n: usize) -> &[MtfRow] {
        &self.rows[self.rows.len().saturating_sub(n)..]
    }
}

/// Fetch every timeframe. Failed fetches arrive as empty sequences.
pub fn fetch_candle_set(provider: &dyn CandleProvider, symbol: &str, limit: usize) -> CandleSet {
    let mut set = CandleSet::default();
    for tf in ALL_TIMEFRAMES {
        let mut candles = provider.fetch_candles(symbol, tf, tf.fetch_limit(limit));
        candles.sort_by_key(|c| c.close_time_ms);
        if candles.is_empty() {
            tracing::warn!(symbol, timeframe = %tf, "no candles received");
        }
        *set.get_mut(tf) = candles;
    }
    set
}

/// Write one raw candle dataset per timeframe into `dir`.
pub fn write_candle_set(dir: &Path, symbol: &str, set: &CandleSet) -> Result<()> {
    for tf in ALL_TIMEFRAMES {
        let path = dir.join(Dataset::Candles(tf).file_name(symbol));
        let records: Vec<CandleRecord> = set.get(tf).iter().map(CandleRecord::from).collect();
        write_dataset(&path, &records)?;
        tracing::debug!(path = %path.display(), rows = records.len(), "wrote candles");
    }
    Ok(())
}

/// Merge an already fetched candle set and write the merged dataset.
pub fn merge_candle_set(set: &CandleSet, output: &Path) -> Result<Vec<MtfRow>> {
    let rows = build_mtf_rows(set).context("Failed to compute EMAs")?;
    let records: Vec<MtfRecord> = rows.iter().map(MtfRecord::from).collect();
    write_dataset(output, &records)?;
    Ok(rows)
}

/// Full MTF stage for `symbol` with `limit` H1 candles.
pub fn run_mtf(
    provider: &dyn CandleProvider,
    settings: &Settings,
    symbol: &str,
    limit: usize,
) -> Result<MtfOutcome> {
    tracing::info!(symbol, limit, provider = provider.name(), "fetching candles");
    let set = fetch_candle_set(provider, symbol, limit);
    write_candle_set(&settings.output_dir, symbol, &set)?;

    let output = settings.dataset_path(symbol, Dataset::Mtf);
    let rows = merge_candle_set(&set, &output)?;
    tracing::info!(rows = rows.len(), path = %output.display(), "wrote merged dataset");

    Ok(MtfOutcome {
        symbol: symbol.to_string(),
        candle_counts: ALL_TIMEFRAMES.iter().map(|&tf| (tf, set.get(tf).len())).collect(),
        rows,
        output,
    })
}

/// Binance provider configured from `settings`.
pub fn binance_provider(settings: &Settings) -> Result<palab_core::data::BinanceProvider> {
    palab_core::data::BinanceProvider::new(
        settings.binance_base_url.clone(),
        settings.http_timeout(),
        &settings.user_agent,
    )
    .context("Failed to build Binance client")
}

#[cfg(test)]
mod tests {
    use super::*;
    use palab_core::data::DataError;
    use palab_core::domain::Candle;

    const HOUR: i64 = 3_600_000;

    struct SyntheticProvider;

    impl CandleProvider for SyntheticProvider {
        fn name(&self) -> &str {
            "synthetic"
        }

        fn try_fetch(
            &self,
            _symbol: &str,
            timeframe: Timeframe,
            limit: usize,
        ) -> Result<Vec<Candle>, DataError> {
            let span = match timeframe {
                Timeframe::H1 => HOUR,
                Timeframe::H4 => 4 * HOUR,
                Timeframe::D1 => 24 * HOUR,
                Timeframe::W1 => return Err(DataError::Timeout("weekly".into())),
            };
            Ok((0..limit)
                .map(|i| {
                    let close = 100.0 + i as f64;
                    Candle {
                        open_time_ms: i as i64 * span,
                        open: close - 0.5,
                        high: close + 1.0,
                        low: close - 1.0,
                        close,
                        volume: 1.0,
                        close_time_ms: i as i64 * span + span - 1,
                    }
                })
                .collect())
        }
    }

    struct DownProvider;

    impl CandleProvider for DownProvider {
        fn name(&self) -> &str {
            "down"
        }

        fn try_fetch(&self, _: &str, _: Timeframe, _: usize) -> Result<Vec<Candle>, DataError> {
            Err(DataError::NetworkUnreachable("offline".into()))
        }
    }

    fn settings_in(dir: &Path) -> Settings {
        Settings {
            output_dir: dir.to_path_buf(),
            ..Settings::default()
        }
    }

    #[test]
    fn writes_raw_and_merged_datasets() {
        let dir = tempfile::tempdir().unwrap();
        let settings = settings_in(dir.path());
        let outcome = run_mtf(&SyntheticProvider, &settings, "BTCUSDT", 120).unwrap();

        assert_eq!(outcome.rows.len(), 120);
        assert_eq!(outcome.candle_counts[0], (Timeframe::H1, 120));
        assert_eq!(outcome.candle_counts[1], (Timeframe::H4, 100));
        assert_eq!(outcome.candle_counts[3], (Timeframe::W1, 0));
        assert_eq!(outcome.tail(3).len(), 3);
        assert_eq!(outcome.tail(3)[2].t_close, 120 * HOUR - 1);

        for name in ["BTCUSDT_1h.csv", "BTCUSDT_4h.csv", "BTCUSDT_1d.csv", "BTCUSDT_1w.csv"] {
            assert!(dir.path().join(name).exists(), "{name} missing");
        }
        let merged = std::fs::read_to_string(&outcome.output).unwrap();
        assert_eq!(merged.lines().count(), 121);
        // Weekly feed failed: its columns stay empty
        assert!(merged.lines().last().unwrap().ends_with(",,"));
    }

    #[test]
    fn unreachable_exchange_yields_header_only_dataset() {
        let dir = tempfile::tempdir().unwrap();
        let settings = settings_in(dir.path());
        let outcome = run_mtf(&DownProvider, &settings, "BTCUSDT", 50).unwrap();

        assert!(outcome.rows.is_empty());
        assert!(outcome.tail(3).is_empty());
        let merged = std::fs::read_to_string(&outcome.output).unwrap();
        assert_eq!(merged.lines().count(), 1);
        assert!(merged.starts_with("t_close_h1,"));
    }
}
