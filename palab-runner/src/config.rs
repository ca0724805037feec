//! Environment-driven settings and classifier parameter files.
//!
//! Every option is read from the process environment (after loading `.env`
//! when present) with an explicit parse rule and default. A value that fails
//! to parse falls back to the default with a warning.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use palab_core::backtest::CostModel;
use palab_core::classify::ClassifierParams;
use palab_core::data::binance::DEFAULT_BASE_URL;

use crate::datasets::Dataset;

/// Runtime settings shared by every stage.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub default_symbol: String,
    pub output_dir: PathBuf,
    pub timezone: String,
    pub http_timeout_secs: u64,
    pub user_agent: String,
    pub trading_mode: String,
    pub fees_bps: f64,
    pub slippage_bps: f64,
    pub binance_base_url: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

impl Settings {
    /// Load `.env` (if any) and read the process environment.
    pub fn from_env() -> Self {
        match dotenvy::dotenv() {
            Ok(path) => tracing::debug!(path = %path.display(), "loaded .env"),
            Err(err) if err.not_found() => {}
            Err(err) => tracing::warn!(error = %err, "failed to load .env"),
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let string = |key: &str, default: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| default.to_string())
        };

        Self {
            default_symbol: string("DEFAULT_SYMBOL", "BTCUSDT").to_ascii_uppercase(),
            output_dir: PathBuf::from(string("OUTPUT_DIR", "data")),
            timezone: string("TIMEZONE", "UTC"),
            http_timeout_secs: parse_or(&lookup, "HTTP_TIMEOUT_SEC", 30),
            user_agent: string("HTTP_USER_AGENT", "ea-pa-v1/0.2"),
            trading_mode: string("TRADING_MODE", "paper"),
            fees_bps: parse_or(&lookup, "FEES_BPS", 10.0),
            slippage_bps: parse_or(&lookup, "SLIPPAGE_BPS", 0.0),
            binance_base_url: string("BINANCE_BASE_URL", DEFAULT_BASE_URL),
        }
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    pub fn cost_model(&self) -> CostModel {
        CostModel::new(self.fees_bps, self.slippage_bps)
    }

    /// Symbol argument, or the configured default, upper-cased.
    pub fn symbol_or_default(&self, symbol: Option<&str>) -> String {
        symbol
            .map(|s| s.trim().to_ascii_uppercase())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| self.default_symbol.clone())
    }

    /// Default location of a dataset for `symbol` under the output directory.
    pub fn dataset_path(&self, symbol: &str, dataset: Dataset) -> PathBuf {
        self.output_dir.join(dataset.file_name(symbol))
    }
}

fn parse_or<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T {
    match lookup(key) {
        None => default,
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!(key, value = %raw, "unparsable setting, using default");
            default
        }),
    }
}

/// Read classifier thresholds from a TOML file. Omitted fields keep their
/// defaults; invalid values are rejected.
pub fn load_classifier_params(path: &Path) -> Result<ClassifierParams> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read params file {}", path.display()))?;
    let params: ClassifierParams = toml::from_str(&text)
        .with_context(|| format!("Failed to parse params file {}", path.display()))?;
    params.validate()?;
    Ok(params)
}
