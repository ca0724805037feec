//! Candle provider trait and structured error types.
//!
//! The provider is the only component with I/O latency. Its contract is
//! infallible at the boundary: any transport or format failure degrades to an
//! empty candle list and a logged warning, so the pipeline proceeds on partial
//! data instead of aborting.

use thiserror::Error;

use crate::domain::{Candle, Timeframe};

/// Failure inside a provider. Never crosses [`CandleProvider::fetch_candles`].
#[derive(Debug, Error)]
pub enum DataError {
    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("request timed out: {0}")]
    Timeout(String),

    #[error("HTTP {status} for {symbol} {interval}")]
    HttpStatus {
        status: u16,
        symbol: String,
        interval: String,
    },

    #[error("response format changed: {0}")]
    ResponseFormatChanged(String),

    #[error("data error: {0}")]
    Other(String),
}

/// Source of chronologically ordered candles.
pub trait CandleProvider: Send + Sync {
    /// Human-readable name of this provider.
    fn name(&self) -> &str;

    /// Fallible fetch of the latest `limit` candles.
    fn try_fetch(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        limit: usize,
    ) -> Result<Vec<Candle>, DataError>;

    /// Fetch the latest `limit` candles, or an empty list on any failure.
    fn fetch_candles(&self, symbol: &str, timeframe: Timeframe, limit: usize) -> Vec<Candle> {
        match self.try_fetch(symbol, timeframe, limit) {
            Ok(candles) => {
                tracing::debug!(
                    provider = self.name(),
                    symbol,
                    %timeframe,
                    count = candles.len(),
                    "fetched candles"
                );
                candles
            }
            Err(err) => {
                tracing::warn!(
                    provider = self.name(),
                    symbol,
                    %timeframe,
                    error = %err,
                    "candle fetch failed; continuing with empty series"
                );
                Vec::new()
            }
        }
    }
}
