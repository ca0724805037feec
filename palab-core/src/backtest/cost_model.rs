//! Cost model — flat-rate slippage and fees.
//!
//! Slippage is directional: the buy fill is higher than the close, the sell
//! fill is lower. Fees are charged on the notional of both legs.

/// Basis points per unit.
const BPS: f64 = 10_000.0;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CostModel {
    /// Fee per side in basis points.
    pub fee_bps: f64,
    /// Slippage per fill in basis points.
    pub slippage_bps: f64,
}

impl CostModel {
    pub fn new(fee_bps: f64, slippage_bps: f64) -> Self {
        Self {
            fee_bps,
            slippage_bps,
        }
    }

    pub fn frictionless() -> Self {
        Self::new(0.0, 0.0)
    }

    pub fn fee_fraction(&self) -> f64 {
        self.fee_bps / BPS
    }

    pub fn slippage_fraction(&self) -> f64 {
        self.slippage_bps / BPS
    }

    /// Fill price of a buy at `close`.
    pub fn buy_price(&self, close: f64) -> f64 {
        close * (1.0 + self.slippage_fraction())
    }

    /// Fill price of a sell at `close`.
    pub fn sell_price(&self, close: f64) -> f64 {
        close * (1.0 - self.slippage_fraction())
    }

    /// `(entry + exit) * fee_fraction`
    pub fn round_trip_fee(&self, entry: f64, exit: f64) -> f64 {
        (entry + exit) * self.fee_fraction()
    }
}
