//! Body ratio and bar type.

use crate::domain::BarType;

/// Upper clip on the body ratio.
pub const MAX_BODY_RATIO: f64 = 10.0;

/// `|close - open| / (high - low)`, clipped to `[0, 10]`.
///
/// A bar without a positive range, or with undefined prices, has ratio 0.
pub fn body_ratio(open: f64, high: f64, low: f64, close: f64) -> f64 {
    let range = high - low;
    if range.is_nan() || range <= 0.0 {
        return 0.0;
    }
    let ratio = (close - open).abs() / range;
    if ratio.is_nan() {
        0.0
    } else {
        ratio.min(MAX_BODY_RATIO)
    }
}

/// Direction of the body when it is at least `min_ratio` of the range.
pub fn bar_type(open: f64, close: f64, ratio: f64, min_ratio: f64) -> BarType {
    if ratio < min_ratio {
        BarType::Doji
    } else if close > open {
        BarType::TrendBull
    } else if close < open {
        BarType::TrendBear
    } else {
        BarType::Doji
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bullish_bar_with_wide_body() {
        // range 14, body 10
        let ratio = body_ratio(100.0, 112.0, 98.0, 110.0);
        assert!((ratio - 10.0 / 14.0).abs() < 1e-12);
        assert_eq!(bar_type(100.0, 110.0, ratio, 0.3), BarType::TrendBull);
    }

    #[test]
    fn bearish_and_doji() {
        let ratio = body_ratio(110.0, 112.0, 98.0, 100.0);
        assert_eq!(bar_type(110.0, 100.0, ratio, 0.3), BarType::TrendBear);

        let small = body_ratio(100.0, 112.0, 98.0, 101.0);
        assert_eq!(bar_type(100.0, 101.0, small, 0.3), BarType::Doji);
    }

    #[test]
    fn zero_range_has_zero_ratio() {
        assert_eq!(body_ratio(100.0, 100.0, 100.0, 100.0), 0.0);
        assert_eq!(bar_type(100.0, 100.0, 0.0, 0.3), BarType::Doji);
    }

    #[test]
    fn undefined_prices_have_zero_ratio() {
        assert_eq!(body_ratio(f64::NAN, 112.0, 98.0, 110.0), 0.0);
        assert_eq!(body_ratio(100.0, f64::NAN, 98.0, 110.0), 0.0);
    }

    #[test]
    fn ratio_is_clipped() {
        // body 50 over a range of 1 (inconsistent OHLC) clips at 10
        assert_eq!(body_ratio(100.0, 101.0, 100.0, 150.0), MAX_BODY_RATIO);
    }

    #[test]
    fn zero_threshold_still_needs_direction() {
        assert_eq!(bar_type(100.0, 100.0, 0.0, 0.0), BarType::Doji);
        assert_eq!(bar_type(100.0, 100.5, 0.1, 0.0), BarType::TrendBull);
    }
}
