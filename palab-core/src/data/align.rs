//! Causal multi-timeframe alignment.
//!
//! For each base candle with close time `t`, every higher timeframe contributes
//! the rightmost candle whose close time is `<= t`. A higher candle that is
//! still open at `t` is never visible. Lookup is a binary search over a
//! precomputed close-time index, O(log m) per base candle.

use crate::domain::{Candle, Timeframe, TimestampMs};

/// A higher-timeframe candle sequence with its sorted close-time index.
#[derive(Debug, Clone)]
pub struct TimeframeSeries<'a> {
    pub timeframe: Timeframe,
    candles: &'a [Candle],
    close_times: Vec<TimestampMs>,
}

impl<'a> TimeframeSeries<'a> {
    /// Index a candle sequence. Candles must be in chronological order
    /// (close times non-decreasing), as delivered by the provider.
    pub fn new(timeframe: Timeframe, candles: &'a [Candle]) -> Self {
        let close_times: Vec<TimestampMs> = candles.iter().map(|c| c.close_time_ms).collect();
        debug_assert!(
            close_times.windows(2).all(|w| w[0] <= w[1]),
            "{timeframe} candles are not sorted by close time"
        );
        Self {
            timeframe,
            candles,
            close_times,
        }
    }

    /// Latest candle already closed at `t` (close time `<= t`), if any.
    pub fn latest_closed_at(&self, t: TimestampMs) -> Option<AlignedRef<'a>> {
        let closed = self.close_times.partition_point(|&close| close <= t);
        let index = closed.checked_sub(1)?;
        Some(AlignedRef {
            index,
            candle: &self.candles[index],
        })
    }
}

/// Reference to a higher-timeframe candle together with its position, so
/// per-candle series (EMAs) of that timeframe can be read at the same index.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlignedRef<'a> {
    pub index: usize,
    pub candle: &'a Candle,
}

/// One base candle and the higher-timeframe candles visible from it.
#[derive(Debug, Clone)]
pub struct MtfFrame<'a> {
    pub base_index: usize,
    pub base: &'a Candle,
    higher: Vec<(Timeframe, Option<AlignedRef<'a>>)>,
}

impl<'a> MtfFrame<'a> {
    pub fn t_close(&self) -> TimestampMs {
        self.base.close_time_ms
    }

    /// Aligned reference for `timeframe`; `None` if no candle of that
    /// timeframe had closed yet or the timeframe was not aligned.
    pub fn get(&self, timeframe: Timeframe) -> Option<AlignedRef<'a>> {
        self.higher
            .iter()
            .find(|(tf, _)| *tf == timeframe)
            .and_then(|(_, r)| *r)
    }

    pub fn higher(&self) -> &[(Timeframe, Option<AlignedRef<'a>>)] {
        &self.higher
    }
}

/// Produce one frame per base candle, attaching the latest closed candle of
/// every higher timeframe.
pub fn align_frames<'a>(base: &'a [Candle], higher: &[TimeframeSeries<'a>]) -> Vec<MtfFrame<'a>> {
    base.iter()
        .enumerate()
        .map(|(base_index, candle)| {
            let t = candle.close_time_ms;
            MtfFrame {
                base_index,
                base: candle,
                higher: higher
                    .iter()
                    .map(|series| (series.timeframe, series.latest_closed_at(t)))
                    .collect(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const HOUR: i64 = 3_600_000;

    fn candle(open_time: i64, span: i64, close: f64) -> Candle {
        Candle {
            open_time_ms: open_time,
            open: close,
            high: close + 1.0,
            low: close - 1.0,
            close,
            volume: 1.0,
            close_time_ms: open_time + span - 1,
        }
    }

    fn hourly(n: usize) -> Vec<Candle> {
        (0..n).map(|i| candle(i as i64 * HOUR, HOUR, 100.0 + i as f64)).collect()
    }

    fn four_hourly(n: usize) -> Vec<Candle> {
        (0..n)
            .map(|i| candle(i as i64 * 4 * HOUR, 4 * HOUR, 200.0 + i as f64))
            .collect()
    }

    #[test]
    fn higher_bar_visible_only_after_close() {
        let h1 = hourly(9);
        let h4 = four_hourly(2);
        let series = [TimeframeSeries::new(Timeframe::H4, &h4)];
        let frames = align_frames(&h1, &series);

        assert_eq!(frames.len(), 9);
        // Hours 0..=2 close before the first H4 bar closes
        for frame in &frames[..3] {
            assert!(frame.get(Timeframe::H4).is_none());
        }
        // Hour 3 closes at the same millisecond as H4 bar 0
        assert_eq!(frames[3].get(Timeframe::H4).map(|r| r.index), Some(0));
        assert_eq!(frames[6].get(Timeframe::H4).map(|r| r.index), Some(0));
        assert_eq!(frames[7].get(Timeframe::H4).map(|r| r.index), Some(1));
        // No H4 bar beyond index 1 exists
        assert_eq!(frames[8].get(Timeframe::H4).map(|r| r.index), Some(1));
    }

    #[test]
    fn empty_higher_timeframe_is_absent_not_error() {
        let h1 = hourly(3);
        let empty: Vec<Candle> = Vec::new();
        let series = [TimeframeSeries::new(Timeframe::D1, &empty)];
        let frames = align_frames(&h1, &series);
        assert!(frames.iter().all(|f| f.get(Timeframe::D1).is_none()));
    }

    #[test]
    fn unaligned_timeframe_is_absent() {
        let h1 = hourly(5);
        let h4 = four_hourly(1);
        let frames = align_frames(&h1, &[TimeframeSeries::new(Timeframe::H4, &h4)]);
        assert!(frames[4].get(Timeframe::W1).is_none());
        assert!(frames[4].get(Timeframe::H4).is_some());
    }

    #[test]
    fn references_point_into_source() {
        let h1 = hourly(8);
        let h4 = four_hourly(2);
        let frames = align_frames(&h1, &[TimeframeSeries::new(Timeframe::H4, &h4)]);
        let r = frames[7].get(Timeframe::H4).unwrap();
        assert!(std::ptr::eq(r.candle, &h4[1]));
        assert!(std::ptr::eq(frames[7].base, &h1[7]));
    }

    #[test]
    fn empty_base_yields_no_frames() {
        let h4 = four_hourly(2);
        let frames = align_frames(&[], &[TimeframeSeries::new(Timeframe::H4, &h4)]);
        assert!(frames.is_empty());
    }
}
