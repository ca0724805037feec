//! Close-price series keyed by bar close time.

use crate::domain::TimestampMs;

/// Closes sorted by time with unique timestamps.
///
/// Built from raw `(t, close)` points: undefined closes are dropped, and for a
/// repeated timestamp the point that came last in the input wins.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CloseSeries {
    times: Vec<TimestampMs>,
    closes: Vec<f64>,
}

impl CloseSeries {
    pub fn new(points: impl IntoIterator<Item = (TimestampMs, f64)>) -> Self {
        let mut points: Vec<(TimestampMs, f64)> =
            points.into_iter().filter(|(_, c)| c.is_finite()).collect();
        // Stable: duplicates keep their input order
        points.sort_by_key(|&(t, _)| t);

        let mut times: Vec<TimestampMs> = Vec::with_capacity(points.len());
        let mut closes: Vec<f64> = Vec::with_capacity(points.len());
        for (t, close) in points {
            if times.last() == Some(&t) {
                if let Some(last) = closes.last_mut() {
                    *last = close;
                }
            } else {
                times.push(t);
                closes.push(close);
            }
        }

        Self { times, closes }
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// Position of timestamp `t`, if present.
    pub fn index_of(&self, t: TimestampMs) -> Option<usize> {
        self.times.binary_search(&t).ok()
    }

    pub fn time(&self, index: usize) -> TimestampMs {
        self.times[index]
    }

    pub fn close(&self, index: usize) -> f64 {
        self.closes[index]
    }

    pub fn times(&self) -> &[TimestampMs] {
        &self.times
    }

    pub fn closes(&self) -> &[f64] {
        &self.closes
    }
}
