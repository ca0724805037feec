//! Fixed-size sliding-window accumulators.
//!
//! Every detector is a single forward pass; these primitives keep the
//! per-bar cost O(1) amortized while preserving exact window boundaries.

use std::collections::VecDeque;

/// Bounded FIFO of the most recent `capacity` items.
#[derive(Debug, Clone)]
pub struct Ring<T> {
    capacity: usize,
    items: VecDeque<T>,
}

impl<T> Ring<T> {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            items: VecDeque::with_capacity(capacity),
        }
    }

    /// Append `item`, returning whichever item fell out of the window.
    ///
    /// A zero-capacity ring evicts every item immediately.
    pub fn push(&mut self, item: T) -> Option<T> {
        if self.capacity == 0 {
            return Some(item);
        }
        let evicted = if self.items.len() == self.capacity {
            self.items.pop_front()
        } else {
            None
        };
        self.items.push_back(item);
        evicted
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.items.len() == self.capacity
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.items.iter()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Extreme {
    Max,
    Min,
}

/// Rolling maximum or minimum over the last `window` pushed values.
///
/// Monotonic deque: each value enters and leaves once. Non-finite values
/// occupy a slot in the window but never become the extreme.
#[derive(Debug, Clone)]
pub struct RollingExtreme {
    window: usize,
    kind: Extreme,
    deque: VecDeque<(usize, f64)>,
    pushed: usize,
}

impl RollingExtreme {
    pub fn max(window: usize) -> Self {
        Self::new(window, Extreme::Max)
    }

    pub fn min(window: usize) -> Self {
        Self::new(window, Extreme::Min)
    }

    fn new(window: usize, kind: Extreme) -> Self {
        Self {
            window,
            kind,
            deque: VecDeque::new(),
            pushed: 0,
        }
    }

    pub fn push(&mut self, value: f64) {
        let index = self.pushed;
        self.pushed += 1;

        if value.is_finite() {
            let kind = self.kind;
            let dominated = |held: f64| match kind {
                Extreme::Max => held <= value,
                Extreme::Min => held >= value,
            };
            while self.deque.back().is_some_and(|&(_, held)| dominated(held)) {
                self.deque.pop_back();
            }
            self.deque.push_back((index, value));
        }

        // Oldest index still inside the window
        let oldest = self.pushed.saturating_sub(self.window);
        while self.deque.front().is_some_and(|&(i, _)| i < oldest) {
            self.deque.pop_front();
        }
    }

    /// Extreme of the current window; `None` if it holds no finite value.
    pub fn value(&self) -> Option<f64> {
        self.deque.front().map(|&(_, v)| v)
    }
}
