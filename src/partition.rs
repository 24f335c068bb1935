//! Range partitioning
//!
//! Splits an inclusive integer interval into `n` contiguous pieces. Every piece
//! but the last has `floor(total / n)` values; the last piece also absorbs the
//! remainder. The union of the pieces is the input interval, with no gaps and
//! no overlaps.
//!
//! # Example
//!
//! ```
//! use primesplit::partition::partition;
//!
//! let pieces = partition(1, 10, 3);
//! assert_eq!(pieces[0].bounds(), (1, 3));
//! assert_eq!(pieces[1].bounds(), (4, 6));
//! assert_eq!(pieces[2].bounds(), (7, 10));
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::RangeInclusive;

/// One contiguous sub-interval handed to a unit or worker
///
/// Bounds are inclusive. An assignment with `start > end` is empty; these only
/// appear when more pieces were requested than the interval has values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IntervalAssignment {
    /// First value to scan
    pub start: i64,
    /// Last value to scan
    pub end: i64,
    /// 1-based position among its siblings
    pub index: usize,
}

impl IntervalAssignment {
    pub fn new(start: i64, end: i64, index: usize) -> Self {
        Self { start, end, index }
    }

    /// Inclusive bounds as a tuple
    pub fn bounds(&self) -> (i64, i64) {
        (self.start, self.end)
    }

    pub fn is_empty(&self) -> bool {
        self.start > self.end
    }

    /// Number of values covered; the full `i64` range is `2^64`
    pub fn len(&self) -> u128 {
        if self.is_empty() {
            0
        } else {
            (self.end as i128 - self.start as i128 + 1) as u128
        }
    }

    pub fn contains(&self, value: i64) -> bool {
        self.start <= value && value <= self.end
    }

    /// Values in scan order
    pub fn values(&self) -> RangeInclusive<i64> {
        self.start..=self.end
    }
}

impl fmt::Display for IntervalAssignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

/// Partition `[start, end]` into `n` assignments indexed `1..=n`
///
/// Returns an empty vector for `n == 0`. If `start > end` every assignment is
/// empty.
pub fn partition(start: i64, end: i64, n: usize) -> Vec<IntervalAssignment> {
    if n == 0 {
        return Vec::new();
    }

    let total = (end as i128 - start as i128 + 1).max(0);
    let pieces = n as i128;
    let len = total / pieces;
    let remainder = total % pieces;
    let base = start as i128;

    let mut out = Vec::with_capacity(n);
    for i in 0..pieces - 1 {
        let lo = base + i * len;
        let hi = lo + len - 1;
        out.push(IntervalAssignment::new(
            lo as i64,
            hi as i64,
            (i + 1) as usize,
        ));
    }

    let last_len = len + remainder;
    let last_start = if total == 0 {
        base
    } else {
        end as i128 - last_len + 1
    };
    let last_end = if total == 0 { base - 1 } else { end as i128 };
    out.push(IntervalAssignment::new(last_start as i64, last_end as i64, n));

    out
}
