//! Offset bisection inside a text run
//!
//! Finds the character offset at which a geometric predicate flips, by
//! halving the run until the split point is pinned down.

use std::cmp::Ordering;
use std::ops::Range;

/// Locate the offset `k` in `[start, end]` where the comparator changes side.
///
/// `cmp(a, b)` is called with two adjacent sub-ranges `a = start..mid` and
/// `b = mid..end` and reports where the cutoff lies:
/// * `Less`: the cutoff is inside `a`, keep searching the left half
/// * `Greater`: the cutoff is inside `b`, keep searching the right half
/// * `Equal`: the cutoff is exactly at `mid`
///
/// When a single character remains, the comparator is evaluated on the
/// collapsed ranges at both ends and `Less` picks `start`, anything else
/// picks `end`. Runs in O(log N) comparator calls.
pub fn bisect<F>(mut start: usize, mut end: usize, mut cmp: F) -> usize
where
    F: FnMut(Range<usize>, Range<usize>) -> Ordering,
{
    if end <= start {
        return start;
    }
    loop {
        if end - start == 1 {
            return match cmp(start..start, end..end) {
                Ordering::Less => start,
                _ => end,
            };
        }
        let mid = start + (end - start) / 2;
        match cmp(start..mid, mid..end) {
            Ordering::Less => end = mid,
            Ordering::Greater => start = mid,
            Ordering::Equal => return mid,
        }
    }
}
