//! Lower-bound binary search over time-sorted sequences.

use crate::merge::Timestamp;

/// Returns the first index whose key is `>= t`, or `items.len()` when every
/// key is smaller.
///
/// `items` must be sorted ascending by `key`. Used to locate the table
/// truncation point and the per-series resume positions during overlap
/// resolution.
pub(crate) fn lower_bound_by_key<T, F>(items: &[T], t: Timestamp, key: F) -> usize
where
    F: Fn(&T) -> Timestamp,
{
    let mut left = 0;
    let mut right = items.len();

    while left < right {
        let mid = left + (right - left) / 2;
        if key(&items[mid]) >= t {
            right = mid;
        } else {
            left = mid + 1;
        }
    }

    left
}

/// [`lower_bound_by_key`] over a plain timestamp slice.
pub(crate) fn lower_bound(timestamps: &[Timestamp], t: Timestamp) -> usize {
    lower_bound_by_key(timestamps, t, |&ts| ts)
}
