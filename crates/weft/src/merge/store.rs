//! Per-series sample history and the backward two-run merge.

use crate::merge::Timestamp;

/// Append-only timestamp/value history for one series.
///
/// Timestamps are strictly increasing and the two arrays always have equal
/// length. The record is mutated only by [`merge_run`](Self::merge_run); it
/// never shrinks except when an exact-timestamp collision collapses a stored
/// sample into its incoming replacement.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SeriesRecord {
    timestamps: Vec<Timestamp>,
    values: Vec<f64>,
}

impl SeriesRecord {
    /// Creates an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sample timestamps, strictly increasing.
    pub fn timestamps(&self) -> &[Timestamp] {
        &self.timestamps
    }

    /// Sample values, parallel to [`timestamps`](Self::timestamps).
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Number of stored samples.
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    /// Returns true if the record holds no samples.
    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    /// Timestamp of the most recent stored sample.
    pub fn last_timestamp(&self) -> Option<Timestamp> {
        self.timestamps.last().copied()
    }

    /// Merges an incoming run into the stored history.
    ///
    /// When the run starts strictly after the stored tail (the common case
    /// for well-ordered live data) the arrays are appended directly. An
    /// overlapping run is merged back-to-front into a buffer sized for both
    /// inputs, taking the larger timestamp first; on an exact timestamp tie
    /// the incoming sample replaces the stored one.
    ///
    /// The caller has already validated that `timestamps` is strictly
    /// increasing and the same length as `values`.
    pub(crate) fn merge_run(&mut self, timestamps: &[Timestamp], values: &[f64]) {
        debug_assert_eq!(timestamps.len(), values.len());

        let after_tail = match (timestamps.first(), self.timestamps.last()) {
            (Some(&first), Some(&last)) => first > last,
            _ => true,
        };
        if after_tail {
            self.timestamps.extend_from_slice(timestamps);
            self.values.extend_from_slice(values);
            return;
        }

        let m = self.timestamps.len();
        let n = timestamps.len();
        self.timestamps.resize(m + n, 0);
        self.values.resize(m + n, 0.0);

        // i, j, k count remaining elements; the element under consideration
        // is at index - 1. Merging back-to-front keeps unread stored samples
        // ahead of the write cursor.
        let mut i = m;
        let mut j = n;
        let mut k = m + n;

        while i > 0 && j > 0 {
            k -= 1;
            if self.timestamps[i - 1] > timestamps[j - 1] {
                i -= 1;
                self.timestamps[k] = self.timestamps[i];
                self.values[k] = self.values[i];
            } else if self.timestamps[i - 1] < timestamps[j - 1] {
                j -= 1;
                self.timestamps[k] = timestamps[j];
                self.values[k] = values[j];
            } else {
                // Exact tie: the incoming sample supersedes the stored one.
                i -= 1;
                j -= 1;
                self.timestamps[k] = timestamps[j];
                self.values[k] = values[j];
            }
        }
        while j > 0 {
            k -= 1;
            j -= 1;
            self.timestamps[k] = timestamps[j];
            self.values[k] = values[j];
        }

        // Each collapsed tie leaves one unfilled slot at the front. Slide the
        // untouched stored prefix up against the merged tail, then drop the
        // leftover slots.
        if k > i {
            while i > 0 {
                k -= 1;
                i -= 1;
                self.timestamps[k] = self.timestamps[i];
                self.values[k] = self.values[i];
            }
            self.timestamps.drain(..k);
            self.values.drain(..k);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(samples: &[(Timestamp, f64)]) -> SeriesRecord {
        let mut r = SeriesRecord::new();
        let ts: Vec<_> = samples.iter().map(|&(t, _)| t).collect();
        let vs: Vec<_> = samples.iter().map(|&(_, v)| v).collect();
        r.merge_run(&ts, &vs);
        r
    }

    fn samples(r: &SeriesRecord) -> Vec<(Timestamp, f64)> {
        r.timestamps()
            .iter()
            .copied()
            .zip(r.values().iter().copied())
            .collect()
    }

    #[test]
    fn test_merge_into_empty() {
        let r = record(&[(10, 1.0), (20, 2.0)]);
        assert_eq!(samples(&r), vec![(10, 1.0), (20, 2.0)]);
    }

    #[test]
    fn test_merge_empty_run_is_noop() {
        let mut r = record(&[(10, 1.0)]);
        r.merge_run(&[], &[]);
        assert_eq!(samples(&r), vec![(10, 1.0)]);
    }

    #[test]
    fn test_append_fast_path() {
        let mut r = record(&[(10, 1.0), (20, 2.0)]);
        r.merge_run(&[30, 40], &[3.0, 4.0]);
        assert_eq!(
            samples(&r),
            vec![(10, 1.0), (20, 2.0), (30, 3.0), (40, 4.0)]
        );
    }

    #[test]
    fn test_interleaved_merge() {
        let mut r = record(&[(10, 1.0), (30, 3.0), (50, 5.0)]);
        r.merge_run(&[20, 40], &[2.0, 4.0]);
        assert_eq!(
            samples(&r),
            vec![(10, 1.0), (20, 2.0), (30, 3.0), (40, 4.0), (50, 5.0)]
        );
    }

    #[test]
    fn test_run_entirely_before_history() {
        let mut r = record(&[(30, 3.0), (40, 4.0)]);
        r.merge_run(&[10, 20], &[1.0, 2.0]);
        assert_eq!(
            samples(&r),
            vec![(10, 1.0), (20, 2.0), (30, 3.0), (40, 4.0)]
        );
    }

    #[test]
    fn test_tie_incoming_wins() {
        let mut r = record(&[(10, 1.0), (20, 2.0), (30, 3.0)]);
        r.merge_run(&[20], &[9.0]);
        assert_eq!(samples(&r), vec![(10, 1.0), (20, 9.0), (30, 3.0)]);
    }

    #[test]
    fn test_all_ties_replace_whole_history() {
        let mut r = record(&[(10, 1.0), (20, 2.0)]);
        r.merge_run(&[10, 20], &[9.0, 8.0]);
        assert_eq!(samples(&r), vec![(10, 9.0), (20, 8.0)]);
    }

    #[test]
    fn test_mixed_ties_and_inserts() {
        let mut r = record(&[(10, 1.0), (20, 2.0), (40, 4.0)]);
        r.merge_run(&[20, 30, 40, 50], &[2.5, 3.0, 4.5, 5.0]);
        assert_eq!(
            samples(&r),
            vec![(10, 1.0), (20, 2.5), (30, 3.0), (40, 4.5), (50, 5.0)]
        );
    }

    #[test]
    fn test_tie_on_tail_boundary() {
        // Run starts exactly at the stored tail timestamp: not the fast
        // path, the stored tail must be replaced.
        let mut r = record(&[(10, 1.0), (20, 2.0)]);
        r.merge_run(&[20, 30], &[9.0, 3.0]);
        assert_eq!(samples(&r), vec![(10, 1.0), (20, 9.0), (30, 3.0)]);
    }
}
