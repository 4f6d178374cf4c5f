//! The alignment cache: overlap detection, k-way merge, and the row table.

use crate::error::{Result, WeftError};
use crate::merge::heap::{MergeEntry, MergeHeap};
use crate::merge::search::{lower_bound, lower_bound_by_key};
use crate::merge::{Cell, Row, SeriesRecord, SeriesRun, Timestamp};
use tracing::debug;

/// Default silence threshold before a gap marker is inserted: 60 seconds.
pub const DEFAULT_MAX_GAP_MS: Timestamp = 60 * 1000;

/// Configuration for an alignment [`Cache`].
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Largest tolerated delta between consecutive samples of one series.
    ///
    /// When two consecutive samples are further apart than this, a synthetic
    /// gap row is inserted one millisecond before the later sample.
    /// Default: 60 seconds.
    pub max_gap_ms: Timestamp,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_gap_ms: DEFAULT_MAX_GAP_MS,
        }
    }
}

impl CacheConfig {
    /// Creates a configuration with a custom gap threshold.
    pub fn with_max_gap_ms(mut self, max_gap_ms: Timestamp) -> Self {
        self.max_gap_ms = max_gap_ms;
        self
    }
}

/// Counters describing the work a [`Cache`] has done.
///
/// Plain integers: the cache is a single-writer structure (see the
/// concurrency notes on [`Cache`]), so no atomics are involved.
#[derive(Debug, Clone, Default)]
pub struct CacheStats {
    /// Number of `append` calls accepted (including no-op empty batches).
    pub appends: u64,
    /// Number of batches that overlapped materialized output.
    pub overlaps: u64,
    /// Rows dropped by overlap truncation (they are regenerated afterwards).
    pub rows_dropped: u64,
    /// New rows created for the table, including regenerated ones.
    pub rows_emitted: u64,
    /// Synthetic gap markers inserted.
    pub gap_markers: u64,
    /// Incoming samples merged into series records.
    pub samples_merged: u64,
}

/// Streaming alignment/merge cache over a fixed set of series.
///
/// The cache owns one [`SeriesRecord`] per series and the materialized row
/// table. [`append`](Self::append) folds a batch of per-series runs into
/// both, resolving duplicate or overlapping re-delivery so the table always
/// reads as if every sample had arrived exactly once, in order.
///
/// # Concurrency
///
/// Synchronous and single-threaded: no I/O, no internal locking. A caller
/// sharing the cache across threads must serialize all calls (e.g. one
/// writer lock held across a whole `append`), since [`rows`](Self::rows)
/// borrows the live table and must never observe a mid-truncation state.
///
/// Incoming batches are copied in, never retained by reference; batch
/// buffers can be reused as soon as `append` returns.
#[derive(Debug, Clone)]
pub struct Cache {
    max_gap_ms: Timestamp,
    series: Vec<SeriesRecord>,
    rows: Vec<Row>,
    stats: CacheStats,
}

impl Cache {
    /// Creates a cache for `num_series` series with the given gap threshold.
    pub fn new(num_series: usize, max_gap_ms: Timestamp) -> Self {
        Self::with_config(num_series, CacheConfig::default().with_max_gap_ms(max_gap_ms))
    }

    /// Creates a cache for `num_series` series from a [`CacheConfig`].
    pub fn with_config(num_series: usize, config: CacheConfig) -> Self {
        Self {
            max_gap_ms: config.max_gap_ms,
            series: vec![SeriesRecord::new(); num_series],
            rows: Vec::new(),
            stats: CacheStats::default(),
        }
    }

    /// Number of series this cache was constructed with.
    pub fn num_series(&self) -> usize {
        self.series.len()
    }

    /// The configured gap threshold.
    pub fn max_gap_ms(&self) -> Timestamp {
        self.max_gap_ms
    }

    /// The aligned table: rows with strictly increasing timestamps.
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Raw per-series histories, for consumers that want samples rather than
    /// the combined table (e.g. windowed rendering).
    pub fn series(&self) -> &[SeriesRecord] {
        &self.series
    }

    /// Counters for appends, overlaps, emitted rows, and gap markers.
    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }

    /// Returns true if no rows have been materialized.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Timestamp of the most recent row.
    pub fn last_timestamp(&self) -> Option<Timestamp> {
        self.rows.last().map(|row| row.timestamp)
    }

    /// Folds a batch of per-series runs into the cache.
    ///
    /// A batch whose earliest timestamp is strictly after the last
    /// materialized row extends the table in place. Otherwise the batch
    /// overlaps previous output: the table suffix from that timestamp on is
    /// dropped and regenerated from the merged histories, so re-delivered or
    /// out-of-order batches converge to the same table as a single ordered
    /// delivery.
    ///
    /// # Errors
    ///
    /// Rejects the whole batch, before any mutation, if any run has
    /// mismatched array lengths, a position outside `[0, num_series)`, or
    /// timestamps that are not strictly increasing.
    pub fn append(&mut self, batch: &[SeriesRun]) -> Result<()> {
        self.validate(batch)?;
        self.stats.appends += 1;

        // Earliest incoming timestamp across the batch; a batch with no
        // samples at all is a no-op.
        let min_t = match batch
            .iter()
            .filter_map(|run| run.timestamps.first().copied())
            .min()
        {
            Some(t) => t,
            None => return Ok(()),
        };

        let overlap = match self.rows.last() {
            Some(row) => min_t <= row.timestamp,
            None => false,
        };

        if overlap {
            let cut = lower_bound_by_key(&self.rows, min_t, |row| row.timestamp);
            let dropped = self.rows.len() - cut;
            debug!(min_t, dropped, "overlapping batch, truncating table suffix");
            self.rows.truncate(cut);
            self.stats.overlaps += 1;
            self.stats.rows_dropped += dropped as u64;
        }

        // Continuation resumes from the pre-merge series lengths.
        let pre_merge_len: Vec<usize> = self.series.iter().map(|s| s.len()).collect();

        for run in batch {
            self.series[run.pos].merge_run(&run.timestamps, &run.values);
            self.stats.samples_merged += run.timestamps.len() as u64;
        }

        let resume: Vec<usize> = if overlap {
            // Everything from the first re-delivered instant onward is
            // regenerated; history before it is untouched.
            self.series
                .iter()
                .map(|s| lower_bound(s.timestamps(), min_t))
                .collect()
        } else {
            pre_merge_len
        };

        self.replay(&resume);
        Ok(())
    }

    /// Checks the whole batch against the precondition taxonomy without
    /// touching any state.
    fn validate(&self, batch: &[SeriesRun]) -> Result<()> {
        for run in batch {
            if run.pos >= self.series.len() {
                return Err(WeftError::SeriesOutOfRange {
                    series: run.pos,
                    num_series: self.series.len(),
                });
            }
            if run.timestamps.len() != run.values.len() {
                return Err(WeftError::LengthMismatch {
                    series: run.pos,
                    timestamps: run.timestamps.len(),
                    values: run.values.len(),
                });
            }
            for (i, pair) in run.timestamps.windows(2).enumerate() {
                if pair[1] <= pair[0] {
                    return Err(WeftError::OutOfOrderRun {
                        series: run.pos,
                        index: i + 1,
                        prev: pair[0],
                        next: pair[1],
                    });
                }
            }
        }
        Ok(())
    }

    /// K-way merges all series forward from their resume positions, emitting
    /// rows onto the table.
    ///
    /// Contributions at one instant collapse into a single row; whenever the
    /// delta to a series' next sample exceeds the gap threshold, a marker
    /// entry at `next - 1` is queued alongside it.
    fn replay(&mut self, resume: &[usize]) {
        let mut heap = MergeHeap::with_capacity(2 * self.series.len());

        for (pos, series) in self.series.iter().enumerate() {
            let start = resume[pos];
            let timestamps = series.timestamps();
            if start >= timestamps.len() {
                continue;
            }
            if start > 0 && timestamps[start] - timestamps[start - 1] > self.max_gap_ms {
                heap.push(MergeEntry {
                    timestamp: timestamps[start] - 1,
                    series: pos,
                    value: f64::NAN,
                    index: None,
                });
                self.stats.gap_markers += 1;
            }
            heap.push(MergeEntry {
                timestamp: timestamps[start],
                series: pos,
                value: series.values()[start],
                index: Some(start),
            });
        }

        let mut open: Option<Row> = None;
        while let Some(entry) = heap.pop() {
            let matches_open = match &open {
                Some(row) => row.timestamp == entry.timestamp,
                None => false,
            };
            if !matches_open {
                if let Some(row) = open.take() {
                    self.rows.push(row);
                }
                // A seeded gap marker can land exactly on the last row kept
                // through truncation; reopen that row instead of emitting a
                // duplicate instant.
                open = match self.rows.last() {
                    Some(last) if last.timestamp == entry.timestamp => self.rows.pop(),
                    _ => {
                        self.stats.rows_emitted += 1;
                        Some(Row::new(entry.timestamp, self.series.len()))
                    }
                };
            }
            let row = match open.as_mut() {
                Some(row) => row,
                None => continue, // unreachable: a row was just opened
            };

            match entry.index {
                None => {
                    row.cells[entry.series] = Cell::Gap;
                    // Gap markers advance no cursor.
                }
                Some(index) => {
                    row.cells[entry.series] = Cell::Value(entry.value);

                    let series = &self.series[entry.series];
                    let timestamps = series.timestamps();
                    let next = index + 1;
                    if next >= timestamps.len() {
                        continue;
                    }
                    if timestamps[next] - timestamps[index] > self.max_gap_ms {
                        heap.push(MergeEntry {
                            timestamp: timestamps[next] - 1,
                            series: entry.series,
                            value: f64::NAN,
                            index: None,
                        });
                        self.stats.gap_markers += 1;
                    }
                    heap.push(MergeEntry {
                        timestamp: timestamps[next],
                        series: entry.series,
                        value: series.values()[next],
                        index: Some(next),
                    });
                }
            }
        }

        if let Some(row) = open.take() {
            self.rows.push(row);
        }
    }
}
