//! Alignment/merge core: data model, series store, and the cache itself.
//!
//! The pipeline for one [`Cache::append`] call:
//!
//! ```text
//! batch → per-series merge (SeriesRecord) → overlap detection
//!       → k-way merge with gap insertion → rows appended to the table
//! ```

mod cache;
mod heap;
mod search;
mod store;

pub use cache::{Cache, CacheConfig, CacheStats, DEFAULT_MAX_GAP_MS};
pub use store::SeriesRecord;

/// Position index of one series, in `[0, num_series)`.
pub type SeriesId = usize;

/// Sample timestamp in milliseconds.
pub type Timestamp = i64;

/// One incoming run of samples for a single series.
///
/// A run's own timestamps must be strictly increasing, but the run as a whole
/// may start at or before timestamps the cache has already materialized
/// (re-delivery after a reconnect); the cache resolves that overlap itself.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesRun {
    /// Position index of the series this run belongs to.
    pub pos: SeriesId,
    /// Sample timestamps, strictly increasing within the run.
    pub timestamps: Vec<Timestamp>,
    /// Sample values, parallel to `timestamps`.
    pub values: Vec<f64>,
}

impl SeriesRun {
    /// Creates a run for the series at `pos`.
    pub fn new(pos: SeriesId, timestamps: Vec<Timestamp>, values: Vec<f64>) -> Self {
        Self {
            pos,
            timestamps,
            values,
        }
    }

    /// Returns true if the run carries no samples.
    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }
}

/// One slot of an output row.
///
/// `Absent` means the series contributed nothing at this instant; `Gap` is a
/// synthetic discontinuity marker inserted when the series fell silent for
/// longer than the configured threshold. The two are semantically distinct
/// and a renderer must treat them differently (skip vs. break the line).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Cell {
    /// No information for this series at this instant.
    #[default]
    Absent,
    /// A real sample value.
    Value(f64),
    /// Synthetic discontinuity marker.
    Gap,
}

impl Cell {
    /// Returns the sample value, if this cell holds one.
    pub fn value(self) -> Option<f64> {
        match self {
            Cell::Value(v) => Some(v),
            _ => None,
        }
    }

    /// Returns true if this cell is a gap marker.
    pub fn is_gap(self) -> bool {
        matches!(self, Cell::Gap)
    }

    /// Returns true if this cell carries no information.
    pub fn is_absent(self) -> bool {
        matches!(self, Cell::Absent)
    }
}

/// One row of the aligned output table: a timestamp plus one cell per series.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    /// The instant this row describes.
    pub timestamp: Timestamp,
    /// One slot per series, indexed by [`SeriesId`]. Length is always
    /// `num_series`.
    pub cells: Vec<Cell>,
}

impl Row {
    pub(crate) fn new(timestamp: Timestamp, num_series: usize) -> Self {
        Self {
            timestamp,
            cells: vec![Cell::Absent; num_series],
        }
    }
}
