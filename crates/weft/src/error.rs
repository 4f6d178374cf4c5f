//! Error and Result types for Weft cache operations.

use crate::merge::{SeriesId, Timestamp};
use thiserror::Error;

/// A convenience `Result` type for Weft operations.
pub type Result<T> = std::result::Result<T, WeftError>;

/// The error type for cache operations.
///
/// Every variant is a precondition violation: [`Cache::append`] validates the
/// whole batch before mutating anything, so a rejected call leaves the cache
/// in its prior state.
///
/// [`Cache::append`]: crate::Cache::append
#[derive(Debug, Error)]
pub enum WeftError {
    /// A run's timestamp and value arrays differ in length.
    #[error("length mismatch in series {series}: {timestamps} timestamps, {values} values")]
    LengthMismatch {
        /// Position index of the offending run.
        series: SeriesId,
        /// Number of timestamps in the run.
        timestamps: usize,
        /// Number of values in the run.
        values: usize,
    },

    /// A run's position index is outside `[0, num_series)`.
    #[error("series index {series} out of range for {num_series} series")]
    SeriesOutOfRange {
        /// Position index of the offending run.
        series: SeriesId,
        /// Number of series the cache was constructed with.
        num_series: usize,
    },

    /// A run's own timestamps are not strictly increasing.
    #[error("out-of-order run for series {series}: timestamps[{index}] = {next} <= {prev}")]
    OutOfOrderRun {
        /// Position index of the offending run.
        series: SeriesId,
        /// Index of the first non-increasing timestamp within the run.
        index: usize,
        /// Timestamp preceding the violation.
        prev: Timestamp,
        /// The violating timestamp.
        next: Timestamp,
    },
}
