//! Weft - streaming time-series alignment cache.
//!
//! This crate merges append-only batches of timestamped samples from N
//! independently-sampled series into a single time-ordered table, one row per
//! distinct instant, with explicit gap markers wherever a series falls silent
//! for longer than a configured threshold.
//!
//! # Components
//!
//! - [`SeriesRecord`]: per-series append-only timestamp/value history
//! - [`Cache`]: overlap detection, k-way merge, and the aligned row table
//! - [`Row`] / [`Cell`]: one output instant with a three-state slot per series
//!
//! # Example
//!
//! ```rust
//! use weft::{Cache, Cell, SeriesRun};
//!
//! // Two series, gaps wider than 1600 ms get a marker row.
//! let mut cache = Cache::new(2, 1600);
//!
//! cache.append(&[
//!     SeriesRun::new(0, vec![10, 30], vec![1.0, 3.0]),
//!     SeriesRun::new(1, vec![20], vec![2.0]),
//! ])?;
//!
//! let rows = cache.rows();
//! assert_eq!(rows.len(), 3);
//! assert_eq!(rows[0].cells[0], Cell::Value(1.0));
//! assert_eq!(rows[0].cells[1], Cell::Absent);
//! # Ok::<(), weft::WeftError>(())
//! ```
//!
//! Batches may arrive out of order or be re-delivered after a reconnect; the
//! cache truncates and regenerates the overlapping suffix of the table so the
//! result is identical to a single well-ordered delivery. Transport and
//! rendering live outside this crate: a connector feeds [`Cache::append`],
//! a renderer reads [`Cache::rows`] and [`Cache::series`].

#![deny(missing_docs)]

pub mod error;
pub mod merge;

pub use error::{Result, WeftError};
pub use merge::{
    Cache, CacheConfig, CacheStats, Cell, Row, SeriesId, SeriesRecord, SeriesRun, Timestamp,
};
