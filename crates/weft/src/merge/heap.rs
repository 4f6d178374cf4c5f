//! Private min-heap of merge cursors for one k-way merge pass.

use crate::merge::{SeriesId, Timestamp};

/// One pending contribution to the output table: either the sample at
/// `index` of a series, or a synthetic gap marker (`index == None`) that
/// advances no cursor.
#[derive(Debug, Clone, Copy)]
pub(crate) struct MergeEntry {
    pub timestamp: Timestamp,
    pub series: SeriesId,
    pub value: f64,
    pub index: Option<usize>,
}

impl MergeEntry {
    /// Heap ordering key: timestamp first, then series id so that ties at one
    /// instant pop in a deterministic order, then gap markers before real
    /// samples so a colliding real value is written last and wins the cell.
    fn key(&self) -> (Timestamp, SeriesId, u8) {
        (
            self.timestamp,
            self.series,
            if self.index.is_some() { 1 } else { 0 },
        )
    }
}

/// Binary min-heap over [`MergeEntry`].
///
/// Lives for a single merge call; only push and pop are needed.
#[derive(Debug)]
pub(crate) struct MergeHeap {
    entries: Vec<MergeEntry>,
}

impl MergeHeap {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, entry: MergeEntry) {
        self.entries.push(entry);
        self.sift_up(self.entries.len() - 1);
    }

    pub fn pop(&mut self) -> Option<MergeEntry> {
        if self.entries.is_empty() {
            return None;
        }
        let last = self.entries.len() - 1;
        self.entries.swap(0, last);
        let min = self.entries.pop();
        if !self.entries.is_empty() {
            self.sift_down(0);
        }
        min
    }

    fn sift_up(&mut self, mut child: usize) {
        while child > 0 {
            let parent = (child - 1) / 2;
            if self.entries[child].key() >= self.entries[parent].key() {
                break;
            }
            self.entries.swap(child, parent);
            child = parent;
        }
    }

    fn sift_down(&mut self, mut parent: usize) {
        let len = self.entries.len();
        loop {
            let left = 2 * parent + 1;
            if left >= len {
                break;
            }
            let right = left + 1;
            let mut smallest = left;
            if right < len && self.entries[right].key() < self.entries[left].key() {
                smallest = right;
            }
            if self.entries[parent].key() <= self.entries[smallest].key() {
                break;
            }
            self.entries.swap(parent, smallest);
            parent = smallest;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(timestamp: Timestamp, series: SeriesId, index: usize) -> MergeEntry {
        MergeEntry {
            timestamp,
            series,
            value: timestamp as f64,
            index: Some(index),
        }
    }

    fn gap(timestamp: Timestamp, series: SeriesId) -> MergeEntry {
        MergeEntry {
            timestamp,
            series,
            value: f64::NAN,
            index: None,
        }
    }

    #[test]
    fn test_pops_in_timestamp_order() {
        let mut heap = MergeHeap::with_capacity(8);
        for &t in &[50, 10, 40, 20, 30] {
            heap.push(sample(t, 0, 0));
        }

        let mut popped = Vec::new();
        while let Some(e) = heap.pop() {
            popped.push(e.timestamp);
        }
        assert_eq!(popped, vec![10, 20, 30, 40, 50]);
    }

    #[test]
    fn test_timestamp_tie_breaks_by_series() {
        let mut heap = MergeHeap::with_capacity(4);
        heap.push(sample(100, 2, 0));
        heap.push(sample(100, 0, 0));
        heap.push(sample(100, 1, 0));

        let order: Vec<_> = std::iter::from_fn(|| heap.pop()).map(|e| e.series).collect();
        assert_eq!(order, vec![0, 1, 2]);
    }

    #[test]
    fn test_gap_pops_before_sample_at_equal_key() {
        let mut heap = MergeHeap::with_capacity(4);
        heap.push(sample(100, 0, 3));
        heap.push(gap(100, 0));

        assert!(heap.pop().unwrap().index.is_none());
        assert_eq!(heap.pop().unwrap().index, Some(3));
        assert!(heap.pop().is_none());
    }

    #[test]
    fn test_empty_pop() {
        let mut heap = MergeHeap::with_capacity(0);
        assert!(heap.pop().is_none());
    }
}
