//! Rank segmentation
//!
//! A topic's ranked list is cut into `n_segments` contiguous bands. When the
//! list length is not a multiple of `n_segments`, the first `remainder`
//! segments hold one extra document.

use ahash::{HashMap, HashMapExt};
use std::sync::Arc;

/// Sizes of the `n_segments` consecutive segments of a list of `list_length` items
///
/// Returns `remainder` sizes of `base + 1` followed by sizes of `base`, where
/// `base = list_length / n_segments`. The sizes always sum to `list_length`.
/// Segments may be empty when the list is shorter than `n_segments`.
/// `n_segments` must be positive; zero yields no segments.
pub fn compute_segment_sizes(n_segments: usize, list_length: usize) -> Vec<usize> {
    if n_segments == 0 {
        return Vec::new();
    }
    let base = list_length / n_segments;
    let remainder = list_length % n_segments;

    (0..n_segments)
        .map(|i| if i < remainder { base + 1 } else { base })
        .collect()
}

/// Pair each document with its 1-based segment index
///
/// Walks the ranked list once, filling the current segment before moving to
/// the next. Documents beyond the total of `segment_sizes` are dropped.
pub fn assign_segments<'a, T>(ranked: &'a [T], segment_sizes: &[usize]) -> Vec<(&'a T, usize)> {
    let mut assigned = Vec::with_capacity(ranked.len());
    let mut docs = ranked.iter();

    for (idx, size) in segment_sizes.iter().enumerate() {
        for doc in docs.by_ref().take(*size) {
            assigned.push((doc, idx + 1));
        }
    }
    assigned
}

/// Segmenter for a fixed segment count, caching sizes per list length
///
/// Ranked lists of the same length share one size vector across runs and topics.
#[derive(Debug)]
pub struct Segmenter {
    n_segments: usize,
    cache: HashMap<usize, Arc<[usize]>>,
}

impl Segmenter {
    pub fn new(n_segments: usize) -> Self {
        Self {
            n_segments,
            cache: HashMap::new(),
        }
    }

    pub fn n_segments(&self) -> usize {
        self.n_segments
    }

    /// Segment sizes for a list of `list_length` documents
    pub fn sizes(&mut self, list_length: usize) -> Arc<[usize]> {
        let n_segments = self.n_segments;
        self.cache
            .entry(list_length)
            .or_insert_with(|| compute_segment_sizes(n_segments, list_length).into())
            .clone()
    }

    /// Split a ranked list into per-segment slices, index 0 holding segment 1
    pub fn split<'a, T>(&mut self, ranked: &'a [T]) -> Vec<&'a [T]> {
        let sizes = self.sizes(ranked.len());
        let mut rest = ranked;
        sizes
            .iter()
            .map(|size| {
                let (head, tail) = rest.split_at(*size);
                rest = tail;
                head
            })
            .collect()
    }

    /// Pair each document with its 1-based segment index
    pub fn assign<'a, T>(&mut self, ranked: &'a [T]) -> Vec<(&'a T, usize)> {
        let sizes = self.sizes(ranked.len());
        assign_segments(ranked, &sizes)
    }
}
