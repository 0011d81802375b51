//! Row partitioning of a CRS matrix for parallel execution
//!
//! A partition owns a contiguous row range and a local copy of that
//! range's nonzeros. Its row_start is rebased to zero but col_ind keeps
//! GLOBAL column indices, so a partition may read any index of the shared
//! input vector while only ever writing its own output rows.

use std::ops::Range;

use num_traits::Float;

use crate::matrix::Crs;

/// A contiguous row-range shard of a CRS matrix
#[derive(Debug, Clone)]
pub struct Partition<T> {
    /// First owned row (global index, inclusive)
    pub first_row: usize,

    /// One past the last owned row (global index)
    pub last_row: usize,

    /// Local row offsets, rebased so row_start[0] == 0
    pub row_start: Vec<usize>,

    /// Column indices, kept global
    pub col_ind: Vec<usize>,

    /// Non-zero values of the owned rows
    pub data: Vec<T>,
}

impl<T> Partition<T> {
    /// Number of rows owned by this partition (may be zero)
    pub fn rows(&self) -> usize {
        self.last_row - self.first_row
    }
}

impl<T> Partition<T>
where
    T: Float,
{
    /// Copies rows `range` of `matrix` into a self-contained partition.
    ///
    /// Two passes: the slice bounds of the source arrays give the exact
    /// nonzero count up front, so the local arrays are allocated exactly.
    pub fn extract(matrix: &Crs<T>, range: Range<usize>) -> Self {
        assert!(range.end <= matrix.rows, "partition range out of bounds");

        let lo = matrix.row_start[range.start];
        let hi = matrix.row_start[range.end];

        let row_start = matrix.row_start[range.start..=range.end]
            .iter()
            .map(|&k| k - lo)
            .collect();

        Self {
            first_row: range.start,
            last_row: range.end,
            row_start,
            col_ind: matrix.col_ind[lo..hi].to_vec(),
            data: matrix.data[lo..hi].to_vec(),
        }
    }

    /// Computes this partition's slice of y = A*x.
    ///
    /// `y` is exactly the output rows owned by this partition. Each row
    /// accumulates in column-storage order, matching the sequential
    /// reference kernel bit for bit.
    pub fn multiply_into(&self, x: &[T], y: &mut [T]) {
        debug_assert_eq!(y.len(), self.rows());

        for l in 0..self.rows() {
            let mut sum = T::zero();
            for k in self.row_start[l]..self.row_start[l + 1] {
                let j = self.col_ind[k];
                sum = sum + self.data[k] * x[j];
            }
            y[l] = sum;
        }
    }
}

/// Splits `rows` rows into `p` contiguous ranges.
///
/// The remainder is spread over the leading partitions (the first
/// `rows % p` ranges get one extra row), so partition sizes never differ
/// by more than one. When p > rows the trailing partitions are empty;
/// every consumer must tolerate that.
pub fn partition_rows(rows: usize, p: usize) -> Vec<Range<usize>> {
    assert!(p >= 1, "at least one partition required");

    let base = rows / p;
    let extra = rows % p;

    let mut ranges = Vec::with_capacity(p);
    let mut first = 0;
    for i in 0..p {
        let count = base + usize::from(i < extra);
        ranges.push(first..first + count);
        first += count;
    }

    debug_assert_eq!(first, rows);
    ranges
}

/// Partitions a CRS matrix into `p` row-range shards
pub fn partition<T: Float>(matrix: &Crs<T>, p: usize) -> Vec<Partition<T>> {
    partition_rows(matrix.rows, p)
        .into_iter()
        .map(|range| Partition::extract(matrix, range))
        .collect()
}
