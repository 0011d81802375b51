//! Compressed Row Storage (CRS) matrix format
//!
//! The CRS format stores a sparse matrix using three arrays:
//! - row_start: size rows + 1, offsets into col_ind and data
//! - col_ind: size nnz, column indices of non-zero elements
//! - data: size nnz, the non-zero values
//!
//! The sequential matrix-vector product defined here is the reference
//! kernel: every parallel backend must reproduce its per-row accumulation
//! order bit for bit.

use std::fmt;

use num_traits::Float;

use crate::error::{Error, Result};
use crate::matrix::Triplet;

/// A sparse matrix in Compressed Row Storage format
#[derive(Clone)]
pub struct Crs<T> {
    /// Number of rows in the matrix
    pub rows: usize,

    /// Number of columns in the matrix
    pub cols: usize,

    /// Row offsets (size: rows + 1)
    /// row_start[i] is the index in col_ind and data where row i starts,
    /// row_start[rows] equals nnz
    pub row_start: Vec<usize>,

    /// Column indices (size: nnz)
    pub col_ind: Vec<usize>,

    /// Non-zero values (size: nnz)
    pub data: Vec<T>,
}

impl<T> Crs<T>
where
    T: Float,
{
    /// Creates a new CRS matrix from pre-built arrays
    ///
    /// # Panics
    ///
    /// Panics if the arrays are inconsistent:
    /// - row_start.len() must be rows + 1
    /// - col_ind.len() must equal data.len()
    /// - row_start[rows] must equal col_ind.len()
    /// - every column index must be < cols
    pub fn new(
        rows: usize,
        cols: usize,
        row_start: Vec<usize>,
        col_ind: Vec<usize>,
        data: Vec<T>,
    ) -> Self {
        assert_eq!(row_start.len(), rows + 1, "row_start.len() must be rows + 1");
        assert_eq!(col_ind.len(), data.len(), "col_ind.len() must equal data.len()");
        assert_eq!(
            row_start[rows],
            col_ind.len(),
            "row_start[rows] must equal col_ind.len()"
        );
        for &col in &col_ind {
            assert!(col < cols, "Column index {} out of bounds (cols = {})", col, cols);
        }

        Self {
            rows,
            cols,
            row_start,
            col_ind,
            data,
        }
    }

    /// Returns the number of non-zero elements in the matrix
    pub fn nnz(&self) -> usize {
        self.data.len()
    }

    /// Fills a 2D discrete Poisson operator on an m x n grid
    /// (the standard 5-point stencil, equal step length in x and y).
    ///
    /// Row r contributes, in increasing column order:
    /// -1 at r-m (if r >= m), -1 at r-1 (if r is not first in its grid
    /// row), 4 at r, -1 at r+1 (if r is not last in its grid row) and
    /// -1 at r+m (if r+m < m*n).
    pub fn poisson(m: usize, n: usize) -> Self {
        assert!(m >= 1 && n >= 1, "grid must be at least 1 x 1");
        let size = m * n;
        let nnz = n * (m + 2 * (m - 1)) + 2 * (n - 1) * m;

        let mut row_start = Vec::with_capacity(size + 1);
        let mut col_ind = Vec::with_capacity(nnz);
        let mut data = Vec::with_capacity(nnz);

        let four = T::from(4.0).unwrap_or_else(|| {
            let two = T::one() + T::one();
            two * two
        });

        row_start.push(0);
        for row in 0..size {
            // Identity block below the diagonal blocks
            if row >= m {
                data.push(-T::one());
                col_ind.push(row - m);
            }

            // Subdiagonal of the tridiagonal block
            if row % m != 0 {
                data.push(-T::one());
                col_ind.push(row - 1);
            }

            // Diagonal
            data.push(four);
            col_ind.push(row);

            // Superdiagonal of the tridiagonal block
            if row % m != m - 1 {
                data.push(-T::one());
                col_ind.push(row + 1);
            }

            // Identity block above the diagonal blocks
            if row + m < size {
                data.push(-T::one());
                col_ind.push(row + m);
            }

            row_start.push(data.len());
        }

        debug_assert_eq!(data.len(), nnz);
        Self::new(size, size, row_start, col_ind, data)
    }

    /// Converts a triplet matrix into CRS form
    ///
    /// Entries within a row are ordered by column; duplicate coordinates
    /// are summed in column order. Every backend loads through this one
    /// conversion so they all see an identical storage order. Entries
    /// outside the declared shape are a data error, not a panic, since
    /// triplets may be assembled by callers and not just the loaders.
    pub fn from_triplet(t: &Triplet<T>) -> Result<Self> {
        for &(r, c, _) in &t.entries {
            if r >= t.rows || c >= t.cols {
                return Err(Error::EntryOutOfBounds {
                    row: r,
                    col: c,
                    rows: t.rows,
                    cols: t.cols,
                });
            }
        }

        // Counting pass over rows
        let mut row_start = vec![0usize; t.rows + 1];
        for &(r, _, _) in &t.entries {
            row_start[r + 1] += 1;
        }
        for i in 0..t.rows {
            row_start[i + 1] += row_start[i];
        }

        // Scatter into row buckets
        let nnz = t.entries.len();
        let mut col_ind = vec![0usize; nnz];
        let mut data = vec![T::zero(); nnz];
        let mut cursor = row_start.clone();
        for &(r, c, v) in &t.entries {
            let k = cursor[r];
            col_ind[k] = c;
            data[k] = v;
            cursor[r] += 1;
        }

        // Order each row by column and merge duplicates
        let mut out_col = Vec::with_capacity(nnz);
        let mut out_data = Vec::with_capacity(nnz);
        let mut out_start = Vec::with_capacity(t.rows + 1);
        out_start.push(0);
        for i in 0..t.rows {
            let lo = row_start[i];
            let hi = row_start[i + 1];
            let mut entries: Vec<(usize, T)> = col_ind[lo..hi]
                .iter()
                .copied()
                .zip(data[lo..hi].iter().copied())
                .collect();
            entries.sort_by_key(|&(c, _)| c);

            for (c, v) in entries {
                if out_col.len() > out_start[i] && *out_col.last().unwrap() == c {
                    let last = out_data.len() - 1;
                    out_data[last] = out_data[last] + v;
                } else {
                    out_col.push(c);
                    out_data.push(v);
                }
            }
            out_start.push(out_col.len());
        }

        Ok(Self::new(t.rows, t.cols, out_start, out_col, out_data))
    }

    /// Sequential sparse matrix-vector product y = A*x
    ///
    /// y is zeroed, then each row accumulates its products strictly in
    /// column-storage order. Reordering these sums changes the last bit of
    /// the result, so this loop defines the reproducibility contract.
    pub fn multiply(&self, x: &[T], y: &mut [T]) {
        assert_eq!(x.len(), self.cols, "x length must equal cols");
        assert_eq!(y.len(), self.rows, "y length must equal rows");

        for yi in y.iter_mut() {
            *yi = T::zero();
        }

        for i in 0..self.rows {
            for k in self.row_start[i]..self.row_start[i + 1] {
                let j = self.col_ind[k];
                y[i] = y[i] + self.data[k] * x[j];
            }
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Crs<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Crs {{")?;
        writeln!(f, "  dimensions: {} x {}", self.rows, self.cols)?;
        writeln!(f, "  nnz: {}", self.data.len())?;
        write!(f, "}}")
    }
}
