//! Thread-pool backends
//!
//! A fixed-size per-instance pool executes one task per partition; the
//! scope end is the barrier between phases. Output rows are handed out as
//! disjoint &mut slices, so the "no overlapping writes" discipline is
//! enforced by construction rather than by convention.
//!
//! The pinned variant asserts CPU `partition_index % worker_count` inside
//! every task, because the pool is free to run a given partition on a
//! different worker thread on every call.

use num_traits::Float;

use crate::affinity;
use crate::backend::{check_dimensions, require_square, worker_budget, SparseMatrix};
use crate::error::Result;
use crate::matrix::{partition, Crs, Partition, Triplet};
use crate::power;

/// Backend executing partitions as tasks on a bounded worker pool
pub struct ThreadPool<T> {
    pool: rayon::ThreadPool,
    workers: usize,
    pinned: bool,
    rows: usize,
    cols: usize,
    parts: Vec<Partition<T>>,
}

impl<T> ThreadPool<T>
where
    T: Float + Send + Sync,
{
    /// Creates an unpinned pool backend with at most `threads` workers
    pub fn new(threads: usize) -> Result<Self> {
        Self::build(threads, false)
    }

    /// Creates a pool backend that pins each task to its partition's CPU
    pub fn pinned(threads: usize) -> Result<Self> {
        Self::build(threads, true)
    }

    fn build(threads: usize, pinned: bool) -> Result<Self> {
        let workers = worker_budget(threads)?;
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("spmv-worker-{i}"))
            .build()?;

        Ok(Self {
            pool,
            workers,
            pinned,
            rows: 0,
            cols: 0,
            parts: Vec::new(),
        })
    }

    fn install(&mut self, matrix: &Crs<T>, partitions: usize) {
        self.rows = matrix.rows;
        self.cols = matrix.cols;
        self.parts = partition(matrix, partitions.max(1));
    }
}

/// Splits `v` into the per-partition row ranges, as disjoint &mut slices
fn split_by_rows<'a, T>(parts: &[Partition<T>], v: &'a mut [T]) -> Vec<&'a mut [T]> {
    let mut rest = v;
    let mut slices = Vec::with_capacity(parts.len());
    for part in parts {
        let (head, tail) = std::mem::take(&mut rest).split_at_mut(part.rows());
        slices.push(head);
        rest = tail;
    }
    slices
}

impl<T> SparseMatrix<T> for ThreadPool<T>
where
    T: Float + Send + Sync,
{
    fn load_poisson(&mut self, m: usize, n: usize, partitions: usize) -> Result<()> {
        self.install(&Crs::poisson(m, n), partitions);
        Ok(())
    }

    fn load_triplet(&mut self, input: &Triplet<T>, partitions: usize) -> Result<()> {
        self.install(&Crs::from_triplet(input)?, partitions);
        Ok(())
    }

    fn rows(&self) -> usize {
        self.rows
    }

    fn cols(&self) -> usize {
        self.cols
    }

    fn multiply(&self, x: &[T], y: &mut [T]) -> Result<()> {
        check_dimensions(self.rows, self.cols, x, y)?;

        let pinned = self.pinned;
        let workers = self.workers;
        let outputs = split_by_rows(&self.parts, y);

        self.pool.scope(|s| {
            for (idx, (part, out)) in self.parts.iter().zip(outputs).enumerate() {
                s.spawn(move |_| {
                    if pinned {
                        affinity::pin_current(idx % workers);
                    }
                    part.multiply_into(x, out);
                });
            }
        });
        Ok(())
    }

    fn power_iteration(&self, x: &mut [T], y: &mut [T], iterations: usize) -> Result<()> {
        require_square(self.rows, self.cols)?;

        let pinned = self.pinned;
        let workers = self.workers;

        for _ in 0..iterations {
            self.multiply(x, y)?;

            // Single global reduction in index order, then a parallel
            // divide-and-copy over the same row ranges as the multiply.
            let norm = power::norm2(y);
            let xs = split_by_rows(&self.parts, x);
            let ys = split_by_rows(&self.parts, y);

            self.pool.scope(|s| {
                for (idx, (xr, yr)) in xs.into_iter().zip(ys).enumerate() {
                    s.spawn(move |_| {
                        if pinned {
                            affinity::pin_current(idx % workers);
                        }
                        power::normalize_segment(xr, yr, norm);
                    });
                }
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::Sequential;

    #[test]
    fn zero_workers_is_a_configuration_error() {
        assert!(ThreadPool::<f64>::new(0).is_err());
    }

    #[test]
    fn split_by_rows_is_element_type_agnostic() {
        let part = |first_row, last_row| Partition::<u32> {
            first_row,
            last_row,
            row_start: vec![0; last_row - first_row + 1],
            col_ind: Vec::new(),
            data: Vec::new(),
        };
        let parts = vec![part(0, 3), part(3, 3), part(3, 5)];

        let mut v: Vec<u32> = (0..5).collect();
        let slices = split_by_rows(&parts, &mut v);

        let lens: Vec<usize> = slices.iter().map(|s| s.len()).collect();
        assert_eq!(lens, [3, 0, 2]);
        assert_eq!(slices[2], &[3, 4]);
    }

    #[test]
    fn matches_sequential_bit_for_bit() {
        let mut reference = Sequential::<f64>::new();
        reference.load_poisson(5, 4, 1).unwrap();

        let x: Vec<f64> = (0..20).map(|i| (i as f64 * 0.37).cos()).collect();
        let mut expect = vec![0.0; 20];
        reference.multiply(&x, &mut expect).unwrap();

        for partitions in 1..=21 {
            let mut backend = ThreadPool::<f64>::pinned(4).unwrap();
            backend.load_poisson(5, 4, partitions).unwrap();

            let mut y = vec![0.0; 20];
            backend.multiply(&x, &mut y).unwrap();
            assert_eq!(y, expect, "partition count {}", partitions);
        }
    }

    #[test]
    fn iterate_stays_normalized() {
        let mut backend = ThreadPool::<f64>::new(2).unwrap();
        backend.load_poisson(4, 4, 3).unwrap();

        let mut x = vec![1.0; 16];
        let mut y = vec![0.0; 16];
        backend.power_iteration(&mut x, &mut y, 7).unwrap();

        let norm: f64 = x.iter().map(|v| v * v).sum::<f64>().sqrt();
        assert!((norm - 1.0).abs() < 1e-12);
    }
}
