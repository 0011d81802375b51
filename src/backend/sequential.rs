//! Sequential reference backend
//!
//! Runs the CRS kernel directly on the calling thread. Every parallel
//! backend is validated bit for bit against this one.

use num_traits::Float;

use crate::backend::{check_dimensions, require_square, SparseMatrix};
use crate::error::{Error, Result};
use crate::matrix::{Crs, Triplet};
use crate::power;

/// Backend executing SpMV and normalization on the calling thread
#[derive(Debug, Default)]
pub struct Sequential<T> {
    matrix: Option<Crs<T>>,
}

impl<T: Float> Sequential<T> {
    pub fn new() -> Self {
        Self { matrix: None }
    }
}

impl<T> SparseMatrix<T> for Sequential<T>
where
    T: Float,
{
    fn load_poisson(&mut self, m: usize, n: usize, _partitions: usize) -> Result<()> {
        self.matrix = Some(Crs::poisson(m, n));
        Ok(())
    }

    fn load_triplet(&mut self, input: &Triplet<T>, _partitions: usize) -> Result<()> {
        self.matrix = Some(Crs::from_triplet(input)?);
        Ok(())
    }

    fn rows(&self) -> usize {
        self.matrix.as_ref().map_or(0, |m| m.rows)
    }

    fn cols(&self) -> usize {
        self.matrix.as_ref().map_or(0, |m| m.cols)
    }

    fn multiply(&self, x: &[T], y: &mut [T]) -> Result<()> {
        let matrix = self.matrix.as_ref().ok_or(Error::NotLoaded)?;
        check_dimensions(matrix.rows, matrix.cols, x, y)?;
        matrix.multiply(x, y);
        Ok(())
    }

    fn power_iteration(&self, x: &mut [T], y: &mut [T], iterations: usize) -> Result<()> {
        require_square(self.rows(), self.cols())?;

        for _ in 0..iterations {
            self.multiply(x, y)?;
            let norm = power::norm2(y);
            power::normalize_segment(x, y, norm);
        }
        Ok(())
    }
}
