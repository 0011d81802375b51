//! SpMV execution backends
//!
//! Every backend implements the same [`SparseMatrix`] capability set, so
//! choosing an execution strategy is a single construction-time decision
//! and callers (including the test suite) are written once against the
//! contract.

pub mod dataflow;
pub mod sequential;
pub mod thread_pool;

pub use dataflow::DataflowGraph;
pub use sequential::Sequential;
pub use thread_pool::ThreadPool;

use num_traits::Float;

use crate::error::{Error, Result};
use crate::matrix::Triplet;

/// The capability contract every SpMV backend implements
pub trait SparseMatrix<T> {
    /// Generates and partitions the 2D Poisson operator on an m x n grid
    fn load_poisson(&mut self, m: usize, n: usize, partitions: usize) -> Result<()>;

    /// Converts triplet input to CRS and partitions it
    fn load_triplet(&mut self, input: &Triplet<T>, partitions: usize) -> Result<()>;

    /// Number of rows of the loaded matrix (0 before loading)
    fn rows(&self) -> usize;

    /// Number of columns of the loaded matrix (0 before loading)
    fn cols(&self) -> usize;

    /// Sparse matrix-vector product y = A*x
    ///
    /// Blocks until every partition's output rows are written.
    fn multiply(&self, x: &[T], y: &mut [T]) -> Result<()>;

    /// Runs exactly `iterations` multiply/normalize cycles.
    ///
    /// x is the iterate (normalized in place each step), y is scratch.
    /// Requires a square matrix.
    fn power_iteration(&self, x: &mut [T], y: &mut [T], iterations: usize) -> Result<()>;
}

/// Identifier of an execution strategy, as selected on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    Sequential,
    ThreadPool,
    ThreadPoolPinned,
    DataflowGraph,
    DataflowGraphPinned,
}

impl BackendKind {
    /// Maps the numeric CLI selector (1..=7) onto a backend kind.
    ///
    /// Ids 2 and 3 are historical aliases for flat data-parallel execution
    /// and both map onto the thread-pool strategy.
    pub fn from_id(id: u32) -> Result<Self> {
        match id {
            1 => Ok(BackendKind::Sequential),
            2 | 3 | 6 => Ok(BackendKind::ThreadPool),
            4 => Ok(BackendKind::DataflowGraph),
            5 => Ok(BackendKind::DataflowGraphPinned),
            7 => Ok(BackendKind::ThreadPoolPinned),
            other => Err(Error::UnknownBackend(other)),
        }
    }
}

/// Constructs a boxed backend of the given kind.
///
/// `threads` is the requested worker count; it is capped at the hardware
/// concurrency. Zero workers is a configuration error.
pub fn select<T>(kind: BackendKind, threads: usize) -> Result<Box<dyn SparseMatrix<T> + Send>>
where
    T: Float + Send + Sync + 'static,
{
    Ok(match kind {
        BackendKind::Sequential => Box::new(Sequential::new()),
        BackendKind::ThreadPool => Box::new(ThreadPool::new(threads)?),
        BackendKind::ThreadPoolPinned => Box::new(ThreadPool::pinned(threads)?),
        BackendKind::DataflowGraph => Box::new(DataflowGraph::new(threads)?),
        BackendKind::DataflowGraphPinned => Box::new(DataflowGraph::pinned(threads)?),
    })
}

/// Effective worker count: min(requested, hardware concurrency).
///
/// A request of zero fails construction rather than silently serializing.
pub(crate) fn worker_budget(requested: usize) -> Result<usize> {
    if requested == 0 {
        return Err(Error::InvalidWorkerCount(0));
    }
    Ok(requested.min(num_cpus::get()))
}

/// Shared precondition for the power method
pub(crate) fn require_square(rows: usize, cols: usize) -> Result<()> {
    if rows != cols {
        return Err(Error::NotSquare { rows, cols });
    }
    Ok(())
}

/// Shared length checks for multiply inputs
pub(crate) fn check_dimensions<T>(rows: usize, cols: usize, x: &[T], y: &[T]) -> Result<()> {
    if rows == 0 && cols == 0 {
        return Err(Error::NotLoaded);
    }
    if x.len() != cols {
        return Err(Error::DimensionMismatch {
            expected: cols,
            got: x.len(),
        });
    }
    if y.len() != rows {
        return Err(Error::DimensionMismatch {
            expected: rows,
            got: y.len(),
        });
    }
    Ok(())
}
