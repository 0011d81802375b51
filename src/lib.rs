//! # powerbench: parallel power-method benchmark
//!
//! Computes the dominant eigenvector of a large sparse matrix by power
//! iteration (repeated SpMV + Euclidean normalization) and compares
//! interchangeable parallel execution strategies for the SpMV kernel:
//!
//! 1. **Sequential**: the reference CRS kernel on the calling thread.
//! 2. **ThreadPool / ThreadPoolPinned**: one task per row partition on a
//!    bounded per-instance pool, optionally pinning each task to CPU
//!    `partition % workers`.
//! 3. **DataflowGraph / DataflowGraphPinned**: persistent multiply and
//!    normalize nodes built once at load time and fed through channels;
//!    the pinned variant re-asserts its CPU mask on every activation.
//!
//! All backends share one CRS representation and one row partitioner, and
//! must reproduce the sequential kernel bit for bit: per-row accumulation
//! happens strictly in column-storage order, so partitioning never changes
//! a single bit of the result.
//!
//! ## Usage
//!
//! ```
//! use powerbench::{backend, BackendKind, SparseMatrix};
//!
//! let mut mat = backend::select::<f64>(BackendKind::ThreadPool, 4).unwrap();
//! mat.load_poisson(10, 10, 4).unwrap();
//!
//! let mut x = vec![1.0; 100];
//! let mut y = vec![0.0; 100];
//! mat.power_iteration(&mut x, &mut y, 50).unwrap();
//! ```

pub mod affinity;
pub mod backend;
pub mod error;
pub mod matrix;
pub mod power;

// Re-export primary components
pub use backend::{BackendKind, DataflowGraph, Sequential, SparseMatrix, ThreadPool};
pub use error::{Error, Result};
pub use matrix::{partition, partition_rows, Crs, Partition, Triplet};

/// Version information for the powerbench library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
