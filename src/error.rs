//! Error taxonomy for the benchmark crate
//!
//! Configuration errors abort the operation; data errors come from the
//! input loaders. CPU-affinity failures are deliberately NOT errors: they
//! are logged and execution continues without the pinning benefit.

use std::path::PathBuf;

/// Errors produced by backend construction, loading and power iteration
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Backend selector outside the supported 1..=7 range
    #[error("unknown backend id {0} (expected 1..=7)")]
    UnknownBackend(u32),

    /// Worker pools need at least one thread
    #[error("invalid worker count {0} (must be >= 1)")]
    InvalidWorkerCount(isize),

    /// Power iteration is only defined for square matrices
    #[error("matrix is not square ({rows} x {cols})")]
    NotSquare { rows: usize, cols: usize },

    /// Vector length does not match the matrix dimensions
    #[error("vector length {got} does not match matrix dimension {expected}")]
    DimensionMismatch { expected: usize, got: usize },

    /// Triplet entry outside the declared matrix shape
    #[error("entry ({row}, {col}) out of bounds for a {rows} x {cols} matrix")]
    EntryOutOfBounds {
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
    },

    /// A backend was asked to multiply before any matrix was loaded
    #[error("no matrix loaded")]
    NotLoaded,

    /// The worker pool could not be constructed
    #[error("failed to build worker pool: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),

    /// Input file could not be opened or read
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Malformed or truncated input file
    #[error("parse error in {path}: {reason}")]
    Parse { path: PathBuf, reason: String },
}

/// Convenience alias used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn parse(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Error::Parse {
            path: path.into(),
            reason: reason.into(),
        }
    }
}
