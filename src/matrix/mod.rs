// Sparse matrix data structures: CRS storage, triplet input, partitioning

pub mod crs;
pub mod partition;
pub mod triplet;

pub use crs::Crs;
pub use partition::{partition, partition_rows, Partition};
pub use triplet::Triplet;
