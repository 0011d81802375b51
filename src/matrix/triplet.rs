//! Triplet (coordinate) format and the input-file loaders
//!
//! Two on-disk sources are supported: Matrix-Market text files and the
//! binary edge lists produced by Graph500-style Kronecker generators.
//! Both loaders bounds-check everything they read; a truncated or
//! malformed file is a parse error, never an out-of-bounds access.

use std::fs;
use std::path::Path;
use std::str::FromStr;

use num_traits::Float;

use crate::error::{Error, Result};

/// A sparse matrix as a list of (row, col, value) coordinates
#[derive(Debug, Clone)]
pub struct Triplet<T> {
    /// Number of rows in the matrix
    pub rows: usize,

    /// Number of columns in the matrix
    pub cols: usize,

    /// Non-zero entries as (row, col, value), in file order
    pub entries: Vec<(usize, usize, T)>,
}

impl<T> Triplet<T>
where
    T: Float + FromStr,
{
    /// Returns the number of stored entries
    pub fn nnz(&self) -> usize {
        self.entries.len()
    }

    /// Loads a Matrix-Market style text file
    ///
    /// Lines starting with '%' are comments. The first data line is the
    /// header "rows cols nnz", followed by nnz lines "row col value" with
    /// 1-based coordinates.
    pub fn load_matrix_market(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let mut lines = text
            .lines()
            .filter(|l| !l.starts_with('%') && !l.trim().is_empty());

        let header = lines
            .next()
            .ok_or_else(|| Error::parse(path, "missing header line"))?;
        let mut fields = header.split_whitespace();
        let rows: usize = parse_field(&mut fields, path, "header rows")?;
        let cols: usize = parse_field(&mut fields, path, "header cols")?;
        let nnz: usize = parse_field(&mut fields, path, "header nnz")?;

        let mut entries = Vec::with_capacity(nnz);
        for _ in 0..nnz {
            let line = lines
                .next()
                .ok_or_else(|| Error::parse(path, format!("expected {} entries, file truncated", nnz)))?;
            let mut fields = line.split_whitespace();
            let r: usize = parse_field(&mut fields, path, "entry row")?;
            let c: usize = parse_field(&mut fields, path, "entry col")?;
            let v: T = parse_field(&mut fields, path, "entry value")?;

            // Matrix-Market coordinates are 1-based
            if r == 0 || r > rows || c == 0 || c > cols {
                return Err(Error::parse(
                    path,
                    format!("coordinate ({}, {}) outside {} x {}", r, c, rows, cols),
                ));
            }
            entries.push((r - 1, c - 1, v));
        }

        Ok(Self { rows, cols, entries })
    }

    /// Loads a Kronecker graph generator binary edge list
    ///
    /// The file is a sequence of little-endian u32 (src, dst) pairs; each
    /// edge becomes a 1.0 entry. `size` is the matrix dimension (a power
    /// of two encoded in the filename). With `fill_in` set the reverse
    /// edge is inserted as well.
    pub fn load_kronecker(path: impl AsRef<Path>, size: usize, fill_in: bool) -> Result<Self> {
        let path = path.as_ref();
        let bytes = fs::read(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;

        if bytes.len() % 8 != 0 {
            return Err(Error::parse(
                path,
                format!("file length {} is not a whole number of edges", bytes.len()),
            ));
        }

        let mut entries = Vec::with_capacity(bytes.len() / 8);
        for edge in bytes.chunks_exact(8) {
            let src = u32::from_le_bytes([edge[0], edge[1], edge[2], edge[3]]) as usize;
            let dst = u32::from_le_bytes([edge[4], edge[5], edge[6], edge[7]]) as usize;

            if src >= size || dst >= size {
                return Err(Error::parse(
                    path,
                    format!("edge ({}, {}) outside matrix of size {}", src, dst, size),
                ));
            }

            entries.push((src, dst, T::one()));
            if fill_in && src != dst {
                entries.push((dst, src, T::one()));
            }
        }

        Ok(Self {
            rows: size,
            cols: size,
            entries,
        })
    }
}

fn parse_field<'a, F>(
    fields: &mut impl Iterator<Item = &'a str>,
    path: &Path,
    what: &str,
) -> Result<F>
where
    F: FromStr,
{
    fields
        .next()
        .ok_or_else(|| Error::parse(path, format!("missing {}", what)))?
        .parse()
        .map_err(|_| Error::parse(path, format!("invalid {}", what)))
}
