//! End-to-end tests through the on-disk input loaders

use std::io::Write;

use powerbench::{backend, BackendKind, Crs, SparseMatrix, Triplet};

const ALL_KINDS: [BackendKind; 5] = [
    BackendKind::Sequential,
    BackendKind::ThreadPool,
    BackendKind::ThreadPoolPinned,
    BackendKind::DataflowGraph,
    BackendKind::DataflowGraphPinned,
];

/// Writes a small unsymmetric Matrix-Market fixture to disk
fn matrix_market_fixture() -> tempfile::NamedTempFile {
    let mut f = tempfile::NamedTempFile::new().unwrap();
    writeln!(f, "%%MatrixMarket matrix coordinate real general").unwrap();
    writeln!(f, "% 6x6 band matrix with an off-band tail").unwrap();
    writeln!(f, "6 6 14").unwrap();
    let entries = [
        (1, 1, 4.0),
        (1, 2, -0.5),
        (2, 1, -1.0),
        (2, 2, 4.0),
        (2, 3, -0.5),
        (3, 2, -1.0),
        (3, 3, 4.0),
        (3, 4, -0.5),
        (4, 4, 4.0),
        (4, 5, -0.5),
        (5, 5, 4.0),
        (5, 6, -0.5),
        (6, 1, 0.25),
        (6, 6, 4.0),
    ];
    for (r, c, v) in entries {
        writeln!(f, "{} {} {}", r, c, v).unwrap();
    }
    f
}

#[test]
fn matrix_market_multiply_matches_sequential_for_all_partition_counts() {
    let fixture = matrix_market_fixture();
    let input = Triplet::<f64>::load_matrix_market(fixture.path()).unwrap();
    let size = input.rows;

    let mut seq = backend::select::<f64>(BackendKind::Sequential, 1).unwrap();
    seq.load_triplet(&input, 1).unwrap();
    let x: Vec<f64> = (0..size).map(|i| 1.0 + i as f64 * 0.5).collect();
    let mut expect = vec![0.0; size];
    seq.multiply(&x, &mut expect).unwrap();

    let max_partitions = (2 * num_cpus::get()).min(size);
    for kind in ALL_KINDS {
        for partitions in 1..=max_partitions {
            let mut mat = backend::select::<f64>(kind, 4).unwrap();
            mat.load_triplet(&input, partitions).unwrap();

            let mut y = vec![0.0; size];
            mat.multiply(&x, &mut y).unwrap();
            for i in 0..size {
                assert!(
                    (y[i] - expect[i]).abs() <= 1e-14,
                    "{:?} P={} row {}: {} vs {}",
                    kind,
                    partitions,
                    i,
                    y[i],
                    expect[i]
                );
            }
        }
    }
}

#[test]
fn matrix_market_power_iteration_through_the_full_stack() {
    let fixture = matrix_market_fixture();
    let input = Triplet::<f64>::load_matrix_market(fixture.path()).unwrap();
    let size = input.rows;

    let mut seq = backend::select::<f64>(BackendKind::Sequential, 1).unwrap();
    seq.load_triplet(&input, 1).unwrap();
    let mut expect = vec![1.0; size];
    let mut scratch = vec![0.0; size];
    seq.power_iteration(&mut expect, &mut scratch, 100).unwrap();

    for kind in ALL_KINDS {
        let mut mat = backend::select::<f64>(kind, 4).unwrap();
        mat.load_triplet(&input, 3).unwrap();

        let mut x = vec![1.0; size];
        let mut y = vec![0.0; size];
        mat.power_iteration(&mut x, &mut y, 100).unwrap();

        for i in 0..size {
            assert!(
                (x[i] - expect[i]).abs() <= 1e-12,
                "{:?} component {}: {} vs {}",
                kind,
                i,
                x[i],
                expect[i]
            );
        }
    }
}

/// Writes the 13 x 10 grid operator (130 rows) as a Matrix-Market file.
///
/// Large enough that a partition sweep up to twice the hardware thread
/// count stays below the row count, so the on-disk path exercises the
/// same range as the in-memory tests. All values are small integers,
/// so the decimal round trip is exact.
fn grid_operator_fixture() -> (tempfile::NamedTempFile, usize) {
    let a = Crs::<f64>::poisson(13, 10);
    let mut f = tempfile::NamedTempFile::new().unwrap();
    writeln!(f, "%%MatrixMarket matrix coordinate real general").unwrap();
    writeln!(f, "{} {} {}", a.rows, a.cols, a.nnz()).unwrap();
    for r in 0..a.rows {
        for k in a.row_start[r]..a.row_start[r + 1] {
            writeln!(f, "{} {} {}", r + 1, a.col_ind[k] + 1, a.data[k]).unwrap();
        }
    }
    (f, a.rows)
}

#[test]
fn grid_operator_from_disk_is_bit_identical_for_all_partition_counts() {
    let (fixture, size) = grid_operator_fixture();
    let input = Triplet::<f64>::load_matrix_market(fixture.path()).unwrap();
    assert_eq!(input.rows, size);

    let mut seq = backend::select::<f64>(BackendKind::Sequential, 1).unwrap();
    seq.load_triplet(&input, 1).unwrap();
    let x: Vec<f64> = (0..size).map(|i| (i as f64 * 0.71).cos()).collect();
    let mut expect = vec![0.0; size];
    seq.multiply(&x, &mut expect).unwrap();

    for kind in ALL_KINDS {
        for partitions in 1..=2 * num_cpus::get() {
            let mut mat = backend::select::<f64>(kind, 4).unwrap();
            mat.load_triplet(&input, partitions).unwrap();

            let mut y = vec![0.0; size];
            mat.multiply(&x, &mut y).unwrap();
            assert_eq!(y, expect, "{:?} P={}", kind, partitions);
        }
    }
}

#[test]
fn kronecker_edge_list_loads_and_multiplies() {
    // A ring on 8 vertices, written as a binary edge list
    let mut bytes = Vec::new();
    for v in 0u32..8 {
        bytes.extend_from_slice(&v.to_le_bytes());
        bytes.extend_from_slice(&((v + 1) % 8).to_le_bytes());
    }
    let mut f = tempfile::NamedTempFile::new().unwrap();
    f.write_all(&bytes).unwrap();

    let input = Triplet::<f64>::load_kronecker(f.path(), 8, true).unwrap();
    assert_eq!(input.nnz(), 16);

    // Each vertex has degree 2, so A * 1 = 2 * 1
    for kind in ALL_KINDS {
        let mut mat = backend::select::<f64>(kind, 2).unwrap();
        mat.load_triplet(&input, 3).unwrap();

        let x = vec![1.0; 8];
        let mut y = vec![0.0; 8];
        mat.multiply(&x, &mut y).unwrap();
        assert_eq!(y, vec![2.0; 8], "{:?} ring multiply", kind);
    }
}
