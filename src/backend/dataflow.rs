//! Persistent dataflow-graph backends
//!
//! Loading builds the graph once: P multiply nodes and P normalize nodes,
//! multiplexed onto a bounded set of worker threads (node i lives on
//! worker `i % W`). A multiply call broadcasts (x, y) to every multiply
//! node without blocking, then waits until all in-flight activity settles.
//! That is a scatter/barrier pattern, not a pipeline: every call fully
//! drains before the next begins, so the node threads only touch the
//! caller's vectors inside the call's borrow window.
//!
//! The pinned variant re-asserts its CPU mask on EVERY activation, not
//! once at node creation. Schedulers are free to rotate work across
//! threads between activations; re-pinning is what keeps a node's rows on
//! one core across thousands of calls.

use std::slice;
use std::thread::JoinHandle;

use crossbeam_channel::{unbounded, Receiver, Sender};
use crossbeam_utils::sync::WaitGroup;
use num_traits::Float;

use crate::affinity;
use crate::backend::{check_dimensions, require_square, worker_budget, SparseMatrix};
use crate::error::Result;
use crate::matrix::{partition, Crs, Partition, Triplet};
use crate::power;

/// One queued node activation.
///
/// Raw pointers stand in for the shared vectors: the caller guarantees
/// they stay alive and unaliased (per disjoint row range) until the
/// activation's WaitGroup clone is dropped.
enum Activation<T> {
    Multiply {
        node: usize,
        x: *const T,
        y: *mut T,
        done: WaitGroup,
    },
    Normalize {
        node: usize,
        x: *mut T,
        y: *mut T,
        norm: T,
        done: WaitGroup,
    },
}

// The pointers inside are only dereferenced while the submitting call
// blocks on the WaitGroup, and each node writes a disjoint row range.
unsafe impl<T: Send> Send for Activation<T> {}

/// Backend scheduling persistent graph nodes over a bounded worker set
pub struct DataflowGraph<T> {
    workers: usize,
    pinned: bool,
    rows: usize,
    cols: usize,
    partitions: usize,
    senders: Vec<Sender<Activation<T>>>,
    handles: Vec<JoinHandle<()>>,
}

impl<T> DataflowGraph<T>
where
    T: Float + Send + Sync + 'static,
{
    /// Creates an unpinned dataflow backend with at most `threads` workers
    pub fn new(threads: usize) -> Result<Self> {
        Self::build(threads, false)
    }

    /// Creates a dataflow backend that pins every activation of node i to
    /// CPU `i % worker_count`
    pub fn pinned(threads: usize) -> Result<Self> {
        Self::build(threads, true)
    }

    fn build(threads: usize, pinned: bool) -> Result<Self> {
        let workers = worker_budget(threads)?;
        Ok(Self {
            workers,
            pinned,
            rows: 0,
            cols: 0,
            partitions: 0,
            senders: Vec::new(),
            handles: Vec::new(),
        })
    }

    /// Partitions the matrix and (re)builds the node graph
    fn install(&mut self, matrix: &Crs<T>, partitions: usize) {
        self.teardown();

        let partitions = partitions.max(1);
        self.rows = matrix.rows;
        self.cols = matrix.cols;
        self.partitions = partitions;

        // Node i lands on worker i % W; a worker owns its nodes in
        // increasing partition order, so node i is its worker's i / W'th.
        let mut per_worker: Vec<Vec<Partition<T>>> = (0..self.workers).map(|_| Vec::new()).collect();
        for (i, part) in partition(matrix, partitions).into_iter().enumerate() {
            per_worker[i % self.workers].push(part);
        }

        let cols = self.cols;
        let pinned = self.pinned;
        for (cpu, nodes) in per_worker.into_iter().enumerate() {
            let (tx, rx) = unbounded();
            self.senders.push(tx);
            self.handles.push(std::thread::spawn(move || {
                node_loop(rx, nodes, cols, cpu, pinned)
            }));
        }
    }

    /// Broadcasts one activation per node, then blocks until all settle
    fn scatter(&self, make: impl Fn(usize, WaitGroup) -> Activation<T>) {
        let settled = WaitGroup::new();
        for i in 0..self.partitions {
            let job = make(i, settled.clone());
            if self.senders[i % self.workers].send(job).is_err() {
                log::error!("dataflow node {} terminated; dropping activation", i);
            }
        }
        settled.wait();
    }
}

impl<T> DataflowGraph<T> {
    /// Disconnects the node channels and joins the worker threads
    fn teardown(&mut self) {
        self.senders.clear();
        for handle in self.handles.drain(..) {
            let _ = handle.join();
        }
        self.partitions = 0;
    }
}

impl<T> Drop for DataflowGraph<T> {
    fn drop(&mut self) {
        self.teardown();
    }
}

/// Worker thread body: executes activations for the nodes it owns
fn node_loop<T: Float>(
    rx: Receiver<Activation<T>>,
    nodes: Vec<Partition<T>>,
    cols: usize,
    cpu: usize,
    pinned: bool,
) {
    for job in rx.iter() {
        match job {
            Activation::Multiply { node, x, y, done } => {
                if pinned {
                    affinity::pin_current(cpu);
                }
                let part = &nodes[node];
                // Safety: the caller blocks until `done` drops, and this
                // node owns rows [first_row, last_row) exclusively.
                let x = unsafe { slice::from_raw_parts(x, cols) };
                let out =
                    unsafe { slice::from_raw_parts_mut(y.add(part.first_row), part.rows()) };
                part.multiply_into(x, out);
                drop(done);
            }
            Activation::Normalize { node, x, y, norm, done } => {
                if pinned {
                    affinity::pin_current(cpu);
                }
                let part = &nodes[node];
                // Safety: as above; x and y row ranges are disjoint per node.
                let xr =
                    unsafe { slice::from_raw_parts_mut(x.add(part.first_row), part.rows()) };
                let yr =
                    unsafe { slice::from_raw_parts_mut(y.add(part.first_row), part.rows()) };
                power::normalize_segment(xr, yr, norm);
                drop(done);
            }
        }
    }
}

impl<T> SparseMatrix<T> for DataflowGraph<T>
where
    T: Float + Send + Sync + 'static,
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

        let xp = x.as_ptr();
        let yp = y.as_mut_ptr();
        self.scatter(|node, done| Activation::Multiply {
            node: node / self.workers,
            x: xp,
            y: yp,
            done,
        });
        Ok(())
    }

    fn power_iteration(&self, x: &mut [T], y: &mut [T], iterations: usize) -> Result<()> {
        require_square(self.rows, self.cols)?;

        for _ in 0..iterations {
            self.multiply(x, y)?;

            // The multiply barrier has settled, so the reduction sees every
            // output row; the scalar is then broadcast to all normalize
            // nodes and the second barrier ends the iteration.
            let norm = power::norm2(y);
            let xp = x.as_mut_ptr();
            let yp = y.as_mut_ptr();
            self.scatter(|node, done| Activation::Normalize {
                node: node / self.workers,
                x: xp,
                y: yp,
                norm,
                done,
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
        assert!(DataflowGraph::<f64>::new(0).is_err());
    }

    #[test]
    fn matches_sequential_bit_for_bit() {
        let mut reference = Sequential::<f64>::new();
        reference.load_poisson(4, 5, 1).unwrap();

        let x: Vec<f64> = (0..20).map(|i| (i as f64 * 0.61).sin()).collect();
        let mut expect = vec![0.0; 20];
        reference.multiply(&x, &mut expect).unwrap();

        for partitions in 1..=21 {
            let mut backend = DataflowGraph::<f64>::pinned(3).unwrap();
            backend.load_poisson(4, 5, partitions).unwrap();

            let mut y = vec![0.0; 20];
            backend.multiply(&x, &mut y).unwrap();
            assert_eq!(y, expect, "partition count {}", partitions);
        }
    }

    #[test]
    fn calls_fully_drain_between_invocations() {
        let mut backend = DataflowGraph::<f64>::new(2).unwrap();
        backend.load_poisson(3, 3, 5).unwrap();

        let mut reference = Sequential::<f64>::new();
        reference.load_poisson(3, 3, 1).unwrap();

        // Back-to-back calls reusing the same scratch vector only agree
        // with the reference if each call drains before the next starts.
        let mut y = vec![0.0; 9];
        let mut expect = vec![0.0; 9];
        for round in 0..50 {
            let x: Vec<f64> = (0..9).map(|i| (i * round + 1) as f64).collect();
            backend.multiply(&x, &mut y).unwrap();
            reference.multiply(&x, &mut expect).unwrap();
            assert_eq!(y, expect, "round {}", round);
        }
    }

    #[test]
    fn reload_rebuilds_the_graph() {
        let mut backend = DataflowGraph::<f64>::new(2).unwrap();
        backend.load_poisson(2, 2, 3).unwrap();
        backend.load_poisson(3, 3, 4).unwrap();

        assert_eq!(backend.rows(), 9);
        let x = vec![1.0; 9];
        let mut y = vec![0.0; 9];
        backend.multiply(&x, &mut y).unwrap();

        let mut reference = Sequential::<f64>::new();
        reference.load_poisson(3, 3, 1).unwrap();
        let mut expect = vec![0.0; 9];
        reference.multiply(&x, &mut expect).unwrap();
        assert_eq!(y, expect);
    }

    #[test]
    fn power_iteration_normalizes_in_parallel() {
        let mut backend = DataflowGraph::<f64>::new(4).unwrap();
        backend.load_poisson(4, 4, 6).unwrap();

        let mut x = vec![1.0; 16];
        let mut y = vec![0.0; 16];
        backend.power_iteration(&mut x, &mut y, 5).unwrap();

        let norm: f64 = x.iter().map(|v| v * v).sum::<f64>().sqrt();
        assert!((norm - 1.0).abs() < 1e-12);
    }
}
