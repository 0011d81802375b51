//! Benchmark driver comparing power-method execution backends
//!
//! Mirrors the classic positional invocation:
//!
//! ```text
//! powerbench <input> <runs> <warmup> <iterations> <method> [threads] [partitions]
//! ```
//!
//! where `<input>` is a Matrix-Market `.mtx` file or a Kronecker `.bin`
//! edge list whose filename ends in `..._<log2size>_<fillflag>.bin`.

use std::path::Path;
use std::process;
use std::time::Instant;

use powerbench::{backend, BackendKind, Result, Triplet};

fn print_usage() {
    eprintln!("You need to provide the correct command line arguments:");
    eprintln!("  1) Filename of a Matrix Market (.mtx) or Kronecker graph (.bin) input file");
    eprintln!("     (Kronecker filenames end in _<log2size>_<fillflag>.bin)");
    eprintln!("  2) Amount of times the power algorithm is executed");
    eprintln!("  3) Amount of warm up runs (not timed)");
    eprintln!("  4) Amount of iterations in the power method");
    eprintln!("  5) Method to use:");
    eprintln!("     1) Sequential CRS");
    eprintln!("     2) CRS on a worker pool (alias of 6)");
    eprintln!("     3) CRS on a worker pool (alias of 6)");
    eprintln!("     4) CRS on a persistent dataflow graph");
    eprintln!("     5) CRS on a persistent dataflow graph, nodes pinned to CPUs");
    eprintln!("     6) CRS on a worker pool");
    eprintln!("     7) CRS on a worker pool, tasks pinned to CPUs");
    eprintln!("  6) Amount of threads (-1 = all hardware threads; methods 2-7)");
    eprintln!("  7) Amount of partitions (methods 4-7)");
}

struct Args {
    input: String,
    runs: usize,
    warm_up: usize,
    iterations: usize,
    method: u32,
    threads: usize,
    partitions: usize,
}

fn parse_args() -> Option<Args> {
    let argv: Vec<String> = std::env::args().skip(1).collect();
    if argv.len() < 5 {
        return None;
    }

    let input = argv[0].clone();
    let runs = argv[1].parse().ok()?;
    let warm_up = argv[2].parse().ok()?;
    let iterations = argv[3].parse().ok()?;
    let method: u32 = argv[4].parse().ok()?;

    let threads = if method > 1 {
        let raw: isize = argv.get(5)?.parse().ok()?;
        if raw == -1 {
            num_cpus::get()
        } else if raw > 0 {
            raw as usize
        } else {
            return None;
        }
    } else {
        1
    };

    let partitions = if (4..=7).contains(&method) {
        argv.get(6)?.parse().ok()?
    } else {
        threads
    };

    Some(Args {
        input,
        runs,
        warm_up,
        iterations,
        method,
        threads,
        partitions,
    })
}

/// Extracts (log2 size, fill-in flag) from `..._<log2size>_<fillflag>.bin`
fn kronecker_filename_key(path: &str) -> Option<(u32, bool)> {
    let stem = Path::new(path).file_stem()?.to_str()?;
    let mut rev = stem.rsplit('_');
    let fill_in = match rev.next()? {
        "0" => false,
        "1" => true,
        _ => return None,
    };
    let log2_size: u32 = rev.next()?.parse().ok()?;
    Some((log2_size, fill_in))
}

fn load_input(path: &str) -> Result<Triplet<f64>> {
    if path.ends_with(".mtx") {
        Triplet::load_matrix_market(path)
    } else if path.ends_with(".bin") {
        let (log2_size, fill_in) = kronecker_filename_key(path).ok_or_else(|| {
            powerbench::Error::Parse {
                path: path.into(),
                reason: "filename does not end in _<log2size>_<fillflag>.bin".into(),
            }
        })?;
        Triplet::load_kronecker(path, 1usize << log2_size, fill_in)
    } else {
        Err(powerbench::Error::Parse {
            path: path.into(),
            reason: "unrecognized input name (expected .mtx or .bin)".into(),
        })
    }
}

fn run(args: &Args) -> Result<()> {
    let kind = BackendKind::from_id(args.method)?;
    let mut mat = backend::select::<f64>(kind, args.threads)?;

    let setup = Instant::now();
    let input = load_input(&args.input)?;
    let size = input.rows;
    mat.load_triplet(&input, args.partitions)?;

    let mut x = vec![1.0; size];
    let mut y = vec![0.0; size];
    println!(
        "Time to set up datastructures: {:.3}ms",
        setup.elapsed().as_secs_f64() * 1000.0
    );

    for _ in 0..args.warm_up {
        x.fill(1.0);
        mat.power_iteration(&mut x, &mut y, args.iterations)?;
    }

    let timed = Instant::now();
    for _ in 0..args.runs {
        x.fill(1.0);
        mat.power_iteration(&mut x, &mut y, args.iterations)?;
    }
    println!(
        "Time (ms) to get {} executions: {:.3}ms",
        args.runs,
        timed.elapsed().as_secs_f64() * 1000.0
    );

    Ok(())
}

fn main() {
    env_logger::init();

    let Some(args) = parse_args() else {
        print_usage();
        process::exit(-1);
    };

    if let Err(err) = run(&args) {
        eprintln!("error: {err}");
        print_usage();
        process::exit(-1);
    }
}
