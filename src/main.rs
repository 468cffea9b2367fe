// Copyright 2024 the spbfs developers
//
// Permission is hereby granted, free of charge, to any person obtaining a copy of
// this software and associated documentation files (the "Software"), to deal in
// the Software without restriction, including without limitation the rights to
// use, copy, modify, merge, publish, distribute, sublicense, and/or sell copies of
// the Software, and to permit persons to whom the Software is furnished to do so,
// subject to the following conditions:
//
// The above copyright notice and this permission notice shall be included in all
// copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
// IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY, FITNESS
// FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR
// COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER LIABILITY, WHETHER
// IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM, OUT OF OR IN
// CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.

//! The command line frontend: pick an engine and a problem domain, read the
//! instance from standard input, write the path to standard error (one line
//! per state) and the statistics as a JSON object to standard output.

use std::fmt::Display;
use std::hash::Hash;
use std::io;
use std::process::ExitCode;

use clap::error::ErrorKind;
use clap::{Parser, ValueEnum};
use tracing_subscriber::EnvFilter;

use spbfs::problems::{GridPath, SlidingTiles};
use spbfs::{AStar, Cafe, Greedy, Kbfs, Problem, Search, SearchOutcome, SpaStar};

/// The engine driving the search.
#[derive(Debug, Clone, Copy, ValueEnum)]
enum Algorithm {
    /// Sequential A* (optimal).
    Astar,
    /// Sequential greedy best-first search (fast, not optimal).
    Greedy,
    /// K-best-first search: bulk-synchronous parallel expansion.
    Kbfs,
    /// Shared-pool parallel A*.
    Spastar,
    /// Coordinated ahead-of-frontier (speculative) expansion.
    Cafe,
}

/// The problem domain the instance on standard input belongs to.
#[derive(Debug, Clone, Copy, ValueEnum)]
enum Domain {
    /// The 4x4 sliding-tile puzzle.
    Tiles,
    /// Grid pathfinding with multi-goal pickup.
    Path,
}

/// Heuristic best-first search over an instance read from standard input.
#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
struct Args {
    /// The search engine to run.
    #[clap(short, long, value_enum, default_value = "astar")]
    algorithm: Algorithm,
    /// The problem domain of the instance.
    #[clap(short, long, value_enum, default_value = "tiles")]
    problem: Domain,
    /// Synthetic work units burned on every expansion.
    #[clap(short, long, default_value = "0")]
    extra_expansion_time: usize,
    /// Worker threads for the parallel engines (KBFS uses this as its batch
    /// size). 0 means one per hardware thread.
    #[clap(short, long, default_value = "1")]
    threads: usize,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(error) => {
            return match error.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
                    print!("{error}");
                    ExitCode::SUCCESS
                }
                _ => {
                    eprint!("{error}");
                    ExitCode::from(1)
                }
            };
        }
    };
    let threads = if args.threads == 0 {
        num_cpus::get()
    } else {
        args.threads
    };

    let input = io::stdin().lock();
    match args.problem {
        Domain::Tiles => match SlidingTiles::from_reader(input) {
            Ok(problem) => report(solve(&problem, args.algorithm, args.extra_expansion_time, threads)),
            Err(error) => abort(error),
        },
        Domain::Path => match GridPath::from_reader(input) {
            Ok(problem) => report(solve(&problem, args.algorithm, args.extra_expansion_time, threads)),
            Err(error) => abort(error),
        },
    }
}

/// Runs the selected engine on the parsed instance.
fn solve<P>(
    problem: &P,
    algorithm: Algorithm,
    extra_expansion_time: usize,
    threads: usize,
) -> SearchOutcome<P::State>
where
    P: Problem + Sync,
    P::State: Eq + Hash + Clone + Send + Sync,
{
    match algorithm {
        Algorithm::Astar => AStar::new(problem, extra_expansion_time).run(),
        Algorithm::Greedy => Greedy::new(problem, extra_expansion_time).run(),
        Algorithm::Kbfs => Kbfs::new(problem, extra_expansion_time, threads).run(),
        Algorithm::Spastar => SpaStar::new(problem, extra_expansion_time, threads).run(),
        Algorithm::Cafe => Cafe::new(problem, extra_expansion_time, threads).run(),
    }
}

/// Prints the path to standard error and the statistics to standard output.
fn report<S: Display>(outcome: SearchOutcome<S>) -> ExitCode {
    for (step, state) in outcome.path.iter().enumerate() {
        eprintln!("[{step}] {state}");
    }
    println!("{}", outcome.stats.to_json());
    ExitCode::SUCCESS
}

/// An unreadable instance aborts the run before any search happens.
fn abort(error: impl Display) -> ExitCode {
    eprintln!("{error}");
    ExitCode::from(1)
}
