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

//! End-to-end scenarios, run against the two shipped problem domains and
//! every engine. The solvers modules are not unit tested in depth (that is
//! nearly impossible for the parallel ones); instead we solve instances with
//! known optima and check the answers and the statistics.

use std::io::Cursor;

use spbfs::problems::{GridPath, SlidingTiles};
use spbfs::{AStar, Cafe, Cost, Greedy, Kbfs, Problem, Search, SearchOutcome, SpaStar};

/// Parses a pathfinding instance from its textual form.
fn grid(text: &str) -> GridPath {
    GridPath::from_reader(Cursor::new(text)).expect("grid instance")
}

/// Renders and parses a sliding-tile instance from two board configurations.
fn tiles(initial: [u8; 16], goal: [u8; 16]) -> SlidingTiles {
    let mut text = String::from("4 4\nstarting positions for each tile:\n");
    for value in initial {
        text.push_str(&format!("{value}\n"));
    }
    text.push_str("goal positions:\n");
    for value in goal {
        text.push_str(&format!("{value}\n"));
    }
    SlidingTiles::from_reader(Cursor::new(text)).expect("tiles instance")
}

const SOLVED: [u8; 16] = [1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 0];

/// Runs all four optimal engines (the parallel ones with `threads` workers)
/// on the same instance.
fn all_engines<P>(problem: &P, threads: usize) -> Vec<SearchOutcome<P::State>>
where
    P: Problem + Sync,
    P::State: Eq + std::hash::Hash + Clone + Send + Sync,
{
    vec![
        AStar::new(problem, 0).run(),
        Kbfs::new(problem, 0, threads).run(),
        SpaStar::new(problem, 0, threads).run(),
        Cafe::new(problem, 0, threads).run(),
    ]
}

/// Checks that a returned path starts at the initial state, only takes legal
/// moves and costs exactly its reported length.
fn assert_valid_path<P>(problem: &P, outcome: &SearchOutcome<P::State>)
where
    P: Problem,
    P::State: Eq + std::fmt::Debug,
{
    assert_eq!(problem.initial_state(), outcome.path[0]);
    let mut total = 0.0;
    for pair in outcome.path.windows(2) {
        assert!(
            problem.successors(&pair[0]).contains(&pair[1]),
            "illegal move {:?} -> {:?}",
            pair[0],
            pair[1]
        );
        total += problem.cost(&pair[0], &pair[1]);
    }
    assert_eq!(Some(total), outcome.stats.path_length);
    assert_eq!(0.0, problem.heuristic(outcome.path.last().unwrap()));
}

#[test]
fn a_3x3_grid_with_one_goal_costs_four_steps() {
    let problem = grid("3 3\nV _ _\n_ _ _\n_ _ *\n");
    for outcome in all_engines(&problem, 4) {
        assert_eq!(Some(4.0), outcome.stats.path_length, "{}", outcome.stats.algorithm);
        assert_eq!(5, outcome.path.len());
        assert_valid_path(&problem, &outcome);
    }
}

#[test]
fn a_walled_off_goal_is_unreachable_for_every_engine() {
    let problem = grid("3 3\nV # *\n# # _\n_ _ _\n");
    for outcome in all_engines(&problem, 4) {
        assert!(outcome.path.is_empty(), "{}", outcome.stats.algorithm);
        assert_eq!(None, outcome.stats.path_length);
        assert!(outcome.stats.expanded >= 1);
        assert_eq!(
            -1.0,
            outcome.stats.to_json()["Path Length"].as_f64().unwrap()
        );
    }
}

#[test]
fn picking_up_two_goals_costs_the_full_tour() {
    // goals in two opposite corners: collect one, then cross to the other
    let problem = grid("3 3\nV _ *\n_ _ _\n* _ _\n");
    for outcome in all_engines(&problem, 4) {
        assert_eq!(Some(6.0), outcome.stats.path_length, "{}", outcome.stats.algorithm);
        assert_valid_path(&problem, &outcome);
    }
}

#[test]
fn a_solved_puzzle_needs_no_search_at_all() {
    let problem = tiles(SOLVED, SOLVED);
    for outcome in all_engines(&problem, 4) {
        assert_eq!(Some(0.0), outcome.stats.path_length, "{}", outcome.stats.algorithm);
        assert_eq!(1, outcome.path.len());
        assert_eq!(0, outcome.stats.expanded);
        assert_eq!(0, outcome.stats.generated);
    }
}

#[test]
fn a_single_slide_puzzle_has_a_two_state_path() {
    let mut start = SOLVED;
    start.swap(14, 15);
    let problem = tiles(start, SOLVED);
    for outcome in all_engines(&problem, 4) {
        assert_eq!(Some(1.0), outcome.stats.path_length, "{}", outcome.stats.algorithm);
        assert_eq!(2, outcome.path.len());
        assert_valid_path(&problem, &outcome);
    }
}

#[test]
fn every_engine_agrees_on_a_two_slide_puzzle() {
    let mut start = SOLVED;
    start.swap(14, 15);
    start.swap(13, 14);
    let problem = tiles(start, SOLVED);
    for outcome in all_engines(&problem, 4) {
        assert_eq!(Some(2.0), outcome.stats.path_length, "{}", outcome.stats.algorithm);
        assert_valid_path(&problem, &outcome);
    }
}

#[test]
fn the_cafe_path_length_is_invariant_in_the_worker_count() {
    let problem = grid("3 3\nV _ _\n_ _ _\n_ _ *\n");
    for threads in [1, 2, 4, 8] {
        let outcome = Cafe::new(&problem, 0, threads).run();
        assert_eq!(Some(4.0), outcome.stats.path_length, "W = {threads}");
    }
}

#[test]
fn the_cafe_counters_satisfy_the_speculation_inequalities() {
    let problem = grid("5 5\nV _ _ _ _\n_ # # _ _\n_ _ _ # _\n_ # _ _ _\n_ _ _ _ *\n");
    for threads in [1, 2, 4] {
        let outcome = Cafe::new(&problem, 0, threads).run();
        let speculation = outcome.stats.speculation.expect("CAFE speculation stats");
        assert!(speculation.manual_expanded <= outcome.stats.expanded);
        assert!(speculation.manual_expanded + speculation.speculated >= outcome.stats.expanded);
    }
}

#[test]
fn kbfs_with_one_thread_matches_sequential_a_star_exactly() {
    let problem = grid("4 4\nV _ _ _\n_ # _ _\n_ _ # _\n_ _ _ *\n");
    let baseline = AStar::new(&problem, 0).run();
    let batched = Kbfs::new(&problem, 0, 1).run();
    assert_eq!(baseline.stats.path_length, batched.stats.path_length);
    assert_eq!(baseline.stats.expanded, batched.stats.expanded);
    assert_eq!(baseline.stats.generated, batched.stats.generated);
    assert_eq!(baseline.stats.duplicated, batched.stats.duplicated);
}

#[test]
fn greedy_reaches_the_goal_even_if_not_optimally() {
    let problem = grid("4 4\nV _ _ _\n_ # # _\n_ # _ _\n_ _ _ *\n");
    let outcome = Greedy::new(&problem, 0).run();
    assert!(outcome.found_path());
    assert_valid_path(&problem, &outcome);
    // greedy can overshoot but never undershoots the optimum
    let optimum = AStar::new(&problem, 0).run().stats.path_length.unwrap();
    assert!(outcome.stats.path_length.unwrap() >= optimum);
}

#[test]
fn rerunning_an_engine_yields_the_same_path_length_and_counters() {
    let problem = grid("5 5\nV _ _ _ _\n_ # # _ _\n_ _ _ # _\n_ # _ _ _\n_ _ _ _ *\n");
    let first = AStar::new(&problem, 0).run();
    let second = AStar::new(&problem, 0).run();
    assert_eq!(first.stats.path_length, second.stats.path_length);
    assert_eq!(first.stats.expanded, second.stats.expanded);
    assert_eq!(first.stats.generated, second.stats.generated);
}

#[test]
fn extra_expansion_time_slows_the_search_without_changing_the_answer() {
    let problem = grid("3 3\nV _ _\n_ _ _\n_ _ *\n");
    let plain = AStar::new(&problem, 0).run();
    let burdened = AStar::new(&problem, 50).run();
    assert_eq!(plain.stats.path_length, burdened.stats.path_length);
    assert_eq!(plain.stats.expanded, burdened.stats.expanded);
}

#[test]
fn the_statistics_report_the_engine_and_its_thread_count() {
    let problem = grid("3 3\nV _ _\n_ _ _\n_ _ *\n");
    let outcome = SpaStar::new(&problem, 0, 3).run();
    let json = outcome.stats.to_json();
    assert_eq!("SPA*", json["Algorithm"].as_str().unwrap());
    assert_eq!(3, json["Threads"].as_u64().unwrap());
    assert_eq!(4.0, json["Path Length"].as_f64().unwrap());
    assert!(json["Elapsed Time"].as_f64().unwrap() >= 0.0);
}

#[test]
fn parallel_engines_solve_a_scrambled_puzzle_optimally() {
    // four slides away from the solved board, and the Manhattan heuristic
    // already accounts for each of them: the optimum is exactly four
    let start: [u8; 16] = [1, 2, 3, 4, 5, 6, 11, 7, 9, 10, 0, 8, 13, 14, 15, 12];
    let problem = tiles(start, SOLVED);
    let baseline = AStar::new(&problem, 0).run();
    assert!(baseline.found_path());
    let optimum = baseline.stats.path_length;
    assert_eq!(Some(4.0), optimum);
    for threads in [2, 4] {
        assert_eq!(optimum, Kbfs::new(&problem, 0, threads).run().stats.path_length);
        assert_eq!(optimum, SpaStar::new(&problem, 0, threads).run().stats.path_length);
        assert_eq!(optimum, Cafe::new(&problem, 0, threads).run().stats.path_length);
    }
    let mut total: Cost = 0.0;
    for pair in baseline.path.windows(2) {
        total += problem.cost(&pair[0], &pair[1]);
    }
    assert_eq!(optimum, Some(total));
}
