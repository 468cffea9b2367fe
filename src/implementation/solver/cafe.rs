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

//! This module provides CAFE, the coordinated ahead-of-frontier expansion
//! engine. One coordinator runs the canonical A* loop; the workers watch the
//! lookahead window over the most recent frontier pushes and speculatively
//! pre-expand the nodes the coordinator is about to pop. Whoever wins the
//! claim CAS on a node expands it; the coordinator either counts a manual
//! expansion or harvests the precomputed successor list.
//!
//! Speculation is non-authoritative: workers expand into private arenas and
//! the nodes they produce become canonical only if and when the coordinator
//! folds them through duplicate resolution. A speculation that raced against
//! a cost improvement is simply thrown away and redone; the same
//! duplicate-replacement path covers both.

use std::collections::hash_map::Entry;
use std::hash::Hash;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Instant;

use fxhash::FxHashMap;

use super::{conclude, waste_time};
use crate::{
    Lookahead, Node, NodeId, NodeStore, OpenList, Problem, Search, SearchOutcome, SearchStats,
    SpeculationStats,
};

/// The state shared between the coordinator and its speculating workers.
/// The frontier and the closed table are *not* in here: only the coordinator
/// touches them.
struct Shared<'a, P: Problem> {
    problem: &'a P,
    extra_expansion_time: usize,
    /// Arena 0 belongs to the coordinator; arena `i + 1` is the private
    /// arena of worker `i`.
    store: NodeStore<P::State>,
    /// The window over the most recent frontier pushes, one slot per worker.
    lookahead: Lookahead,
    /// Cooperative stop, polled by the workers at their loop head.
    stop: AtomicBool,
    /// Total number of speculative expansions, flushed by exiting workers.
    speculated: AtomicUsize,
}

/// The coordinated ahead-of-frontier expansion engine.
pub struct Cafe<'a, P: Problem> {
    problem: &'a P,
    extra_expansion_time: usize,
    threads: usize,
}

impl<'a, P: Problem> Cafe<'a, P> {
    /// Creates a CAFE engine with `threads` speculating workers (zero is
    /// legal and degenerates into plain sequential A*).
    pub fn new(problem: &'a P, extra_expansion_time: usize, threads: usize) -> Self {
        Cafe {
            problem,
            extra_expansion_time,
            threads,
        }
    }
}

impl<P: Problem + Sync> Cafe<'_, P>
where
    P::State: Eq + Hash + Clone + Send + Sync,
{
    /// Expands a claimed node into the given arena and returns the fresh
    /// successor candidates. Shared by the coordinator (arena 0) and the
    /// workers (their private arena).
    fn expand(shared: &Shared<P>, arena: usize, id: NodeId) -> Vec<NodeId> {
        let problem = shared.problem;
        let node = shared.store.node(id);
        let state = node.state();
        let g = node.g();
        let mut successors = Vec::with_capacity(problem.max_action_count());
        for successor in problem.successors(state) {
            if successor == *state {
                continue;
            }
            let g2 = g + problem.cost(state, &successor);
            let h2 = problem.heuristic(&successor);
            successors.push(
                shared
                    .store
                    .arena(arena)
                    .push(Node::new(successor, g2, h2, Some(id))),
            );
        }
        waste_time(shared.extra_expansion_time);
        successors
    }

    /// The loop of speculating worker `slot`: watch window slot `slot`, try
    /// to claim whatever sits there, expand and publish on success.
    fn worker(shared: &Shared<P>, slot: usize) {
        let arena = slot + 1;
        let mut speculated = 0_usize;
        while !shared.stop.load(Ordering::Relaxed) {
            let snapshot = shared.lookahead.snapshot();
            let Some(id) = snapshot.get(slot) else {
                std::thread::yield_now();
                continue;
            };
            let node = shared.store.node(id);
            if node.try_claim() {
                let successors = Self::expand(shared, arena, id);
                node.publish(successors);
                speculated += 1;
            }
        }
        shared.speculated.fetch_add(speculated, Ordering::Relaxed);
    }

    /// The canonical A* loop, harvesting speculative expansions where they
    /// are already in flight or done.
    fn coordinate(
        shared: &Shared<P>,
        stats: &mut SearchStats,
        speculation: &mut SpeculationStats,
    ) -> Option<NodeId> {
        let store = &shared.store;
        let mut open = OpenList::new();
        let mut closed: FxHashMap<P::State, NodeId> = FxHashMap::default();

        let initial = shared.problem.initial_state();
        let h = shared.problem.heuristic(&initial);
        let root = store.arena(0).push(Node::new(initial.clone(), 0.0, h, None));
        closed.insert(initial, root);
        open.push(store, root, h, 0.0);
        shared.lookahead.push(root);

        while let Some(id) = open.pop(store) {
            let node = store.node(id);
            if node.h() == 0.0 {
                return Some(id);
            }
            stats.expanded += 1;
            let successors = if node.try_claim() {
                speculation.manual_expanded += 1;
                let successors = Self::expand(shared, 0, id);
                node.publish(successors.clone());
                successors
            } else {
                // a worker got there first; spin until its result is
                // published, then consume it
                node.wait_successors()
            };

            for child_id in successors {
                let child = store.node(child_id);
                stats.generated += 1;
                match closed.entry(child.state().clone()) {
                    Entry::Vacant(entry) => {
                        entry.insert(child_id);
                        open.push(store, child_id, child.f(), child.g());
                        shared.lookahead.push(child_id);
                    }
                    Entry::Occupied(entry) => {
                        let canonical_id = *entry.get();
                        let canonical = store.node(canonical_id);
                        if canonical.f() <= child.f() {
                            stats.generated -= 1;
                        } else {
                            stats.duplicated += 1;
                            canonical.improve(child.g(), child.f(), child.parent());
                            if canonical.in_open() {
                                // any speculation that read the old cost is
                                // stale; drop it and let the node be expanded
                                // again against the improved cost
                                canonical.reset();
                                open.update(store, canonical_id, canonical.f(), canonical.g());
                            }
                        }
                    }
                }
            }
        }
        None
    }
}

impl<P: Problem + Sync> Search for Cafe<'_, P>
where
    P::State: Eq + Hash + Clone + Send + Sync,
{
    type State = P::State;

    fn run(&mut self) -> SearchOutcome<P::State> {
        let clock = Instant::now();
        let mut stats = SearchStats::new("CAFE", self.threads, self.extra_expansion_time);
        let mut speculation = SpeculationStats::default();

        let shared = Shared {
            problem: self.problem,
            extra_expansion_time: self.extra_expansion_time,
            store: NodeStore::new(self.threads + 1),
            lookahead: Lookahead::new(self.threads),
            stop: AtomicBool::new(false),
            speculated: AtomicUsize::new(0),
        };

        let mut goal = None;
        std::thread::scope(|scope| {
            for slot in 0..self.threads {
                let shared = &shared;
                scope.spawn(move || Self::worker(shared, slot));
            }
            tracing::debug!(threads = self.threads, "speculation workers initialized");
            goal = Self::coordinate(&shared, &mut stats, &mut speculation);
            shared.stop.store(true, Ordering::Relaxed);
        });

        speculation.speculated = shared.speculated.load(Ordering::Relaxed);
        stats.speculation = Some(speculation);
        conclude(&shared.store, goal, stats, clock)
    }
}

#[cfg(test)]
mod test_cafe {
    use crate::{AStar, Cafe, Cost, Problem, Search};

    struct OpenGrid {
        rows: i32,
        cols: i32,
    }
    impl Problem for OpenGrid {
        type State = (i32, i32);

        fn initial_state(&self) -> (i32, i32) {
            (0, 0)
        }
        fn successors(&self, &(r, c): &(i32, i32)) -> Vec<(i32, i32)> {
            [(r - 1, c), (r + 1, c), (r, c - 1), (r, c + 1)]
                .into_iter()
                .filter(|&(r, c)| r >= 0 && r < self.rows && c >= 0 && c < self.cols)
                .collect()
        }
        fn cost(&self, _: &(i32, i32), _: &(i32, i32)) -> Cost {
            1.0
        }
        fn heuristic(&self, &(r, c): &(i32, i32)) -> Cost {
            ((self.rows - 1 - r) + (self.cols - 1 - c)) as Cost
        }
        fn max_action_count(&self) -> usize {
            4
        }
    }

    struct Island;
    impl Problem for Island {
        type State = u8;

        fn initial_state(&self) -> u8 {
            0
        }
        fn successors(&self, _: &u8) -> Vec<u8> {
            vec![]
        }
        fn cost(&self, _: &u8, _: &u8) -> Cost {
            1.0
        }
        fn heuristic(&self, _: &u8) -> Cost {
            1.0
        }
        fn max_action_count(&self) -> usize {
            0
        }
    }

    #[test]
    fn it_finds_a_shortest_path_on_an_open_grid() {
        let problem = OpenGrid { rows: 5, cols: 6 };
        let outcome = Cafe::new(&problem, 0, 4).run();
        assert_eq!(Some(9.0), outcome.stats.path_length);
        for pair in outcome.path.windows(2) {
            assert!(problem.successors(&pair[0]).contains(&pair[1]));
        }
    }

    #[test]
    fn the_path_length_is_invariant_in_the_number_of_workers() {
        let problem = OpenGrid { rows: 6, cols: 7 };
        for threads in [0, 1, 2, 4, 8] {
            let outcome = Cafe::new(&problem, 0, threads).run();
            assert_eq!(Some(11.0), outcome.stats.path_length, "W = {threads}");
        }
    }

    #[test]
    fn without_workers_it_reduces_to_sequential_a_star() {
        let problem = OpenGrid { rows: 5, cols: 5 };
        let baseline = AStar::new(&problem, 0).run();
        let outcome = Cafe::new(&problem, 0, 0).run();
        assert_eq!(baseline.stats.path_length, outcome.stats.path_length);
        assert_eq!(baseline.stats.expanded, outcome.stats.expanded);
        assert_eq!(baseline.stats.generated, outcome.stats.generated);
        let speculation = outcome.stats.speculation.unwrap();
        assert_eq!(0, speculation.speculated);
        assert_eq!(outcome.stats.expanded, speculation.manual_expanded);
    }

    #[test]
    fn speculation_counters_bound_the_expansion_count() {
        let problem = OpenGrid { rows: 8, cols: 8 };
        for threads in [1, 2, 4] {
            let outcome = Cafe::new(&problem, 0, threads).run();
            let speculation = outcome.stats.speculation.unwrap();
            assert!(speculation.manual_expanded <= outcome.stats.expanded);
            assert!(
                speculation.manual_expanded + speculation.speculated >= outcome.stats.expanded
            );
        }
    }

    #[test]
    fn an_exhausted_frontier_stops_the_workers() {
        for threads in [0, 1, 4] {
            let outcome = Cafe::new(&Island, 0, threads).run();
            assert!(outcome.path.is_empty());
            assert_eq!(None, outcome.stats.path_length);
            assert!(outcome.stats.expanded >= 1);
        }
    }
}
