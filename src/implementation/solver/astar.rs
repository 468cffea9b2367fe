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

//! This module provides the serial A* engine. It is the baseline the three
//! parallel engines are measured against, and the reference for the shared
//! duplicate-resolution policy: every engine folds generated successors
//! through the exact same closed-table protocol implemented here.

use std::collections::hash_map::Entry;
use std::hash::Hash;
use std::time::Instant;

use fxhash::FxHashMap;

use super::{conclude, waste_time};
use crate::{Node, NodeId, NodeStore, OpenList, Problem, Search, SearchOutcome, SearchStats};

/// The serial best-first engine: repeatedly pop the open node with minimal
/// `(f, g)` priority, stop when its heuristic is zero, expand it otherwise.
pub struct AStar<'a, P: Problem> {
    problem: &'a P,
    extra_expansion_time: usize,
}

impl<'a, P: Problem> AStar<'a, P> {
    /// Creates an A* engine for the given problem instance. The second
    /// argument is the synthetic workload burned on every expansion.
    pub fn new(problem: &'a P, extra_expansion_time: usize) -> Self {
        AStar {
            problem,
            extra_expansion_time,
        }
    }
}

impl<P: Problem> AStar<'_, P>
where
    P::State: Eq + Hash + Clone,
{
    /// Generates the successors of the popped node and folds each of them
    /// through the duplicate-resolution policy: unknown states are inserted
    /// and pushed, known states either swallow the candidate (equal or worse
    /// `f`) or adopt its cost and parent with a decrease-key (strictly
    /// better `f`).
    fn expand(
        &self,
        store: &NodeStore<P::State>,
        open: &mut OpenList,
        closed: &mut FxHashMap<P::State, NodeId>,
        stats: &mut SearchStats,
        id: NodeId,
    ) {
        let node = store.node(id);
        for successor in self.problem.successors(node.state()) {
            if successor == *node.state() {
                continue;
            }
            let g = node.g() + self.problem.cost(node.state(), &successor);
            let h = self.problem.heuristic(&successor);
            let child = store
                .arena(0)
                .push(Node::new(successor.clone(), g, h, Some(id)));
            stats.generated += 1;
            match closed.entry(successor) {
                Entry::Vacant(entry) => {
                    entry.insert(child);
                    open.push(store, child, g + h, g);
                }
                Entry::Occupied(entry) => {
                    let canonical = store.node(*entry.get());
                    if canonical.f() <= g + h {
                        stats.generated -= 1;
                    } else {
                        stats.duplicated += 1;
                        canonical.improve(g, g + h, Some(id));
                        if canonical.in_open() {
                            open.update(store, *entry.get(), g + h, g);
                        }
                    }
                }
            }
        }
        waste_time(self.extra_expansion_time);
    }
}

impl<P: Problem> Search for AStar<'_, P>
where
    P::State: Eq + Hash + Clone,
{
    type State = P::State;

    fn run(&mut self) -> SearchOutcome<P::State> {
        let clock = Instant::now();
        let mut stats = SearchStats::new("A*", 1, self.extra_expansion_time);

        let store = NodeStore::new(1);
        let mut open = OpenList::new();
        let mut closed = FxHashMap::default();

        let initial = self.problem.initial_state();
        let h = self.problem.heuristic(&initial);
        tracing::debug!(initial_h = h as f64, "starting A* search");
        let root = store.arena(0).push(Node::new(initial.clone(), 0.0, h, None));
        closed.insert(initial, root);
        open.push(&store, root, h, 0.0);

        let mut f_layer = h;
        let mut goal = None;
        while let Some(id) = open.pop(&store) {
            let node = store.node(id);
            if node.f() > f_layer {
                f_layer = node.f();
                tracing::trace!(f = f_layer as f64, "new f layer reached");
            }
            if node.h() == 0.0 {
                goal = Some(id);
                break;
            }
            stats.expanded += 1;
            self.expand(&store, &mut open, &mut closed, &mut stats, id);
        }
        conclude(&store, goal, stats, clock)
    }
}

#[cfg(test)]
mod test_astar {
    use crate::{AStar, Cost, Problem, Search};

    /// An open rectangular grid: start in the north-west corner, goal in the
    /// south-east corner, unit moves in the four cardinal directions and the
    /// Manhattan distance as (consistent) heuristic.
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

    /// A state space with a single, goal-less state.
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
        let problem = OpenGrid { rows: 4, cols: 5 };
        let outcome = AStar::new(&problem, 0).run();
        assert_eq!(Some(7.0), outcome.stats.path_length);
        assert_eq!(8, outcome.path.len());
        assert_eq!((0, 0), outcome.path[0]);
        assert_eq!((3, 4), *outcome.path.last().unwrap());
        // every hop of the path is a legal move
        for pair in outcome.path.windows(2) {
            assert!(problem.successors(&pair[0]).contains(&pair[1]));
        }
    }

    #[test]
    fn an_initial_goal_needs_no_expansion_at_all() {
        let problem = OpenGrid { rows: 1, cols: 1 };
        let outcome = AStar::new(&problem, 0).run();
        assert_eq!(vec![(0, 0)], outcome.path);
        assert_eq!(Some(0.0), outcome.stats.path_length);
        assert_eq!(0, outcome.stats.expanded);
        assert_eq!(0, outcome.stats.generated);
    }

    #[test]
    fn an_unreachable_goal_yields_an_empty_path_and_full_statistics() {
        let outcome = AStar::new(&Island, 0).run();
        assert!(outcome.path.is_empty());
        assert!(!outcome.found_path());
        assert_eq!(None, outcome.stats.path_length);
        assert!(outcome.stats.expanded >= 1);
    }

    #[test]
    fn generated_counts_distinct_state_visits() {
        let problem = OpenGrid { rows: 2, cols: 2 };
        let outcome = AStar::new(&problem, 0).run();
        // three states besides the initial one are visited; the duplicate
        // regeneration of the initial state is cancelled out
        assert_eq!(3, outcome.stats.generated);
        assert_eq!(2, outcome.stats.expanded);
        assert_eq!(Some(2.0), outcome.stats.path_length);
    }

    #[test]
    fn running_twice_is_idempotent_on_length_and_counters() {
        let problem = OpenGrid { rows: 5, cols: 5 };
        let first = AStar::new(&problem, 0).run();
        let second = AStar::new(&problem, 0).run();
        assert_eq!(first.stats.path_length, second.stats.path_length);
        assert_eq!(first.stats.expanded, second.stats.expanded);
        assert_eq!(first.stats.generated, second.stats.generated);
    }
}
