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

//! This module provides the greedy best-first engine: same node graph, same
//! closed table and same duplicate resolution as A*, but the open list is
//! ordered on the heuristic estimate alone. Greedy search trades optimality
//! for speed: the first goal popped is returned, however expensive the path
//! leading there.

use std::collections::hash_map::Entry;
use std::hash::Hash;
use std::time::Instant;

use fxhash::FxHashMap;

use super::{conclude, waste_time};
use crate::{Node, NodeId, NodeStore, OpenList, Problem, Search, SearchOutcome, SearchStats};

/// The greedy best-first engine. Not optimal; use A* (or any of its parallel
/// variants) when path quality matters.
pub struct Greedy<'a, P: Problem> {
    problem: &'a P,
    extra_expansion_time: usize,
}

impl<'a, P: Problem> Greedy<'a, P> {
    /// Creates a greedy engine for the given problem instance.
    pub fn new(problem: &'a P, extra_expansion_time: usize) -> Self {
        Greedy {
            problem,
            extra_expansion_time,
        }
    }
}

impl<P: Problem> Greedy<'_, P>
where
    P::State: Eq + Hash + Clone,
{
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
                    open.push(store, child, h, g);
                }
                Entry::Occupied(entry) => {
                    let canonical = store.node(*entry.get());
                    if canonical.f() <= g + h {
                        stats.generated -= 1;
                    } else {
                        stats.duplicated += 1;
                        canonical.improve(g, g + h, Some(id));
                        if canonical.in_open() {
                            open.update(store, *entry.get(), canonical.h(), g);
                        }
                    }
                }
            }
        }
        waste_time(self.extra_expansion_time);
    }
}

impl<P: Problem> Search for Greedy<'_, P>
where
    P::State: Eq + Hash + Clone,
{
    type State = P::State;

    fn run(&mut self) -> SearchOutcome<P::State> {
        let clock = Instant::now();
        let mut stats = SearchStats::new("Greedy", 1, self.extra_expansion_time);

        let store = NodeStore::new(1);
        let mut open = OpenList::new();
        let mut closed = FxHashMap::default();

        let initial = self.problem.initial_state();
        let h = self.problem.heuristic(&initial);
        tracing::debug!(initial_h = h as f64, "starting greedy search");
        let root = store.arena(0).push(Node::new(initial.clone(), 0.0, h, None));
        closed.insert(initial, root);
        open.push(&store, root, h, 0.0);

        let mut goal = None;
        while let Some(id) = open.pop(&store) {
            let node = store.node(id);
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
mod test_greedy {
    use crate::{Cost, Greedy, Problem, Search};

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

    #[test]
    fn it_reaches_the_goal_of_an_open_grid() {
        let problem = OpenGrid { rows: 4, cols: 4 };
        let outcome = Greedy::new(&problem, 0).run();
        assert!(outcome.found_path());
        assert_eq!((3, 3), *outcome.path.last().unwrap());
        for pair in outcome.path.windows(2) {
            assert!(problem.successors(&pair[0]).contains(&pair[1]));
        }
    }

    #[test]
    fn on_a_monotone_heuristic_it_marches_straight_to_the_goal() {
        // with the Manhattan heuristic, greedy never backs away from the
        // goal corner, so it expands exactly one node per path step
        let problem = OpenGrid { rows: 3, cols: 3 };
        let outcome = Greedy::new(&problem, 0).run();
        assert_eq!(Some(4.0), outcome.stats.path_length);
        assert_eq!(4, outcome.stats.expanded);
    }
}
