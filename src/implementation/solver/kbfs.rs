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

//! This module provides the K-best-first engine: a bulk-synchronous parallel
//! variant of A*. Each round pops the best k open nodes, hands one to each
//! worker of a fixed pool, waits for all of them (the barrier), then folds
//! every produced successor serially. Workers only ever read the node graph
//! and write into the buffer they were handed; the closed table and the
//! frontier are touched by the main thread alone, so the barrier is the only
//! synchronisation the round needs.
//!
//! KBFS is best-effort: when a goal is popped within a batch it is returned
//! immediately, even though a node popped later in the same batch could
//! theoretically lead to a better goal. Use A*, SPA* or CAFE when strict
//! optimality is required.

use std::collections::hash_map::Entry;
use std::hash::Hash;
use std::time::Instant;

use crossbeam::channel;
use fxhash::FxHashMap;

use super::{conclude, waste_time};
use crate::{Cost, Node, NodeId, NodeStore, OpenList, Problem, Search, SearchOutcome, SearchStats};

/// A successor computed by a pool worker, waiting to be folded into the
/// shared structures by the main thread. Only the main thread turns seeds
/// into actual arena nodes.
struct Seed<S> {
    state: S,
    g: Cost,
    h: Cost,
}

/// A unit of work handed to the pool: expand the node popped into the given
/// batch slot.
struct ExpandTask {
    slot: usize,
    node: NodeId,
}

/// The bulk-synchronous K-best-first engine.
pub struct Kbfs<'a, P: Problem> {
    problem: &'a P,
    extra_expansion_time: usize,
    threads: usize,
}

impl<'a, P: Problem> Kbfs<'a, P> {
    /// Creates a KBFS engine popping (and expanding) up to `threads` nodes
    /// per round through a pool of as many workers.
    pub fn new(problem: &'a P, extra_expansion_time: usize, threads: usize) -> Self {
        Kbfs {
            problem,
            extra_expansion_time,
            threads: threads.max(1),
        }
    }
}

impl<P: Problem> Kbfs<'_, P>
where
    P::State: Eq + Hash + Clone,
{
    /// The same duplicate resolution as the serial engine, applied by the
    /// main thread to one worker-produced seed.
    fn fold(
        &self,
        store: &NodeStore<P::State>,
        open: &mut OpenList,
        closed: &mut FxHashMap<P::State, NodeId>,
        stats: &mut SearchStats,
        parent: NodeId,
        seed: Seed<P::State>,
    ) {
        let Seed { state, g, h } = seed;
        let child = store.arena(0).push(Node::new(state.clone(), g, h, Some(parent)));
        stats.generated += 1;
        match closed.entry(state) {
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
                    canonical.improve(g, g + h, Some(parent));
                    if canonical.in_open() {
                        open.update(store, *entry.get(), g + h, g);
                    }
                }
            }
        }
    }
}

impl<P: Problem + Sync> Search for Kbfs<'_, P>
where
    P::State: Eq + Hash + Clone + Send + Sync,
{
    type State = P::State;

    fn run(&mut self) -> SearchOutcome<P::State> {
        let clock = Instant::now();
        let mut stats = SearchStats::new("KBFS", self.threads, self.extra_expansion_time);

        let store = NodeStore::new(1);
        let mut open = OpenList::new();
        let mut closed = FxHashMap::default();

        let initial = self.problem.initial_state();
        let h = self.problem.heuristic(&initial);
        tracing::debug!(initial_h = h as f64, k = self.threads, "starting KBFS search");
        let root = store.arena(0).push(Node::new(initial.clone(), 0.0, h, None));
        closed.insert(initial, root);
        open.push(&store, root, h, 0.0);

        let (task_tx, task_rx) = channel::unbounded::<ExpandTask>();
        let (seed_tx, seed_rx) = channel::unbounded::<(usize, Vec<Seed<P::State>>)>();

        let mut goal = None;
        std::thread::scope(|scope| {
            for _ in 0..self.threads {
                let task_rx = task_rx.clone();
                let seed_tx = seed_tx.clone();
                let store = &store;
                let problem = self.problem;
                let extra_expansion_time = self.extra_expansion_time;
                scope.spawn(move || {
                    while let Ok(task) = task_rx.recv() {
                        let parent = store.node(task.node);
                        let mut seeds = Vec::with_capacity(problem.max_action_count());
                        for successor in problem.successors(parent.state()) {
                            if successor == *parent.state() {
                                continue;
                            }
                            let g = parent.g() + problem.cost(parent.state(), &successor);
                            let h = problem.heuristic(&successor);
                            seeds.push(Seed {
                                state: successor,
                                g,
                                h,
                            });
                        }
                        waste_time(extra_expansion_time);
                        if seed_tx.send((task.slot, seeds)).is_err() {
                            break;
                        }
                    }
                });
            }

            'rounds: while !open.is_empty() {
                // pop this round's batch, watching out for goals on the way
                let mut batch = Vec::with_capacity(self.threads);
                for _ in 0..self.threads {
                    let Some(id) = open.pop(&store) else { break };
                    if store.node(id).h() == 0.0 {
                        goal = Some(id);
                        break 'rounds;
                    }
                    batch.push(id);
                }

                // dispatch one task per batch member, then barrier on the
                // results
                for (slot, id) in batch.iter().enumerate() {
                    let task = ExpandTask { slot, node: *id };
                    task_tx.send(task).expect("expansion pool disconnected");
                }
                let mut buffers: Vec<Vec<Seed<P::State>>> =
                    batch.iter().map(|_| Vec::new()).collect();
                for _ in 0..batch.len() {
                    let (slot, seeds) = seed_rx.recv().expect("expansion pool disconnected");
                    buffers[slot] = seeds;
                }

                // serial fold: only the main thread touches closed and open
                for (slot, id) in batch.iter().enumerate() {
                    stats.expanded += 1;
                    for seed in buffers[slot].drain(..) {
                        self.fold(&store, &mut open, &mut closed, &mut stats, *id, seed);
                    }
                }
            }
            drop(task_tx);
        });

        conclude(&store, goal, stats, clock)
    }
}
