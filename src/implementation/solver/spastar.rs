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

//! This module provides the shared-pool parallel A* engine: every worker
//! pops from the one shared frontier, expands under fine-grained locks and
//! pushes the resulting successors right back. Lock acquisition is always
//! bottom-up in the order nodes -> closed -> frontier, which rules out
//! deadlocks between expanding workers.
//!
//! Distinguishing "the frontier is momentarily empty" from "the search space
//! is exhausted" needs one extra piece of state: the number of expansions
//! currently in flight. A starving worker parks on a monitor until a
//! finishing expansion wakes it; when the frontier is empty and nothing is
//! ongoing anymore, the search is complete.

use std::collections::hash_map::Entry;
use std::hash::Hash;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Instant;

use fxhash::FxHashMap;
use ordered_float::OrderedFloat;
use parking_lot::{Condvar, Mutex};

use super::{conclude, waste_time};
use crate::{Node, NodeId, NodeStore, OpenList, Problem, Search, SearchOutcome, SearchStats};

/// The shared data that may only be manipulated within critical sections.
struct Critical {
    /// The one frontier every worker pops from and pushes to.
    open: OpenList,
    /// The number of expansions currently in flight. This is what lets a
    /// worker distinguish starvation (someone may still push new nodes) from
    /// completion (nobody will).
    ongoing: usize,
}

/// The workload a worker can get from the shared state.
enum WorkLoad {
    /// There is no work left to be done: the search space is exhausted.
    Complete,
    /// Nothing to pop right now, but expansions are ongoing; check again.
    Starvation,
    /// The node to process.
    WorkItem(NodeId),
}

/// Counters a worker accumulates privately and flushes once, when it exits.
#[derive(Default)]
struct LocalCounters {
    expanded: usize,
    generated: usize,
    duplicated: usize,
}

/// The state shared among the running workers.
struct Shared<'a, P: Problem> {
    problem: &'a P,
    extra_expansion_time: usize,
    /// All nodes of the search. The single shared arena has one writer *at a
    /// time*: appends happen under the `nodes` lock.
    store: NodeStore<P::State>,
    /// Serialises appends to the shared arena (first lock of the order).
    nodes: Mutex<()>,
    /// The closed table: state -> canonical node (second lock of the order).
    closed: Mutex<FxHashMap<P::State, NodeId>>,
    /// Frontier + ongoing counter (third lock of the order).
    critical: Mutex<Critical>,
    /// Starving workers park here; every finished expansion wakes them.
    monitor: Condvar,
    /// Cooperative stop, polled at loop heads.
    stop: AtomicBool,
    /// Number of workers that left their search loop.
    completed: AtomicUsize,
    /// The goal nodes popped by workers. The main thread picks the winner.
    finishes: Mutex<Vec<NodeId>>,
    expanded: AtomicUsize,
    generated: AtomicUsize,
    duplicated: AtomicUsize,
}

/// The shared-pool parallel A* engine.
pub struct SpaStar<'a, P: Problem> {
    problem: &'a P,
    extra_expansion_time: usize,
    threads: usize,
}

impl<'a, P: Problem> SpaStar<'a, P> {
    /// Creates a shared-pool engine with `threads` workers.
    pub fn new(problem: &'a P, extra_expansion_time: usize, threads: usize) -> Self {
        SpaStar {
            problem,
            extra_expansion_time,
            threads: threads.max(1),
        }
    }
}

impl<P: Problem + Sync> SpaStar<'_, P>
where
    P::State: Eq + Hash + Clone + Send + Sync,
{
    /// Consults the shared state to fetch a workload: the best open node, or
    /// the reason there is none.
    fn get_workload(shared: &Shared<P>) -> WorkLoad {
        let mut critical = shared.critical.lock();
        if critical.open.is_empty() {
            if critical.ongoing == 0 {
                return WorkLoad::Complete;
            }
            shared.monitor.wait(&mut critical);
            return WorkLoad::Starvation;
        }
        let id = critical.open.pop(&shared.store).unwrap();
        critical.ongoing += 1;
        WorkLoad::WorkItem(id)
    }

    /// Acknowledges that a worker finished processing its node and wakes the
    /// parked ones.
    fn notify_node_finished(shared: &Shared<P>) {
        {
            let mut critical = shared.critical.lock();
            critical.ongoing -= 1;
        }
        shared.monitor.notify_all();
    }

    /// Expands one node. Children are appended under the nodes lock, checked
    /// against the closed table under the closed lock and pushed (or
    /// re-keyed) under the frontier lock, strictly in that order.
    fn expand(shared: &Shared<P>, local: &mut LocalCounters, id: NodeId) {
        let problem = shared.problem;
        let node = shared.store.node(id);
        let state = node.state();
        let g = node.g();
        for successor in problem.successors(state) {
            if successor == *state {
                continue;
            }
            let g2 = g + problem.cost(state, &successor);
            let h2 = problem.heuristic(&successor);
            let child = {
                let _nodes = shared.nodes.lock();
                shared
                    .store
                    .arena(0)
                    .push(Node::new(successor.clone(), g2, h2, Some(id)))
            };
            local.generated += 1;
            let mut closed = shared.closed.lock();
            match closed.entry(successor) {
                Entry::Vacant(entry) => {
                    entry.insert(child);
                    let mut critical = shared.critical.lock();
                    critical.open.push(&shared.store, child, g2 + h2, g2);
                }
                Entry::Occupied(entry) => {
                    let canonical_id = *entry.get();
                    let canonical = shared.store.node(canonical_id);
                    if canonical.f() <= g2 + h2 {
                        local.generated -= 1;
                    } else {
                        local.duplicated += 1;
                        canonical.improve(g2, g2 + h2, Some(id));
                        let mut critical = shared.critical.lock();
                        if canonical.in_open() {
                            critical.open.update(&shared.store, canonical_id, g2 + h2, g2);
                        }
                    }
                }
            }
        }
        waste_time(shared.extra_expansion_time);
    }

    /// The long-running loop of one worker thread.
    fn worker(shared: &Shared<P>) {
        let mut local = LocalCounters::default();
        loop {
            if shared.stop.load(Ordering::Relaxed) {
                break;
            }
            match Self::get_workload(shared) {
                WorkLoad::Complete => break,
                WorkLoad::Starvation => continue,
                WorkLoad::WorkItem(id) => {
                    if shared.store.node(id).h() == 0.0 {
                        // record the finish slot and bow out; the others are
                        // not stopped yet, one of them may still pop a
                        // better goal before the stop request lands
                        shared.finishes.lock().push(id);
                        Self::notify_node_finished(shared);
                        break;
                    }
                    local.expanded += 1;
                    Self::expand(shared, &mut local, id);
                    Self::notify_node_finished(shared);
                }
            }
        }
        shared.expanded.fetch_add(local.expanded, Ordering::Relaxed);
        shared.generated.fetch_add(local.generated, Ordering::Relaxed);
        shared
            .duplicated
            .fetch_add(local.duplicated, Ordering::Relaxed);
        shared.completed.fetch_add(1, Ordering::Release);
    }
}

impl<P: Problem + Sync> Search for SpaStar<'_, P>
where
    P::State: Eq + Hash + Clone + Send + Sync,
{
    type State = P::State;

    fn run(&mut self) -> SearchOutcome<P::State> {
        let clock = Instant::now();
        let mut stats = SearchStats::new("SPA*", self.threads, self.extra_expansion_time);

        let shared = Shared {
            problem: self.problem,
            extra_expansion_time: self.extra_expansion_time,
            store: NodeStore::new(1),
            nodes: Mutex::new(()),
            closed: Mutex::new(FxHashMap::default()),
            critical: Mutex::new(Critical {
                open: OpenList::new(),
                ongoing: 0,
            }),
            monitor: Condvar::new(),
            stop: AtomicBool::new(false),
            completed: AtomicUsize::new(0),
            finishes: Mutex::new(Vec::new()),
            expanded: AtomicUsize::new(0),
            generated: AtomicUsize::new(0),
            duplicated: AtomicUsize::new(0),
        };

        let initial = self.problem.initial_state();
        let h = self.problem.heuristic(&initial);
        tracing::debug!(initial_h = h as f64, threads = self.threads, "starting SPA* search");
        let root = shared
            .store
            .arena(0)
            .push(Node::new(initial.clone(), 0.0, h, None));
        shared.closed.lock().insert(initial, root);
        shared
            .critical
            .lock()
            .open
            .push(&shared.store, root, h, 0.0);

        std::thread::scope(|scope| {
            for _ in 0..self.threads {
                let shared = &shared;
                scope.spawn(move || Self::worker(shared));
            }
            // block until at least one worker reported in, then ask the rest
            // to stop and wake whoever is parked on the monitor
            while shared.completed.load(Ordering::Acquire) == 0 {
                std::thread::yield_now();
            }
            shared.stop.store(true, Ordering::Relaxed);
            shared.monitor.notify_all();
        });

        stats.expanded = shared.expanded.load(Ordering::Relaxed);
        stats.generated = shared.generated.load(Ordering::Relaxed);
        stats.duplicated = shared.duplicated.load(Ordering::Relaxed);

        // two workers may have popped two goals concurrently before either
        // observed the stop; only the smallest (f, g) one is provably optimal
        let goal = {
            let finishes = shared.finishes.lock();
            finishes.iter().copied().min_by_key(|id| {
                let node = shared.store.node(*id);
                (OrderedFloat(node.f()), OrderedFloat(node.g()))
            })
        };
        conclude(&shared.store, goal, stats, clock)
    }
}
