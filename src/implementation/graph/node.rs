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

//! This module provides the search node and, with it, the atomic tri-state
//! protocol through which speculative expansions are published from worker
//! threads to the thread folding successors into the shared structures.
//!
//! The protocol is deliberately not a lock: claiming a node is one CAS,
//! publishing its successor list is one release store, and the only waiting
//! that ever happens is a cooperative yield-spin of the folding thread on a
//! node whose expansion is in flight.

use std::cell::UnsafeCell;
use std::sync::atomic::{AtomicU32, AtomicU64, AtomicU8, AtomicUsize, Ordering};

use crate::{Cost, NodeId};

/// The node has not been expanded yet; any thread may claim it.
const UNVISITED: u8 = 0;
/// Exactly one thread won the claim CAS and is computing the successors.
const WORKING: u8 = 1;
/// The successor list is published and readable (acquire on the status).
const DONE: u8 = 2;

/// Sentinel for "this node currently has no live frontier handle".
const NO_SLOT: usize = usize::MAX;
/// Sentinel for "this node has no parent" (the initial node).
const NO_PARENT: u64 = u64::MAX;

/// One node of the search graph.
///
/// The state and the heuristic estimate are immutable after creation. The
/// cost fields, the parent back-reference and the frontier slot are atomics
/// because duplicate resolution improves them in place while other threads
/// may be reading them; none of these fields carries a consistency
/// requirement across fields, staleness only ever produces a worse candidate
/// that duplicate resolution will fold away.
///
/// The `status`/`successors` pair is different: it is a publication protocol
/// (see the module documentation) and its ordering requirements are enforced
/// by the methods of this type.
pub struct Node<S> {
    state: S,
    h: Cost,
    g: AtomicU32,
    f: AtomicU32,
    parent: AtomicU64,
    slot: AtomicUsize,
    status: AtomicU8,
    successors: UnsafeCell<Vec<NodeId>>,
}

// SAFETY: all mutable fields are atomics except `successors`, whose accesses
// are serialized by the status protocol: only the thread whose claim CAS
// succeeded writes it (before the release store of DONE), and only the single
// folding thread of an engine reads or resets it (after an acquire load of
// DONE). See `publish` / `reset` / `wait_successors`.
unsafe impl<S: Send> Send for Node<S> {}
unsafe impl<S: Send + Sync> Sync for Node<S> {}

impl<S> Node<S> {
    /// Creates a fresh, unvisited node that is not yet in any frontier.
    pub fn new(state: S, g: Cost, h: Cost, parent: Option<NodeId>) -> Self {
        Node {
            state,
            h,
            g: AtomicU32::new(g.to_bits()),
            f: AtomicU32::new((g + h).to_bits()),
            parent: AtomicU64::new(parent.map_or(NO_PARENT, NodeId::to_bits)),
            slot: AtomicUsize::new(NO_SLOT),
            status: AtomicU8::new(UNVISITED),
            successors: UnsafeCell::new(Vec::new()),
        }
    }

    /// The problem state this node stands for.
    pub fn state(&self) -> &S {
        &self.state
    }
    /// Best known cost from the initial state to this node's state.
    pub fn g(&self) -> Cost {
        Cost::from_bits(self.g.load(Ordering::Relaxed))
    }
    /// Cached heuristic estimate of this node's state.
    pub fn h(&self) -> Cost {
        self.h
    }
    /// `g + h`, kept in sync with `g` by every update.
    pub fn f(&self) -> Cost {
        Cost::from_bits(self.f.load(Ordering::Relaxed))
    }
    /// The node this node was (best) reached from, if any.
    pub fn parent(&self) -> Option<NodeId> {
        let bits = self.parent.load(Ordering::Relaxed);
        (bits != NO_PARENT).then(|| NodeId::from_bits(bits))
    }

    /// Folds a strictly better duplicate into this node: adopt its cost and
    /// its predecessor. The caller is responsible for the matching
    /// decrease-key on the frontier handle (and, for speculative engines,
    /// for `reset`).
    pub fn improve(&self, g: Cost, f: Cost, parent: Option<NodeId>) {
        debug_assert!(f == g + self.h);
        self.g.store(g.to_bits(), Ordering::Relaxed);
        self.f.store(f.to_bits(), Ordering::Relaxed);
        self.parent
            .store(parent.map_or(NO_PARENT, NodeId::to_bits), Ordering::Relaxed);
    }

    /// Records the frontier slot currently holding this node.
    pub fn set_slot(&self, slot: usize) {
        self.slot.store(slot, Ordering::Relaxed);
    }
    /// Invalidates the frontier handle (the node left the frontier).
    pub fn clear_slot(&self) {
        self.slot.store(NO_SLOT, Ordering::Relaxed);
    }
    /// The frontier slot currently holding this node, if it is in a frontier.
    pub fn slot(&self) -> Option<usize> {
        let slot = self.slot.load(Ordering::Relaxed);
        (slot != NO_SLOT).then_some(slot)
    }
    /// Returns true iff this node currently has a live frontier handle.
    pub fn in_open(&self) -> bool {
        self.slot.load(Ordering::Relaxed) != NO_SLOT
    }

    /// Attempts the `Unvisited -> Working` transition. The winning thread
    /// (and only it) must eventually call `publish`; losers must not expand.
    pub fn try_claim(&self) -> bool {
        self.status
            .compare_exchange(UNVISITED, WORKING, Ordering::Acquire, Ordering::Relaxed)
            .is_ok()
    }

    /// Publishes the successor list computed by the claiming thread and
    /// performs the `Working -> Done` transition.
    pub fn publish(&self, successors: Vec<NodeId>) {
        debug_assert_eq!(WORKING, self.status.load(Ordering::Relaxed));
        // SAFETY: this thread won the claim CAS, so it has exclusive write
        // access to the cell until the release store below makes it readable.
        unsafe {
            *self.successors.get() = successors;
        }
        self.status.store(DONE, Ordering::Release);
    }

    /// Returns true iff a successor list has been published and is readable.
    pub fn is_done(&self) -> bool {
        self.status.load(Ordering::Acquire) == DONE
    }

    /// Reads the published successor list. Must only be called by the folding
    /// thread after `is_done` returned true.
    pub fn successors(&self) -> Vec<NodeId> {
        debug_assert_eq!(DONE, self.status.load(Ordering::Relaxed));
        // SAFETY: DONE was observed with acquire ordering, hence the claim
        // winner's write happened-before this read; no writer can run again
        // before the folding thread (us) resets the status.
        unsafe { (*self.successors.get()).clone() }
    }

    /// Yield-spins until the in-flight expansion of this node is published,
    /// then reads it. Must only be called by the folding thread.
    pub fn wait_successors(&self) -> Vec<NodeId> {
        while self.status.load(Ordering::Acquire) != DONE {
            std::thread::yield_now();
        }
        // SAFETY: same as `successors`.
        unsafe { (*self.successors.get()).clone() }
    }

    /// Reverts this node to `Unvisited` after a duplicate replacement so that
    /// its next expansion runs against the improved cost. Must only be called
    /// by the folding thread, after the cost fields were updated.
    ///
    /// A concurrent claimant read the cost *before* the improvement, so its
    /// publication is stale: we wait for it and drop it. When nobody claimed
    /// the node, the no-op CAS re-publishes `Unvisited` with release
    /// semantics so that the next claimant acquires the new cost fields.
    pub fn reset(&self) {
        loop {
            match self.status.load(Ordering::Acquire) {
                UNVISITED => {
                    if self
                        .status
                        .compare_exchange(UNVISITED, UNVISITED, Ordering::Release, Ordering::Relaxed)
                        .is_ok()
                    {
                        return;
                    }
                }
                WORKING => std::thread::yield_now(),
                _ => {
                    // SAFETY: status is DONE, so no claimant exists (a claim
                    // needs UNVISITED) and the folding thread (us) is the only
                    // reader; the cell is exclusively ours until the release
                    // store re-opens the node.
                    unsafe {
                        (*self.successors.get()).clear();
                    }
                    self.status.store(UNVISITED, Ordering::Release);
                    return;
                }
            }
        }
    }
}
