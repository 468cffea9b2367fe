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

//! This module provides the append-only storage of all search nodes. The
//! search graph is cyclic when looked at through parent and successor links,
//! so no node owns any other: the arena is the sole lifetime authority, every
//! inter-node reference is a `NodeId`, and everything is released together
//! when the search ends.
//!
//! Nodes never move. Storage grows by whole segments of doubling size, and a
//! slot is published through a `OnceLock` before the length advances, so a
//! reader that sees an index below the (acquire-loaded) length always finds
//! an initialized node, without taking any lock.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::OnceLock;

use crate::{Node, NodeId};

/// Capacity of the first segment; segment `k` holds `SEGMENT_BASE << k`
/// nodes.
const SEGMENT_BASE: usize = 1 << 10;
/// Number of segment slots. Together with the doubling growth this caps an
/// arena at `SEGMENT_BASE * (2^34 - 1)` nodes, far beyond anything a search
/// can allocate.
const NB_SEGMENTS: usize = 34;

/// One append-only node arena. An arena has exactly one writing thread at any
/// point in time (which thread that is may be negotiated externally, e.g.
/// under the node lock of the shared-pool engine); any number of threads may
/// read concurrently.
pub struct Arena<S> {
    id: usize,
    len: AtomicUsize,
    segments: Box<[OnceLock<Box<[OnceLock<Node<S>>]>>]>,
}

impl<S> Arena<S> {
    /// Creates the empty arena identified by `id` in the node ids it hands
    /// out.
    pub fn new(id: usize) -> Self {
        Arena {
            id,
            len: AtomicUsize::new(0),
            segments: (0..NB_SEGMENTS).map(|_| OnceLock::new()).collect(),
        }
    }

    /// The identifier baked into every `NodeId` this arena hands out.
    pub fn id(&self) -> usize {
        self.id
    }

    /// The number of nodes appended so far.
    pub fn len(&self) -> usize {
        self.len.load(Ordering::Acquire)
    }

    /// Returns true iff no node was appended yet.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Appends a node and returns its stable id. This is the single-writer
    /// operation: concurrent pushes on the *same* arena are a contract
    /// violation (they cannot corrupt memory, the slot is a `OnceLock`, but
    /// nodes may be lost).
    pub fn push(&self, node: Node<S>) -> NodeId {
        let index = self.len.load(Ordering::Relaxed);
        let (segment, offset) = Self::locate(index);
        let slots = self.segments[segment].get_or_init(|| {
            (0..Self::segment_capacity(segment))
                .map(|_| OnceLock::new())
                .collect()
        });
        let vacant = slots[offset].set(node).is_ok();
        debug_assert!(vacant, "two concurrent writers on one arena");
        self.len.store(index + 1, Ordering::Release);
        NodeId::new(self.id, index)
    }

    /// Returns the node at `index`. The index must come from a `NodeId`
    /// previously handed out by this arena.
    pub fn get(&self, index: usize) -> &Node<S> {
        debug_assert!(index < self.len());
        let (segment, offset) = Self::locate(index);
        self.segments[segment].get().unwrap()[offset].get().unwrap()
    }

    /// Maps a node index onto its (segment, offset) coordinates.
    fn locate(index: usize) -> (usize, usize) {
        let block = index / SEGMENT_BASE + 1;
        let segment = (usize::BITS - 1 - block.leading_zeros()) as usize;
        let start = SEGMENT_BASE * ((1 << segment) - 1);
        (segment, index - start)
    }

    fn segment_capacity(segment: usize) -> usize {
        SEGMENT_BASE << segment
    }
}

/// The set of arenas of one search: one per writing thread. Arena 0 belongs
/// to the main (or coordinator) thread; the speculative engine adds one
/// private arena per worker so that no two threads ever allocate into the
/// same one. Ids are valid across arenas because arenas never relocate.
pub struct NodeStore<S> {
    arenas: Box<[Arena<S>]>,
}

impl<S> NodeStore<S> {
    /// Creates a store with `nb_arenas` empty arenas.
    pub fn new(nb_arenas: usize) -> Self {
        NodeStore {
            arenas: (0..nb_arenas).map(Arena::new).collect(),
        }
    }

    /// The arena owned by writer `id`.
    pub fn arena(&self, id: usize) -> &Arena<S> {
        &self.arenas[id]
    }

    /// Resolves a node id, wherever the node was allocated.
    pub fn node(&self, id: NodeId) -> &Node<S> {
        self.arenas[id.arena()].get(id.index())
    }

    /// Total number of nodes allocated across all arenas.
    pub fn len(&self) -> usize {
        self.arenas.iter().map(Arena::len).sum()
    }

    /// Returns true iff no arena holds any node.
    pub fn is_empty(&self) -> bool {
        self.arenas.iter().all(Arena::is_empty)
    }
}
