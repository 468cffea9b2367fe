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

//! This module provides the mutable priority queue holding the open nodes of
//! a search. Duplicate resolution updates the priority of arbitrary interior
//! nodes, so the queue must offer decrease-key through handles that stay
//! valid across unrelated pushes and pops. The handle *is* the node: every
//! node records the slot it currently occupies, and the heap maintains that
//! record on every swap. Implementations whose handles are iterators
//! invalidated by sibling operations would not fit here.

use ordered_float::OrderedFloat;

use crate::{Cost, NodeId, NodeStore};

/// One heap cell. The ordering keys are kept inline so that comparisons
/// never chase a node reference (and never observe a concurrent in-place
/// cost improvement halfway through a sift).
#[derive(Debug, Clone, Copy)]
struct Entry {
    primary: OrderedFloat<Cost>,
    secondary: OrderedFloat<Cost>,
    id: NodeId,
}

impl Entry {
    /// The frontier order: smallest primary key first, ties broken by the
    /// *largest* secondary key (the deeper node when the keys are `(f, g)`).
    fn beats(&self, other: &Entry) -> bool {
        self.primary < other.primary
            || (self.primary == other.primary && self.secondary > other.secondary)
    }
}

/// A d-ary min-heap over node ids with stable handles. `D` is the arity;
/// the engines use the binary variant, wider arities trade deeper sifts for
/// cheaper decrease-keys.
pub struct DaryHeap<const D: usize> {
    entries: Vec<Entry>,
}

/// The frontier type used by every engine.
pub type OpenList = DaryHeap<2>;

impl<const D: usize> Default for DaryHeap<D> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const D: usize> DaryHeap<D> {
    /// Creates an empty heap.
    pub fn new() -> Self {
        debug_assert!(D >= 2);
        DaryHeap {
            entries: Vec::new(),
        }
    }

    /// Number of nodes currently in the heap.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true iff the heap holds no node.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The id of the node that would be popped next, if any.
    pub fn peek(&self) -> Option<NodeId> {
        self.entries.first().map(|entry| entry.id)
    }

    /// Inserts a node under the `(primary, secondary)` keys and installs its
    /// handle.
    pub fn push<S>(&mut self, store: &NodeStore<S>, id: NodeId, primary: Cost, secondary: Cost) {
        let slot = self.entries.len();
        self.entries.push(Entry {
            primary: OrderedFloat(primary),
            secondary: OrderedFloat(secondary),
            id,
        });
        store.node(id).set_slot(slot);
        self.sift_up(store, slot);
    }

    /// Removes and returns the best node; its handle dies with the pop.
    pub fn pop<S>(&mut self, store: &NodeStore<S>) -> Option<NodeId> {
        if self.entries.is_empty() {
            return None;
        }
        let top = self.entries.swap_remove(0);
        store.node(top.id).clear_slot();
        if !self.entries.is_empty() {
            store.node(self.entries[0].id).set_slot(0);
            self.sift_down(store, 0);
        }
        Some(top.id)
    }

    /// Re-keys the given node in place (decrease-key). The node must have a
    /// live handle.
    pub fn update<S>(&mut self, store: &NodeStore<S>, id: NodeId, primary: Cost, secondary: Cost) {
        let slot = store.node(id).slot();
        debug_assert!(slot.is_some(), "update through a dead frontier handle");
        let Some(slot) = slot else { return };
        debug_assert_eq!(id, self.entries[slot].id, "stale frontier handle");
        self.entries[slot].primary = OrderedFloat(primary);
        self.entries[slot].secondary = OrderedFloat(secondary);
        let slot = self.sift_up(store, slot);
        self.sift_down(store, slot);
    }

    fn swap<S>(&mut self, store: &NodeStore<S>, a: usize, b: usize) {
        self.entries.swap(a, b);
        store.node(self.entries[a].id).set_slot(a);
        store.node(self.entries[b].id).set_slot(b);
    }

    fn sift_up<S>(&mut self, store: &NodeStore<S>, mut slot: usize) -> usize {
        while slot > 0 {
            let up = (slot - 1) / D;
            if self.entries[slot].beats(&self.entries[up]) {
                self.swap(store, slot, up);
                slot = up;
            } else {
                break;
            }
        }
        slot
    }

    fn sift_down<S>(&mut self, store: &NodeStore<S>, mut slot: usize) {
        loop {
            let first = slot * D + 1;
            if first >= self.entries.len() {
                break;
            }
            let last = (first + D).min(self.entries.len());
            let mut best = first;
            for child in first + 1..last {
                if self.entries[child].beats(&self.entries[best]) {
                    best = child;
                }
            }
            if self.entries[best].beats(&self.entries[slot]) {
                self.swap(store, slot, best);
                slot = best;
            } else {
                break;
            }
        }
    }
}
