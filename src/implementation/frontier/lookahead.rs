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

//! This module provides the lookahead window of the speculative engine: a
//! bounded view over the most recent frontier pushes. A naive shared queue
//! would force readers and the writer to lock on every access; instead every
//! push publishes a fresh immutable version, and a worker that grabbed a
//! snapshot can re-read its slot on every iteration without any further
//! synchronisation. Holding on to an old snapshot is harmless: it only
//! references nodes in append-only arenas, which never die during a search.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::NodeId;

/// One immutable version of the window. Slot 0 is the oldest of the retained
/// pushes, the last slot is the most recent one.
#[derive(Debug, Clone)]
pub struct Window {
    items: Vec<NodeId>,
    next: usize,
    capacity: usize,
}

impl Window {
    fn new(capacity: usize) -> Self {
        Window {
            items: Vec::with_capacity(capacity),
            next: 0,
            capacity,
        }
    }

    /// Number of retained pushes (at most the capacity).
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns true iff nothing was pushed yet.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// The element at `index` (0-based, oldest first), or nothing when fewer
    /// than `index + 1` pushes are retained.
    pub fn get(&self, index: usize) -> Option<NodeId> {
        if index >= self.items.len() {
            None
        } else if self.items.len() < self.capacity {
            Some(self.items[index])
        } else {
            Some(self.items[(self.next + index) % self.capacity])
        }
    }

    /// The most recently pushed element, if any.
    pub fn top(&self) -> Option<NodeId> {
        match self.items.len() {
            0 => None,
            len if len < self.capacity => Some(self.items[len - 1]),
            _ => Some(self.items[(self.next + self.capacity - 1) % self.capacity]),
        }
    }
}

/// The shared window. The writer (the coordinator, pushing under the same
/// critical section as the matching frontier push) swaps in a new version;
/// readers clone the current `Arc` and work on that stable snapshot.
pub struct Lookahead {
    current: Mutex<Arc<Window>>,
    capacity: usize,
}

impl Lookahead {
    /// Creates a window retaining the `capacity` most recent pushes. With a
    /// capacity of zero (no speculating worker), pushes are no-ops.
    pub fn new(capacity: usize) -> Self {
        Lookahead {
            current: Mutex::new(Arc::new(Window::new(capacity))),
            capacity,
        }
    }

    /// The number of slots of this window.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Publishes a new version exposing `id` as the newest element, aging the
    /// oldest one out when the window is full.
    pub fn push(&self, id: NodeId) {
        if self.capacity == 0 {
            return;
        }
        let mut current = self.current.lock();
        let mut version = (**current).clone();
        if version.items.len() < version.capacity {
            version.items.push(id);
        } else {
            version.items[version.next] = id;
        }
        version.next = (version.next + 1) % version.capacity;
        *current = Arc::new(version);
    }

    /// The current version. The snapshot stays coherent (and safe to read)
    /// no matter how many pushes happen after it was taken.
    pub fn snapshot(&self) -> Arc<Window> {
        self.current.lock().clone()
    }
}
