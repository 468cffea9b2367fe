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

//! This module defines the most basic data types that are used throughout all
//! the code of our library (both at the abstraction and implementation
//! levels). These are also the types your client code is likely to work with.

use std::time::Duration;

use serde_json::{json, Map, Value};

// ----------------------------------------------------------------------------
// --- COST -------------------------------------------------------------------
// ----------------------------------------------------------------------------
/// The scalar in which path costs and heuristic estimates are expressed.
/// Costs are additive and non-negative; a state whose heuristic evaluates to
/// zero *is* a goal state (the engines carry no separate goal predicate).
pub type Cost = f32;

/// The value emitted in the statistics for `Path Length` when the search
/// terminated without reaching any goal.
pub const NO_PATH: Cost = -1.0;

// ----------------------------------------------------------------------------
// --- NODE ID ----------------------------------------------------------------
// ----------------------------------------------------------------------------
/// A stable reference to one search node. Nodes live in append-only arenas
/// (one arena per writing thread) and never move, so a `NodeId` remains valid
/// for the whole duration of a search. The arena tag and the in-arena index
/// are packed together in a single word so that parent links can be stored
/// in one atomic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(u64);

const INDEX_BITS: u32 = 48;
const INDEX_MASK: u64 = (1 << INDEX_BITS) - 1;

impl NodeId {
    /// Creates the id of the `index`-th node of the given arena.
    ///
    /// # Examples:
    /// ```
    /// # use spbfs::NodeId;
    /// assert_eq!(0, NodeId::new(0, 0).index());
    /// assert_eq!(3, NodeId::new(2, 3).index());
    /// assert_eq!(2, NodeId::new(2, 3).arena());
    /// ```
    pub fn new(arena: usize, index: usize) -> Self {
        debug_assert!(index as u64 <= INDEX_MASK);
        debug_assert!(arena as u64 <= u16::MAX as u64);
        NodeId(((arena as u64) << INDEX_BITS) | index as u64)
    }
    /// The arena owning the referenced node.
    pub fn arena(self) -> usize {
        (self.0 >> INDEX_BITS) as usize
    }
    /// The position of the referenced node within its arena.
    pub fn index(self) -> usize {
        (self.0 & INDEX_MASK) as usize
    }
    /// The raw packed representation (used to store ids in atomics).
    pub(crate) fn to_bits(self) -> u64 {
        self.0
    }
    /// Rebuilds an id from its packed representation.
    pub(crate) fn from_bits(bits: u64) -> Self {
        NodeId(bits)
    }
}

// ----------------------------------------------------------------------------
// --- STATISTICS -------------------------------------------------------------
// ----------------------------------------------------------------------------
/// The counters accumulated by every engine over the course of one search.
///
/// `expanded` counts pop events that led to an expansion, `generated` counts
/// distinct state visits (an equal-or-worse duplicate cancels the count it
/// had provisionally taken), and `duplicated` counts the in-place updates
/// triggered by strictly better duplicates.
#[derive(Debug, Clone)]
pub struct SearchStats {
    /// Display name of the engine that produced these statistics.
    pub algorithm: &'static str,
    /// Number of worker threads (1 for the sequential engines).
    pub threads: usize,
    /// Synthetic work units burned on every expansion.
    pub extra_expansion_time: usize,
    /// Number of nodes expanded.
    pub expanded: usize,
    /// Number of distinct nodes generated.
    pub generated: usize,
    /// Number of better duplicates folded into their canonical node.
    pub duplicated: usize,
    /// Cost of the goal node, if one was reached.
    pub path_length: Option<Cost>,
    /// Wall-clock duration of the search.
    pub elapsed: Duration,
    /// Speculation counters; only the CAFE engine fills these in.
    pub speculation: Option<SpeculationStats>,
}

/// The counters that are specific to speculative (ahead-of-frontier)
/// expansion.
#[derive(Debug, Clone, Copy, Default)]
pub struct SpeculationStats {
    /// Expansions the coordinator had to perform itself because no worker
    /// had claimed the popped node yet.
    pub manual_expanded: usize,
    /// Expansions performed by workers ahead of the frontier (useful or not).
    pub speculated: usize,
}

impl SearchStats {
    /// Creates a zeroed set of counters for the named engine.
    pub fn new(algorithm: &'static str, threads: usize, extra_expansion_time: usize) -> Self {
        SearchStats {
            algorithm,
            threads,
            extra_expansion_time,
            expanded: 0,
            generated: 0,
            duplicated: 0,
            path_length: None,
            elapsed: Duration::ZERO,
            speculation: None,
        }
    }

    /// Renders the statistics as the JSON object printed on standard output
    /// at the end of every run.
    pub fn to_json(&self) -> Value {
        let mut object = Map::new();
        object.insert("Algorithm".to_string(), json!(self.algorithm));
        object.insert("Threads".to_string(), json!(self.threads));
        object.insert(
            "Extra Expansion Time".to_string(),
            json!(self.extra_expansion_time),
        );
        object.insert("Expanded Nodes".to_string(), json!(self.expanded));
        object.insert("Generated Nodes".to_string(), json!(self.generated));
        object.insert("Duplicated Nodes".to_string(), json!(self.duplicated));
        object.insert(
            "Path Length".to_string(),
            json!(self.path_length.unwrap_or(NO_PATH)),
        );
        object.insert(
            "Elapsed Time".to_string(),
            json!(self.elapsed.as_secs_f64()),
        );
        if let Some(speculation) = &self.speculation {
            object.insert(
                "Manual Expanded Nodes".to_string(),
                json!(speculation.manual_expanded),
            );
            object.insert(
                "Speculated Nodes".to_string(),
                json!(speculation.speculated),
            );
        }
        Value::Object(object)
    }
}

// ----------------------------------------------------------------------------
// --- OUTCOME ----------------------------------------------------------------
// ----------------------------------------------------------------------------
/// What a finished search hands back: the reconstructed path (empty when no
/// goal is reachable) together with the statistics of the run.
#[derive(Debug, Clone)]
pub struct SearchOutcome<S> {
    /// The ordered sequence of states from the initial state to a goal.
    pub path: Vec<S>,
    /// The counters and timings of the run.
    pub stats: SearchStats,
}

impl<S> SearchOutcome<S> {
    /// Returns true iff the search reached a goal state.
    pub fn found_path(&self) -> bool {
        !self.path.is_empty()
    }
}

#[cfg(test)]
mod test_node_id {
    use crate::NodeId;

    #[test]
    fn the_packed_representation_round_trips() {
        let id = NodeId::new(7, 123_456);
        assert_eq!(id, NodeId::from_bits(id.to_bits()));
        assert_eq!(7, id.arena());
        assert_eq!(123_456, id.index());
    }

    #[test]
    fn arena_zero_index_zero_is_a_valid_id() {
        let id = NodeId::new(0, 0);
        assert_eq!(0, id.arena());
        assert_eq!(0, id.index());
    }
}
