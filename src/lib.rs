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

//! # SPBFS
//! SPBFS is a library of heuristic best-first search engines finding
//! least-cost paths in implicit state spaces. You describe your state space
//! once, by implementing the [`Problem`] trait, and you get five engines for
//! free that only differ in how node expansion is orchestrated:
//!
//! * [`AStar`] is the serial baseline;
//! * [`Greedy`] is serial too, ordered on the heuristic alone (fast, not optimal);
//! * [`Kbfs`] does bulk-synchronous parallel expansion of the best k open nodes;
//! * [`SpaStar`] runs lock-coordinated parallel A* over one shared frontier;
//! * [`Cafe`] has a coordinator consuming the frontier while workers
//!   speculatively pre-expand the nodes it is about to pop.
//!
//! All engines share one data model: an append-only node graph, a closed
//! table holding the canonical node per visited state, and a mutable open
//! list ordered by `(f, g)` with stable decrease-key handles. A state whose
//! heuristic evaluates to zero *is* a goal; there is no separate goal
//! predicate.
//!
//! ## Quick example
//! The following searches a tiny corridor world. The state is the position
//! in the corridor, moves go one step left or right, and the distance to the
//! right end is the (admissible) heuristic.
//!
//! ```
//! use spbfs::{AStar, Cost, Problem, Search};
//!
//! struct Corridor {
//!     length: i32,
//! }
//! impl Problem for Corridor {
//!     type State = i32;
//!
//!     fn initial_state(&self) -> i32 {
//!         0
//!     }
//!     fn successors(&self, position: &i32) -> Vec<i32> {
//!         [position - 1, position + 1]
//!             .into_iter()
//!             .filter(|p| (0..=self.length).contains(p))
//!             .collect()
//!     }
//!     fn cost(&self, _: &i32, _: &i32) -> Cost {
//!         1.0
//!     }
//!     fn heuristic(&self, position: &i32) -> Cost {
//!         (self.length - position) as Cost
//!     }
//!     fn max_action_count(&self) -> usize {
//!         2
//!     }
//! }
//!
//! let problem = Corridor { length: 9 };
//! let outcome = AStar::new(&problem, 0).run();
//! assert_eq!(Some(9.0), outcome.stats.path_length);
//! assert_eq!(10, outcome.path.len());
//! ```
//!
//! Swapping the engine is a one-line change; the parallel ones take the
//! number of worker threads as an extra argument:
//!
//! ```
//! # use spbfs::{Cafe, Cost, Problem, Search};
//! # struct Corridor { length: i32 }
//! # impl Problem for Corridor {
//! #     type State = i32;
//! #     fn initial_state(&self) -> i32 { 0 }
//! #     fn successors(&self, position: &i32) -> Vec<i32> {
//! #         [position - 1, position + 1]
//! #             .into_iter()
//! #             .filter(|p| (0..=self.length).contains(p))
//! #             .collect()
//! #     }
//! #     fn cost(&self, _: &i32, _: &i32) -> Cost { 1.0 }
//! #     fn heuristic(&self, position: &i32) -> Cost { (self.length - position) as Cost }
//! #     fn max_action_count(&self) -> usize { 2 }
//! # }
//! let problem = Corridor { length: 9 };
//! let outcome = Cafe::new(&problem, 0, 4).run();
//! assert_eq!(Some(9.0), outcome.stats.path_length);
//! ```
//!
//! ## Shipped problem domains
//! The [`problems`] module carries the two domains understood by the command
//! line frontend (the 4x4 sliding-tile puzzle and grid pathfinding with
//! multi-goal pickup), which also serve as realistic `Problem`
//! implementations to crib from.

mod abstraction;
mod common;
mod implementation;
pub mod problems;

pub use abstraction::*;
pub use common::*;
pub use implementation::*;
