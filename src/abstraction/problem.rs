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

//! This module defines the contract of a problem instance. An implementation
//! of the `Problem` trait is the *only* thing a client must provide in order
//! to run any of the engines of this library on its own state space.

use crate::Cost;

/// This trait defines the "contract" of what defines a searchable problem
/// instance. The state space is implicit: it is spanned by repeatedly taking
/// the successors of the initial state. There is deliberately no separate
/// goal predicate: a state is a goal if and only if its heuristic estimate
/// is zero, which keeps one virtual call out of the hot loop of every engine.
///
/// The admissibility (and, where relevant, consistency) of the heuristic is
/// the problem's responsibility: the engines perform no validation and only
/// promise optimal paths when the estimate never overshoots.
pub trait Problem {
    /// Any type implementing `Problem` must specify the type of its states.
    /// The engines additionally require states to be `Eq + Hash + Clone` (the
    /// closed table is keyed by state), which is expressed as a bound on the
    /// engine implementations rather than here.
    type State;

    /// This method returns the state in which every search starts.
    fn initial_state(&self) -> Self::State;

    /// This method returns the ordered sequence of states reachable from
    /// `state` in one step. The sequence is finite and possibly empty; it may
    /// contain `state` itself, in which case the engines filter the self-loop
    /// out.
    fn successors(&self, state: &Self::State) -> Vec<Self::State>;

    /// This method returns the (non-negative) cost of moving from `state` to
    /// the given `successor`.
    fn cost(&self, state: &Self::State, successor: &Self::State) -> Cost;

    /// This method returns a non-negative estimate of the cost remaining from
    /// `state` to the closest goal. An estimate of zero *defines* `state` as
    /// a goal.
    fn heuristic(&self, state: &Self::State) -> Cost;

    /// This method returns a strict upper bound on the number of successors
    /// any single state can have. The bulk-synchronous engine uses it to size
    /// the successor buffers it hands out to its workers.
    fn max_action_count(&self) -> usize;
}
