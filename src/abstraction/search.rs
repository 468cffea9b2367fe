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

//! This module abstracts away the difference between the concrete engines.
//! Whichever orchestration strategy is used (serial, bulk-synchronous,
//! shared-pool or speculative), running a search always means the same thing:
//! consume a problem instance, produce a path and statistics.

use crate::SearchOutcome;

/// The common interface of every search engine shipped by this library.
/// An engine is created around a borrowed problem instance and is consumed
/// by a single call to `run`.
pub trait Search {
    /// The type of the states traversed by this engine.
    type State;

    /// Runs the search to completion and returns the reconstructed path
    /// (empty when no goal is reachable) along with the run statistics.
    /// There is no notion of timeout: the search runs until the frontier is
    /// exhausted or a goal is popped.
    fn run(&mut self) -> SearchOutcome<Self::State>;
}
