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

//! This module provides grid pathfinding with multi-goal pickup: an actor
//! moves through a 4-connected grid of free and wall cells and must step on
//! every goal cell. A state is the actor position together with the set of
//! goals not collected yet; the heuristic is the Manhattan distance to the
//! closest remaining goal (zero once every goal was picked up), which is an
//! admissible lower bound on the remaining tour.

use std::fmt;
use std::io::BufRead;
use std::num::ParseIntError;

use crate::{Cost, Problem};

/// The grid character marking a goal cell.
const GOAL: char = '*';
/// The grid character marking a wall cell.
const WALL: char = '#';
/// The grid character marking the actor's starting cell.
const ACTOR: char = 'V';

/// One cell of the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Position {
    pub row: u32,
    pub col: u32,
}

impl Position {
    fn manhattan(self, other: Position) -> u32 {
        self.row.abs_diff(other.row) + self.col.abs_diff(other.col)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// One search state: where the actor stands and which goals are still to be
/// collected. The remaining goals are kept sorted so that equal goal sets
/// hash and compare equal regardless of the pickup order that led there.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GridState {
    actor: Position,
    goals: Vec<Position>,
}

impl GridState {
    /// The actor's position.
    pub fn actor(&self) -> Position {
        self.actor
    }

    /// The goals not collected yet, in ascending order.
    pub fn remaining_goals(&self) -> &[Position] {
        &self.goals
    }

    /// The state after stepping onto `to`, collecting a goal if one is
    /// there.
    fn after_move(&self, to: Position) -> GridState {
        let mut next = self.clone();
        next.actor = to;
        if let Ok(found) = next.goals.binary_search(&to) {
            next.goals.remove(found);
        }
        next
    }
}

impl fmt::Display for GridState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "actor {}, goals [", self.actor)?;
        for (i, goal) in self.goals.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{goal}")?;
        }
        write!(f, "]")
    }
}

/// The errors that may pop up while reading a pathfinding instance.
#[derive(Debug, thiserror::Error)]
pub enum ParseGridError {
    /// There was an io related error.
    #[error("io error {0}")]
    Io(#[from] std::io::Error),
    /// The parser expected an integer but got something else.
    #[error("parse int {0}")]
    ParseInt(#[from] ParseIntError),
    /// The file was not properly formatted.
    #[error("format error: {0}")]
    Format(&'static str),
}

/// One pathfinding instance: the grid geometry and the starting state.
pub struct GridPath {
    rows: u32,
    cols: u32,
    walls: Vec<bool>,
    initial: GridState,
}

impl GridPath {
    /// Reads an instance from its textual form: a `R C` dimension line
    /// followed by `R` rows of `C` characters (`V` actor, `*` goal, `#`
    /// wall, anything else free).
    pub fn from_reader(input: impl BufRead) -> Result<Self, ParseGridError> {
        let mut lines = input.lines();
        let dimensions = lines
            .next()
            .ok_or(ParseGridError::Format("missing dimensions"))??;
        let mut dimensions = dimensions.split_whitespace();
        let rows: u32 = dimensions
            .next()
            .ok_or(ParseGridError::Format("missing dimensions"))?
            .parse()?;
        let cols: u32 = dimensions
            .next()
            .ok_or(ParseGridError::Format("missing dimensions"))?
            .parse()?;

        let mut walls = vec![false; (rows * cols) as usize];
        let mut goals = Vec::new();
        let mut actor = Position { row: 0, col: 0 };
        for row in 0..rows {
            let line = lines
                .next()
                .ok_or(ParseGridError::Format("missing grid row"))??;
            // rows may be written compact ("V#*") or spaced out ("V # *")
            let symbols = line.chars().filter(|c| !c.is_whitespace());
            for (col, symbol) in symbols.take(cols as usize).enumerate() {
                let position = Position {
                    row,
                    col: col as u32,
                };
                match symbol {
                    GOAL => goals.push(position),
                    WALL => walls[(row * cols + col as u32) as usize] = true,
                    ACTOR => actor = position,
                    _ => {}
                }
            }
        }
        goals.sort_unstable();
        Ok(GridPath {
            rows,
            cols,
            walls,
            initial: GridState { actor, goals },
        })
    }

    fn wall(&self, position: Position) -> bool {
        self.walls[(position.row * self.cols + position.col) as usize]
    }

    /// The cells the actor may step onto: up, down, left, right, within
    /// bounds and not into a wall.
    fn valid_moves(&self, from: Position) -> Vec<Position> {
        let Position { row, col } = from;
        let mut moves = Vec::with_capacity(4);
        if row > 0 {
            moves.push(Position { row: row - 1, col });
        }
        if row + 1 < self.rows {
            moves.push(Position { row: row + 1, col });
        }
        if col > 0 {
            moves.push(Position { row, col: col - 1 });
        }
        if col + 1 < self.cols {
            moves.push(Position { row, col: col + 1 });
        }
        moves.retain(|&to| !self.wall(to));
        moves
    }
}

impl Problem for GridPath {
    type State = GridState;

    fn initial_state(&self) -> GridState {
        self.initial.clone()
    }

    fn successors(&self, state: &GridState) -> Vec<GridState> {
        self.valid_moves(state.actor)
            .into_iter()
            .map(|to| state.after_move(to))
            .collect()
    }

    fn cost(&self, _: &GridState, _: &GridState) -> Cost {
        1.0
    }

    fn heuristic(&self, state: &GridState) -> Cost {
        state
            .goals
            .iter()
            .map(|&goal| state.actor.manhattan(goal))
            .min()
            .unwrap_or(0) as Cost
    }

    fn max_action_count(&self) -> usize {
        4
    }
}

#[cfg(test)]
mod test_grid {
    use std::io::Cursor;

    use crate::problems::{GridPath, Position};
    use crate::Problem;

    fn parse(text: &str) -> GridPath {
        GridPath::from_reader(Cursor::new(text)).unwrap()
    }

    #[test]
    fn the_legend_is_read_back_from_the_grid() {
        let problem = parse("3 3\nV _ _\n# _ _\n_ _ *\n");
        let initial = problem.initial_state();
        assert_eq!(Position { row: 0, col: 0 }, initial.actor());
        assert_eq!(&[Position { row: 2, col: 2 }], initial.remaining_goals());
        assert!(problem.wall(Position { row: 1, col: 0 }));
    }

    #[test]
    fn moves_stay_in_bounds_and_out_of_walls() {
        let problem = parse("3 3\nV#_\n__*\n___\n");
        let initial = problem.initial_state();
        // from (0,0): down is free, right is a wall, up/left out of bounds
        let successors = problem.successors(&initial);
        assert_eq!(1, successors.len());
        assert_eq!(Position { row: 1, col: 0 }, successors[0].actor());
    }

    #[test]
    fn stepping_onto_a_goal_collects_it() {
        let problem = parse("1 3\nV*_\n");
        let initial = problem.initial_state();
        assert_eq!(1.0, problem.heuristic(&initial));
        let onto_goal = problem
            .successors(&initial)
            .into_iter()
            .find(|s| s.actor() == Position { row: 0, col: 1 })
            .unwrap();
        assert!(onto_goal.remaining_goals().is_empty());
        assert_eq!(0.0, problem.heuristic(&onto_goal));
    }

    #[test]
    fn the_heuristic_is_the_distance_to_the_closest_remaining_goal() {
        let problem = parse("3 3\nV_*\n___\n*__\n");
        let initial = problem.initial_state();
        // goals at (0,2) and (2,0): both two steps away
        assert_eq!(2.0, problem.heuristic(&initial));
    }

    #[test]
    fn a_state_with_no_goal_left_is_a_goal_state() {
        let problem = parse("2 2\nV_\n__\n");
        assert_eq!(0.0, problem.heuristic(&problem.initial_state()));
    }

    #[test]
    fn goal_sets_compare_independently_of_pickup_order() {
        let problem = parse("1 5\n*V_*_\n");
        let initial = problem.initial_state();
        assert_eq!(2, initial.remaining_goals().len());
        // collecting the left goal then coming back is the same state as
        // never having left, minus that goal
        let left = problem
            .successors(&initial)
            .into_iter()
            .find(|s| s.actor() == Position { row: 0, col: 0 })
            .unwrap();
        let back = problem
            .successors(&left)
            .into_iter()
            .find(|s| s.actor() == Position { row: 0, col: 1 })
            .unwrap();
        assert_eq!(&[Position { row: 0, col: 3 }], back.remaining_goals());
    }

    #[test]
    fn a_truncated_instance_is_rejected() {
        assert!(GridPath::from_reader(Cursor::new("3 3\nV__\n")).is_err());
        assert!(GridPath::from_reader(Cursor::new("")).is_err());
    }
}
