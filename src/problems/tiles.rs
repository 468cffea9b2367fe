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

//! This module provides the 4x4 sliding-tile puzzle. A board is packed into
//! a single 64-bit word, 4 bits per cell, which keeps states copyable, makes
//! hashing them trivial and keeps the closed table compact. The heuristic is
//! the sum of Manhattan distances of every tile to its position in the goal
//! configuration read from the instance, admissible and consistent, so all
//! optimal engines return true optimal solutions on this problem.

use std::fmt;
use std::io::BufRead;
use std::num::ParseIntError;

use crate::{Cost, Problem};

/// The puzzle is 4x4.
const SIDE: usize = 4;
/// Number of board cells.
const CELLS: usize = SIDE * SIDE;
/// The value encoding the empty cell.
const EMPTY_TILE: u8 = 0;

/// One board configuration, packed 4 bits per cell (cell 0 in the lowest
/// nibble), plus the cached index of the empty cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileBoard {
    cells: u64,
    empty: u8,
}

impl TileBoard {
    /// Packs sixteen tile values (row-major, `0` marking the empty cell)
    /// into a board.
    pub fn from_cells(values: &[u8; CELLS]) -> Self {
        let mut cells = 0_u64;
        let mut empty = 0_u8;
        for (cell, &value) in values.iter().enumerate() {
            cells |= (value as u64) << (4 * cell);
            if value == EMPTY_TILE {
                empty = cell as u8;
            }
        }
        TileBoard { cells, empty }
    }

    /// The value of the tile sitting in `cell` (0 for the empty cell).
    pub fn tile(&self, cell: usize) -> u8 {
        ((self.cells >> (4 * cell)) & 0xF) as u8
    }

    /// The index of the empty cell.
    pub fn empty(&self) -> usize {
        self.empty as usize
    }

    /// The board obtained by sliding the tile at `from` into the empty cell.
    fn with_slide(&self, from: usize) -> Self {
        let value = self.tile(from) as u64;
        let mut cells = self.cells & !(0xF << (4 * from));
        cells |= value << (4 * self.empty as usize);
        TileBoard {
            cells,
            empty: from as u8,
        }
    }

    /// The cells the empty cell can swap with: up, left, right, down.
    fn slides(&self) -> Vec<usize> {
        let empty = self.empty as usize;
        let mut moves = Vec::with_capacity(4);
        if empty >= SIDE {
            moves.push(empty - SIDE);
        }
        if empty % SIDE > 0 {
            moves.push(empty - 1);
        }
        if empty % SIDE < SIDE - 1 {
            moves.push(empty + 1);
        }
        if empty < SIDE * (SIDE - 1) {
            moves.push(empty + SIDE);
        }
        moves
    }
}

impl fmt::Display for TileBoard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for cell in 0..CELLS {
            if cell > 0 {
                write!(f, ",")?;
            }
            write!(f, "{}", self.tile(cell))?;
        }
        Ok(())
    }
}

/// The errors that may pop up while reading a sliding-tile instance.
#[derive(Debug, thiserror::Error)]
pub enum ParseTilesError {
    /// There was an io related error.
    #[error("io error {0}")]
    Io(#[from] std::io::Error),
    /// The parser expected an integer but got something else.
    #[error("parse int {0}")]
    ParseInt(#[from] ParseIntError),
    /// Only the 4x4 puzzle is supported.
    #[error("expected a 4 4 puzzle, got {0} {1}")]
    UnsupportedSize(usize, usize),
    /// The file was not properly formatted.
    #[error("format error: {0}")]
    Format(&'static str),
}

/// One instance of the 15-puzzle: a starting configuration and the goal
/// configuration the heuristic is measured against.
pub struct SlidingTiles {
    initial: TileBoard,
    /// For every tile value, the cell it occupies in the goal configuration.
    goal_cell: [u8; CELLS],
}

impl SlidingTiles {
    /// Creates an instance from explicit start and goal configurations.
    pub fn new(initial: TileBoard, goal: TileBoard) -> Self {
        let mut goal_cell = [0_u8; CELLS];
        for cell in 0..CELLS {
            goal_cell[goal.tile(cell) as usize] = cell as u8;
        }
        SlidingTiles { initial, goal_cell }
    }

    /// Reads an instance from its textual form: a `4 4` dimension line, a
    /// header line, sixteen tile values (one per line), another header line
    /// and the sixteen goal values.
    pub fn from_reader(input: impl BufRead) -> Result<Self, ParseTilesError> {
        let mut lines = input.lines();
        let dimensions = next_line(&mut lines)?;
        let mut dimensions = dimensions.split_whitespace();
        let rows: usize = dimensions
            .next()
            .ok_or(ParseTilesError::Format("missing dimensions"))?
            .parse()?;
        let cols: usize = dimensions
            .next()
            .ok_or(ParseTilesError::Format("missing dimensions"))?
            .parse()?;
        if rows != SIDE || cols != SIDE {
            return Err(ParseTilesError::UnsupportedSize(rows, cols));
        }
        let _header = next_line(&mut lines)?;
        let initial = parse_board(&mut lines)?;
        let _header = next_line(&mut lines)?;
        let goal = parse_board(&mut lines)?;
        Ok(SlidingTiles::new(initial, goal))
    }

    /// Sum of the Manhattan distances of every tile to its goal cell. Zero
    /// exactly when the board matches the goal configuration.
    fn manhattan(&self, board: &TileBoard) -> Cost {
        let mut distance = 0_i32;
        for cell in 0..CELLS {
            let tile = board.tile(cell);
            if tile == EMPTY_TILE {
                continue;
            }
            let goal = self.goal_cell[tile as usize] as i32;
            let cell = cell as i32;
            let side = SIDE as i32;
            distance += (goal / side - cell / side).abs() + (goal % side - cell % side).abs();
        }
        distance as Cost
    }
}

fn next_line<B: BufRead>(lines: &mut std::io::Lines<B>) -> Result<String, ParseTilesError> {
    Ok(lines
        .next()
        .ok_or(ParseTilesError::Format("unexpected end of input"))??)
}

fn parse_board<B: BufRead>(lines: &mut std::io::Lines<B>) -> Result<TileBoard, ParseTilesError> {
    let mut values = [0_u8; CELLS];
    for value in values.iter_mut() {
        let line = next_line(lines)?;
        let tile: u8 = line.trim().parse()?;
        if tile as usize >= CELLS {
            return Err(ParseTilesError::Format("tile value out of range"));
        }
        *value = tile;
    }
    Ok(TileBoard::from_cells(&values))
}

impl Problem for SlidingTiles {
    type State = TileBoard;

    fn initial_state(&self) -> TileBoard {
        self.initial
    }

    fn successors(&self, board: &TileBoard) -> Vec<TileBoard> {
        board
            .slides()
            .into_iter()
            .map(|from| board.with_slide(from))
            .collect()
    }

    fn cost(&self, _: &TileBoard, _: &TileBoard) -> Cost {
        1.0
    }

    fn heuristic(&self, board: &TileBoard) -> Cost {
        self.manhattan(board)
    }

    fn max_action_count(&self) -> usize {
        4
    }
}

#[cfg(test)]
mod test_tiles {
    use std::io::Cursor;

    use crate::problems::{SlidingTiles, TileBoard};
    use crate::Problem;

    const SOLVED: [u8; 16] = [1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 0];

    fn instance_text(initial: &[u8; 16], goal: &[u8; 16]) -> String {
        let mut text = String::from("4 4\nstarting positions for each tile:\n");
        for value in initial {
            text.push_str(&format!("{value}\n"));
        }
        text.push_str("goal positions:\n");
        for value in goal {
            text.push_str(&format!("{value}\n"));
        }
        text
    }

    #[test]
    fn packing_round_trips_through_tile_lookups() {
        let board = TileBoard::from_cells(&SOLVED);
        for (cell, &value) in SOLVED.iter().enumerate() {
            assert_eq!(value, board.tile(cell));
        }
        assert_eq!(15, board.empty());
    }

    #[test]
    fn the_corner_empty_cell_has_two_slides() {
        let problem = SlidingTiles::new(
            TileBoard::from_cells(&SOLVED),
            TileBoard::from_cells(&SOLVED),
        );
        // empty in the bottom-right corner: only up and left
        assert_eq!(2, problem.successors(&TileBoard::from_cells(&SOLVED)).len());
    }

    #[test]
    fn a_center_empty_cell_has_four_slides() {
        let mut values = SOLVED;
        values.swap(5, 15); // empty now at cell 5
        let board = TileBoard::from_cells(&values);
        let problem = SlidingTiles::new(board, TileBoard::from_cells(&SOLVED));
        assert_eq!(4, problem.successors(&board).len());
    }

    #[test]
    fn sliding_preserves_the_multiset_of_tiles() {
        let board = TileBoard::from_cells(&SOLVED);
        let problem = SlidingTiles::new(board, board);
        for successor in problem.successors(&board) {
            let mut seen = [false; 16];
            for cell in 0..16 {
                seen[successor.tile(cell) as usize] = true;
            }
            assert!(seen.iter().all(|&present| present));
        }
    }

    #[test]
    fn the_goal_configuration_has_heuristic_zero() {
        let board = TileBoard::from_cells(&SOLVED);
        let problem = SlidingTiles::new(board, board);
        assert_eq!(0.0, problem.heuristic(&board));
    }

    #[test]
    fn a_single_slide_has_heuristic_one() {
        let mut values = SOLVED;
        values.swap(14, 15); // slide tile 15 right
        let board = TileBoard::from_cells(&values);
        let problem = SlidingTiles::new(board, TileBoard::from_cells(&SOLVED));
        assert_eq!(1.0, problem.heuristic(&board));
    }

    #[test]
    fn an_instance_parses_from_its_textual_form() {
        let mut start = SOLVED;
        start.swap(14, 15);
        let text = instance_text(&start, &SOLVED);
        let problem = SlidingTiles::from_reader(Cursor::new(text)).unwrap();
        assert_eq!(TileBoard::from_cells(&start), problem.initial_state());
        assert_eq!(1.0, problem.heuristic(&problem.initial_state()));
    }

    #[test]
    fn a_non_4x4_instance_is_rejected() {
        let text = "3 3\nheader\n";
        assert!(SlidingTiles::from_reader(Cursor::new(text)).is_err());
    }

    #[test]
    fn a_truncated_instance_is_rejected() {
        let text = "4 4\nheader\n1\n2\n3\n";
        assert!(SlidingTiles::from_reader(Cursor::new(text)).is_err());
    }

    #[test]
    fn boards_display_as_a_comma_separated_row() {
        let board = TileBoard::from_cells(&SOLVED);
        assert_eq!("1,2,3,4,5,6,7,8,9,10,11,12,13,14,15,0", board.to_string());
    }
}
