//! Tic-tac-toe reference game.
//!
//! A solved game (perfect play always draws), which makes it the standard
//! correctness check for the search engine: it must never lose, must
//! punish blunders, and two strong searches must draw each other.

use std::fmt;
use zerosearch_core::{Game, Transition};

/// Winning lines as 9-bit masks over cells 0..=8 (row-major).
const LINES: [u16; 8] = [
    0b000_000_111, // top row
    0b000_111_000, // middle row
    0b111_000_000, // bottom row
    0b001_001_001, // left column
    0b010_010_010, // center column
    0b100_100_100, // right column
    0b100_010_001, // main diagonal
    0b001_010_100, // anti-diagonal
];

const FULL: u16 = 0b111_111_111;

/// Board state as one bitmask per side.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub struct TicTacToeState {
    x: u16,
    o: u16,
    x_to_move: bool,
}

impl TicTacToeState {
    pub fn new() -> Self {
        Self {
            x: 0,
            o: 0,
            x_to_move: true,
        }
    }

    fn occupied(&self) -> u16 {
        self.x | self.o
    }

    fn won(side: u16) -> bool {
        LINES.iter().any(|&line| side & line == line)
    }

    /// Bitmask of the side that moved last.
    fn last_mover(&self) -> u16 {
        if self.x_to_move {
            self.o
        } else {
            self.x
        }
    }

    pub fn x_to_move(&self) -> bool {
        self.x_to_move
    }
}

impl Default for TicTacToeState {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TicTacToeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in 0..3 {
            if row > 0 {
                writeln!(f, "---+---+---")?;
            }
            for col in 0..3 {
                if col > 0 {
                    write!(f, "|")?;
                }
                let bit = 1u16 << (row * 3 + col);
                if self.x & bit != 0 {
                    write!(f, " X ")?;
                } else if self.o & bit != 0 {
                    write!(f, " O ")?;
                } else {
                    write!(f, "   ")?;
                }
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// A cell index 0..=8, row-major.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct TicTacToeAction(pub u8);

impl fmt::Display for TicTacToeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.0 / 3, self.0 % 3)
    }
}

#[derive(Clone, Debug)]
pub struct TicTacToe;

impl Game for TicTacToe {
    type State = TicTacToeState;
    type Action = TicTacToeAction;
    /// Two planes of 9 cells: side to move, then opponent.
    type Observation = [f32; 18];

    fn initial_state(&self) -> TicTacToeState {
        TicTacToeState::new()
    }

    fn legal_actions(&self, state: &TicTacToeState) -> Vec<TicTacToeAction> {
        let occupied = state.occupied();
        (0..9)
            .filter(|&cell| occupied & (1 << cell) == 0)
            .map(|cell| TicTacToeAction(cell as u8))
            .collect()
    }

    fn apply(&self, state: &TicTacToeState, action: TicTacToeAction) -> Transition<TicTacToeState> {
        let bit = 1u16 << action.0;
        debug_assert_eq!(state.occupied() & bit, 0, "cell already occupied");

        let mut next = *state;
        if state.x_to_move {
            next.x |= bit;
        } else {
            next.o |= bit;
        }
        next.x_to_move = !state.x_to_move;
        Transition::new(next)
    }

    fn is_terminal(&self, state: &TicTacToeState) -> bool {
        TicTacToeState::won(state.last_mover()) || state.occupied() == FULL
    }

    fn outcome(&self, state: &TicTacToeState) -> Option<f32> {
        if TicTacToeState::won(state.last_mover()) {
            Some(1.0)
        } else if state.occupied() == FULL {
            Some(0.0)
        } else {
            None
        }
    }

    /// Swaps the marks when O is to move, so the side to move is always X.
    fn canonical(&self, state: &TicTacToeState) -> TicTacToeState {
        if state.x_to_move {
            *state
        } else {
            TicTacToeState {
                x: state.o,
                o: state.x,
                x_to_move: true,
            }
        }
    }

    fn observe(&self, state: &TicTacToeState) -> [f32; 18] {
        let canonical = self.canonical(state);
        let mut obs = [0.0f32; 18];
        for cell in 0..9 {
            let bit = 1u16 << cell;
            if canonical.x & bit != 0 {
                obs[cell] = 1.0;
            }
            if canonical.o & bit != 0 {
                obs[cell + 9] = 1.0;
            }
        }
        obs
    }

    fn state_key(&self, state: &TicTacToeState) -> u64 {
        (state.x as u64) | ((state.o as u64) << 9) | ((state.x_to_move as u64) << 18)
    }

    fn action_to_index(&self, action: TicTacToeAction) -> usize {
        action.0 as usize
    }

    fn index_to_action(&self, index: usize) -> Option<TicTacToeAction> {
        (index < 9).then(|| TicTacToeAction(index as u8))
    }

    fn num_actions(&self) -> usize {
        9
    }
}
