//! Reference game implementations for validating the search engine.

mod tictactoe;

pub use tictactoe::{TicTacToe, TicTacToeAction, TicTacToeState};
