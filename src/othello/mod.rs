//! Othello board engine used by the `othello` command.
//!
//! The command only talks to the [`Board`] trait, so any engine can be plugged
//! in. [`board::StandardBoard`] is the classic 8x8 game.
//!
//! # Modules
//!
//! - `board` - Board positions and the standard 8x8 engine

use mockall::automock;

pub mod board;

pub use crate::othello::board::{Position, StandardBoard};

/// One of the two sides of a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Player {
    Black,
    White,
}

impl Player {
    pub fn opponent(self) -> Player {
        match self {
            Player::Black => Player::White,
            Player::White => Player::Black,
        }
    }
}

/// State of a match as reported by the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameResult {
    InProgress,
    Won(Player),
    Draw,
}

/// Board engine contract.
///
/// Coordinates are zero based, `x` is the column and `y` the row.
#[automock]
pub trait Board: Send {
    /// Whether `player` may place a stone at (`x`, `y`).
    fn can_place(&self, player: Player, x: usize, y: usize) -> bool;

    /// Whether `player` has at least one legal move.
    fn can_place_any(&self, player: Player) -> bool;

    /// Places a stone for `player` and flips the captured stones.
    fn place(&mut self, player: Player, x: usize, y: usize);

    fn winner(&self) -> GameResult;

    /// Text rendering of the board, legal moves of `highlight` marked.
    fn render(&self, highlight: Option<Player>) -> String;
}
