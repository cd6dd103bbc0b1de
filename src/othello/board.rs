//! Board positions and the standard 8x8 Othello engine.

use std::fmt;

use crate::othello::{Board, GameResult, Player};

/// Width and height of the board.
pub const SIZE: usize = 8;

const DIRECTIONS: [(isize, isize); 8] = [
    (-1, -1),
    (0, -1),
    (1, -1),
    (-1, 0),
    (1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
];

/// A cell of the board, zero based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Position {
    pub x: usize,
    pub y: usize,
}

impl Position {
    /// Parses a position written as a column letter and a row number, such as
    /// `D3` or `h8`.
    pub fn parse(text: &str) -> Option<Position> {
        let mut chars = text.trim().chars();
        let column = chars.next()?.to_ascii_uppercase();
        if !('A'..='H').contains(&column) {
            return None;
        }

        let row: usize = chars.as_str().parse().ok()?;
        if !(1..=SIZE).contains(&row) {
            return None;
        }

        Some(Position {
            x: column as usize - 'A' as usize,
            y: row - 1,
        })
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let column = (b'A' + self.x as u8) as char;
        write!(f, "{}{}", column, self.y + 1)
    }
}

/// Classic 8x8 board with the four center stones in place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StandardBoard {
    cells: [[Option<Player>; SIZE]; SIZE],
}

impl Default for StandardBoard {
    fn default() -> Self {
        let mut cells = [[None; SIZE]; SIZE];
        cells[3][3] = Some(Player::White);
        cells[4][4] = Some(Player::White);
        cells[3][4] = Some(Player::Black);
        cells[4][3] = Some(Player::Black);
        StandardBoard { cells }
    }
}

impl StandardBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stone at (`x`, `y`).
    #[cfg(test)]
    pub fn get(&self, x: usize, y: usize) -> Option<Player> {
        self.cells[y][x]
    }

    pub fn count(&self, player: Player) -> usize {
        self.cells
            .iter()
            .flatten()
            .filter(|cell| **cell == Some(player))
            .count()
    }

    /// Stones flipped if `player` placed at (`x`, `y`).
    fn captures(&self, player: Player, x: usize, y: usize) -> Vec<(usize, usize)> {
        let mut captured = Vec::new();

        for (dx, dy) in DIRECTIONS {
            let mut line = Vec::new();
            let (mut cx, mut cy) = (x as isize + dx, y as isize + dy);

            while (0..SIZE as isize).contains(&cx) && (0..SIZE as isize).contains(&cy) {
                match self.cells[cy as usize][cx as usize] {
                    Some(stone) if stone == player.opponent() => {
                        line.push((cx as usize, cy as usize));
                    }
                    Some(_) => {
                        captured.extend(line.drain(..));
                        break;
                    }
                    None => break,
                }
                cx += dx;
                cy += dy;
            }
        }

        captured
    }
}

impl Board for StandardBoard {
    fn can_place(&self, player: Player, x: usize, y: usize) -> bool {
        x < SIZE && y < SIZE && self.cells[y][x].is_none() && !self.captures(player, x, y).is_empty()
    }

    fn can_place_any(&self, player: Player) -> bool {
        (0..SIZE).any(|y| (0..SIZE).any(|x| self.can_place(player, x, y)))
    }

    fn place(&mut self, player: Player, x: usize, y: usize) {
        if !self.can_place(player, x, y) {
            return;
        }

        for (cx, cy) in self.captures(player, x, y) {
            self.cells[cy][cx] = Some(player);
        }
        self.cells[y][x] = Some(player);
    }

    fn winner(&self) -> GameResult {
        if self.can_place_any(Player::Black) || self.can_place_any(Player::White) {
            return GameResult::InProgress;
        }

        let black = self.count(Player::Black);
        let white = self.count(Player::White);
        match black.cmp(&white) {
            std::cmp::Ordering::Greater => GameResult::Won(Player::Black),
            std::cmp::Ordering::Less => GameResult::Won(Player::White),
            std::cmp::Ordering::Equal => GameResult::Draw,
        }
    }

    fn render(&self, highlight: Option<Player>) -> String {
        let mut lines = vec!["  A B C D E F G H".to_owned()];

        for y in 0..SIZE {
            let row = (0..SIZE)
                .map(|x| match self.cells[y][x] {
                    Some(Player::Black) => "●",
                    Some(Player::White) => "○",
                    None if highlight.is_some_and(|p| self.can_place(p, x, y)) => "*",
                    None => "·",
                })
                .collect::<Vec<&str>>()
                .join(" ");
            lines.push(format!("{} {}", y + 1, row));
        }

        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_position() {
        assert_eq!(Position::parse("A1"), Some(Position { x: 0, y: 0 }));
        assert_eq!(Position::parse("d3"), Some(Position { x: 3, y: 2 }));
        assert_eq!(Position::parse(" H8 "), Some(Position { x: 7, y: 7 }));
    }

    #[test]
    fn test_parse_invalid_position() {
        assert_eq!(Position::parse(""), None);
        assert_eq!(Position::parse("I1"), None);
        assert_eq!(Position::parse("A0"), None);
        assert_eq!(Position::parse("A9"), None);
        assert_eq!(Position::parse("3D"), None);
        assert_eq!(Position::parse("A"), None);
    }

    #[test]
    fn test_position_display() {
        assert_eq!(Position { x: 3, y: 2 }.to_string(), "D3");
        assert_eq!(Position::parse("f5").unwrap().to_string(), "F5");
    }

    #[test]
    fn test_initial_board() {
        let board = StandardBoard::new();
        assert_eq!(board.count(Player::Black), 2);
        assert_eq!(board.count(Player::White), 2);
        assert_eq!(board.winner(), GameResult::InProgress);
    }

    #[test]
    fn test_opening_moves() {
        let board = StandardBoard::new();
        let legal: Vec<Position> = (0..SIZE)
            .flat_map(|y| (0..SIZE).map(move |x| Position { x, y }))
            .filter(|p| board.can_place(Player::Black, p.x, p.y))
            .collect();

        let names: Vec<String> = legal.iter().map(Position::to_string).collect();
        assert_eq!(names, vec!["D3", "C4", "F5", "E6"]);
    }

    #[test]
    fn test_cannot_place_on_occupied_or_outside() {
        let board = StandardBoard::new();
        assert!(!board.can_place(Player::Black, 3, 3));
        assert!(!board.can_place(Player::Black, 0, 0));
        assert!(!board.can_place(Player::Black, SIZE, 0));
    }

    #[test]
    fn test_place_flips_stones() {
        let mut board = StandardBoard::new();
        board.place(Player::Black, 3, 2);

        assert_eq!(board.get(3, 2), Some(Player::Black));
        assert_eq!(board.get(3, 3), Some(Player::Black));
        assert_eq!(board.count(Player::Black), 4);
        assert_eq!(board.count(Player::White), 1);
    }

    #[test]
    fn test_illegal_place_is_ignored() {
        let mut board = StandardBoard::new();
        board.place(Player::Black, 0, 0);
        assert_eq!(board, StandardBoard::new());
    }

    #[test]
    fn test_winner_when_no_moves_left() {
        let mut board = StandardBoard::new();
        board.cells = [[Some(Player::Black); SIZE]; SIZE];
        board.cells[0][0] = Some(Player::White);
        assert_eq!(board.winner(), GameResult::Won(Player::Black));

        board.cells = [[None; SIZE]; SIZE];
        board.cells[0][0] = Some(Player::White);
        board.cells[7][7] = Some(Player::Black);
        assert_eq!(board.winner(), GameResult::Draw);
    }

    #[test]
    fn test_render_highlights_legal_moves() {
        let board = StandardBoard::new();
        let rendered = board.render(Some(Player::Black));
        let lines: Vec<&str> = rendered.lines().collect();

        assert_eq!(lines.len(), SIZE + 1);
        assert_eq!(lines[0], "  A B C D E F G H");
        assert_eq!(lines[3], "3 · · · * · · · ·");
        assert_eq!(lines[4], "4 · · * ○ ● · · ·");
        assert!(!board.render(None).contains('*'));
    }
}
