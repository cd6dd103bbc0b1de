//! Markdown response formatters for bot commands.
//!
//! All user-facing text of the commands lives here so it can be reviewed and
//! tested in one place.

use crate::{
    commands::help::HelpEntry,
    othello::{Player, board::Position},
};

/// Placeholder shown when a help entry has no description.
const UNKNOWN_DESCRIPTION: &str = "unknown";
/// Placeholder shown when a help entry has no usage.
const UNAVAILABLE_USAGE: &str = "not available";

/// Formats help search results, one block per entry.
///
/// # Examples
///
/// ```
/// # use chainbot::commands::{help::HelpEntry, markdown_response::format_help_results};
/// let entry = HelpEntry {
///     key: "othello start".to_string(),
///     description: Some("start a match".to_string()),
///     usage: None,
/// };
/// let output = format_help_results(&[&entry]);
/// assert!(output.contains("Usage: not available"));
/// ```
pub fn format_help_results(entries: &[&HelpEntry]) -> String {
    let blocks = entries
        .iter()
        .map(|entry| {
            format!(
                "**{}**\n```\nDescription: {}\nUsage: {}\n```",
                entry.key,
                entry.description.as_deref().unwrap_or(UNKNOWN_DESCRIPTION),
                entry.usage.as_deref().unwrap_or(UNAVAILABLE_USAGE)
            )
        })
        .collect::<Vec<String>>()
        .join("\n\n");

    format!("**Search results**\n\n{}", blocks)
}

/// Formats the notice sent when a help search found nothing.
pub fn format_help_not_found() -> String {
    "**🔴 Search failed**\n\nSearch with `help <keyword>`. Check your parameters.".to_owned()
}

/// Formats a board rendering as a code block so the grid keeps its lines.
pub fn format_board(board: &str) -> String {
    format!("```\n{}\n```", board)
}

pub fn format_player(player: Player, user_id: &str) -> String {
    match player {
        Player::Black => format!("⚫ black {}", user_id),
        Player::White => format!("⚪ white {}", user_id),
    }
}

pub fn format_match_opened(user_id: &str) -> String {
    format!(
        "{}: you play black. Waiting for an opponent, type `othello start` to join.",
        user_id
    )
}

pub fn format_match_joined(user_id: &str) -> String {
    format!("{}: you joined the match as white.", user_id)
}

pub fn format_turn(player: Player, user_id: &str) -> String {
    format!("{}: it's your turn.", format_player(player, user_id))
}

pub fn format_illegal_move(position: Position) -> String {
    format!("You cannot place a stone on {}!", position)
}

pub fn format_winner(player: Player, user_id: &str) -> String {
    format!("🎉 {} wins the match!", format_player(player, user_id))
}

pub fn format_draw() -> String {
    "The match ends in a draw!".to_owned()
}

pub fn format_othello_usage() -> String {
    "usage: `othello start` or `othello put <column><row>`, e.g. `othello put D3`".to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(key: &str, description: Option<&str>, usage: Option<&str>) -> HelpEntry {
        HelpEntry {
            key: key.to_string(),
            description: description.map(str::to_string),
            usage: usage.map(str::to_string),
        }
    }

    #[test]
    fn test_format_help_results() {
        let start = entry("othello start", Some("start a match"), Some("othello start"));
        let put = entry("othello put", Some("place a stone"), Some("othello put D3"));

        let output = format_help_results(&[&start, &put]);

        assert!(output.starts_with("**Search results**"));
        assert!(output.contains("**othello start**\n```\nDescription: start a match\nUsage: othello start\n```"));
        assert!(output.contains("**othello put**"));
        assert!(output.find("othello start").unwrap() < output.find("othello put").unwrap());
    }

    #[test]
    fn test_format_help_results_placeholders() {
        let ping = entry("ping", None, None);
        let output = format_help_results(&[&ping]);
        assert!(output.contains("Description: unknown"));
        assert!(output.contains("Usage: not available"));
    }

    #[test]
    fn test_format_help_not_found() {
        assert!(format_help_not_found().contains("help <keyword>"));
    }

    #[test]
    fn test_format_board() {
        assert_eq!(format_board("ab\ncd"), "```\nab\ncd\n```");
    }

    #[test]
    fn test_format_turn() {
        assert_eq!(
            format_turn(Player::White, "@bob:example.com"),
            "⚪ white @bob:example.com: it's your turn."
        );
    }

    #[test]
    fn test_format_winner() {
        assert!(format_winner(Player::Black, "@alice:example.com").contains("black @alice:example.com"));
    }

    #[test]
    fn test_format_illegal_move() {
        assert_eq!(
            format_illegal_move(Position { x: 3, y: 2 }),
            "You cannot place a stone on D3!"
        );
    }
}
