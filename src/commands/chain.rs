//! Splits a de-prefixed message into its sub-commands.

/// Splits `text` on newlines into raw command strings.
///
/// Empty lines are kept as empty entries so they still occupy a slot in the
/// progress report.
pub fn parse_chain(text: &str) -> Vec<String> {
    text.split('\n').map(str::to_owned).collect()
}
