//! Command prefix resolution.
//!
//! Each server configures an ordered list of prefixes. A message is a command
//! when its text starts with one of them; the first matching prefix in list
//! order wins and is stripped from the text.

/// Strips the first matching prefix from `body`.
///
/// Matching is exact and case-sensitive, no whitespace is trimmed. Returns
/// `None` when no prefix matches, when `prefixes` is empty, or when the
/// prefix consumes the whole message.
///
/// # Examples
///
/// ```
/// # use chainbot::commands::prefix::resolve_prefix;
/// let prefixes = vec!["!".to_string(), "?".to_string()];
/// assert_eq!(resolve_prefix(&prefixes, "?help"), Some("help"));
/// assert_eq!(resolve_prefix(&prefixes, "hello"), None);
/// ```
pub fn resolve_prefix<'a>(prefixes: &[String], body: &'a str) -> Option<&'a str> {
    prefixes
        .iter()
        .find_map(|prefix| body.strip_prefix(prefix.as_str()))
        .filter(|remainder| !remainder.is_empty())
}
