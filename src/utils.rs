//! Helpers for the data directory layout.

use std::path::PathBuf;

/// Joins `name` to `dir_path`.
///
/// # Examples
///
/// ```
/// # use chainbot::utils::get_path;
/// let path = get_path("/var/lib/chainbot", "servers.json");
/// assert_eq!(path, "/var/lib/chainbot/servers.json");
/// ```
pub fn get_path(dir_path: &str, name: &str) -> String {
    let path: PathBuf = [dir_path, name].iter().collect();
    path.to_string_lossy().into_owned()
}
