//! Home directory lookup and tilde expansion for configured directories

use std::path::{MAIN_SEPARATOR, Path, PathBuf};
use tracing::warn;

/// The current user's home directory, if one can be determined
pub fn home_dir() -> Option<PathBuf> {
    let home = dirs::home_dir();
    if home.is_none() {
        warn!("No home directory found - set $HOME (or the platform equivalent).");
    }
    home
}

/// Expand a leading `~` to the home directory
pub fn expand_tilde(path: &str) -> PathBuf {
    if path != "~" && tilde_suffix(path).is_none() {
        return PathBuf::from(path);
    }
    expand_tilde_with(path, home_dir().as_deref())
}

/// Expand a leading `~` against an explicit home directory
pub fn expand_tilde_with(path: &str, home: Option<&Path>) -> PathBuf {
    let Some(home) = home else {
        return PathBuf::from(path);
    };
    if path == "~" {
        return home.to_path_buf();
    }
    match tilde_suffix(path) {
        Some(rest) => home.join(rest),
        None => PathBuf::from(path),
    }
}

fn tilde_suffix(path: &str) -> Option<&str> {
    let rest = path.strip_prefix('~')?;
    rest.strip_prefix('/').or_else(|| rest.strip_prefix(MAIN_SEPARATOR))
}
