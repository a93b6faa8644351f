// Our custom logging macros to give us nicely formatted (and colored!) output.
use crate::log_debug;
use crate::schemas::toolbox::DEFAULT_TARGET;
// The 'colored' crate helps us make our console output look pretty and readable.
use colored::Colorize;
use std::path::PathBuf;

/// Resolves paths that start with a tilde `~` to the user's home directory.
/// Paths without a leading `~` (or when no home directory is known) come back unchanged.
pub fn expand_tilde(path: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path).into_owned())
}

/// Turns the configured `target` into the directory binaries are installed into:
/// `./tools` when unset, with a leading `~` expanded.
pub fn sanitize_target(target: &str) -> PathBuf {
    let target = target.trim();
    let resolved = if target.is_empty() {
        PathBuf::from(DEFAULT_TARGET)
    } else {
        expand_tilde(target)
    };
    log_debug!(
        "[Config] Target directory resolved to {}",
        resolved.display().to_string().cyan()
    );
    resolved
}
