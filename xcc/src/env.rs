//! Environment handed to the real command.
//!
//! The wrapper never touches its own process environment; everything is
//! staged on the [`Command`] that replaces it.

use std::process::Command;

use crate::config::InvocationConfig;

/// Entries of an executable search path that mean "current directory".
const CURRENT_DIR_MARKERS: [&str; 2] = ["", "."];

fn same_dir(a: &str, b: &str) -> bool {
    fn trim(p: &str) -> &str {
        if p.len() > 1 { p.strip_suffix('/').unwrap_or(p) } else { p }
    }
    trim(a) == trim(b)
}

/// Drop the wrapper's own directories and current-directory entries from a
/// colon-separated search path.
///
/// Surviving entries keep their relative order. Applying the filter to its
/// own output changes nothing.
pub fn sanitize_search_path(path: &str, exclude: &[String]) -> Vec<String> {
    path.split(':')
        .filter(|entry| !CURRENT_DIR_MARKERS.contains(entry))
        .filter(|entry| !exclude.iter().any(|dir| same_dir(entry, dir)))
        .map(str::to_string)
        .collect()
}

/// Stage the child environment: requested exports, removal of their value
/// holders, and a `PATH` that can no longer resolve back to the wrapper.
pub fn apply_environment(cmd: &mut Command, cfg: &InvocationConfig) {
    for (name, value) in &cfg.exports {
        cmd.env(name, value);
    }
    for name in &cfg.env_to_set {
        cmd.env_remove(format!("XCC_ENV_SET_{name}"));
    }

    let path = sanitize_search_path(&cfg.search_path, &cfg.env_path).join(":");
    log::debug!("sanitized PATH: {path}");
    cmd.env("PATH", path);
}
