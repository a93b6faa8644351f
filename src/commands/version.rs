// This file handles the `toolbox version` command.
// The version is the one `Cargo.toml` declared at build time.

use crate::libs::utilities::platform::Platform;
use crate::log_debug;
use colored::Colorize;

/// The version string of this build.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

/// Prints the version; with `--debug` also the platform assets are matched for.
pub fn run() {
    println!("toolbox {}", version().bold());
    let platform = Platform::detect();
    log_debug!("Matching assets for {}/{}", platform.os, platform.arch);
}
