// Platform detection and fuzzy platform-name matching for release asset names.
// Asset names across projects use wildly different spellings for the same platform
// ("amd64", "x86_64", "64bit", "win64", ...), so matching works on substrings plus a
// table of aliases. Stop-aliases veto an alias hit that is really a different platform
// (e.g. "linux_arm64" contains "64" but is not an amd64 build).

// Our custom logging macros to give us nicely formatted (and colored!) output.
use crate::{log_debug, log_warn};
// The 'colored' crate helps us make our console output look pretty and readable.
use colored::Colorize;
use std::collections::HashMap;
use std::env;

/// Environment variable that overrides the detected operating system token.
pub const ENV_TOOLBOX_OS: &str = "TOOLBOX_OS";
/// Environment variable that overrides the detected architecture token.
pub const ENV_TOOLBOX_ARCH: &str = "TOOLBOX_ARCH";

/// The operating system / architecture pair assets are matched against.
///
/// Tokens use the naming most release pipelines use in asset names:
/// `linux`, `darwin`, `windows` for the OS and `amd64`, `arm64`, `386`, `arm` for the CPU.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Platform {
    pub os: String,
    pub arch: String,
}

impl Platform {
    pub fn new(os: impl Into<String>, arch: impl Into<String>) -> Self {
        Platform {
            os: os.into(),
            arch: arch.into(),
        }
    }

    /// Detects the platform this binary runs on, honouring `TOOLBOX_OS` / `TOOLBOX_ARCH`.
    pub fn detect() -> Self {
        let os = env::var(ENV_TOOLBOX_OS)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| normalize_os(env::consts::OS));
        let arch = env::var(ENV_TOOLBOX_ARCH)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| normalize_arch(env::consts::ARCH));
        log_debug!("[Platform] Detected platform {}/{}", os.cyan(), arch.cyan());
        Platform { os, arch }
    }

    /// The native executable suffix: `.exe` on Windows, empty everywhere else.
    pub fn exe_suffix(&self) -> &'static str {
        if self.os == "windows" { ".exe" } else { "" }
    }

    /// Appends the executable suffix unless `name` already carries it.
    pub fn binary_name(&self, name: &str) -> String {
        let suffix = self.exe_suffix();
        if name.ends_with(suffix) {
            name.to_string()
        } else {
            format!("{name}{suffix}")
        }
    }
}

/// Maps `std::env::consts::OS` spellings onto asset-name tokens.
pub fn normalize_os(os: &str) -> String {
    match os.to_lowercase().as_str() {
        "macos" | "darwin" | "apple-darwin" | "osx" => "darwin".to_string(),
        "linux" => "linux".to_string(),
        "windows" | "win32" | "win64" => "windows".to_string(),
        other => {
            log_warn!(
                "[Platform] Unknown OS variant '{}', using as-is. This might cause issues with asset matching.",
                other.purple()
            );
            other.to_string()
        }
    }
}

/// Maps `std::env::consts::ARCH` spellings onto asset-name tokens.
pub fn normalize_arch(arch: &str) -> String {
    match arch.to_lowercase().as_str() {
        "x86_64" | "amd64" => "amd64".to_string(),
        "aarch64" | "arm64" => "arm64".to_string(),
        "x86" | "i386" | "i686" | "386" => "386".to_string(),
        "arm" | "armv7" => "arm".to_string(),
        other => {
            log_warn!(
                "[Platform] Unknown ARCH variant '{}', using as-is. This might cause issues with asset matching.",
                other.purple()
            );
            other.to_string()
        }
    }
}

fn table(entries: &[(&str, &[&str])]) -> HashMap<String, Vec<String>> {
    entries
        .iter()
        .map(|(token, list)| {
            (
                token.to_string(),
                list.iter().map(|s| s.to_string()).collect(),
            )
        })
        .collect()
}

/// Alias and stop-alias tables for platform tokens.
///
/// Built once per run from the defaults plus the configuration's overrides and then passed
/// around immutably.
#[derive(Debug, Clone)]
pub struct AliasTable {
    aliases: HashMap<String, Vec<String>>,
    stop_aliases: HashMap<String, Vec<String>>,
}

impl Default for AliasTable {
    fn default() -> Self {
        AliasTable {
            aliases: table(&[
                ("amd64", &["x86_64", "64", "64bit"]),
                ("arm64", &["aarch64", "armv8"]),
                ("386", &["i386", "i686", "x86", "32bit"]),
                ("windows", &["win", "win64"]),
                ("linux", &["linux64"]),
                ("darwin", &["macos", "osx"]),
            ]),
            stop_aliases: table(&[
                ("amd64", &["arm", "aarch", "mips", "ppc", "risc", "s390"]),
                ("386", &["64"]),
                ("windows", &["darwin"]),
            ]),
        }
    }
}

impl AliasTable {
    /// Defaults with per-token overrides: a token present in `overrides` gets exactly the
    /// configured alias list, every other token keeps its default list.
    pub fn with_overrides(overrides: Option<&HashMap<String, Vec<String>>>) -> Self {
        let mut table = AliasTable::default();
        if let Some(overrides) = overrides {
            for (token, list) in overrides {
                log_debug!("[Platform] Alias override for '{}': {:?}", token, list);
                table.aliases.insert(
                    token.clone(),
                    list.iter().map(|a| a.to_lowercase()).collect(),
                );
            }
        }
        table
    }

    /// True if `name` names the platform `token`, either literally or through an alias that is
    /// not vetoed by one of the token's stop-aliases.
    pub fn matches(&self, token: &str, name: &str) -> bool {
        let lower = name.to_lowercase();
        if lower.contains(&token.to_lowercase()) {
            return true;
        }
        let Some(aliases) = self.aliases.get(token) else {
            return false;
        };
        let stops = self.stop_aliases.get(token);
        aliases.iter().any(|alias| {
            lower.contains(alias.as_str())
                && !stops.is_some_and(|stops| stops.iter().any(|stop| lower.contains(stop.as_str())))
        })
    }
}
