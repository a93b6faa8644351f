// This module persists the version ledger: `.toolbox-versions.yaml` inside the target
// directory, mapping every installed tool to the version that was installed.
// It is read once at the start of a fetch run (to skip tools that are already current)
// and rewritten once at the end. A missing ledger is simply an empty one.

use crate::libs::config_loading::save_yaml_file;
use crate::libs::errors::FetchError;
use crate::schemas::toolbox::Versions;
// Our custom logging macros for nicely formatted output.
use crate::{log_debug, log_info};
// The 'colored' crate helps us make our console output look pretty and readable.
use colored::Colorize;
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// File name of the ledger inside the target directory.
pub const VERSIONS_FILE: &str = ".toolbox-versions.yaml";

pub fn ledger_path(target_dir: &Path) -> PathBuf {
    target_dir.join(VERSIONS_FILE)
}

/// Loads the ledger of `target_dir`; an absent file yields an empty map.
pub fn load_versions(target_dir: &Path) -> Result<BTreeMap<String, String>, FetchError> {
    let path = ledger_path(target_dir);
    let contents = match fs::read_to_string(&path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            log_debug!("[Ledger] No ledger at {}, starting empty", path.display());
            return Ok(BTreeMap::new());
        }
        Err(e) => return Err(e.into()),
    };
    let versions: Versions = if contents.trim().is_empty() {
        Versions::default()
    } else {
        serde_yaml::from_str(&contents)?
    };
    log_debug!(
        "[Ledger] Loaded {} version(s) from {}",
        versions.versions.len(),
        path.display()
    );
    Ok(versions.versions)
}

/// Rewrites the ledger of `target_dir` with exactly `versions`.
pub fn save_versions(target_dir: &Path, versions: &Versions) -> Result<(), FetchError> {
    let path = ledger_path(target_dir);
    save_yaml_file(&path, versions)?;
    log_info!(
        "[Ledger] Recorded {} version(s) in {}",
        versions.versions.len(),
        path.display().to_string().cyan()
    );
    Ok(())
}
