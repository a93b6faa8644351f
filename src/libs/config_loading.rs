// This module finds, reads and writes the `.toolbox.yaml` configuration.
//
// Lookup order when no explicit file is given (or the given file does not exist):
//   1. `./.toolbox.yaml`
//   2. `~/.config/toolbox.yaml`
//   3. `~/.toolbox.yaml`

use crate::libs::errors::FetchError;
use crate::schemas::toolbox::{Tool, Toolbox};
use crate::{log_debug, log_info, log_warn};
use colored::Colorize;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Configuration file name in the working and home directories.
pub const TOOLBOX_CONF_FILE: &str = ".toolbox.yaml";
/// Configuration file below the home directory, XDG style.
pub const TOOLBOX_DOT_CONFIG_FILE: &str = ".config/toolbox.yaml";

/// Picks the configuration file to use, or `None` when there is none.
///
/// # Arguments
/// * `explicit`: the `-c/--config` value, used when it names an existing file.
/// * `cwd`: directory searched for `.toolbox.yaml` first.
/// * `home`: the user's home directory, if known.
pub fn find_config_file(explicit: Option<&str>, cwd: &Path, home: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit.filter(|p| !p.trim().is_empty()) {
        let path = PathBuf::from(path);
        if path.is_file() {
            return Some(path);
        }
        log_warn!(
            "[Config] {} does not exist, falling back to the default locations",
            path.display().to_string().yellow()
        );
    }

    let mut candidates = vec![cwd.join(TOOLBOX_CONF_FILE)];
    if let Some(home) = home {
        candidates.push(home.join(TOOLBOX_DOT_CONFIG_FILE));
        candidates.push(home.join(TOOLBOX_CONF_FILE));
    }
    log_debug!("[Config] Configuration candidates: {:?}", candidates);
    candidates.into_iter().find(|p| p.is_file())
}

/// Reads the toolbox configuration and returns it together with the file it came from.
pub fn read_toolbox(explicit: Option<&str>) -> Result<(Toolbox, PathBuf), FetchError> {
    let cwd = std::env::current_dir()?;
    let home = dirs::home_dir();
    let path = find_config_file(explicit, &cwd, home.as_deref()).ok_or_else(|| {
        FetchError::Config(format!(
            "no configuration found (tried {}, ~/{} and ~/{})",
            TOOLBOX_CONF_FILE, TOOLBOX_DOT_CONFIG_FILE, TOOLBOX_CONF_FILE
        ))
    })?;
    let toolbox = read_toolbox_file(&path)?;
    Ok((toolbox, path))
}

/// Parses one configuration file.
pub fn read_toolbox_file(path: &Path) -> Result<Toolbox, FetchError> {
    log_info!("[Config] Reading config {}", path.display().to_string().cyan());
    let contents = fs::read_to_string(path)?;
    let toolbox: Toolbox = if contents.trim().is_empty() {
        Toolbox::default()
    } else {
        serde_yaml::from_str(&contents)?
    };
    log_debug!("[Config] {} tool(s) configured", toolbox.tools.len());
    Ok(toolbox)
}

/// Serializes `value` as YAML into `path`, replacing the file.
pub fn save_yaml_file<T: Serialize>(path: &Path, value: &T) -> Result<(), FetchError> {
    let yaml = serde_yaml::to_string(value)?;
    fs::write(path, yaml)?;
    log_debug!("[Config] Wrote {}", path.display());
    Ok(())
}

/// Source and version settings of the `add` command.
#[derive(Debug, Clone, Default)]
pub struct ToolUpdate {
    pub github: String,
    pub google: String,
    pub download_url: String,
    pub version: String,
    pub additional: Vec<String>,
}

impl ToolUpdate {
    pub fn has_source(&self) -> bool {
        !self.github.is_empty() || !self.google.is_empty() || !self.download_url.is_empty()
    }
}

/// Adds tool `name`, or updates it if it already exists.
///
/// On update the given source replaces the configured one (google, then downloadURL, then
/// github decides which); version and additional names only change when given.
///
/// # Returns
/// `true` when an existing tool was updated, `false` when a new one was added.
pub fn add_or_update_tool(toolbox: &mut Toolbox, name: &str, update: ToolUpdate) -> Result<bool, FetchError> {
    if !update.has_source() {
        return Err(FetchError::Config(
            "either 'github', 'download-url' or 'google' must be defined".to_string(),
        ));
    }

    if let Some(tool) = toolbox.tools.get_mut(name) {
        log_info!("[Config] Updating tool {}", name.bold());
        tool.github.clear();
        tool.google.clear();
        tool.download_url.clear();
        if !update.google.is_empty() {
            tool.google = update.google;
        } else if !update.download_url.is_empty() {
            tool.download_url = update.download_url;
        } else {
            tool.github = update.github;
        }
        if !update.version.is_empty() {
            tool.version = update.version;
        }
        if !update.additional.is_empty() {
            tool.additional = update.additional;
        }
        return Ok(true);
    }

    log_info!("[Config] Adding tool {}", name.bold());
    toolbox.tools.insert(
        name.to_string(),
        Tool {
            github: update.github,
            google: update.google,
            download_url: update.download_url,
            version: update.version,
            additional: update.additional,
            ..Default::default()
        },
    );
    Ok(false)
}
