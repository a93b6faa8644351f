//! # Add Command Implementation
//!
//! Adds a tool to `.toolbox.yaml`, or updates the source, version and additional names of a
//! tool that is already configured. The configuration is looked up the same way `fetch` does
//! and rewritten in place.

use crate::libs::config_loading::{ToolUpdate, add_or_update_tool, read_toolbox, save_yaml_file};
use crate::log_info;
use anyhow::{Context, Result};
use colored::Colorize;

/// Flags of `toolbox add`.
#[derive(Debug, Clone, Default)]
pub struct AddArgs {
    pub name: String,
    pub config: Option<String>,
    pub github: Option<String>,
    pub google: Option<String>,
    pub download_url: Option<String>,
    pub version: Option<String>,
    pub additional: Vec<String>,
}

pub fn run(args: AddArgs) -> Result<()> {
    let (mut toolbox, path) = read_toolbox(args.config.as_deref())?;

    let update = ToolUpdate {
        github: args.github.unwrap_or_default(),
        google: args.google.unwrap_or_default(),
        download_url: args.download_url.unwrap_or_default(),
        version: args.version.unwrap_or_default(),
        additional: args.additional,
    };
    add_or_update_tool(&mut toolbox, &args.name, update)
        .with_context(|| format!("cannot add tool '{}'", args.name))?;

    log_info!("[Config] Saving config {}", path.display().to_string().cyan());
    save_yaml_file(&path, &toolbox).with_context(|| format!("cannot write {}", path.display()))?;
    Ok(())
}
