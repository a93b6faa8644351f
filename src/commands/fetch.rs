// This file contains the entry point of the `toolbox fetch` command.
// The actual work happens in `libs::fetch_orchestrator`; this layer only adds context to errors.

use crate::libs::fetch_orchestrator;
use crate::log_debug;
use anyhow::{Context, Result};

/// Runs a fetch for `tools` (all configured tools when empty).
///
/// # Arguments
/// * `config`: Optional path to a `.toolbox.yaml`.
/// * `tools`: Names of the tools to fetch.
pub fn run(config: Option<String>, tools: Vec<String>) -> Result<()> {
    log_debug!("Entered fetch::run() with config {:?} and tools {:?}", config, tools);
    fetch_orchestrator::run(config.as_deref(), &tools).context("fetching tools failed")
}
