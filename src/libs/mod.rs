// Core of the fetch pipeline.

// Picks the release asset for the current platform.
pub mod asset_matcher;
// Finding, reading and writing `.toolbox.yaml`.
pub mod config_loading;
pub mod errors;
// Drives a whole `fetch` run.
pub mod fetch_orchestrator;
// Installs a single tool.
pub mod tool_installer;
pub mod utilities;
// `.toolbox-versions.yaml` in the target directory.
pub mod version_ledger;

#[cfg(test)]
pub mod test_support;
