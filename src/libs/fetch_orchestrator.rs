// This module drives a complete `toolbox fetch` run:
//
//  1. read the configuration and resolve the target directory
//  2. create the target directory (if allowed) and sweep executables renamed aside last time
//  3. load the version ledger
//  4. install every selected tool, carry the ledger version of every other tool forward
//  5. write the ledger and print a summary
//
// Tools are processed one after the other, in name order. The scratch directory for downloads
// lives in the system temp dir and is removed when the run ends, successful or not.

// Release metadata: the real GitHub client and the trait the installer works against.
use crate::installers::github::{GithubClient, ReleaseSource, token_set};
use crate::libs::asset_matcher::AssetMatcher;
// Finds and parses `.toolbox.yaml`.
use crate::libs::config_loading::read_toolbox;
use crate::libs::errors::{ErrorKind, FetchError};
// The per-tool install flow.
use crate::libs::tool_installer::{Installer, ToolOutcome, is_newer};
use crate::libs::utilities::assets::{Downloader, HttpDownloader};
use crate::libs::utilities::binary::sweep_old_binaries;
use crate::libs::utilities::path_helpers::sanitize_target;
use crate::libs::utilities::platform::{AliasTable, Platform};
use crate::libs::utilities::upx::Upx;
// Reads and writes `.toolbox-versions.yaml` in the target directory.
use crate::libs::version_ledger::{load_versions, save_versions};
use crate::schemas::toolbox::Toolbox;
// Our custom logging macros for nicely formatted output.
use crate::{log_debug, log_error, log_info, log_warn};
// The 'colored' crate helps us make our console output look pretty and readable.
use colored::Colorize;
// Renders the summary table at the end of a run.
use prettytable::{Table, row};
use std::env;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// Result of one tool in a run, as shown in the summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Installed,
    UpToDate,
    NotSelected,
    NotFound,
    Invalid,
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            RunStatus::Installed => "installed",
            RunStatus::UpToDate => "up to date",
            RunStatus::NotSelected => "not selected",
            RunStatus::NotFound => "not found",
            RunStatus::Invalid => "invalid",
        };
        f.write_str(text)
    }
}

impl From<ToolOutcome> for RunStatus {
    fn from(outcome: ToolOutcome) -> Self {
        match outcome {
            ToolOutcome::Installed => RunStatus::Installed,
            ToolOutcome::UpToDate => RunStatus::UpToDate,
            ToolOutcome::NotFound => RunStatus::NotFound,
        }
    }
}

/// One summary line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunRow {
    pub name: String,
    pub version: String,
    pub status: RunStatus,
}

/// Repository toolbox itself is released from.
pub const TOOLBOX_REPO: &str = "bakito/toolbox";

/// Tag of a toolbox release newer than `current`, if there is one.
/// The lookup never fails a run; problems are only logged.
pub fn newer_toolbox_release(releases: &dyn ReleaseSource, current: &str) -> Option<String> {
    match releases.latest_release(TOOLBOX_REPO) {
        Ok(release) if is_newer(&release.tag_name, current) => Some(release.tag_name),
        Ok(_) => None,
        Err(e) => {
            log_debug!("[Toolbox] Could not look up the latest toolbox release: {}", e);
            None
        }
    }
}

/// An empty selection selects every tool.
pub fn is_selected(selected: &[String], name: &str) -> bool {
    selected.is_empty() || selected.iter().any(|s| s == name)
}

/// Entry point of `toolbox fetch`.
pub fn run(config: Option<&str>, selected: &[String]) -> Result<(), FetchError> {
    let executable = env::current_exe()?;
    let executable = fs::canonicalize(&executable).unwrap_or(executable);
    let version = env!("CARGO_PKG_VERSION");
    log_info!("[Toolbox] toolbox {}", version.bold());

    let releases = GithubClient::new();
    if let Some(tag) = newer_toolbox_release(&releases, version) {
        log_warn!("[Toolbox] A new toolbox version is available {} (current: {})", tag.green(), version);
    }

    let (mut toolbox, config_path) = read_toolbox(config)?;
    log_debug!("[Toolbox] Using configuration {}", config_path.display());
    if toolbox.has_github_tools() && !token_set() {
        log_warn!("[Toolbox] When using github tools, defining a github token 'GITHUB_TOKEN' is recommended");
    }

    let fetcher = Fetcher {
        releases: &releases,
        downloader: &HttpDownloader::new(),
        platform: Platform::detect(),
        executable_path: executable,
    };
    let rows = fetcher.fetch(&mut toolbox, selected)?;
    print_summary(&rows);
    Ok(())
}

/// Everything a run needs besides the configuration itself.
pub struct Fetcher<'a> {
    pub releases: &'a dyn ReleaseSource,
    pub downloader: &'a dyn Downloader,
    pub platform: Platform,
    pub executable_path: PathBuf,
}

impl Fetcher<'_> {
    /// Installs the selected tools of `toolbox` and rewrites the ledger.
    pub fn fetch(&self, toolbox: &mut Toolbox, selected: &[String]) -> Result<Vec<RunRow>, FetchError> {
        toolbox.assign_names();
        // Target directory: expand `~`, create if allowed, drop leftovers of the last self-update.
        let target = sanitize_target(&toolbox.target);
        ensure_target_dir(&target, toolbox.create_target)?;
        sweep_old_binaries(&target)?;

        let upx = if toolbox.upx { Upx::detect() } else { None };
        let matcher = AssetMatcher::new(
            self.platform.clone(),
            AliasTable::with_overrides(toolbox.aliases.as_ref()),
            toolbox.excluded_suffixes.as_deref(),
        );
        let ledger = load_versions(&target)?;

        // Removed on drop, also when a tool fails.
        let scratch = tempfile::Builder::new().prefix("toolbox").tempdir()?;
        log_debug!("[Toolbox] Scratch directory {}", scratch.path().display());
        let installer = Installer::new(
            self.releases,
            self.downloader,
            matcher,
            &target,
            scratch.path(),
            &self.executable_path,
        )
        .with_upx(upx);

        let mut rows = Vec::with_capacity(toolbox.tools.len());
        for tool in toolbox.tools.values_mut() {
            if !tool.has_source() {
                log_warn!(
                    "[Toolbox] {} has neither github, google nor downloadURL configured, ignoring it",
                    tool.name.yellow()
                );
                continue;
            }

            let current = ledger.get(&tool.name).map(String::as_str);
            let status = if is_selected(selected, &tool.name) {
                match installer.handle_tool(current, tool) {
                    Ok(outcome) => outcome.into(),
                    Err(e) if e.kind() == ErrorKind::Validation => {
                        log_error!("[Toolbox] {} is invalid: {}", tool.name.red(), e);
                        tool.invalid = true;
                        RunStatus::Invalid
                    }
                    Err(e) => return Err(e),
                }
            } else {
                tool.version = current.unwrap_or_default().to_string();
                RunStatus::NotSelected
            };

            rows.push(RunRow {
                name: tool.name.clone(),
                version: if tool.is_recordable() { tool.version.clone() } else { String::new() },
                status,
            });
        }

        // Only reached when no tool failed the run.
        save_versions(&target, &toolbox.versions())?;
        Ok(rows)
    }
}

/// Creates the target directory when it is missing and creation is allowed (the default).
pub fn ensure_target_dir(target: &Path, create_target: Option<bool>) -> Result<(), FetchError> {
    if target.is_dir() {
        return Ok(());
    }
    if target.exists() {
        return Err(FetchError::Config(format!(
            "target {} exists but is not a directory",
            target.display()
        )));
    }
    if create_target.unwrap_or(true) {
        log_info!("[Toolbox] Creating target dir {}", target.display().to_string().cyan());
        fs::create_dir_all(target)?;
        Ok(())
    } else {
        Err(FetchError::Config(format!(
            "target dir {} does not exist and may not be created",
            target.display()
        )))
    }
}

/// Prints the per-tool table of a finished run.
pub fn print_summary(rows: &[RunRow]) {
    if rows.is_empty() {
        log_info!("[Toolbox] No tools configured");
        return;
    }
    let mut table = Table::new();
    table.set_titles(row![b->"Tool", b->"Version", b->"Result"]);
    for r in rows {
        table.add_row(row![r.name, r.version, r.status.to_string()]);
    }
    table.printstd();
}
