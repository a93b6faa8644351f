// This module installs a single tool. For every tool the flow is:
//
//   resolve version -> skip if current -> download -> extract -> locate binary
//   -> move the running executable aside (self-update) -> copy into place
//   -> optional upx compression -> validation
//
// Connectivity problems (GitHub API, downloads) and broken templates are returned as errors
// that end the run. A tool without a matching asset or binary comes back as
// `ToolOutcome::NotFound`; a failed validation comes back as a `FetchError::Validation`,
// which the orchestrator turns into the tool's `invalid` flag.

// The two ways a tool can be sourced: a GitHub release, or a download URL template.
use crate::installers::github::ReleaseSource;
use crate::installers::url::render_template;
use crate::libs::asset_matcher::AssetMatcher;
use crate::libs::errors::FetchError;
// The individual install steps.
use crate::libs::utilities::assets::{Downloader, file_name_from_url};
use crate::libs::utilities::binary::{copy_file, find_binary, make_executable, rename_if_running};
use crate::libs::utilities::compression::extract_archive;
use crate::libs::utilities::platform::{Platform, normalize_arch};
use crate::libs::utilities::upx::Upx;
use crate::libs::utilities::validation::validate;
use crate::schemas::release::{Release, parse_tag_version};
use crate::schemas::toolbox::Tool;
// Our custom logging macros for nicely formatted output.
use crate::{log_debug, log_info, log_warn};
// The 'colored' crate helps us make our console output look pretty and readable.
use colored::Colorize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// What happened to a tool that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolOutcome {
    /// A new binary was installed.
    Installed,
    /// The ledger already records the resolved (or a newer) version.
    UpToDate,
    /// No asset or binary matched this platform.
    NotFound,
}

/// True if `installed` is a strictly newer semantic version than `resolved`.
/// Versions that do not parse as semver never count as newer.
pub fn is_newer(installed: &str, resolved: &str) -> bool {
    match (parse_tag_version(installed), parse_tag_version(resolved)) {
        (Some(installed), Some(resolved)) => installed > resolved,
        _ => false,
    }
}

/// Installs tools into one target directory for the duration of a fetch run.
pub struct Installer<'a> {
    releases: &'a dyn ReleaseSource,
    downloader: &'a dyn Downloader,
    matcher: AssetMatcher,
    target_dir: PathBuf,
    temp_dir: PathBuf,
    executable_path: PathBuf,
    upx: Option<Upx>,
    system_arch: String,
}

impl<'a> Installer<'a> {
    /// # Arguments
    /// * `target_dir`: where binaries are installed.
    /// * `temp_dir`: private scratch directory of this run; one subdirectory per download.
    /// * `executable_path`: path of the running executable, for self-replacement.
    pub fn new(
        releases: &'a dyn ReleaseSource,
        downloader: &'a dyn Downloader,
        matcher: AssetMatcher,
        target_dir: impl Into<PathBuf>,
        temp_dir: impl Into<PathBuf>,
        executable_path: impl Into<PathBuf>,
    ) -> Self {
        Installer {
            releases,
            downloader,
            matcher,
            target_dir: target_dir.into(),
            temp_dir: temp_dir.into(),
            executable_path: executable_path.into(),
            upx: None,
            system_arch: normalize_arch(env::consts::ARCH),
        }
    }

    /// Compress installed binaries with `upx` (tools with `skipUpx` excepted).
    pub fn with_upx(mut self, upx: Option<Upx>) -> Self {
        self.upx = upx;
        self
    }

    fn platform(&self) -> &Platform {
        self.matcher.platform()
    }

    /// Brings `tool` up to date.
    ///
    /// `current` is the version the ledger records for this tool. On return `tool.version`
    /// holds the version that should be recorded, and `could_not_be_found` is set when the
    /// outcome is [`ToolOutcome::NotFound`].
    pub fn handle_tool(&self, current: Option<&str>, tool: &mut Tool) -> Result<ToolOutcome, FetchError> {
        log_info!("[Installer] Processing {}", tool.name.bold());
        let outcome = self.resolve_and_install(current.unwrap_or(""), tool)?;
        tool.could_not_be_found = outcome == ToolOutcome::NotFound;
        Ok(outcome)
    }

    fn resolve_and_install(&self, current: &str, tool: &mut Tool) -> Result<ToolOutcome, FetchError> {
        let configured = tool.version.clone();

        let mut release = None;
        if !tool.github.is_empty() {
            let resolved = if configured.is_empty() {
                self.releases.latest_release(&tool.github)?
            } else {
                self.releases.release(&tool.github, &configured)?
            };
            if tool.version.is_empty() {
                tool.version = resolved.tag_name.clone();
                log_latest_version(&tool.version, current);
            }
            release = Some(resolved);
        }

        if is_newer(current, &tool.version) {
            log_info!(
                "[Installer] Skipping since newer version {} is installed",
                current.green()
            );
            tool.version = current.to_string();
            return Ok(ToolOutcome::UpToDate);
        }

        if !current.is_empty() && tool.version == current {
            if configured.is_empty() {
                log_info!("[Installer] Skipping since already latest version");
            } else {
                log_info!("[Installer] Skipping since already configured version {}", configured);
            }
            return Ok(ToolOutcome::UpToDate);
        }

        if let Some(template) = tool.download_template().map(str::to_string) {
            return self.install_from_url(current, tool, &template);
        }
        if let Some(release) = release {
            return self.install_from_release(tool, &release);
        }

        log_warn!("[Installer] {} has no usable source", tool.name);
        Ok(ToolOutcome::NotFound)
    }

    fn install_from_url(&self, current: &str, tool: &mut Tool, template: &str) -> Result<ToolOutcome, FetchError> {
        if tool.version.starts_with("http") {
            tool.version = self.downloader.get_text(&tool.version)?;
            log_latest_version(&tool.version, current);
            if !current.is_empty() && tool.version == current {
                log_info!("[Installer] Skipping since already latest version");
                return Ok(ToolOutcome::UpToDate);
            }
        }

        let url = render_template(template, &tool.version, self.platform())?;
        let name = tool.name.clone();
        if self.fetch_tool(tool, &name, &url)? {
            Ok(ToolOutcome::Installed)
        } else {
            Ok(ToolOutcome::NotFound)
        }
    }

    fn install_from_release(&self, tool: &Tool, release: &Release) -> Result<ToolOutcome, FetchError> {
        let mut found = false;

        match self.matcher.find_matching(&tool.name, &release.assets) {
            Some(asset) => found |= self.fetch_tool(tool, &tool.name, &asset.browser_download_url)?,
            None => log_debug!("[Installer] No asset for {} in release {}", tool.name, release.tag_name),
        }

        for additional in &tool.additional {
            match self.matcher.find_matching(additional, &release.assets) {
                Some(asset) => found |= self.fetch_tool(tool, additional, &asset.browser_download_url)?,
                None => log_debug!("[Installer] No asset for additional {}", additional),
            }
        }

        if found {
            Ok(ToolOutcome::Installed)
        } else {
            log_warn!(
                "[Installer] Couldn't find a file for {} in release {}",
                tool.name.red(),
                release.tag_name
            );
            Ok(ToolOutcome::NotFound)
        }
    }

    /// Downloads `url` and installs the binary `file_name` from it.
    /// Returns `false` when the download holds no such binary.
    fn fetch_tool(&self, tool: &Tool, file_name: &str, url: &str) -> Result<bool, FetchError> {
        let dir = self.temp_dir.join(file_name);
        fs::create_dir_all(&dir)?;
        let download_name = file_name_from_url(url);
        let download_path = dir.join(download_name);
        self.downloader.download(url, &download_path)?;

        let extracted = extract_archive(&download_path, &dir)?;
        let search_name = if extracted { file_name } else { download_name };
        let Some(source) = find_binary(&dir, search_name, self.platform())? else {
            log_warn!("[Installer] Could not find {} in the download", search_name.red());
            return Ok(false);
        };

        let target = self.target_dir.join(self.platform().binary_name(file_name));
        rename_if_running(&target, &self.executable_path)?;
        copy_file(&source, &target)?;
        make_executable(&target)?;
        self.post_process(tool, &target);
        validate(&target, &tool.check, &self.system_arch)?;

        log_info!("[Installer] Installed {}", target.display().to_string().green());
        Ok(true)
    }

    fn post_process(&self, tool: &Tool, target: &Path) {
        let Some(upx) = &self.upx else {
            return;
        };
        if tool.skip_upx {
            log_info!("[Upx] Skipping upx compression for {}", tool.name);
        } else {
            upx.compress(target);
        }
    }
}

fn log_latest_version(version: &str, current: &str) {
    if !current.is_empty() && version != current {
        log_info!("[Installer] Latest Version: {} (current: {})", version.green(), current);
    } else {
        log_info!("[Installer] Latest Version: {}", version.green());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::libs::errors::ErrorKind;
    use crate::libs::test_support::{FakeDownloader, FakeReleases, linux_matcher};
    use crate::libs::utilities::binary::sweep_old_binaries;
    use crate::schemas::toolbox::Toolbox;
    use tempfile::TempDir;

    struct Dirs {
        _tmp: TempDir,
        target: PathBuf,
        scratch: PathBuf,
        exe: PathBuf,
    }

    fn dirs() -> Dirs {
        let tmp = TempDir::new().unwrap();
        let target = tmp.path().join("tools");
        let scratch = tmp.path().join("scratch");
        fs::create_dir_all(&target).unwrap();
        fs::create_dir_all(&scratch).unwrap();
        let exe = tmp.path().join("toolbox-under-test");
        Dirs {
            _tmp: tmp,
            target,
            scratch,
            exe,
        }
    }

    fn installer<'a>(releases: &'a FakeReleases, downloader: &'a FakeDownloader, d: &Dirs) -> Installer<'a> {
        Installer::new(releases, downloader, linux_matcher(), &d.target, &d.scratch, &d.exe)
    }

    fn github_tool(name: &str, repo: &str) -> Tool {
        Tool {
            name: name.to_string(),
            github: repo.to_string(),
            ..Default::default()
        }
    }

    fn foo_release() -> FakeReleases {
        FakeReleases::with("org/foo", "v1.2.0", &["foo_linux_amd64", "foo_darwin_amd64", "foo.sha256"])
    }

    #[test]
    fn installs_latest_release_and_records_its_tag() {
        let d = dirs();
        let releases = foo_release();
        let downloader = FakeDownloader::new();
        let mut tool = github_tool("foo", "org/foo");

        let outcome = installer(&releases, &downloader, &d).handle_tool(None, &mut tool).unwrap();

        assert_eq!(outcome, ToolOutcome::Installed);
        assert_eq!(
            *downloader.downloads.borrow(),
            vec!["https://example.test/org/foo/v1.2.0/foo_linux_amd64".to_string()]
        );
        let installed = d.target.join(Platform::new("linux", "amd64").binary_name("foo"));
        assert_eq!(fs::read(&installed).unwrap(), downloader.payload);
        assert_eq!(tool.version, "v1.2.0");

        let mut tb = Toolbox::default();
        tb.tools.insert("foo".into(), tool);
        assert_eq!(tb.versions().versions.get("foo").map(String::as_str), Some("v1.2.0"));
    }

    fn assert_nested_archive_installed(asset: &str) {
        let d = dirs();
        let releases = FakeReleases::with("org/foo", "v1.2.0", &[asset, "foo_darwin_amd64.tar.gz", "checksums.txt"]);
        let downloader = FakeDownloader::archived("foo-1.2.0/bin/foo");
        let mut tool = github_tool("foo", "org/foo");

        let outcome = installer(&releases, &downloader, &d).handle_tool(None, &mut tool).unwrap();

        assert_eq!(outcome, ToolOutcome::Installed);
        assert_eq!(downloader.count(), 1);
        assert!(d.scratch.join("foo").join(asset).is_file());
        assert!(d.scratch.join("foo/foo-1.2.0/bin/foo").is_file());
        assert_eq!(fs::read(d.target.join("foo")).unwrap(), downloader.payload);
        assert!(!d.target.join(asset).exists());
        assert_eq!(tool.version, "v1.2.0");
        assert!(tool.is_recordable());
    }

    #[test]
    fn installs_binary_nested_in_tar_gz() {
        assert_nested_archive_installed("foo_linux_amd64.tar.gz");
    }

    #[test]
    fn installs_binary_nested_in_zip() {
        assert_nested_archive_installed("foo_linux_amd64.zip");
    }

    #[test]
    fn archive_without_the_binary_is_not_found() {
        let d = dirs();
        let releases = FakeReleases::with("org/foo", "v1.2.0", &["foo_linux_amd64.tar.gz"]);
        let downloader = FakeDownloader::archived("foo-1.2.0/README");
        let mut tool = github_tool("foo", "org/foo");

        let outcome = installer(&releases, &downloader, &d).handle_tool(None, &mut tool).unwrap();
        assert_eq!(outcome, ToolOutcome::NotFound);
        assert!(tool.could_not_be_found);
        assert!(!d.target.join("foo").exists());
    }

    #[cfg(unix)]
    #[test]
    fn upx_runs_on_installed_binaries_unless_skipped() {
        use crate::libs::test_support::{fake_upx, upx_calls};

        let d = dirs();
        let upx_dir = TempDir::new().unwrap();
        // a failing packer only warns
        let script = fake_upx(upx_dir.path(), 1, "");
        let upx = Upx::detect_program(script.to_str().unwrap());
        assert!(upx.is_some());

        let mut releases = foo_release();
        releases.add("org/bar", "v0.3.0", &["bar_linux_amd64"]);
        let downloader = FakeDownloader::new();
        let inst = installer(&releases, &downloader, &d).with_upx(upx);

        let mut foo = github_tool("foo", "org/foo");
        foo.skip_upx = true;
        assert_eq!(inst.handle_tool(None, &mut foo).unwrap(), ToolOutcome::Installed);
        assert!(upx_calls(upx_dir.path()).is_empty());

        let mut bar = github_tool("bar", "org/bar");
        assert_eq!(inst.handle_tool(None, &mut bar).unwrap(), ToolOutcome::Installed);
        let calls = upx_calls(upx_dir.path());
        assert_eq!(calls.len(), 1);
        assert!(calls[0].ends_with(&d.target.join("bar").display().to_string()));
    }

    #[test]
    fn second_run_without_upstream_change_downloads_nothing() {
        let d = dirs();
        let releases = foo_release();
        let downloader = FakeDownloader::new();
        let inst = installer(&releases, &downloader, &d);

        let mut first = github_tool("foo", "org/foo");
        inst.handle_tool(None, &mut first).unwrap();
        assert_eq!(downloader.count(), 1);

        let mut second = github_tool("foo", "org/foo");
        let outcome = inst.handle_tool(Some(&first.version), &mut second).unwrap();
        assert_eq!(outcome, ToolOutcome::UpToDate);
        assert_eq!(downloader.count(), 1);
        assert_eq!(second.version, first.version);
    }

    #[test]
    fn newer_installed_version_is_kept() {
        let d = dirs();
        let releases = foo_release();
        let downloader = FakeDownloader::new();
        let mut tool = github_tool("foo", "org/foo");

        let outcome = installer(&releases, &downloader, &d)
            .handle_tool(Some("v1.3.0"), &mut tool)
            .unwrap();
        assert_eq!(outcome, ToolOutcome::UpToDate);
        assert_eq!(downloader.count(), 0);
        assert_eq!(tool.version, "v1.3.0");
    }

    #[test]
    fn running_executable_is_renamed_aside_before_overwrite() {
        let d = dirs();
        let releases = FakeReleases::with("org/toolbox", "v2.0.0", &["toolbox_linux_amd64"]);
        let downloader = FakeDownloader::new();
        let running = d.target.join(Platform::new("linux", "amd64").binary_name("toolbox"));
        fs::write(&running, b"old build").unwrap();
        let inst = Installer::new(&releases, &downloader, linux_matcher(), &d.target, &d.scratch, &running);

        let mut tool = github_tool("toolbox", "org/toolbox");
        assert_eq!(inst.handle_tool(None, &mut tool).unwrap(), ToolOutcome::Installed);

        let old = d.target.join(format!(".toolbox-old.{}", running.file_name().unwrap().to_string_lossy()));
        assert_eq!(fs::read(&old).unwrap(), b"old build");
        assert_eq!(fs::read(&running).unwrap(), downloader.payload);

        // the next run starts by sweeping it
        sweep_old_binaries(&d.target).unwrap();
        assert!(!old.exists());
        assert!(running.exists());
    }

    #[test]
    fn missing_asset_is_not_found_and_not_recorded() {
        let d = dirs();
        let releases = FakeReleases::with("org/foo", "v1.2.0", &["foo_darwin_arm64.tar.gz", "foo.sha256"]);
        let downloader = FakeDownloader::new();
        let mut tool = github_tool("foo", "org/foo");

        let outcome = installer(&releases, &downloader, &d).handle_tool(None, &mut tool).unwrap();
        assert_eq!(outcome, ToolOutcome::NotFound);
        assert!(tool.could_not_be_found);
        assert!(!tool.is_recordable());
        assert_eq!(downloader.count(), 0);
    }

    #[test]
    fn pinned_version_without_release_is_not_found() {
        let d = dirs();
        let releases = foo_release();
        let downloader = FakeDownloader::new();
        let mut tool = github_tool("foo", "org/foo");
        tool.version = "v0.9.0".into();

        let outcome = installer(&releases, &downloader, &d).handle_tool(None, &mut tool).unwrap();
        assert_eq!(outcome, ToolOutcome::NotFound);
        assert_eq!(tool.version, "v0.9.0");
    }

    #[test]
    fn additional_assets_are_installed_alongside() {
        let d = dirs();
        let releases = FakeReleases::with(
            "org/foo",
            "v1.2.0",
            &["foo_linux_amd64", "foo-helper_linux_amd64", "foo-helper_darwin_amd64"],
        );
        let downloader = FakeDownloader::new();
        let mut tool = github_tool("foo", "org/foo");
        tool.additional = vec!["foo-helper".into()];

        let outcome = installer(&releases, &downloader, &d).handle_tool(None, &mut tool).unwrap();
        assert_eq!(outcome, ToolOutcome::Installed);
        assert_eq!(downloader.count(), 2);
        assert!(d.target.join("foo").exists());
        assert!(d.target.join("foo-helper").exists());
    }

    #[test]
    fn url_tool_resolves_version_from_endpoint() {
        let d = dirs();
        let releases = FakeReleases::default();
        let mut downloader = FakeDownloader::new();
        downloader.text = "v2.0.0".into();
        let inst = installer(&releases, &downloader, &d);
        let template = "https://example.test/{{.Version}}/{{.OS}}/{{.Arch}}/mytool{{.FileExt}}";

        let mut tool = Tool {
            name: "mytool".into(),
            download_url: template.into(),
            version: "https://example.test/stable.txt".into(),
            ..Default::default()
        };
        assert_eq!(inst.handle_tool(None, &mut tool).unwrap(), ToolOutcome::Installed);
        assert_eq!(tool.version, "v2.0.0");
        assert_eq!(
            *downloader.downloads.borrow(),
            vec!["https://example.test/v2.0.0/linux/amd64/mytool".to_string()]
        );
        assert!(d.target.join("mytool").exists());

        let mut again = Tool {
            name: "mytool".into(),
            download_url: template.into(),
            version: "https://example.test/stable.txt".into(),
            ..Default::default()
        };
        assert_eq!(inst.handle_tool(Some("v2.0.0"), &mut again).unwrap(), ToolOutcome::UpToDate);
        assert_eq!(downloader.count(), 1);
    }

    #[test]
    fn failing_check_is_a_validation_error() {
        let d = dirs();
        let releases = foo_release();
        let downloader = FakeDownloader::new();
        let mut tool = github_tool("foo", "org/foo");
        // the installed "binary" is the test harness, which rejects unknown flags
        tool.check = "--no-such-harness-flag".into();

        let err = installer(&releases, &downloader, &d).handle_tool(None, &mut tool).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn release_api_errors_abort() {
        let d = dirs();
        let releases = FakeReleases::default();
        let downloader = FakeDownloader::new();
        let mut tool = github_tool("foo", "org/missing");

        let err = installer(&releases, &downloader, &d).handle_tool(None, &mut tool).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Generic);
    }

    #[test]
    fn semver_guard_ignores_non_semver() {
        assert!(is_newer("v1.3.0", "v1.2.0"));
        assert!(is_newer("1.3.0", "v1.2.0"));
        assert!(!is_newer("v1.2.0", "v1.3.0"));
        assert!(!is_newer("latest", "v1.2.0"));
        assert!(!is_newer("", "v1.2.0"));
    }
}
