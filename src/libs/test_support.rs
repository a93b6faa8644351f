// Fakes for the network-facing traits, shared by the installer and orchestrator tests.

use crate::installers::github::ReleaseSource;
use crate::libs::asset_matcher::AssetMatcher;
use crate::libs::errors::FetchError;
use crate::libs::utilities::assets::Downloader;
use crate::libs::utilities::compression::ArchiveKind;
use crate::libs::utilities::platform::{AliasTable, Platform};
use crate::schemas::release::{Asset, Release};
use flate2::Compression;
use flate2::write::GzEncoder;
use std::cell::RefCell;
use std::collections::HashMap;
use std::env;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use zip::write::FileOptions;

/// Serves canned releases per repository.
#[derive(Default)]
pub struct FakeReleases {
    pub releases: HashMap<String, Release>,
}

impl FakeReleases {
    pub fn with(repo: &str, tag: &str, assets: &[&str]) -> Self {
        let mut fake = FakeReleases::default();
        fake.add(repo, tag, assets);
        fake
    }

    pub fn add(&mut self, repo: &str, tag: &str, assets: &[&str]) {
        let assets = assets
            .iter()
            .map(|n| Asset::new(*n, format!("https://example.test/{repo}/{tag}/{n}")))
            .collect();
        self.releases.insert(
            repo.to_string(),
            Release {
                tag_name: tag.to_string(),
                assets,
                ..Default::default()
            },
        );
    }
}

impl ReleaseSource for FakeReleases {
    fn latest_release(&self, repo: &str) -> Result<Release, FetchError> {
        self.releases
            .get(repo)
            .cloned()
            .ok_or_else(|| FetchError::Github(format!("Not Found: {repo}")))
    }

    fn release(&self, repo: &str, tag: &str) -> Result<Release, FetchError> {
        match self.releases.get(repo) {
            Some(release) if release.tag_name == tag => Ok(release.clone()),
            _ => Ok(Release {
                tag_name: tag.to_string(),
                ..Default::default()
            }),
        }
    }
}

/// Every download is a copy of the running test binary, so the arch check passes on any host.
///
/// Downloads whose name ends in `.tar.gz`/`.tgz` or `.zip` are served as an archive holding the
/// payload at `archive_entry`; everything else is the bare payload.
pub struct FakeDownloader {
    pub payload: Vec<u8>,
    pub text: String,
    pub archive_entry: String,
    pub downloads: RefCell<Vec<String>>,
}

impl FakeDownloader {
    pub fn new() -> Self {
        FakeDownloader {
            payload: fs::read(env::current_exe().unwrap()).unwrap(),
            text: String::new(),
            archive_entry: "bin/tool".to_string(),
            downloads: RefCell::new(Vec::new()),
        }
    }

    /// Serves archives with the payload stored at `entry`, e.g. `foo-1.2.0/bin/foo`.
    pub fn archived(entry: &str) -> Self {
        FakeDownloader {
            archive_entry: entry.to_string(),
            ..Self::new()
        }
    }

    pub fn count(&self) -> usize {
        self.downloads.borrow().len()
    }
}

impl Downloader for FakeDownloader {
    fn download(&self, url: &str, dest: &Path) -> Result<(), FetchError> {
        self.downloads.borrow_mut().push(url.to_string());
        match ArchiveKind::from_path(dest) {
            None => fs::write(dest, &self.payload)?,
            Some(ArchiveKind::TarGz) => write_tar_gz(dest, &self.archive_entry, &self.payload)?,
            Some(ArchiveKind::Zip) => write_zip(dest, &self.archive_entry, &self.payload)?,
            Some(kind) => {
                return Err(io::Error::new(io::ErrorKind::Unsupported, format!("fake cannot build {kind:?}")).into());
            }
        }
        Ok(())
    }

    fn get_text(&self, _url: &str) -> Result<String, FetchError> {
        Ok(self.text.clone())
    }
}

fn write_tar_gz(dest: &Path, entry: &str, data: &[u8]) -> io::Result<()> {
    let mut header = tar::Header::new_gnu();
    header.set_size(data.len() as u64);
    header.set_mode(0o755);
    header.set_entry_type(tar::EntryType::Regular);
    let mut builder = tar::Builder::new(GzEncoder::new(File::create(dest)?, Compression::fast()));
    builder.append_data(&mut header, entry, data)?;
    builder.into_inner()?.finish()?;
    Ok(())
}

fn write_zip(dest: &Path, entry: &str, data: &[u8]) -> io::Result<()> {
    let mut zip = zip::ZipWriter::new(File::create(dest)?);
    zip.start_file(entry, FileOptions::default().unix_permissions(0o755))
        .map_err(io::Error::other)?;
    zip.write_all(data)?;
    zip.finish().map_err(io::Error::other)?;
    Ok(())
}

/// Writes a stand-in `upx` script into `dir`. It answers `--version`, records every
/// compression request in `<dir>/upx-calls`, and otherwise exits with `exit_code`.
#[cfg(unix)]
pub fn fake_upx(dir: &Path, exit_code: i32, stdout: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let script = dir.join("fake-upx");
    let calls = dir.join("upx-calls");
    let body = format!(
        "#!/bin/sh\nif [ \"$1\" = \"--version\" ]; then echo 'upx 4.2.4'; exit 0; fi\n\
         echo \"$@\" >> '{}'\nprintf '%s' '{}'\nexit {}\n",
        calls.display(),
        stdout,
        exit_code
    );
    fs::write(&script, body).unwrap();
    fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();
    script
}

/// Compression requests a [`fake_upx`] in `dir` received.
#[cfg(unix)]
pub fn upx_calls(dir: &Path) -> Vec<String> {
    fs::read_to_string(dir.join("upx-calls"))
        .map(|s| s.lines().map(str::to_string).collect())
        .unwrap_or_default()
}

pub fn linux_matcher() -> AssetMatcher {
    AssetMatcher::new(Platform::new("linux", "amd64"), AliasTable::default(), None)
}
