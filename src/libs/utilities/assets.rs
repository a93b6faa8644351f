// Downloading release assets and plain-text version endpoints over HTTP.
//
// The installer only sees the `Downloader` trait, so tests can serve files from memory
// instead of the network.

use crate::libs::errors::FetchError;
use crate::{log_debug, log_info};
// The 'colored' crate helps us make our console output look pretty and readable.
use colored::Colorize;
use std::fs::{self, File};
use std::io;
use std::path::Path;
use std::time::Duration;

/// User-Agent sent with every request.
pub fn user_agent() -> String {
    format!("toolbox/{}", env!("CARGO_PKG_VERSION"))
}

/// Fetches remote content for the installer.
pub trait Downloader {
    /// Streams `url` into the file `dest`, creating parent directories as needed.
    fn download(&self, url: &str, dest: &Path) -> Result<(), FetchError>;

    /// Returns the response body of `url` as text.
    fn get_text(&self, url: &str) -> Result<String, FetchError>;
}

/// `Downloader` backed by a blocking `ureq` agent.
pub struct HttpDownloader {
    agent: ureq::Agent,
}

impl HttpDownloader {
    pub fn new() -> Self {
        let agent = ureq::AgentBuilder::new()
            .user_agent(&user_agent())
            .timeout_connect(Duration::from_secs(30))
            .build();
        HttpDownloader { agent }
    }
}

impl Default for HttpDownloader {
    fn default() -> Self {
        Self::new()
    }
}

impl Downloader for HttpDownloader {
    fn download(&self, url: &str, dest: &Path) -> Result<(), FetchError> {
        log_info!("[Download] Downloading {}", url.blue());
        let response = self.agent.get(url).call()?;

        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut file = File::create(dest)?;
        let mut reader = response.into_reader();
        let written = io::copy(&mut reader, &mut file)?;

        log_debug!(
            "[Download] Saved {} bytes to {}",
            written,
            dest.display().to_string().green()
        );
        Ok(())
    }

    fn get_text(&self, url: &str) -> Result<String, FetchError> {
        log_debug!("[Download] GET {}", url.blue());
        let body = self.agent.get(url).call()?.into_string()?;
        Ok(body)
    }
}

/// The file name a download of `url` is stored under: the last path segment, without query
/// string or fragment.
pub fn file_name_from_url(url: &str) -> &str {
    let without_query = url.split(['?', '#']).next().unwrap_or(url);
    without_query.rsplit('/').next().unwrap_or(without_query)
}
