//! # GitHub Release Payloads
//!
//! The subset of the GitHub REST API responses the fetcher needs: a release with its tag and
//! downloadable assets, the tags listing used when a repository has no formal release, and the
//! error body GitHub returns on failures.

use serde::{Deserialize, Serialize};

/// A published release: its tag and the files attached to it.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Release {
    #[serde(default)]
    pub tag_name: String,
    #[serde(default)]
    pub assets: Vec<Asset>,
}

/// A single downloadable file of a release.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Asset {
    pub name: String,
    pub browser_download_url: String,
}

impl Asset {
    pub fn new(name: impl Into<String>, browser_download_url: impl Into<String>) -> Self {
        Asset {
            name: name.into(),
            browser_download_url: browser_download_url.into(),
        }
    }
}

/// One entry of `GET /repos/{repo}/tags`.
#[derive(Debug, Clone, Deserialize)]
pub struct GithubTag {
    pub name: String,
}

/// Error body returned by the GitHub API alongside non-success status codes.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GithubError {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub documentation_url: Option<String>,
}

impl GithubError {
    /// One-line description of a failed request that answered with `status`.
    pub fn describe(&self, status: u16) -> String {
        let mut text = if self.message.is_empty() {
            format!("HTTP {status}")
        } else {
            format!("{} (HTTP {status})", self.message)
        };
        if let Some(url) = self.documentation_url.as_deref().filter(|u| !u.is_empty()) {
            text.push_str(", see ");
            text.push_str(url);
        }
        text
    }
}

/// Parses a tag as a semantic version, accepting an optional leading `v`.
pub fn parse_tag_version(tag: &str) -> Option<semver::Version> {
    semver::Version::parse(tag.strip_prefix('v').unwrap_or(tag)).ok()
}

/// Picks the highest tag that is a valid semantic version without a pre-release part.
pub fn latest_stable_tag(tags: &[GithubTag]) -> Option<&GithubTag> {
    tags.iter()
        .filter_map(|tag| parse_tag_version(&tag.name).map(|v| (v, tag)))
        .filter(|(v, tag)| v.pre.is_empty() && !tag.name.contains('-'))
        .max_by(|(a, _), (b, _)| a.cmp(b))
        .map(|(_, tag)| tag)
}
