// This module talks to the GitHub REST API to resolve the release a tool is installed from.
// It answers two questions: "what is the latest release of `owner/repo`?" and "what does the
// release tagged `v1.2.3` contain?". Repositories that only push tags (no formal releases)
// resolve to the highest stable semantic-version tag, without any assets.

use crate::libs::errors::FetchError;
use crate::libs::utilities::assets::user_agent;
use crate::schemas::release::{GithubError, GithubTag, Release, latest_stable_tag};
use crate::{log_debug, log_info};
// The 'colored' crate helps us make our console output look pretty and readable.
use colored::Colorize;
use serde::de::DeserializeOwned;
use std::env;
use std::time::Duration;

/// Environment variable holding an (optional) GitHub API token.
pub const ENV_GITHUB_TOKEN: &str = "GITHUB_TOKEN";

/// Public GitHub API root.
pub const GITHUB_API: &str = "https://api.github.com";

/// Where release metadata comes from. The installer is written against this trait.
pub trait ReleaseSource {
    /// The latest release of `repo` (`owner/name`).
    fn latest_release(&self, repo: &str) -> Result<Release, FetchError>;

    /// The release of `repo` tagged `tag`.
    fn release(&self, repo: &str, tag: &str) -> Result<Release, FetchError>;
}

/// True when a non-blank `GITHUB_TOKEN` is set.
pub fn token_set() -> bool {
    github_token().is_some()
}

fn github_token() -> Option<String> {
    env::var(ENV_GITHUB_TOKEN)
        .ok()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
}

/// `ReleaseSource` backed by the GitHub REST API.
pub struct GithubClient {
    agent: ureq::Agent,
    token: Option<String>,
    api_base: String,
}

impl GithubClient {
    /// Client for api.github.com, authenticated when `GITHUB_TOKEN` is set.
    pub fn new() -> Self {
        Self::with_base(GITHUB_API, github_token())
    }

    pub fn with_base(api_base: &str, token: Option<String>) -> Self {
        if token.is_some() {
            log_info!("[GitHub] Using github token");
        }
        let agent = ureq::AgentBuilder::new()
            .user_agent(&user_agent())
            .timeout_connect(Duration::from_secs(30))
            .build();
        GithubClient {
            agent,
            token,
            api_base: api_base.trim_end_matches('/').to_string(),
        }
    }

    pub fn latest_release_url(&self, repo: &str) -> String {
        format!("{}/repos/{}/releases/latest", self.api_base, repo)
    }

    pub fn release_url(&self, repo: &str, tag: &str) -> String {
        format!("{}/repos/{}/releases/tags/{}", self.api_base, repo, tag)
    }

    pub fn tags_url(&self, repo: &str) -> String {
        format!("{}/repos/{}/tags", self.api_base, repo)
    }

    /// GETs `url` and decodes the JSON body. A 404 is `Ok(None)`; other error statuses become
    /// `FetchError::Github` carrying GitHub's message.
    fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<Option<T>, FetchError> {
        log_debug!("[GitHub] GET {}", url.blue());
        let mut request = self.agent.get(url).set("Accept", "application/json");
        if let Some(token) = &self.token {
            request = request.set("Authorization", &format!("Bearer {token}"));
        }

        match request.call() {
            Ok(response) => Ok(Some(response.into_json()?)),
            Err(ureq::Error::Status(404, _)) => {
                log_debug!("[GitHub] {} returned 404", url);
                Ok(None)
            }
            Err(ureq::Error::Status(status, response)) => {
                let body: GithubError = response.into_json().unwrap_or_default();
                Err(FetchError::Github(body.describe(status)))
            }
            Err(transport) => Err(transport.into()),
        }
    }

    /// Highest stable semver tag of `repo`, as a release without assets.
    fn release_from_tags(&self, repo: &str) -> Result<Release, FetchError> {
        let tags: Vec<GithubTag> = self.get_json(&self.tags_url(repo))?.unwrap_or_default();
        let tag_name = latest_stable_tag(&tags)
            .map(|t| t.name.clone())
            .unwrap_or_default();
        log_debug!("[GitHub] No formal release for {}, latest tag is '{}'", repo, tag_name);
        Ok(Release {
            tag_name,
            ..Default::default()
        })
    }
}

impl Default for GithubClient {
    fn default() -> Self {
        Self::new()
    }
}

impl ReleaseSource for GithubClient {
    fn latest_release(&self, repo: &str) -> Result<Release, FetchError> {
        match self.get_json::<Release>(&self.latest_release_url(repo))? {
            Some(release) if !release.tag_name.is_empty() => Ok(release),
            _ => self.release_from_tags(repo),
        }
    }

    fn release(&self, repo: &str, tag: &str) -> Result<Release, FetchError> {
        match self.get_json::<Release>(&self.release_url(repo, tag))? {
            Some(release) if !release.tag_name.is_empty() => Ok(release),
            _ => {
                log_debug!("[GitHub] No release tagged {} in {}", tag, repo);
                Ok(Release {
                    tag_name: tag.to_string(),
                    ..Default::default()
                })
            }
        }
    }
}
