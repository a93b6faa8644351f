//! # Toolbox Configuration Schema (`.toolbox.yaml`)
//!
//! This module defines the configuration the fetcher works from, and the version ledger
//! (`.toolbox-versions.yaml`) it persists in the target directory between runs.
//!
//! ## Usage Example
//!
//! ```yaml
//! target: ~/bin
//! upx: true
//! tools:
//!   kubectl:
//!     downloadURL: https://dl.k8s.io/release/{{.Version}}/bin/{{.OS}}/{{.Arch}}/kubectl{{.FileExt}}
//!     version: https://dl.k8s.io/release/stable.txt
//!   golangci-lint:
//!     github: golangci/golangci-lint
//!     check: --version
//!   helm:
//!     github: helm/helm
//!     version: v3.14.0
//!     skipUpx: true
//! ```

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Default target directory when none is configured.
pub const DEFAULT_TARGET: &str = "./tools";

/// Root of `.toolbox.yaml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Toolbox {
    /// Tools keyed by name. A `BTreeMap` keeps them in the alphabetical processing order.
    #[serde(default)]
    pub tools: BTreeMap<String, Tool>,

    /// Directory binaries are installed into (`./tools` when empty).
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub target: String,

    /// Compress installed binaries with `upx` when it is available.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub upx: bool,

    /// Whether a missing target directory may be created (defaults to true).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub create_target: Option<bool>,

    /// Per-token replacement of the built-in platform aliases.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aliases: Option<HashMap<String, Vec<String>>>,

    /// Replaces the default list of asset-name suffixes that are never installed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub excluded_suffixes: Option<Vec<String>>,
}

/// A single tool definition.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Tool {
    /// Defaults to the map key; also the installed executable name.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,

    /// GitHub repository (`owner/repo`) whose releases provide the binary.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub github: String,

    /// Google-hosted download URL template.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub google: String,

    /// Arbitrary download URL template.
    #[serde(rename = "downloadURL", default, skip_serializing_if = "String::is_empty")]
    pub download_url: String,

    /// Pinned version/tag, empty for "latest", or (URL tools) a URL returning the version.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub version: String,

    /// Extra asset names fetched from the same GitHub release.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub additional: Vec<String>,

    /// Arguments the installed binary is executed with to prove it runs.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub check: String,

    /// Opt this tool out of `upx` compression.
    #[serde(rename = "skipUpx", default, skip_serializing_if = "std::ops::Not::not")]
    pub skip_upx: bool,

    /// Set during a run when no matching asset or binary was found.
    #[serde(skip)]
    pub could_not_be_found: bool,

    /// Set during a run when the installed binary failed validation.
    #[serde(skip)]
    pub invalid: bool,
}

impl Tool {
    pub fn has_source(&self) -> bool {
        !self.github.is_empty() || !self.google.is_empty() || !self.download_url.is_empty()
    }

    /// The download URL template, if the tool is not purely GitHub-sourced.
    /// `downloadURL` wins over `google` when both are set.
    pub fn download_template(&self) -> Option<&str> {
        [&self.download_url, &self.google]
            .into_iter()
            .find(|u| !u.is_empty())
            .map(String::as_str)
    }

    /// Whether this tool's version belongs in the ledger after the run.
    pub fn is_recordable(&self) -> bool {
        self.has_source() && !self.could_not_be_found && !self.invalid && !self.version.is_empty()
    }
}

impl Toolbox {
    /// Fills empty tool names from their map keys.
    pub fn assign_names(&mut self) {
        for (key, tool) in self.tools.iter_mut() {
            if tool.name.is_empty() {
                tool.name = key.clone();
            }
        }
    }

    pub fn has_github_tools(&self) -> bool {
        self.tools.values().any(|t| !t.github.is_empty())
    }

    /// Ledger content for the current state of the tools.
    pub fn versions(&self) -> Versions {
        Versions {
            versions: self
                .tools
                .values()
                .filter(|t| t.is_recordable())
                .map(|t| (t.name.clone(), t.version.clone()))
                .collect(),
        }
    }
}

/// Content of `.toolbox-versions.yaml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Versions {
    #[serde(default)]
    pub versions: BTreeMap<String, String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_camel_case_fields() {
        let yaml = r#"
target: ~/bin
upx: true
createTarget: false
excludedSuffixes: [".sha256"]
aliases:
  amd64: [x86_64]
tools:
  kubectl:
    downloadURL: https://dl.k8s.io/{{.Version}}/kubectl
    version: https://dl.k8s.io/release/stable.txt
  helm:
    github: helm/helm
    skipUpx: true
    check: version --short
    additional: [helm-plugin]
"#;
        let mut tb: Toolbox = serde_yaml::from_str(yaml).unwrap();
        tb.assign_names();
        assert_eq!(tb.target, "~/bin");
        assert!(tb.upx);
        assert_eq!(tb.create_target, Some(false));
        assert_eq!(tb.excluded_suffixes.as_deref(), Some(&[".sha256".to_string()][..]));
        let helm = &tb.tools["helm"];
        assert_eq!(helm.name, "helm");
        assert!(helm.skip_upx);
        assert_eq!(helm.additional, vec!["helm-plugin"]);
        assert_eq!(
            tb.tools["kubectl"].download_template(),
            Some("https://dl.k8s.io/{{.Version}}/kubectl")
        );
        assert!(tb.has_github_tools());
    }

    #[test]
    fn versions_skip_not_found_invalid_and_unversioned_tools() {
        let mut tb = Toolbox::default();
        tb.tools.insert(
            "abc".into(),
            Tool {
                name: "abc".into(),
                github: "foo/abc".into(),
                version: "v1.0.0".into(),
                ..Default::default()
            },
        );
        tb.tools.insert(
            "xyz".into(),
            Tool {
                name: "xyz".into(),
                github: "foo/xyz".into(),
                version: "v2.0.0".into(),
                could_not_be_found: true,
                ..Default::default()
            },
        );
        tb.tools.insert(
            "bad".into(),
            Tool {
                name: "bad".into(),
                github: "foo/bad".into(),
                version: "v3.0.0".into(),
                invalid: true,
                ..Default::default()
            },
        );
        tb.tools.insert(
            "new".into(),
            Tool {
                name: "new".into(),
                github: "foo/new".into(),
                ..Default::default()
            },
        );
        let versions = tb.versions().versions;
        assert_eq!(versions.len(), 1);
        assert_eq!(versions["abc"], "v1.0.0");
    }

    #[test]
    fn download_url_wins_over_google() {
        let tool = Tool {
            google: "https://dl.google.com/a".into(),
            download_url: "https://example.test/b".into(),
            ..Default::default()
        };
        assert_eq!(tool.download_template(), Some("https://example.test/b"));
        let google_only = Tool {
            google: "https://dl.google.com/a".into(),
            ..Default::default()
        };
        assert_eq!(google_only.download_template(), Some("https://dl.google.com/a"));
        assert!(!Tool::default().has_source());
    }

    #[test]
    fn serialization_omits_empty_and_transient_fields() {
        let tool = Tool {
            github: "org/foo".into(),
            invalid: true,
            ..Default::default()
        };
        let yaml = serde_yaml::to_string(&tool).unwrap();
        assert_eq!(yaml.trim(), "github: org/foo");
    }
}
