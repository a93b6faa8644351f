// This module picks the one release asset that is the right binary for the current platform.
//
// Release asset names follow whatever convention each project invented, so matching is a
// two-step heuristic: filter down to assets that mention the tool and the operating system,
// then rank the survivors with a chain of tie-breaks. Each stage only decides when every
// earlier stage considered the two candidates equal.

// The platform we match for, and the OS/arch alias lists that decide what counts as a match.
use crate::libs::utilities::platform::{AliasTable, Platform};
// A release asset as the GitHub API describes it.
use crate::schemas::release::Asset;
// Our custom logging macros for nicely formatted output.
use crate::{log_debug, log_info};
// The 'colored' crate helps us make our console output look pretty and readable.
use colored::Colorize;

/// Asset-name suffixes that are never installable binaries.
pub const DEFAULT_EXCLUDED_SUFFIXES: &[&str] = &[
    "sum", "sha256", "sbom", "pem", "sig", "rpm", "txt", "deb", "json", "asc",
];

/// Selects release assets for one platform.
#[derive(Debug, Clone)]
pub struct AssetMatcher {
    platform: Platform,
    aliases: AliasTable,
    excluded_suffixes: Vec<String>,
}

impl AssetMatcher {
    /// `excluded_suffixes` replaces the default exclusion list when given and non-empty.
    pub fn new(platform: Platform, aliases: AliasTable, excluded_suffixes: Option<&[String]>) -> Self {
        let excluded_suffixes = match excluded_suffixes {
            Some(list) if !list.is_empty() => list.to_vec(),
            _ => DEFAULT_EXCLUDED_SUFFIXES.iter().map(|s| s.to_string()).collect(),
        };
        AssetMatcher {
            platform,
            aliases,
            excluded_suffixes,
        }
    }

    pub fn platform(&self) -> &Platform {
        &self.platform
    }

    /// True if `name` is recognised as a build for `token` (an OS or arch token).
    pub fn matches(&self, token: &str, name: &str) -> bool {
        self.aliases.matches(token, name)
    }

    fn has_excluded_suffix(&self, name: &str) -> bool {
        self.excluded_suffixes.iter().any(|s| name.ends_with(s.as_str()))
    }

    /// Returns the best asset for `tool_name`, or `None` when nothing qualifies.
    pub fn find_matching<'a>(&self, tool_name: &str, assets: &'a [Asset]) -> Option<&'a Asset> {
        let mut candidates: Vec<&Asset> = assets
            .iter()
            .filter(|a| {
                a.name.contains(tool_name)
                    && self.matches(&self.platform.os, &a.name)
                    && !self.has_excluded_suffix(&a.name)
            })
            .collect();

        log_debug!(
            "[Matcher] {} candidate(s) for '{}' on {}: {:?}",
            candidates.len(),
            tool_name,
            self.platform.os,
            candidates.iter().map(|a| a.name.as_str()).collect::<Vec<_>>()
        );

        // `sort_by_key` is stable, so full ties keep the release's asset order.
        // `false` sorts first, hence every stage is expressed as "is not preferred".
        let arch = self.platform.arch.as_str();
        let exe_suffix = self.platform.exe_suffix();
        candidates.sort_by_key(|a| {
            (
                !self.matches(arch, &a.name),
                !a.name.contains(arch),
                a.name.contains('.'),
                !a.name.ends_with(exe_suffix),
            )
        });

        let best = candidates.first().copied();
        if let Some(asset) = best {
            log_info!("[Matcher] Selected asset {}", asset.name.bold());
        }
        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assets(names: &[&str]) -> Vec<Asset> {
        names
            .iter()
            .map(|n| Asset::new(*n, format!("https://example.test/download/{n}")))
            .collect()
    }

    fn matcher(os: &str, arch: &str) -> AssetMatcher {
        AssetMatcher::new(Platform::new(os, arch), AliasTable::default(), None)
    }

    #[test]
    fn picks_the_os_specific_binary_and_skips_checksums() {
        let list = assets(&["foo_linux_amd64", "foo_darwin_amd64", "foo.sha256"]);
        let best = matcher("linux", "amd64").find_matching("foo", &list).unwrap();
        assert_eq!(best.name, "foo_linux_amd64");
    }

    #[test]
    fn arm_build_loses_against_amd64_regardless_of_order() {
        let m = matcher("linux", "amd64");
        for names in [
            ["tool_linux_arm64.tar.gz", "tool_linux_amd64.tar.gz"],
            ["tool_linux_amd64.tar.gz", "tool_linux_arm64.tar.gz"],
        ] {
            let list = assets(&names);
            assert_eq!(m.find_matching("tool", &list).unwrap().name, "tool_linux_amd64.tar.gz");
        }
        assert!(!m.matches("amd64", "tool_linux_arm64.tar.gz"));
    }

    #[test]
    fn alias_match_beats_no_arch_hint() {
        let list = assets(&["tool-linux.tar.gz", "tool-linux-x86_64.tar.gz"]);
        let best = matcher("linux", "amd64").find_matching("tool", &list).unwrap();
        assert_eq!(best.name, "tool-linux-x86_64.tar.gz");
    }

    #[test]
    fn literal_arch_beats_alias_only() {
        let list = assets(&["tool_linux_64bit.tar.gz", "tool_linux_amd64.tar.gz"]);
        let best = matcher("linux", "amd64").find_matching("tool", &list).unwrap();
        assert_eq!(best.name, "tool_linux_amd64.tar.gz");
    }

    #[test]
    fn bare_binary_beats_archive() {
        let list = assets(&["tool_linux_amd64.tar.gz", "tool_linux_amd64"]);
        let best = matcher("linux", "amd64").find_matching("tool", &list).unwrap();
        assert_eq!(best.name, "tool_linux_amd64");
    }

    #[test]
    fn windows_exe_beats_zip() {
        let m = matcher("windows", "amd64");
        for names in [
            ["tool_windows_amd64.exe", "tool_windows_amd64.zip"],
            ["tool_windows_amd64.zip", "tool_windows_amd64.exe"],
        ] {
            let list = assets(&names);
            assert_eq!(m.find_matching("tool", &list).unwrap().name, "tool_windows_amd64.exe");
        }
    }

    #[test]
    fn full_ties_keep_release_order() {
        let list = assets(&["tool_linux_amd64_a.tar.gz", "tool_linux_amd64_b.tar.gz"]);
        let best = matcher("linux", "amd64").find_matching("tool", &list).unwrap();
        assert_eq!(best.name, "tool_linux_amd64_a.tar.gz");
    }

    #[test]
    fn selection_is_deterministic() {
        let list = assets(&[
            "tool_linux_386.tar.gz",
            "tool_linux_arm64.tar.gz",
            "tool_linux_amd64.tar.gz",
            "tool_linux_amd64.tar.gz.sig",
            "tool_darwin_amd64.tar.gz",
            "checksums.txt",
        ]);
        let m = matcher("linux", "amd64");
        let first = m.find_matching("tool", &list).unwrap().name.clone();
        for _ in 0..10 {
            assert_eq!(m.find_matching("tool", &list).unwrap().name, first);
        }
        assert_eq!(first, "tool_linux_amd64.tar.gz");
    }

    #[test]
    fn no_candidates_yields_none() {
        let list = assets(&["other_linux_amd64", "tool_darwin_arm64"]);
        assert!(matcher("linux", "amd64").find_matching("tool", &list).is_none());
    }

    #[test]
    fn configured_suffixes_replace_defaults() {
        let list = assets(&["tool_linux_amd64.txt", "tool_linux_amd64.tar.gz"]);
        let excluded = vec![".tar.gz".to_string()];
        let m = AssetMatcher::new(
            Platform::new("linux", "amd64"),
            AliasTable::default(),
            Some(&excluded),
        );
        assert_eq!(m.find_matching("tool", &list).unwrap().name, "tool_linux_amd64.txt");
    }
}
