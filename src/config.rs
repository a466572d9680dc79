//   Copyright (c) 2024-2026 Anton Kundenko <singaraiona@gmail.com>
//   All rights reserved.
//
//   Permission is hereby granted, free of charge, to any person obtaining a copy
//   of this software and associated documentation files (the "Software"), to deal
//   in the Software without restriction, including without limitation the rights
//   to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
//   copies of the Software, and to permit persons to whom the Software is
//   furnished to do so, subject to the following conditions:
//
//   The above copyright notice and this permission notice shall be included in all
//   copies or substantial portions of the Software.
//
//   THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
//   IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
//   FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
//   AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
//   LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
//   OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE
//   SOFTWARE.

//! Matrix configuration.
//!
//! Built-in defaults describe the Visual Studio test matrix; a JSON file can
//! override any field. Builds of a branch matching `stable_branch_pattern`
//! go to the stable channel. Conan user/channel can also come from the
//! `CONAN_USERNAME` / `CONAN_CHANNEL` environment variables, which win over
//! the branch rule.

use std::path::Path;
use std::process::Command;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::settings::{Arch, BuildType, Runtime};

/// One (build type, runtime, link mode) column of the matrix.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Variant {
    pub build_type: BuildType,
    pub runtime: Runtime,
    pub shared: bool,
}

impl Variant {
    pub const fn new(build_type: BuildType, runtime: Runtime, shared: bool) -> Self {
        Variant {
            build_type,
            runtime,
            shared,
        }
    }
}

/// The default variant set: debug/release DLLs plus the two static release runtimes.
pub const DEFAULT_VARIANTS: [Variant; 4] = [
    Variant::new(BuildType::Debug, Runtime::MDd, true),
    Variant::new(BuildType::Release, Runtime::MD, true),
    Variant::new(BuildType::Release, Runtime::MD, false),
    Variant::new(BuildType::Release, Runtime::MT, false),
];

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MatrixConfig {
    /// Package tool executable.
    pub tool: String,
    pub compiler: String,
    pub versions: Vec<String>,
    pub architectures: Vec<Arch>,
    pub variants: Vec<Variant>,
    /// Fully qualified option that toggles shared builds.
    pub shared_option: String,
    pub user: String,
    pub channel: String,
    /// Branch prefix whose builds upload to `stable_channel`; empty disables.
    pub stable_branch_pattern: String,
    pub stable_channel: String,
}

impl Default for MatrixConfig {
    fn default() -> Self {
        MatrixConfig {
            tool: "conan".into(),
            compiler: "Visual Studio".into(),
            versions: vec!["14".into()],
            architectures: vec![Arch::X86, Arch::X86_64],
            variants: DEFAULT_VARIANTS.to_vec(),
            shared_option: "wxWidgets_custom:shared".into(),
            user: "sl".into(),
            channel: "testing".into(),
            stable_branch_pattern: "release/".into(),
            stable_channel: "stable".into(),
        }
    }
}

impl MatrixConfig {
    /// Read a JSON config file; absent fields keep their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| Error::io(format!("failed to read {}", path.display()), e))?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let config: MatrixConfig =
            serde_json::from_str(text).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Whether `branch` is a release branch.
    pub fn is_stable_branch(&self, branch: &str) -> bool {
        !self.stable_branch_pattern.is_empty() && branch.starts_with(&self.stable_branch_pattern)
    }

    /// Switch to the stable channel when building a release branch.
    pub fn with_branch(mut self, branch: Option<&str>) -> Self {
        if branch.is_some_and(|b| self.is_stable_branch(b)) {
            self.channel = self.stable_channel.clone();
        }
        self
    }

    /// Apply `CONAN_USERNAME` / `CONAN_CHANNEL` when set and non-empty.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(
            std::env::var("CONAN_USERNAME").ok(),
            std::env::var("CONAN_CHANNEL").ok(),
        )
    }

    pub fn with_overrides(mut self, user: Option<String>, channel: Option<String>) -> Self {
        if let Some(user) = user.filter(|u| !u.is_empty()) {
            self.user = user;
        }
        if let Some(channel) = channel.filter(|c| !c.is_empty()) {
            self.channel = channel;
        }
        self
    }

    /// Every axis must be non-empty and free of duplicates, otherwise the
    /// product would repeat or vanish.
    pub fn validate(&self) -> Result<()> {
        if self.tool.trim().is_empty() {
            return Err(Error::Config("`tool` must not be empty".into()));
        }
        if self.user.is_empty() || self.channel.is_empty() {
            return Err(Error::Config("`user` and `channel` must not be empty".into()));
        }
        if !self.stable_branch_pattern.is_empty() && self.stable_channel.is_empty() {
            return Err(Error::Config(
                "`stable_channel` must not be empty while `stable_branch_pattern` is set".into(),
            ));
        }
        check_axis("versions", &self.versions)?;
        check_axis("architectures", &self.architectures)?;
        check_axis("variants", &self.variants)?;
        Ok(())
    }

    /// Number of matrix builds this configuration produces.
    pub fn combinations(&self) -> usize {
        self.versions.len() * self.architectures.len() * self.variants.len()
    }
}

/// CI variables naming the branch under build, checked in order.
pub const BRANCH_ENV_VARS: &[&str] = &[
    "CONAN_CURRENT_BRANCH",
    "TRAVIS_BRANCH",
    "APPVEYOR_REPO_BRANCH",
    "CIRCLE_BRANCH",
    "CI_COMMIT_REF_NAME",
    "GIT_BRANCH",
];

/// The branch being built: a CI variable if one is set, otherwise the
/// checked-out branch of the repository at `root`. `None` on a detached
/// HEAD or outside a repository.
pub fn detect_branch(root: &Path) -> Option<String> {
    let from_env = BRANCH_ENV_VARS
        .iter()
        .filter_map(|name| std::env::var(name).ok())
        .find(|b| !b.is_empty());
    if from_env.is_some() {
        return from_env;
    }
    Command::new("git")
        .args(["rev-parse", "--abbrev-ref", "HEAD"])
        .current_dir(root)
        .output()
        .ok()
        .filter(|o| o.status.success())
        .and_then(|o| String::from_utf8(o.stdout).ok())
        .map(|b| b.trim().to_string())
        .filter(|b| !b.is_empty() && b != "HEAD")
}

fn check_axis<T: PartialEq + std::fmt::Debug>(name: &str, axis: &[T]) -> Result<()> {
    if axis.is_empty() {
        return Err(Error::Config(format!("`{name}` must not be empty")));
    }
    for (i, item) in axis.iter().enumerate() {
        if axis[..i].contains(item) {
            return Err(Error::Config(format!("duplicate entry in `{name}`: {item:?}")));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        let config = MatrixConfig::default();
        config.validate().unwrap();
        assert_eq!(config.combinations(), 8);
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config = MatrixConfig::from_json(r#"{"versions": ["12", "14"]}"#).unwrap();
        assert_eq!(config.versions, ["12", "14"]);
        assert_eq!(config.architectures, [Arch::X86, Arch::X86_64]);
        assert_eq!(config.combinations(), 16);
    }

    #[test]
    fn variants_from_json() {
        let config = MatrixConfig::from_json(
            r#"{"variants": [{"build_type": "Release", "runtime": "MT", "shared": false}],
                "architectures": ["x86_64"]}"#,
        )
        .unwrap();
        assert_eq!(
            config.variants,
            [Variant::new(BuildType::Release, Runtime::MT, false)]
        );
        assert_eq!(config.combinations(), 1);
    }

    #[test]
    fn rejects_duplicates_and_empty_axes() {
        assert!(MatrixConfig::from_json(r#"{"architectures": ["x86", "x86"]}"#).is_err());
        assert!(MatrixConfig::from_json(r#"{"versions": []}"#).is_err());
        assert!(MatrixConfig::from_json(r#"{"architectures": ["armv8"]}"#).is_err());
        assert!(MatrixConfig::from_json(r#"{"bogus": 1}"#).is_err());
    }

    #[test]
    fn release_branches_use_the_stable_channel() {
        let channel = |branch: Option<&str>| MatrixConfig::default().with_branch(branch).channel;
        assert_eq!(channel(Some("release/3.0.3")), "stable");
        assert_eq!(channel(Some("master")), "testing");
        assert_eq!(channel(Some("feature/release/x")), "testing");
        assert_eq!(channel(None), "testing");
    }

    #[test]
    fn explicit_channel_beats_branch_rule() {
        let config = MatrixConfig::default()
            .with_branch(Some("release/1.0"))
            .with_overrides(None, Some("qa".into()));
        assert_eq!(config.channel, "qa");
    }

    #[test]
    fn stable_branch_rule_is_configurable() {
        let config = MatrixConfig::from_json(
            r#"{"stable_branch_pattern": "stable/", "stable_channel": "prod"}"#,
        )
        .unwrap();
        assert_eq!(config.clone().with_branch(Some("release/1")).channel, "testing");
        assert_eq!(config.with_branch(Some("stable/1")).channel, "prod");

        let disabled = MatrixConfig::from_json(r#"{"stable_branch_pattern": ""}"#).unwrap();
        assert!(!disabled.is_stable_branch("release/1"));
        assert!(MatrixConfig::from_json(r#"{"stable_channel": ""}"#).is_err());
    }

    #[test]
    fn overrides_ignore_empty_values() {
        let config = MatrixConfig::default()
            .with_overrides(Some("me".into()), Some(String::new()));
        assert_eq!(config.user, "me");
        assert_eq!(config.channel, "testing");
    }
}
