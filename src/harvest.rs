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

//! Environment harvesting.
//!
//! A vendor setup script (`vcvarsall.bat` and friends) mutates the shell it
//! runs in. Rather than sourcing it into our own process, each (version,
//! arch) pair gets a child shell that runs the script and dumps its
//! environment; the dump is parsed into an immutable map that later build
//! invocations receive explicitly.

use std::collections::BTreeMap;
use std::process::Stdio;
use std::sync::Arc;

use futures::stream::{self, StreamExt};
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::settings::Arch;

/// Environment variables captured from one setup-script run.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HarvestedEnvironment {
    vars: BTreeMap<String, String>,
}

impl HarvestedEnvironment {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars.get(name).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.vars.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}

impl FromIterator<(String, String)> for HarvestedEnvironment {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        HarvestedEnvironment {
            vars: iter.into_iter().collect(),
        }
    }
}

/// Parse `set`/`env` style output.
///
/// The whole output is trimmed, split on `terminator`, and each line is split
/// on its first `=`. Any line without `=` (or with an empty name) rejects the
/// whole dump. Output produced with a different line terminator either
/// fails here or yields mangled values.
pub fn parse_set_output(text: &str, terminator: &str) -> Result<HarvestedEnvironment> {
    let mut vars = BTreeMap::new();
    for (idx, line) in text.trim().split(terminator).enumerate() {
        match line.split_once('=') {
            Some((key, value)) if !key.is_empty() => {
                vars.insert(key.to_string(), value.to_string());
            }
            _ => {
                return Err(Error::MalformedEnvironment {
                    line_no: idx + 1,
                    line: line.to_string(),
                })
            }
        }
    }
    Ok(HarvestedEnvironment { vars })
}

/// Produces the child process that runs a setup script and prints the
/// resulting environment on stdout.
pub trait EnvironmentProbe: Send + Sync {
    fn command(&self, version: &str, arch: Arch) -> Result<std::process::Command>;

    /// Line terminator of the dump the command prints.
    fn line_terminator(&self) -> &str {
        "\n"
    }
}

/// Visual Studio's `vcvarsall.bat`, followed by `set`.
#[derive(Clone, Debug)]
pub struct VcVarsAll {
    /// Path to `vcvarsall.bat`; `{version}` is replaced by the compiler version.
    pub script_template: String,
}

impl Default for VcVarsAll {
    fn default() -> Self {
        VcVarsAll {
            script_template:
                r"C:\Program Files (x86)\Microsoft Visual Studio {version}.0\VC\vcvarsall.bat"
                    .to_string(),
        }
    }
}

impl VcVarsAll {
    pub fn script_path(&self, version: &str) -> String {
        self.script_template.replace("{version}", version)
    }

    /// The `cmd /c` payload: the doubled quotes survive cmd's quote stripping.
    pub fn command_line(&self, version: &str, arch: Arch) -> String {
        format!(
            "\"\"{}\"\" {} && set",
            self.script_path(version),
            arch.vcvars_arg()
        )
    }
}

impl EnvironmentProbe for VcVarsAll {
    fn command(&self, version: &str, arch: Arch) -> Result<std::process::Command> {
        if !cfg!(windows) {
            return Err(Error::UnsupportedPlatform(format!(
                "vcvarsall.bat requires Windows (host is {})",
                std::env::consts::OS
            )));
        }
        Ok(crate::command::shell_command(&self.command_line(version, arch)))
    }

    fn line_terminator(&self) -> &str {
        "\r\n"
    }
}

/// A POSIX shell snippet, e.g. `. /opt/rh/devtoolset-{version}/enable && env`.
#[derive(Clone, Debug)]
pub struct ShellProbe {
    /// Script with `{version}` and `{arch}` placeholders.
    pub script: String,
    pub terminator: String,
}

impl ShellProbe {
    pub fn new(script: impl Into<String>) -> Self {
        ShellProbe {
            script: script.into(),
            terminator: "\n".to_string(),
        }
    }

    pub fn render(&self, version: &str, arch: Arch) -> String {
        self.script
            .replace("{version}", version)
            .replace("{arch}", arch.as_str())
    }
}

impl EnvironmentProbe for ShellProbe {
    fn command(&self, version: &str, arch: Arch) -> Result<std::process::Command> {
        let mut cmd = std::process::Command::new("sh");
        cmd.arg("-c").arg(self.render(version, arch));
        Ok(cmd)
    }

    fn line_terminator(&self) -> &str {
        &self.terminator
    }
}

/// Harvested environments indexed by (compiler version, arch).
#[derive(Clone, Debug, Default)]
pub struct HarvestMap {
    envs: BTreeMap<(String, Arch), Arc<HarvestedEnvironment>>,
}

impl HarvestMap {
    pub fn get(&self, version: &str, arch: Arch) -> Option<&Arc<HarvestedEnvironment>> {
        self.envs.get(&(version.to_string(), arch))
    }

    pub fn len(&self) -> usize {
        self.envs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.envs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Arch, &Arc<HarvestedEnvironment>)> {
        self.envs.iter().map(|((v, a), env)| (v.as_str(), *a, env))
    }
}

/// Number of concurrent children for `jobs` independent tasks.
pub fn pool_size(jobs: usize) -> usize {
    let cpus = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    jobs.min(cpus).max(1)
}

pub struct Harvester {
    probe: Box<dyn EnvironmentProbe>,
}

impl Harvester {
    pub fn new(probe: Box<dyn EnvironmentProbe>) -> Self {
        Harvester { probe }
    }

    /// Harvest one pair.
    pub async fn harvest_one(&self, version: &str, arch: Arch) -> Result<HarvestedEnvironment> {
        let cmd = self.probe.command(version, arch)?;
        let shown = format!("{cmd:?}");
        debug!(%version, %arch, command = %shown, "harvesting environment");
        let output = tokio::process::Command::from(cmd)
            .stdin(Stdio::null())
            .stderr(Stdio::inherit())
            .output()
            .await
            .map_err(|source| Error::Spawn {
                command: shown.clone(),
                source,
            })?;
        if !output.status.success() {
            return Err(Error::CommandFailed {
                command: shown,
                status: output.status,
            });
        }
        let text = String::from_utf8(output.stdout).map_err(|source| Error::InvalidEncoding {
            command: shown,
            source,
        })?;
        let env = parse_set_output(&text, self.probe.line_terminator())?;
        debug!(%version, %arch, vars = env.len(), "environment harvested");
        Ok(env)
    }

    /// Harvest every distinct (version, arch) pair concurrently.
    ///
    /// All children run to completion before anything is returned. If any
    /// pair fails the whole harvest fails and every failing pair is reported.
    pub async fn harvest(&self, versions: &[String], arches: &[Arch]) -> Result<HarvestMap> {
        let mut pairs: Vec<(String, Arch)> = Vec::new();
        for version in versions {
            for &arch in arches {
                if !pairs.iter().any(|(v, a)| v == version && *a == arch) {
                    pairs.push((version.clone(), arch));
                }
            }
        }
        if pairs.is_empty() {
            return Ok(HarvestMap::default());
        }

        let workers = pool_size(pairs.len());
        debug!(pairs = pairs.len(), workers, "starting harvest");
        let results: Vec<_> = stream::iter(pairs)
            .map(|(version, arch)| async move {
                let result = self.harvest_one(&version, arch).await;
                (version, arch, result)
            })
            .buffer_unordered(workers)
            .collect()
            .await;

        let mut map = HarvestMap::default();
        let mut failures = Vec::new();
        for (version, arch, result) in results {
            match result {
                Ok(env) => {
                    map.envs.insert((version, arch), Arc::new(env));
                }
                Err(e) => {
                    warn!(%version, %arch, error = %e, "harvest failed");
                    failures.push((version, arch, e));
                }
            }
        }
        if !failures.is_empty() {
            failures.sort_by(|a, b| (&a.0, a.1).cmp(&(&b.0, b.1)));
            return Err(Error::HarvestFailed { failures });
        }
        Ok(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_crlf_dump() {
        let env = parse_set_output("PATH=C:\\bin\r\nINCLUDE=C:\\inc\r\n", "\r\n").unwrap();
        assert_eq!(env.len(), 2);
        assert_eq!(env.get("PATH"), Some("C:\\bin"));
        assert_eq!(env.get("INCLUDE"), Some("C:\\inc"));
    }

    #[test]
    fn splits_on_first_equals_only() {
        let env = parse_set_output("CL=/DFOO=1 /DBAR=2", "\n").unwrap();
        assert_eq!(env.get("CL"), Some("/DFOO=1 /DBAR=2"));
    }

    #[test]
    fn empty_value_is_allowed() {
        let env = parse_set_output("EMPTY=\nX=1", "\n").unwrap();
        assert_eq!(env.get("EMPTY"), Some(""));
    }

    #[test]
    fn line_without_equals_is_rejected() {
        let err = parse_set_output("A=1\nbanner text\nB=2", "\n").unwrap_err();
        match err {
            Error::MalformedEnvironment { line_no, line } => {
                assert_eq!(line_no, 2);
                assert_eq!(line, "banner text");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn terminator_mismatch_corrupts_or_rejects() {
        // LF-only output read with a CRLF terminator is one line whose value
        // swallows the rest of the dump.
        let merged = parse_set_output("A=1\nB=2", "\r\n").unwrap();
        assert_eq!(merged.len(), 1);
        assert_eq!(merged.get("A"), Some("1\nB=2"));
        let err = parse_set_output("banner\r\nA=1", "\r\n").unwrap_err();
        assert!(matches!(err, Error::MalformedEnvironment { line_no: 1, .. }));
    }

    #[test]
    fn empty_output_is_rejected() {
        assert!(parse_set_output("  \r\n", "\r\n").is_err());
    }

    #[test]
    fn vcvars_command_line() {
        let probe = VcVarsAll::default();
        assert_eq!(
            probe.command_line("14", Arch::X86_64),
            "\"\"C:\\Program Files (x86)\\Microsoft Visual Studio 14.0\\VC\\vcvarsall.bat\"\" amd64 && set"
        );
        assert_eq!(probe.line_terminator(), "\r\n");
    }

    #[cfg(not(windows))]
    #[test]
    fn vcvars_is_windows_only() {
        let err = VcVarsAll::default().command("14", Arch::X86).unwrap_err();
        assert!(matches!(err, Error::UnsupportedPlatform(_)));
    }

    #[test]
    fn pool_size_is_bounded() {
        assert_eq!(pool_size(0), 1);
        assert_eq!(pool_size(1), 1);
        assert!(pool_size(1000) <= 1000);
    }
}
