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

//! Build-matrix planning.
//!
//! Expands a [`MatrixConfig`] into the registration command plus one
//! `conan test` invocation per (version × arch × variant) combination.

pub mod driver;

use std::path::{Path, PathBuf};

use crate::command::{self, CommandInvocation};
use crate::config::{MatrixConfig, Variant};
use crate::error::{Error, Result};
use crate::harvest::HarvestMap;
use crate::settings::{conan_bool, OptionMap, ToolchainSettings};

pub use driver::{Driver, ExecutionPolicy, Executor, ShellExecutor};

/// One cell of the matrix.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Combination {
    pub settings: ToolchainSettings,
    pub shared: bool,
}

impl Combination {
    /// Filesystem-safe name, unique within a matrix.
    pub fn slug(&self) -> String {
        let s = &self.settings;
        let compiler: String = s
            .compiler()
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect();
        format!(
            "{}{}-{}-{}-{}-{}",
            compiler,
            s.compiler_version(),
            s.arch(),
            s.build_type(),
            s.runtime(),
            if self.shared { "shared" } else { "static" }
        )
        .to_ascii_lowercase()
    }
}

/// The Cartesian product of the configured axes, in enumeration order:
/// versions outermost, then architectures, then variants.
pub fn enumerate(config: &MatrixConfig) -> Vec<Combination> {
    let mut out = Vec::with_capacity(config.combinations());
    for version in &config.versions {
        for &arch in &config.architectures {
            for &Variant {
                build_type,
                runtime,
                shared,
            } in &config.variants
            {
                out.push(Combination {
                    settings: ToolchainSettings::new(
                        config.compiler.as_str(),
                        version.as_str(),
                        runtime,
                        arch,
                        build_type,
                    ),
                    shared,
                });
            }
        }
    }
    out
}

/// A matrix invocation together with the combination it builds.
#[derive(Clone, Debug)]
pub struct PlannedBuild {
    pub combination: Combination,
    pub invocation: CommandInvocation,
}

/// Everything one driver run will execute.
#[derive(Clone, Debug)]
pub struct MatrixPlan {
    pub root: PathBuf,
    pub registration: CommandInvocation,
    pub builds: Vec<PlannedBuild>,
}

impl MatrixPlan {
    /// Command lines in the order they are dispatched.
    pub fn command_lines(&self) -> Vec<&str> {
        std::iter::once(self.registration.command_line.as_str())
            .chain(self.builds.iter().map(|b| b.invocation.command_line.as_str()))
            .collect()
    }
}

/// Planning knobs that do not belong in the matrix table itself.
#[derive(Clone, Copy, Debug, Default)]
pub struct PlanOptions<'a> {
    /// Harvested environments; every (version, arch) in the matrix must be present.
    pub environments: Option<&'a HarvestMap>,
    /// Give every build its own test build folder under `<root>/build`.
    pub isolate_outputs: bool,
}

/// Build the full plan rooted at `root`.
pub fn plan(config: &MatrixConfig, root: &Path, opts: PlanOptions<'_>) -> Result<MatrixPlan> {
    config.validate()?;
    let registration = CommandInvocation::new(
        command::export_command(&config.tool, &config.user, &config.channel),
        root,
    );

    let mut builds = Vec::with_capacity(config.combinations());
    for combination in enumerate(config) {
        let options =
            OptionMap::new().with(config.shared_option.as_str(), conan_bool(combination.shared));
        let line = if opts.isolate_outputs {
            let folder = root.join("build").join(combination.slug());
            command::isolated_test_command(&config.tool, &combination.settings, &options, &folder)
        } else {
            command::test_command(&config.tool, &combination.settings, &options)
        };
        let mut invocation = CommandInvocation::new(line, root);
        if let Some(envs) = opts.environments {
            let s = &combination.settings;
            let env = envs.get(s.compiler_version(), s.arch()).ok_or_else(|| {
                Error::Config(format!(
                    "no harvested environment for {} {}",
                    s.compiler_version(),
                    s.arch()
                ))
            })?;
            invocation = invocation.with_environment(env.clone());
        }
        builds.push(PlannedBuild {
            combination,
            invocation,
        });
    }

    Ok(MatrixPlan {
        root: root.to_path_buf(),
        registration,
        builds,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Arch;
    use std::collections::HashSet;

    #[test]
    fn default_matrix_is_eight_distinct_cells() {
        let combos = enumerate(&MatrixConfig::default());
        assert_eq!(combos.len(), 8);
        let slugs: HashSet<_> = combos.iter().map(Combination::slug).collect();
        assert_eq!(slugs.len(), 8);
    }

    #[test]
    fn enumeration_order() {
        let combos = enumerate(&MatrixConfig::default());
        assert!(combos[..4].iter().all(|c| c.settings.arch() == Arch::X86));
        assert!(combos[4..].iter().all(|c| c.settings.arch() == Arch::X86_64));
        assert!(combos[0].shared);
        assert!(!combos[3].shared);
    }

    #[test]
    fn slug_format() {
        let combos = enumerate(&MatrixConfig::default());
        assert_eq!(combos[0].slug(), "visualstudio14-x86-debug-mdd-shared");
        assert_eq!(combos[7].slug(), "visualstudio14-x86_64-release-mt-static");
    }

    #[test]
    fn plan_puts_registration_first() {
        let plan = plan(
            &MatrixConfig::default(),
            Path::new("/proj"),
            PlanOptions::default(),
        )
        .unwrap();
        let lines = plan.command_lines();
        assert_eq!(lines.len(), 9);
        assert_eq!(lines[0], "conan export sl/testing");
        assert!(lines[1..].iter().all(|l| l.starts_with("conan test ")));
    }

    #[test]
    fn missing_environment_is_an_error() {
        let empty = HarvestMap::default();
        let err = plan(
            &MatrixConfig::default(),
            Path::new("/proj"),
            PlanOptions {
                environments: Some(&empty),
                isolate_outputs: false,
            },
        )
        .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
