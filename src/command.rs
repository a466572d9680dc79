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

//! Command-line construction for the package tool and the invocation record
//! the driver executes.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::harvest::HarvestedEnvironment;
use crate::settings::{OptionMap, ToolchainSettings};

/// Build the `<tool> test` command line for one configuration.
///
/// Settings come first in their fixed order, then options in map order.
/// Every value is double-quoted; nothing is validated.
pub fn test_command(tool: &str, settings: &ToolchainSettings, options: &OptionMap) -> String {
    let mut tokens = vec![format!("{tool} test")];
    tokens.extend(
        settings
            .conan_pairs()
            .iter()
            .map(|(k, v)| format!("-s {k}=\"{v}\"")),
    );
    tokens.extend(options.iter().map(|(k, v)| format!("-o {k}=\"{v}\"")));
    tokens.join(" ")
}

/// `<tool> test ...` with a dedicated test build folder appended.
pub fn isolated_test_command(
    tool: &str,
    settings: &ToolchainSettings,
    options: &OptionMap,
    build_folder: &Path,
) -> String {
    format!(
        "{} -tbf \"{}\"",
        test_command(tool, settings, options),
        build_folder.display()
    )
}

/// `<tool> export <user>/<channel>`: registers the recipe in the local cache.
pub fn export_command(tool: &str, user: &str, channel: &str) -> String {
    format!("{tool} export {user}/{channel}")
}

/// A command line ready to run, with its working directory and optional
/// replacement environment.
#[derive(Clone, Debug)]
pub struct CommandInvocation {
    pub command_line: String,
    pub working_dir: PathBuf,
    pub environment: Option<Arc<HarvestedEnvironment>>,
}

impl CommandInvocation {
    pub fn new(command_line: impl Into<String>, working_dir: impl Into<PathBuf>) -> Self {
        CommandInvocation {
            command_line: command_line.into(),
            working_dir: working_dir.into(),
            environment: None,
        }
    }

    pub fn with_environment(mut self, env: Arc<HarvestedEnvironment>) -> Self {
        self.environment = Some(env);
        self
    }

    /// Wrap the command line in the platform shell.
    ///
    /// When a harvested environment is attached it replaces the inherited
    /// one entirely, as the setup script's `set` dump is a full environment.
    pub fn to_process(&self) -> tokio::process::Command {
        let mut cmd = shell_command(&self.command_line);
        cmd.current_dir(&self.working_dir);
        if let Some(env) = &self.environment {
            cmd.env_clear();
            cmd.envs(env.iter());
        }
        tokio::process::Command::from(cmd)
    }
}

#[cfg(windows)]
pub(crate) fn shell_command(line: &str) -> std::process::Command {
    use std::os::windows::process::CommandExt;

    let mut cmd = std::process::Command::new("cmd");
    // cmd.exe does its own quote parsing; hand it the line untouched.
    cmd.arg("/C").raw_arg(line);
    cmd
}

#[cfg(not(windows))]
pub(crate) fn shell_command(line: &str) -> std::process::Command {
    let mut cmd = std::process::Command::new("sh");
    cmd.arg("-c").arg(line);
    cmd
}
