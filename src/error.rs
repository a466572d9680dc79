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

//! Error type shared by every layer of the packaging driver.

use std::path::PathBuf;
use std::process::ExitStatus;

use crate::settings::Arch;

/// Errors produced while planning, harvesting, building or packaging.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The host (or requested target) OS has no build recipe.
    #[error("unsupported platform: {0}")]
    UnsupportedPlatform(String),

    /// A child process could not be started at all.
    #[error("failed to spawn `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// A child process ran and exited unsuccessfully.
    #[error("`{command}` failed with {status}")]
    CommandFailed { command: String, status: ExitStatus },

    /// One or more pooled matrix builds failed.
    #[error("{} of {total} matrix build(s) failed:\n{}", .failures.len(), format_failures(.failures))]
    MatrixFailed { total: usize, failures: Vec<Error> },

    /// A line of setup-script output was not a `KEY=VALUE` pair.
    #[error("malformed environment line {line_no}: {line:?}")]
    MalformedEnvironment { line_no: usize, line: String },

    /// Setup-script output was not valid UTF-8.
    #[error("`{command}` printed output that is not valid UTF-8: {source}")]
    InvalidEncoding {
        command: String,
        #[source]
        source: std::string::FromUtf8Error,
    },

    /// Harvesting failed for at least one (version, arch) pair.
    #[error("environment harvest failed:\n{}", format_harvest_failures(.failures))]
    HarvestFailed {
        failures: Vec<(String, Arch, Error)>,
    },

    /// The version header did not define the expected macros.
    #[error("cannot read version from {}: {reason}", .path.display())]
    VersionHeader { path: PathBuf, reason: String },

    /// Invalid matrix configuration.
    #[error("configuration error: {0}")]
    Config(String),

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    pub(crate) fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Error::Io {
            context: context.into(),
            source,
        }
    }
}

fn format_failures(failures: &[Error]) -> String {
    failures
        .iter()
        .map(|e| format!("  - {e}"))
        .collect::<Vec<_>>()
        .join("\n")
}

fn format_harvest_failures(failures: &[(String, Arch, Error)]) -> String {
    failures
        .iter()
        .map(|(version, arch, e)| format!("  - {version}/{arch}: {e}"))
        .collect::<Vec<_>>()
        .join("\n")
}

pub type Result<T> = std::result::Result<T, Error>;
