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

//! The wxWidgets packaging recipe: where the source comes from, how each
//! platform builds it, what lands in the package and what consumers see.

pub mod build;
pub mod info;
pub mod package;

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::Serialize;

use crate::command::CommandInvocation;
use crate::error::{Error, Result};

pub use build::BuildRequest;
pub use info::PackageInfo;
pub use package::{CopyRule, PackageLayout};

/// Operating systems the recipe knows how to build on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum Platform {
    Windows,
    Linux,
}

impl Platform {
    /// The platform of the running process.
    pub fn host() -> Result<Platform> {
        std::env::consts::OS.parse()
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Platform::Windows => "Windows",
            Platform::Linux => "Linux",
        })
    }
}

impl FromStr for Platform {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "windows" => Ok(Platform::Windows),
            "linux" => Ok(Platform::Linux),
            _ => Err(Error::UnsupportedPlatform(s.to_string())),
        }
    }
}

/// Numeric toolkit version.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct Version {
    pub major: u32,
    pub minor: u32,
    pub release: u32,
}

impl Version {
    /// `"3.0.3"` style.
    pub fn parse(s: &str) -> Option<Version> {
        let mut parts = s.trim().split('.').map(|p| p.parse::<u32>().ok());
        let version = Version {
            major: parts.next()??,
            minor: parts.next()??,
            release: parts.next()??,
        };
        parts.next().is_none().then_some(version)
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.release)
    }
}

/// Extract `wxMAJOR_VERSION`, `wxMINOR_VERSION` and `wxRELEASE_NUMBER` from
/// the text of `include/wx/version.h`.
pub fn parse_version_header(text: &str) -> std::result::Result<Version, String> {
    let mut major = None;
    let mut minor = None;
    let mut release = None;
    for line in text.lines() {
        let mut words = line.split_whitespace();
        if words.next() != Some("#define") {
            continue;
        }
        let (Some(name), Some(value)) = (words.next(), words.next()) else {
            continue;
        };
        let slot = match name {
            "wxMAJOR_VERSION" => &mut major,
            "wxMINOR_VERSION" => &mut minor,
            "wxRELEASE_NUMBER" => &mut release,
            _ => continue,
        };
        let n = value
            .parse::<u32>()
            .map_err(|_| format!("{name} is not a number: {value}"))?;
        *slot = Some(n);
    }
    match (major, minor, release) {
        (Some(major), Some(minor), Some(release)) => Ok(Version {
            major,
            minor,
            release,
        }),
        _ => Err("wxMAJOR_VERSION, wxMINOR_VERSION and wxRELEASE_NUMBER must all be defined".into()),
    }
}

/// Recipe options a consumer can set.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct RecipeOptions {
    pub shared: bool,
    /// Consumer-side only; does not change the built binaries.
    pub use_gui: bool,
}

impl Default for RecipeOptions {
    fn default() -> Self {
        RecipeOptions {
            shared: false,
            use_gui: true,
        }
    }
}

/// Static description of the package.
#[derive(Clone, Debug, Serialize)]
pub struct Recipe {
    pub name: String,
    pub version: String,
    pub url: String,
    pub license: String,
    pub git_repository_url: String,
    /// Checkout directory, relative to the project root.
    pub repo_subdir: String,
}

impl Default for Recipe {
    fn default() -> Self {
        Recipe {
            name: "wxWidgets".into(),
            version: "3.0.3".into(),
            url: "https://github.com/cjwddtc/conan-wxwidgets-custom".into(),
            license: "wxWindows Library Licence".into(),
            git_repository_url: "https://github.com/wxWidgets/wxWidgets.git".into(),
            repo_subdir: "wxWidgets".into(),
        }
    }
}

impl Recipe {
    pub fn parsed_version(&self) -> Result<Version> {
        Version::parse(&self.version)
            .ok_or_else(|| Error::Config(format!("invalid recipe version '{}'", self.version)))
    }

    /// Maintenance branch for the recipe's major.minor, e.g. `WX_3_0_BRANCH`.
    pub fn git_branch(&self) -> Result<String> {
        let v = self.parsed_version()?;
        Ok(format!("WX_{}_{}_BRANCH", v.major, v.minor))
    }

    pub fn source_dir(&self, root: &Path) -> PathBuf {
        root.join(&self.repo_subdir)
    }

    /// `git clone --branch <branch> <url> <subdir>`, run from the project root.
    pub fn source_command(&self, root: &Path) -> Result<CommandInvocation> {
        let line = format!(
            "git clone --branch {} {} {}",
            self.git_branch()?,
            self.git_repository_url,
            self.repo_subdir
        );
        Ok(CommandInvocation::new(line, root))
    }

    /// Read the version out of the checked-out `include/wx/version.h`.
    pub fn read_source_version(&self, root: &Path) -> Result<Version> {
        let path = self
            .source_dir(root)
            .join("include")
            .join("wx")
            .join("version.h");
        let text = std::fs::read_to_string(&path)
            .map_err(|e| Error::io(format!("failed to read {}", path.display()), e))?;
        parse_version_header(&text).map_err(|reason| Error::VersionHeader { path, reason })
    }
}
