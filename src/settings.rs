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

//! Toolchain settings records and the ordered option map passed to `conan`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Target architecture.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Arch {
    #[serde(rename = "x86")]
    X86,
    #[serde(rename = "x86_64")]
    X86_64,
}

impl Arch {
    pub fn as_str(self) -> &'static str {
        match self {
            Arch::X86 => "x86",
            Arch::X86_64 => "x86_64",
        }
    }

    /// Argument understood by `vcvarsall.bat`.
    pub fn vcvars_arg(self) -> &'static str {
        match self {
            Arch::X86 => "x86",
            Arch::X86_64 => "amd64",
        }
    }

    /// Short name used in wxWidgets' MSVC library directories (`vc_x64_dll`).
    pub fn vc_dir_tag(self) -> &'static str {
        match self {
            Arch::X86 => "x86",
            Arch::X86_64 => "x64",
        }
    }
}

impl fmt::Display for Arch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Arch {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "x86" => Ok(Arch::X86),
            "x86_64" => Ok(Arch::X86_64),
            other => Err(Error::Config(format!("unknown architecture '{other}'"))),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum BuildType {
    Debug,
    Release,
}

impl BuildType {
    pub fn as_str(self) -> &'static str {
        match self {
            BuildType::Debug => "Debug",
            BuildType::Release => "Release",
        }
    }

    pub fn is_debug(self) -> bool {
        self == BuildType::Debug
    }
}

impl fmt::Display for BuildType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BuildType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Debug" => Ok(BuildType::Debug),
            "Release" => Ok(BuildType::Release),
            other => Err(Error::Config(format!("unknown build type '{other}'"))),
        }
    }
}

/// Visual C++ runtime library linkage.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Runtime {
    /// Debug, dynamically linked (`/MDd`).
    MDd,
    /// Release, dynamically linked (`/MD`).
    MD,
    /// Debug, statically linked (`/MTd`).
    MTd,
    /// Release, statically linked (`/MT`).
    MT,
}

impl Runtime {
    pub fn as_str(self) -> &'static str {
        match self {
            Runtime::MDd => "MDd",
            Runtime::MD => "MD",
            Runtime::MTd => "MTd",
            Runtime::MT => "MT",
        }
    }
}

impl fmt::Display for Runtime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Runtime {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "MDd" => Ok(Runtime::MDd),
            "MD" => Ok(Runtime::MD),
            "MTd" => Ok(Runtime::MTd),
            "MT" => Ok(Runtime::MT),
            other => Err(Error::Config(format!("unknown runtime '{other}'"))),
        }
    }
}

/// One toolchain configuration. Immutable once built.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ToolchainSettings {
    compiler: String,
    compiler_version: String,
    runtime: Runtime,
    arch: Arch,
    build_type: BuildType,
}

impl ToolchainSettings {
    pub fn new(
        compiler: impl Into<String>,
        compiler_version: impl Into<String>,
        runtime: Runtime,
        arch: Arch,
        build_type: BuildType,
    ) -> Self {
        ToolchainSettings {
            compiler: compiler.into(),
            compiler_version: compiler_version.into(),
            runtime,
            arch,
            build_type,
        }
    }

    pub fn compiler(&self) -> &str {
        &self.compiler
    }

    pub fn compiler_version(&self) -> &str {
        &self.compiler_version
    }

    pub fn runtime(&self) -> Runtime {
        self.runtime
    }

    pub fn arch(&self) -> Arch {
        self.arch
    }

    pub fn build_type(&self) -> BuildType {
        self.build_type
    }

    /// `(name, value)` pairs in the order they are passed to `conan`.
    pub fn conan_pairs(&self) -> [(&'static str, &str); 5] {
        [
            ("compiler", self.compiler.as_str()),
            ("compiler.version", self.compiler_version.as_str()),
            ("compiler.runtime", self.runtime.as_str()),
            ("arch", self.arch.as_str()),
            ("build_type", self.build_type.as_str()),
        ]
    }
}

/// Option name → value, iterated in insertion order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct OptionMap {
    entries: Vec<(String, String)>,
}

impl OptionMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `name`. An existing entry keeps its position and gets the new value.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == name) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for OptionMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = OptionMap::new();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}

/// Python-style boolean spelling expected by Conan option values.
pub fn conan_bool(value: bool) -> &'static str {
    if value {
        "True"
    } else {
        "False"
    }
}
