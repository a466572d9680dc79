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

//! Package layout and artifact copying.

use std::path::{Path, PathBuf};

use tracing::debug;

use super::{Platform, Recipe};
use crate::error::{Error, Result};
use crate::settings::Arch;

/// Copy every file under `src` whose name matches `pattern` into `dst`,
/// keeping its path relative to `src`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CopyRule {
    pub pattern: &'static str,
    pub src: PathBuf,
    pub dst: PathBuf,
    /// Descend into subdirectories of `src`.
    pub recursive: bool,
}

impl CopyRule {
    fn new(pattern: &'static str, src: impl Into<PathBuf>, dst: impl Into<PathBuf>) -> Self {
        CopyRule {
            pattern,
            src: src.into(),
            dst: dst.into(),
            recursive: true,
        }
    }

    fn top_level(mut self) -> Self {
        self.recursive = false;
        self
    }
}

/// Where the built artifacts go inside the package folder.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PackageLayout {
    /// Library directory relative to the package folder.
    pub lib_dir: PathBuf,
    pub rules: Vec<CopyRule>,
}

/// `vc_x64_dll`, `vc_x86_lib`, ...
pub fn vc_lib_dir_name(arch: Arch, shared: bool) -> String {
    format!(
        "vc_{}_{}",
        arch.vc_dir_tag(),
        if shared { "dll" } else { "lib" }
    )
}

impl Recipe {
    /// Copy rules for one build. Source paths are relative to the project
    /// root, destinations relative to the package folder.
    pub fn package_layout(&self, platform: Platform, arch: Arch, shared: bool) -> PackageLayout {
        let src_root = PathBuf::from(&self.repo_subdir);
        let mut rules = Vec::new();
        let lib_dir = match platform {
            Platform::Windows => {
                let src_libs = src_root
                    .join("lib")
                    .join(if shared { "vc_dll" } else { "vc_lib" });
                let dst = PathBuf::from("lib").join(vc_lib_dir_name(arch, shared));
                rules.push(CopyRule::new("*.dll", &src_libs, &dst));
                rules.push(CopyRule::new("*.lib", &src_libs, &dst));
                rules.push(CopyRule::new("*.h", &src_libs, &dst));
                dst
            }
            Platform::Linux => {
                let src_libs = src_root.join("lib");
                let dst = PathBuf::from("lib");
                rules.push(CopyRule::new("*.so*", &src_libs, &dst));
                rules.push(CopyRule::new("*.a", &src_libs, &dst));
                rules.push(CopyRule::new("*.h", &src_libs, &dst));
                rules.push(CopyRule::new("wx-config", &src_root, "bin").top_level());
                dst
            }
        };
        rules.push(CopyRule::new("*", src_root.join("include"), "include"));
        PackageLayout { lib_dir, rules }
    }
}

/// Shell-style match where `*` stands for any run of characters.
pub fn matches_pattern(pattern: &str, name: &str) -> bool {
    let parts: Vec<&str> = pattern.split('*').collect();
    let [first, middle @ .., last] = parts.as_slice() else {
        return pattern == name;
    };
    let Some(mut tail) = name.strip_prefix(first) else {
        return false;
    };
    for part in middle {
        match tail.find(part) {
            Some(idx) => tail = &tail[idx + part.len()..],
            None => return false,
        }
    }
    tail.ends_with(last)
}

/// Apply every rule, resolving sources against `root` and destinations
/// against `package_folder`. Returns the copied files relative to the
/// package folder. Missing source directories copy nothing.
pub fn copy_artifacts(
    layout: &PackageLayout,
    root: &Path,
    package_folder: &Path,
) -> Result<Vec<PathBuf>> {
    let mut copied = Vec::new();
    for rule in &layout.rules {
        let src_dir = root.join(&rule.src);
        for rel in walk_files(&src_dir, Path::new(""), rule.recursive)? {
            let matched = rel
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| matches_pattern(rule.pattern, n));
            if !matched {
                continue;
            }
            let from = src_dir.join(&rel);
            let to_rel = rule.dst.join(&rel);
            let to = package_folder.join(&to_rel);
            if let Some(parent) = to.parent() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| Error::io(format!("failed to create {}", parent.display()), e))?;
            }
            std::fs::copy(&from, &to).map_err(|e| {
                Error::io(
                    format!("failed to copy {} to {}", from.display(), to.display()),
                    e,
                )
            })?;
            debug!(from = %from.display(), to = %to_rel.display(), "copied");
            copied.push(to_rel);
        }
    }
    copied.sort();
    copied.dedup();
    Ok(copied)
}

/// Collect files under `dir`, relative to the starting directory.
fn walk_files(dir: &Path, rel: &Path, recursive: bool) -> Result<Vec<PathBuf>> {
    let mut out = Vec::new();
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(out),
        Err(e) => return Err(Error::io(format!("failed to read {}", dir.display()), e)),
    };
    for entry in entries.flatten() {
        let path = entry.path();
        let child = rel.join(entry.file_name());
        if path.is_dir() {
            if recursive {
                out.extend(walk_files(&path, &child, true)?);
            }
        } else {
            out.push(child);
        }
    }
    Ok(out)
}
