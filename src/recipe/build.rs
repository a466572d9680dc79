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

//! Native build commands for a checked-out wxWidgets tree.

use std::path::Path;

use super::{Platform, Recipe};
use crate::command::CommandInvocation;
use crate::settings::BuildType;

/// What to build and how wide.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BuildRequest {
    pub platform: Platform,
    pub build_type: BuildType,
    pub shared: bool,
    /// Parallel `make` jobs (ignored by `nmake`).
    pub jobs: usize,
}

impl Recipe {
    /// The commands that build the library, in order.
    ///
    /// Windows runs `nmake` in `build/msw`; Linux runs `configure` and
    /// `make` at the top of the source tree.
    pub fn build_commands(&self, root: &Path, req: &BuildRequest) -> Vec<CommandInvocation> {
        let src = self.source_dir(root);
        match req.platform {
            Platform::Windows => {
                let build = match req.build_type {
                    BuildType::Debug => "BUILD=debug",
                    BuildType::Release => "BUILD=release",
                };
                let link = if req.shared { "SHARED=1" } else { "SHARED=0" };
                vec![CommandInvocation::new(
                    format!("nmake -f makefile.vc UNICODE=1 {build} {link}"),
                    src.join("build").join("msw"),
                )]
            }
            Platform::Linux => {
                let debug = match req.build_type {
                    BuildType::Debug => "--enable-debug",
                    BuildType::Release => "--disable-debug",
                };
                let link = if req.shared {
                    "--enable-shared"
                } else {
                    "--disable-shared"
                };
                vec![
                    CommandInvocation::new(
                        format!("./configure --without-opengl --enable-unicode {debug} {link}"),
                        &src,
                    ),
                    CommandInvocation::new(format!("make -j{}", req.jobs.max(1)), &src),
                ]
            }
        }
    }
}
