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

//! wxpack: Conan packaging and build-matrix driver for wxWidgets.
//!
//! The library plans and runs `conan` test builds over a configuration
//! matrix, harvests vendor toolchain environments without touching the
//! caller's own environment, and describes how the toolkit is fetched,
//! built, packaged and consumed.

pub mod command;
pub mod config;
pub mod error;
pub mod harvest;
pub mod logging;
pub mod matrix;
pub mod recipe;
pub mod settings;

pub use command::CommandInvocation;
pub use config::{MatrixConfig, Variant};
pub use error::{Error, Result};
pub use harvest::{HarvestMap, HarvestedEnvironment, Harvester};
pub use matrix::{plan, Driver, ExecutionPolicy, MatrixPlan, PlanOptions};
pub use settings::{Arch, BuildType, OptionMap, Runtime, ToolchainSettings};
