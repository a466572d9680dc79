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

//! Integration tests for matrix planning and execution.
//!
//! Command-line shape is checked against the default Visual Studio matrix;
//! execution is exercised with real `sh` children by pointing the package
//! tool at shell builtins.

use std::path::Path;
use std::sync::Mutex;

use async_trait::async_trait;

use wxpack::command::CommandInvocation;
use wxpack::matrix::{self, Driver, ExecutionPolicy, Executor, PlanOptions, ShellExecutor};
use wxpack::{Error, MatrixConfig};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

#[derive(Default)]
struct Recorder {
    seen: Mutex<Vec<CommandInvocation>>,
}

#[async_trait]
impl Executor for Recorder {
    async fn execute(&self, inv: &CommandInvocation) -> wxpack::Result<()> {
        self.seen.lock().unwrap().push(inv.clone());
        Ok(())
    }
}

fn config_with_tool(tool: &str) -> MatrixConfig {
    MatrixConfig {
        tool: tool.into(),
        ..MatrixConfig::default()
    }
}

// ---------------------------------------------------------------------------
// Planning
// ---------------------------------------------------------------------------

#[test]
fn default_matrix_yields_eight_test_commands() {
    let plan = matrix::plan(&MatrixConfig::default(), Path::new("/proj"), PlanOptions::default())
        .unwrap();
    assert_eq!(plan.builds.len(), 8);

    let x86 = plan
        .builds
        .iter()
        .filter(|b| b.invocation.command_line.contains("-s arch=\"x86\""))
        .count();
    let x64 = plan
        .builds
        .iter()
        .filter(|b| b.invocation.command_line.contains("-s arch=\"x86_64\""))
        .count();
    assert_eq!((x86, x64), (4, 4));

    for build in &plan.builds {
        let line = &build.invocation.command_line;
        let expected = if build.combination.shared {
            "-o wxWidgets_custom:shared=\"True\""
        } else {
            "-o wxWidgets_custom:shared=\"False\""
        };
        assert!(line.ends_with(expected), "{line}");
        assert!(line.find(" -s ").unwrap() < line.find(" -o ").unwrap());
    }

    assert_eq!(
        plan.builds[0].invocation.command_line,
        "conan test -s compiler=\"Visual Studio\" -s compiler.version=\"14\" \
         -s compiler.runtime=\"MDd\" -s arch=\"x86\" -s build_type=\"Debug\" \
         -o wxWidgets_custom:shared=\"True\""
    );
}

#[test]
fn product_has_no_duplicates_or_omissions() {
    let config = MatrixConfig::from_json(r#"{"versions": ["12", "14", "15"]}"#).unwrap();
    let plan = matrix::plan(&config, Path::new("/proj"), PlanOptions::default()).unwrap();
    assert_eq!(plan.builds.len(), 3 * 2 * 4);
    let mut lines: Vec<_> = plan.command_lines();
    lines.sort();
    lines.dedup();
    assert_eq!(lines.len(), 1 + 24);
}

#[test]
fn isolated_outputs_get_distinct_folders() {
    let plan = matrix::plan(
        &MatrixConfig::default(),
        Path::new("/proj"),
        PlanOptions {
            environments: None,
            isolate_outputs: true,
        },
    )
    .unwrap();
    let mut folders: Vec<_> = plan
        .builds
        .iter()
        .map(|b| {
            let line = &b.invocation.command_line;
            line[line.find("-tbf").unwrap()..].to_string()
        })
        .collect();
    folders.sort();
    folders.dedup();
    assert_eq!(folders.len(), 8);
    assert!(plan
        .builds
        .iter()
        .all(|b| b.invocation.working_dir == Path::new("/proj")));
}

#[tokio::test]
async fn every_invocation_runs_in_the_project_root() {
    let plan = matrix::plan(&MatrixConfig::default(), Path::new("/proj"), PlanOptions::default())
        .unwrap();
    let driver = Driver::new(Recorder::default(), ExecutionPolicy::Pooled { workers: 4 });
    driver.run(&plan).await.unwrap();
    let seen = driver.executor().seen.lock().unwrap();
    assert_eq!(seen.len(), 9);
    assert!(seen[0].command_line.starts_with("conan export"));
    assert!(seen.iter().all(|inv| inv.working_dir == Path::new("/proj")));
}

// ---------------------------------------------------------------------------
// Real child processes
// ---------------------------------------------------------------------------

#[cfg(unix)]
#[tokio::test]
async fn shell_executor_passes_with_true() {
    let dir = tempfile::tempdir().unwrap();
    let plan = matrix::plan(&config_with_tool("true"), dir.path(), PlanOptions::default()).unwrap();
    let ran = Driver::new(ShellExecutor, ExecutionPolicy::Sequential)
        .run(&plan)
        .await
        .unwrap();
    assert_eq!(ran, 8);
}

#[cfg(unix)]
#[tokio::test]
async fn shell_failure_aborts_sequential_run() {
    let dir = tempfile::tempdir().unwrap();
    let log = dir.path().join("log");
    // Every invocation appends a line; Release builds then fail.
    let script = format!(
        "echo x >> \"{}\"; case \"$*\" in *Release*) exit 1 ;; esac",
        log.display()
    );
    let config = config_with_tool(&format!("sh -c '{script}' --"));
    let plan = matrix::plan(&config, dir.path(), PlanOptions::default()).unwrap();
    let err = Driver::new(ShellExecutor, ExecutionPolicy::Sequential)
        .run(&plan)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::CommandFailed { .. }), "{err}");
    let lines = std::fs::read_to_string(&log).unwrap().lines().count();
    // export, Debug build, first Release build
    assert_eq!(lines, 3);
}

#[cfg(unix)]
#[tokio::test]
async fn pooled_failures_surface_as_error() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_with_tool(
        "sh -c 'case \"$*\" in *export*) exit 0 ;; *False*) exit 1 ;; esac' --",
    );
    let plan = matrix::plan(&config, dir.path(), PlanOptions::default()).unwrap();
    let err = Driver::new(ShellExecutor, ExecutionPolicy::Pooled { workers: 4 })
        .run(&plan)
        .await
        .unwrap_err();
    match err {
        Error::MatrixFailed { total, failures } => {
            assert_eq!(total, 8);
            assert_eq!(failures.len(), 4);
        }
        other => panic!("unexpected error: {other}"),
    }
}
