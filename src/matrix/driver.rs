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

//! Matrix execution.
//!
//! The registration command always runs first and alone. The matrix builds
//! then run under one explicit [`ExecutionPolicy`]; the two are never mixed
//! within a run.

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use tracing::{info, warn};

use super::MatrixPlan;
use crate::command::CommandInvocation;
use crate::error::{Error, Result};

/// Runs one invocation to completion.
#[async_trait]
pub trait Executor: Send + Sync {
    async fn execute(&self, invocation: &CommandInvocation) -> Result<()>;
}

/// Runs invocations through the platform shell, inheriting stdio.
#[derive(Clone, Copy, Debug, Default)]
pub struct ShellExecutor;

#[async_trait]
impl Executor for ShellExecutor {
    async fn execute(&self, invocation: &CommandInvocation) -> Result<()> {
        let status = invocation
            .to_process()
            .status()
            .await
            .map_err(|source| Error::Spawn {
                command: invocation.command_line.clone(),
                source,
            })?;
        if !status.success() {
            return Err(Error::CommandFailed {
                command: invocation.command_line.clone(),
                status,
            });
        }
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExecutionPolicy {
    /// Enumeration order; the first failure stops the run.
    Sequential,
    /// At most `workers` builds at once, no ordering between them. Every
    /// build runs; all failures are reported together.
    Pooled { workers: usize },
}

impl ExecutionPolicy {
    /// Whether builds may overlap and therefore need private output folders.
    pub fn is_concurrent(self) -> bool {
        matches!(self, ExecutionPolicy::Pooled { workers } if workers > 1)
    }
}

pub struct Driver<E> {
    executor: E,
    policy: ExecutionPolicy,
}

impl<E: Executor> Driver<E> {
    pub fn new(executor: E, policy: ExecutionPolicy) -> Self {
        Driver { executor, policy }
    }

    pub fn policy(&self) -> ExecutionPolicy {
        self.policy
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    /// Execute `plan`. Returns the number of matrix builds that ran.
    pub async fn run(&self, plan: &MatrixPlan) -> Result<usize> {
        for inv in std::iter::once(&plan.registration)
            .chain(plan.builds.iter().map(|b| &b.invocation))
        {
            if inv.working_dir != plan.root {
                return Err(Error::Config(format!(
                    "`{}` would run in {} instead of the project root {}",
                    inv.command_line,
                    inv.working_dir.display(),
                    plan.root.display()
                )));
            }
        }

        // Later builds resolve the recipe from the local cache, so the
        // export has to finish before any of them starts.
        info!(command = %plan.registration.command_line, "registering recipe");
        self.executor.execute(&plan.registration).await?;

        match self.policy {
            ExecutionPolicy::Sequential => self.run_sequential(plan).await,
            ExecutionPolicy::Pooled { workers } => self.run_pooled(plan, workers.max(1)).await,
        }
    }

    async fn run_sequential(&self, plan: &MatrixPlan) -> Result<usize> {
        let total = plan.builds.len();
        for (i, build) in plan.builds.iter().enumerate() {
            info!(
                step = i + 1,
                total,
                command = %build.invocation.command_line,
                "running build"
            );
            self.executor.execute(&build.invocation).await?;
        }
        Ok(total)
    }

    async fn run_pooled(&self, plan: &MatrixPlan, workers: usize) -> Result<usize> {
        let total = plan.builds.len();
        info!(total, workers, "dispatching builds");
        let mut results: Vec<(usize, Result<()>)> = stream::iter(plan.builds.iter().enumerate())
            .map(|(i, build)| async move {
                info!(command = %build.invocation.command_line, "running build");
                let result = self.executor.execute(&build.invocation).await;
                if let Err(e) = &result {
                    warn!(build = %build.combination.slug(), error = %e, "build failed");
                }
                (i, result)
            })
            .buffer_unordered(workers)
            .collect()
            .await;

        // completion order varies; report in plan order
        results.sort_by_key(|(i, _)| *i);
        let failures: Vec<Error> = results
            .into_iter()
            .filter_map(|(_, result)| result.err())
            .collect();
        if failures.is_empty() {
            Ok(total)
        } else {
            Err(Error::MatrixFailed { total, failures })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MatrixConfig;
    use crate::matrix::{plan, PlanOptions};
    use std::path::Path;
    use std::sync::Mutex;

    /// Records command lines; fails any whose line contains `fail_on`.
    #[derive(Default)]
    struct Recorder {
        seen: Mutex<Vec<String>>,
        fail_on: Option<&'static str>,
    }

    #[async_trait]
    impl Executor for Recorder {
        async fn execute(&self, inv: &CommandInvocation) -> Result<()> {
            self.seen.lock().unwrap().push(inv.command_line.clone());
            match self.fail_on {
                Some(pat) if inv.command_line.contains(pat) => {
                    Err(Error::Config(format!("forced failure: {}", inv.command_line)))
                }
                _ => Ok(()),
            }
        }
    }

    /// Fails every build; later builds finish sooner.
    struct ReverseFailer {
        total: usize,
        order: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl Executor for ReverseFailer {
        async fn execute(&self, inv: &CommandInvocation) -> Result<()> {
            if inv.command_line.contains(" export ") {
                return Ok(());
            }
            let position = self.order.lock().unwrap().len();
            self.order.lock().unwrap().push(inv.command_line.clone());
            for _ in 0..(self.total - position) * 4 {
                tokio::task::yield_now().await;
            }
            Err(Error::Config(inv.command_line.clone()))
        }
    }

    fn default_plan() -> MatrixPlan {
        plan(
            &MatrixConfig::default(),
            Path::new("/proj"),
            PlanOptions::default(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn sequential_runs_everything_in_order() {
        let plan = default_plan();
        let driver = Driver::new(Recorder::default(), ExecutionPolicy::Sequential);
        assert_eq!(driver.run(&plan).await.unwrap(), 8);
        let seen = driver.executor.seen.lock().unwrap().clone();
        assert_eq!(seen, plan.command_lines());
    }

    #[tokio::test]
    async fn sequential_stops_at_first_failure() {
        let plan = default_plan();
        let recorder = Recorder {
            fail_on: Some("build_type=\"Release\""),
            ..Default::default()
        };
        let driver = Driver::new(recorder, ExecutionPolicy::Sequential);
        assert!(driver.run(&plan).await.is_err());
        // export, the Debug build, then the first Release build
        assert_eq!(driver.executor.seen.lock().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn pooled_registers_first_and_reports_all_failures() {
        let plan = default_plan();
        let recorder = Recorder {
            fail_on: Some("shared=\"False\""),
            ..Default::default()
        };
        let driver = Driver::new(recorder, ExecutionPolicy::Pooled { workers: 3 });
        let err = driver.run(&plan).await.unwrap_err();
        match err {
            Error::MatrixFailed { total, failures } => {
                assert_eq!(total, 8);
                assert_eq!(failures.len(), 4);
            }
            other => panic!("unexpected error: {other}"),
        }
        let seen = driver.executor.seen.lock().unwrap().clone();
        assert_eq!(seen.len(), 9);
        assert_eq!(seen[0], "conan export sl/testing");
    }

    #[tokio::test]
    async fn pooled_failures_are_reported_in_plan_order() {
        let plan = default_plan();
        let driver = Driver::new(
            ReverseFailer {
                total: plan.builds.len(),
                order: Mutex::new(Vec::new()),
            },
            ExecutionPolicy::Pooled { workers: 8 },
        );
        let failures = match driver.run(&plan).await.unwrap_err() {
            Error::MatrixFailed { failures, .. } => failures,
            other => panic!("unexpected error: {other}"),
        };
        let reported: Vec<String> = failures
            .iter()
            .map(|e| match e {
                Error::Config(line) => line.clone(),
                other => panic!("unexpected error: {other}"),
            })
            .collect();
        assert_eq!(reported, plan.command_lines()[1..]);
    }

    #[tokio::test]
    async fn failed_registration_runs_no_builds() {
        let plan = default_plan();
        let recorder = Recorder {
            fail_on: Some("export"),
            ..Default::default()
        };
        let driver = Driver::new(recorder, ExecutionPolicy::Pooled { workers: 4 });
        assert!(driver.run(&plan).await.is_err());
        assert_eq!(driver.executor.seen.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn rejects_foreign_working_directory() {
        let mut plan = default_plan();
        plan.builds[2].invocation.working_dir = "/elsewhere".into();
        let driver = Driver::new(Recorder::default(), ExecutionPolicy::Sequential);
        assert!(matches!(driver.run(&plan).await, Err(Error::Config(_))));
        assert!(driver.executor.seen.lock().unwrap().is_empty());
    }

    #[test]
    fn concurrency_flag() {
        assert!(!ExecutionPolicy::Sequential.is_concurrent());
        assert!(!ExecutionPolicy::Pooled { workers: 1 }.is_concurrent());
        assert!(ExecutionPolicy::Pooled { workers: 2 }.is_concurrent());
    }
}
