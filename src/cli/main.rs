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

//! wxpack command-line driver.
//!
//! Usage:
//!     wxpack matrix  [--config FILE] [--policy sequential|pooled] [--jobs N] [--harvest] [--branch B] [--dry-run]
//!     wxpack harvest --compiler-version V --arch A
//!     wxpack source | build | package | info [OPTIONS]
//!
//! Every command line is printed before it runs.

mod theme;

use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand, ValueEnum};

use wxpack::command::CommandInvocation;
use wxpack::harvest::{self, EnvironmentProbe, Harvester, ShellProbe, VcVarsAll};
use wxpack::matrix::{self, Driver, ExecutionPolicy, Executor, MatrixPlan, PlanOptions, ShellExecutor};
use wxpack::recipe::info::InfoRequest;
use wxpack::recipe::{package, BuildRequest, Platform, Recipe, RecipeOptions};
use wxpack::config::detect_branch;
use wxpack::{Arch, BuildType, MatrixConfig};

const VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), " (", env!("GIT_HASH"), ")");

#[derive(Parser)]
#[command(
    name = "wxpack",
    version = VERSION,
    about = "Conan packaging and build-matrix driver for wxWidgets"
)]
struct Cli {
    /// Project root (recipe directory); every command runs relative to it
    #[arg(long, global = true, default_value = ".")]
    root: PathBuf,

    /// Debug-level logging (WXPACK_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Export the recipe, then run `conan test` over the configured matrix
    Matrix(MatrixArgs),
    /// Print the environment a toolchain setup script produces
    Harvest(HarvestArgs),
    /// Clone the wxWidgets sources at the recipe's branch
    Source(DryRun),
    /// Build the checked-out sources with the platform's native tool
    Build(BuildArgs),
    /// Copy built artifacts into a package folder
    Package(PackageArgs),
    /// Print include dirs, libraries and defines for consumers as JSON
    Info(InfoArgs),
}

#[derive(Args)]
struct DryRun {
    /// Print commands without running them
    #[arg(long)]
    dry_run: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum PolicyArg {
    Sequential,
    Pooled,
}

#[derive(Args)]
struct ProbeArgs {
    /// Path template of vcvarsall.bat (`{version}` is substituted)
    #[arg(long, value_name = "TEMPLATE")]
    vcvars: Option<String>,

    /// POSIX setup snippet that prints its environment, e.g.
    /// `. /opt/rh/devtoolset-{version}/enable && env`
    #[arg(long, value_name = "SCRIPT", conflicts_with = "vcvars")]
    setup_script: Option<String>,
}

impl ProbeArgs {
    fn probe(&self) -> Box<dyn EnvironmentProbe> {
        match (&self.setup_script, &self.vcvars) {
            (Some(script), _) => Box::new(ShellProbe::new(script.as_str())),
            (None, Some(template)) => Box::new(VcVarsAll {
                script_template: template.clone(),
            }),
            (None, None) => Box::new(VcVarsAll::default()),
        }
    }
}

#[derive(Args)]
struct MatrixArgs {
    /// JSON matrix configuration (missing fields use the built-in matrix)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// How matrix builds are scheduled after the export step
    #[arg(long, value_enum, default_value = "sequential")]
    policy: PolicyArg,

    /// Concurrent builds for the pooled policy (default: CPU count)
    #[arg(short, long)]
    jobs: Option<usize>,

    /// Harvest the toolchain environment for every (version, arch) first.
    /// Skipped with --dry-run.
    #[arg(long)]
    harvest: bool,

    /// Branch being built (default: CI variables, then `git`)
    #[arg(long)]
    branch: Option<String>,

    #[command(flatten)]
    probe: ProbeArgs,

    #[command(flatten)]
    dry_run: DryRun,
}

#[derive(Args)]
struct HarvestArgs {
    /// Compiler version(s) to harvest
    #[arg(long = "compiler-version", required = true)]
    versions: Vec<String>,

    /// Architecture(s) to harvest
    #[arg(long = "arch", required = true, value_parser = parse_arch)]
    arches: Vec<Arch>,

    #[command(flatten)]
    probe: ProbeArgs,
}

#[derive(Args)]
struct TargetArgs {
    /// Target platform (default: host)
    #[arg(long, value_parser = parse_platform)]
    platform: Option<Platform>,

    #[arg(long, value_parser = parse_arch, default_value = "x86_64")]
    arch: Arch,

    #[arg(long, value_parser = parse_build_type, default_value = "Release")]
    build_type: BuildType,

    /// Build or consume shared libraries
    #[arg(long)]
    shared: bool,
}

impl TargetArgs {
    fn platform(&self) -> anyhow::Result<Platform> {
        match self.platform {
            Some(p) => Ok(p),
            None => Ok(Platform::host()?),
        }
    }
}

#[derive(Args)]
struct BuildArgs {
    #[command(flatten)]
    target: TargetArgs,

    /// Parallel make jobs (default: CPU count)
    #[arg(short, long)]
    jobs: Option<usize>,

    #[command(flatten)]
    dry_run: DryRun,
}

#[derive(Args)]
struct PackageArgs {
    #[command(flatten)]
    target: TargetArgs,

    /// Destination package folder
    #[arg(long)]
    package_folder: PathBuf,
}

#[derive(Args)]
struct InfoArgs {
    #[command(flatten)]
    target: TargetArgs,

    /// Installed package folder
    #[arg(long)]
    package_folder: PathBuf,

    /// Consumer does not use the GUI libraries
    #[arg(long)]
    no_gui: bool,

    /// Take the version from the checked-out version.h instead of the recipe
    #[arg(long)]
    from_source: bool,
}

fn parse_arch(s: &str) -> Result<Arch, String> {
    s.parse().map_err(|e: wxpack::Error| e.to_string())
}

fn parse_build_type(s: &str) -> Result<BuildType, String> {
    s.parse().map_err(|e: wxpack::Error| e.to_string())
}

fn parse_platform(s: &str) -> Result<Platform, String> {
    s.parse().map_err(|e: wxpack::Error| e.to_string())
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    if let Err(e) = wxpack::logging::init(cli.verbose) {
        eprintln!("{}", theme::error(&format!("Error: {e}")));
        std::process::exit(1);
    }
    if let Err(e) = run(cli).await {
        eprintln!("{}", theme::error(&format!("Error: {e:#}")));
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let root = std::path::absolute(&cli.root)
        .with_context(|| format!("cannot resolve project root {}", cli.root.display()))?;
    let recipe = Recipe::default();
    match cli.command {
        Command::Matrix(args) => run_matrix(&root, args).await,
        Command::Harvest(args) => run_harvest(args).await,
        Command::Source(args) => run_source(&root, &recipe, args).await,
        Command::Build(args) => run_build(&root, &recipe, args).await,
        Command::Package(args) => run_package(&root, &recipe, args),
        Command::Info(args) => run_info(&root, &recipe, args),
    }
}

async fn run_matrix(root: &Path, args: MatrixArgs) -> anyhow::Result<()> {
    let branch = args.branch.clone().or_else(|| detect_branch(root));
    let config = match &args.config {
        Some(path) => MatrixConfig::load(path)?,
        None => MatrixConfig::default(),
    }
    .with_branch(branch.as_deref())
    .with_env_overrides();
    tracing::info!(
        branch = branch.as_deref().unwrap_or("<unknown>"),
        channel = %config.channel,
        "resolved conan reference"
    );

    let policy = match args.policy {
        PolicyArg::Sequential => ExecutionPolicy::Sequential,
        PolicyArg::Pooled => ExecutionPolicy::Pooled {
            workers: args
                .jobs
                .unwrap_or_else(|| harvest::pool_size(config.combinations())),
        },
    };

    let dry_run = args.dry_run.dry_run;
    let environments = if args.harvest && dry_run {
        println!(
            "{}",
            theme::dim("Dry run: toolchain harvest skipped, builds shown without environments")
        );
        None
    } else if args.harvest {
        let harvester = Harvester::new(args.probe.probe());
        let envs = harvester
            .harvest(&config.versions, &config.architectures)
            .await
            .context("toolchain environment harvest failed")?;
        println!(
            "{}",
            theme::dim(&format!("Harvested {} toolchain environment(s)", envs.len()))
        );
        Some(envs)
    } else {
        None
    };

    let plan = matrix::plan(
        &config,
        root,
        PlanOptions {
            environments: environments.as_ref(),
            isolate_outputs: policy.is_concurrent(),
        },
    )?;
    print_plan(&plan, policy);
    if dry_run {
        return Ok(());
    }

    let driver = Driver::new(ShellExecutor, policy);
    let ran = driver.run(&plan).await?;
    println!("{}", theme::success(&format!("All {ran} matrix build(s) passed")));
    Ok(())
}

fn print_plan(plan: &MatrixPlan, policy: ExecutionPolicy) {
    let total = plan.builds.len();
    let mode = match policy {
        ExecutionPolicy::Sequential => "sequential".to_string(),
        ExecutionPolicy::Pooled { workers } => format!("pooled, {workers} worker(s)"),
    };
    println!(
        "{}",
        theme::heading(&format!("Pending commands: 1 export + {total} build(s) ({mode})"))
    );
    println!("  {} {}", theme::dim("[export]"), theme::command(&plan.registration.command_line));
    for (i, build) in plan.builds.iter().enumerate() {
        println!(
            "  {} {}",
            theme::dim(&format!("[{}/{total}]", i + 1)),
            theme::command(&build.invocation.command_line)
        );
    }
}

async fn run_harvest(args: HarvestArgs) -> anyhow::Result<()> {
    let harvester = Harvester::new(args.probe.probe());
    let envs = harvester.harvest(&args.versions, &args.arches).await?;
    for (version, arch, env) in envs.iter() {
        println!("{}", theme::heading(&format!("[{version} {arch}]")));
        for (key, value) in env.iter() {
            println!("{key}={value}");
        }
    }
    Ok(())
}

/// Print and run `commands` in order, stopping at the first failure.
async fn run_steps(commands: &[CommandInvocation], dry_run: bool) -> anyhow::Result<()> {
    for inv in commands {
        println!(
            "{} {}",
            theme::dim(&format!("[{}]", inv.working_dir.display())),
            theme::command(&inv.command_line)
        );
    }
    if dry_run {
        return Ok(());
    }
    for inv in commands {
        ShellExecutor.execute(inv).await?;
    }
    Ok(())
}

async fn run_source(root: &Path, recipe: &Recipe, args: DryRun) -> anyhow::Result<()> {
    let clone = recipe.source_command(root)?;
    run_steps(std::slice::from_ref(&clone), args.dry_run).await?;
    if args.dry_run {
        return Ok(());
    }
    let version = recipe.read_source_version(root)?;
    if version != recipe.parsed_version()? {
        tracing::warn!(
            source = %version,
            recipe = %recipe.version,
            "checked-out version differs from the recipe version"
        );
    }
    println!("{}", theme::success(&format!("Fetched wxWidgets {version}")));
    Ok(())
}

async fn run_build(root: &Path, recipe: &Recipe, args: BuildArgs) -> anyhow::Result<()> {
    let src = recipe.source_dir(root);
    if !args.dry_run.dry_run && !src.is_dir() {
        bail!("{} does not exist; run `wxpack source` first", src.display());
    }
    let req = BuildRequest {
        platform: args.target.platform()?,
        build_type: args.target.build_type,
        shared: args.target.shared,
        jobs: args
            .jobs
            .unwrap_or_else(|| harvest::pool_size(usize::MAX)),
    };
    run_steps(&recipe.build_commands(root, &req), args.dry_run.dry_run).await
}

fn run_package(root: &Path, recipe: &Recipe, args: PackageArgs) -> anyhow::Result<()> {
    let layout = recipe.package_layout(args.target.platform()?, args.target.arch, args.target.shared);
    let copied = package::copy_artifacts(&layout, root, &args.package_folder)?;
    for file in &copied {
        println!("  {}", theme::dim(&file.display().to_string()));
    }
    println!(
        "{}",
        theme::success(&format!(
            "Packaged {} file(s) into {}",
            copied.len(),
            args.package_folder.display()
        ))
    );
    Ok(())
}

fn run_info(root: &Path, recipe: &Recipe, args: InfoArgs) -> anyhow::Result<()> {
    let version = if args.from_source {
        recipe.read_source_version(root)?
    } else {
        recipe.parsed_version()?
    };
    let info = recipe.package_info(&InfoRequest {
        platform: args.target.platform()?,
        arch: args.target.arch,
        build_type: args.target.build_type,
        options: RecipeOptions {
            shared: args.target.shared,
            use_gui: !args.no_gui,
        },
        version,
        package_folder: &args.package_folder,
    });
    println!("{}", serde_json::to_string_pretty(&info)?);
    Ok(())
}
