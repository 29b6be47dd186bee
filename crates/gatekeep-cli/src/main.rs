//! Gatekeep - quality gate for commits and agent edits
//!
//! The `gatekeep` command runs configured formatters, linters and type
//! checkers, fixes what can be fixed silently, stages exactly the files it
//! changed, and blocks on the rest.
//!
//! ## Commands
//!
//! - `check`: Gate an explicit list of files
//! - `pre-commit`: Gate the files staged for the next commit
//! - `agent-hook`: Gate the file named in an agent post-edit hook payload

mod config;
mod hook;
mod report;

use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use gatekeep_core::obs::gate_span;
use gatekeep_core::path::normalize;
use gatekeep_core::{
    BoundedExecutor, Classifier, CommandRunner, FixOrchestrator, GateContext, Invocation,
    OrchestrateOptions, OrchestrationReport, ProcessRunner, Repository, StagingConfig,
};
use gatekeep_tools::{is_covered, CommandAnalyzer, CommandFixer};
use tracing::{debug, info, Instrument, Level};

use crate::config::GateConfig;
use crate::hook::HookPayload;
use crate::report::{exit_code, render_json, render_text, Facade};

#[derive(Parser)]
#[command(name = "gatekeep")]
#[command(author = "Stevedores Org")]
#[command(version = gatekeep_core::VERSION)]
#[command(about = "Quality gate for commits and AI agent edits", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json_logs: bool,

    /// Config file (default: <repo>/.gatekeep.json)
    #[arg(long, global = true, env = "GATEKEEP_CONFIG")]
    config: Option<PathBuf>,

    /// Directory inside the repository (default: current directory)
    #[arg(long, global = true)]
    repo: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Gate the given files (default: files staged for commit)
    Check {
        files: Vec<PathBuf>,

        /// Fix and stage fixable findings
        #[arg(long)]
        fix: bool,

        /// Report format
        #[arg(long, value_enum, default_value_t = Format::Text)]
        format: Format,
    },

    /// Gate the files staged for the next commit
    PreCommit {
        /// Report fixable findings instead of fixing them
        #[arg(long)]
        no_fix: bool,
    },

    /// Gate the file from an agent hook payload read on stdin
    AgentHook,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Text,
    Json,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // Setup logging
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::WARN
    };
    gatekeep_core::telemetry::init_tracing(cli.json_logs, level);

    let cwd = std::env::current_dir().context("Failed to read current directory")?;
    let repo_dir = cli.repo.clone().unwrap_or_else(|| cwd.clone());

    let code = match cli.command {
        Commands::Check {
            files,
            fix,
            format,
        } => cmd_check(&cli.config, &repo_dir, &cwd, files, fix, format).await?,
        Commands::PreCommit { no_fix } => cmd_pre_commit(&cli.config, &repo_dir, no_fix).await?,
        Commands::AgentHook => cmd_agent_hook(&cli.config, cli.repo.as_deref(), &cwd).await?,
    };
    Ok(ExitCode::from(code))
}

/// Repository, config and orchestrator for one run.
struct Gate {
    repo: Repository,
    config: GateConfig,
    orchestrator: FixOrchestrator,
}

impl Gate {
    async fn open(dir: &Path, config_path: Option<&Path>) -> Result<Self> {
        let runner: Arc<dyn CommandRunner> = Arc::new(ProcessRunner);
        let found = Repository::discover(dir, runner.clone(), StagingConfig::default())
            .await
            .with_context(|| format!("{} is not inside a git repository", dir.display()))?;
        let root = found.root().to_path_buf();

        let config = GateConfig::load(&root, config_path)?;
        let executor = BoundedExecutor::with_limit(config.max_concurrency);

        let repo = Repository::open(&root, runner.clone(), config.staging.clone())
            .with_executor(executor.clone());
        let analyzer = CommandAnalyzer::new(runner.clone(), &root, config.tools.clone())
            .with_executor(executor);
        let fixer = CommandFixer::new(runner, &root, config.tools.clone());

        let orchestrator =
            FixOrchestrator::new(repo.clone(), Arc::new(analyzer), Arc::new(fixer))
                .with_classifier(Classifier::new(config.classifier.clone()))
                .with_partial_staging(config.partial_staging);

        debug!(root = %root.display(), "gate ready");
        Ok(Self {
            repo,
            config,
            orchestrator,
        })
    }

    /// Staged files that at least one tool looks at.
    async fn staged_candidates(&self) -> Result<Vec<PathBuf>> {
        let staged = self
            .repo
            .staged_files()
            .await
            .context("Failed to list staged files")?;
        Ok(staged
            .into_iter()
            .filter(|file| is_covered(&self.config.tools, file))
            .collect())
    }

    async fn run(
        &self,
        ctx: &GateContext,
        files: &[PathBuf],
        attempt_fix: bool,
    ) -> OrchestrationReport {
        self.orchestrator
            .orchestrate(ctx, files, OrchestrateOptions { attempt_fix })
            .instrument(gate_span(ctx))
            .await
    }
}

async fn cmd_check(
    config_path: &Option<PathBuf>,
    repo_dir: &Path,
    cwd: &Path,
    files: Vec<PathBuf>,
    fix: bool,
    format: Format,
) -> Result<u8> {
    let gate = Gate::open(repo_dir, config_path.as_deref()).await?;

    let files = if files.is_empty() {
        gate.staged_candidates().await?
    } else {
        files
            .iter()
            .map(|f| normalize(f, Some(cwd)))
            .collect::<std::result::Result<Vec<_>, _>>()
            .context("Invalid file argument")?
    };

    let ctx = GateContext::new(Invocation::Cli);
    let report = gate.run(&ctx, &files, fix && gate.config.attempt_fix).await;

    match format {
        Format::Text => eprint!("{}", render_text(&report)),
        Format::Json => println!("{}", render_json(&report)?),
    }
    Ok(exit_code(Facade::Check, report.outcome))
}

async fn cmd_pre_commit(
    config_path: &Option<PathBuf>,
    repo_dir: &Path,
    no_fix: bool,
) -> Result<u8> {
    let gate = Gate::open(repo_dir, config_path.as_deref()).await?;
    let files = gate.staged_candidates().await?;
    if files.is_empty() {
        info!("no staged files to check");
        return Ok(0);
    }

    let ctx = GateContext::new(Invocation::PreCommit);
    let report = gate.run(&ctx, &files, gate.config.attempt_fix && !no_fix).await;

    if !report.passed() || !report.staged_files.is_empty() {
        eprint!("{}", render_text(&report));
    }
    Ok(exit_code(Facade::PreCommit, report.outcome))
}

async fn cmd_agent_hook(
    config_path: &Option<PathBuf>,
    repo: Option<&Path>,
    cwd: &Path,
) -> Result<u8> {
    let mut input = String::new();
    std::io::stdin()
        .read_to_string(&mut input)
        .context("Failed to read hook payload from stdin")?;

    let payload = match HookPayload::parse(&input) {
        Ok(payload) => payload,
        Err(e) => {
            eprintln!("gatekeep: {e:#}");
            return Ok(exit_code(Facade::AgentHook, gatekeep_core::Outcome::Failed));
        }
    };

    let Some(file) = payload.target_file(cwd) else {
        debug!(tool = ?payload.tool_name, "hook payload names no file");
        return Ok(0);
    };

    let dir = match repo {
        Some(dir) => dir.to_path_buf(),
        None => file.parent().map(Path::to_path_buf).unwrap_or_else(|| cwd.to_path_buf()),
    };
    let gate = match Gate::open(&dir, config_path.as_deref()).await {
        Ok(gate) => gate,
        Err(e) => {
            debug!(error = %e, "edited file is outside a repository, not gating");
            return Ok(0);
        }
    };

    if !is_covered(&gate.config.tools, &file) {
        debug!(file = %file.display(), "no tool covers this file");
        return Ok(0);
    }

    let ctx = GateContext::new(Invocation::AgentHook);
    let report = gate.run(&ctx, &[file], gate.config.attempt_fix).await;

    if !report.passed() {
        eprint!("{}", render_text(&report));
    }
    Ok(exit_code(Facade::AgentHook, report.outcome))
}
