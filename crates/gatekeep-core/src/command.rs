//! External command execution.
//!
//! Commands are always spawned from an argument vector; no shell is
//! involved. On unix each command leads its own process group. A timed-out
//! command's group first receives SIGTERM and, if the command is still alive
//! after the grace period, SIGKILL.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};
use tokio::task::{AbortHandle, JoinHandle};
use tracing::{debug, warn};

use crate::domain::error::ToolExecutionError;

/// Default wall-clock limit for a single command.
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

/// Time a command gets to exit after SIGTERM before it is killed.
pub const DEFAULT_KILL_GRACE_MS: u64 = 5_000;

/// Time output readers get to reach EOF once the command has ended.
const OUTPUT_DRAIN_MS: u64 = 500;

/// End-of-options marker placed before caller-supplied paths.
pub const END_OF_OPTIONS: &str = "--";

/// Options for a single command invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunOptions {
    /// Working directory (inherits the process cwd when `None`).
    pub cwd: Option<PathBuf>,

    /// Timeout in milliseconds (0 = no timeout).
    pub timeout_ms: u64,

    /// Capture stdout/stderr. When false both are discarded.
    pub capture_output: bool,

    /// Extra environment variables.
    pub env: BTreeMap<String, String>,

    /// Grace period between SIGTERM and SIGKILL.
    pub kill_grace_ms: u64,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            cwd: None,
            timeout_ms: DEFAULT_TIMEOUT_MS,
            capture_output: true,
            env: BTreeMap::new(),
            kill_grace_ms: DEFAULT_KILL_GRACE_MS,
        }
    }
}

impl RunOptions {
    /// Options rooted at `cwd` with the given timeout.
    pub fn in_dir(cwd: impl Into<PathBuf>, timeout_ms: u64) -> Self {
        Self {
            cwd: Some(cwd.into()),
            timeout_ms,
            ..Default::default()
        }
    }

    /// Add an environment variable.
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }
}

/// Result of one command invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandResult {
    /// `exit_code == Some(0) && !timed_out`.
    pub success: bool,

    /// Captured stdout, trimmed.
    pub stdout: String,

    /// Captured stderr, trimmed.
    pub stderr: String,

    /// Exit code; `None` when the process was terminated by a signal.
    pub exit_code: Option<i32>,

    /// Whether the timeout fired, regardless of how the process then ended.
    pub timed_out: bool,

    /// Signal that terminated the process (unix only).
    pub signal: Option<i32>,

    /// Wall-clock duration in milliseconds.
    pub duration_ms: u64,
}

impl CommandResult {
    /// Build a result from its parts, deriving `success`.
    pub fn new(exit_code: Option<i32>, stdout: &str, stderr: &str, timed_out: bool) -> Self {
        Self {
            success: exit_code == Some(0) && !timed_out,
            stdout: stdout.trim().to_string(),
            stderr: stderr.trim().to_string(),
            exit_code,
            timed_out,
            signal: None,
            duration_ms: 0,
        }
    }

    /// A successful result with the given stdout.
    pub fn ok(stdout: &str) -> Self {
        Self::new(Some(0), stdout, "", false)
    }

    /// A failed result with the given exit code and stderr.
    pub fn failed(exit_code: i32, stderr: &str) -> Self {
        Self::new(Some(exit_code), "", stderr, false)
    }

    /// stderr, or stdout when stderr is empty.
    pub fn error_text(&self) -> &str {
        if self.stderr.is_empty() {
            &self.stdout
        } else {
            &self.stderr
        }
    }

    /// Convert a timed-out result into an error, passing others through.
    pub fn into_completed(
        self,
        program: &str,
        timeout_ms: u64,
    ) -> Result<Self, ToolExecutionError> {
        if self.timed_out {
            Err(ToolExecutionError::TimedOut {
                program: program.to_string(),
                timeout_ms,
            })
        } else {
            Ok(self)
        }
    }
}

/// Build an argument vector where `paths` follow a literal `--`.
///
/// A path starting with `-` can then never be parsed as a flag.
pub fn args_with_paths<S, P>(base: &[S], paths: &[P]) -> Vec<String>
where
    S: AsRef<str>,
    P: AsRef<Path>,
{
    let mut args: Vec<String> = base.iter().map(|s| s.as_ref().to_string()).collect();
    args.push(END_OF_OPTIONS.to_string());
    args.extend(paths.iter().map(|p| p.as_ref().to_string_lossy().into_owned()));
    args
}

/// Something that can run an external command.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run `program` with `args`.
    ///
    /// A non-zero exit is reported in the result. Only failures to start the
    /// process (or to talk to it) are errors.
    async fn run(
        &self,
        program: &str,
        args: &[String],
        options: &RunOptions,
    ) -> Result<CommandResult, ToolExecutionError>;
}

/// Runs commands as child processes via tokio.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessRunner;

impl ProcessRunner {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl CommandRunner for ProcessRunner {
    async fn run(
        &self,
        program: &str,
        args: &[String],
        options: &RunOptions,
    ) -> Result<CommandResult, ToolExecutionError> {
        let start = Instant::now();
        let io_err = |e: std::io::Error| ToolExecutionError::Io {
            program: program.to_string(),
            reason: e.to_string(),
        };

        let mut command = Command::new(program);
        command.args(args).stdin(Stdio::null()).kill_on_drop(true);
        if let Some(cwd) = &options.cwd {
            command.current_dir(cwd);
        }
        command.envs(&options.env);
        #[cfg(unix)]
        command.process_group(0);
        if options.capture_output {
            command.stdout(Stdio::piped()).stderr(Stdio::piped());
        } else {
            command.stdout(Stdio::null()).stderr(Stdio::null());
        }

        let mut child = command.spawn().map_err(|e| ToolExecutionError::Spawn {
            program: program.to_string(),
            reason: e.to_string(),
        })?;

        let pid = child.id();
        debug!(program, args = ?args, pid = ?pid, "spawned command");

        let stdout_task = child.stdout.take().map(spawn_reader);
        let stderr_task = child.stderr.take().map(spawn_reader);

        let limit = (options.timeout_ms > 0).then(|| Duration::from_millis(options.timeout_ms));
        let (status, timed_out) = match limit {
            Some(limit) => match tokio::time::timeout(limit, child.wait()).await {
                Ok(status) => (status.map_err(io_err)?, false),
                Err(_) => {
                    warn!(
                        program,
                        timeout_ms = options.timeout_ms,
                        "command timed out, terminating"
                    );
                    let status = terminate(&mut child, pid, options.kill_grace_ms)
                        .await
                        .map_err(io_err)?;
                    (status, true)
                }
            },
            None => (child.wait().await.map_err(io_err)?, false),
        };

        let drain_deadline = limit.map(|limit| {
            let deadline = tokio::time::Instant::from_std(start) + limit;
            deadline.max(tokio::time::Instant::now()) + Duration::from_millis(OUTPUT_DRAIN_MS)
        });
        let (stdout, stderr) =
            collect_output(program, pid, stdout_task, stderr_task, drain_deadline).await;

        let mut result = CommandResult::new(status.code(), &stdout, &stderr, timed_out);
        result.signal = exit_signal(&status);
        result.duration_ms = start.elapsed().as_millis() as u64;
        Ok(result)
    }
}

fn spawn_reader<R>(mut reader: R) -> JoinHandle<String>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut buf = Vec::new();
        if let Err(e) = reader.read_to_end(&mut buf).await {
            debug!(error = %e, "output pipe closed early");
        }
        String::from_utf8_lossy(&buf).into_owned()
    })
}

async fn join_reader(task: Option<JoinHandle<String>>) -> String {
    match task {
        Some(handle) => handle.await.unwrap_or_default(),
        None => String::new(),
    }
}

/// Join both output readers.
///
/// Descendants that inherited the pipes can hold them open after the command
/// itself has exited. Readers still running at `deadline` get the process
/// group killed under them, then one more drain period before they are
/// aborted and their output dropped.
async fn collect_output(
    program: &str,
    pid: Option<u32>,
    stdout: Option<JoinHandle<String>>,
    stderr: Option<JoinHandle<String>>,
    deadline: Option<tokio::time::Instant>,
) -> (String, String) {
    let aborts: Vec<AbortHandle> = stdout
        .iter()
        .chain(stderr.iter())
        .map(JoinHandle::abort_handle)
        .collect();
    let mut output = Box::pin(futures::future::join(
        join_reader(stdout),
        join_reader(stderr),
    ));

    let Some(deadline) = deadline else {
        return output.await;
    };
    if let Ok(output) = tokio::time::timeout_at(deadline, &mut output).await {
        return output;
    }

    warn!(program, "output still open after exit, killing process group");
    kill_group(pid);
    let drain = Duration::from_millis(OUTPUT_DRAIN_MS);
    if let Ok(output) = tokio::time::timeout(drain, &mut output).await {
        return output;
    }

    warn!(program, "output pipes held by a detached process, abandoning them");
    for abort in &aborts {
        abort.abort();
    }
    output.await
}

/// SIGTERM, wait up to `grace_ms`, then SIGKILL.
async fn terminate(
    child: &mut Child,
    pid: Option<u32>,
    grace_ms: u64,
) -> std::io::Result<ExitStatus> {
    send_sigterm(child, pid);
    match tokio::time::timeout(Duration::from_millis(grace_ms), child.wait()).await {
        Ok(status) => status,
        Err(_) => {
            warn!(pid = ?pid, grace_ms, "command ignored SIGTERM, killing");
            kill_group(pid);
            child.kill().await?;
            child.wait().await
        }
    }
}

/// Send `signal` to the process group led by `pid`.
#[cfg(unix)]
fn signal_group(pid: Option<u32>, signal: i32) {
    let Some(pid) = pid.and_then(|pid| i32::try_from(pid).ok()) else {
        return;
    };
    // SAFETY: the child was spawned with `process_group(0)`, so `-pid`
    // addresses only the child and the processes it started.
    #[allow(unsafe_code)]
    let rc = unsafe { libc::kill(-pid, signal) };
    if rc != 0 {
        debug!(pid, signal, error = %std::io::Error::last_os_error(), "signal delivery failed");
    }
}

#[cfg(unix)]
fn send_sigterm(_child: &mut Child, pid: Option<u32>) {
    signal_group(pid, libc::SIGTERM);
}

#[cfg(not(unix))]
fn send_sigterm(child: &mut Child, _pid: Option<u32>) {
    // No graceful signal available; fall through to a hard kill.
    let _ = child.start_kill();
}

#[cfg(unix)]
fn kill_group(pid: Option<u32>) {
    signal_group(pid, libc::SIGKILL);
}

#[cfg(not(unix))]
fn kill_group(_pid: Option<u32>) {}

#[cfg(unix)]
fn exit_signal(status: &ExitStatus) -> Option<i32> {
    use std::os::unix::process::ExitStatusExt;
    status.signal()
}

#[cfg(not(unix))]
fn exit_signal(_status: &ExitStatus) -> Option<i32> {
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(args: &[&str]) -> Vec<String> {
        args.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_args_with_paths_inserts_separator() {
        let args = args_with_paths(&["add"], &["-rf", "src/lib.rs"]);
        assert_eq!(args, strings(&["add", "--", "-rf", "src/lib.rs"]));
    }

    #[test]
    fn test_command_result_success_requires_zero_exit() {
        assert!(CommandResult::ok("done").success);
        assert!(!CommandResult::failed(1, "boom").success);
        assert!(!CommandResult::new(Some(0), "", "", true).success);
        assert!(!CommandResult::new(None, "", "", false).success);
    }

    #[test]
    fn test_error_text_prefers_stderr() {
        let result = CommandResult::new(Some(1), "out", "err", false);
        assert_eq!(result.error_text(), "err");
        let result = CommandResult::new(Some(1), "out", "", false);
        assert_eq!(result.error_text(), "out");
    }

    #[tokio::test]
    async fn test_execute_simple_command() {
        let result = ProcessRunner
            .run("echo", &strings(&["hello"]), &RunOptions::default())
            .await
            .expect("run failed");
        assert!(result.success);
        assert_eq!(result.exit_code, Some(0));
        assert_eq!(result.stdout, "hello");
        assert!(!result.timed_out);
    }

    #[tokio::test]
    async fn test_execute_failing_command_is_not_an_error() {
        let result = ProcessRunner
            .run("false", &[], &RunOptions::default())
            .await
            .expect("run failed");
        assert!(!result.success);
        assert_eq!(result.exit_code, Some(1));
    }

    #[tokio::test]
    async fn test_stdout_and_stderr_are_separate() {
        let result = ProcessRunner
            .run(
                "sh",
                &strings(&["-c", "echo out; echo err 1>&2; exit 3"]),
                &RunOptions::default(),
            )
            .await
            .unwrap();
        assert_eq!(result.stdout, "out");
        assert_eq!(result.stderr, "err");
        assert_eq!(result.exit_code, Some(3));
    }

    #[tokio::test]
    async fn test_missing_executable_is_spawn_error() {
        let err = ProcessRunner
            .run("gatekeep-definitely-not-a-binary", &[], &RunOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ToolExecutionError::Spawn { .. }));
    }

    #[tokio::test]
    async fn test_cwd_and_env_are_applied() {
        let dir = tempfile::tempdir().unwrap();
        let options = RunOptions::in_dir(dir.path(), 5_000).with_env("GATEKEEP_MARKER", "42");
        let result = ProcessRunner
            .run("sh", &strings(&["-c", "pwd; echo $GATEKEEP_MARKER"]), &options)
            .await
            .unwrap();
        let canonical = dir.path().canonicalize().unwrap();
        assert!(result.stdout.contains(&canonical.display().to_string()));
        assert!(result.stdout.ends_with("42"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_timeout_sends_sigterm() {
        let options = RunOptions {
            timeout_ms: 100,
            ..Default::default()
        };
        let result = ProcessRunner
            .run("sleep", &strings(&["5"]), &options)
            .await
            .unwrap();
        assert!(result.timed_out);
        assert!(!result.success);
        assert_eq!(result.exit_code, None);
        assert_eq!(result.signal, Some(libc::SIGTERM));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_timeout_escalates_to_sigkill() {
        let options = RunOptions {
            timeout_ms: 100,
            kill_grace_ms: 200,
            ..Default::default()
        };
        let result = ProcessRunner
            .run("sh", &strings(&["-c", "trap '' TERM; sleep 5"]), &options)
            .await
            .unwrap();
        assert!(result.timed_out);
        assert!(!result.success);
        assert_eq!(result.signal, Some(libc::SIGKILL));
        assert!(result.duration_ms < 5_000);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_timeout_bounds_commands_with_children() {
        let options = RunOptions {
            timeout_ms: 100,
            kill_grace_ms: 200,
            ..Default::default()
        };
        let result = ProcessRunner
            .run("sh", &strings(&["-c", "sleep 4; true"]), &options)
            .await
            .unwrap();
        assert!(result.timed_out);
        assert!(!result.success);
        assert!(result.duration_ms < 2_000, "took {}ms", result.duration_ms);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_background_child_holding_output_is_reaped() {
        let options = RunOptions {
            timeout_ms: 300,
            ..Default::default()
        };
        let result = ProcessRunner
            .run("sh", &strings(&["-c", "sleep 4 & echo started"]), &options)
            .await
            .unwrap();
        assert!(result.success);
        assert!(!result.timed_out);
        assert_eq!(result.stdout, "started");
        assert!(result.duration_ms < 2_000, "took {}ms", result.duration_ms);
    }

    #[tokio::test]
    async fn test_into_completed_maps_timeout() {
        let timed_out = CommandResult::new(None, "", "", true);
        let err = timed_out.into_completed("prettier", 100).unwrap_err();
        assert_eq!(
            err,
            ToolExecutionError::TimedOut {
                program: "prettier".to_string(),
                timeout_ms: 100
            }
        );
    }
}
