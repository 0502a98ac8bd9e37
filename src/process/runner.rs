//! Managed execution of the external tool.
//!
//! One call to [`run`] moves through these states:
//!
//! ```text
//! Spawning -> Running -> { Exited(code) | TimedOut | SpawnFailed } -> Resolved
//! ```
//!
//! Stdout and stderr are drained concurrently from the moment the child
//! starts, so a chatty child never stalls on a full pipe. The timer always
//! fires eventually, so a call never hangs.

use std::collections::BTreeMap;
use std::fmt::Display;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::process::{Child, Command};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::outcome::{FailureReason, Outcome};

/// Default wall-clock budget for one invocation.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(5000);

/// How long to keep reading pipes once the child is gone.
const DRAIN_GRACE: Duration = Duration::from_millis(500);

/// How long a child may ignore SIGABRT before it is killed outright.
const KILL_GRACE: Duration = Duration::from_millis(500);

/// Per-invocation settings.
#[derive(Debug, Clone)]
pub struct SpawnOptions {
    /// Working directory for the child (inherited when `None`).
    pub cwd: Option<PathBuf>,
    /// Variables added on top of the inherited environment.
    pub env: BTreeMap<String, String>,
    /// Wall-clock budget before the child is aborted.
    pub timeout: Duration,
}

impl Default for SpawnOptions {
    fn default() -> Self {
        Self {
            cwd: None,
            env: BTreeMap::new(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl SpawnOptions {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }
}

/// How the child stopped running.
enum Settled {
    Exited(ExitStatus),
    TimedOut,
    WaitFailed(io::Error),
}

type Buffer = Arc<Mutex<Vec<u8>>>;

/// Run `program` with `args`, piping `input` to its stdin when present.
///
/// With no input, stdin is not connected and the child sees EOF at once.
/// Exit code 0 resolves to success with stdout; anything else (including
/// death by signal) resolves to failure with stderr.
pub async fn run(
    program: &Path,
    args: &[String],
    options: &SpawnOptions,
    input: Option<&str>,
) -> Outcome {
    let mut command = Command::new(program);
    command
        .args(args)
        .envs(&options.env)
        .stdin(if input.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        })
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    if let Some(cwd) = &options.cwd {
        command.current_dir(cwd);
    }

    debug!(program = %program.display(), ?args, "spawning");
    let mut child = match command.spawn() {
        Ok(child) => child,
        Err(err) => {
            debug!(program = %program.display(), error = %err, "spawn failed");
            let mut stderr = Vec::new();
            write_banner(&mut stderr, args, &err);
            return Outcome::failure(FailureReason::SpawnError, stderr);
        }
    };

    let stdin_task = match (child.stdin.take(), input) {
        (Some(mut stdin), Some(input)) => {
            let payload = input.as_bytes().to_vec();
            Some(tokio::spawn(async move {
                stdin.write_all(&payload).await?;
                stdin.shutdown().await
            }))
        }
        _ => None,
    };

    let stdout = Buffer::default();
    let stderr = Buffer::default();
    let stdout_task = child
        .stdout
        .take()
        .map(|pipe| tokio::spawn(drain(pipe, Arc::clone(&stdout))));
    let stderr_task = child
        .stderr
        .take()
        .map(|pipe| tokio::spawn(drain(pipe, Arc::clone(&stderr))));

    let settled = tokio::select! {
        status = child.wait() => match status {
            Ok(status) => Settled::Exited(status),
            Err(err) => Settled::WaitFailed(err),
        },
        _ = tokio::time::sleep(options.timeout) => {
            debug!(timeout_ms = options.timeout.as_millis() as u64, "timeout reached, aborting child");
            abort(&mut child).await;
            Settled::TimedOut
        }
    };

    let mut stream_errors = Vec::new();
    collect("stdin", stdin_task, &mut stream_errors).await;
    collect("stdout", stdout_task, &mut stream_errors).await;
    collect("stderr", stderr_task, &mut stream_errors).await;

    let stdout = std::mem::take(&mut *stdout.lock().await);
    let mut stderr = std::mem::take(&mut *stderr.lock().await);

    for (stream, err) in &stream_errors {
        debug!(stream, error = %err, "stream error");
        write_banner(&mut stderr, args, &format!("{stream}: {err}"));
    }

    let outcome = match settled {
        Settled::TimedOut => {
            stderr.extend_from_slice(
                format!(
                    "Command aborted: {} ms timeout reached!\n",
                    options.timeout.as_millis()
                )
                .as_bytes(),
            );
            Outcome::failure(FailureReason::Timeout, stderr)
        }
        Settled::WaitFailed(err) => {
            write_banner(&mut stderr, args, &err);
            Outcome::failure(FailureReason::StreamError, stderr)
        }
        Settled::Exited(_) if !stream_errors.is_empty() => {
            Outcome::failure(FailureReason::StreamError, stderr)
        }
        Settled::Exited(status) if status.code() == Some(0) => Outcome::success(stdout),
        Settled::Exited(status) => {
            debug!(code = ?status.code(), "child failed");
            Outcome::failure(FailureReason::NonZeroExit, stderr)
        }
    };

    debug!(reason = ?outcome.reason(), "resolved");
    outcome
}

/// Copy a pipe into `buffer` chunk by chunk until EOF.
async fn drain<R: AsyncRead + Unpin>(mut pipe: R, buffer: Buffer) -> io::Result<()> {
    let mut chunk = vec![0u8; 8192];
    loop {
        let n = pipe.read(&mut chunk).await?;
        if n == 0 {
            return Ok(());
        }
        buffer.lock().await.extend_from_slice(&chunk[..n]);
    }
}

/// Wait briefly for a pipe task and record its error, if any.
async fn collect(
    stream: &'static str,
    task: Option<JoinHandle<io::Result<()>>>,
    errors: &mut Vec<(&'static str, io::Error)>,
) {
    let Some(mut task) = task else {
        return;
    };
    match tokio::time::timeout(DRAIN_GRACE, &mut task).await {
        Ok(Ok(Ok(()))) => {}
        // The child closed stdin without reading all of it.
        Ok(Ok(Err(err))) if stream == "stdin" && err.kind() == io::ErrorKind::BrokenPipe => {
            debug!("child did not consume its input");
        }
        Ok(Ok(Err(err))) => errors.push((stream, err)),
        Ok(Err(join_err)) => errors.push((stream, io::Error::other(join_err))),
        Err(_) => {
            // Usually a grandchild still holding the pipe.
            debug!(stream, "pipe still open after child settled");
            task.abort();
        }
    }
}

/// Abort the child, escalating to a hard kill if it ignores the signal.
async fn abort(child: &mut Child) {
    if let Err(err) = send_abort(child) {
        debug!(error = %err, "abort signal not delivered");
    }
    if tokio::time::timeout(KILL_GRACE, child.wait()).await.is_err() {
        debug!("child ignored abort signal, killing");
        if let Err(err) = child.kill().await {
            warn!(error = %err, "kill failed");
        }
    }
}

#[cfg(unix)]
fn send_abort(child: &mut Child) -> io::Result<()> {
    let Some(pid) = child.id() else {
        // Already reaped.
        return Ok(());
    };
    // SAFETY: `pid` is our own child and has not been reaped yet.
    let rc = unsafe { libc::kill(pid as libc::pid_t, libc::SIGABRT) };
    if rc == 0 {
        Ok(())
    } else {
        Err(io::Error::last_os_error())
    }
}

#[cfg(not(unix))]
fn send_abort(child: &mut Child) -> io::Result<()> {
    child.start_kill()
}

/// Two-line banner naming the invocation, then the error.
fn write_banner(stderr: &mut Vec<u8>, args: &[String], error: &dyn Display) {
    stderr.extend_from_slice(format!("jq query: {}\nerror: {}\n", args.join(" "), error).as_bytes());
}
