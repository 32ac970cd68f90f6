//! Process execution behind the model invoker.
//!
//! [`CommandRunner`] is the seam between the attempt loop and the OS.
//! [`ProcessRunner`] is the production implementation:
//!
//! - **Spawning**: `tokio::process::Command` with `kill_on_drop`
//! - **I/O**: stdout and stderr drained by spawned tasks while stdin is fed,
//!   so a chatty child cannot deadlock against a large prompt
//! - **Timeout**: `tokio::time::timeout` around feeding stdin, waiting and
//!   draining both pipes; on expiry the readers are aborted and the child is
//!   killed and reaped

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::AsyncRead;
use tokio::io::AsyncReadExt;
use tokio::io::AsyncWriteExt;
use tokio::process::ChildStdin;
use tokio::process::Command;
use tokio::task::JoinHandle;

/// Program plus arguments for one attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    pub program: String,
    pub args: Vec<String>,
}

impl CommandLine {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }
}

/// Output of a process that ran to completion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CapturedOutput {
    pub stdout: String,
    pub stderr: String,
    /// Exit code; -1 when the process was terminated by a signal
    pub exit_code: i32,
}

/// Why a process could not be run to completion.
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    /// The executable does not exist or is not on PATH
    #[error("command not found: {0}")]
    NotFound(String),

    /// The process exceeded its time budget and was killed
    #[error("timed out after {0:?}")]
    TimedOut(Duration),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Runs a single external command to completion.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run `command`, writing `stdin` to its standard input when given.
    ///
    /// When `stdin` is `None` the child's standard input is closed.
    async fn run(
        &self,
        command: &CommandLine,
        stdin: Option<&str>,
        timeout: Duration,
    ) -> Result<CapturedOutput, RunError>;
}

/// [`CommandRunner`] backed by real child processes.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessRunner;

#[async_trait]
impl CommandRunner for ProcessRunner {
    async fn run(
        &self,
        command: &CommandLine,
        stdin: Option<&str>,
        timeout: Duration,
    ) -> Result<CapturedOutput, RunError> {
        let mut child = Command::new(&command.program)
            .args(&command.args)
            .stdin(if stdin.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    RunError::NotFound(command.program.clone())
                } else {
                    RunError::Io(e)
                }
            })?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| std::io::Error::other("stdout pipe unavailable"))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| std::io::Error::other("stderr pipe unavailable"))?;
        let stdout_handle = drain(stdout);
        let stderr_handle = drain(stderr);
        let stdout_abort = stdout_handle.abort_handle();
        let stderr_abort = stderr_handle.abort_handle();

        let stdin_pipe = child.stdin.take();
        let input = stdin.map(str::to_owned);
        let child_ref = &mut child;
        // Descendants can hold the pipes open after the child exits.
        let interaction = async move {
            if let (Some(pipe), Some(input)) = (stdin_pipe, input) {
                feed_stdin(pipe, &input).await?;
            }
            let status = child_ref.wait().await?;
            let stdout = collect(stdout_handle, "stdout").await?;
            let stderr = collect(stderr_handle, "stderr").await?;
            Ok::<_, RunError>((status, stdout, stderr))
        };

        let waited = tokio::time::timeout(timeout, interaction).await;
        let (status, stdout, stderr) = match waited {
            Ok(Ok(captured)) => captured,
            Ok(Err(e)) => return Err(e),
            Err(_) => {
                tracing::debug!(program = %command.program, ?timeout, "killing timed out process");
                stdout_abort.abort();
                stderr_abort.abort();
                if !matches!(child.try_wait(), Ok(Some(_))) {
                    // kill() also waits, so the child is reaped here.
                    if let Err(e) = child.kill().await {
                        tracing::warn!(program = %command.program, "failed to kill process: {e}");
                    }
                }
                return Err(RunError::TimedOut(timeout));
            }
        };

        Ok(CapturedOutput {
            stdout: String::from_utf8_lossy(&stdout).into_owned(),
            stderr: String::from_utf8_lossy(&stderr).into_owned(),
            exit_code: status.code().unwrap_or(-1),
        })
    }
}

/// Write the prompt and close the pipe to signal EOF.
///
/// A child that exits without reading (e.g. on a usage error) closes its
/// end early; the resulting broken pipe is not an error for the attempt.
async fn feed_stdin(mut pipe: ChildStdin, input: &str) -> std::io::Result<()> {
    match pipe.write_all(input.as_bytes()).await {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::BrokenPipe => {
            tracing::debug!("child closed stdin before reading the whole prompt");
            return Ok(());
        }
        Err(e) => return Err(e),
    }
    match pipe.shutdown().await {
        Err(e) if e.kind() != std::io::ErrorKind::BrokenPipe => Err(e),
        _ => Ok(()),
    }
}

fn drain<R>(mut reader: R) -> JoinHandle<std::io::Result<Vec<u8>>>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut buf = Vec::new();
        reader.read_to_end(&mut buf).await?;
        Ok(buf)
    })
}

async fn collect(
    handle: JoinHandle<std::io::Result<Vec<u8>>>,
    stream: &str,
) -> Result<Vec<u8>, RunError> {
    handle
        .await
        .map_err(|e| std::io::Error::other(format!("{stream} task join error: {e}")))?
        .map_err(RunError::Io)
}
