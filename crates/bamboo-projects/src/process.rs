//! Timeout-bounded external command execution
//!
//! Commands run with stdin closed and their output captured, never streamed.
//! On failure the captured stderr and stdout are folded into the error so the
//! caller sees what the tool printed.

use crate::error::{Error, Result};
use async_trait::async_trait;
use camino::Utf8Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tokio::task::JoinHandle;
use tracing::{debug, instrument, warn};

/// Default hard timeout for a single command
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(180);

/// Runs one external program to completion
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run `program` with `args`
    ///
    /// `working_dir = None` inherits the current directory.
    async fn run(&self, working_dir: Option<&Utf8Path>, program: &str, args: &[&str])
        -> Result<()>;
}

/// Runs commands as real child processes
#[derive(Debug, Clone)]
pub struct SystemCommandRunner {
    timeout: Duration,
}

impl SystemCommandRunner {
    /// Create a runner with the given timeout
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// Timeout applied to every command
    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl Default for SystemCommandRunner {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEOUT)
    }
}

#[async_trait]
impl CommandRunner for SystemCommandRunner {
    #[instrument(skip_all, fields(program = program, timeout_secs = self.timeout.as_secs()))]
    async fn run(
        &self,
        working_dir: Option<&Utf8Path>,
        program: &str,
        args: &[&str],
    ) -> Result<()> {
        let command_line = format_command(program, args);
        let resolved = which::which(program).map_err(|_| Error::command_not_found(program))?;

        let mut cmd = Command::new(resolved);
        cmd.args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(dir) = working_dir {
            cmd.current_dir(dir);
        }

        debug!(dir = ?working_dir, "Running: {}", command_line);
        let mut child = cmd.spawn().map_err(|source| Error::CommandLaunch {
            command: command_line.clone(),
            source,
        })?;

        let mut stdout = spawn_reader(child.stdout.take());
        let mut stderr = spawn_reader(child.stderr.take());

        // Pipes can outlive the child when it leaves background processes
        // behind, so draining them counts against the same deadline.
        let finished = tokio::time::timeout(self.timeout, async {
            let status = child.wait().await?;
            let out = (&mut stdout).await.unwrap_or_default();
            let err = (&mut stderr).await.unwrap_or_default();
            Ok::<_, std::io::Error>((status, out, err))
        })
        .await;

        let (status, stdout, stderr) = match finished {
            Ok(Ok(done)) => done,
            Ok(Err(source)) => {
                return Err(Error::CommandLaunch {
                    command: command_line,
                    source,
                });
            }
            Err(_) => {
                warn!(
                    timeout_secs = self.timeout.as_secs(),
                    "{} timed out, killing", command_line
                );
                stdout.abort();
                stderr.abort();
                if let Err(e) = child.kill().await {
                    debug!("Failed to kill {}: {}", command_line, e);
                }
                return Err(Error::command_timeout(command_line, self.timeout));
            }
        };

        debug!(exit_code = ?status.code(), "{} finished", command_line);
        if status.success() {
            return Ok(());
        }

        Err(Error::command_failed(
            command_line,
            status.code(),
            combine_output(&stderr, &stdout),
        ))
    }
}

fn spawn_reader<R>(stream: Option<R>) -> JoinHandle<Vec<u8>>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut buf = Vec::new();
        if let Some(mut stream) = stream {
            if let Err(e) = stream.read_to_end(&mut buf).await {
                debug!("Stopped reading command output: {}", e);
            }
        }
        buf
    })
}

/// Render a command line for logs and error messages
pub fn format_command(program: &str, args: &[&str]) -> String {
    if args.is_empty() {
        program.to_string()
    } else {
        format!("{} {}", program, args.join(" "))
    }
}

/// Error stream first, then output stream, trimmed
fn combine_output(stderr: &[u8], stdout: &[u8]) -> String {
    let stderr = String::from_utf8_lossy(stderr);
    let stdout = String::from_utf8_lossy(stdout);
    format!("{}\n{}", stderr.trim_end(), stdout.trim_end())
        .trim()
        .to_string()
}
