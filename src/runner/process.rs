//! Direct process runner
//!
//! Spawns the program as a child process in its own process group, feeds
//! stdin and drains stdout/stderr concurrently, and returns once the child
//! itself exits. The whole group is killed on exit and when the wall-clock
//! limit elapses.

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::io;
use std::process::{ExitStatus, Stdio};
use std::time::{Duration, Instant};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::process::{ChildStdin, Command};
use tracing::{debug, warn};

use super::{CommandSpec, RunLimits, RunOutcome, RunStatus, Runner};

/// How long to keep reading output after the child has exited
const DRAIN_GRACE: Duration = Duration::from_secs(1);

/// Runner that executes programs directly on the host
#[derive(Debug, Clone, Default)]
pub struct ProcessRunner;

impl ProcessRunner {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Runner for ProcessRunner {
    async fn run(
        &self,
        cmd: &CommandSpec,
        stdin_content: &[u8],
        limits: &RunLimits,
    ) -> Result<RunOutcome> {
        if cmd.program.is_empty() {
            anyhow::bail!("No command specified for execution");
        }

        debug!("Running {:?} with args: {:?}", cmd.program, cmd.args);

        let mut command = Command::new(&cmd.program);
        command
            .args(&cmd.args)
            .envs(cmd.env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = &cmd.work_dir {
            command.current_dir(dir);
        }
        #[cfg(unix)]
        command.process_group(0);

        let started = Instant::now();
        let mut child = command
            .spawn()
            .with_context(|| format!("Failed to spawn {}", cmd.program))?;
        let pid = child.id();

        let writer = tokio::spawn(write_input(child.stdin.take(), stdin_content.to_vec()));
        let stdout = tokio::spawn(drain(child.stdout.take()));
        let stderr = tokio::spawn(drain(child.stderr.take()));
        let pipes = [
            writer.abort_handle(),
            stdout.abort_handle(),
            stderr.abort_handle(),
        ];

        let status = match tokio::time::timeout(limits.timeout(), child.wait()).await {
            Ok(status) => status.context("Failed to wait for process")?,
            Err(_) => {
                warn!(
                    "{} exceeded {}ms, killing process group",
                    cmd.program, limits.time_ms
                );
                kill_process_group(pid);
                if let Err(e) = child.kill().await {
                    debug!("Child already gone after timeout: {}", e);
                }
                pipes.iter().for_each(|p| p.abort());

                return Ok(RunOutcome {
                    status: RunStatus::TimedOut,
                    stdout: String::new(),
                    stderr: String::new(),
                    elapsed: started.elapsed(),
                });
            }
        };
        let elapsed = started.elapsed();

        // Leftover background processes of the group may still hold the pipes
        kill_process_group(pid);

        let collected =
            tokio::time::timeout(DRAIN_GRACE, async { tokio::join!(writer, stdout, stderr) })
                .await;
        let (stdout, stderr) = match collected {
            Ok((written, stdout, stderr)) => {
                written
                    .context("stdin writer panicked")?
                    .context("Failed to write process stdin")?;
                (
                    stdout
                        .context("stdout reader panicked")?
                        .context("Failed to read process stdout")?,
                    stderr
                        .context("stderr reader panicked")?
                        .context("Failed to read process stderr")?,
                )
            }
            Err(_) => {
                warn!(
                    "{} exited but its output pipes stayed open, dropping output",
                    cmd.program
                );
                pipes.iter().for_each(|p| p.abort());
                (Vec::new(), Vec::new())
            }
        };

        Ok(RunOutcome {
            status: run_status(status),
            stdout: String::from_utf8_lossy(&stdout).to_string(),
            stderr: String::from_utf8_lossy(&stderr).to_string(),
            elapsed,
        })
    }
}

/// Write all input then close stdin so the child sees end-of-input.
/// A child that exits without reading everything is not an error.
async fn write_input(stdin: Option<ChildStdin>, input: Vec<u8>) -> io::Result<()> {
    let Some(mut stdin) = stdin else {
        return Ok(());
    };
    let result = match stdin.write_all(&input).await {
        Ok(()) => stdin.shutdown().await,
        Err(e) => Err(e),
    };
    drop(stdin);
    match result {
        Err(e) if e.kind() == io::ErrorKind::BrokenPipe => Ok(()),
        other => other,
    }
}

async fn drain<R: AsyncRead + Unpin>(pipe: Option<R>) -> io::Result<Vec<u8>> {
    let mut buf = Vec::new();
    if let Some(mut pipe) = pipe {
        pipe.read_to_end(&mut buf).await?;
    }
    Ok(buf)
}

fn run_status(status: ExitStatus) -> RunStatus {
    if let Some(code) = status.code() {
        return RunStatus::Exited(code);
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(sig) = status.signal() {
            return RunStatus::Signaled(sig);
        }
    }
    RunStatus::Exited(-1)
}

#[cfg(unix)]
fn kill_process_group(pid: Option<u32>) {
    use nix::sys::signal::{killpg, Signal};
    use nix::unistd::Pid;

    if let Some(pid) = pid {
        if let Err(e) = killpg(Pid::from_raw(pid as i32), Signal::SIGKILL) {
            debug!("killpg({}) failed: {}", pid, e);
        }
    }
}

#[cfg(not(unix))]
fn kill_process_group(_pid: Option<u32>) {}
