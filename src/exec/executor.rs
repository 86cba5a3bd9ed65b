//! Child process execution with combined output capture.

use std::borrow::Cow;
use std::process::{ExitStatus, Stdio};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};

use crate::config::{ExecConfig, ExecMode};
use crate::exec::buffer::OutputBuffer;

/// Size of each read from the child's pipes.
pub const READ_CHUNK: usize = 4096;

/// Errors that prevent a command from producing output.
#[derive(Debug, Error)]
pub enum ExecError {
    /// The program could not be started.
    #[error("failed to spawn `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// Argument-vector mode got nothing to run.
    #[error("empty command")]
    EmptyCommand,

    /// Reaping the child failed.
    #[error("failed to wait for child: {0}")]
    Wait(#[source] std::io::Error),
}

/// Everything the child wrote, plus how it ended.
#[derive(Debug)]
pub struct CapturedOutput {
    pub bytes: Vec<u8>,
    /// Exit status, if the child was reaped normally.
    pub status: Option<ExitStatus>,
    /// The child was killed after exceeding the execution timeout.
    pub timed_out: bool,
    /// Output beyond the configured cap was discarded.
    pub truncated: bool,
}

impl CapturedOutput {
    /// Output as text, replacing invalid UTF-8.
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.bytes)
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Runs submitted commands.
///
/// In shell mode the string is handed verbatim to the configured shell, so
/// the caller gets full shell semantics (pipes, globbing, redirection). In
/// argv mode it is split on whitespace and spawned without a shell.
#[derive(Debug)]
pub struct Executor {
    config: ExecConfig,
    spawned: AtomicU64,
}

impl Executor {
    pub fn new(config: ExecConfig) -> Self {
        Self {
            config,
            spawned: AtomicU64::new(0),
        }
    }

    /// Number of child processes started so far.
    pub fn spawn_count(&self) -> u64 {
        self.spawned.load(Ordering::Relaxed)
    }

    fn timeout(&self) -> Option<Duration> {
        (self.config.timeout_secs > 0).then(|| Duration::from_secs(self.config.timeout_secs))
    }

    fn build_command(&self, command: &str) -> Result<(String, Command), ExecError> {
        let (program, mut cmd) = match self.config.mode {
            ExecMode::Shell => {
                let mut cmd = Command::new(&self.config.shell);
                shell_args(&mut cmd, &self.config.shell_flag, command);
                (self.config.shell.clone(), cmd)
            }
            ExecMode::Argv => {
                let mut parts = command.split_whitespace();
                let program = parts.next().ok_or(ExecError::EmptyCommand)?;
                let mut cmd = Command::new(program);
                cmd.args(parts);
                (program.to_string(), cmd)
            }
        };

        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        // Own process group, so a timeout can take down everything the shell started.
        #[cfg(unix)]
        cmd.process_group(0);
        Ok((program, cmd))
    }

    /// Run `command` to completion and capture stdout and stderr together.
    ///
    /// The timeout covers both reading the pipes and waiting for the exit
    /// status. On expiry the child's process group is killed and reaped.
    pub async fn execute(&self, command: &str) -> Result<CapturedOutput, ExecError> {
        let (program, mut cmd) = self.build_command(command)?;
        let mut child = cmd
            .spawn()
            .map_err(|source| ExecError::Spawn { program, source })?;
        self.spawned.fetch_add(1, Ordering::Relaxed);

        let group = ProcessGroup::of(&child);
        tracing::debug!(pid = ?child.id(), "Child spawned");

        let mut buffer = OutputBuffer::new(self.config.max_output_bytes);
        let run = async {
            collect_output(&mut child, &mut buffer).await;
            child.wait().await
        };
        let finished = match self.timeout() {
            Some(limit) => tokio::time::timeout(limit, run).await.ok(),
            None => Some(run.await),
        };

        let status = match finished {
            Some(status) => Some(status.map_err(ExecError::Wait)?),
            None => {
                tracing::warn!(pid = ?child.id(), "Command timed out, killing process group");
                group.kill();
                #[cfg(not(unix))]
                if let Err(e) = child.start_kill() {
                    tracing::warn!(error = %e, "Failed to kill child");
                }
                child.wait().await.map_err(ExecError::Wait)?;
                None
            }
        };
        group.disarm();

        Ok(CapturedOutput {
            truncated: buffer.is_truncated(),
            bytes: buffer.into_bytes(),
            timed_out: status.is_none(),
            status,
        })
    }
}

/// Process group of a spawned child, killed on drop until disarmed.
///
/// Covers the paths where `execute` is cancelled mid-flight: `kill_on_drop`
/// only reaches the direct child, not what the shell forked.
struct ProcessGroup {
    #[cfg_attr(not(unix), allow(dead_code))]
    pgid: Option<i32>,
}

impl ProcessGroup {
    fn of(child: &Child) -> Self {
        Self {
            pgid: child.id().and_then(|id| i32::try_from(id).ok()),
        }
    }

    #[cfg(unix)]
    fn kill(&self) {
        let Some(pgid) = self.pgid else { return };
        // SAFETY: plain syscall; a negative pid addresses the process group.
        if unsafe { libc::kill(-pgid, libc::SIGKILL) } == -1 {
            let err = std::io::Error::last_os_error();
            if err.raw_os_error() != Some(libc::ESRCH) {
                tracing::warn!(pgid, error = %err, "Failed to kill process group");
            }
        }
    }

    #[cfg(not(unix))]
    fn kill(&self) {}

    /// The child has been reaped; its group must not be signalled again.
    fn disarm(mut self) {
        self.pgid = None;
    }
}

impl Drop for ProcessGroup {
    fn drop(&mut self) {
        self.kill();
    }
}

#[cfg(not(windows))]
fn shell_args(cmd: &mut Command, flag: &str, command: &str) {
    cmd.arg(flag).arg(command);
}

// cmd.exe does its own parsing, so the command line must not be re-quoted.
#[cfg(windows)]
fn shell_args(cmd: &mut Command, flag: &str, command: &str) {
    cmd.raw_arg(flag).raw_arg(command);
}

enum Pipe {
    Stdout,
    Stderr,
}

/// Read both pipes until each reports end-of-stream, appending chunks into
/// `buffer` in the order they arrive.
async fn collect_output(child: &mut Child, buffer: &mut OutputBuffer) {
    let mut stdout = child.stdout.take();
    let mut stderr = child.stderr.take();
    let mut out_chunk = [0u8; READ_CHUNK];
    let mut err_chunk = [0u8; READ_CHUNK];

    while stdout.is_some() || stderr.is_some() {
        let (pipe, read) = tokio::select! {
            read = read_some(&mut stdout, &mut out_chunk) => (Pipe::Stdout, read),
            read = read_some(&mut stderr, &mut err_chunk) => (Pipe::Stderr, read),
        };

        match read {
            Ok(n) if n > 0 => match pipe {
                Pipe::Stdout => buffer.push(&out_chunk[..n]),
                Pipe::Stderr => buffer.push(&err_chunk[..n]),
            },
            result => {
                if let Err(e) = result {
                    tracing::warn!(error = %e, "Failed reading child output");
                }
                match pipe {
                    Pipe::Stdout => stdout = None,
                    Pipe::Stderr => stderr = None,
                }
            }
        }
    }
}

async fn read_some<R>(pipe: &mut Option<R>, chunk: &mut [u8]) -> std::io::Result<usize>
where
    R: AsyncRead + Unpin,
{
    match pipe {
        Some(reader) => reader.read(chunk).await,
        None => std::future::pending().await,
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn executor(mode: ExecMode) -> Executor {
        Executor::new(ExecConfig {
            mode,
            timeout_secs: 10,
            ..ExecConfig::default()
        })
    }

    #[tokio::test]
    async fn echo_captures_line() {
        let exec = executor(ExecMode::Shell);
        let out = exec.execute("echo hello").await.unwrap();
        assert_eq!(out.text(), "hello\n");
        assert!(out.status.unwrap().success());
        assert_eq!(exec.spawn_count(), 1);
    }

    #[tokio::test]
    async fn empty_command_runs_in_shell() {
        let out = executor(ExecMode::Shell).execute("").await.unwrap();
        assert!(out.is_empty());
        assert!(!out.timed_out);
    }

    #[tokio::test]
    async fn stderr_is_merged() {
        let out = executor(ExecMode::Shell)
            .execute("echo out; echo err 1>&2")
            .await
            .unwrap();
        let text = out.text();
        assert!(text.contains("out\n"));
        assert!(text.contains("err\n"));
    }

    #[tokio::test]
    async fn shell_features_are_available() {
        let out = executor(ExecMode::Shell)
            .execute("printf 'a\\nb\\nc\\n' | wc -l")
            .await
            .unwrap();
        assert_eq!(out.text().trim(), "3");
    }

    #[tokio::test]
    async fn large_output_is_not_truncated() {
        // 200_000 bytes: well past the initial capture buffer.
        let out = executor(ExecMode::Shell)
            .execute("head -c 200000 /dev/zero | tr '\\0' 'z'")
            .await
            .unwrap();
        assert_eq!(out.len(), 200_000);
        assert!(out.bytes.iter().all(|b| *b == b'z'));
        assert!(!out.truncated);
    }

    #[tokio::test]
    async fn output_cap_truncates() {
        let exec = Executor::new(ExecConfig {
            max_output_bytes: 100,
            ..ExecConfig::default()
        });
        let out = exec.execute("head -c 5000 /dev/zero").await.unwrap();
        assert_eq!(out.len(), 100);
        assert!(out.truncated);
    }

    #[tokio::test]
    async fn timeout_kills_child() {
        let exec = Executor::new(ExecConfig {
            timeout_secs: 1,
            ..ExecConfig::default()
        });
        let started = std::time::Instant::now();
        let out = exec.execute("echo early; sleep 30").await.unwrap();
        assert!(out.timed_out);
        assert!(out.status.is_none());
        assert!(out.text().contains("early"));
        assert!(started.elapsed() < Duration::from_secs(10));
    }

    #[tokio::test]
    async fn timeout_covers_child_that_closed_its_pipes() {
        let exec = Executor::new(ExecConfig {
            timeout_secs: 1,
            ..ExecConfig::default()
        });
        let started = std::time::Instant::now();
        let out = exec
            .execute("exec >/dev/null 2>&1; sleep 6")
            .await
            .unwrap();
        assert!(out.timed_out);
        assert!(out.status.is_none());
        assert!(started.elapsed() < Duration::from_secs(4), "took {:?}", started.elapsed());
    }

    /// Alive and not a zombie awaiting its new parent.
    #[cfg(target_os = "linux")]
    fn is_running(pid: u32) -> bool {
        match std::fs::read_to_string(format!("/proc/{}/stat", pid)) {
            Ok(stat) => stat
                .rsplit_once(") ")
                .map_or(false, |(_, rest)| !rest.starts_with('Z') && !rest.starts_with('X')),
            Err(_) => false,
        }
    }

    #[cfg(target_os = "linux")]
    #[tokio::test]
    async fn timeout_kills_shell_descendants() {
        let exec = Executor::new(ExecConfig {
            timeout_secs: 1,
            ..ExecConfig::default()
        });
        let out = exec.execute("sleep 30 & echo $!; wait").await.unwrap();
        assert!(out.timed_out);

        let grandchild: u32 = out.text().trim().parse().unwrap();
        tokio::time::sleep(Duration::from_millis(300)).await;
        assert!(!is_running(grandchild), "sleep {} survived the timeout", grandchild);
    }

    #[tokio::test]
    async fn spawn_failure_is_reported() {
        let exec = Executor::new(ExecConfig {
            shell: "/definitely/not/a/shell".into(),
            ..ExecConfig::default()
        });
        let err = exec.execute("echo hi").await.unwrap_err();
        assert!(matches!(err, ExecError::Spawn { .. }));
        assert_eq!(exec.spawn_count(), 0);
    }

    #[tokio::test]
    async fn argv_mode_skips_the_shell() {
        let exec = executor(ExecMode::Argv);
        let out = exec.execute("echo $HOME;  two").await.unwrap();
        assert_eq!(out.text(), "$HOME; two\n");

        assert!(matches!(exec.execute("   ").await, Err(ExecError::EmptyCommand)));
    }
}
