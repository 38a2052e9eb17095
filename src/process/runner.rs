//! Subprocess spawning for the external tools
//!
//! The runner starts a program with an argument list, hands back its output
//! as a stream of terminal lines and reports how it exited. It never looks
//! at what the program prints.

use crate::process::lines::TerminalLineCodec;
use crate::utils::error::{Result, TubeloaderError};
use crate::utils::platform;
use futures::StreamExt;
use std::collections::VecDeque;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::io::AsyncRead;
use tokio::process::{Child, Command};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::codec::FramedRead;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Number of trailing stderr lines kept for diagnostics
const STDERR_TAIL_LINES: usize = 200;

/// What to do with the child's standard error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StderrMode {
    /// Keep it apart and attach its tail to exit errors
    #[default]
    Capture,
    /// Interleave it into the line stream (and still keep the tail)
    Merge,
    /// Send it to the null device
    Discard,
}

/// Launches one external program
#[derive(Debug, Clone)]
pub struct ProcessRunner {
    program: PathBuf,
}

impl ProcessRunner {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    fn command<I, S>(&self, args: I) -> Command
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let mut cmd = Command::new(&self.program);
        cmd.args(args).stdin(Stdio::null()).kill_on_drop(true);
        platform::hide_console_window(&mut cmd);
        cmd
    }

    /// Start the program and stream its output line by line.
    pub fn spawn<I, S>(&self, args: I, stderr: StderrMode) -> Result<RunningProcess>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let mut cmd = self.command(args);
        cmd.stdout(Stdio::piped());
        cmd.stderr(match stderr {
            StderrMode::Discard => Stdio::null(),
            StderrMode::Capture | StderrMode::Merge => Stdio::piped(),
        });

        debug!("Spawning {:?}", cmd.as_std());
        let mut child = cmd
            .spawn()
            .map_err(|e| TubeloaderError::from_spawn(&self.program, e))?;
        info!("Started {} (pid {:?})", self.program.display(), child.id());

        let (lines_tx, lines_rx) = mpsc::unbounded_channel();

        if let Some(stdout) = child.stdout.take() {
            let tx = lines_tx.clone();
            tokio::spawn(async move {
                forward_lines(stdout, Some(tx), None).await;
            });
        }

        let stderr_task = child.stderr.take().map(|pipe| {
            let tx = match stderr {
                StderrMode::Merge => Some(lines_tx.clone()),
                _ => None,
            };
            tokio::spawn(async move {
                let mut tail = VecDeque::new();
                forward_lines(pipe, tx, Some(&mut tail)).await;
                Vec::from(tail).join("\n")
            })
        });

        Ok(RunningProcess {
            program: self.program.clone(),
            child,
            lines: lines_rx,
            stderr_task,
        })
    }

    /// Run to completion and return everything written to stdout.
    ///
    /// A non-zero exit becomes `ProcessExit` carrying stderr.
    pub async fn output<I, S>(&self, args: I, cancel: &CancellationToken) -> Result<Vec<u8>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let mut cmd = self.command(args);
        cmd.stdout(Stdio::piped()).stderr(Stdio::piped());

        debug!("Running {:?}", cmd.as_std());
        let child = cmd
            .spawn()
            .map_err(|e| TubeloaderError::from_spawn(&self.program, e))?;

        // Dropping the future on cancellation drops the child, which kills it.
        let output = tokio::select! {
            output = child.wait_with_output() => output?,
            _ = cancel.cancelled() => {
                warn!("Cancelled {}", self.program.display());
                return Err(TubeloaderError::Cancelled);
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            error!("{} failed: {}", self.program.display(), stderr);
            return Err(TubeloaderError::ProcessExit {
                code: output.status.code(),
                stderr,
            });
        }

        Ok(output.stdout)
    }
}

async fn forward_lines<R>(
    reader: R,
    tx: Option<mpsc::UnboundedSender<String>>,
    mut tail: Option<&mut VecDeque<String>>,
) where
    R: AsyncRead + Unpin,
{
    let mut frames = FramedRead::new(reader, TerminalLineCodec::new());
    while let Some(frame) = frames.next().await {
        let line = match frame {
            Ok(line) => line,
            Err(e) => {
                warn!("Failed to read subprocess output: {}", e);
                break;
            }
        };

        if let Some(tail) = tail.as_deref_mut() {
            if tail.len() == STDERR_TAIL_LINES {
                tail.pop_front();
            }
            tail.push_back(line.clone());
        }

        if let Some(sender) = &tx {
            // The consumer may have gone away; keep draining so the child never blocks on a full pipe.
            let _ = sender.send(line);
        }
    }
}

/// A live child process
#[derive(Debug)]
pub struct RunningProcess {
    program: PathBuf,
    child: Child,
    lines: mpsc::UnboundedReceiver<String>,
    stderr_task: Option<JoinHandle<String>>,
}

impl RunningProcess {
    pub fn id(&self) -> Option<u32> {
        self.child.id()
    }

    /// Next output line, or `None` once every output pipe has closed
    pub async fn next_line(&mut self) -> Option<String> {
        self.lines.recv().await
    }

    /// Block until the child exits, killing it if `cancel` fires first.
    pub async fn wait(mut self, cancel: &CancellationToken) -> Result<()> {
        let status = tokio::select! {
            status = self.child.wait() => status?,
            _ = cancel.cancelled() => {
                warn!("Cancelling {} (pid {:?})", self.program.display(), self.child.id());
                if let Err(e) = self.child.kill().await {
                    warn!("Failed to kill {}: {}", self.program.display(), e);
                }
                return Err(TubeloaderError::Cancelled);
            }
        };

        let stderr = match self.stderr_task.take() {
            Some(task) => task.await.unwrap_or_default(),
            None => String::new(),
        };

        if status.success() {
            info!("{} exited successfully", self.program.display());
            Ok(())
        } else {
            error!("{} exited with {:?}", self.program.display(), status.code());
            Err(TubeloaderError::ProcessExit {
                code: status.code(),
                stderr,
            })
        }
    }
}
