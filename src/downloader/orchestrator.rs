//! Download orchestration over yt-dlp
//!
//! The orchestrator turns a `DownloadRequest` into a yt-dlp invocation and
//! runs it on its own task. Every output line goes through the progress
//! parser and parsed events are pushed to the caller over an unbounded
//! channel. The channel closes only after the child has been waited on, so
//! a closed channel always means the outcome is ready.

use crate::downloader::progress::{ProgressEvent, ProgressParser};
use crate::downloader::request::DownloadRequest;
use crate::process::{ProcessRunner, StderrMode};
use crate::utils::error::{Result, TubeloaderError};
use std::path::PathBuf;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace};

/// Runs downloads through the yt-dlp executable
#[derive(Debug, Clone)]
pub struct DownloadOrchestrator {
    runner: ProcessRunner,
    parser: ProgressParser,
}

impl DownloadOrchestrator {
    pub fn new(ytdlp_path: impl Into<PathBuf>) -> Self {
        Self {
            runner: ProcessRunner::new(ytdlp_path),
            parser: ProgressParser::new(),
        }
    }

    /// Start a download.
    ///
    /// Launch failures are returned here; everything after the process has
    /// started is reported through the returned task.
    pub fn start(&self, request: &DownloadRequest) -> Result<DownloadTask> {
        self.start_with_cancel(request, CancellationToken::new())
    }

    pub fn start_with_cancel(
        &self,
        request: &DownloadRequest,
        cancel: CancellationToken,
    ) -> Result<DownloadTask> {
        let args = request.to_args();
        debug!("Download args: {:?}", args);

        if let Err(e) = std::fs::create_dir_all(&request.destination) {
            error!("Cannot create {:?}: {}", request.destination, e);
            return Err(e.into());
        }

        let mut process = self.runner.spawn(&args, StderrMode::Capture)?;
        info!("Downloading {} as '{}'", request.url, request.selection);

        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let parser = self.parser;
        let task_cancel = cancel.clone();

        let completion = tokio::spawn(async move {
            let mut delivered = 0usize;
            loop {
                let line = tokio::select! {
                    line = process.next_line() => line,
                    _ = task_cancel.cancelled() => break,
                };
                let Some(line) = line else { break };

                match parser.parse_line(&line) {
                    Some(event) => {
                        delivered += 1;
                        // A dropped receiver only means nobody is watching.
                        let _ = events_tx.send(event);
                    }
                    None => trace!("yt-dlp: {}", line),
                }
            }

            let outcome = process.wait(&task_cancel).await;
            match &outcome {
                Ok(()) => info!("Download finished after {} progress events", delivered),
                Err(e) => error!("Download failed after {} progress events: {}", delivered, e),
            }
            drop(events_tx);
            outcome
        });

        Ok(DownloadTask {
            events: events_rx,
            completion,
            cancel,
        })
    }
}

/// A running download: its progress events and its eventual outcome
#[derive(Debug)]
pub struct DownloadTask {
    events: mpsc::UnboundedReceiver<ProgressEvent>,
    completion: JoinHandle<Result<()>>,
    cancel: CancellationToken,
}

impl DownloadTask {
    /// Next progress event; `None` once the process has exited
    pub async fn next_event(&mut self) -> Option<ProgressEvent> {
        self.events.recv().await
    }

    /// Kill the subprocess; the outcome becomes `Cancelled`
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Wait for the outcome. A non-zero exit is a failure even when progress
    /// was reported before it.
    pub async fn wait(self) -> Result<()> {
        join_outcome(self.completion).await
    }

    /// Split into the event stream and a completion future
    pub fn into_parts(
        self,
    ) -> (
        mpsc::UnboundedReceiver<ProgressEvent>,
        DownloadCompletion,
        CancellationToken,
    ) {
        (
            self.events,
            DownloadCompletion {
                handle: self.completion,
            },
            self.cancel,
        )
    }
}

/// Outcome half of a `DownloadTask`
#[derive(Debug)]
pub struct DownloadCompletion {
    handle: JoinHandle<Result<()>>,
}

impl DownloadCompletion {
    pub async fn wait(self) -> Result<()> {
        join_outcome(self.handle).await
    }
}

async fn join_outcome(handle: JoinHandle<Result<()>>) -> Result<()> {
    match handle.await {
        Ok(outcome) => outcome,
        Err(e) if e.is_cancelled() => Err(TubeloaderError::Cancelled),
        Err(e) => Err(TubeloaderError::Io(std::io::Error::other(format!(
            "download task panicked: {}",
            e
        )))),
    }
}
