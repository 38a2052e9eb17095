use super::messages::{BackendCommand, BackendEvent};
use crate::app::Tubeloader;
use crate::catalog::{FormatCatalog, MediaFilter};
use crate::downloader::DownloadOptions;
use crate::extractor::MediaInfo;
use crate::utils::error::{Result, TubeloaderError};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Results of work the actor spawned, fed back into its own loop
enum Completion {
    Info {
        generation: u64,
        url: String,
        result: Result<MediaInfo>,
    },
    Download {
        generation: u64,
        outcome: BackendEvent,
    },
    Update(BackendEvent),
}

/// Owns the current media and catalog snapshots.
///
/// Slow work (metadata fetches, downloads, updates) runs on spawned tasks and
/// reports back through an internal channel, so only the actor loop ever
/// replaces a snapshot. Front ends get immutable `Arc` copies.
pub struct BackendActor {
    app: Arc<Tubeloader>,
    receiver: mpsc::Receiver<BackendCommand>,
    sender: mpsc::Sender<BackendEvent>,
    completions_tx: mpsc::UnboundedSender<Completion>,
    completions_rx: mpsc::UnboundedReceiver<Completion>,

    // Snapshots
    url: Option<String>,
    media: Option<Arc<MediaInfo>>,
    catalog: Option<Arc<FormatCatalog>>,
    filter: MediaFilter,

    // In-flight work
    fetch_generation: u64,
    fetch_cancel: Option<CancellationToken>,
    download_generation: u64,
    download_cancel: Option<CancellationToken>,
    update_running: bool,
}

impl BackendActor {
    pub fn new(
        app: Arc<Tubeloader>,
        receiver: mpsc::Receiver<BackendCommand>,
        sender: mpsc::Sender<BackendEvent>,
    ) -> Self {
        let (completions_tx, completions_rx) = mpsc::unbounded_channel();
        Self {
            app,
            receiver,
            sender,
            completions_tx,
            completions_rx,
            url: None,
            media: None,
            catalog: None,
            filter: MediaFilter::default(),
            fetch_generation: 0,
            fetch_cancel: None,
            download_generation: 0,
            download_cancel: None,
            update_running: false,
        }
    }

    pub async fn run(mut self) {
        info!("BackendActor started");

        loop {
            tokio::select! {
                cmd = self.receiver.recv() => {
                    let Some(cmd) = cmd else {
                        debug!("Command channel closed");
                        break;
                    };
                    if !self.handle_command(cmd).await {
                        break;
                    }
                }
                Some(done) = self.completions_rx.recv() => {
                    self.handle_completion(done).await;
                }
            }
        }

        if let Some(token) = self.fetch_cancel.take() {
            token.cancel();
        }
        if let Some(token) = self.download_cancel.take() {
            token.cancel();
        }
        info!("BackendActor stopped");
    }

    /// Returns false when the actor should stop
    async fn handle_command(&mut self, cmd: BackendCommand) -> bool {
        match cmd {
            BackendCommand::FetchInfo { url } => self.handle_fetch_info(url).await,
            BackendCommand::SetFilter(filter) => self.handle_set_filter(filter).await,
            BackendCommand::Download {
                label,
                audio_label,
                destination,
                options,
            } => {
                self.handle_download(label, audio_label, destination, options)
                    .await
            }
            BackendCommand::CancelDownload => match &self.download_cancel {
                Some(token) => {
                    info!("Cancelling download");
                    token.cancel();
                }
                None => debug!("No download to cancel"),
            },
            BackendCommand::CheckForUpdate => self.handle_check_for_update().await,
            BackendCommand::Shutdown => {
                info!("BackendActor shutting down");
                return false;
            }
        }
        true
    }

    async fn handle_fetch_info(&mut self, url: String) {
        if let Some(previous) = self.fetch_cancel.take() {
            debug!("Superseding fetch #{}", self.fetch_generation);
            previous.cancel();
        }

        // The old snapshot must not outlive a new request.
        self.url = None;
        self.media = None;
        self.catalog = None;

        self.fetch_generation += 1;
        let generation = self.fetch_generation;
        let cancel = CancellationToken::new();
        self.fetch_cancel = Some(cancel.clone());

        self.emit(BackendEvent::FetchStarted { url: url.clone() }).await;

        let app = self.app.clone();
        let completions = self.completions_tx.clone();
        tokio::spawn(async move {
            let result = app.fetch_info(&url, &cancel).await;
            let _ = completions.send(Completion::Info {
                generation,
                url,
                result,
            });
        });
    }

    async fn handle_set_filter(&mut self, filter: MediaFilter) {
        self.filter = filter;
        if self.media.is_some() {
            self.rebuild_catalog().await;
        } else {
            debug!("Filter set to {:?} before any media was fetched", filter);
        }
    }

    async fn handle_download(
        &mut self,
        label: String,
        audio_label: Option<String>,
        destination: Option<PathBuf>,
        options: DownloadOptions,
    ) {
        if self.download_cancel.is_some() {
            self.emit(BackendEvent::Error("A download is already running".to_string()))
                .await;
            return;
        }
        let (Some(url), Some(catalog)) = (self.url.clone(), self.catalog.clone()) else {
            self.emit(BackendEvent::Error("Fetch media info before downloading".to_string()))
                .await;
            return;
        };

        let selection = match catalog.select(&label, audio_label.as_deref()) {
            Ok(selection) => selection,
            Err(e) => {
                self.emit(BackendEvent::Error(e.to_string())).await;
                return;
            }
        };

        let cancel = CancellationToken::new();
        let task = match self.app.download_with_cancel(
            &url,
            selection.clone(),
            destination,
            options,
            cancel.clone(),
        ) {
            Ok(task) => task,
            Err(e) => {
                error!("Download could not start: {}", e);
                self.emit(BackendEvent::DownloadFailed(e.to_string())).await;
                return;
            }
        };

        self.download_generation += 1;
        let generation = self.download_generation;
        self.download_cancel = Some(cancel);
        self.emit(BackendEvent::DownloadStarted {
            url,
            selection: selection.to_string(),
        })
        .await;

        let sender = self.sender.clone();
        let completions = self.completions_tx.clone();
        tokio::spawn(async move {
            let (mut events, completion, _cancel) = task.into_parts();
            while let Some(event) = events.recv().await {
                let _ = sender.send(BackendEvent::DownloadProgress(event)).await;
            }

            let outcome = match completion.wait().await {
                Ok(()) => BackendEvent::DownloadCompleted,
                Err(TubeloaderError::Cancelled) => BackendEvent::DownloadCancelled,
                Err(e) => BackendEvent::DownloadFailed(e.to_string()),
            };
            let _ = completions.send(Completion::Download {
                generation,
                outcome,
            });
        });
    }

    async fn handle_check_for_update(&mut self) {
        if self.update_running {
            self.emit(BackendEvent::Error("An update check is already running".to_string()))
                .await;
            return;
        }
        self.update_running = true;

        let app = self.app.clone();
        let completions = self.completions_tx.clone();
        tokio::spawn(async move {
            let result = app.check_and_update_tool().await.map_err(|e| e.to_string());
            let _ = completions.send(Completion::Update(BackendEvent::UpdateFinished(result)));
        });
    }

    async fn handle_completion(&mut self, done: Completion) {
        match done {
            Completion::Info {
                generation,
                url,
                result,
            } => {
                if generation != self.fetch_generation {
                    debug!("Dropping stale fetch #{} for {}", generation, url);
                    return;
                }
                self.fetch_cancel = None;

                match result {
                    Ok(info) => {
                        let info = Arc::new(info);
                        self.url = Some(url);
                        self.media = Some(info.clone());
                        self.emit(BackendEvent::InfoFetched(info)).await;
                        self.rebuild_catalog().await;
                    }
                    Err(TubeloaderError::Cancelled) => debug!("Fetch for {} cancelled", url),
                    Err(e) => {
                        warn!("Fetch for {} failed: {}", url, e);
                        self.emit(BackendEvent::Error(e.to_string())).await;
                    }
                }
            }
            // State is cleared before the front end hears about the outcome,
            // so a follow-up command is never refused as still running.
            Completion::Download {
                generation,
                outcome,
            } => {
                if generation == self.download_generation {
                    self.download_cancel = None;
                }
                self.emit(outcome).await;
            }
            Completion::Update(outcome) => {
                self.update_running = false;
                self.emit(outcome).await;
            }
        }
    }

    /// Replace the catalog snapshot in full
    async fn rebuild_catalog(&mut self) {
        let Some(media) = &self.media else { return };
        let catalog = Arc::new(self.app.build_catalog(media, self.filter));
        debug!(
            "Catalog rebuilt for {:?}: {} labels",
            self.filter,
            catalog.labels().len()
        );
        self.catalog = Some(catalog.clone());
        self.emit(BackendEvent::CatalogRebuilt(catalog)).await;
    }

    async fn emit(&self, event: BackendEvent) {
        let _ = self.sender.send(event).await;
    }
}
