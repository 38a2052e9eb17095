use crate::catalog::{FormatCatalog, MediaFilter};
use crate::downloader::{DownloadOptions, ProgressEvent};
use crate::extractor::MediaInfo;
use std::path::PathBuf;
use std::sync::Arc;

/// Commands sent from a front end to the backend
#[derive(Debug, Clone)]
pub enum BackendCommand {
    /// Fetch metadata; supersedes any fetch still in flight
    FetchInfo { url: String },
    /// Rebuild the catalog of the current media for another filter
    SetFilter(MediaFilter),
    /// Download a label of the current catalog
    Download {
        label: String,
        audio_label: Option<String>,
        destination: Option<PathBuf>,
        options: DownloadOptions,
    },
    CancelDownload,
    CheckForUpdate,
    // System
    Shutdown,
}

/// Events sent from the backend to a front end
#[derive(Debug, Clone)]
pub enum BackendEvent {
    // Metadata
    FetchStarted { url: String },
    InfoFetched(Arc<MediaInfo>),
    CatalogRebuilt(Arc<FormatCatalog>),

    // Download life-cycle
    DownloadStarted { url: String, selection: String },
    DownloadProgress(ProgressEvent),
    DownloadCompleted,
    DownloadCancelled,
    DownloadFailed(String),

    // Tool update
    UpdateFinished(Result<String, String>),

    // System
    Error(String),
}
