//! Tubeloader library
//!
//! A driver core for the yt-dlp command-line tool: metadata fetching, format
//! catalogs, progress-reporting downloads and self-update of the tool.

pub mod app;
pub mod backend;
pub mod catalog;
pub mod downloader;
pub mod extractor;
pub mod process;
pub mod updater;
pub mod utils;

// Re-export main types for easier use
pub use app::Tubeloader;
pub use catalog::{FormatCatalog, FormatSelection, MediaFilter};
pub use downloader::{
    DownloadOptions, DownloadOrchestrator, DownloadRequest, DownloadTask, OutputContainer,
    ProgressEvent, ProgressParser,
};
pub use extractor::{MediaFormat, MediaInfo, YtDlpExtractor};
pub use process::ProcessRunner;
pub use updater::{ReleaseChecker, UpdateCheck, UpdateState};
pub use utils::{AppSettings, Result, TubeloaderError};
