//! Application facade
//!
//! `Tubeloader` wires the extractor, the download orchestrator and the
//! release checker to one set of settings. The CLI and the backend actor both
//! drive the library through it.

use crate::catalog::{FormatCatalog, FormatSelection, LabelOptions, MediaFilter};
use crate::downloader::{DownloadOptions, DownloadOrchestrator, DownloadRequest, DownloadTask};
use crate::extractor::{find_ytdlp, Extractor, MediaInfo, YtDlpExtractor};
use crate::updater::{GithubReleases, ReleaseChecker, ReleaseSource};
use crate::utils::config::AppSettings;
use crate::utils::error::{Result, TubeloaderError};
use crate::utils::platform;
use bytes::Bytes;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

pub struct Tubeloader {
    settings: AppSettings,
    extractor: YtDlpExtractor,
    orchestrator: DownloadOrchestrator,
    updater: ReleaseChecker,
    http: reqwest::Client,
}

impl Tubeloader {
    /// Build from settings, talking to GitHub for updates
    pub fn from_settings(settings: AppSettings) -> Result<Self> {
        let source = Arc::new(GithubReleases::new(
            settings.release_endpoint.clone(),
            settings.network_timeout(),
        )?);
        let ytdlp_path = resolve_ytdlp_path(&settings)?;
        Self::with_release_source(settings, ytdlp_path, source)
    }

    /// Build around an explicit yt-dlp path and release source
    pub fn with_release_source(
        settings: AppSettings,
        ytdlp_path: impl Into<PathBuf>,
        source: Arc<dyn ReleaseSource>,
    ) -> Result<Self> {
        let ytdlp_path = ytdlp_path.into();
        let extractor =
            YtDlpExtractor::new(&ytdlp_path).with_format_sort(settings.format_sort.clone());
        let orchestrator = DownloadOrchestrator::new(&ytdlp_path);
        let updater = ReleaseChecker::new(
            source,
            &ytdlp_path,
            settings.version_file_for(&ytdlp_path),
        );
        let http = reqwest::Client::builder()
            .user_agent(concat!("tubeloader/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(settings.network_timeout())
            .read_timeout(settings.network_timeout())
            .build()?;

        Ok(Self {
            settings,
            extractor,
            orchestrator,
            updater,
            http,
        })
    }

    pub fn settings(&self) -> &AppSettings {
        &self.settings
    }

    pub fn ytdlp_path(&self) -> &Path {
        self.extractor.ytdlp_path()
    }

    pub fn updater(&self) -> &ReleaseChecker {
        &self.updater
    }

    /// Run the metadata invocation and decode its output
    pub async fn fetch_info(&self, url: &str, cancel: &CancellationToken) -> Result<MediaInfo> {
        info!("Fetching info for {} via {}", url, self.extractor.id());
        let info = self.extractor.fetch_info(url, cancel).await?;
        info!(
            "Fetched '{}' with {} formats ({} video, {} audio, {} storyboard)",
            info.title,
            info.formats().len(),
            info.buckets().video.len(),
            info.buckets().audio.len(),
            info.buckets().storyboard.len()
        );
        Ok(info)
    }

    /// Labels for one filter, using the configured label options
    pub fn build_catalog(&self, info: &MediaInfo, filter: MediaFilter) -> FormatCatalog {
        let options = LabelOptions {
            include_extension: self.settings.include_extension_in_labels,
        };
        FormatCatalog::build(info, filter, options)
    }

    /// Start a download into `destination`, or the configured location
    pub fn download(
        &self,
        url: &str,
        selection: FormatSelection,
        destination: Option<PathBuf>,
        options: DownloadOptions,
    ) -> Result<DownloadTask> {
        self.download_with_cancel(url, selection, destination, options, CancellationToken::new())
    }

    pub fn download_with_cancel(
        &self,
        url: &str,
        selection: FormatSelection,
        destination: Option<PathBuf>,
        mut options: DownloadOptions,
        cancel: CancellationToken,
    ) -> Result<DownloadTask> {
        let destination = destination.unwrap_or_else(|| self.settings.download_location.clone());
        options.skip_certificate_check |= self.settings.skip_certificate_check;
        if options.ffmpeg_location.is_none() {
            options.ffmpeg_location = self.settings.ffmpeg_path.clone();
        }

        let request = DownloadRequest::new(url, selection, destination)
            .with_template(self.settings.output_template.clone())
            .with_options(options);
        self.orchestrator.start_with_cancel(&request, cancel)
    }

    /// Bring yt-dlp to the latest release, returning the installed tag
    pub async fn check_and_update_tool(&self) -> Result<String> {
        self.updater.check_and_update().await
    }

    /// `yt-dlp --version`
    pub async fn tool_version(&self) -> Result<String> {
        self.extractor.version().await
    }

    /// Raw thumbnail bytes, or `None` when the media has no thumbnail
    pub async fn fetch_thumbnail(&self, info: &MediaInfo) -> Result<Option<Bytes>> {
        let Some(url) = info.thumbnail.as_deref().filter(|u| !u.is_empty()) else {
            debug!("No thumbnail for {}", info.id);
            return Ok(None);
        };

        let bytes = self
            .http
            .get(url)
            .timeout(self.settings.network_timeout())
            .send()
            .await?
            .error_for_status()?
            .bytes()
            .await?;
        debug!("Fetched {} byte thumbnail for {}", bytes.len(), info.id);
        Ok(Some(bytes))
    }
}

/// Configured path, then discovery, then the install location beside our
/// own executable so that a first update can provide the tool.
fn resolve_ytdlp_path(settings: &AppSettings) -> Result<PathBuf> {
    if let Some(path) = &settings.ytdlp_path {
        return Ok(path.clone());
    }
    if let Some(found) = find_ytdlp() {
        return Ok(found);
    }

    let fallback = platform::executable_dir()
        .map(|dir| dir.join(platform::ytdlp_binary_name()))
        .ok_or(TubeloaderError::YtDlpNotFound)?;
    warn!("yt-dlp not installed, expecting it at {:?}", fallback);
    Ok(fallback)
}
