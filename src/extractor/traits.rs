use crate::extractor::models::MediaInfo;
use crate::utils::error::Result;
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

/// Core trait for metadata extractors
///
/// This trait isolates the application from the specific extraction method.
#[async_trait]
pub trait Extractor: Send + Sync {
    /// Returns a unique identifier for this extractor (e.g. "yt-dlp")
    fn id(&self) -> &'static str;

    /// Fetches and decodes metadata for one resource without downloading it
    async fn fetch_info(&self, url: &str, cancel: &CancellationToken) -> Result<MediaInfo>;
}
