//! Release metadata and the HTTP source that serves it

use crate::utils::error::Result;
use crate::utils::platform::AssetPlatform;
use async_trait::async_trait;
use futures::StreamExt;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::{debug, info};

/// One published release of the external tool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Release {
    pub tag_name: String,
    #[serde(default)]
    pub assets: Vec<ReleaseAsset>,
}

/// A downloadable file attached to a release
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseAsset {
    pub name: String,
    pub browser_download_url: String,
}

impl Release {
    /// First asset whose name follows the platform's naming convention
    pub fn asset_for(&self, platform: AssetPlatform) -> Option<&ReleaseAsset> {
        self.assets.iter().find(|asset| platform.matches_asset(&asset.name))
    }
}

/// Where releases come from
#[async_trait]
pub trait ReleaseSource: Send + Sync {
    /// Metadata of the latest release
    async fn latest_release(&self) -> Result<Release>;

    /// Stream an asset body into `dest`, returning the byte count
    async fn download_asset(
        &self,
        asset: &ReleaseAsset,
        dest: &mut (dyn AsyncWrite + Send + Unpin),
    ) -> Result<u64>;
}

/// GitHub's "latest release" API
#[derive(Debug, Clone)]
pub struct GithubReleases {
    client: Client,
    endpoint: String,
    timeout: Duration,
}

impl GithubReleases {
    /// `timeout` bounds the metadata request and any stall while streaming
    /// an asset; a large asset may take longer overall.
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self> {
        // GitHub rejects API requests without a User-Agent.
        let client = Client::builder()
            .user_agent(concat!("tubeloader/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(timeout)
            .read_timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
            timeout,
        })
    }
}

#[async_trait]
impl ReleaseSource for GithubReleases {
    async fn latest_release(&self) -> Result<Release> {
        debug!("Querying {}", self.endpoint);
        let release: Release = self
            .client
            .get(&self.endpoint)
            .header("Accept", "application/vnd.github+json")
            .timeout(self.timeout)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        info!(
            "Latest release is {} with {} assets",
            release.tag_name,
            release.assets.len()
        );
        Ok(release)
    }

    async fn download_asset(
        &self,
        asset: &ReleaseAsset,
        dest: &mut (dyn AsyncWrite + Send + Unpin),
    ) -> Result<u64> {
        info!("Downloading {} from {}", asset.name, asset.browser_download_url);
        let response = self
            .client
            .get(&asset.browser_download_url)
            .send()
            .await?
            .error_for_status()?;

        let mut written = 0u64;
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            dest.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        dest.flush().await?;

        debug!("Wrote {} bytes of {}", written, asset.name);
        Ok(written)
    }
}
