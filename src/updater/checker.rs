//! Self-update of the yt-dlp executable
//!
//! A check compares the recorded version with the latest published tag.
//! When they differ the platform asset is streamed to a temporary file next
//! to the executable, marked executable and renamed over the old binary.
//! The version record is rewritten only after the rename succeeded, so a
//! failed update leaves both the binary and the record as they were.

use crate::updater::release::{Release, ReleaseAsset, ReleaseSource};
use crate::updater::version::{VersionRecord, VersionStore};
use crate::utils::error::{Result, TubeloaderError};
use crate::utils::platform::AssetPlatform;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Where an update run currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateState {
    Idle,
    Checking,
    UpToDate,
    AssetMissing,
    Downloading,
    Done,
    Failed,
}

/// Result of comparing the installed version with the latest release
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateCheck {
    UpToDate {
        tag: String,
    },
    Available {
        current: Option<String>,
        release: Release,
        asset: ReleaseAsset,
    },
}

impl UpdateCheck {
    pub fn is_available(&self) -> bool {
        matches!(self, UpdateCheck::Available { .. })
    }
}

/// Keeps one yt-dlp executable at the latest release
pub struct ReleaseChecker {
    source: Arc<dyn ReleaseSource>,
    store: VersionStore,
    executable: PathBuf,
    platform: AssetPlatform,
    state: watch::Sender<UpdateState>,
}

impl ReleaseChecker {
    pub fn new(
        source: Arc<dyn ReleaseSource>,
        executable: impl Into<PathBuf>,
        version_file: impl Into<PathBuf>,
    ) -> Self {
        let (state, _) = watch::channel(UpdateState::Idle);
        Self {
            source,
            store: VersionStore::new(version_file),
            executable: executable.into(),
            platform: AssetPlatform::current(),
            state,
        }
    }

    pub fn with_platform(mut self, platform: AssetPlatform) -> Self {
        self.platform = platform;
        self
    }

    pub fn executable(&self) -> &Path {
        &self.executable
    }

    /// Tag of the installed version, if one was ever recorded
    pub fn installed_version(&self) -> Option<String> {
        self.store.load().map(|record| record.tag)
    }

    pub fn state(&self) -> UpdateState {
        *self.state.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<UpdateState> {
        self.state.subscribe()
    }

    fn set_state(&self, state: UpdateState) {
        debug!("Update state: {:?}", state);
        self.state.send_replace(state);
    }

    /// Compare the installed version with the latest release
    pub async fn check(&self) -> Result<UpdateCheck> {
        self.set_state(UpdateState::Checking);
        let current = self.installed_version();

        let release = match self.source.latest_release().await {
            Ok(release) => release,
            Err(e) => {
                self.set_state(UpdateState::Failed);
                return Err(e);
            }
        };

        if current.as_deref() == Some(release.tag_name.as_str()) {
            info!("yt-dlp is up to date ({})", release.tag_name);
            self.set_state(UpdateState::UpToDate);
            return Ok(UpdateCheck::UpToDate {
                tag: release.tag_name,
            });
        }

        let Some(asset) = release.asset_for(self.platform).cloned() else {
            warn!(
                "Release {} has no {} asset among {} files",
                release.tag_name,
                self.platform,
                release.assets.len()
            );
            self.set_state(UpdateState::AssetMissing);
            return Err(TubeloaderError::NoMatchingAsset {
                tag: release.tag_name,
                platform: self.platform.to_string(),
            });
        };

        info!(
            "yt-dlp update available: {} -> {} ({})",
            current.as_deref().unwrap_or("unknown"),
            release.tag_name,
            asset.name
        );
        Ok(UpdateCheck::Available {
            current,
            release,
            asset,
        })
    }

    /// Install a release found by `check`, returning the installed tag
    pub async fn install(&self, check: UpdateCheck) -> Result<String> {
        let (release, asset) = match check {
            UpdateCheck::UpToDate { tag } => return Ok(tag),
            UpdateCheck::Available { release, asset, .. } => (release, asset),
        };

        self.set_state(UpdateState::Downloading);
        match self.replace_executable(&asset).await {
            Ok(()) => {}
            Err(e) => {
                warn!("Update to {} failed: {}", release.tag_name, e);
                self.set_state(UpdateState::Failed);
                return Err(e);
            }
        }

        if let Err(e) = self.store.save(&VersionRecord::new(&release.tag_name)) {
            self.set_state(UpdateState::Failed);
            return Err(e);
        }

        info!("Installed yt-dlp {} at {:?}", release.tag_name, self.executable);
        self.set_state(UpdateState::Done);
        Ok(release.tag_name)
    }

    /// Check, then install when a newer release exists
    pub async fn check_and_update(&self) -> Result<String> {
        let check = self.check().await?;
        self.install(check).await
    }

    async fn replace_executable(&self, asset: &ReleaseAsset) -> Result<()> {
        let dir = match self.executable.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
            _ => PathBuf::from("."),
        };
        tokio::fs::create_dir_all(&dir).await?;

        // Dropping the temp path before `persist` removes the partial file.
        let (file, temp_path) = tempfile::Builder::new()
            .prefix(".yt-dlp-update-")
            .tempfile_in(&dir)?
            .into_parts();
        let mut file = tokio::fs::File::from_std(file);

        let written = self.source.download_asset(asset, &mut file).await?;
        file.flush().await?;
        file.sync_all().await?;
        drop(file);
        debug!("Downloaded {} bytes into {:?}", written, temp_path);

        #[cfg(unix)]
        if self.platform.needs_exec_bit() {
            use std::os::unix::fs::PermissionsExt;
            tokio::fs::set_permissions(&temp_path, std::fs::Permissions::from_mode(0o755)).await?;
        }

        temp_path
            .persist(&self.executable)
            .map_err(|e| TubeloaderError::Io(e.error))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::tempdir;
    use tokio::io::AsyncWrite;

    struct StubSource {
        release: Release,
        payload: Vec<u8>,
        fail_download: bool,
        downloads: AtomicUsize,
    }

    impl StubSource {
        fn new(tag: &str, assets: &[&str]) -> Self {
            Self {
                release: Release {
                    tag_name: tag.to_string(),
                    assets: assets
                        .iter()
                        .map(|name| ReleaseAsset {
                            name: name.to_string(),
                            browser_download_url: format!("https://example.com/{}", name),
                        })
                        .collect(),
                },
                payload: b"#!/bin/sh\necho new\n".to_vec(),
                fail_download: false,
                downloads: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl ReleaseSource for StubSource {
        async fn latest_release(&self) -> Result<Release> {
            Ok(self.release.clone())
        }

        async fn download_asset(
            &self,
            _asset: &ReleaseAsset,
            dest: &mut (dyn AsyncWrite + Send + Unpin),
        ) -> Result<u64> {
            self.downloads.fetch_add(1, Ordering::SeqCst);
            dest.write_all(&self.payload[..4]).await?;
            if self.fail_download {
                return Err(TubeloaderError::Io(std::io::Error::other("connection reset")));
            }
            dest.write_all(&self.payload[4..]).await?;
            Ok(self.payload.len() as u64)
        }
    }

    fn checker(source: Arc<StubSource>, dir: &Path) -> ReleaseChecker {
        ReleaseChecker::new(source, dir.join("yt-dlp"), dir.join("info.json"))
            .with_platform(AssetPlatform::Linux)
    }

    #[tokio::test]
    async fn test_same_tag_is_up_to_date() {
        let dir = tempdir().unwrap();
        VersionStore::new(dir.path().join("info.json"))
            .save(&VersionRecord::new("2024.08.06"))
            .unwrap();
        let source = Arc::new(StubSource::new("2024.08.06", &["yt-dlp_linux"]));
        let checker = checker(source.clone(), dir.path());

        let tag = checker.check_and_update().await.unwrap();
        assert_eq!(tag, "2024.08.06");
        assert_eq!(checker.state(), UpdateState::UpToDate);
        assert_eq!(source.downloads.load(Ordering::SeqCst), 0);
        assert!(!dir.path().join("yt-dlp").exists());
    }

    #[tokio::test]
    async fn test_missing_asset_keeps_record() {
        let dir = tempdir().unwrap();
        let store = VersionStore::new(dir.path().join("info.json"));
        store.save(&VersionRecord::new("2024.01.01")).unwrap();
        let source = Arc::new(StubSource::new("2024.08.06", &["yt-dlp.exe", "yt-dlp_macos"]));
        let checker = checker(source.clone(), dir.path());

        let err = checker.check_and_update().await.unwrap_err();
        assert!(matches!(err, TubeloaderError::NoMatchingAsset { .. }));
        assert_eq!(checker.state(), UpdateState::AssetMissing);
        assert_eq!(store.load().unwrap().tag, "2024.01.01");
        assert_eq!(source.downloads.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_install_replaces_executable_and_record() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("yt-dlp"), b"old").unwrap();
        let source = Arc::new(StubSource::new("2024.08.06", &["yt-dlp.exe", "yt-dlp_linux"]));
        let checker = checker(source.clone(), dir.path());
        let mut states = checker.subscribe();

        let check = checker.check().await.unwrap();
        assert!(check.is_available());
        let tag = checker.install(check).await.unwrap();

        assert_eq!(tag, "2024.08.06");
        assert!(states.has_changed().unwrap());
        assert_eq!(*states.borrow_and_update(), UpdateState::Done);
        assert_eq!(
            std::fs::read(dir.path().join("yt-dlp")).unwrap(),
            source.payload
        );
        assert_eq!(checker.installed_version().as_deref(), Some("2024.08.06"));

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = std::fs::metadata(dir.path().join("yt-dlp"))
                .unwrap()
                .permissions()
                .mode();
            assert_eq!(mode & 0o777, 0o755);
        }
    }

    #[tokio::test]
    async fn test_unknown_version_triggers_update() {
        let dir = tempdir().unwrap();
        let source = Arc::new(StubSource::new("2024.08.06", &["yt-dlp_linux"]));
        let checker = checker(source, dir.path());

        match checker.check().await.unwrap() {
            UpdateCheck::Available { current, asset, .. } => {
                assert_eq!(current, None);
                assert_eq!(asset.name, "yt-dlp_linux");
            }
            other => panic!("expected an update, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_failed_download_leaves_old_state() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("yt-dlp"), b"old").unwrap();
        let store = VersionStore::new(dir.path().join("info.json"));
        store.save(&VersionRecord::new("2024.01.01")).unwrap();

        let mut stub = StubSource::new("2024.08.06", &["yt-dlp_linux"]);
        stub.fail_download = true;
        let checker = checker(Arc::new(stub), dir.path());

        assert!(checker.check_and_update().await.is_err());
        assert_eq!(checker.state(), UpdateState::Failed);
        assert_eq!(std::fs::read(dir.path().join("yt-dlp")).unwrap(), b"old");
        assert_eq!(store.load().unwrap().tag, "2024.01.01");

        let leftovers: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().starts_with(".yt-dlp-update-"))
            .collect();
        assert!(leftovers.is_empty());
    }
}
