//! Application configuration

use crate::utils::error::Result;
use crate::utils::platform;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

/// Latest yt-dlp release on GitHub
pub const DEFAULT_RELEASE_ENDPOINT: &str =
    "https://api.github.com/repos/yt-dlp/yt-dlp/releases/latest";

/// Name of the persisted version record, kept next to the executable
pub const VERSION_FILE_NAME: &str = "info.json";

/// Default HTTP timeout in seconds
pub const DEFAULT_NETWORK_TIMEOUT_SECS: u64 = 30;

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    /// Explicit yt-dlp executable; discovered when unset
    pub ytdlp_path: Option<PathBuf>,

    /// ffmpeg handed to yt-dlp via `--ffmpeg-location`
    pub ffmpeg_path: Option<PathBuf>,

    /// Download location
    pub download_location: PathBuf,

    /// Output filename template, relative to the download location
    pub output_template: String,

    /// Pass `--no-check-certificate`
    pub skip_certificate_check: bool,

    /// Optional `--format-sort` for metadata fetches
    pub format_sort: Option<String>,

    /// Append the extension to video labels
    pub include_extension_in_labels: bool,

    /// Release metadata endpoint for tool updates
    pub release_endpoint: String,

    /// Version record location; defaults to `info.json` beside yt-dlp
    pub version_file: Option<PathBuf>,

    /// Limit for one HTTP request, or for a stall while streaming a body
    pub network_timeout_secs: u64,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            ytdlp_path: None,
            ffmpeg_path: None,
            download_location: platform::default_download_dir(),
            output_template: "%(title)s.%(ext)s".to_string(),
            skip_certificate_check: false,
            format_sort: None,
            include_extension_in_labels: false,
            release_endpoint: DEFAULT_RELEASE_ENDPOINT.to_string(),
            version_file: None,
            network_timeout_secs: DEFAULT_NETWORK_TIMEOUT_SECS,
        }
    }
}

impl AppSettings {
    /// Default settings file location
    pub fn default_path() -> PathBuf {
        platform::config_dir().join("settings.json")
    }

    /// Load settings from a JSON file. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!("No settings at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        let settings: AppSettings = serde_json::from_str(&content)?;
        info!("Loaded settings from {:?}", path);
        Ok(settings)
    }

    /// Write the settings file (full overwrite)
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    pub fn network_timeout(&self) -> Duration {
        Duration::from_secs(self.network_timeout_secs.max(1))
    }

    /// Where the version record lives for a given executable
    pub fn version_file_for(&self, executable: &Path) -> PathBuf {
        match &self.version_file {
            Some(path) => path.clone(),
            None => executable
                .parent()
                .unwrap_or_else(|| Path::new("."))
                .join(VERSION_FILE_NAME),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let config = AppSettings::default();
        assert_eq!(config.output_template, "%(title)s.%(ext)s");
        assert!(!config.skip_certificate_check);
        assert_eq!(config.release_endpoint, DEFAULT_RELEASE_ENDPOINT);
        assert_eq!(config.network_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_zero_timeout_is_clamped() {
        let config = AppSettings {
            network_timeout_secs: 0,
            ..Default::default()
        };
        assert_eq!(config.network_timeout(), Duration::from_secs(1));
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempdir().unwrap();
        let config = AppSettings::load(&dir.path().join("absent.json")).unwrap();
        assert!(config.ytdlp_path.is_none());
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.json");

        let mut config = AppSettings::default();
        config.ytdlp_path = Some(PathBuf::from("/opt/yt-dlp"));
        config.format_sort = Some("res,br".to_string());
        config.save(&path).unwrap();

        let loaded = AppSettings::load(&path).unwrap();
        assert_eq!(loaded.ytdlp_path, Some(PathBuf::from("/opt/yt-dlp")));
        assert_eq!(loaded.format_sort.as_deref(), Some("res,br"));
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{ "skip_certificate_check": true }"#).unwrap();

        let loaded = AppSettings::load(&path).unwrap();
        assert!(loaded.skip_certificate_check);
        assert_eq!(loaded.output_template, "%(title)s.%(ext)s");
    }

    #[test]
    fn test_version_file_defaults_next_to_executable() {
        let config = AppSettings::default();
        let path = config.version_file_for(Path::new("/opt/tools/yt-dlp"));
        assert_eq!(path, PathBuf::from("/opt/tools/info.json"));
    }
}
