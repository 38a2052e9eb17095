//! Platform-specific conventions for Tubeloader
//!
//! This module provides cross-platform abstractions for:
//! - The file name of the external extraction tool
//! - Default directories
//! - Release asset naming per platform family
//! - Spawning console programs without a visible window

use std::fmt;
use std::path::PathBuf;

/// File name of the yt-dlp executable on this platform
pub fn ytdlp_binary_name() -> &'static str {
    if cfg!(target_os = "windows") {
        "yt-dlp.exe"
    } else {
        "yt-dlp"
    }
}

/// Returns the default download directory
/// - All platforms: ~/Downloads
pub fn default_download_dir() -> PathBuf {
    dirs::download_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join("Downloads")))
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Returns the configuration directory
/// - macOS: ~/Library/Application Support/Tubeloader
/// - Windows: %APPDATA%\Tubeloader
/// - Linux: ~/.config/tubeloader
pub fn config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(if cfg!(target_os = "linux") {
            "tubeloader"
        } else {
            "Tubeloader"
        })
}

/// Directory of the running executable, if it can be resolved
pub fn executable_dir() -> Option<PathBuf> {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.to_path_buf()))
}

/// Platform family used to pick a release asset
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetPlatform {
    Linux,
    Windows,
    MacOs,
}

impl AssetPlatform {
    /// The family of the platform we are compiled for
    pub fn current() -> Self {
        if cfg!(target_os = "windows") {
            AssetPlatform::Windows
        } else if cfg!(target_os = "macos") {
            AssetPlatform::MacOs
        } else {
            AssetPlatform::Linux
        }
    }

    /// Whether a release asset name belongs to this platform family.
    ///
    /// Windows assets are matched by exact `.exe` suffix, the others by a
    /// case-insensitive substring. Architecture is not considered, so with
    /// assets listed in release order an aarch64 Linux host is given the
    /// x86_64 `yt-dlp_linux` binary.
    pub fn matches_asset(&self, name: &str) -> bool {
        match self {
            AssetPlatform::Windows => name.ends_with(".exe"),
            AssetPlatform::Linux => name.to_lowercase().contains("linux"),
            AssetPlatform::MacOs => name.to_lowercase().contains("macos"),
        }
    }

    /// Whether a freshly downloaded binary needs its executable bit set
    pub fn needs_exec_bit(&self) -> bool {
        !matches!(self, AssetPlatform::Windows)
    }
}

impl fmt::Display for AssetPlatform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AssetPlatform::Linux => "linux",
            AssetPlatform::Windows => "windows",
            AssetPlatform::MacOs => "macos",
        };
        f.write_str(name)
    }
}

/// Keep console programs from flashing a window on Windows.
pub fn hide_console_window(cmd: &mut tokio::process::Command) {
    #[cfg(target_os = "windows")]
    {
        // CREATE_NO_WINDOW
        cmd.creation_flags(0x0800_0000);
    }

    #[cfg(not(target_os = "windows"))]
    {
        let _ = cmd;
    }
}
