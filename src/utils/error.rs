//! Error handling for Tubeloader

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for Tubeloader
#[derive(Debug, Error)]
pub enum TubeloaderError {
    #[error("yt-dlp not found. Please install yt-dlp or set its path in the settings")]
    YtDlpNotFound,

    #[error("Executable not found: {}", .0.display())]
    ExecutableNotFound(PathBuf),

    #[error("Permission denied while launching {}", .0.display())]
    PermissionDenied(PathBuf),

    #[error("Failed to launch {}: {source}", .program.display())]
    ProcessLaunch {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Process exited with {}: {stderr}", exit_code_text(.code))]
    ProcessExit { code: Option<i32>, stderr: String },

    #[error("Failed to parse metadata: {reason}\nRaw output:\n{raw}")]
    MetadataParse { reason: String, raw: String },

    #[error("Release {tag} has no asset for {platform}")]
    NoMatchingAsset { tag: String, platform: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid format selection: {0}")]
    InvalidSelection(String),

    #[error("Operation cancelled")]
    Cancelled,
}

fn exit_code_text(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("status {}", code),
        None => "no status (terminated by signal)".to_string(),
    }
}

impl TubeloaderError {
    /// Classify a spawn failure into the launch error kinds.
    pub fn from_spawn(program: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let program = program.into();
        match source.kind() {
            std::io::ErrorKind::NotFound => TubeloaderError::ExecutableNotFound(program),
            std::io::ErrorKind::PermissionDenied => TubeloaderError::PermissionDenied(program),
            _ => TubeloaderError::ProcessLaunch { program, source },
        }
    }

    /// True for the errors raised before the subprocess ever ran.
    pub fn is_launch_error(&self) -> bool {
        matches!(
            self,
            TubeloaderError::ExecutableNotFound(_)
                | TubeloaderError::PermissionDenied(_)
                | TubeloaderError::ProcessLaunch { .. }
                | TubeloaderError::YtDlpNotFound
        )
    }
}

pub type Result<T> = std::result::Result<T, TubeloaderError>;
