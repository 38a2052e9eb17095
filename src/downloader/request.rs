//! Download invocation building

use crate::catalog::FormatSelection;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Default output filename template
pub const DEFAULT_OUTPUT_TEMPLATE: &str = "%(title)s.%(ext)s";

/// Container the user wants to end up with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputContainer {
    Mp4,
    Mkv,
    Mp3,
    Wav,
}

impl OutputContainer {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputContainer::Mp4 => "mp4",
            OutputContainer::Mkv => "mkv",
            OutputContainer::Mp3 => "mp3",
            OutputContainer::Wav => "wav",
        }
    }

    pub fn is_audio(&self) -> bool {
        matches!(self, OutputContainer::Mp3 | OutputContainer::Wav)
    }

    /// Apply this container to a set of options
    pub fn apply(&self, options: &mut DownloadOptions) {
        if self.is_audio() {
            options.extract_audio = Some(self.extension().to_string());
            options.merge_output_format = None;
        } else {
            options.merge_output_format = Some(self.extension().to_string());
            options.extract_audio = None;
        }
    }
}

impl FromStr for OutputContainer {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mp4" => Ok(OutputContainer::Mp4),
            "mkv" => Ok(OutputContainer::Mkv),
            "mp3" => Ok(OutputContainer::Mp3),
            "wav" => Ok(OutputContainer::Wav),
            other => Err(format!("unsupported container '{}'", other)),
        }
    }
}

impl fmt::Display for OutputContainer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Optional flags for a download
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DownloadOptions {
    /// `--merge-output-format <ext>`
    pub merge_output_format: Option<String>,
    /// `-x --audio-format <codec>`
    pub extract_audio: Option<String>,
    /// `--no-check-certificate`
    pub skip_certificate_check: bool,
    /// `--ffmpeg-location <path>`
    pub ffmpeg_location: Option<PathBuf>,
}

impl DownloadOptions {
    pub fn for_container(container: OutputContainer) -> Self {
        let mut options = Self::default();
        container.apply(&mut options);
        options
    }
}

/// Everything needed to run one download
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadRequest {
    pub url: String,
    pub selection: FormatSelection,
    pub destination: PathBuf,
    pub output_template: String,
    pub options: DownloadOptions,
}

impl DownloadRequest {
    pub fn new(url: impl Into<String>, selection: FormatSelection, destination: impl Into<PathBuf>) -> Self {
        Self {
            url: url.into(),
            selection,
            destination: destination.into(),
            output_template: DEFAULT_OUTPUT_TEMPLATE.to_string(),
            options: DownloadOptions::default(),
        }
    }

    pub fn with_template(mut self, template: impl Into<String>) -> Self {
        self.output_template = template.into();
        self
    }

    pub fn with_options(mut self, options: DownloadOptions) -> Self {
        self.options = options;
        self
    }

    /// `<destination>/<template>`
    pub fn output_path(&self) -> PathBuf {
        Path::new(&self.destination).join(&self.output_template)
    }

    /// yt-dlp argument list for this request
    pub fn to_args(&self) -> Vec<String> {
        let mut args = vec![
            "-f".to_string(),
            self.selection.expression(),
            "-o".to_string(),
            self.output_path().to_string_lossy().into_owned(),
            // One progress update per line when stdout is not a TTY
            "--newline".to_string(),
        ];

        if self.options.skip_certificate_check {
            args.push("--no-check-certificate".to_string());
        }
        if let Some(format) = &self.options.merge_output_format {
            args.push("--merge-output-format".to_string());
            args.push(format.clone());
        }
        if let Some(codec) = &self.options.extract_audio {
            args.push("-x".to_string());
            args.push("--audio-format".to_string());
            args.push(codec.clone());
        }
        if let Some(ffmpeg) = &self.options.ffmpeg_location {
            args.push("--ffmpeg-location".to_string());
            args.push(ffmpeg.to_string_lossy().into_owned());
        }

        args.push(self.url.clone());
        args
    }
}
