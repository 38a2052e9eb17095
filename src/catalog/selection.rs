//! Format selections and their yt-dlp `-f` expressions

use std::fmt;

/// What to ask yt-dlp for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormatSelection {
    /// One format identifier
    Single(String),
    /// Separate video and audio identifiers muxed into one file (`v+a`)
    Merge { video: String, audio: String },
    /// A video identifier paired with whatever audio yt-dlp rates best
    WithBestAudio(String),
    /// Best video of an exact height plus best audio, falling back to best
    Height(u32),
    /// Let yt-dlp decide
    Best,
}

impl FormatSelection {
    /// Parse a user-supplied expression; `a+b` becomes a merge.
    pub fn parse(expr: &str) -> Self {
        let expr = expr.trim();
        if expr.is_empty() || expr == "best" {
            return FormatSelection::Best;
        }
        match expr.split_once('+') {
            Some((video, audio)) if is_plain_id(video) && is_plain_id(audio) => {
                FormatSelection::Merge {
                    video: video.to_string(),
                    audio: audio.to_string(),
                }
            }
            _ => FormatSelection::Single(expr.to_string()),
        }
    }

    /// Selection for a resolution string such as `1080p` or `1920x1080`
    pub fn from_resolution(resolution: &str) -> Option<Self> {
        resolution_height(resolution).map(FormatSelection::Height)
    }

    /// The `-f` argument
    pub fn expression(&self) -> String {
        match self {
            FormatSelection::Single(id) => id.clone(),
            FormatSelection::Merge { video, audio } => format!("{}+{}", video, audio),
            FormatSelection::WithBestAudio(video) => format!("{}+bestaudio/{}", video, video),
            FormatSelection::Height(height) => {
                format!("bestvideo[height={}]+bestaudio/best", height)
            }
            FormatSelection::Best => "best".to_string(),
        }
    }
}

impl fmt::Display for FormatSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.expression())
    }
}

fn is_plain_id(id: &str) -> bool {
    !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// Pixel height encoded in a resolution string.
///
/// `1920x1080` yields the part after the `x`; `1080p`, `720p60` and bare
/// numbers yield their leading integer.
pub fn resolution_height(resolution: &str) -> Option<u32> {
    let resolution = resolution.trim();
    let digits = match resolution.split_once('x') {
        Some((_, height)) => height,
        None => resolution,
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    digits[..end].parse().ok()
}
