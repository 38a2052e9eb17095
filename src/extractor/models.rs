//! Data structures for media information

use serde::{Deserialize, Serialize};

/// Resolution value yt-dlp reports for audio-only streams
pub const AUDIO_ONLY_SENTINEL: &str = "audio only";

/// Codec value yt-dlp uses for an absent stream
const NO_CODEC: &str = "none";

/// One selectable encoding variant
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MediaFormat {
    pub format_id: String,
    #[serde(default)]
    pub ext: String,
    pub resolution: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub fps: Option<f64>,
    pub vbr: Option<f64>, // Video bitrate
    pub abr: Option<f64>, // Audio bitrate
    pub tbr: Option<f64>, // Total bitrate
    pub vcodec: Option<String>,
    pub acodec: Option<String>,
    pub filesize: Option<u64>,
    pub filesize_approx: Option<u64>,
    pub format_note: Option<String>,
}

/// Which bucket a format belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormatKind {
    Video,
    AudioOnly,
    Storyboard,
}

impl MediaFormat {
    /// Classify the format. The audio-only sentinel wins over any dimensions.
    pub fn kind(&self) -> FormatKind {
        if self.resolution.as_deref() == Some(AUDIO_ONLY_SENTINEL) {
            FormatKind::AudioOnly
        } else if self.width.is_some() && self.height.is_some() {
            FormatKind::Video
        } else {
            FormatKind::Storyboard
        }
    }

    pub fn has_video_stream(&self) -> bool {
        codec_present(self.vcodec.as_deref())
    }

    pub fn has_audio_stream(&self) -> bool {
        codec_present(self.acodec.as_deref())
    }

    /// Exact size when known, otherwise yt-dlp's estimate
    pub fn size_hint(&self) -> Option<u64> {
        self.filesize.or(self.filesize_approx)
    }
}

fn codec_present(codec: Option<&str>) -> bool {
    matches!(codec, Some(c) if !c.is_empty() && c != NO_CODEC)
}

/// Indices into `MediaInfo::formats`, one list per kind
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormatBuckets {
    pub video: Vec<usize>,
    pub audio: Vec<usize>,
    pub storyboard: Vec<usize>,
}

impl FormatBuckets {
    fn from_formats(formats: &[MediaFormat]) -> Self {
        let mut buckets = Self::default();
        for (index, format) in formats.iter().enumerate() {
            match format.kind() {
                FormatKind::Video => buckets.video.push(index),
                FormatKind::AudioOnly => buckets.audio.push(index),
                FormatKind::Storyboard => buckets.storyboard.push(index),
            }
        }
        buckets
    }
}

/// One fetched resource
///
/// Built fresh on every metadata fetch and never patched afterwards. Every
/// construction path, deserialization included, partitions the formats.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "RawMediaInfo")]
pub struct MediaInfo {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub thumbnail: Option<String>,
    pub webpage_url: Option<String>,
    pub uploader: Option<String>,
    pub duration: Option<f64>,
    formats: Vec<MediaFormat>,
    #[serde(skip)]
    buckets: FormatBuckets,
}

/// Wire shape of `MediaInfo`, before partitioning
#[derive(Deserialize)]
struct RawMediaInfo {
    #[serde(default)]
    id: String,
    #[serde(default)]
    title: String,
    description: Option<String>,
    thumbnail: Option<String>,
    webpage_url: Option<String>,
    uploader: Option<String>,
    duration: Option<f64>,
    #[serde(default)]
    formats: Vec<MediaFormat>,
}

impl From<RawMediaInfo> for MediaInfo {
    fn from(raw: RawMediaInfo) -> Self {
        Self {
            id: raw.id,
            title: raw.title,
            description: raw.description,
            thumbnail: raw.thumbnail,
            webpage_url: raw.webpage_url,
            uploader: raw.uploader,
            duration: raw.duration,
            formats: raw.formats,
            buckets: FormatBuckets::default(),
        }
        .partitioned()
    }
}

impl MediaInfo {
    pub fn new(id: impl Into<String>, title: impl Into<String>, formats: Vec<MediaFormat>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            formats,
            ..Default::default()
        }
        .partitioned()
    }

    fn partitioned(mut self) -> Self {
        self.buckets = FormatBuckets::from_formats(&self.formats);
        self
    }

    /// All formats in the order yt-dlp reported them
    pub fn formats(&self) -> &[MediaFormat] {
        &self.formats
    }

    pub fn buckets(&self) -> &FormatBuckets {
        &self.buckets
    }

    pub fn video_formats(&self) -> impl Iterator<Item = &MediaFormat> + '_ {
        self.buckets.video.iter().map(move |&i| &self.formats[i])
    }

    pub fn audio_formats(&self) -> impl Iterator<Item = &MediaFormat> + '_ {
        self.buckets.audio.iter().map(move |&i| &self.formats[i])
    }

    pub fn storyboard_formats(&self) -> impl Iterator<Item = &MediaFormat> + '_ {
        self.buckets.storyboard.iter().map(move |&i| &self.formats[i])
    }

    pub fn formats_of(&self, kind: FormatKind) -> Box<dyn Iterator<Item = &MediaFormat> + '_> {
        match kind {
            FormatKind::Video => Box::new(self.video_formats()),
            FormatKind::AudioOnly => Box::new(self.audio_formats()),
            FormatKind::Storyboard => Box::new(self.storyboard_formats()),
        }
    }

    pub fn find_format(&self, format_id: &str) -> Option<&MediaFormat> {
        self.formats.iter().find(|f| f.format_id == format_id)
    }
}
