//! Format catalog: display labels and their reverse lookup
//!
//! A catalog is a pure function of a `MediaInfo` and a filter. It is rebuilt
//! whole whenever either changes, so label→identifier entries can never
//! outlive the filter they were generated under.

pub mod labels;
pub mod selection;

pub use labels::{audio_label, label_for, storyboard_label, video_label, NOT_AVAILABLE};
pub use selection::{resolution_height, FormatSelection};

use crate::extractor::{FormatKind, MediaFormat, MediaInfo};
use crate::utils::error::{Result, TubeloaderError};
use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap};
use tracing::{debug, warn};

/// Which formats the user is choosing between
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MediaFilter {
    /// A video format plus, independently, an audio format
    #[default]
    VideoAndAudio,
    VideoOnly,
    AudioOnly,
    Storyboard,
}

impl MediaFilter {
    fn primary_kind(&self) -> FormatKind {
        match self {
            MediaFilter::VideoAndAudio | MediaFilter::VideoOnly => FormatKind::Video,
            MediaFilter::AudioOnly => FormatKind::AudioOnly,
            MediaFilter::Storyboard => FormatKind::Storyboard,
        }
    }
}

/// Label options that affect rendering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LabelOptions {
    pub include_extension: bool,
}

/// Ordered labels with their format identifiers
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionMap {
    labels: Vec<String>,
    ids: HashMap<String, String>,
}

impl SelectionMap {
    /// Label every format, suffixing ` [id]` onto labels that would collide.
    pub fn build<'a>(
        formats: impl IntoIterator<Item = &'a MediaFormat>,
        options: LabelOptions,
    ) -> Self {
        let raw: Vec<(String, &MediaFormat)> = formats
            .into_iter()
            .map(|f| (label_for(f, options.include_extension), f))
            .collect();

        let mut counts: HashMap<&str, usize> = HashMap::new();
        for (label, _) in &raw {
            *counts.entry(label.as_str()).or_default() += 1;
        }

        let mut map = SelectionMap::default();
        for (label, format) in &raw {
            let label = if counts[label.as_str()] > 1 {
                format!("{} [{}]", label, format.format_id)
            } else {
                label.clone()
            };
            if map.ids.contains_key(&label) {
                warn!("Skipping duplicate format entry '{}'", label);
                continue;
            }
            map.ids.insert(label.clone(), format.format_id.clone());
            map.labels.push(label);
        }
        map
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn format_id(&self, label: &str) -> Option<&str> {
        self.ids.get(label).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// `(label, format_id)` pairs in display order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.labels
            .iter()
            .map(move |label| (label.as_str(), self.ids[label].as_str()))
    }
}

/// Labels for the current resource under one filter
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormatCatalog {
    filter: MediaFilter,
    primary: SelectionMap,
    audio: SelectionMap,
}

impl FormatCatalog {
    pub fn build(info: &MediaInfo, filter: MediaFilter, options: LabelOptions) -> Self {
        let primary = SelectionMap::build(info.formats_of(filter.primary_kind()), options);
        let audio = match filter {
            MediaFilter::VideoAndAudio => SelectionMap::build(info.audio_formats(), options),
            _ => SelectionMap::default(),
        };
        debug!(
            "Built {:?} catalog for '{}': {} primary, {} audio labels",
            filter,
            info.title,
            primary.len(),
            audio.len()
        );
        Self {
            filter,
            primary,
            audio,
        }
    }

    pub fn filter(&self) -> MediaFilter {
        self.filter
    }

    /// Labels of the main list (video, audio or storyboard depending on the filter)
    pub fn labels(&self) -> &[String] {
        self.primary.labels()
    }

    /// Companion audio labels; only populated for `VideoAndAudio`
    pub fn audio_labels(&self) -> &[String] {
        self.audio.labels()
    }

    pub fn primary(&self) -> &SelectionMap {
        &self.primary
    }

    pub fn audio(&self) -> &SelectionMap {
        &self.audio
    }

    /// Resolve chosen labels into a selection.
    ///
    /// An audio label is only meaningful under `VideoAndAudio`; without one
    /// the video is paired with yt-dlp's best audio.
    pub fn select(&self, label: &str, audio_label: Option<&str>) -> Result<FormatSelection> {
        let id = self
            .primary
            .format_id(label)
            .ok_or_else(|| TubeloaderError::InvalidSelection(format!("unknown label '{}'", label)))?;

        match (self.filter, audio_label) {
            (MediaFilter::VideoAndAudio, Some(audio_label)) => {
                let audio = self.audio.format_id(audio_label).ok_or_else(|| {
                    TubeloaderError::InvalidSelection(format!(
                        "unknown audio label '{}'",
                        audio_label
                    ))
                })?;
                Ok(FormatSelection::Merge {
                    video: id.to_string(),
                    audio: audio.to_string(),
                })
            }
            (MediaFilter::VideoAndAudio, None) => Ok(FormatSelection::WithBestAudio(id.to_string())),
            (_, Some(_)) => Err(TubeloaderError::InvalidSelection(format!(
                "audio label given for {:?} filter",
                self.filter
            ))),
            (_, None) => Ok(FormatSelection::Single(id.to_string())),
        }
    }
}

/// Distinct video resolutions, highest first.
///
/// Ordered by parsed height rather than string order so that `1080p` sorts
/// above `720p`; ties and unparseable values fall back to descending string
/// order, with unparseable values last.
pub fn distinct_resolutions(info: &MediaInfo) -> Vec<String> {
    let unique: BTreeSet<&str> = info
        .video_formats()
        .filter_map(|f| f.resolution.as_deref())
        .filter(|r| !r.is_empty())
        .collect();

    let mut resolutions: Vec<String> = unique.into_iter().map(str::to_string).collect();
    resolutions.sort_by(|a, b| compare_resolutions_desc(a, b));
    resolutions
}

fn compare_resolutions_desc(a: &str, b: &str) -> Ordering {
    match (resolution_height(a), resolution_height(b)) {
        (Some(ha), Some(hb)) => hb.cmp(&ha).then_with(|| b.cmp(a)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => b.cmp(a),
    }
}
