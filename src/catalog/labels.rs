//! Display labels for formats

use crate::extractor::{FormatKind, MediaFormat};

/// Token shown for an absent field
pub const NOT_AVAILABLE: &str = "N/A";

fn number(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{:.2}", v),
        None => NOT_AVAILABLE.to_string(),
    }
}

fn text(value: Option<&str>) -> &str {
    match value {
        Some(v) if !v.is_empty() => v,
        _ => NOT_AVAILABLE,
    }
}

/// `Video: 1920x1080 | FPS: 30.00 | VBR: 4400.00`, optionally `| Ext: mp4`
pub fn video_label(format: &MediaFormat, include_extension: bool) -> String {
    let mut label = format!(
        "Video: {} | FPS: {} | VBR: {}",
        text(format.resolution.as_deref()),
        number(format.fps),
        number(format.vbr)
    );
    if include_extension {
        label.push_str(" | Ext: ");
        label.push_str(text(Some(&format.ext)));
    }
    label
}

/// `Audio: ABR: 129.48`
pub fn audio_label(format: &MediaFormat) -> String {
    format!("Audio: ABR: {}", number(format.abr))
}

/// `Storyboard: 48x27 | Ext: mhtml`
pub fn storyboard_label(format: &MediaFormat) -> String {
    format!(
        "Storyboard: {} | Ext: {}",
        text(format.resolution.as_deref()),
        text(Some(&format.ext))
    )
}

pub fn label_for(format: &MediaFormat, include_extension: bool) -> String {
    match format.kind() {
        FormatKind::Video => video_label(format, include_extension),
        FormatKind::AudioOnly => audio_label(format),
        FormatKind::Storyboard => storyboard_label(format),
    }
}
