//! Decoding of yt-dlp's JSON metadata dump

use crate::extractor::models::MediaInfo;
use crate::utils::error::{Result, TubeloaderError};
use tracing::{debug, error};

/// Slice from the first `{` to the last `}`.
///
/// Some yt-dlp builds print warnings around the JSON document even with
/// `--no-warnings`, so the raw stream cannot be parsed as-is.
pub fn locate_json_object(raw: &[u8]) -> Option<&[u8]> {
    let start = raw.iter().position(|b| *b == b'{')?;
    let end = raw.iter().rposition(|b| *b == b'}')?;
    if end < start {
        return None;
    }
    Some(&raw[start..=end])
}

/// Decode an info dump into a partitioned `MediaInfo`
pub fn decode_media_info(raw: &[u8]) -> Result<MediaInfo> {
    let json = locate_json_object(raw).ok_or_else(|| {
        error!("No JSON object in {} bytes of yt-dlp output", raw.len());
        TubeloaderError::MetadataParse {
            reason: "unable to locate JSON in output".to_string(),
            raw: String::from_utf8_lossy(raw).into_owned(),
        }
    })?;

    let info: MediaInfo = serde_json::from_slice(json).map_err(|e| {
        error!("Failed to decode media info: {}", e);
        TubeloaderError::MetadataParse {
            reason: e.to_string(),
            raw: String::from_utf8_lossy(json).into_owned(),
        }
    })?;

    debug!(
        "Decoded '{}' with {} formats ({} video, {} audio, {} storyboard)",
        info.title,
        info.formats().len(),
        info.buckets().video.len(),
        info.buckets().audio.len(),
        info.buckets().storyboard.len()
    );
    Ok(info)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "id": "dQw4w9WgXcQ",
        "title": "Sample",
        "description": "A description",
        "thumbnail": "https://i.ytimg.com/vi/dQw4w9WgXcQ/maxresdefault.jpg",
        "duration": 212.0,
        "formats": [
            {"format_id": "sb0", "ext": "mhtml", "resolution": "48x27", "width": null, "height": null, "vcodec": "none", "acodec": "none"},
            {"format_id": "140", "ext": "m4a", "resolution": "audio only", "abr": 129.478, "vcodec": "none", "acodec": "mp4a.40.2", "filesize": 3433514},
            {"format_id": "137", "ext": "mp4", "resolution": "1920x1080", "width": 1920, "height": 1080, "fps": 25, "vbr": 4400.5, "vcodec": "avc1.640028", "acodec": "none"}
        ]
    }"#;

    #[test]
    fn test_decode_plain_json() {
        let info = decode_media_info(SAMPLE.as_bytes()).unwrap();
        assert_eq!(info.id, "dQw4w9WgXcQ");
        assert_eq!(info.title, "Sample");
        assert_eq!(info.formats().len(), 3);
        assert_eq!(info.buckets().storyboard, vec![0]);
        assert_eq!(info.buckets().audio, vec![1]);
        assert_eq!(info.buckets().video, vec![2]);
        assert_eq!(info.formats()[2].fps, Some(25.0));
    }

    #[test]
    fn test_decode_skips_surrounding_diagnostics() {
        let raw = format!(
            "WARNING: [youtube] Falling back to generic n function\n{}\nDeprecation notice\n",
            SAMPLE
        );
        let info = decode_media_info(raw.as_bytes()).unwrap();
        assert_eq!(info.formats().len(), 3);
    }

    #[test]
    fn test_no_json_object_reports_raw_output() {
        let err = decode_media_info(b"ERROR: Unsupported URL").unwrap_err();
        match err {
            TubeloaderError::MetadataParse { raw, .. } => {
                assert_eq!(raw, "ERROR: Unsupported URL")
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_malformed_json_reports_payload() {
        let err = decode_media_info(b"noise {\"id\": } trailer").unwrap_err();
        match err {
            TubeloaderError::MetadataParse { raw, .. } => assert_eq!(raw, "{\"id\": }"),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_braces_in_wrong_order() {
        assert!(locate_json_object(b"} {").is_none());
    }
}
