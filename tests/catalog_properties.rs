//! Property checks for format partitioning and catalog labels.

use proptest::prelude::*;
use tubeloader::catalog::{FormatCatalog, LabelOptions, MediaFilter};
use tubeloader::extractor::{MediaFormat, MediaInfo, AUDIO_ONLY_SENTINEL};

#[derive(Debug, Clone)]
enum Shape {
    Video(u32, u32),
    Audio,
    Storyboard,
}

fn shape() -> impl Strategy<Value = Shape> {
    prop_oneof![
        (1u32..4000, 1u32..3000).prop_map(|(w, h)| Shape::Video(w, h)),
        Just(Shape::Audio),
        Just(Shape::Storyboard),
    ]
}

fn format(index: usize, shape: &Shape) -> MediaFormat {
    let format_id = index.to_string();
    match *shape {
        Shape::Video(w, h) => MediaFormat {
            format_id,
            ext: "mp4".to_string(),
            resolution: Some(format!("{}x{}", w, h)),
            width: Some(w),
            height: Some(h),
            ..Default::default()
        },
        Shape::Audio => MediaFormat {
            format_id,
            ext: "m4a".to_string(),
            resolution: Some(AUDIO_ONLY_SENTINEL.to_string()),
            abr: Some(128.0),
            ..Default::default()
        },
        Shape::Storyboard => MediaFormat {
            format_id,
            ext: "mhtml".to_string(),
            resolution: Some("48x27".to_string()),
            ..Default::default()
        },
    }
}

fn media(shapes: &[Shape]) -> MediaInfo {
    let formats = shapes.iter().enumerate().map(|(i, s)| format(i, s)).collect();
    MediaInfo::new("id", "title", formats)
}

proptest! {
    #[test]
    fn partitions_cover_every_format_once(shapes in prop::collection::vec(shape(), 0..40)) {
        let info = media(&shapes);
        let videos = shapes.iter().filter(|s| matches!(s, Shape::Video(..))).count();
        let audios = shapes.iter().filter(|s| matches!(s, Shape::Audio)).count();

        prop_assert_eq!(info.video_formats().count(), videos);
        prop_assert_eq!(info.audio_formats().count(), audios);
        prop_assert_eq!(
            info.video_formats().count() + info.audio_formats().count() + info.storyboard_formats().count(),
            shapes.len()
        );
    }

    #[test]
    fn labels_are_unique_and_resolvable(shapes in prop::collection::vec(shape(), 0..40)) {
        let info = media(&shapes);
        for filter in [MediaFilter::VideoOnly, MediaFilter::AudioOnly, MediaFilter::Storyboard] {
            let catalog = FormatCatalog::build(&info, filter, LabelOptions::default());
            let mut seen = std::collections::HashSet::new();
            for label in catalog.labels() {
                prop_assert!(seen.insert(label.clone()), "duplicate label {}", label);
                prop_assert!(catalog.select(label, None).is_ok());
            }
        }
    }

    #[test]
    fn rebuilding_is_deterministic(shapes in prop::collection::vec(shape(), 0..20)) {
        let info = media(&shapes);
        let a = FormatCatalog::build(&info, MediaFilter::VideoAndAudio, LabelOptions::default());
        let b = FormatCatalog::build(&info, MediaFilter::VideoAndAudio, LabelOptions::default());
        prop_assert_eq!(a.labels(), b.labels());
        prop_assert_eq!(a.audio_labels(), b.audio_labels());
    }
}
